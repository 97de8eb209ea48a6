// bespoke-domain library entry point
//
// Esquemas de entrada de un ajuste bespoke. Sólo datos y validación: la
// química (fragmentación, SMIRKS, QC, regresión) vive en los workers.
pub mod error;
pub mod forcefield;
pub mod fragmentation;
pub mod molecule;
pub mod qc;
pub mod schema;
pub mod targets;

pub use error::DomainError;
pub use forcefield::{ForceField, Parameter, ParameterKind};
pub use fragmentation::{Fragment, FragmentationRequest, FragmentationResult};
pub use molecule::Molecule;
pub use qc::{QcModel, QcRecord, QcTask};
pub use schema::{BespokeOptimizationSchema, OptimizationOutput, OptimizationStageSchema, OptimizerSettings};
pub use targets::{QcSpec, ReferenceData, TargetKind, TargetSchema};
