//! Cachés direccionadas por contenido.
//!
//! - `QcComputeCache`: deduplica cálculos QC equivalentes (fingerprint -> id).
//! - `ParameterCache`: acumula parámetros ajustados por fingerprint con
//!   escritura sólo-si-falta.
mod parameters;
mod qc;

pub use parameters::ParameterCache;
pub use qc::QcComputeCache;
