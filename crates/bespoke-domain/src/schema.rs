//! Esquema de entrada de un ajuste bespoke y contrato de salida del
//! optimizador.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::{DomainError, ForceField, Molecule, Parameter, TargetSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub extras: BTreeMap<String, Value>,
}

fn default_max_iterations() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStageSchema {
    pub optimizer: OptimizerSettings,
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub parameter_hyperparameters: Vec<Value>,
    pub targets: Vec<TargetSchema>,
}

/// Configuración completa de un trabajo bespoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BespokeOptimizationSchema {
    pub smiles: Molecule,
    pub initial_force_field: ForceField,
    /// Patrones de enlace que restringen la fragmentación (vacío = todos).
    #[serde(default)]
    pub target_torsion_smirks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragmentation_engine: Option<Value>,
    pub stages: Vec<OptimizationStageSchema>,
}

impl BespokeOptimizationSchema {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.stages.is_empty() {
            return Err(DomainError::ValidationError("at least one optimization stage is required".into()));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.parameters.is_empty() {
                return Err(DomainError::ValidationError(format!("stage {i} has no parameters to fit")));
            }
            if stage.targets.is_empty() {
                return Err(DomainError::ValidationError(format!("stage {i} has no fitting targets")));
            }
            if let Some(p) = stage.parameters.iter().find(|p| p.smirks.trim().is_empty()) {
                return Err(DomainError::ValidationError(format!("stage {i} has an empty SMIRKS for {:?}", p.kind)));
            }
        }
        Ok(())
    }

    /// Targets con datos de referencia bespoke, en orden de enumeración
    /// (stage por stage). El índice es la clave de los resultados QC.
    pub fn bespoke_targets(&self) -> impl Iterator<Item = &TargetSchema> {
        self.stages
            .iter()
            .flat_map(|s| s.targets.iter())
            .filter(|t| t.is_bespoke())
    }

    pub fn targeted_smirks(&self) -> BTreeSet<String> {
        self.stages
            .iter()
            .flat_map(|s| s.parameters.iter())
            .map(|p| p.smirks.clone())
            .collect()
    }
}

/// Resultado publicado por el servicio de optimización.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutput {
    pub refit_parameters: BTreeMap<String, Value>,
}
