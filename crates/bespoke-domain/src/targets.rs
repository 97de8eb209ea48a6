//! Objetivos de ajuste y su origen de datos de referencia.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::qc::QcRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    TorsionProfile,
    AbInitio,
    Vibration,
    OptGeo,
}

/// Especificación del cálculo QC que genera datos de referencia.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QcSpec {
    pub program: String,
    pub method: String,
    #[serde(default)]
    pub basis: Option<String>,
}

/// Datos de referencia de un target: o bien una especificación a calcular
/// (bespoke) o bien registros ya disponibles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ReferenceData {
    Bespoke { spec: QcSpec },
    Existing { records: Vec<QcRecord> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSchema {
    #[serde(rename = "type")]
    pub kind: TargetKind,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub reference_data: ReferenceData,
    #[serde(default)]
    pub extras: BTreeMap<String, Value>,
}

fn default_weight() -> f64 {
    1.0
}

impl TargetSchema {
    pub fn is_bespoke(&self) -> bool {
        matches!(self.reference_data, ReferenceData::Bespoke { .. })
    }

    pub fn bespoke_spec(&self) -> Option<&QcSpec> {
        match &self.reference_data {
            ReferenceData::Bespoke { spec } => Some(spec),
            ReferenceData::Existing { .. } => None,
        }
    }
}
