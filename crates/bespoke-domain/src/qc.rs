//! Tareas de cálculo QC enviadas al servicio `qc-calcs`.
//!
//! Sólo `smiles`, programa/modelo y los parámetros de scan afectan al
//! resultado químico; `name` es de presentación y no entra en el
//! fingerprint de caché.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::targets::QcSpec;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QcModel {
    pub method: String,
    #[serde(default)]
    pub basis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorsionTask {
    pub smiles: String,
    pub central_bond: (usize, usize),
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: i32,
    #[serde(default)]
    pub scan_range: Option<(i32, i32)>,
    #[serde(default = "default_n_conformers")]
    pub n_conformers: u32,
    pub program: String,
    pub model: QcModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationTask {
    pub smiles: String,
    #[serde(default = "default_n_conformers")]
    pub n_conformers: u32,
    pub program: String,
    pub model: QcModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HessianTask {
    pub smiles: String,
    pub program: String,
    pub model: QcModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_grid_spacing() -> i32 {
    15
}

fn default_n_conformers() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QcTask {
    #[serde(rename = "torsion1d")]
    Torsion1D(TorsionTask),
    #[serde(rename = "optimization")]
    Optimization(OptimizationTask),
    #[serde(rename = "hessian")]
    Hessian(HessianTask),
}

impl QcTask {
    pub fn torsion(smiles: &str, central_bond: (usize, usize), spec: &QcSpec) -> Self {
        QcTask::Torsion1D(TorsionTask { smiles: smiles.to_string(),
                                        central_bond,
                                        grid_spacing: default_grid_spacing(),
                                        scan_range: None,
                                        n_conformers: default_n_conformers(),
                                        program: spec.program.clone(),
                                        model: QcModel { method: spec.method.clone(),
                                                         basis: spec.basis.clone() },
                                        name: None })
    }

    pub fn optimization(smiles: &str, spec: &QcSpec) -> Self {
        QcTask::Optimization(OptimizationTask { smiles: smiles.to_string(),
                                                n_conformers: default_n_conformers(),
                                                program: spec.program.clone(),
                                                model: QcModel { method: spec.method.clone(),
                                                                 basis: spec.basis.clone() },
                                                name: None })
    }

    pub fn hessian(smiles: &str, spec: &QcSpec) -> Self {
        QcTask::Hessian(HessianTask { smiles: smiles.to_string(),
                                      program: spec.program.clone(),
                                      model: QcModel { method: spec.method.clone(),
                                                       basis: spec.basis.clone() },
                                      name: None })
    }

    /// Tipo declarado, tal como se publica en `{id, type}`.
    pub fn type_name(&self) -> &'static str {
        match self {
            QcTask::Torsion1D(_) => "torsion1d",
            QcTask::Optimization(_) => "optimization",
            QcTask::Hessian(_) => "hessian",
        }
    }
}

/// Resultado QC ya calculado, referenciado por el id opaco del job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub result: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn torsion_task_roundtrips_with_type_tag() {
        let spec = QcSpec { program: "psi4".into(),
                            method: "b3lyp-d3bj".into(),
                            basis: Some("dzvp".into()) };
        let task = QcTask::torsion("[CH3:1][CH2:2][OH:3]", (1, 2), &spec);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["type"], json!("torsion1d"));
        assert_eq!(value["grid_spacing"], json!(15));
        let back: QcTask = serde_json::from_value(value).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn defaults_fill_optional_scan_fields() {
        let task: QcTask = serde_json::from_value(json!({
            "type": "torsion1d",
            "smiles": "CCO",
            "central_bond": [1, 2],
            "program": "xtb",
            "model": {"method": "gfn2xtb"}
        })).unwrap();
        match task {
            QcTask::Torsion1D(t) => {
                assert_eq!(t.grid_spacing, 15);
                assert_eq!(t.n_conformers, 10);
                assert_eq!(t.scan_range, None);
            }
            other => panic!("unexpected task {other:?}"),
        }
    }
}
