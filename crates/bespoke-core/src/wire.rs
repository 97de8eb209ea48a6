//! DTOs del contrato HTTP entre coordinador, workers y clientes.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::status::Status;

/// Familia de servicio worker; cada una expone `/{prefix}/{segment}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerFamily {
    Fragmentations,
    QcCalcs,
    Optimizations,
}

impl WorkerFamily {
    pub const ALL: [WorkerFamily; 3] = [WorkerFamily::Fragmentations, WorkerFamily::QcCalcs, WorkerFamily::Optimizations];

    pub fn segment(self) -> &'static str {
        match self {
            WorkerFamily::Fragmentations => "fragmentations",
            WorkerFamily::QcCalcs => "qc-calcs",
            WorkerFamily::Optimizations => "optimizations",
        }
    }
}

impl fmt::Display for WorkerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl FromStr for WorkerFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerFamily::ALL.into_iter()
                         .find(|f| f.segment() == s)
                         .ok_or_else(|| format!("unknown worker family '{s}'"))
    }
}

/// Respuesta a `POST /{family}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Respuesta a `GET /{family}/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Cuerpo de `POST /optimizations` en el coordinador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageView {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Status,
    pub error: Option<String>,
    pub results: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    #[serde(rename = "self")]
    pub self_link: String,
    pub smiles: String,
    pub status: Status,
    pub stages: Vec<StageView>,
    /// Campo de fuerza reajustado, presente cuando la optimización terminó.
    pub results: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLink {
    pub id: String,
    #[serde(rename = "self")]
    pub self_link: String,
    pub status: Status,
}
