#![allow(dead_code)]
//! Dobles de prueba compartidos por los tests de integración del core.

use async_trait::async_trait;
use bespoke_core::{JobHandle, JobReport, Status, TransportError, WorkerClient, WorkerFamily};
use bespoke_domain::BespokeOptimizationSchema;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Clone)]
struct Outcome {
    status: Status,
    result: Option<Value>,
    error: Option<String>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    jobs: HashMap<String, WorkerFamily>,
    by_family: HashMap<WorkerFamily, Outcome>,
    by_job: HashMap<String, Outcome>,
    submit_failures: HashMap<WorkerFamily, VecDeque<TransportError>>,
    submissions: Vec<(WorkerFamily, Value)>,
    reports: usize,
}

/// Cliente worker con respuestas programadas por familia o por job.
#[derive(Default)]
pub struct ScriptedClient {
    state: Mutex<State>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estado que reportan los jobs de `family` sin respuesta propia.
    pub fn respond(&self, family: WorkerFamily, status: Status, result: Option<Value>, error: Option<&str>) {
        self.state.lock().unwrap().by_family.insert(family,
                                                    Outcome { status,
                                                              result,
                                                              error: error.map(str::to_string) });
    }

    pub fn respond_job(&self, id: &str, status: Status, result: Option<Value>, error: Option<&str>) {
        self.state.lock().unwrap().by_job.insert(id.to_string(),
                                                 Outcome { status,
                                                           result,
                                                           error: error.map(str::to_string) });
    }

    pub fn fail_submits(&self, family: WorkerFamily, error: TransportError, times: usize) {
        let mut state = self.state.lock().unwrap();
        let queue = state.submit_failures.entry(family).or_default();
        for _ in 0..times {
            queue.push_back(error.clone());
        }
    }

    pub fn submissions(&self, family: WorkerFamily) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .filter(|(f, _)| *f == family)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn report_calls(&self) -> usize {
        self.state.lock().unwrap().reports
    }

    fn report_one(state: &State, id: &str) -> Result<JobReport, TransportError> {
        let family = state.jobs.get(id).ok_or_else(|| TransportError::Status { status: 404,
                                                                               body: format!("job {id} not found") })?;
        let outcome = state.by_job
                           .get(id)
                           .or_else(|| state.by_family.get(family))
                           .cloned()
                           .unwrap_or(Outcome { status: Status::Waiting,
                                                result: None,
                                                error: None });
        Ok(JobReport { id: id.to_string(),
                       kind: family.segment().to_string(),
                       status: outcome.status,
                       result: outcome.result,
                       error: outcome.error })
    }
}

#[async_trait]
impl WorkerClient for ScriptedClient {
    async fn submit(&self, family: WorkerFamily, body: &Value) -> Result<JobHandle, TransportError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.submit_failures.get_mut(&family).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        state.next_id += 1;
        let id = format!("{}-{}", family.segment(), state.next_id);
        state.jobs.insert(id.clone(), family);
        state.submissions.push((family, body.clone()));
        Ok(JobHandle { id,
                       kind: family.segment().to_string() })
    }

    async fn report(&self, _family: WorkerFamily, id: &str) -> Result<JobReport, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.reports += 1;
        Self::report_one(&state, id)
    }

    async fn report_many(&self, _family: WorkerFamily, ids: &[String]) -> Result<Vec<JobReport>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.reports += 1;
        ids.iter().map(|id| Self::report_one(&state, id)).collect()
    }
}

pub const TORSION_SMIRKS: &str = "[*:1]~[#6X4:2]-[#6X4:3]~[*:4]";

/// Esquema mínimo: un stage, un parámetro de torsión y un target bespoke.
pub fn schema_value() -> Value {
    json!({
        "smiles": "CCCC",
        "initial_force_field": {"name": "openff-2.0.0", "parameters": {TORSION_SMIRKS: {"k1": 0.1}}},
        "stages": [{
            "optimizer": {"type": "ForceBalance", "max_iterations": 10},
            "parameters": [{"type": "ProperTorsions", "smirks": TORSION_SMIRKS, "placeholder": true}],
            "targets": [{
                "type": "torsion-profile",
                "reference_data": {"kind": "bespoke", "spec": {"program": "xtb", "method": "gfn2xtb"}}
            }]
        }]
    })
}

pub fn schema() -> BespokeOptimizationSchema {
    serde_json::from_value(schema_value()).unwrap()
}

/// Esquema cuyos targets ya traen datos de referencia (sin QC bespoke).
pub fn existing_data_schema() -> BespokeOptimizationSchema {
    let mut value = schema_value();
    value["stages"][0]["targets"][0]["reference_data"] = json!({"kind": "existing", "records": []});
    serde_json::from_value(value).unwrap()
}

pub fn fragmentation_result() -> Value {
    json!({
        "parent_smiles": "CCCC",
        "fragments": [{"smiles": "[CH3:1][CH2:2][CH2:3][CH3:4]", "bond_indices": [[2, 3]]}]
    })
}
