use bespoke_domain::{FragmentationRequest, FragmentationResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{advance, fail, with_retry, StageContext};
use crate::status::Status;
use crate::task::Task;
use crate::wire::WorkerFamily;

/// Fragmenta la molécula padre; un único job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FragmentationStage {
    pub status: Status,
    pub error: Option<String>,
    pub id: Option<String>,
    pub result: Option<FragmentationResult>,
}

impl FragmentationStage {
    pub(super) async fn enter(&mut self, task: &Task, ctx: &StageContext<'_>) {
        let input = &task.input;
        let request = FragmentationRequest { smiles: input.smiles.clone(),
                                             target_bond_smarts: if input.target_torsion_smirks.is_empty() {
                                                 None
                                             } else {
                                                 Some(input.target_torsion_smirks.clone())
                                             },
                                             engine: input.fragmentation_engine.clone() };
        let body = match serde_json::to_value(&request) {
            Ok(b) => b,
            Err(e) => return fail(&mut self.status, &mut self.error, e.to_string()),
        };

        let client = ctx.client;
        let body = &body;
        match with_retry(ctx.retry.fragmentation, ctx.retry.backoff, "fragmentation.submit", move || {
                  client.submit(WorkerFamily::Fragmentations, body)
              }).await
        {
            Ok(handle) => {
                info!("fragmentation submitted task_id={} job_id={}", task.id, handle.id);
                self.id = Some(handle.id);
            }
            Err(e) => fail(&mut self.status, &mut self.error, e.to_string()),
        }
    }

    pub(super) async fn update(&mut self, ctx: &StageContext<'_>) {
        let Some(id) = self.id.clone() else {
            return fail(&mut self.status, &mut self.error, "fragmentation stage has no job id");
        };
        let client = ctx.client;
        let job = id.as_str();
        let report = match with_retry(ctx.retry.fragmentation, ctx.retry.backoff, "fragmentation.report", move || {
                               client.report(WorkerFamily::Fragmentations, job)
                           }).await
        {
            Ok(r) => r,
            Err(e) => return fail(&mut self.status, &mut self.error, e.to_string()),
        };
        debug!("fragmentation poll job_id={} status={}", id, report.status);

        match report.status {
            Status::Success => {
                let parsed = report.result
                                   .ok_or_else(|| format!("fragmentation job {id} succeeded without a result"))
                                   .and_then(|v| serde_json::from_value::<FragmentationResult>(v).map_err(|e| e.to_string()));
                match parsed {
                    Ok(result) => {
                        self.result = Some(result);
                        self.status = Status::Success;
                    }
                    Err(e) => fail(&mut self.status, &mut self.error, e),
                }
            }
            Status::Errored => {
                let message = report.error.unwrap_or_else(|| format!("fragmentation job {id} failed"));
                fail(&mut self.status, &mut self.error, message)
            }
            other => advance(&mut self.status, other),
        }
    }
}
