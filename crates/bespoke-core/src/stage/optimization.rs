use bespoke_domain::{ForceField, OptimizationOutput, ReferenceData};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{advance, fail, with_retry, StageContext};
use crate::cache::ParameterCache;
use crate::status::Status;
use crate::store::blocking;
use crate::task::Task;
use crate::wire::WorkerFamily;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// `true` cuando el resultado salió de la caché sin ejecutar el ajuste.
    pub skipped: bool,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub refit_force_field: ForceField,
    pub provenance: Provenance,
}

/// Ajusta los parámetros bespoke; se salta el job si la caché ya cubre todos
/// los SMIRKS objetivo.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptimizationStage {
    pub status: Status,
    pub error: Option<String>,
    pub id: Option<String>,
    pub fingerprint: Option<String>,
    /// Campo de fuerza base, necesario para construir el resultado en `update`.
    pub initial_force_field: Option<ForceField>,
    pub result: Option<OptimizationResult>,
}

impl OptimizationStage {
    pub(super) async fn enter(&mut self, task: &Task, ctx: &StageContext<'_>) {
        let mut schema = task.input.clone();

        let (parent, fragments) = match task.fragmentation_result() {
            Some(f) => (f.parent_smiles.clone(), f.fragments.clone()),
            None => (schema.smiles.smiles().to_string(), Vec::new()),
        };
        for stage in &mut schema.stages {
            match ctx.smirks.regenerate(&stage.parameters, &parent, &fragments) {
                Ok(params) => stage.parameters = params,
                Err(e) => return fail(&mut self.status, &mut self.error, e.to_string()),
            }
        }

        let qc_results = task.qc_results();
        let mut index = 0usize;
        for target in schema.stages.iter_mut().flat_map(|s| s.targets.iter_mut()) {
            if !target.is_bespoke() {
                continue;
            }
            let Some(records) = qc_results.and_then(|r| r.get(&index)) else {
                return fail(&mut self.status,
                            &mut self.error,
                            format!("no qc reference data for bespoke target {index}"));
            };
            target.reference_data = ReferenceData::Existing { records: records.clone() };
            index += 1;
        }

        let fingerprint = match ParameterCache::fingerprint(&schema) {
            Ok(fp) => fp,
            Err(e) => return fail(&mut self.status, &mut self.error, e.to_string()),
        };
        self.fingerprint = Some(fingerprint.clone());
        self.initial_force_field = Some(schema.initial_force_field.clone());

        let targeted = schema.targeted_smirks();
        let cache = ctx.parameter_cache.clone();
        let key = fingerprint.clone();
        let cached = match blocking(move || cache.get_cached_parameters(&key)).await {
            Ok(c) => c,
            Err(e) => {
                warn!("parameter cache read failed task_id={} error={}", task.id, e);
                None
            }
        };
        if let Some(cached) = cached.filter(|c| targeted.iter().all(|s| c.contains_key(s))) {
            info!("optimization skipped (cache hit) task_id={} smirks={}", task.id, targeted.len());
            self.result = Some(OptimizationResult { refit_force_field: schema.initial_force_field.with_overrides(&cached),
                                                    provenance: Provenance { skipped: true, fingerprint } });
            self.status = Status::Success;
            return;
        }

        let body = match serde_json::to_value(&schema) {
            Ok(b) => b,
            Err(e) => return fail(&mut self.status, &mut self.error, e.to_string()),
        };
        let client = ctx.client;
        let body = &body;
        match with_retry(ctx.retry.optimization, ctx.retry.backoff, "optimization.submit", move || {
                  client.submit(WorkerFamily::Optimizations, body)
              }).await
        {
            Ok(handle) => {
                info!("optimization submitted task_id={} job_id={}", task.id, handle.id);
                self.id = Some(handle.id);
            }
            Err(e) => fail(&mut self.status, &mut self.error, e.to_string()),
        }
    }

    pub(super) async fn update(&mut self, ctx: &StageContext<'_>) {
        let Some(id) = self.id.clone() else {
            return fail(&mut self.status, &mut self.error, "optimization stage has no job id");
        };
        let client = ctx.client;
        let job = id.as_str();
        let report = match with_retry(ctx.retry.optimization, ctx.retry.backoff, "optimization.report", move || {
                               client.report(WorkerFamily::Optimizations, job)
                           }).await
        {
            Ok(r) => r,
            Err(e) => return fail(&mut self.status, &mut self.error, e.to_string()),
        };
        debug!("optimization poll job_id={} status={}", id, report.status);

        match report.status {
            Status::Success => {
                let output = report.result
                                   .ok_or_else(|| format!("optimization job {id} succeeded without a result"))
                                   .and_then(|v| serde_json::from_value::<OptimizationOutput>(v).map_err(|e| e.to_string()));
                let output = match output {
                    Ok(o) => o,
                    Err(e) => return fail(&mut self.status, &mut self.error, e),
                };
                let fingerprint = self.fingerprint.clone().unwrap_or_default();
                let cache = ctx.parameter_cache.clone();
                let key = fingerprint.clone();
                let fitted = output.refit_parameters.clone();
                if let Err(e) = blocking(move || cache.merge(&key, &fitted)).await {
                    warn!("parameter cache write failed job_id={} error={}", id, e);
                }
                let base = self.initial_force_field.clone().unwrap_or_else(|| ForceField::new("unknown"));
                self.result = Some(OptimizationResult { refit_force_field: base.with_overrides(&output.refit_parameters),
                                                        provenance: Provenance { skipped: false, fingerprint } });
                self.status = Status::Success;
            }
            Status::Errored => {
                let message = report.error.unwrap_or_else(|| format!("optimization job {id} failed"));
                fail(&mut self.status, &mut self.error, message)
            }
            other => advance(&mut self.status, other),
        }
    }
}
