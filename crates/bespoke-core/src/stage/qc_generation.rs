use bespoke_domain::{QcRecord, QcTask, TargetKind};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::{advance, fail, with_retry, StageContext};
use crate::status::{aggregate_statuses, Status};
use crate::task::Task;
use crate::wire::{JobReport, WorkerFamily};

/// Genera datos de referencia QC: un job por target bespoke y fragmento.
///
/// Las claves de `ids` y `results` son el índice del target bespoke en el
/// orden de enumeración del esquema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QcGenerationStage {
    pub status: Status,
    pub error: Option<String>,
    #[serde(default, with = "indexed")]
    pub ids: BTreeMap<usize, Vec<String>>,
    #[serde(default, with = "indexed_opt")]
    pub results: Option<BTreeMap<usize, Vec<QcRecord>>>,
}

// `Stage` es un enum con `tag`: serde bufferiza su contenido y ese buffer no
// convierte claves de objeto JSON a enteros. Los mapas por índice se guardan
// como listas de pares `[index, value]`.
mod indexed {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, V>(map: &BTreeMap<usize, V>, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer,
              V: Serialize
    {
        serializer.collect_seq(map)
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<usize, V>, D::Error>
        where D: Deserializer<'de>,
              V: Deserialize<'de>
    {
        Ok(Vec::<(usize, V)>::deserialize(deserializer)?.into_iter().collect())
    }
}

mod indexed_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, V>(map: &Option<BTreeMap<usize, V>>, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer,
              V: Serialize
    {
        map.as_ref().map(|m| m.iter().collect::<Vec<_>>()).serialize(serializer)
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Option<BTreeMap<usize, V>>, D::Error>
        where D: Deserializer<'de>,
              V: Deserialize<'de>
    {
        Ok(Option::<Vec<(usize, V)>>::deserialize(deserializer)?.map(|pairs| pairs.into_iter().collect()))
    }
}

/// Tareas QC derivadas del esquema y del árbol de fragmentación.
pub fn derive_qc_tasks(task: &Task) -> Result<Vec<(usize, QcTask)>, String> {
    let parent = task.input.smiles.smiles();
    let mut tasks = Vec::new();
    for (index, target) in task.input.bespoke_targets().enumerate() {
        let Some(spec) = target.bespoke_spec() else {
            continue;
        };
        match target.kind {
            TargetKind::TorsionProfile | TargetKind::AbInitio => {
                let fragmentation = task.fragmentation_result()
                                        .ok_or_else(|| format!("target {index} needs a fragmentation result"))?;
                for fragment in &fragmentation.fragments {
                    for bond in &fragment.bond_indices {
                        tasks.push((index, QcTask::torsion(&fragment.smiles, *bond, spec)));
                    }
                }
            }
            TargetKind::Vibration => tasks.push((index, QcTask::hessian(parent, spec))),
            TargetKind::OptGeo => tasks.push((index, QcTask::optimization(parent, spec))),
        }
    }
    Ok(tasks)
}

impl QcGenerationStage {
    pub(super) async fn enter(&mut self, task: &Task, ctx: &StageContext<'_>) {
        let derived = match derive_qc_tasks(task) {
            Ok(t) => t,
            Err(e) => return fail(&mut self.status, &mut self.error, e),
        };

        let client = ctx.client;
        for (index, qc_task) in derived {
            let body = match serde_json::to_value(&qc_task) {
                Ok(b) => b,
                Err(e) => return fail(&mut self.status, &mut self.error, e.to_string()),
            };
            let body = &body;
            match with_retry(ctx.retry.qc_generation, ctx.retry.backoff, "qc-generation.submit", move || {
                      client.submit(WorkerFamily::QcCalcs, body)
                  }).await
            {
                Ok(handle) => self.ids.entry(index).or_default().push(handle.id),
                Err(e) => return fail(&mut self.status, &mut self.error, e.to_string()),
            }
        }
        info!("qc generation submitted task_id={} jobs={}", task.id, self.job_ids().len());
    }

    pub(super) async fn update(&mut self, ctx: &StageContext<'_>) {
        let ids = self.job_ids();
        let reports = if ids.is_empty() {
            Vec::new()
        } else {
            let client = ctx.client;
            let batch = ids.as_slice();
            match with_retry(ctx.retry.qc_generation, ctx.retry.backoff, "qc-generation.report", move || {
                      client.report_many(WorkerFamily::QcCalcs, batch)
                  }).await
            {
                Ok(r) => r,
                Err(e) => return fail(&mut self.status, &mut self.error, e.to_string()),
            }
        };
        let by_id: HashMap<&str, &JobReport> = reports.iter().map(|r| (r.id.as_str(), r)).collect();
        if let Some(missing) = ids.iter().find(|id| !by_id.contains_key(id.as_str())) {
            return fail(&mut self.status, &mut self.error, format!("qc job {missing} missing from report"));
        }

        let status = aggregate_statuses(ids.iter().filter_map(|id| by_id.get(id.as_str())).map(|r| r.status));
        debug!("qc generation poll jobs={} status={}", ids.len(), status);
        match status {
            Status::Errored => {
                let message = reports.iter()
                                     .find(|r| r.status == Status::Errored)
                                     .map(|r| {
                                         format!("qc job {} failed: {}",
                                                 r.id,
                                                 r.error.as_deref().unwrap_or("no error message"))
                                     })
                                     .unwrap_or_else(|| "qc job failed".to_string());
                fail(&mut self.status, &mut self.error, message)
            }
            Status::Success => {
                let mut results = BTreeMap::new();
                for (index, job_ids) in &self.ids {
                    let records = job_ids.iter()
                                         .filter_map(|id| by_id.get(id.as_str()))
                                         .map(|r| QcRecord { id: r.id.clone(),
                                                             kind: r.kind.clone(),
                                                             result: r.result.clone().unwrap_or_default() })
                                         .collect();
                    results.insert(*index, records);
                }
                self.results = Some(results);
                self.status = Status::Success;
            }
            other => advance(&mut self.status, other),
        }
    }

    /// Ids únicos en orden de envío (tareas equivalentes comparten id).
    fn job_ids(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for id in self.ids.values().flatten() {
            if !out.contains(id) {
                out.push(id.clone());
            }
        }
        out
    }
}
