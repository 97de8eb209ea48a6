//! Bucle de fondo que aplica ticks a las tareas registradas.
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::errors::{CoreError, StoreError};
use crate::scheduler::CycleScheduler;
use crate::stage::StageServices;
use crate::store::blocking;
use crate::task::TaskRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerSettings {
    /// Límite de admisión: tareas en `running` a la vez.
    pub max_running_tasks: usize,
    /// Separación mínima entre dos ticks de la misma tarea.
    pub min_update_interval: Duration,
    /// Pausa entre pasadas.
    pub pass_interval: Duration,
    /// Fallos de almacén seguidos que detienen el bucle.
    pub max_consecutive_failures: u32,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self { max_running_tasks: 1000,
               min_update_interval: Duration::from_millis(1000),
               pass_interval: Duration::from_millis(500),
               max_consecutive_failures: 3 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub ticked: usize,
    pub skipped: usize,
    pub retired: usize,
    pub admitted: usize,
    /// Tareas con registro ilegible sacadas de `running`.
    pub dropped: usize,
}

pub struct Poller {
    repo: TaskRepository,
    scheduler: CycleScheduler,
    services: StageServices,
    settings: PollerSettings,
    last_tick: HashMap<u64, Instant>,
}

impl Poller {
    pub fn new(repo: TaskRepository, scheduler: CycleScheduler, services: StageServices, settings: PollerSettings) -> Self {
        Self { repo,
               scheduler,
               services,
               settings,
               last_tick: HashMap::new() }
    }

    /// Operación del repositorio fuera del runtime async.
    async fn with_repo<T, F>(&self, op: F) -> Result<T, StoreError>
        where F: FnOnce(&TaskRepository) -> Result<T, StoreError> + Send + 'static,
              T: Send + 'static
    {
        let repo = self.repo.clone();
        blocking(move || op(&repo)).await
    }

    /// Una pasada: tick de las tareas en curso, retiro de las terminales y
    /// admisión de pendientes hasta el límite.
    ///
    /// Una tarea cuyo registro no se puede decodificar sale del registro
    /// activo sin detener la pasada.
    pub async fn run_pass(&mut self) -> Result<PassReport, CoreError> {
        let mut report = PassReport::default();
        let ctx = self.services.context();

        for id in self.with_repo(|r| r.running_ids()).await? {
            let now = Instant::now();
            if let Some(last) = self.last_tick.get(&id) {
                if now.duration_since(*last) < self.settings.min_update_interval {
                    report.skipped += 1;
                    continue;
                }
            }

            let mut task = match self.with_repo(move |r| r.find(id)).await {
                Ok(Some(task)) => task,
                Ok(None) => {
                    warn!("registered task without data task_id={}", id);
                    self.with_repo(move |r| r.forget(id)).await?;
                    self.last_tick.remove(&id);
                    continue;
                }
                Err(StoreError::Codec(e)) => {
                    error!("undecodable task dropped from registry task_id={} error={}", id, e);
                    self.with_repo(move |r| r.forget(id)).await?;
                    self.last_tick.remove(&id);
                    report.dropped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            self.scheduler.tick(&mut task, &ctx).await;
            let task = self.with_repo(move |r| r.save(&task).map(|_| task)).await?;
            self.last_tick.insert(id, now);
            report.ticked += 1;

            if task.is_terminal() {
                self.with_repo(move |r| r.retire(id)).await?;
                self.last_tick.remove(&id);
                report.retired += 1;
            }
        }

        let limit = self.settings.max_running_tasks;
        report.admitted = self.with_repo(move |r| {
                                  let running = r.running_ids()?.len();
                                  if running < limit {
                                      r.admit(limit - running).map(|ids| ids.len())
                                  } else {
                                      Ok(0)
                                  }
                              })
                              .await?;
        if report != PassReport::default() {
            debug!("poller pass ticked={} skipped={} retired={} admitted={} dropped={}",
                   report.ticked, report.skipped, report.retired, report.admitted, report.dropped);
        }
        Ok(report)
    }

    /// Ejecuta pasadas hasta recibir `true` por `shutdown` o acumular
    /// demasiados fallos seguidos.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), CoreError> {
        info!("poller started max_running_tasks={} min_update_interval_ms={}",
              self.settings.max_running_tasks,
              self.settings.min_update_interval.as_millis());
        let mut failures = 0u32;
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.run_pass().await {
                Ok(_) => failures = 0,
                // sólo un backend caído cuenta para abortar
                Err(e @ CoreError::Store(StoreError::Backend(_))) => {
                    failures += 1;
                    error!("poller pass failed attempt={} error={}", failures, e);
                    if failures >= self.settings.max_consecutive_failures {
                        return Err(e);
                    }
                }
                Err(e) => error!("poller pass failed error={}", e),
            }
            tokio::select! {
                _ = tokio::time::sleep(self.settings.pass_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("poller stopped");
        Ok(())
    }
}
