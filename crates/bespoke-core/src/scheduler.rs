//! Avance de una tarea: como mucho una transición de stage por tick.
use log::{debug, info};

use crate::stage::StageContext;
use crate::status::Status;
use crate::task::Task;

/// Qué hacer justo después de `enter` en el mismo tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnterPolicy {
    /// Consultar el job una vez antes de devolver el tick. Un stage que se
    /// resuelve de inmediato (caché, worker síncrono) termina en el mismo
    /// tick.
    #[default]
    PollImmediately,
    /// Dejar la primera consulta para el siguiente tick.
    DeferToNextTick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// La tarea ya era terminal; no cambió nada.
    Terminal,
    Entered { stage: &'static str, status: Status },
    Updated { stage: &'static str, status: Status },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CycleScheduler {
    policy: EnterPolicy,
}

impl CycleScheduler {
    pub fn new(policy: EnterPolicy) -> Self {
        Self { policy }
    }

    /// Un tick sobre `task`. No bloquea esperando cómputo: cada llamada al
    /// worker es un envío o una consulta.
    pub async fn tick(&self, task: &mut Task, ctx: &StageContext<'_>) -> CycleOutcome {
        if task.is_terminal() {
            return CycleOutcome::Terminal;
        }

        let outcome = match task.running.take() {
            None => {
                let Some(mut stage) = task.pending.pop_front() else {
                    return CycleOutcome::Terminal;
                };
                stage.enter(task, ctx).await;
                if self.policy == EnterPolicy::PollImmediately {
                    stage.update(ctx).await;
                }
                let outcome = CycleOutcome::Entered { stage: stage.kind(),
                                                      status: stage.status() };
                place(task, stage);
                outcome
            }
            Some(mut stage) => {
                stage.update(ctx).await;
                let outcome = CycleOutcome::Updated { stage: stage.kind(),
                                                      status: stage.status() };
                place(task, stage);
                outcome
            }
        };
        task.touch();
        debug!("tick task_id={} outcome={:?} task_status={}", task.id, outcome, task.status());
        if task.is_terminal() {
            info!("task finished task_id={} status={}", task.id, task.status());
        }
        outcome
    }
}

fn place(task: &mut Task, stage: crate::stage::Stage) {
    if stage.status().is_terminal() {
        task.completed.push(stage);
    } else {
        task.running = Some(stage);
    }
}
