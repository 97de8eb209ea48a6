//! Cableado del proceso: almacén, cliente de workers, gateway y poller.
use bespoke_adapters::worker::HttpWorkerClient;
use bespoke_core::{CycleScheduler, InMemoryStore, KeyValueStore, LocalWorkerClient, ParameterCache, Poller,
                   StageServices, TaskRepository, WorkerClient, WorkerServices};
use bespoke_gateway::{coordinator_router, serve, worker_router, CoordinatorState, GatewayError, WorkerState};
use bespoke_persistence::{build_pool, DbConfig, PgKeyValueStore};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::errors::AppError;

type ServerHandle = JoinHandle<Result<(), GatewayError>>;

pub struct App {
    config: AppConfig,
    store: Arc<dyn KeyValueStore>,
    repo: TaskRepository,
    workers: Arc<WorkerServices>,
    services: StageServices,
}

impl App {
    /// Abre el almacén indicado por la configuración y monta los servicios.
    pub fn build(config: AppConfig) -> Result<Self, AppError> {
        let store = open_store(config.database.as_ref())?;
        Self::with_store(config, store)
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        let workers = Arc::new(WorkerServices::new(store.clone()));
        let client: Arc<dyn WorkerClient> = if config.workers.local {
            Arc::new(LocalWorkerClient::new(workers.clone()))
        } else {
            info!("using remote workers url={}", config.workers.url);
            Arc::new(HttpWorkerClient::new(&config.workers.url, &config.gateway.prefix)?)
        };
        let services = StageServices::new(client, ParameterCache::new(store.clone())).with_retry_policy(config.retry.clone());
        Ok(Self { repo: TaskRepository::new(store.clone()),
                  config,
                  store,
                  workers,
                  services })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn repository(&self) -> &TaskRepository {
        &self.repo
    }

    pub fn workers(&self) -> &Arc<WorkerServices> {
        &self.workers
    }

    pub fn poller(&self) -> Poller {
        Poller::new(self.repo.clone(),
                    CycleScheduler::new(self.config.enter_policy),
                    self.services.clone(),
                    self.config.poller.clone())
    }

    /// Sirve el gateway y ejecuta el poller hasta Ctrl-C o hasta que uno de
    /// ellos termine con error.
    pub async fn run(self) -> Result<(), AppError> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let gateway = &self.config.gateway;

        let coordinator_state = CoordinatorState { repo: self.repo.clone(),
                                                   prefix: gateway.prefix.clone() };
        let mut coordinator: ServerHandle = tokio::spawn(serve("coordinator",
                                                               gateway.coordinator_addr(),
                                                               coordinator_router(coordinator_state),
                                                               shutdown_rx.clone()));
        let mut workers: Option<ServerHandle> = if self.config.workers.local {
            let router = worker_router(WorkerState { services: self.workers.clone() }, &gateway.prefix);
            Some(tokio::spawn(serve("workers", gateway.worker_addr(), router, shutdown_rx.clone())))
        } else {
            None
        };

        let poller = self.poller().run(shutdown_rx);
        tokio::pin!(poller);

        let mut poller_done = false;
        let mut coordinator_done = false;
        let mut workers_done = workers.is_none();
        let mut result: Result<(), AppError> = Ok(());

        tokio::select! {
            res = &mut poller => {
                poller_done = true;
                keep_first(&mut result, res.map_err(AppError::from));
            }
            res = &mut coordinator => {
                coordinator_done = true;
                keep_first(&mut result, joined(res));
            }
            res = wait_optional(&mut workers) => {
                workers_done = true;
                keep_first(&mut result, joined(res));
            }
            _ = shutdown_signal() => info!("shutdown requested"),
        }
        let _ = shutdown_tx.send(true);

        if !poller_done {
            keep_first(&mut result, poller.await.map_err(AppError::from));
        }
        if !coordinator_done {
            keep_first(&mut result, joined(coordinator.await));
        }
        if !workers_done {
            if let Some(handle) = workers.take() {
                keep_first(&mut result, joined(handle.await));
            }
        }

        self.store.close();
        info!("coordinator stopped");
        result
    }
}

fn open_store(database: Option<&DbConfig>) -> Result<Arc<dyn KeyValueStore>, AppError> {
    match database {
        Some(db) => {
            let pool = build_pool(&db.url, db.min_connections, db.max_connections)?;
            info!("using postgres store");
            Ok(Arc::new(PgKeyValueStore::from_pool(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store (state is lost on exit)");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Conserva el primer error; los siguientes sólo se registran.
fn keep_first(result: &mut Result<(), AppError>, next: Result<(), AppError>) {
    match next {
        Err(e) if result.is_err() => warn!("additional failure during shutdown: {}", e),
        other => {
            if result.is_ok() {
                *result = other;
            }
        }
    }
}

fn joined(res: Result<Result<(), GatewayError>, tokio::task::JoinError>) -> Result<(), AppError> {
    match res {
        Ok(inner) => inner.map_err(AppError::from),
        Err(e) => Err(AppError::Join(e.to_string())),
    }
}

async fn wait_optional(handle: &mut Option<ServerHandle>)
                       -> Result<Result<(), GatewayError>, tokio::task::JoinError> {
    match handle.as_mut() {
        Some(h) => h.await,
        None => std::future::pending().await,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
