//! `Service`: the operator-facing façade over the Job Queue and Manager.
//! Shares one `Manager` behind an `Arc<Mutex<_>>` between the caller's
//! direct calls (`status`, `submitJob`) and the background tick task that
//! drives autoscaling.

use std::sync::Arc;

use dispatch_audit::FileBackend;
use dispatch_config::{ConfigManager, DispatchConfig};
use dispatch_db::{Database, DatabaseConfig, Store};
use dispatch_log::{info, warn};
use dispatch_manager::{ComponentHealth, Manager};
use dispatch_provider::{NullProvider, Provider, SendgridConfig, SendgridProvider};
use dispatch_queue::{JobQueue, JobSpec};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// `Service.status()`'s return shape.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub initialized: bool,
    pub running: bool,
    pub worker_count: usize,
    pub worker_ids: Vec<Uuid>,
}

/// `Service.health()`'s return shape.
#[derive(Debug, Clone)]
pub struct ServiceHealth {
    pub healthy: bool,
    pub components: ComponentHealth,
    pub issues: Vec<String>,
}

/// The embeddable entry point: `initialize` wires up the store, provider and
/// queue; `start`/`stop` own the Manager's lifecycle; `submitJob` is the only
/// write path callers need day to day.
pub struct Service {
    config: DispatchConfig,
    store: Option<Store>,
    queue: Option<JobQueue>,
    manager: Option<Arc<Mutex<Manager>>>,
    ticker_stop: Option<watch::Sender<bool>>,
    ticker_join: Option<tokio::task::JoinHandle<()>>,
    running: bool,
}

impl Service {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            store: None,
            queue: None,
            manager: None,
            ticker_stop: None,
            ticker_join: None,
            running: false,
        }
    }

    /// Build a `Service` from an already-connected `Store` and `Provider`,
    /// skipping the DB connect/provider construction [`Service::initialize`]
    /// otherwise does. Used by hosts that manage their own connections, and
    /// by tests running against the SQLite test store.
    pub fn from_parts(store: Store, provider: Arc<dyn Provider>, config: DispatchConfig) -> ServiceResult<Self> {
        let queue = JobQueue::new(store.clone());
        let manager = Manager::new(store.clone(), provider, config.clone())?;

        Ok(Self {
            config,
            store: Some(store),
            queue: Some(queue),
            manager: Some(Arc::new(Mutex::new(manager))),
            ticker_stop: None,
            ticker_join: None,
            running: false,
        })
    }

    /// Build a `DispatchConfig` from `DISPATCH_`-prefixed environment
    /// variables (and an optional `.env` file), then connect and initialize
    /// a `Service` from it. Env vars override `.env`, which overrides every
    /// struct default.
    pub async fn from_env() -> ServiceResult<Self> {
        let manager = ConfigManager::with_prefix("DISPATCH".to_string());
        let _ = manager.load_dotenv(None);
        manager.load_env()?;
        let config: DispatchConfig = manager.load_validated()?;

        let mut service = Self::new(config);
        service.initialize().await?;
        Ok(service)
    }

    /// Connect to the store and build the Job Queue and Manager. Does not
    /// start any background loop yet — call [`Service::start`] for that.
    pub async fn initialize(&mut self) -> ServiceResult<()> {
        dispatch_log::init();

        let db = Database::connect(DatabaseConfig::new(self.config.database_url.clone())).await?;
        let store = Store::new(db);
        let queue = JobQueue::new(store.clone());
        let provider = self.build_provider()?;
        let manager = Manager::new(store.clone(), provider, self.config.clone())?;

        self.store = Some(store);
        self.queue = Some(queue);
        self.manager = Some(Arc::new(Mutex::new(manager)));

        info!("service initialized");
        Ok(())
    }

    fn build_provider(&self) -> ServiceResult<Arc<dyn Provider>> {
        match &self.config.provider_api_key {
            Some(key) => {
                let config = SendgridConfig::new(key.clone()).timeout(self.config.provider_timeout());
                Ok(Arc::new(SendgridProvider::new(config)?))
            }
            None => {
                warn!("no provider API key configured, running against NullProvider");
                Ok(Arc::new(NullProvider::default()))
            }
        }
    }

    /// Spawn `minWorkers`, the Monitor, the Retry Controller, and the
    /// Manager's own autoscale tick loop.
    pub async fn start(&mut self) -> ServiceResult<()> {
        if self.running {
            return Err(ServiceError::AlreadyRunning);
        }
        let manager = self.manager.clone().ok_or(ServiceError::NotInitialized)?;

        let sink = Arc::new(FileBackend::new(self.config.alerts_log_path.clone()));
        manager.lock().await.start(sink).await;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let interval = self.config.manager_interval();
        let tick_manager = manager.clone();
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tick_manager.lock().await.tick().await;
                    }
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        self.ticker_stop = Some(stop_tx);
        self.ticker_join = Some(join);
        self.running = true;
        info!("service started");
        Ok(())
    }

    /// Graceful shutdown: stop the autoscale tick loop, then hand off to
    /// the Manager's own shutdown order.
    pub async fn stop(&mut self) -> ServiceResult<()> {
        if let Some(stop) = self.ticker_stop.take() {
            let _ = stop.send(true);
        }
        if let Some(join) = self.ticker_join.take() {
            let _ = join.await;
        }

        if let Some(manager) = self.manager.take() {
            // The tick loop above has already been joined, so this is the
            // last reference unless a caller is mid-call against the
            // Manager (status/health/submitJob don't hold it across awaits
            // long enough for that to matter in practice).
            match Arc::try_unwrap(manager) {
                Ok(mutex) => mutex.into_inner().shutdown().await,
                Err(_) => warn!("manager still shared at shutdown, skipping graceful worker shutdown"),
            }
        }

        self.running = false;
        info!("service stopped");
        Ok(())
    }

    pub async fn submit_job(&self, spec: JobSpec) -> ServiceResult<Uuid> {
        let queue = self.queue.as_ref().ok_or(ServiceError::NotInitialized)?;
        Ok(queue.submit(spec).await?)
    }

    pub async fn status(&self) -> ServiceStatus {
        let (worker_count, worker_ids) = match &self.manager {
            Some(manager) => {
                let manager = manager.lock().await;
                (manager.worker_count(), manager.worker_ids())
            }
            None => (0, Vec::new()),
        };

        ServiceStatus { initialized: self.manager.is_some(), running: self.running, worker_count, worker_ids }
    }

    pub async fn health(&self) -> ServiceHealth {
        let Some(manager) = &self.manager else {
            return ServiceHealth {
                healthy: false,
                components: ComponentHealth { manager: false, retry: false, monitor: false },
                issues: vec!["service not initialized".into()],
            };
        };

        let components = manager.lock().await.component_health();
        let mut issues = Vec::new();
        if !components.manager {
            issues.push("one or more workers has stopped unexpectedly".to_string());
        }
        if !components.retry {
            issues.push("retry controller is not running".to_string());
        }
        if !components.monitor {
            issues.push("monitor is not running".to_string());
        }

        ServiceHealth { healthy: issues.is_empty(), components, issues }
    }
}
