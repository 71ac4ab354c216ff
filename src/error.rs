//! Errors the Service façade can return, folding every collaborator's error
//! type the way `dispatch-worker::WorkerError` folds `DbError`.

use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service has not been initialized")]
    NotInitialized,

    #[error("service is already running")]
    AlreadyRunning,

    #[error("config error: {0}")]
    Config(#[from] dispatch_config::ConfigError),

    #[error("database error: {0}")]
    Db(#[from] dispatch_db::DbError),

    #[error("provider error: {0}")]
    Provider(#[from] dispatch_provider::ProviderError),

    #[error("queue error: {0}")]
    Queue(#[from] dispatch_queue::QueueError),

    #[error("manager error: {0}")]
    Manager(#[from] dispatch_manager::ManagerError),
}
