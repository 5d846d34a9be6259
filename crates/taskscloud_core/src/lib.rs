//! Core domain logic for TasksCloud.
//! This crate owns list membership, task storage and the session-gated
//! view state; clients only render what it exposes.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use config::{AuthConfig, ConfigError, CoreConfig, DatabaseConfig, LoggingConfig};
pub use dashboard::collection::TaskCollection;
pub use dashboard::directory::ListDirectory;
pub use dashboard::selection::{FetchOutcome, FetchTicket, SelectionController};
pub use dashboard::Dashboard;
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::identity::{Identity, IdentityId};
pub use model::list::{ListId, TaskList};
pub use model::task::{Task, TaskId, TaskPatch};
pub use model::ModelValidationError;
pub use repo::list_repo::{ListRepository, SqliteListRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::task_store::{SqliteTaskStore, StoreError, StoreResult, TaskStore};
pub use session::auth::{validate_registration, AuthError, AuthService};
pub use session::context::SessionContext;
pub use session::gate::{GateRoutes, Navigator, Route, SessionGate, SignOutOutcome, ViewState};
pub use session::provider::{
    FederatedProvider, IdentityProvider, Persistence, ProviderError, ProviderResult,
    SessionObserver, SessionSubscription,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
