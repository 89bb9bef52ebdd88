//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository traits, but AppState pins them to the
//! concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use exprflow_core::scheduler::Scheduler;
use exprflow_core::service::expression::ExpressionService;
use exprflow_infra::config::load_service_config;
use exprflow_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use exprflow_infra::sqlite::expression::SqliteExpressionRepository;
use exprflow_infra::sqlite::pool::{DatabasePool, database_url};
use exprflow_infra::sqlite::task::SqliteTaskStore;
use exprflow_infra::sqlite::user::SqliteUserRepository;
use exprflow_types::config::ServiceConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteExpressionService = ExpressionService<SqliteExpressionRepository>;

pub type ConcreteScheduler = Scheduler<SqliteTaskStore>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST/RPC handlers.
#[derive(Clone)]
pub struct AppState {
    pub expression_service: Arc<ConcreteExpressionService>,
    pub scheduler: Arc<ConcreteScheduler>,
    pub users: Arc<SqliteUserRepository>,
    pub config: Arc<ServiceConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir).await?;

        let config = load_service_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        Ok(Self::from_parts(db_pool, config, data_dir))
    }

    /// Wire services over an already opened pool.
    pub fn from_parts(db_pool: DatabasePool, config: ServiceConfig, data_dir: PathBuf) -> Self {
        let expression_service =
            ExpressionService::new(SqliteExpressionRepository::new(db_pool.clone()));
        let scheduler = Scheduler::new(SqliteTaskStore::new(db_pool.clone()));
        let users = SqliteUserRepository::new(db_pool.clone());

        Self {
            expression_service: Arc::new(expression_service),
            scheduler: Arc::new(scheduler),
            users: Arc::new(users),
            config: Arc::new(config),
            data_dir,
            db_pool,
        }
    }
}
