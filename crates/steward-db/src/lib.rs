//! # steward-db
//!
//! Document store for the steward assistant.
//!
//! This crate provides:
//! - Connection pool management
//! - PostgreSQL repositories keeping each record as a JSONB document
//! - In-memory repositories with the same behaviour, for development and tests
//! - The `ActionCommitter` used when a chat proposal is confirmed
//!
//! ## Example
//!
//! ```rust,ignore
//! use steward_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> steward_core::Result<()> {
//!     let db = Database::connect("postgres://localhost/steward").await?;
//!     db.migrate().await?;
//!     let tasks = db.tasks.list_for_owner("a@x.io").await?;
//!     println!("{} tasks", tasks.len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tracing::info;

pub mod committer;
pub mod meetings;
pub mod memory;
pub mod pending_meetings;
pub mod pool;
pub mod tasks;
pub mod threads;
pub mod users;

// Test fixtures for integration tests
#[cfg(feature = "migrations")]
pub mod test_fixtures;

// Re-export core types
pub use steward_core::*;

pub use meetings::PgMeetingRepository;
pub use memory::{
    MemoryMeetingRepository, MemoryPendingMeetingRepository, MemoryTaskRepository,
    MemoryThreadRepository, MemoryUserRepository,
};
pub use pending_meetings::PgPendingMeetingRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tasks::PgTaskRepository;
pub use threads::PgThreadRepository;
pub use users::{escape_like, PgUserRepository};

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    pub tasks: Arc<dyn TaskRepository>,
    pub meetings: Arc<dyn MeetingRepository>,
    pub pending_meetings: Arc<dyn PendingMeetingRepository>,
    pub threads: Arc<dyn ThreadRepository>,
    pub users: Arc<dyn UserRepository>,
    /// Present only for the PostgreSQL store.
    pool: Option<sqlx::Pool<sqlx::Postgres>>,
}

impl Database {
    /// Create a PostgreSQL-backed instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            tasks: Arc::new(PgTaskRepository::new(pool.clone())),
            meetings: Arc::new(PgMeetingRepository::new(pool.clone())),
            pending_meetings: Arc::new(PgPendingMeetingRepository::new(pool.clone())),
            threads: Arc::new(PgThreadRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create an empty in-memory instance.
    pub fn in_memory() -> Self {
        info!(
            subsystem = "db",
            component = "memory",
            "Using in-memory store; data is lost on restart"
        );
        Self {
            tasks: Arc::new(MemoryTaskRepository::default()),
            meetings: Arc::new(MemoryMeetingRepository::default()),
            pending_meetings: Arc::new(MemoryPendingMeetingRepository::default()),
            threads: Arc::new(MemoryThreadRepository::default()),
            users: Arc::new(MemoryUserRepository::default()),
            pool: None,
        }
    }

    /// Connect to PostgreSQL at the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations. A no-op for the in-memory store.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        if let Some(pool) = &self.pool {
            sqlx::migrate!("../../migrations")
                .run(pool)
                .await
                .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        }
        Ok(())
    }

    /// Get the underlying connection pool, if any.
    pub fn pool(&self) -> Option<&sqlx::Pool<sqlx::Postgres>> {
        self.pool.as_ref()
    }

    pub fn backend_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Check that the store answers a trivial query.
    pub async fn health_check(&self) -> Result<bool> {
        match &self.pool {
            Some(pool) => {
                log_pool_metrics(pool);
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(Error::Database)?;
                Ok(true)
            }
            None => Ok(true),
        }
    }
}
