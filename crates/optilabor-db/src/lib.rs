//! # optilabor-db
//!
//! PostgreSQL persistence and blob storage for OptiLabor.
//!
//! This crate provides:
//! - Connection pool management
//! - [`PgAttachmentRepository`], the transactional tag reconcile write path
//! - Content-addressed filesystem storage for uploaded documents
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use optilabor_core::TagReconciler;
//! use optilabor_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/optilabor").await?;
//!     let reconciler = TagReconciler::new(Arc::new(db.attachments.clone()));
//!
//!     let outcome = reconciler.reconcile("plan_A.pdf", &["Tag1", "Tag2"]).await?;
//!     println!("{}: {}", outcome.action, outcome.record.tag_id());
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod file_storage;
pub mod pool;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use optilabor_core::*;

pub use attachments::PgAttachmentRepository;
pub use file_storage::{
    compute_content_hash, storage_path_for_hash, store_document, FilesystemBackend,
    StorageBackend, StoredDocument,
};
pub use pool::{log_pool_metrics, PoolConfig};

/// Database context holding the pool and repositories.
///
/// Constructed once at startup and passed to whatever needs it; cloning is
/// cheap and shares the pool.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Per-file tag records.
    pub attachments: PgAttachmentRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            attachments: PgAttachmentRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with the default pool settings.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_config(url, &PoolConfig::default()).await
    }

    /// Connect with explicit pool settings.
    pub async fn connect_with_config(url: &str, config: &PoolConfig) -> Result<Self> {
        let pool = config.connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
