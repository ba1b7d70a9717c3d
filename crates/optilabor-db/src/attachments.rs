//! Attachment tag repository implementation.
//!
//! Reconcile runs as one transaction per call:
//!
//! 1. `INSERT ... ON CONFLICT (file_name) DO NOTHING` creates the row with the
//!    empty sentinel if it does not exist. A concurrent creator blocks here on
//!    the primary key until the first transaction finishes.
//! 2. `SELECT ... FOR UPDATE` locks the row so no other reconcile can read a
//!    stale tag list.
//! 3. The merge rule from `optilabor_core::tags` decides the new list.
//! 4. `UPDATE` writes it, unless nothing changed.
//!
//! Any error drops the transaction, which rolls back, so a failed reconcile
//! leaves the row as it was.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use optilabor_core::logging;
use optilabor_core::{
    merge_tag_list, AttachmentRecord, AttachmentRepository, DuplicatePolicy, Error,
    ReconcileOutcome, Result, TagList,
};

const SELECT_COLUMNS: &str = "file_name, tag_id, created_at_utc, updated_at_utc";

/// PostgreSQL implementation of AttachmentRepository.
#[derive(Clone)]
pub struct PgAttachmentRepository {
    pool: Pool<Postgres>,
}

impl PgAttachmentRepository {
    /// Create a new PgAttachmentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &PgRow) -> AttachmentRecord {
    let tag_id: String = row.get("tag_id");
    AttachmentRecord {
        file_name: row.get("file_name"),
        tags: TagList::decode(&tag_id),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    async fn exists(&self, file_name: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM attachment WHERE file_name = $1)")
                .bind(file_name)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn get(&self, file_name: &str) -> Result<Option<AttachmentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM attachment WHERE file_name = $1",
            SELECT_COLUMNS
        ))
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(row_to_record))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<AttachmentRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM attachment ORDER BY file_name LIMIT $1 OFFSET $2",
            SELECT_COLUMNS
        ))
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attachment")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(count)
    }

    async fn reconcile(
        &self,
        file_name: &str,
        tags: &[String],
        policy: DuplicatePolicy,
    ) -> Result<ReconcileOutcome> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Ensure the row exists
        let inserted = sqlx::query(
            "INSERT INTO attachment (file_name, tag_id, created_at_utc, updated_at_utc)
             VALUES ($1, '', $2, $2)
             ON CONFLICT (file_name) DO NOTHING",
        )
        .bind(file_name)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected()
            == 1;

        // Lock it for the read-merge-write
        let row = sqlx::query(&format!(
            "SELECT {} FROM attachment WHERE file_name = $1 FOR UPDATE",
            SELECT_COLUMNS
        ))
        .bind(file_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let current = row_to_record(&row);

        let existing = if inserted { None } else { Some(&current.tags) };
        let merge = merge_tag_list(existing, tags, policy);

        debug!(
            subsystem = logging::SUBSYSTEM_DB,
            component = logging::COMPONENT_ATTACHMENTS,
            op = "reconcile",
            file_name,
            inserted,
            action = %merge.action,
            tag_count = merge.added.len(),
            "Reconcile decision"
        );

        // A fresh row already holds the empty sentinel
        let needs_update = merge.action.wrote() && !(inserted && merge.tags.is_empty());

        let record = if needs_update {
            let row = sqlx::query(&format!(
                "UPDATE attachment SET tag_id = $2, updated_at_utc = $3
                 WHERE file_name = $1
                 RETURNING {}",
                SELECT_COLUMNS
            ))
            .bind(file_name)
            .bind(merge.tags.encode())
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Database)?;
            row_to_record(&row)
        } else {
            current
        };

        tx.commit().await.map_err(Error::Database)?;

        Ok(ReconcileOutcome {
            action: merge.action,
            record,
            added: merge.added,
        })
    }
}
