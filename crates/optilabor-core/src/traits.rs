//! Core traits for OptiLabor abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// ATTACHMENT REPOSITORY TRAITS
// =============================================================================

/// Repository for per-file tag records.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Whether a record exists for this file name.
    async fn exists(&self, file_name: &str) -> Result<bool>;

    /// Fetch a record by file name.
    async fn get(&self, file_name: &str) -> Result<Option<AttachmentRecord>>;

    /// List records ordered by file name.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<AttachmentRecord>>;

    /// Total number of records.
    async fn count(&self) -> Result<i64>;

    /// Create or extend the record for `file_name` with `tags`.
    ///
    /// The existence check, merge and write must be atomic per file name:
    /// concurrent calls for the same new name leave exactly one record
    /// holding every call's tags. `tags` are already normalized.
    async fn reconcile(
        &self,
        file_name: &str,
        tags: &[String],
        policy: DuplicatePolicy,
    ) -> Result<ReconcileOutcome>;
}

// =============================================================================
// DETECTION TRAITS
// =============================================================================

/// External collaborator that finds taggable elements in a document.
#[async_trait]
pub trait TagDetector: Send + Sync {
    /// Run detection on a document.
    async fn detect(&self, input: &DetectionInput<'_>) -> Result<DetectionResult>;

    /// Check if the detector is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Name of the model or backend in use.
    fn model_name(&self) -> &str;
}
