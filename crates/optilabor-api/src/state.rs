//! Shared handler state.

use std::sync::Arc;

use optilabor_core::{AttachmentRepository, TagDetector, TagReconciler};
use optilabor_db::StorageBackend;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reconcile service, which also owns the attachment repository.
    pub reconciler: TagReconciler,
    /// Detection collaborator for uploaded documents.
    pub detector: Arc<dyn TagDetector>,
    /// Blob store for uploaded document bytes.
    pub storage: Arc<dyn StorageBackend>,
    /// Detections scoring below this never become tags.
    pub min_score: f32,
    /// Largest accepted document, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn attachments(&self) -> &Arc<dyn AttachmentRepository> {
        self.reconciler.repository()
    }
}
