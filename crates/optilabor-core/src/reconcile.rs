//! Attachment tag reconciliation service.
//!
//! [`TagReconciler`] is the entry point callers use when new tags arrive for
//! a file: it validates and normalizes the input, hands the atomic
//! check-merge-write to the injected [`AttachmentRepository`], and logs the
//! decision. Failures are returned to the caller unchanged; nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::logging;
use crate::error::{Error, Result};
use crate::models::{DuplicatePolicy, ReconcileOutcome};
use crate::tags::{normalize_tags, validate_file_name};
use crate::traits::AttachmentRepository;

/// Reconciles detected tags into per-file attachment records.
#[derive(Clone)]
pub struct TagReconciler {
    repo: Arc<dyn AttachmentRepository>,
    policy: DuplicatePolicy,
}

impl TagReconciler {
    /// Create a reconciler with the default [`DuplicatePolicy::Keep`].
    pub fn new(repo: Arc<dyn AttachmentRepository>) -> Self {
        Self {
            repo,
            policy: DuplicatePolicy::default(),
        }
    }

    /// Set the duplicate policy.
    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// The repository this reconciler writes to.
    pub fn repository(&self) -> &Arc<dyn AttachmentRepository> {
        &self.repo
    }

    /// Create the record for `file_name` or extend its tag list.
    ///
    /// Blank tags are dropped. An empty `detected` list still creates the
    /// record (with no tags) the first time a file name is seen, and is a
    /// no-op afterwards.
    pub async fn reconcile<S: AsRef<str> + Sync>(
        &self,
        file_name: &str,
        detected: &[S],
    ) -> Result<ReconcileOutcome> {
        let start = Instant::now();

        let file_name = validate_file_name(file_name).map_err(Error::InvalidInput)?;
        let tags = normalize_tags(detected).map_err(Error::InvalidInput)?;

        match self.repo.reconcile(file_name, &tags, self.policy).await {
            Ok(outcome) => {
                info!(
                    subsystem = logging::SUBSYSTEM_RECONCILE,
                    component = logging::COMPONENT_TAG_RECONCILER,
                    op = "reconcile",
                    file_name = %file_name,
                    action = %outcome.action,
                    tag_count = outcome.added.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Reconciled attachment tags"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    subsystem = logging::SUBSYSTEM_RECONCILE,
                    component = logging::COMPONENT_TAG_RECONCILER,
                    op = "reconcile",
                    file_name = %file_name,
                    tag_count = tags.len(),
                    persistence = e.is_persistence(),
                    error = %e,
                    "Attachment tag reconcile failed"
                );
                Err(e)
            }
        }
    }
}
