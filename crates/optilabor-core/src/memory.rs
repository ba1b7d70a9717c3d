//! In-memory attachment repository.
//!
//! Keeps records in a `BTreeMap` behind one async mutex, so the
//! check-merge-write of a reconcile is a single critical section. Used by
//! tests and by local runs without a database.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::trace;

use crate::error::{Error, Result};
use crate::models::{AttachmentRecord, DuplicatePolicy, ReconcileOutcome};
use crate::tags::merge_tag_list;
use crate::traits::AttachmentRepository;

/// [`AttachmentRepository`] backed by process memory.
#[derive(Default)]
pub struct InMemoryAttachmentRepository {
    records: Mutex<BTreeMap<String, AttachmentRecord>>,
    fail_writes: AtomicBool,
}

impl InMemoryAttachmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a persistence error.
    ///
    /// Reads keep working. State is left untouched by failed writes.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryAttachmentRepository {
    async fn exists(&self, file_name: &str) -> Result<bool> {
        Ok(self.records.lock().await.contains_key(file_name))
    }

    async fn get(&self, file_name: &str) -> Result<Option<AttachmentRecord>> {
        Ok(self.records.lock().await.get(file_name).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<AttachmentRecord>> {
        let records = self.records.lock().await;
        Ok(records
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.records.lock().await.len() as i64)
    }

    async fn reconcile(
        &self,
        file_name: &str,
        tags: &[String],
        policy: DuplicatePolicy,
    ) -> Result<ReconcileOutcome> {
        let mut records = self.records.lock().await;

        let existing = records.get(file_name);
        let merge = merge_tag_list(existing.map(|r| &r.tags), tags, policy);
        trace!(file_name, action = %merge.action, "in-memory reconcile");

        if !merge.action.wrote() {
            let record = existing.cloned().ok_or_else(|| {
                Error::Internal(format!("record for {} vanished under lock", file_name))
            })?;
            return Ok(ReconcileOutcome {
                action: merge.action,
                record,
                added: merge.added,
            });
        }

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!(
                "write rejected for attachment {}",
                file_name
            )));
        }

        let now = Utc::now();
        let record = AttachmentRecord {
            file_name: file_name.to_string(),
            tags: merge.tags,
            created_at_utc: existing.map(|r| r.created_at_utc).unwrap_or(now),
            updated_at_utc: now,
        };
        records.insert(file_name.to_string(), record.clone());

        Ok(ReconcileOutcome {
            action: merge.action,
            record,
            added: merge.added,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReconcileAction;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_paginated() {
        let repo = InMemoryAttachmentRepository::new();
        for name in ["c.pdf", "a.pdf", "b.pdf"] {
            repo.reconcile(name, &tags(&["Tag1"]), DuplicatePolicy::Keep)
                .await
                .unwrap();
        }

        let all = repo.list(10, 0).await.unwrap();
        let names: Vec<_> = all.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);

        let page = repo.list(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].file_name, "b.pdf");
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unchanged_does_not_touch_timestamps() {
        let repo = InMemoryAttachmentRepository::new();
        let created = repo
            .reconcile("a.pdf", &tags(&["Tag1"]), DuplicatePolicy::Keep)
            .await
            .unwrap();

        let outcome = repo
            .reconcile("a.pdf", &[], DuplicatePolicy::Keep)
            .await
            .unwrap();
        assert_eq!(outcome.action, ReconcileAction::Unchanged);
        assert_eq!(outcome.record, created.record);
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let repo = InMemoryAttachmentRepository::new();
        let created = repo
            .reconcile("a.pdf", &tags(&["Tag1"]), DuplicatePolicy::Keep)
            .await
            .unwrap();
        let appended = repo
            .reconcile("a.pdf", &tags(&["Tag2"]), DuplicatePolicy::Keep)
            .await
            .unwrap();
        assert_eq!(
            appended.record.created_at_utc,
            created.record.created_at_utc
        );
        assert!(appended.record.updated_at_utc >= created.record.updated_at_utc);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state() {
        let repo = InMemoryAttachmentRepository::new();
        repo.reconcile("a.pdf", &tags(&["Tag1"]), DuplicatePolicy::Keep)
            .await
            .unwrap();

        repo.set_fail_writes(true);
        let err = repo
            .reconcile("a.pdf", &tags(&["Tag2"]), DuplicatePolicy::Keep)
            .await
            .unwrap_err();
        assert!(err.is_persistence());

        let record = repo.get("a.pdf").await.unwrap().unwrap();
        assert_eq!(record.tag_id(), "Tag1");
    }
}
