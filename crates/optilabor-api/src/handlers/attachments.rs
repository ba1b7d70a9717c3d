//! Attachment tag HTTP handlers.
//!
//! Lookup and listing of per-file tag records, plus direct reconciliation of
//! a tag list for callers that run detection themselves.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use optilabor_core::defaults::{PAGE_LIMIT, PAGE_LIMIT_MAX, PAGE_OFFSET};
use optilabor_core::{AttachmentRecord, ReconcileAction, ReconcileOutcome};

use crate::{ApiError, AppState};

/// Attachment record as returned by the API.
///
/// `tag_id` carries the comma-joined legacy encoding alongside the list.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentResponse {
    pub file_name: String,
    pub tags: Vec<String>,
    pub tag_id: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl From<AttachmentRecord> for AttachmentResponse {
    fn from(record: AttachmentRecord) -> Self {
        Self {
            tag_id: record.tag_id(),
            tags: record.tags.as_slice().to_vec(),
            file_name: record.file_name,
            created_at_utc: record.created_at_utc,
            updated_at_utc: record.updated_at_utc,
        }
    }
}

/// Result of one reconcile call.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub action: ReconcileAction,
    pub added: Vec<String>,
    pub attachment: AttachmentResponse,
}

impl From<ReconcileOutcome> for ReconcileResponse {
    fn from(outcome: ReconcileOutcome) -> Self {
        Self {
            action: outcome.action,
            added: outcome.added,
            attachment: outcome.record.into(),
        }
    }
}

/// Pagination metadata for list responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListAttachmentsResponse {
    pub data: Vec<AttachmentResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Deserialize)]
pub struct ListAttachmentsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileTagsRequest {
    #[serde(default)]
    pub tags: Vec<String>,
}

/// List attachment records ordered by file name.
///
/// # Query Parameters
/// - `limit`: page size, 1 to 500 (default 50)
/// - `offset`: records to skip (default 0)
pub async fn list_attachments(
    State(state): State<AppState>,
    Query(query): Query<ListAttachmentsQuery>,
) -> Result<Json<ListAttachmentsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(PAGE_LIMIT).clamp(1, PAGE_LIMIT_MAX);
    let offset = query.offset.unwrap_or(PAGE_OFFSET).max(0);

    let records = state.attachments().list(limit, offset).await?;
    let total = state.attachments().count().await?;
    let has_more = offset + (records.len() as i64) < total;

    Ok(Json(ListAttachmentsResponse {
        data: records.into_iter().map(Into::into).collect(),
        pagination: PaginationMeta {
            total,
            limit,
            offset,
            has_more,
        },
    }))
}

/// Get the tag record for one file name.
///
/// # Returns
/// - 200 OK with the record
/// - 404 Not Found if no detection event was ever recorded for the name
pub async fn get_attachment(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Json<AttachmentResponse>, ApiError> {
    let record = state
        .attachments()
        .get(&file_name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Attachment {} not found", file_name)))?;
    Ok(Json(record.into()))
}

/// Reconcile a tag list for a file name.
///
/// # Returns
/// - 201 Created when the record did not exist
/// - 200 OK when an existing record was extended or left unchanged
/// - 400 Bad Request for an invalid file name or tag
pub async fn reconcile_tags(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
    Json(body): Json<ReconcileTagsRequest>,
) -> Result<(StatusCode, Json<ReconcileResponse>), ApiError> {
    let outcome = state.reconciler.reconcile(&file_name, &body.tags).await?;
    let status = if outcome.action == ReconcileAction::Created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.into())))
}
