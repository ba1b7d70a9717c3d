//! Document upload pipeline.
//!
//! `POST /api/v1/uploads` takes a multipart `file` part and runs:
//! sanitize name, check content type, store blob, detect, filter labels,
//! reconcile. Labels below the score threshold or unusable as tags are
//! dropped. A detector failure aborts before reconcile, so no tag record
//! is written for that upload; the blob stays (it is content-addressed and
//! a retry reuses it).

use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use optilabor_core::logging;
use optilabor_core::{sanitize_filename, validate_upload, DetectionInput};
use optilabor_db::store_document;

use super::attachments::ReconcileResponse;
use crate::{ApiError, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_name: String,
    pub content_type: String,
    pub content_hash: String,
    pub storage_path: String,
    pub model: String,
    /// Labels that passed the score threshold, in first-seen order.
    pub detected: Vec<String>,
    pub outcome: ReconcileResponse,
}

pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let start = Instant::now();

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        if field.name() == Some("file") {
            let original = field
                .file_name()
                .map(|s| s.to_string())
                .ok_or_else(|| ApiError::BadRequest("File part has no filename".to_string()))?;
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?;
            upload = Some((original, data.to_vec()));
            break;
        }
    }

    let (original, data) = upload
        .ok_or_else(|| ApiError::BadRequest("No file uploaded. Use field name 'file'.".to_string()))?;
    let file_name = sanitize_filename(&original);

    let validation = validate_upload(&file_name, &data, state.max_upload_bytes);
    if !validation.allowed {
        let reason = validation
            .block_reason
            .unwrap_or_else(|| "Upload rejected".to_string());
        warn!(
            subsystem = logging::SUBSYSTEM_API,
            op = "upload",
            file_name = %file_name,
            size_bytes = data.len(),
            reason = %reason,
            "Upload rejected"
        );
        return Err(ApiError::BadRequest(reason));
    }
    let content_type = validation.detected_type.unwrap_or_default();

    let stored = store_document(state.storage.as_ref(), &data).await?;

    let input = DetectionInput {
        file_name: &file_name,
        content_type: &content_type,
        data: &data,
    };
    let result = state.detector.detect(&input).await?;
    let detected = result.labels(state.min_score);

    let outcome = state.reconciler.reconcile(&file_name, &detected).await?;

    info!(
        subsystem = logging::SUBSYSTEM_API,
        op = "upload",
        file_name = %file_name,
        size_bytes = stored.size_bytes,
        newly_written = stored.newly_written,
        detection_count = result.detections.len(),
        tag_count = detected.len(),
        action = %outcome.action,
        duration_ms = start.elapsed().as_millis() as u64,
        "Upload processed"
    );

    Ok(Json(UploadResponse {
        file_name,
        content_type,
        content_hash: stored.content_hash,
        storage_path: stored.storage_path,
        model: result.model,
        detected,
        outcome: outcome.into(),
    }))
}
