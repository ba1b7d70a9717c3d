//! Core data models for OptiLabor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::logging;
use crate::tags::{validate_tag_name, TagList};

// =============================================================================
// ATTACHMENT TYPES
// =============================================================================

/// Persisted tag state for one uploaded file.
///
/// Exactly one record exists per distinct `file_name`. Records are created on
/// the first detection event for a name and only ever extended afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub file_name: String,
    pub tags: TagList,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl AttachmentRecord {
    /// The comma-joined value stored in the `tag_id` column.
    pub fn tag_id(&self) -> String {
        self.tags.encode()
    }
}

/// Decision taken by a reconcile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// No record existed; one was inserted.
    Created,
    /// Record held the empty sentinel; detected tags replaced it.
    Replaced,
    /// Record held tags; detected tags were appended.
    Appended,
    /// Record existed and nothing was added. No write was performed.
    Unchanged,
}

impl ReconcileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Replaced => "replaced",
            Self::Appended => "appended",
            Self::Unchanged => "unchanged",
        }
    }

    /// Whether the call wrote to the store.
    pub fn wrote(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How repeated detections of a tag already on the record are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Append every detected tag, even if already present.
    #[default]
    Keep,
    /// Skip tags already on the record or repeated within the same call.
    SkipExisting,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" | "false" | "0" | "" => Ok(Self::Keep),
            "skip_existing" | "skip" | "true" | "1" => Ok(Self::SkipExisting),
            other => Err(format!("Unknown duplicate policy: {}", other)),
        }
    }
}

/// Result of reconciling detected tags for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub action: ReconcileAction,
    /// Record state after the call.
    pub record: AttachmentRecord,
    /// Tags appended by this call, in order.
    pub added: Vec<String>,
}

// =============================================================================
// DETECTION TYPES
// =============================================================================

/// A document handed to the detection collaborator.
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

/// A single labelled element found in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Tag label (e.g. "door", "fire-extinguisher").
    pub label: String,
    /// Model confidence (0.0-1.0).
    pub score: f32,
    /// 1-based page number, when the detector reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Output of one detection call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Model name that produced the detections.
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    /// Distinct labels scoring at least `min_score`, in first-seen order.
    ///
    /// A label found on several pages of a plan is one tag for that file.
    /// Labels that cannot be stored as a tag (containing the list separator,
    /// too long, control characters) are dropped with a warning, so detector
    /// output never fails tag validation downstream.
    pub fn labels(&self, min_score: f32) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for detection in &self.detections {
            if detection.score < min_score {
                continue;
            }
            let label = detection.label.trim();
            if label.is_empty() {
                continue;
            }
            if let Err(reason) = validate_tag_name(label) {
                warn!(
                    subsystem = logging::SUBSYSTEM_DETECT,
                    model = %self.model,
                    label = %label.escape_debug(),
                    reason = %reason,
                    "Dropping detected label that is not a valid tag"
                );
                continue;
            }
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(label: &str, score: f32) -> Detection {
        Detection {
            label: label.to_string(),
            score,
            page: None,
        }
    }

    #[test]
    fn test_reconcile_action_display() {
        assert_eq!(ReconcileAction::Created.to_string(), "created");
        assert_eq!(ReconcileAction::Replaced.to_string(), "replaced");
        assert_eq!(ReconcileAction::Appended.to_string(), "appended");
        assert_eq!(ReconcileAction::Unchanged.to_string(), "unchanged");
    }

    #[test]
    fn test_reconcile_action_wrote() {
        assert!(ReconcileAction::Created.wrote());
        assert!(ReconcileAction::Appended.wrote());
        assert!(!ReconcileAction::Unchanged.wrote());
    }

    #[test]
    fn test_reconcile_action_serde() {
        let json = serde_json::to_value(ReconcileAction::Appended).unwrap();
        assert_eq!(json, "appended");
    }

    #[test]
    fn test_duplicate_policy_parse() {
        assert_eq!("keep".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Keep);
        assert_eq!("".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Keep);
        assert_eq!(
            "true".parse::<DuplicatePolicy>().unwrap(),
            DuplicatePolicy::SkipExisting
        );
        assert_eq!(
            "Skip_Existing".parse::<DuplicatePolicy>().unwrap(),
            DuplicatePolicy::SkipExisting
        );
        assert!("sometimes".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn test_attachment_record_tag_id() {
        let now = Utc::now();
        let record = AttachmentRecord {
            file_name: "plan_A.pdf".to_string(),
            tags: TagList::decode("Tag1,Tag2"),
            created_at_utc: now,
            updated_at_utc: now,
        };
        assert_eq!(record.tag_id(), "Tag1,Tag2");
    }

    #[test]
    fn test_detection_labels_filters_and_dedupes() {
        let result = DetectionResult {
            model: "yolo-plans".to_string(),
            detections: vec![
                detection("door", 0.91),
                detection("window", 0.42),
                detection("door", 0.88),
                detection("stair", 0.5),
            ],
        };
        assert_eq!(result.labels(0.5), vec!["door", "stair"]);
        assert_eq!(result.labels(0.0), vec!["door", "window", "stair"]);
        assert!(result.labels(0.95).is_empty());
    }

    #[test]
    fn test_detection_labels_drops_unstorable_labels() {
        let result = DetectionResult {
            model: "yolo-plans".to_string(),
            detections: vec![
                detection("door, double", 0.97),
                detection(" window ", 0.9),
                detection(&"x".repeat(101), 0.9),
                detection("exit\nsign", 0.9),
                detection("   ", 0.9),
                detection("outlet", 0.8),
            ],
        };
        assert_eq!(result.labels(0.5), vec!["window", "outlet"]);
    }

    #[test]
    fn test_detection_result_deserialize_defaults() {
        let result: DetectionResult =
            serde_json::from_str(r#"{"detections":[{"label":"door","score":0.9}]}"#).unwrap();
        assert_eq!(result.model, "");
        assert_eq!(result.detections[0].page, None);
    }
}
