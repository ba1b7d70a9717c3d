//! Mock tag detector for deterministic testing.
//!
//! Used by API tests and by the server when `DETECTOR_BASE_URL` is set to an
//! empty string, so the upload pipeline runs end to end without a sidecar.
//!
//! ## Usage
//!
//! ```rust
//! use optilabor_core::{DetectionInput, TagDetector};
//! use optilabor_detect::MockTagDetector;
//!
//! # tokio_test_block(async {
//! let detector = MockTagDetector::new()
//!     .with_labels("plan_A.pdf", &["door", "window"])
//!     .with_default_labels(&["wall"]);
//!
//! let input = DetectionInput { file_name: "plan_A.pdf", content_type: "application/pdf", data: b"%PDF" };
//! let result = detector.detect(&input).await.unwrap();
//! assert_eq!(result.labels(0.5), vec!["door", "window"]);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use optilabor_core::logging;
use optilabor_core::{Detection, DetectionInput, DetectionResult, Error, Result, TagDetector};

const MOCK_MODEL: &str = "mock-detector";

/// Mock detector returning configured detections per file name.
#[derive(Clone, Default)]
pub struct MockTagDetector {
    config: Arc<MockConfig>,
    failing: Arc<AtomicBool>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone, Default)]
struct MockConfig {
    by_file: HashMap<String, Vec<Detection>>,
    default_detections: Vec<Detection>,
}

/// One recorded `detect` call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
    pub timestamp: std::time::Instant,
}

fn full_confidence(labels: &[&str]) -> Vec<Detection> {
    labels
        .iter()
        .map(|label| Detection {
            label: label.to_string(),
            score: 1.0,
            page: None,
        })
        .collect()
}

impl MockTagDetector {
    /// Create a mock that detects nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels (full confidence) returned for one file name.
    pub fn with_labels(self, file_name: impl Into<String>, labels: &[&str]) -> Self {
        self.with_detections(file_name, full_confidence(labels))
    }

    /// Exact detections returned for one file name.
    pub fn with_detections(
        mut self,
        file_name: impl Into<String>,
        detections: Vec<Detection>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .by_file
            .insert(file_name.into(), detections);
        self
    }

    /// Labels returned for any file without its own mapping.
    pub fn with_default_labels(mut self, labels: &[&str]) -> Self {
        Arc::make_mut(&mut self.config).default_detections = full_confidence(labels);
        self
    }

    /// Make every subsequent `detect` and `health_check` fail.
    ///
    /// Shared between clones, so a detector already handed to a server can
    /// be switched from the test.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls().clone()
    }

    /// Number of `detect` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.calls().clear()
    }

    fn calls(&self) -> MutexGuard<'_, Vec<MockCall>> {
        // A panicking test thread must not hide the log from the others
        self.call_log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TagDetector for MockTagDetector {
    async fn detect(&self, input: &DetectionInput<'_>) -> Result<DetectionResult> {
        self.calls().push(MockCall {
            file_name: input.file_name.to_string(),
            content_type: input.content_type.to_string(),
            size_bytes: input.data.len(),
            timestamp: std::time::Instant::now(),
        });

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Detection("Simulated detector failure".to_string()));
        }

        let detections = self
            .config
            .by_file
            .get(input.file_name)
            .unwrap_or(&self.config.default_detections)
            .clone();

        debug!(
            subsystem = logging::SUBSYSTEM_DETECT,
            component = logging::COMPONENT_MOCK_DETECTOR,
            op = "detect",
            file_name = input.file_name,
            detection_count = detections.len(),
            "Mock detection"
        );

        Ok(DetectionResult {
            model: MOCK_MODEL.to_string(),
            detections,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.failing.load(Ordering::SeqCst))
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL
    }
}
