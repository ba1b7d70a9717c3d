//! HTTP client for the detection sidecar.
//!
//! The sidecar wraps an object-detection model that finds labelled elements
//! (doors, fire extinguishers, outlets, ...) in architectural plans.
//!
//! # Protocol
//!
//! - `POST {base_url}/detect`, multipart form with a single `file` part.
//!   Responds with `{"model": "...", "detections": [{"label", "score", "page"}]}`.
//! - `GET {base_url}/health` responds with `{"status": "healthy"}`.
//!
//! The base URL and timeout come from the server configuration
//! (`DETECTOR_BASE_URL`, `DETECTOR_TIMEOUT_SECS`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use optilabor_core::logging;
use optilabor_core::defaults::DETECTOR_TIMEOUT_SECS;
use optilabor_core::{DetectionInput, DetectionResult, Error, Result, TagDetector};

const HEALTH_TIMEOUT_SECS: u64 = 5;

/// Detection sidecar client.
pub struct HttpTagDetector {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpTagDetector {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout_secs: DETECTOR_TIMEOUT_SECS,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

/// Health check response from the sidecar.
#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[async_trait]
impl TagDetector for HttpTagDetector {
    async fn detect(&self, input: &DetectionInput<'_>) -> Result<DetectionResult> {
        let url = format!("{}/detect", self.base_url);
        let start = Instant::now();

        let file_part = reqwest::multipart::Part::bytes(input.data.to_vec())
            .file_name(input.file_name.to_string())
            .mime_str(input.content_type)
            .map_err(|e| Error::Detection(format!("Failed to create multipart: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", file_part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Detection(format!("Detector request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = logging::SUBSYSTEM_DETECT,
                component = logging::COMPONENT_HTTP_DETECTOR,
                op = "detect",
                file_name = input.file_name,
                status = status.as_u16(),
                "Detector returned an error status"
            );
            return Err(Error::Detection(format!(
                "Detector returned {}: {}",
                status, body
            )));
        }

        let result: DetectionResult = response
            .json()
            .await
            .map_err(|e| Error::Detection(format!("Failed to parse detector response: {}", e)))?;

        debug!(
            subsystem = logging::SUBSYSTEM_DETECT,
            component = logging::COMPONENT_HTTP_DETECTOR,
            op = "detect",
            file_name = input.file_name,
            size_bytes = input.data.len(),
            detection_count = result.detections.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Detection complete"
        );

        Ok(result)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => Ok(resp
                .json::<HealthResponse>()
                .await
                .map(|h| h.status == "healthy")
                .unwrap_or(false)),
            _ => Ok(false),
        }
    }

    fn model_name(&self) -> &str {
        "detector-sidecar"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let detector = HttpTagDetector::new("http://localhost:8095".to_string());
        assert_eq!(detector.base_url(), "http://localhost:8095");
        assert_eq!(detector.timeout_secs(), DETECTOR_TIMEOUT_SECS);
        assert_eq!(detector.model_name(), "detector-sidecar");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let detector = HttpTagDetector::new("http://detector:8095/".to_string());
        assert_eq!(detector.base_url(), "http://detector:8095");
    }

    #[test]
    fn test_with_timeout() {
        let detector = HttpTagDetector::new("http://x".to_string()).with_timeout_secs(7);
        assert_eq!(detector.timeout_secs(), 7);
    }

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let json = r#"{"detections":[{"label":"door","score":0.91}]}"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.model, "");
        assert_eq!(result.detections.len(), 1);
        assert_eq!(result.detections[0].page, None);
    }
}
