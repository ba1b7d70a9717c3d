//! # optilabor-detect
//!
//! Clients for the tag detection collaborator.
//!
//! This crate provides:
//! - [`HttpTagDetector`], a client for the hosted detection sidecar
//! - [`MockTagDetector`], a deterministic detector for tests and local runs
//!
//! Both implement [`optilabor_core::TagDetector`].
//!
//! # Example
//!
//! ```rust,no_run
//! use optilabor_core::{DetectionInput, TagDetector};
//! use optilabor_detect::HttpTagDetector;
//!
//! #[tokio::main]
//! async fn main() {
//!     let detector = HttpTagDetector::new("http://localhost:8095".to_string());
//!     let data = std::fs::read("plan_A.pdf").unwrap();
//!     let input = DetectionInput {
//!         file_name: "plan_A.pdf",
//!         content_type: "application/pdf",
//!         data: &data,
//!     };
//!     let result = detector.detect(&input).await.unwrap();
//!     println!("{:?}", result.labels(0.5));
//! }
//! ```

pub mod http;
pub mod mock;

// Re-export core types
pub use optilabor_core::*;

pub use http::HttpTagDetector;
pub use mock::{MockCall, MockTagDetector};
