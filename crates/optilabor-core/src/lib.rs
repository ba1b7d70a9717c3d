//! # optilabor-core
//!
//! Core types, traits, and the attachment tag reconciliation rule for
//! OptiLabor.
//!
//! This crate provides the data structures and trait definitions the other
//! OptiLabor crates depend on, plus [`TagReconciler`], which decides whether
//! newly detected tags create an attachment record or extend an existing one.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod logging;
pub mod memory;
pub mod models;
pub mod reconcile;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{detect_content_type, sanitize_filename, validate_upload, ValidationResult};
pub use memory::InMemoryAttachmentRepository;
pub use models::*;
pub use reconcile::TagReconciler;
pub use tags::{
    merge_tag_list, normalize_tags, validate_file_name, validate_tag_name, TagList, TagMerge,
};
pub use traits::*;
