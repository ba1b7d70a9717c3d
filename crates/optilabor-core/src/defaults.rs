//! Centralized default constants for OptiLabor.
//!
//! **This module is the single source of truth** for shared default values and
//! environment variable names. Crates reference these constants instead of
//! defining their own magic numbers.

// =============================================================================
// TAGS
// =============================================================================

/// Separator used by the legacy `tag_id` column.
pub const TAG_SEPARATOR: char = ',';

/// Maximum characters in a single tag.
pub const TAG_MAX_LEN: usize = 100;

/// Maximum bytes in an attachment file name.
pub const FILE_NAME_MAX_LEN: usize = 255;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for attachment listings.
pub const PAGE_LIMIT: i64 = 50;

/// Upper bound on a caller-supplied page size.
pub const PAGE_LIMIT_MAX: i64 = 500;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default database URL.
pub const DATABASE_URL: &str = "postgres://localhost/optilabor";

/// Default directory for uploaded document blobs.
pub const FILE_STORAGE_PATH: &str = "/var/lib/optilabor/files";

/// Default maximum upload size (50 MB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// =============================================================================
// DATABASE POOL
// =============================================================================

/// Default maximum pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Connections kept open while idle.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// How long a reconcile waits for a pooled connection before failing.
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle connections above the minimum are closed after this long.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Connections are recycled after this long (30 minutes).
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// DETECTION
// =============================================================================

/// Default detection sidecar URL.
pub const DETECTOR_BASE_URL: &str = "http://localhost:8095";

/// Default detection request timeout in seconds.
///
/// Object detection runs per page, so multi-page plans take a while.
pub const DETECTOR_TIMEOUT_SECS: u64 = 120;

/// Default minimum detection confidence for a label to become a tag.
pub const DETECTOR_MIN_SCORE: f32 = 0.5;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
pub const ENV_DB_MIN_CONNECTIONS: &str = "DB_MIN_CONNECTIONS";
pub const ENV_DB_ACQUIRE_TIMEOUT_SECS: &str = "DB_ACQUIRE_TIMEOUT_SECS";
pub const ENV_DB_IDLE_TIMEOUT_SECS: &str = "DB_IDLE_TIMEOUT_SECS";
/// `0` disables connection recycling.
pub const ENV_DB_MAX_LIFETIME_SECS: &str = "DB_MAX_LIFETIME_SECS";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_FILE_STORAGE_PATH: &str = "FILE_STORAGE_PATH";
pub const ENV_MAX_UPLOAD_BYTES: &str = "MAX_UPLOAD_BYTES";

/// Base URL of the detection sidecar. Set to an empty string to use the mock detector.
pub const ENV_DETECTOR_BASE_URL: &str = "DETECTOR_BASE_URL";
pub const ENV_DETECTOR_TIMEOUT_SECS: &str = "DETECTOR_TIMEOUT_SECS";
pub const ENV_DETECTOR_MIN_SCORE: &str = "DETECTOR_MIN_SCORE";

/// "true"/"1" switches reconciliation to [`crate::DuplicatePolicy::SkipExisting`].
pub const ENV_RECONCILE_DEDUPE_TAGS: &str = "RECONCILE_DEDUPE_TAGS";
