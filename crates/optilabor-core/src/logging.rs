//! Shared values for structured `tracing` fields.
//!
//! Every event carries `subsystem` and, where there is more than one source
//! inside a subsystem, `component`. The values live here so log queries can
//! rely on them across crates.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Failed request or rejected write, surfaced to the caller |
//! | INFO  | Lifecycle events (startup, shutdown), reconcile completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-tag iteration |

// ─── subsystem ─────────────────────────────────────────────────────────────

pub const SUBSYSTEM_API: &str = "api";
pub const SUBSYSTEM_DB: &str = "db";
pub const SUBSYSTEM_DETECT: &str = "detect";
pub const SUBSYSTEM_RECONCILE: &str = "reconcile";

// ─── component ─────────────────────────────────────────────────────────────

pub const COMPONENT_POOL: &str = "pool";
pub const COMPONENT_ATTACHMENTS: &str = "attachments";
pub const COMPONENT_HTTP_DETECTOR: &str = "http_detector";
pub const COMPONENT_MOCK_DETECTOR: &str = "mock_detector";
pub const COMPONENT_TAG_RECONCILER: &str = "tag_reconciler";
