//! Server configuration from environment variables.
//!
//! Every variable is optional; unset or unparseable numeric values fall back
//! to the defaults in [`optilabor_core::defaults`]. `RECONCILE_DEDUPE_TAGS`,
//! `DETECTOR_MIN_SCORE` and `DETECTOR_BASE_URL` are validated, since a typo
//! there silently changes what gets written.

use std::str::FromStr;
use std::time::Duration;

use optilabor_core::defaults::{
    DATABASE_URL, DB_ACQUIRE_TIMEOUT_SECS, DB_IDLE_TIMEOUT_SECS, DB_MAX_CONNECTIONS,
    DB_MAX_LIFETIME_SECS, DB_MIN_CONNECTIONS, DETECTOR_BASE_URL, DETECTOR_MIN_SCORE,
    DETECTOR_TIMEOUT_SECS, ENV_DATABASE_URL, ENV_DB_ACQUIRE_TIMEOUT_SECS,
    ENV_DB_IDLE_TIMEOUT_SECS, ENV_DB_MAX_CONNECTIONS, ENV_DB_MAX_LIFETIME_SECS,
    ENV_DB_MIN_CONNECTIONS, ENV_DETECTOR_BASE_URL, ENV_DETECTOR_MIN_SCORE,
    ENV_DETECTOR_TIMEOUT_SECS, ENV_FILE_STORAGE_PATH, ENV_HOST, ENV_MAX_UPLOAD_BYTES, ENV_PORT,
    ENV_RECONCILE_DEDUPE_TAGS, FILE_STORAGE_PATH, MAX_UPLOAD_BYTES, SERVER_HOST, SERVER_PORT,
};
use optilabor_core::{DuplicatePolicy, Error, Result};
use optilabor_db::PoolConfig;

pub const ENV_ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Runtime configuration for the API server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_idle_timeout_secs: u64,
    /// Zero disables connection recycling.
    pub db_max_lifetime_secs: u64,
    pub host: String,
    pub port: u16,
    pub file_storage_path: String,
    pub max_upload_bytes: usize,
    /// `None` when `DETECTOR_BASE_URL` is set to an empty string.
    pub detector_base_url: Option<String>,
    pub detector_timeout_secs: u64,
    pub detector_min_score: f32,
    pub duplicate_policy: DuplicatePolicy,
    pub allowed_origins: Vec<String>,
}

impl ApiConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let detector_base_url = match lookup(ENV_DETECTOR_BASE_URL) {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => {
                let url = raw.trim();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(Error::Config(format!(
                        "{} must be an http(s) URL, got {:?}",
                        ENV_DETECTOR_BASE_URL, raw
                    )));
                }
                Some(url.to_string())
            }
            None => Some(DETECTOR_BASE_URL.to_string()),
        };

        let detector_min_score = match lookup(ENV_DETECTOR_MIN_SCORE) {
            Some(raw) => {
                let score: f32 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!("{} must be a number, got {:?}", ENV_DETECTOR_MIN_SCORE, raw))
                })?;
                if !(0.0..=1.0).contains(&score) {
                    return Err(Error::Config(format!(
                        "{} must be between 0 and 1, got {}",
                        ENV_DETECTOR_MIN_SCORE, score
                    )));
                }
                score
            }
            None => DETECTOR_MIN_SCORE,
        };

        let duplicate_policy = match lookup(ENV_RECONCILE_DEDUPE_TAGS) {
            Some(raw) => raw
                .parse::<DuplicatePolicy>()
                .map_err(|e| Error::Config(format!("{}: {}", ENV_RECONCILE_DEDUPE_TAGS, e)))?,
            None => DuplicatePolicy::default(),
        };

        let allowed_origins = lookup(ENV_ALLOWED_ORIGINS)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url: lookup(ENV_DATABASE_URL).unwrap_or_else(|| DATABASE_URL.to_string()),
            db_max_connections: parse_var(&lookup, ENV_DB_MAX_CONNECTIONS)
                .unwrap_or(DB_MAX_CONNECTIONS),
            db_min_connections: parse_var(&lookup, ENV_DB_MIN_CONNECTIONS)
                .unwrap_or(DB_MIN_CONNECTIONS),
            db_acquire_timeout_secs: parse_var(&lookup, ENV_DB_ACQUIRE_TIMEOUT_SECS)
                .unwrap_or(DB_ACQUIRE_TIMEOUT_SECS),
            db_idle_timeout_secs: parse_var(&lookup, ENV_DB_IDLE_TIMEOUT_SECS)
                .unwrap_or(DB_IDLE_TIMEOUT_SECS),
            db_max_lifetime_secs: parse_var(&lookup, ENV_DB_MAX_LIFETIME_SECS)
                .unwrap_or(DB_MAX_LIFETIME_SECS),
            host: lookup(ENV_HOST).unwrap_or_else(|| SERVER_HOST.to_string()),
            port: parse_var(&lookup, ENV_PORT).unwrap_or(SERVER_PORT),
            file_storage_path: lookup(ENV_FILE_STORAGE_PATH)
                .unwrap_or_else(|| FILE_STORAGE_PATH.to_string()),
            max_upload_bytes: parse_var(&lookup, ENV_MAX_UPLOAD_BYTES).unwrap_or(MAX_UPLOAD_BYTES),
            detector_base_url,
            detector_timeout_secs: parse_var(&lookup, ENV_DETECTOR_TIMEOUT_SECS)
                .filter(|secs| *secs > 0)
                .unwrap_or(DETECTOR_TIMEOUT_SECS),
            detector_min_score,
            duplicate_policy,
            allowed_origins,
        })
    }

    /// Connection pool settings for the database.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.db_max_connections,
            min_connections: self.db_min_connections.min(self.db_max_connections),
            acquire_timeout: Duration::from_secs(self.db_acquire_timeout_secs),
            idle_timeout: Duration::from_secs(self.db_idle_timeout_secs),
            max_lifetime: (self.db_max_lifetime_secs > 0)
                .then(|| Duration::from_secs(self.db_max_lifetime_secs)),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
