//! OptiLabor API server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use optilabor_api::{router, ApiConfig, AppState};
use optilabor_core::{TagDetector, TagReconciler};
use optilabor_db::{log_pool_metrics, Database, FilesystemBackend};
use optilabor_detect::{HttpTagDetector, MockTagDetector};

fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: debug for optilabor_* and tower_http)
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "optilabor_api=debug,optilabor_core=debug,optilabor_db=debug,optilabor_detect=debug,tower_http=debug"
            .into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("optilabor-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ApiConfig::from_env()?;

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect_with_config(&config.database_url, &config.pool_config()).await?;
    info!("Database connected");
    log_pool_metrics(db.pool());

    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Blob storage must be writable before accepting uploads
    let storage = FilesystemBackend::new(&config.file_storage_path);
    storage
        .validate()
        .await
        .map_err(|e| anyhow::anyhow!("File storage at {} is unusable: {}", config.file_storage_path, e))?;
    info!("File storage initialized at {}", config.file_storage_path);

    let detector: Arc<dyn TagDetector> = match &config.detector_base_url {
        Some(base_url) => {
            let http = HttpTagDetector::new(base_url.clone())
                .with_timeout_secs(config.detector_timeout_secs);
            if http.health_check().await.unwrap_or(false) {
                info!(base_url = http.base_url(), "Detector sidecar healthy");
            } else {
                // Uploads fail with 502 until the sidecar comes up
                warn!(base_url = http.base_url(), "Detector sidecar not reachable at startup");
            }
            Arc::new(http)
        }
        None => {
            warn!("DETECTOR_BASE_URL is empty; using the mock detector (no tags will be detected)");
            Arc::new(MockTagDetector::new())
        }
    };

    let reconciler =
        TagReconciler::new(Arc::new(db.attachments.clone())).with_policy(config.duplicate_policy);
    info!(
        policy = ?config.duplicate_policy,
        min_score = config.detector_min_score,
        model = detector.model_name(),
        "Tag reconciler ready"
    );

    let state = AppState {
        reconciler,
        detector,
        storage: Arc::new(storage),
        min_score: config.detector_min_score,
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = router(state).layer(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parse_allowed_origins(
                &config.allowed_origins,
            )))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .max_age(std::time::Duration::from_secs(3600)),
    );

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
