use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardsort_core::{
    create_camera, create_drivers, create_recognizer, load_config, validate_config,
    recognizer::RecognizerBackend, CardRecord, CsvExporter, RunSupervisor, SemicolonCsvExporter,
    SequenceEngine,
};
use cardsort_server::api::{create_router, spawn_status_pusher, WsBroadcaster};
use cardsort_server::state::AppState;

/// Environment fallback for the recognition API key
const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CARDSORT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let mut config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    if config.recognizer.backend == RecognizerBackend::Gemini {
        let gemini = config.recognizer.gemini.get_or_insert_with(Default::default);
        if gemini.api_key.is_empty() {
            if let Ok(key) = std::env::var(GEMINI_KEY_ENV) {
                info!("Using recognition API key from {}", GEMINI_KEY_ENV);
                gemini.api_key = key;
            }
        }
    }

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Magazine size: {}", config.machine.magazine_size);
    info!("Image directory: {:?}", config.camera.image_dir);

    // Collaborators
    let (motor, sensor) = create_drivers(&config.hardware);
    let camera = create_camera(&config.camera);
    info!("Using camera: {}", camera.name());
    let recognizer = create_recognizer(&config.recognizer);
    info!("Using recognizer: {}", recognizer.provider());
    let exporter: Arc<dyn CsvExporter> = Arc::new(SemicolonCsvExporter::new(&config.export));

    let engine = SequenceEngine::new(config.sequence(), motor, sensor, camera, recognizer);

    // Create WebSocket broadcaster before the supervisor so records can be pushed
    let ws_broadcaster = WsBroadcaster::default();
    let broadcaster_for_observer = ws_broadcaster.clone();
    let supervisor = Arc::new(
        RunSupervisor::new(engine, exporter, config.export.dir.clone()).with_record_observer(
            Arc::new(move |record: &CardRecord| {
                broadcaster_for_observer.card_recorded(record)
            }),
        ),
    );

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&supervisor),
        ws_broadcaster,
    ));

    let pusher = spawn_status_pusher(
        Arc::clone(&state),
        Duration::from_millis(config.server.status_push_interval_ms),
    );

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    pusher.abort();

    // Never leave the motors energized
    if supervisor.is_running() {
        info!("Stopping active run");
    }
    supervisor.stop(true);

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
