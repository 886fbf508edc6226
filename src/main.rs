//! Rest Timer - the countdown a workout tracker shows between logged sets
//!
//! This is the main entry point for the rest-timer daemon.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use rest_timer::{
    api::create_router,
    config::{Config, NotifierKind},
    services::{DesktopNotifier, LogNotifier, NotificationSink},
    state::{AppState, RestTimer},
    tasks::{lifecycle_bridge_task, lifecycle_channel},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("rest_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting rest-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, default_rest={}s, auto_hide={}s, tick={}ms",
          config.host, config.port, config.default_rest, config.auto_hide, config.tick_ms);

    let sink: Arc<dyn NotificationSink> = match config.notifier {
        NotifierKind::Log => Arc::new(LogNotifier),
        NotifierKind::Desktop => Arc::new(DesktopNotifier::detect()),
    };

    // One timer per process, shared by every handler
    let timer = RestTimer::new(config.timer_settings(), sink);

    // Start the lifecycle bridge background task
    let (lifecycle_tx, lifecycle_events) = lifecycle_channel();
    let bridge = tokio::spawn(lifecycle_bridge_task(Arc::clone(&timer), lifecycle_events));

    let state = Arc::new(AppState::new(
        Arc::clone(&timer),
        lifecycle_tx,
        config.default_rest,
        config.port,
        config.host.clone(),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start          - Start a rest timer");
    info!("  POST /timer/pause|resume   - Pause or resume");
    info!("  POST /timer/reset|cancel   - Restart or clear");
    info!("  POST /timer/add-time       - Extend a running timer");
    info!("  GET  /timer                - Current snapshot");
    info!("  GET  /timer/stream         - Snapshot updates (SSE)");
    info!("  POST /lifecycle/foreground|background");
    info!("  GET  /status               - Timer and server status");
    info!("  GET  /health               - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Dropping the last sender closes the lifecycle source
    drop(state);
    timer.shutdown();
    bridge.abort();

    info!("Server shutdown complete");
    Ok(())
}
