//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tracing::{error, info, warn};

use crate::{
    state::AppState,
    tasks::LifecycleEvent,
};
use super::responses::{
    whole_seconds, AddTimeRequest, ApiResponse, HealthResponse, StartRequest, StatusResponse,
};

/// Handle POST /timer/start - Start (or replace) the rest timer
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Json<ApiResponse> {
    let duration = request.duration_seconds.map(whole_seconds);
    let timer = state.start_timer(duration, request.context());
    info!("Start endpoint called - {}s remaining", timer.remaining_seconds);
    Json(ApiResponse::new("Rest timer started", timer))
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("pause");
    Json(ApiResponse::new("Rest timer paused", state.timer.pause()))
}

/// Handle POST /timer/resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("resume");
    Json(ApiResponse::new("Rest timer resumed", state.timer.resume()))
}

/// Handle POST /timer/reset - Restart the current timer from its full duration
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("reset");
    Json(ApiResponse::new("Rest timer reset", state.timer.reset()))
}

/// Handle POST /timer/cancel
pub async fn cancel_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.record_action("cancel");
    Json(ApiResponse::new("Rest timer cancelled", state.timer.cancel()))
}

/// Handle POST /timer/add-time
pub async fn add_time_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddTimeRequest>,
) -> Json<ApiResponse> {
    state.record_action("add-time");
    let timer = state.timer.add_time(whole_seconds(request.delta_seconds));
    Json(ApiResponse::new("Rest timer extended", timer))
}

/// Handle GET /timer - Current snapshot
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    Json(ApiResponse::new("Current rest timer", state.timer.snapshot()))
}

/// Handle GET /timer/stream - Server-sent snapshot updates
pub async fn stream_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.timer.subscribe();
    info!("Snapshot stream subscriber connected");

    // First item is the current snapshot, then one per change.
    let events = stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let snapshot = rx.borrow_and_update().clone();
        let event = match Event::default().event("snapshot").json_data(&snapshot) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to encode snapshot event: {}", e);
                Event::default().event("snapshot").data(snapshot.display)
            }
        };
        Some((Ok::<_, Infallible>(event), (rx, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle POST /lifecycle/foreground
pub async fn foreground_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    forward_lifecycle(&state, LifecycleEvent::Foreground)
}

/// Handle POST /lifecycle/background
pub async fn background_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    forward_lifecycle(&state, LifecycleEvent::Background)
}

fn forward_lifecycle(state: &AppState, event: LifecycleEvent) -> Result<Json<ApiResponse>, StatusCode> {
    match state.send_lifecycle(event) {
        Ok(()) => Ok(Json(ApiResponse::new(
            format!("App moved to {}", event.as_str()),
            state.timer.snapshot(),
        ))),
        Err(e) => {
            error!("Failed to forward lifecycle event: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Handle GET /status - Return timer and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: state.timer.snapshot(),
        default_rest_seconds: state.default_rest_seconds,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
