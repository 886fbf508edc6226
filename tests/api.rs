use std::sync::Arc;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use rest_timer::{
    create_router, lifecycle_bridge_task, lifecycle_channel, AppState, LogNotifier, RestTimer,
    TimerSettings,
};

fn test_app() -> (Router, Arc<RestTimer>) {
    let timer = RestTimer::new(TimerSettings::default(), Arc::new(LogNotifier));
    let (lifecycle_tx, events) = lifecycle_channel();
    tokio::spawn(lifecycle_bridge_task(Arc::clone(&timer), events));
    let state = Arc::new(AppState::new(
        Arc::clone(&timer),
        lifecycle_tx,
        90,
        20554,
        "127.0.0.1".to_string(),
    ));
    (create_router(state), timer)
}

async fn send(app: &Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(path);
    let body = match body {
        Some(body) => {
            request = request.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn post(app: &Router, path: &str) -> (StatusCode, Value) {
    send(app, "POST", path, None).await
}

#[tokio::test]
async fn start_without_duration_uses_default_rest() {
    let (app, _timer) = test_app();
    let (status, body) = send(&app, "POST", "/timer/start", Some(json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["timer"]["duration_seconds"], 90);
    assert_eq!(body["timer"]["remaining_seconds"], 90);
    assert_eq!(body["timer"]["display"], "1:30");
    assert!(body["ends_at"].is_string());
}

#[tokio::test]
async fn start_with_context_and_duplicate_suppression() {
    let (app, _timer) = test_app();
    let first = json!({"duration_seconds": 60, "movement_id": "m1", "workout_id": "w1"});
    let (_, body) = send(&app, "POST", "/timer/start", Some(first)).await;
    assert_eq!(body["timer"]["context"]["movement_id"], "m1");
    assert_eq!(body["timer"]["context"]["workout_id"], "w1");

    let again = json!({"duration_seconds": 30, "movement_id": "m1"});
    let (status, body) = send(&app, "POST", "/timer/start", Some(again)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["duration_seconds"], 60);
}

#[tokio::test]
async fn negative_duration_is_clamped() {
    let (app, _timer) = test_app();
    let (status, body) =
        send(&app, "POST", "/timer/start", Some(json!({"duration_seconds": -15}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["duration_seconds"], 0);
}

#[tokio::test]
async fn pause_resume_and_add_time() {
    let (app, _timer) = test_app();
    send(&app, "POST", "/timer/start", Some(json!({"duration_seconds": 60}))).await;

    let (_, body) = post(&app, "/timer/pause").await;
    assert_eq!(body["status"], "paused");
    assert_eq!(body["timer"]["is_paused"], true);
    assert!(body["ends_at"].is_null());

    let (_, body) = send(&app, "POST", "/timer/add-time", Some(json!({"delta_seconds": 30}))).await;
    assert_eq!(body["timer"]["duration_seconds"], 60);

    let (_, body) = post(&app, "/timer/resume").await;
    assert_eq!(body["status"], "running");

    let (_, body) = send(&app, "POST", "/timer/add-time", Some(json!({"delta_seconds": 30}))).await;
    assert_eq!(body["timer"]["duration_seconds"], 90);
}

#[tokio::test]
async fn reset_and_cancel() {
    let (app, _timer) = test_app();
    let (_, body) = post(&app, "/timer/reset").await;
    assert_eq!(body["status"], "idle");

    send(&app, "POST", "/timer/start", Some(json!({"duration_seconds": 45}))).await;
    let (_, body) = post(&app, "/timer/reset").await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["timer"]["remaining_seconds"], 45);

    let (_, body) = post(&app, "/timer/cancel").await;
    assert_eq!(body["status"], "idle");
    assert_eq!(body["timer"]["duration_seconds"], 0);
    assert!(body["timer"]["context"].is_null());

    let (status, _) = post(&app, "/timer/cancel").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (app, _timer) = test_app();
    let (status, _) = send(&app, "POST", "/timer/add-time", Some(json!({"delta": "soon"}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn lifecycle_endpoints_reach_the_bridge() {
    let (app, timer) = test_app();
    send(&app, "POST", "/timer/start", Some(json!({"duration_seconds": 60}))).await;
    assert!(timer.is_ticking());

    let (status, _) = post(&app, "/lifecycle/background").await;
    assert_eq!(status, StatusCode::OK);
    for _ in 0..20 {
        if !timer.is_ticking() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(!timer.is_ticking());

    let (status, _) = post(&app, "/lifecycle/foreground").await;
    assert_eq!(status, StatusCode::OK);
    for _ in 0..20 {
        if timer.is_ticking() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(timer.is_ticking());
}

#[tokio::test]
async fn status_reports_last_action() {
    let (app, _timer) = test_app();
    post(&app, "/timer/cancel").await;

    let (status, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_action"], "cancel");
    assert_eq!(body["default_rest_seconds"], 90);
    assert_eq!(body["timer"]["phase"], "idle");
}

#[tokio::test]
async fn timer_and_health_endpoints() {
    let (app, _timer) = test_app();
    let (status, body) = send(&app, "GET", "/timer", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["phase"], "idle");

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn huge_durations_do_not_crash_handlers() {
    let (app, _timer) = test_app();
    let (status, body) =
        send(&app, "POST", "/timer/start", Some(json!({"duration_seconds": 1e18}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["timer"]["duration_seconds"], 1_000_000_000_000_000_000u64);
    assert!(body["ends_at"].is_null());

    let mut last = Value::Null;
    for _ in 0..3 {
        let (status, body) =
            send(&app, "POST", "/timer/add-time", Some(json!({"delta_seconds": 1e300}))).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }
    assert_eq!(last["timer"]["duration_seconds"], u64::MAX);
    assert!(last["timer"]["remaining_seconds"].as_u64().unwrap() <= u64::MAX);

    let (status, body) = post(&app, "/timer/pause").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paused");
}

/// Pull SSE chunks until one complete snapshot event is buffered, then return it.
async fn next_snapshot<S, E>(stream: &mut S, buffer: &mut String) -> Value
where
    S: futures::Stream<Item = Result<axum::body::Bytes, E>> + Unpin,
    E: std::fmt::Debug,
{
    loop {
        if let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            if !frame.contains("event: snapshot") {
                continue;
            }
            let data = frame
                .lines()
                .find_map(|line| line.strip_prefix("data: "))
                .expect("snapshot frame without data");
            return serde_json::from_str(data).unwrap();
        }
        let chunk = stream.next().await.expect("stream ended early").unwrap();
        buffer.push_str(std::str::from_utf8(&chunk).unwrap());
    }
}

#[tokio::test]
async fn stream_emits_current_snapshot_then_changes() {
    let (app, timer) = test_app();
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/timer/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut stream = response.into_body().into_data_stream();
    let mut buffer = String::new();
    let wait = std::time::Duration::from_secs(5);

    let first = tokio::time::timeout(wait, next_snapshot(&mut stream, &mut buffer))
        .await
        .expect("no initial snapshot");
    assert_eq!(first["phase"], "idle");

    timer.start(75, None);
    let second = tokio::time::timeout(wait, next_snapshot(&mut stream, &mut buffer))
        .await
        .expect("no snapshot after start");
    assert_eq!(second["phase"], "running");
    assert_eq!(second["duration_seconds"], 75);
}
