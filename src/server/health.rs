use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use super::AppState;

pub(super) async fn liveness() -> Json<Value> {
    Json(json!({"ok": true}))
}

pub(super) async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(m) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            m.gather_text(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "Metrics not enabled",
        )
            .into_response(),
    }
}
