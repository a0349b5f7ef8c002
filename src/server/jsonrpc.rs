use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::model::Transport;
use crate::protocol::jsonrpc::{
    JsonRpcId, JsonRpcRequest, JsonRpcResponse, CREATE_USER, INVALID_PARAMS, INVALID_REQUEST,
    LIST_USERS, METHOD_NOT_FOUND, PARSE_ERROR,
};

use super::AppState;

/// `POST /rpc`. Always answers HTTP 200; failures travel in the envelope.
pub(super) async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Json<JsonRpcResponse> {
    let started = Instant::now();

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse JSON-RPC request");
            state.record(Transport::JsonRpc, "unknown", "parse_error", started);
            return Json(JsonRpcResponse::error(
                JsonRpcId::Null,
                PARSE_ERROR,
                format!("Parse error: {e}"),
            ));
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(raw.clone()) {
        Ok(req) => req,
        Err(e) => {
            let id = raw
                .get("id")
                .and_then(|v| serde_json::from_value::<JsonRpcId>(v.clone()).ok())
                .unwrap_or(JsonRpcId::Null);
            state.record(Transport::JsonRpc, "unknown", "invalid_request", started);
            return Json(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            ));
        }
    };

    let id = request.id.clone().unwrap_or(JsonRpcId::Null);
    let params = request.params.unwrap_or(json!({}));

    let (response, outcome) = match request.method.as_str() {
        LIST_USERS => (
            JsonRpcResponse::success(id, json!(state.store.list())),
            "success",
        ),
        CREATE_USER => {
            let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
            let email = params.get("email").and_then(Value::as_str).unwrap_or_default();
            match state.store.create(name, email) {
                Ok(user) => (JsonRpcResponse::success(id, json!(user)), "success"),
                Err(e) => {
                    tracing::debug!(error = %e, "JSON-RPC create rejected");
                    (
                        JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
                        "input_error",
                    )
                }
            }
        }
        method => (
            JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
            "method_not_found",
        ),
    };

    state.record(Transport::JsonRpc, &request.method, outcome, started);
    Json(response)
}
