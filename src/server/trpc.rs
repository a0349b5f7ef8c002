use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::model::Transport;
use crate::protocol::trpc::{
    batch_input_at, error_envelope, procedure_kind, success_envelope, ProcedureKind, TrpcCode,
    CREATE_USER, LIST_USERS,
};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub(super) struct TrpcParams {
    batch: Option<String>,
    input: Option<String>,
}

impl TrpcParams {
    fn is_batch(&self) -> bool {
        matches!(self.batch.as_deref(), Some("1") | Some("true"))
    }
}

/// `GET /trpc/{path}`: queries, input JSON-encoded in `?input=`.
pub(super) async fn handle_get(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<TrpcParams>,
) -> (StatusCode, Json<Value>) {
    let input = match params.input.as_deref() {
        None | Some("") => Ok(Value::Null),
        Some(raw) => serde_json::from_str::<Value>(raw),
    };
    dispatch(&state, &path, ProcedureKind::Query, params.is_batch(), input)
}

/// `POST /trpc/{path}`: mutations, input as the JSON body.
pub(super) async fn handle_post(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<TrpcParams>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let input = if body.is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_slice::<Value>(&body)
    };
    dispatch(&state, &path, ProcedureKind::Mutation, params.is_batch(), input)
}

fn dispatch(
    state: &AppState,
    path: &str,
    verb: ProcedureKind,
    batch: bool,
    input: Result<Value, serde_json::Error>,
) -> (StatusCode, Json<Value>) {
    let paths: Vec<&str> = if batch {
        path.split(',').collect()
    } else {
        vec![path]
    };

    let input = match input {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, path, "tRPC input is not JSON");
            let message = format!("Invalid input JSON: {e}");
            let envelopes: Vec<Value> = paths
                .iter()
                .map(|p| error_envelope(TrpcCode::BadRequest, &message, p))
                .collect();
            return if batch {
                (StatusCode::MULTI_STATUS, Json(Value::Array(envelopes)))
            } else {
                let status = http_status(TrpcCode::BadRequest);
                (status, Json(envelopes.into_iter().next().unwrap_or(Value::Null)))
            };
        }
    };

    if !batch {
        let (envelope, code) = run_procedure(state, path, verb, input);
        let status = code.map(http_status).unwrap_or(StatusCode::OK);
        return (status, Json(envelope));
    }

    let mut all_ok = true;
    let envelopes: Vec<Value> = paths
        .iter()
        .enumerate()
        .map(|(index, p)| {
            let (envelope, code) = run_procedure(state, p, verb, batch_input_at(Some(&input), index));
            all_ok &= code.is_none();
            envelope
        })
        .collect();

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (status, Json(Value::Array(envelopes)))
}

/// Runs one procedure call, returning its envelope and the error code if it
/// failed.
fn run_procedure(
    state: &AppState,
    path: &str,
    verb: ProcedureKind,
    input: Value,
) -> (Value, Option<TrpcCode>) {
    let started = Instant::now();
    let verb_name = match verb {
        ProcedureKind::Query => "query",
        ProcedureKind::Mutation => "mutation",
    };

    let result = match procedure_kind(path) {
        None => Err((
            TrpcCode::NotFound,
            format!("No \"{verb_name}\"-procedure on path \"{path}\""),
        )),
        Some(kind) if kind != verb => Err((
            TrpcCode::MethodNotSupported,
            format!("Unsupported {verb_name} for procedure \"{path}\""),
        )),
        Some(_) => match path {
            LIST_USERS => Ok(json!(state.store.list())),
            CREATE_USER => {
                let name = input.get("name").and_then(Value::as_str).unwrap_or_default();
                let email = input.get("email").and_then(Value::as_str).unwrap_or_default();
                state
                    .store
                    .create(name, email)
                    .map(|user| json!(user))
                    .map_err(|e| (TrpcCode::BadRequest, e.to_string()))
            }
            _ => Err((
                TrpcCode::NotFound,
                format!("No \"{verb_name}\"-procedure on path \"{path}\""),
            )),
        },
    };

    match result {
        Ok(data) => {
            state.record(Transport::Trpc, path, "success", started);
            (success_envelope(data), None)
        }
        Err((code, message)) => {
            tracing::debug!(path, code = code.as_str(), "tRPC procedure failed");
            let outcome = match code {
                TrpcCode::BadRequest => "input_error",
                TrpcCode::NotFound => "not_found",
                TrpcCode::MethodNotSupported => "method_not_supported",
            };
            state.record(Transport::Trpc, path, outcome, started);
            (error_envelope(code, &message, path), Some(code))
        }
    }
}

fn http_status(code: TrpcCode) -> StatusCode {
    StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::server::{build_router, AppState};

    use super::*;

    async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_list() {
        let app = build_router(AppState::in_memory());
        let (status, created) = send(
            app.clone(),
            post(
                "/trpc/user.createUser",
                r#"{"name":"Link","email":"hero@hyrulekingdom.com"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["result"]["data"]["id"], "1");

        let (status, listed) = send(app, get("/trpc/user.listUsers")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["result"]["data"][0]["name"], "Link");
    }

    #[tokio::test]
    async fn missing_input_is_bad_request() {
        let app = build_router(AppState::in_memory());
        let (status, body) = send(app, post("/trpc/user.createUser", r#"{"name":"x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["data"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["message"], "name/email required");
        assert_eq!(body["error"]["data"]["path"], CREATE_USER);
    }

    #[tokio::test]
    async fn unknown_procedure_is_not_found() {
        let app = build_router(AppState::in_memory());
        let (status, body) = send(app, get("/trpc/user.deleteUser")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["data"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn wrong_verb_is_method_not_supported() {
        let app = build_router(AppState::in_memory());
        let (status, body) = send(app, get("/trpc/user.createUser")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"]["data"]["code"], "METHOD_NOT_SUPPORTED");
    }

    #[tokio::test]
    async fn batched_queries_answer_in_order() {
        let state = AppState::in_memory();
        state.store.create("Mob", "mob@psycho.com").unwrap();
        let app = build_router(state);
        let (status, body) = send(
            app,
            get("/trpc/user.listUsers,user.listUsers?batch=1&input=%7B%7D"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["result"]["data"][0]["name"], "Mob");
    }

    #[tokio::test]
    async fn batch_with_failure_is_multi_status() {
        let app = build_router(AppState::in_memory());
        let (status, body) = send(
            app,
            get("/trpc/user.listUsers,user.nope?batch=1"),
        )
        .await;
        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert!(body[0]["result"]["data"].is_array());
        assert_eq!(body[1]["error"]["data"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn batched_mutation_reads_indexed_input() {
        let app = build_router(AppState::in_memory());
        let (status, body) = send(
            app,
            post(
                "/trpc/user.createUser?batch=1",
                r#"{"0":{"name":"Gandalf","email":"gandalf@middleearth.com"}}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["result"]["data"]["name"], "Gandalf");
    }

    #[tokio::test]
    async fn invalid_input_json_is_bad_request() {
        let app = build_router(AppState::in_memory());
        let (status, body) = send(app, post("/trpc/user.createUser", "{oops")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["data"]["code"], "BAD_REQUEST");
    }
}
