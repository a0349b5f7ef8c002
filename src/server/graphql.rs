use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::model::{Transport, User};
use crate::protocol::graphql::{
    parse_operation, project_user, GraphQlError, GraphQlRequest, GraphQlResponse, Operation,
    OperationKind, BAD_REQUEST, BAD_USER_INPUT, CREATE_USER_FIELD, PARSE_FAILED, USERS_FIELD,
    VALIDATION_FAILED,
};

use super::AppState;

/// `POST /graphql`.
///
/// Document and validation failures answer 400 with `data` omitted. A
/// resolver rejecting its input answers 200 with `data: null` and a
/// `BAD_USER_INPUT` error, so clients must read the envelope.
pub(super) async fn handle_graphql(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<GraphQlResponse>) {
    let started = Instant::now();

    let request: GraphQlRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            state.record(Transport::GraphQl, "unknown", "bad_request", started);
            return (
                StatusCode::BAD_REQUEST,
                Json(GraphQlResponse::request_error(GraphQlError::with_code(
                    format!("POST body must be a GraphQL request: {e}"),
                    BAD_REQUEST,
                ))),
            );
        }
    };

    let op = match parse_operation(&request.query) {
        Ok(op) => op,
        Err(e) => {
            tracing::debug!(error = %e, "GraphQL document rejected");
            state.record(Transport::GraphQl, "unknown", "parse_error", started);
            return (
                StatusCode::BAD_REQUEST,
                Json(GraphQlResponse::request_error(GraphQlError::with_code(
                    e.to_string(),
                    PARSE_FAILED,
                ))),
            );
        }
    };

    let (status, response, outcome) = execute(&state, &op, request.variables.as_ref());
    state.record(Transport::GraphQl, &op.field, outcome, started);
    (status, Json(response))
}

fn execute(
    state: &AppState,
    op: &Operation,
    variables: Option<&Value>,
) -> (StatusCode, GraphQlResponse, &'static str) {
    match (op.kind, op.field.as_str()) {
        (OperationKind::Query, USERS_FIELD) => {
            let projected: Result<Vec<Value>, String> = state
                .store
                .list()
                .iter()
                .map(|u| project_user(u, &op.selection))
                .collect();
            match projected {
                Ok(users) => (
                    StatusCode::OK,
                    GraphQlResponse::data(json!({ USERS_FIELD: users })),
                    "success",
                ),
                Err(message) => validation_failure(message),
            }
        }
        (OperationKind::Mutation, CREATE_USER_FIELD) => {
            // Check the selection first so an invalid document never mutates.
            if let Err(message) = check_selection(&op.selection) {
                return validation_failure(message);
            }
            let name = op.string_argument("name", variables).unwrap_or_default();
            let email = op.string_argument("email", variables).unwrap_or_default();
            match state.store.create(&name, &email) {
                Ok(user) => match project_user(&user, &op.selection) {
                    Ok(value) => (
                        StatusCode::OK,
                        GraphQlResponse::data(json!({ CREATE_USER_FIELD: value })),
                        "success",
                    ),
                    Err(message) => validation_failure(message),
                },
                Err(e) => (
                    StatusCode::OK,
                    GraphQlResponse::field_error(GraphQlError::with_code(
                        e.to_string(),
                        BAD_USER_INPUT,
                    )),
                    "input_error",
                ),
            }
        }
        (kind, field) => {
            let type_name = match kind {
                OperationKind::Query => "Query",
                OperationKind::Mutation => "Mutation",
            };
            validation_failure(format!(
                "Cannot query field \"{field}\" on type \"{type_name}\"."
            ))
        }
    }
}

fn check_selection(selection: &[String]) -> Result<(), String> {
    let probe = User {
        id: String::new(),
        name: String::new(),
        email: String::new(),
    };
    project_user(&probe, selection).map(|_| ())
}

fn validation_failure(message: String) -> (StatusCode, GraphQlResponse, &'static str) {
    (
        StatusCode::BAD_REQUEST,
        GraphQlResponse::request_error(GraphQlError::with_code(message, VALIDATION_FAILED)),
        "validation_error",
    )
}
