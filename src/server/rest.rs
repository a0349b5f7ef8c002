use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::model::{Transport, User};

use super::AppState;

pub(super) const USERS_ROUTE: &str = "/rest/users";
pub(super) const DOCS_ROUTE: &str = "/rest/docs";

pub(super) async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let started = Instant::now();
    let users = state.store.list();
    state.record(Transport::Rest, "listUsers", "success", started);
    Json(users)
}

/// `POST /rest/users`: 201 with the new user, 400 `{error}` otherwise.
pub(super) async fn create_user(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let started = Instant::now();

    let parsed: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            state.record(Transport::Rest, "createUser", "input_error", started);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("invalid JSON body: {e}") })),
            );
        }
    };

    let name = parsed.get("name").and_then(Value::as_str).unwrap_or_default();
    let email = parsed.get("email").and_then(Value::as_str).unwrap_or_default();

    match state.store.create(name, email) {
        Ok(user) => {
            state.record(Transport::Rest, "createUser", "success", started);
            tracing::debug!(id = %user.id, "REST user created");
            (StatusCode::CREATED, Json(json!(user)))
        }
        Err(e) => {
            state.record(Transport::Rest, "createUser", "input_error", started);
            tracing::debug!(error = %e, "REST create rejected");
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
        }
    }
}

/// OpenAPI 3 description of the REST routes.
pub(super) async fn openapi_document() -> Json<Value> {
    let user_ref = json!({ "$ref": "#/components/schemas/User" });
    Json(json!({
        "openapi": "3.0.3",
        "info": {
            "title": "api-fest REST",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {
            "/rest/users": {
                "get": {
                    "summary": "List users",
                    "responses": {
                        "200": {
                            "description": "All users",
                            "content": { "application/json": {
                                "schema": { "type": "array", "items": user_ref }
                            }}
                        }
                    }
                },
                "post": {
                    "summary": "Create a user",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": {
                            "schema": { "$ref": "#/components/schemas/CreateUserInput" }
                        }}
                    },
                    "responses": {
                        "201": {
                            "description": "Created user",
                            "content": { "application/json": { "schema": user_ref }}
                        },
                        "400": {
                            "description": "name/email missing",
                            "content": { "application/json": {
                                "schema": { "$ref": "#/components/schemas/Error" }
                            }}
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "User": {
                    "type": "object",
                    "required": ["id", "name", "email"],
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "email": { "type": "string" }
                    }
                },
                "CreateUserInput": {
                    "type": "object",
                    "required": ["name", "email"],
                    "properties": {
                        "name": { "type": "string" },
                        "email": { "type": "string" }
                    }
                },
                "Error": {
                    "type": "object",
                    "properties": { "error": { "type": "string" } }
                }
            }
        }
    }))
}
