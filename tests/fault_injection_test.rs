//! Adapters against canned backends that misbehave on purpose.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use api_fest::client::{
    build_http_client, GraphQlAdapter, JsonRpcAdapter, RestAdapter, TrpcAdapter,
};
use api_fest::model::CreateUserInput;

async fn serve_canned(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    build_http_client(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn graphql_errors_on_200_are_errors() {
    let base = serve_canned(Router::new().route(
        "/graphql",
        post(|| async {
            Json(json!({
                "data": {"users": []},
                "errors": [{"message": "resolver exploded", "extensions": {"code": "INTERNAL_SERVER_ERROR"}}]
            }))
        }),
    ))
    .await;

    let adapter = GraphQlAdapter::new(client(), &base);
    let err = adapter.list_users().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.trace().status, Some(200));
    assert!(err.to_string().contains("resolver exploded"));
}

#[tokio::test]
async fn graphql_null_errors_is_success() {
    let base = serve_canned(Router::new().route(
        "/graphql",
        post(|| async { Json(json!({"data": {"users": []}, "errors": null})) }),
    ))
    .await;

    let adapter = GraphQlAdapter::new(client(), &base);
    let listed = adapter.list_users().await.unwrap();
    assert!(listed.data.is_empty());
    assert_eq!(listed.trace.response_wire["errors"], Value::Null);
}

#[tokio::test]
async fn graphql_missing_root_field_is_error() {
    let base = serve_canned(Router::new().route(
        "/graphql",
        post(|| async { Json(json!({"data": {}})) }),
    ))
    .await;

    let adapter = GraphQlAdapter::new(client(), &base);
    let err = adapter.list_users().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.trace().response_wire, json!({"data": {}}));
}

#[tokio::test]
async fn non_json_body_keeps_raw_text() {
    let base = serve_canned(Router::new().route(
        "/rest/users",
        get(|| async { (StatusCode::OK, "<html>gateway timeout page</html>") }),
    ))
    .await;

    let adapter = RestAdapter::new(client(), &base);
    let err = adapter.list_users().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(
        err.trace().response_wire,
        Value::String("<html>gateway timeout page</html>".to_string())
    );
    assert_eq!(err.trace().status, Some(200));
}

#[tokio::test]
async fn rest_server_error_is_transport_error() {
    let base = serve_canned(Router::new().route(
        "/rest/users",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "database on fire"})),
            )
        }),
    ))
    .await;

    let adapter = RestAdapter::new(client(), &base);
    let err = adapter
        .create_user(&CreateUserInput::new("A", "a@b.c"))
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("database on fire"));
    assert_eq!(err.trace().status, Some(500));
}

#[tokio::test]
async fn rest_unprocessable_is_input_error() {
    let base = serve_canned(Router::new().route(
        "/rest/users",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"error": "email looks wrong"})),
            )
        }),
    ))
    .await;

    let adapter = RestAdapter::new(client(), &base);
    let err = adapter
        .create_user(&CreateUserInput::new("A", "a"))
        .await
        .unwrap_err();
    assert!(err.is_input());
}

#[tokio::test]
async fn jsonrpc_error_wins_over_http_status() {
    let base = serve_canned(Router::new().route(
        "/rpc",
        post(|Json(req): Json<Value>| async move {
            let id = req["id"].clone();
            Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32603, "message": "Internal error"}
            }))
        }),
    ))
    .await;

    let adapter = JsonRpcAdapter::new(client(), &base);
    let err = adapter.list_users().await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("-32603"));
}

#[tokio::test]
async fn jsonrpc_result_on_http_500_is_success() {
    let base = serve_canned(Router::new().route(
        "/rpc",
        post(|Json(req): Json<Value>| async move {
            let id = req["id"].clone();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"jsonrpc": "2.0", "id": id, "result": []})),
            )
        }),
    ))
    .await;

    let adapter = JsonRpcAdapter::new(client(), &base);
    let listed = adapter.list_users().await.unwrap();
    assert!(listed.data.is_empty());
    assert_eq!(listed.trace.status, Some(500));
}

#[tokio::test]
async fn jsonrpc_envelope_without_result_or_error_is_malformed() {
    let base = serve_canned(Router::new().route(
        "/rpc",
        post(|| async { Json(json!({"jsonrpc": "2.0", "id": 1})) }),
    ))
    .await;

    let adapter = JsonRpcAdapter::new(client(), &base);
    let err = adapter.list_users().await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("neither result nor error"));
}

#[tokio::test]
async fn trpc_envelope_is_authoritative() {
    let base = serve_canned(Router::new().route(
        "/trpc/{path}",
        get(|| async {
            (
                StatusCode::OK,
                Json(json!({
                    "error": {
                        "message": "boom",
                        "code": -32603,
                        "data": {"code": "INTERNAL_SERVER_ERROR", "httpStatus": 500, "path": "user.listUsers"}
                    }
                })),
            )
        }),
    ))
    .await;

    let adapter = TrpcAdapter::new(client(), &base, false);
    let err = adapter.list_users().await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("INTERNAL_SERVER_ERROR"));
}

#[tokio::test]
async fn null_error_members_are_absent_on_every_envelope_protocol() {
    let base = serve_canned(
        Router::new()
            .route(
                "/rpc",
                post(|Json(req): Json<Value>| async move {
                    let id = req["id"].clone();
                    Json(json!({"jsonrpc": "2.0", "id": id, "result": [], "error": null}))
                }),
            )
            .route(
                "/trpc/{path}",
                get(|| async { Json(json!({"result": {"data": []}, "error": null})) }),
            ),
    )
    .await;

    let rpc = JsonRpcAdapter::new(client(), &base);
    assert!(rpc.list_users().await.unwrap().data.is_empty());

    let trpc = TrpcAdapter::new(client(), &base, false);
    let listed = trpc.list_users().await.unwrap();
    assert!(listed.data.is_empty());
    assert_eq!(
        listed.trace.response_wire,
        json!({"result": {"data": []}, "error": null})
    );
}

#[tokio::test]
async fn slow_backend_hits_timeout() {
    let base = serve_canned(Router::new().route(
        "/rest/users",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!([]))
        }),
    ))
    .await;

    let client = build_http_client(Duration::from_millis(200)).unwrap();
    let adapter = RestAdapter::new(client, &base);
    let err = adapter.list_users().await.unwrap_err();
    assert!(err.is_request());
    assert_eq!(err.trace().status, None);
}
