mod graphql;
mod health;
mod jsonrpc;
mod rest;
mod trpc;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::metrics::Metrics;
use crate::model::Transport;
use crate::store::UserStore;

/// Shared handler state: the injected store and optional metrics.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStore>,
    pub metrics: Option<Arc<Metrics>>,
}

impl AppState {
    pub fn new(store: Arc<UserStore>, metrics: Option<Arc<Metrics>>) -> Self {
        Self { store, metrics }
    }

    /// Fresh empty store, metrics disabled.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(UserStore::new()), None)
    }

    fn record(&self, transport: Transport, operation: &str, outcome: &str, started: Instant) {
        if let Some(m) = &self.metrics {
            m.record_request(
                transport.label(),
                operation,
                outcome,
                started.elapsed().as_secs_f64(),
            );
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::liveness))
        .route("/metrics", get(health::metrics_handler))
        .route(
            rest::USERS_ROUTE,
            get(rest::list_users).post(rest::create_user),
        )
        .route(rest::DOCS_ROUTE, get(rest::openapi_document))
        .route("/rpc", post(jsonrpc::handle_rpc))
        .route("/graphql", post(graphql::handle_graphql))
        .route(
            "/trpc/{path}",
            get(trpc::handle_get).post(trpc::handle_post),
        )
        .layer(cors)
        .with_state(state)
}

pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))
}

/// Serves on an already bound listener until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = listener.local_addr()?;
    tracing::info!(addr = %addr, "Server listening");
    tracing::info!("REST     -> /rest/users");
    tracing::info!("JSON-RPC -> /rpc");
    tracing::info!("GraphQL  -> /graphql");
    tracing::info!("tRPC     -> /trpc");
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

pub async fn run_server(
    addr: &str,
    state: AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = bind(addr).await?;
    serve(listener, state, cancel).await
}

/// Starts the server in the background.
///
/// Returns the bound address (useful with port 0) and the token that stops
/// it.
pub async fn spawn_server(
    addr: &str,
    state: AppState,
) -> anyhow::Result<(SocketAddr, CancellationToken)> {
    let listener = bind(addr).await?;
    let local = listener.local_addr()?;
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = serve(listener, state, token).await {
            tracing::error!(error = %e, "Server error");
        }
    });
    Ok((local, cancel))
}
