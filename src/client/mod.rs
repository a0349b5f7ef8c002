mod error;
mod graphql;
mod http;
mod jsonrpc;
mod rest;
mod selector;
mod trpc;

pub use error::ApiError;
pub use graphql::{GraphQlAdapter, GRAPHQL_PATH};
pub use http::{build_http_client, normalize_base_url};
pub use jsonrpc::{JsonRpcAdapter, RPC_PATH};
pub use rest::{RestAdapter, USERS_PATH};
pub use selector::AdapterSelector;
pub use trpc::{TrpcAdapter, TRPC_PATH};

use crate::model::{CallResult, CreateUserInput, Transport, User};

/// The capability every transport offers: list users and create one.
///
/// Each call performs exactly one network round trip and returns the data
/// together with the trace of that exchange.
#[derive(Clone)]
pub enum Adapter {
    Rest(RestAdapter),
    GraphQl(GraphQlAdapter),
    JsonRpc(JsonRpcAdapter),
    Trpc(TrpcAdapter),
}

impl Adapter {
    pub fn transport(&self) -> Transport {
        match self {
            Adapter::Rest(_) => Transport::Rest,
            Adapter::GraphQl(_) => Transport::GraphQl,
            Adapter::JsonRpc(_) => Transport::JsonRpc,
            Adapter::Trpc(_) => Transport::Trpc,
        }
    }

    pub async fn list_users(&self) -> Result<CallResult<Vec<User>>, ApiError> {
        match self {
            Adapter::Rest(a) => a.list_users().await,
            Adapter::GraphQl(a) => a.list_users().await,
            Adapter::JsonRpc(a) => a.list_users().await,
            Adapter::Trpc(a) => a.list_users().await,
        }
    }

    pub async fn create_user(&self, input: &CreateUserInput) -> Result<CallResult<User>, ApiError> {
        match self {
            Adapter::Rest(a) => a.create_user(input).await,
            Adapter::GraphQl(a) => a.create_user(input).await,
            Adapter::JsonRpc(a) => a.create_user(input).await,
            Adapter::Trpc(a) => a.create_user(input).await,
        }
    }
}
