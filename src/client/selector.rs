use reqwest::Client;

use crate::model::Transport;

use super::{Adapter, GraphQlAdapter, JsonRpcAdapter, RestAdapter, TrpcAdapter};

/// One adapter per transport, built once and reused for the whole session.
///
/// Selecting is a pure lookup. Calls already issued through an adapter are
/// unaffected by later selections, and the JSON-RPC id counter survives
/// switching away and back.
pub struct AdapterSelector {
    rest: Adapter,
    graphql: Adapter,
    jsonrpc: Adapter,
    trpc: Adapter,
}

impl AdapterSelector {
    pub fn new(client: Client, base_url: &str, trpc_batch: bool) -> Self {
        Self {
            rest: Adapter::Rest(RestAdapter::new(client.clone(), base_url)),
            graphql: Adapter::GraphQl(GraphQlAdapter::new(client.clone(), base_url)),
            jsonrpc: Adapter::JsonRpc(JsonRpcAdapter::new(client.clone(), base_url)),
            trpc: Adapter::Trpc(TrpcAdapter::new(client, base_url, trpc_batch)),
        }
    }

    pub fn select(&self, transport: Transport) -> &Adapter {
        match transport {
            Transport::Rest => &self.rest,
            Transport::GraphQl => &self.graphql,
            Transport::JsonRpc => &self.jsonrpc,
            Transport::Trpc => &self.trpc,
        }
    }

    /// All adapters in selector order.
    pub fn iter(&self) -> impl Iterator<Item = &Adapter> {
        Transport::ALL.into_iter().map(|t| self.select(t))
    }
}
