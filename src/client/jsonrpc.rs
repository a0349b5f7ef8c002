use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::model::{CallResult, CreateUserInput, Trace, Transport, User};
use crate::protocol::id_counter::RequestIdCounter;
use crate::protocol::jsonrpc::{
    JsonRpcError, JsonRpcRequest, CREATE_USER, INVALID_PARAMS, LIST_USERS,
};

use super::error::ApiError;
use super::http::{decode, exchange, normalize_base_url, PendingTrace};

pub const RPC_PATH: &str = "/rpc";

/// JSON-RPC 2.0 adapter on `POST /rpc`.
///
/// Clones share one id counter, so ids stay strictly increasing across every
/// call made through the same adapter. Only the `error` member of the
/// response signals failure; HTTP status is informational.
#[derive(Clone)]
pub struct JsonRpcAdapter {
    client: Client,
    url: String,
    ids: Arc<RequestIdCounter>,
}

impl JsonRpcAdapter {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{RPC_PATH}", normalize_base_url(base_url)),
            ids: Arc::new(RequestIdCounter::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The id the next request will carry.
    pub fn next_id(&self) -> u64 {
        self.ids.peek()
    }

    pub async fn list_users(&self) -> Result<CallResult<Vec<User>>, ApiError> {
        let (data, trace) = self.call(LIST_USERS, json!({})).await?;
        Ok(CallResult { data, trace })
    }

    pub async fn create_user(&self, input: &CreateUserInput) -> Result<CallResult<User>, ApiError> {
        let params = json!({ "name": input.name, "email": input.email });
        let (data, trace) = self.call(CREATE_USER, params).await?;
        Ok(CallResult { data, trace })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<(T, Trace), ApiError> {
        let request = JsonRpcRequest::call(self.ids.next_id(), method, params);
        let wire = json!({
            "jsonrpc": request.jsonrpc,
            "id": request.id,
            "method": request.method,
            "params": request.params,
        });
        let pending = PendingTrace::start(
            Transport::JsonRpc,
            format!("POST {RPC_PATH}"),
            Some(format!("method={method}")),
            wire.clone(),
        );

        let ex = exchange(self.client.post(&self.url).json(&wire), pending).await?;

        if let Some(reason) = ex.malformed {
            return Err(ApiError::transport(reason, ex.trace));
        }

        if let Some(error) = ex.body.get("error").filter(|e| !e.is_null()) {
            return Err(match serde_json::from_value::<JsonRpcError>(error.clone()) {
                Ok(e) if e.code == INVALID_PARAMS => ApiError::input(e.message, ex.trace),
                Ok(e) => ApiError::transport(format!("{} ({})", e.message, e.code), ex.trace),
                Err(_) => ApiError::transport(format!("JSON-RPC error: {error}"), ex.trace),
            });
        }

        match ex.body.get("result").cloned() {
            Some(result) => decode(result, ex.trace),
            None => Err(ApiError::transport(
                "response has neither result nor error",
                ex.trace,
            )),
        }
    }
}
