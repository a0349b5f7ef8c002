use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::model::{CallResult, CreateUserInput, Trace, Transport, User};
use crate::protocol::graphql::{
    GraphQlError, BAD_USER_INPUT, CREATE_MUTATION, CREATE_USER_FIELD, LIST_QUERY,
    USERS_FIELD,
};

use super::error::ApiError;
use super::http::{decode, exchange, normalize_base_url, PendingTrace};

pub const GRAPHQL_PATH: &str = "/graphql";

/// GraphQL adapter: one fixed query and one fixed mutation on `POST /graphql`.
///
/// Success means no top-level `errors` and a `data` object holding the root
/// field. A body with `errors` fails even on HTTP 200; the HTTP status alone
/// only decides when the body carries neither.
#[derive(Clone)]
pub struct GraphQlAdapter {
    client: Client,
    url: String,
}

impl GraphQlAdapter {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{GRAPHQL_PATH}", normalize_base_url(base_url)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn list_users(&self) -> Result<CallResult<Vec<User>>, ApiError> {
        let (data, trace) = self.call(LIST_QUERY, None, USERS_FIELD).await?;
        Ok(CallResult { data, trace })
    }

    pub async fn create_user(&self, input: &CreateUserInput) -> Result<CallResult<User>, ApiError> {
        let variables = json!({ "name": input.name, "email": input.email });
        let (data, trace) = self
            .call(CREATE_MUTATION, Some(variables), CREATE_USER_FIELD)
            .await?;
        Ok(CallResult { data, trace })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Value>,
        root_field: &str,
    ) -> Result<(T, Trace), ApiError> {
        let wire = json!({ "query": query, "variables": variables });
        let meta = if query.trim_start().starts_with("mutation") {
            "GraphQL mutation"
        } else {
            "GraphQL query"
        };
        let pending = PendingTrace::start(
            Transport::GraphQl,
            format!("POST {GRAPHQL_PATH}"),
            Some(meta.to_string()),
            wire.clone(),
        );

        let ex = exchange(self.client.post(&self.url).json(&wire), pending).await?;

        if let Some(reason) = ex.malformed {
            return Err(ApiError::transport(reason, ex.trace));
        }

        if let Some(errors) = ex.body.get("errors").filter(|e| !e.is_null()) {
            return Err(classify_errors(errors, ex.trace));
        }

        let Some(data) = ex.body.get("data").filter(|d| d.is_object()) else {
            let message = if ex.status.is_success() {
                "response has neither data nor errors".to_string()
            } else {
                format!("HTTP {}", ex.status.as_u16())
            };
            return Err(ApiError::transport(message, ex.trace));
        };

        let Some(field) = data.get(root_field).cloned() else {
            return Err(ApiError::transport(
                format!("data is missing field '{root_field}'"),
                ex.trace,
            ));
        };

        decode(field, ex.trace)
    }
}

/// Turns a top-level `errors` value into an error, keyed on the first entry.
fn classify_errors(errors: &Value, trace: Trace) -> ApiError {
    let first = errors
        .as_array()
        .and_then(|list| list.first())
        .and_then(|e| serde_json::from_value::<GraphQlError>(e.clone()).ok());

    match first {
        Some(err) if err.code() == Some(BAD_USER_INPUT) => ApiError::input(err.message, trace),
        Some(err) => ApiError::transport(err.message, trace),
        None => ApiError::transport("GraphQL error", trace),
    }
}
