use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::model::{CallResult, CreateUserInput, Trace, Transport, User};

use super::error::ApiError;
use super::http::{decode, exchange, normalize_base_url, Exchange, PendingTrace};

pub const USERS_PATH: &str = "/rest/users";

/// REST adapter: `GET` and `POST` on `/rest/users`.
///
/// HTTP status is authoritative. 400 and 422 mean the input was rejected.
#[derive(Clone)]
pub struct RestAdapter {
    client: Client,
    url: String,
}

impl RestAdapter {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{USERS_PATH}", normalize_base_url(base_url)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn list_users(&self) -> Result<CallResult<Vec<User>>, ApiError> {
        let pending = PendingTrace::start(
            Transport::Rest,
            format!("GET {USERS_PATH}"),
            None,
            Value::Null,
        );
        let ex = exchange(self.client.get(&self.url), pending).await?;
        let (data, trace) = check(ex)?;
        let (data, trace) = decode(data, trace)?;
        Ok(CallResult { data, trace })
    }

    pub async fn create_user(&self, input: &CreateUserInput) -> Result<CallResult<User>, ApiError> {
        let body = json!({ "name": input.name, "email": input.email });
        let pending = PendingTrace::start(
            Transport::Rest,
            format!("POST {USERS_PATH}"),
            None,
            body.clone(),
        );
        let ex = exchange(self.client.post(&self.url).json(&body), pending).await?;
        let (data, trace) = check(ex)?;
        let (data, trace) = decode(data, trace)?;
        Ok(CallResult { data, trace })
    }
}

fn check(ex: Exchange) -> Result<(Value, Trace), ApiError> {
    if !ex.status.is_success() {
        let message = ex
            .body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", ex.status.as_u16()));
        return if matches!(
            ex.status,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            Err(ApiError::input(message, ex.trace))
        } else {
            Err(ApiError::transport(message, ex.trace))
        };
    }
    if let Some(reason) = ex.malformed {
        return Err(ApiError::transport(reason, ex.trace));
    }
    Ok((ex.body, ex.trace))
}
