use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::model::{CallResult, CreateUserInput, Trace, Transport, User};
use crate::protocol::trpc::{
    batch_input, envelope_at, unwrap_envelope, EnvelopeError, ProcedureKind, CREATE_USER,
    LIST_USERS,
};

use super::error::ApiError;
use super::http::{decode, exchange, normalize_base_url, Exchange, PendingTrace};

pub const TRPC_PATH: &str = "/trpc";

/// tRPC-style adapter over `/trpc/<procedure>`.
///
/// With `batch` set, every call goes out as a one-element batch
/// (`?batch=1`) and the answer is read from index 0 of the returned array.
/// Traces always describe the logical call: the procedure input as
/// `request_wire` and that call's own envelope as `response_wire`.
#[derive(Clone)]
pub struct TrpcAdapter {
    client: Client,
    base: String,
    batch: bool,
}

impl TrpcAdapter {
    pub fn new(client: Client, base_url: &str, batch: bool) -> Self {
        Self {
            client,
            base: format!("{}{TRPC_PATH}", normalize_base_url(base_url)),
            batch,
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch
    }

    pub fn procedure_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    pub async fn list_users(&self) -> Result<CallResult<Vec<User>>, ApiError> {
        let (data, trace) = self.call(LIST_USERS, ProcedureKind::Query, Value::Null).await?;
        Ok(CallResult { data, trace })
    }

    pub async fn create_user(&self, input: &CreateUserInput) -> Result<CallResult<User>, ApiError> {
        let input = json!({ "name": input.name, "email": input.email });
        let (data, trace) = self
            .call(CREATE_USER, ProcedureKind::Mutation, input)
            .await?;
        Ok(CallResult { data, trace })
    }

    /// Issues several query procedures in one physical request.
    ///
    /// The outer error is a failure of the shared round trip; each inner
    /// result is one logical call with its own trace.
    pub async fn batch_queries(
        &self,
        paths: &[&str],
    ) -> Result<Vec<Result<CallResult<Value>, ApiError>>, ApiError> {
        let joined = paths.join(",");
        let inputs = vec![Value::Null; paths.len()];
        let pending = PendingTrace::start(
            Transport::Trpc,
            format!("GET {TRPC_PATH}/{joined}?batch=1"),
            Some(format!("{joined} (batched)")),
            Value::Null,
        );
        let request = self
            .client
            .get(self.procedure_url(&joined))
            .query(&[("batch", "1".to_string()), ("input", batch_input(&inputs).to_string())]);

        let ex = exchange(request, pending).await?;
        if let Some(reason) = ex.malformed {
            return Err(ApiError::transport(reason, ex.trace));
        }

        let results = paths
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let mut trace = ex.trace.clone();
                trace.meta = Some(format!("{path} (batched)"));
                if let Some(envelope) = envelope_at(&ex.body, index) {
                    trace.response_wire = envelope.clone();
                }
                match unwrap_envelope(&ex.body, index) {
                    Ok(data) => Ok(CallResult { data, trace }),
                    Err(e) => Err(envelope_failure(e, trace)),
                }
            })
            .collect();
        Ok(results)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        kind: ProcedureKind,
        input: Value,
    ) -> Result<(T, Trace), ApiError> {
        let url = self.procedure_url(path);
        let (verb, request) = match (kind, self.batch) {
            (ProcedureKind::Query, false) => ("GET", self.client.get(&url)),
            (ProcedureKind::Query, true) => (
                "GET",
                self.client.get(&url).query(&[
                    ("batch", "1".to_string()),
                    ("input", batch_input(std::slice::from_ref(&input)).to_string()),
                ]),
            ),
            (ProcedureKind::Mutation, false) => ("POST", self.client.post(&url).json(&input)),
            (ProcedureKind::Mutation, true) => (
                "POST",
                self.client
                    .post(&url)
                    .query(&[("batch", "1")])
                    .json(&batch_input(std::slice::from_ref(&input))),
            ),
        };

        let suffix = if self.batch { "?batch=1" } else { "" };
        let meta = if self.batch {
            format!("{path} (batched)")
        } else {
            path.to_string()
        };
        let pending = PendingTrace::start(
            Transport::Trpc,
            format!("{verb} {TRPC_PATH}/{path}{suffix}"),
            Some(meta),
            input,
        );

        let ex = exchange(request, pending).await?;
        let (data, trace) = unwrap_logical(ex)?;
        decode(data, trace)
    }
}

/// Unwraps call 0 and narrows the trace to that call's envelope.
fn unwrap_logical(ex: Exchange) -> Result<(Value, Trace), ApiError> {
    let mut trace = ex.trace;
    if let Some(reason) = ex.malformed {
        return Err(ApiError::transport(reason, trace));
    }
    if let Some(envelope) = envelope_at(&ex.body, 0) {
        trace.response_wire = envelope.clone();
    }
    match unwrap_envelope(&ex.body, 0) {
        Ok(data) => Ok((data, trace)),
        Err(e) => Err(envelope_failure(e, trace)),
    }
}

fn envelope_failure(error: EnvelopeError, trace: Trace) -> ApiError {
    match error {
        EnvelopeError::Procedure(shape) if shape.symbolic_code() == Some("BAD_REQUEST") => {
            ApiError::input(shape.message, trace)
        }
        EnvelopeError::Procedure(shape) => {
            let code = shape.symbolic_code().unwrap_or("UNKNOWN").to_string();
            ApiError::transport(format!("{} ({code})", shape.message), trace)
        }
        EnvelopeError::Malformed(reason) => ApiError::transport(reason, trace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::client::build_http_client;
    use crate::protocol::trpc::{error_envelope, TrpcCode};

    fn trace() -> Trace {
        Trace {
            transport: Transport::Trpc,
            endpoint: "POST /trpc/user.createUser".to_string(),
            meta: None,
            request_wire: Value::Null,
            response_wire: Value::Null,
            status: Some(400),
            ms: Some(0.0),
        }
    }

    #[test]
    fn procedure_url_joins_base_and_path() {
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let adapter = TrpcAdapter::new(client, "http://localhost:3000/", false);
        assert_eq!(
            adapter.procedure_url(LIST_USERS),
            "http://localhost:3000/trpc/user.listUsers"
        );
        assert!(!adapter.is_batching());
    }

    #[test]
    fn bad_request_envelope_is_input_error() {
        let body = error_envelope(TrpcCode::BadRequest, "name/email required", CREATE_USER);
        let err = envelope_failure(unwrap_envelope(&body, 0).unwrap_err(), trace());
        assert!(err.is_input());
    }

    #[test]
    fn not_found_envelope_is_transport_error() {
        let body = error_envelope(TrpcCode::NotFound, "No such procedure", "user.nope");
        let err = envelope_failure(unwrap_envelope(&body, 0).unwrap_err(), trace());
        assert!(err.is_transport());
        assert!(err.to_string().contains("NOT_FOUND"));
    }
}
