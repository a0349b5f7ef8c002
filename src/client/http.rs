use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::model::{Trace, Transport};

use super::error::ApiError;

/// Build a shared reqwest HTTP client with connection pooling.
///
/// `timeout` bounds each whole request; a call that never resolves surfaces
/// as [`ApiError::Request`].
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .tcp_nodelay(true)
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(5))
        .timeout(timeout)
        .build()
}

/// Strips trailing slashes so paths can be appended with `format!("{base}/..")`.
pub fn normalize_base_url(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

/// The parts of a trace known before the request leaves.
pub(crate) struct PendingTrace {
    transport: Transport,
    endpoint: String,
    meta: Option<String>,
    request_wire: Value,
    started: Instant,
}

impl PendingTrace {
    pub(crate) fn start(
        transport: Transport,
        endpoint: String,
        meta: Option<String>,
        request_wire: Value,
    ) -> Self {
        Self {
            transport,
            endpoint,
            meta,
            request_wire,
            started: Instant::now(),
        }
    }

    fn finish(self, status: Option<u16>, response_wire: Value) -> Trace {
        Trace {
            transport: self.transport,
            endpoint: self.endpoint,
            meta: self.meta,
            request_wire: self.request_wire,
            response_wire,
            status,
            ms: Some(self.started.elapsed().as_secs_f64() * 1000.0),
        }
    }
}

/// Outcome of one HTTP round trip.
pub(crate) struct Exchange {
    pub status: StatusCode,
    /// Parsed JSON body, or the raw text as a JSON string when unparseable.
    pub body: Value,
    /// Why the body could not be parsed, if it could not.
    pub malformed: Option<String>,
    pub trace: Trace,
}

/// Sends `request` once and records the round trip.
///
/// Only a failure to complete the exchange is an error here; status and
/// envelope checks belong to each protocol.
pub(crate) async fn exchange(
    request: RequestBuilder,
    pending: PendingTrace,
) -> Result<Exchange, ApiError> {
    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => return Err(request_failed(e, pending)),
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(t) => t,
        Err(e) => return Err(request_failed(e, pending)),
    };

    let (body, malformed) = match serde_json::from_str::<Value>(&text) {
        Ok(v) => (v, None),
        Err(e) => (Value::String(text), Some(format!("response body is not JSON: {e}"))),
    };

    let trace = pending.finish(Some(status.as_u16()), body.clone());
    tracing::debug!(
        transport = %trace.transport,
        endpoint = %trace.endpoint,
        status = status.as_u16(),
        ms = trace.ms.unwrap_or_default(),
        "Call completed"
    );

    Ok(Exchange {
        status,
        body,
        malformed,
        trace,
    })
}

fn request_failed(error: reqwest::Error, pending: PendingTrace) -> ApiError {
    let trace = pending.finish(None, Value::Null);
    tracing::warn!(
        transport = %trace.transport,
        endpoint = %trace.endpoint,
        error = %error,
        "Request failed"
    );
    ApiError::Request {
        source: error,
        trace: Box::new(trace),
    }
}

/// Decodes a typed payload out of a protocol's data slot.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    data: Value,
    trace: Trace,
) -> Result<(T, Trace), ApiError> {
    match serde_json::from_value::<T>(data) {
        Ok(v) => Ok((v, trace)),
        Err(e) => Err(ApiError::transport(
            format!("unexpected payload shape: {e}"),
            trace,
        )),
    }
}
