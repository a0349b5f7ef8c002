//! tRPC-style envelopes.
//!
//! A procedure answers with `{"result":{"data":...}}` or
//! `{"error":{"message","code","data":{"code","httpStatus","path"}}}`.
//! Batched requests (`?batch=1`) answer with an array of those envelopes in
//! call order and carry their inputs as an object keyed by call index.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const LIST_USERS: &str = "user.listUsers";
pub const CREATE_USER: &str = "user.createUser";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

/// Kind of a known procedure, `None` for unknown paths.
pub fn procedure_kind(path: &str) -> Option<ProcedureKind> {
    match path {
        LIST_USERS => Some(ProcedureKind::Query),
        CREATE_USER => Some(ProcedureKind::Mutation),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrpcCode {
    BadRequest,
    NotFound,
    MethodNotSupported,
}

impl TrpcCode {
    pub fn as_str(self) -> &'static str {
        match self {
            TrpcCode::BadRequest => "BAD_REQUEST",
            TrpcCode::NotFound => "NOT_FOUND",
            TrpcCode::MethodNotSupported => "METHOD_NOT_SUPPORTED",
        }
    }

    pub fn json_rpc_code(self) -> i32 {
        match self {
            TrpcCode::BadRequest => -32600,
            TrpcCode::NotFound => -32004,
            TrpcCode::MethodNotSupported => -32005,
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            TrpcCode::BadRequest => 400,
            TrpcCode::NotFound => 404,
            TrpcCode::MethodNotSupported => 405,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub code: String,
    #[serde(default, rename = "httpStatus", skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorShape {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub data: Option<ErrorData>,
}

impl ErrorShape {
    /// The symbolic code (`BAD_REQUEST`, ...) if present.
    pub fn symbolic_code(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.code.as_str())
    }
}

pub fn success_envelope(data: Value) -> Value {
    json!({ "result": { "data": data } })
}

pub fn error_envelope(code: TrpcCode, message: &str, path: &str) -> Value {
    let shape = ErrorShape {
        message: message.to_string(),
        code: code.json_rpc_code(),
        data: Some(ErrorData {
            code: code.as_str().to_string(),
            http_status: Some(code.http_status()),
            path: Some(path.to_string()),
        }),
    };
    json!({ "error": shape })
}

/// Encodes batch inputs as `{"0": .., "1": ..}`.
pub fn batch_input(inputs: &[Value]) -> Value {
    let map: Map<String, Value> = inputs
        .iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), v.clone()))
        .collect();
    Value::Object(map)
}

/// Picks the input for call `index` out of a batch input object.
///
/// Missing entries (and a missing object) read as `Value::Null`.
pub fn batch_input_at(raw: Option<&Value>, index: usize) -> Value {
    raw.and_then(|v| v.get(index.to_string()))
        .cloned()
        .unwrap_or(Value::Null)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("{}", .0.message)]
    Procedure(ErrorShape),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// The envelope for call `index`.
///
/// A batch body is an array indexed by call position; an unbatched body is a
/// single envelope and only answers `index == 0`.
pub fn envelope_at(body: &Value, index: usize) -> Option<&Value> {
    match body {
        Value::Array(items) => items.get(index),
        Value::Object(_) if index == 0 => Some(body),
        _ => None,
    }
}

/// Unwraps the `data` of call `index` from a single or batched response body.
pub fn unwrap_envelope(body: &Value, index: usize) -> Result<Value, EnvelopeError> {
    let envelope = envelope_at(body, index).ok_or_else(|| {
        EnvelopeError::Malformed(format!("no envelope for call {index}"))
    })?;

    if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
        let shape = serde_json::from_value::<ErrorShape>(error.clone()).unwrap_or_else(|_| {
            ErrorShape {
                message: error.to_string(),
                code: 0,
                data: None,
            }
        });
        return Err(EnvelopeError::Procedure(shape));
    }

    envelope
        .get("result")
        .and_then(|r| r.get("data"))
        .cloned()
        .ok_or_else(|| EnvelopeError::Malformed("envelope has neither result.data nor error".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_single_envelope() {
        let body = json!({"result": {"data": [{"id": "1"}]}});
        assert_eq!(unwrap_envelope(&body, 0).unwrap(), json!([{"id": "1"}]));
    }

    #[test]
    fn single_envelope_has_no_second_call() {
        let body = json!({"result": {"data": []}});
        assert!(matches!(
            unwrap_envelope(&body, 1),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn unwraps_batched_envelope_by_index() {
        let body = json!([
            {"result": {"data": "first"}},
            {"result": {"data": "second"}}
        ]);
        assert_eq!(unwrap_envelope(&body, 0).unwrap(), json!("first"));
        assert_eq!(unwrap_envelope(&body, 1).unwrap(), json!("second"));
        assert!(unwrap_envelope(&body, 2).is_err());
    }

    #[test]
    fn empty_list_data_is_not_missing() {
        let body = json!([{"result": {"data": []}}]);
        assert_eq!(unwrap_envelope(&body, 0).unwrap(), json!([]));
    }

    #[test]
    fn error_envelope_round_trips_through_unwrap() {
        let body = error_envelope(TrpcCode::BadRequest, "name/email required", CREATE_USER);
        match unwrap_envelope(&body, 0) {
            Err(EnvelopeError::Procedure(shape)) => {
                assert_eq!(shape.message, "name/email required");
                assert_eq!(shape.code, -32600);
                assert_eq!(shape.symbolic_code(), Some("BAD_REQUEST"));
            }
            other => panic!("expected procedure error, got {other:?}"),
        }
    }

    #[test]
    fn error_inside_batch_is_reported_for_its_index_only() {
        let body = json!([
            {"result": {"data": 1}},
            error_envelope(TrpcCode::NotFound, "No such procedure", "user.nope")
        ]);
        assert!(unwrap_envelope(&body, 0).is_ok());
        assert!(matches!(
            unwrap_envelope(&body, 1),
            Err(EnvelopeError::Procedure(_))
        ));
    }

    #[test]
    fn null_error_member_is_ignored() {
        let body = json!({"result": {"data": []}, "error": null});
        assert_eq!(unwrap_envelope(&body, 0).unwrap(), json!([]));
    }

    #[test]
    fn envelope_without_data_is_malformed() {
        for body in [json!({"result": {}}), json!({}), json!("text"), json!(null)] {
            assert!(
                matches!(unwrap_envelope(&body, 0), Err(EnvelopeError::Malformed(_))),
                "{body} should be malformed"
            );
        }
    }

    #[test]
    fn batch_input_is_keyed_by_index() {
        let input = batch_input(&[json!(null), json!({"name": "Mob"})]);
        assert_eq!(input, json!({"0": null, "1": {"name": "Mob"}}));
        assert_eq!(batch_input_at(Some(&input), 1), json!({"name": "Mob"}));
        assert_eq!(batch_input_at(Some(&input), 5), Value::Null);
        assert_eq!(batch_input_at(None, 0), Value::Null);
    }

    #[test]
    fn procedure_kinds() {
        assert_eq!(procedure_kind(LIST_USERS), Some(ProcedureKind::Query));
        assert_eq!(procedure_kind(CREATE_USER), Some(ProcedureKind::Mutation));
        assert_eq!(procedure_kind("user.deleteUser"), None);
    }
}
