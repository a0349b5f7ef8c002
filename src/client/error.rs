use crate::model::Trace;

/// Failure of one adapter call.
///
/// Every variant carries the trace gathered up to the point of failure, so
/// the wire evidence stays inspectable.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected the create input.
    #[error("{} rejected input: {message}", .trace.transport)]
    Input { message: String, trace: Box<Trace> },

    /// Non-success status, protocol error envelope, or malformed body.
    #[error("{} error: {message}", .trace.transport)]
    Transport { message: String, trace: Box<Trace> },

    /// The exchange itself failed (connect, timeout, body read).
    #[error("{} request failed: {source}", .trace.transport)]
    Request {
        #[source]
        source: reqwest::Error,
        trace: Box<Trace>,
    },
}

impl ApiError {
    pub fn input(message: impl Into<String>, trace: Trace) -> Self {
        ApiError::Input {
            message: message.into(),
            trace: Box::new(trace),
        }
    }

    pub fn transport(message: impl Into<String>, trace: Trace) -> Self {
        ApiError::Transport {
            message: message.into(),
            trace: Box::new(trace),
        }
    }

    pub fn trace(&self) -> &Trace {
        match self {
            ApiError::Input { trace, .. }
            | ApiError::Transport { trace, .. }
            | ApiError::Request { trace, .. } => trace,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, ApiError::Input { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }

    pub fn is_request(&self) -> bool {
        matches!(self, ApiError::Request { .. })
    }
}
