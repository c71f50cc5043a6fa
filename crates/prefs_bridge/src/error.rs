//! Bridge error model.

use serde_json::Value;
use thiserror::Error;

use crate::call::ErrorPayload;

/// Code reported when a required argument is absent or not a string.
pub const BAD_ARGS_CODE: &str = "bad_args";
/// Code reported when the preference store itself fails.
pub const STORE_FAILURE_CODE: &str = "store_failure";
/// Code reported when a response cannot be encoded for the channel.
pub const ENCODE_FAILURE_CODE: &str = "encode_failure";

#[derive(Debug, Error, Clone, PartialEq)]
/// Failures of a call that reached one of the bridge's handlers.
pub enum BridgeError {
    /// A required argument was absent or had the wrong type. Nothing was written.
    #[error("{message}")]
    InvalidArgument {
        /// Human-readable message.
        message: String,
        /// Optional context, such as a request decode error.
        details: Option<Value>,
    },
    /// The store reported a failure while serving the call.
    #[error("preference store failure: {0}")]
    Store(String),
    /// The response could not be encoded as JSON.
    #[error("failed to encode response: {0}")]
    Encode(String),
}

impl BridgeError {
    /// Creates an [`BridgeError::InvalidArgument`] without details.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            details: None,
        }
    }

    /// Stable wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => BAD_ARGS_CODE,
            Self::Store(_) => STORE_FAILURE_CODE,
            Self::Encode(_) => ENCODE_FAILURE_CODE,
        }
    }
}

impl From<BridgeError> for ErrorPayload {
    fn from(err: BridgeError) -> Self {
        let code = err.code().to_string();
        let message = err.to_string();
        let details = match err {
            BridgeError::InvalidArgument { details, .. } => details,
            BridgeError::Store(_) | BridgeError::Encode(_) => None,
        };
        Self {
            code,
            message,
            details,
        }
    }
}
