//! Serializable request and response envelopes crossing the preference channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Methods the bridge has handlers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `getString`: read one value.
    GetString,
    /// `setString`: write one value.
    SetString,
    /// `clear`: drop every value owned by the application identity.
    Clear,
}

impl Method {
    /// Resolves a wire method name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "getString" => Some(Self::GetString),
            "setString" => Some(Self::SetString),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }

    /// Wire name of the method.
    pub fn name(self) -> &'static str {
        match self {
            Self::GetString => "getString",
            Self::SetString => "setString",
            Self::Clear => "clear",
        }
    }
}

/// One named call received from the app shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Method identifier, for example `getString`.
    pub method: String,
    /// Optional argument mapping; `getString`/`setString` expect a JSON object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl MethodCall {
    /// Builds a call with no arguments.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: None,
        }
    }

    /// Builds a call with the given argument value.
    pub fn with_arguments(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments: Some(arguments),
        }
    }

    /// Argument mapping, when the arguments are present and form a JSON object.
    pub fn argument_map(&self) -> Option<&Map<String, Value>> {
        self.arguments.as_ref().and_then(Value::as_object)
    }

    /// String argument named `name`. Non-string values count as missing.
    pub fn string_argument(&self, name: &str) -> Option<&str> {
        self.argument_map()?.get(name)?.as_str()
    }
}

/// Structured error returned across the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Stable machine-readable code such as `bad_args`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional extra context.
    #[serde(default)]
    pub details: Option<Value>,
}

/// Outcome of one call, tagged by `status` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    /// The call completed. `value` is the stored string for reads and `null` otherwise.
    Success {
        /// Returned string, or `None` for "absent" and empty acknowledgments.
        value: Option<String>,
    },
    /// The call reached a handler and failed.
    Error(ErrorPayload),
    /// No handler exists for the requested method.
    NotImplemented,
}

impl MethodResponse {
    /// Empty success acknowledgment.
    pub fn ack() -> Self {
        Self::Success { value: None }
    }

    /// Error code, when this is an error response.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Error(payload) => Some(&payload.code),
            _ => None,
        }
    }
}
