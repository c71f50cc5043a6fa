//! Preference bridge: a three-method call surface (`getString`, `setString`, `clear`) over an
//! injected [`prefs_host::PrefsStore`].
//!
//! The host shell decodes a [`MethodCall`] off its IPC channel, passes it to
//! [`PreferenceBridge::handle`], and sends the resulting [`MethodResponse`] back. Every call is
//! independent; the bridge keeps no state beyond the store it was constructed with.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod bridge;
pub mod call;
pub mod config;
mod error;

pub use bridge::PreferenceBridge;
pub use call::{ErrorPayload, Method, MethodCall, MethodResponse};
pub use config::{BridgeConfig, ConfigError, DEFAULT_CHANNEL};
pub use error::{BridgeError, BAD_ARGS_CODE, ENCODE_FAILURE_CODE, STORE_FAILURE_CODE};
