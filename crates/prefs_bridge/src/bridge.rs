//! Method dispatch from channel calls to preference store operations.

use log::{debug, info, warn};
use prefs_host::PrefsStore;
use serde_json::json;

use crate::call::{ErrorPayload, Method, MethodCall, MethodResponse};
use crate::config::{BridgeConfig, ConfigError};
use crate::error::BridgeError;

const MISSING_KEY: &str = "Missing key";
const MISSING_KEY_VALUE: &str = "Missing key/value";

#[derive(Debug)]
/// Preference bridge over an explicitly injected store.
pub struct PreferenceBridge<S> {
    store: S,
    config: BridgeConfig,
}

impl<S: PrefsStore> PreferenceBridge<S> {
    /// Creates a bridge serving `store` under `config`.
    ///
    /// The application identity `clear` removes is the configured one, or else the store's own
    /// domain. Both name the same domain afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IdentityMismatch`] when the config names a different domain than
    /// the store writes into.
    pub fn new(store: S, mut config: BridgeConfig) -> Result<Self, ConfigError> {
        if let Some(domain) = store.domain_name() {
            let configured = config
                .app_identity
                .get_or_insert_with(|| domain.to_string());
            if configured.as_str() != domain {
                return Err(ConfigError::IdentityMismatch {
                    configured: configured.clone(),
                    store: domain.to_string(),
                });
            }
        }
        Ok(Self { store, config })
    }

    /// Configuration this bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Channel name this bridge answers on.
    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    /// Store this bridge forwards to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Dispatches one call and produces the response to send back.
    ///
    /// Unknown method names yield [`MethodResponse::NotImplemented`]; handler failures become
    /// [`MethodResponse::Error`].
    pub fn handle(&self, call: &MethodCall) -> MethodResponse {
        let Some(method) = Method::from_name(&call.method) else {
            warn!(
                "no handler for `{}` on channel `{}`",
                call.method, self.config.channel
            );
            return MethodResponse::NotImplemented;
        };
        debug!("dispatching `{}` on `{}`", method.name(), self.config.channel);

        match self.dispatch(method, call) {
            Ok(value) => MethodResponse::Success { value },
            Err(err) => {
                warn!("`{}` failed: {err}", method.name());
                MethodResponse::Error(ErrorPayload::from(err))
            }
        }
    }

    /// Decodes a JSON-encoded [`MethodCall`], handles it, and encodes the response.
    ///
    /// Requests that are not valid call JSON are answered with a `bad_args` error carrying the
    /// decode message in `details`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Encode`] when the response cannot be serialized.
    pub fn handle_json(&self, raw: &str) -> Result<String, BridgeError> {
        let response = match serde_json::from_str::<MethodCall>(raw) {
            Ok(call) => self.handle(&call),
            Err(err) => {
                warn!("rejecting undecodable call: {err}");
                MethodResponse::Error(ErrorPayload::from(BridgeError::InvalidArgument {
                    message: "Malformed method call".to_string(),
                    details: Some(json!(err.to_string())),
                }))
            }
        };
        serde_json::to_string(&response).map_err(|err| BridgeError::Encode(err.to_string()))
    }

    fn dispatch(&self, method: Method, call: &MethodCall) -> Result<Option<String>, BridgeError> {
        match method {
            Method::GetString => {
                let key = call
                    .string_argument("key")
                    .ok_or_else(|| BridgeError::invalid_argument(MISSING_KEY))?;
                self.get_string(key)
            }
            Method::SetString => {
                let (Some(key), Some(value)) =
                    (call.string_argument("key"), call.string_argument("value"))
                else {
                    return Err(BridgeError::invalid_argument(MISSING_KEY_VALUE));
                };
                self.set_string(key, value).map(|()| None)
            }
            Method::Clear => self.clear().map(|()| None),
        }
    }

    /// Returns the string stored under `key`, or `None` when it was never set.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Store`] when the store read fails.
    pub fn get_string(&self, key: &str) -> Result<Option<String>, BridgeError> {
        self.store.load_string(key).map_err(BridgeError::Store)
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Store`] when the store write fails.
    pub fn set_string(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        self.store.save_string(key, value).map_err(BridgeError::Store)
    }

    /// Removes the application's preference domain, then flushes the store.
    ///
    /// When neither the config nor the store names an application identity nothing is removed,
    /// but the flush still runs and the call succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Store`] when removal or the flush fails.
    pub fn clear(&self) -> Result<(), BridgeError> {
        match self.config.app_identity.as_deref() {
            Some(identity) => {
                self.store
                    .remove_domain(identity)
                    .map_err(BridgeError::Store)?;
                info!("cleared preference domain `{identity}`");
            }
            None => warn!("no application identity known; clear removes nothing"),
        }
        self.store.synchronize().map_err(BridgeError::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prefs_host::{MemoryPrefsStore, NoopPrefsStore};
    use serde_json::{json, Value};

    const APP: &str = "com.example.app";

    fn bridge() -> (PreferenceBridge<MemoryPrefsStore>, MemoryPrefsStore) {
        let store = MemoryPrefsStore::for_domain(APP);
        let config = BridgeConfig::default().with_fallback_identity(APP);
        let bridge = PreferenceBridge::new(store.clone(), config).expect("build bridge");
        (bridge, store)
    }

    /// Memory store that does not report a domain, like a host without an app identity.
    struct UnscopedStore(MemoryPrefsStore);

    impl PrefsStore for UnscopedStore {
        fn domain_name(&self) -> Option<&str> {
            None
        }

        fn load_string(&self, key: &str) -> Result<Option<String>, String> {
            self.0.load_string(key)
        }

        fn save_string(&self, key: &str, value: &str) -> Result<(), String> {
            self.0.save_string(key, value)
        }

        fn remove_domain(&self, domain: &str) -> Result<(), String> {
            self.0.remove_domain(domain)
        }

        fn synchronize(&self) -> Result<(), String> {
            self.0.synchronize()
        }
    }

    struct FailingStore;

    impl PrefsStore for FailingStore {
        fn domain_name(&self) -> Option<&str> {
            None
        }

        fn load_string(&self, _key: &str) -> Result<Option<String>, String> {
            Err("read failed".to_string())
        }

        fn save_string(&self, _key: &str, _value: &str) -> Result<(), String> {
            Err("write failed".to_string())
        }

        fn remove_domain(&self, _domain: &str) -> Result<(), String> {
            Ok(())
        }

        fn synchronize(&self) -> Result<(), String> {
            Err("sync failed".to_string())
        }
    }

    #[test]
    fn get_string_rejects_missing_or_non_string_key_before_touching_store() {
        let bridge =
            PreferenceBridge::new(FailingStore, BridgeConfig::default()).expect("build bridge");
        for arguments in [None, Some(json!({})), Some(json!({"key": 1})), Some(json!("key"))] {
            let call = MethodCall {
                method: "getString".to_string(),
                arguments,
            };
            let response = bridge.handle(&call);
            assert_eq!(
                response,
                MethodResponse::Error(ErrorPayload {
                    code: "bad_args".to_string(),
                    message: "Missing key".to_string(),
                    details: None,
                })
            );
        }
    }

    #[test]
    fn set_string_rejects_partial_arguments_without_writing() {
        let (bridge, store) = bridge();
        for arguments in [
            json!({"key": "a"}),
            json!({"value": "b"}),
            json!({"key": "a", "value": false}),
            json!({"key": null, "value": "b"}),
        ] {
            let response = bridge.handle(&MethodCall::with_arguments("setString", arguments));
            assert_eq!(response.error_code(), Some("bad_args"));
            if let MethodResponse::Error(payload) = response {
                assert_eq!(payload.message, "Missing key/value");
            }
        }
        assert!(store.is_empty());
    }

    #[test]
    fn set_then_get_returns_stored_value() {
        let (bridge, _store) = bridge();
        assert_eq!(
            bridge.handle(&MethodCall::with_arguments(
                "setString",
                json!({"key": "theme", "value": "dark"})
            )),
            MethodResponse::ack()
        );
        assert_eq!(
            bridge.handle(&MethodCall::with_arguments("getString", json!({"key": "theme"}))),
            MethodResponse::Success {
                value: Some("dark".to_string())
            }
        );
    }

    #[test]
    fn clear_removes_identity_domain_and_flushes() {
        let (bridge, store) = bridge();
        bridge.set_string("theme", "dark").expect("set");
        bridge.set_string("locale", "de").expect("set");

        assert_eq!(
            bridge.handle(&MethodCall::with_arguments("clear", json!({"ignored": true}))),
            MethodResponse::ack()
        );

        assert!(!store.has_domain(APP));
        assert_eq!(store.sync_count(), 1);
        assert_eq!(bridge.get_string("theme").expect("get"), None);
    }

    #[test]
    fn clear_without_identity_flushes_but_removes_nothing() {
        let store = MemoryPrefsStore::for_domain(APP);
        let bridge = PreferenceBridge::new(UnscopedStore(store.clone()), BridgeConfig::default())
            .expect("build bridge");
        assert_eq!(bridge.config().app_identity, None);
        bridge.set_string("theme", "dark").expect("set");

        bridge.clear().expect("clear succeeds without identity");

        assert_eq!(store.sync_count(), 1);
        assert_eq!(
            bridge.get_string("theme").expect("get"),
            Some("dark".to_string())
        );
    }

    #[test]
    fn identity_defaults_to_store_domain_so_clear_reaches_written_keys() {
        let store = MemoryPrefsStore::default();
        let bridge =
            PreferenceBridge::new(store.clone(), BridgeConfig::default()).expect("build bridge");
        assert_eq!(
            bridge.config().app_identity.as_deref(),
            Some(prefs_host::DEFAULT_MEMORY_DOMAIN)
        );

        bridge.set_string("theme", "dark").expect("set");
        bridge.clear().expect("clear");

        assert!(store.is_empty());
        assert_eq!(bridge.get_string("theme").expect("get"), None);
    }

    #[test]
    fn identity_that_differs_from_store_domain_is_rejected() {
        let err = PreferenceBridge::new(
            MemoryPrefsStore::default(),
            BridgeConfig::default().with_fallback_identity(APP),
        )
        .err()
        .expect("mismatched identity must be rejected");

        assert!(
            matches!(
                &err,
                ConfigError::IdentityMismatch { configured, store }
                    if configured == APP && store == prefs_host::DEFAULT_MEMORY_DOMAIN
            ),
            "got {err:?}"
        );
        assert_eq!(
            err.to_string(),
            "app identity `com.example.app` does not match store domain `memory`"
        );
    }

    #[test]
    fn configured_identity_applies_to_stores_without_a_domain() {
        let store = MemoryPrefsStore::for_domain(APP);
        let config = BridgeConfig::default().with_fallback_identity(APP);
        let bridge =
            PreferenceBridge::new(UnscopedStore(store.clone()), config).expect("build bridge");
        bridge.set_string("theme", "dark").expect("set");

        bridge.clear().expect("clear");

        assert!(!store.has_domain(APP));
        assert_eq!(store.sync_count(), 1);
    }

    #[test]
    fn unknown_method_is_not_implemented_rather_than_bad_args() {
        let (bridge, _store) = bridge();
        let response = bridge.handle(&MethodCall::with_arguments("getInt", json!({})));
        assert_eq!(response, MethodResponse::NotImplemented);
        assert_eq!(response.error_code(), None);
    }

    #[test]
    fn store_failures_surface_as_store_failure_errors() {
        let bridge =
            PreferenceBridge::new(FailingStore, BridgeConfig::default()).expect("build bridge");

        let response = bridge.handle(&MethodCall::with_arguments(
            "setString",
            json!({"key": "a", "value": "b"}),
        ));
        assert_eq!(
            response,
            MethodResponse::Error(ErrorPayload {
                code: "store_failure".to_string(),
                message: "preference store failure: write failed".to_string(),
                details: None,
            })
        );
        assert_eq!(
            bridge.clear().expect_err("sync failure propagates"),
            BridgeError::Store("sync failed".to_string())
        );
    }

    #[test]
    fn handle_json_round_trips_wire_envelopes() {
        let bridge =
            PreferenceBridge::new(NoopPrefsStore, BridgeConfig::default()).expect("build bridge");

        let raw = bridge
            .handle_json(r#"{"method":"getString","arguments":{"key":"theme"}}"#)
            .expect("encode response");
        let response: Value = serde_json::from_str(&raw).expect("decode response");
        assert_eq!(response, json!({"status": "success", "value": null}));

        let raw = bridge.handle_json("not json").expect("encode response");
        let response: MethodResponse = serde_json::from_str(&raw).expect("decode response");
        assert_eq!(response.error_code(), Some("bad_args"));
        if let MethodResponse::Error(payload) = response {
            assert_eq!(payload.message, "Malformed method call");
            assert!(payload.details.is_some());
        }
    }
}
