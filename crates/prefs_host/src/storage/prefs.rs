//! Preference store contract and lightweight adapters.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};

/// Domain used by [`MemoryPrefsStore::default`].
pub const DEFAULT_MEMORY_DOMAIN: &str = "memory";

/// Host service for string preference values scoped to one application domain.
///
/// Writes land in the store's own domain. [`PrefsStore::remove_domain`] drops a whole domain by
/// name, which is how the bridge implements "clear everything this application wrote".
pub trait PrefsStore {
    /// Domain this store writes into, or `None` when writes are not scoped to a named domain.
    fn domain_name(&self) -> Option<&str>;

    /// Loads the string stored under `key`, or `None` when it was never set.
    fn load_string(&self, key: &str) -> Result<Option<String>, String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn save_string(&self, key: &str, value: &str) -> Result<(), String>;

    /// Removes every value persisted under the named domain.
    fn remove_domain(&self, domain: &str) -> Result<(), String>;

    /// Flushes pending writes to durable media before returning.
    fn synchronize(&self) -> Result<(), String>;
}

impl<S: PrefsStore + ?Sized> PrefsStore for &S {
    fn domain_name(&self) -> Option<&str> {
        (**self).domain_name()
    }

    fn load_string(&self, key: &str) -> Result<Option<String>, String> {
        (**self).load_string(key)
    }

    fn save_string(&self, key: &str, value: &str) -> Result<(), String> {
        (**self).save_string(key, value)
    }

    fn remove_domain(&self, domain: &str) -> Result<(), String> {
        (**self).remove_domain(domain)
    }

    fn synchronize(&self) -> Result<(), String> {
        (**self).synchronize()
    }
}

impl<S: PrefsStore + ?Sized> PrefsStore for Arc<S> {
    fn domain_name(&self) -> Option<&str> {
        (**self).domain_name()
    }

    fn load_string(&self, key: &str) -> Result<Option<String>, String> {
        (**self).load_string(key)
    }

    fn save_string(&self, key: &str, value: &str) -> Result<(), String> {
        (**self).save_string(key, value)
    }

    fn remove_domain(&self, domain: &str) -> Result<(), String> {
        (**self).remove_domain(domain)
    }

    fn synchronize(&self) -> Result<(), String> {
        (**self).synchronize()
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op preference store for unsupported targets and baseline tests.
pub struct NoopPrefsStore;

impl PrefsStore for NoopPrefsStore {
    fn domain_name(&self) -> Option<&str> {
        None
    }

    fn load_string(&self, _key: &str) -> Result<Option<String>, String> {
        Ok(None)
    }

    fn save_string(&self, _key: &str, _value: &str) -> Result<(), String> {
        Ok(())
    }

    fn remove_domain(&self, _domain: &str) -> Result<(), String> {
        Ok(())
    }

    fn synchronize(&self) -> Result<(), String> {
        Ok(())
    }
}

type DomainMap = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone)]
/// In-memory preference store keyed by domain, then by key.
///
/// Clones share the same backing map, so a test can hand one clone to the bridge and inspect
/// the other.
pub struct MemoryPrefsStore {
    domain: String,
    domains: Rc<RefCell<DomainMap>>,
    syncs: Rc<Cell<usize>>,
}

impl Default for MemoryPrefsStore {
    fn default() -> Self {
        Self::for_domain(DEFAULT_MEMORY_DOMAIN)
    }
}

impl MemoryPrefsStore {
    /// Creates an empty store whose writes land in `domain`.
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            domains: Rc::new(RefCell::new(DomainMap::new())),
            syncs: Rc::new(Cell::new(0)),
        }
    }

    /// Returns a view over the same backing map that writes into another domain.
    pub fn with_domain(&self, domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            domains: Rc::clone(&self.domains),
            syncs: Rc::clone(&self.syncs),
        }
    }

    /// Domain this view writes into.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Number of keys stored in this view's domain.
    pub fn len(&self) -> usize {
        self.domains
            .borrow()
            .get(&self.domain)
            .map_or(0, HashMap::len)
    }

    /// Returns `true` when this view's domain holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when any value is stored under the named domain.
    pub fn has_domain(&self, domain: &str) -> bool {
        self.domains
            .borrow()
            .get(domain)
            .is_some_and(|values| !values.is_empty())
    }

    /// Number of [`PrefsStore::synchronize`] calls observed across all views.
    pub fn sync_count(&self) -> usize {
        self.syncs.get()
    }
}

impl PrefsStore for MemoryPrefsStore {
    fn domain_name(&self) -> Option<&str> {
        Some(&self.domain)
    }

    fn load_string(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self
            .domains
            .borrow()
            .get(&self.domain)
            .and_then(|values| values.get(key))
            .cloned())
    }

    fn save_string(&self, key: &str, value: &str) -> Result<(), String> {
        self.domains
            .borrow_mut()
            .entry(self.domain.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_domain(&self, domain: &str) -> Result<(), String> {
        self.domains.borrow_mut().remove(domain);
        Ok(())
    }

    fn synchronize(&self) -> Result<(), String> {
        self.syncs.set(self.syncs.get() + 1);
        Ok(())
    }
}

/// Loads and deserializes a JSON-encoded preference value through a [`PrefsStore`].
///
/// # Errors
///
/// Returns an error when the store or JSON deserialization fails.
pub fn load_pref_with<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, String> {
    let Some(raw) = store.load_string(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw)
        .map_err(|err| format!("failed to decode preference `{key}`: {err}"))?;
    Ok(Some(value))
}

/// Serializes a preference value as JSON and saves it through a [`PrefsStore`].
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub fn save_pref_with<S: PrefsStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value)
        .map_err(|err| format!("failed to encode preference `{key}`: {err}"))?;
    store.save_string(key, &raw)
}
