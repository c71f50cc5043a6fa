//! Host-domain contracts for the preference store behind the preference bridge.
//!
//! The bridge never reaches for a process-wide settings singleton. Callers construct a concrete
//! [`PrefsStore`] (the durable [`FilePrefsStore`] on desktop hosts, [`MemoryPrefsStore`] in
//! tests) and hand it to the bridge explicitly.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod storage;

pub use storage::file_prefs::{validate_domain, FilePrefsStore};
pub use storage::prefs::{
    load_pref_with, save_pref_with, MemoryPrefsStore, NoopPrefsStore, PrefsStore,
    DEFAULT_MEMORY_DOMAIN,
};
