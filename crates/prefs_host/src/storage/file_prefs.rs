//! Durable preference store backed by one JSON map file per application domain.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};

use super::prefs::PrefsStore;

type PrefMap = BTreeMap<String, String>;

/// Validates an application domain name used as a file stem.
///
/// # Errors
///
/// Returns an error for empty names or names containing anything other than ASCII
/// alphanumerics, `.`, `_`, or `-`.
pub fn validate_domain(domain: &str) -> Result<(), String> {
    if domain.is_empty() {
        return Err("Preference domain must not be empty".to_string());
    }
    if !domain
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
    {
        return Err(format!(
            "Preference domain `{domain}` contains unsupported characters"
        ));
    }
    Ok(())
}

fn domain_file(root: &Path, domain: &str) -> Result<PathBuf, String> {
    validate_domain(domain)?;
    Ok(root.join(format!("{domain}.json")))
}

fn read_map(path: &Path) -> Result<PrefMap, String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(PrefMap::new()),
        Err(err) => return Err(format!("failed to read {}: {err}", path.display())),
    };
    if raw.trim().is_empty() {
        return Ok(PrefMap::new());
    }
    serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse prefs map {}: {err}", path.display()))
}

/// Replaces the map file through a sibling temp file so a torn write never clobbers it.
fn replace_map(path: &Path, map: &PrefMap) -> Result<(), String> {
    let encoded =
        serde_json::to_vec(map).map_err(|err| format!("failed to encode prefs map: {err}"))?;
    let staging = path.with_extension("json.tmp");
    let mut file = File::create(&staging)
        .map_err(|err| format!("failed to create {}: {err}", staging.display()))?;
    file.write_all(&encoded)
        .and_then(|()| file.sync_all())
        .map_err(|err| format!("failed to write {}: {err}", staging.display()))?;
    fs::rename(&staging, path).map_err(|err| {
        format!(
            "failed to move {} into place at {}: {err}",
            staging.display(),
            path.display()
        )
    })
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), String> {
    File::open(dir)
        .and_then(|handle| handle.sync_all())
        .map_err(|err| format!("failed to sync dir {}: {err}", dir.display()))
}

// Directory handles cannot be fsynced through `File` here; renames and unlinks are left to the OS.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), String> {
    Ok(())
}

#[derive(Debug)]
/// Preference store persisting the values of one domain to `<root>/<domain>.json`.
///
/// Every operation re-reads the map file, so separate instances over the same root observe each
/// other's writes. Read-modify-write cycles within one instance are serialized by an internal
/// lock.
pub struct FilePrefsStore {
    root: PathBuf,
    domain: String,
    file: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePrefsStore {
    /// Creates a store for `domain` rooted at `root`, creating the directory when needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the domain name is invalid or the directory cannot be created.
    pub fn from_root(root: impl AsRef<Path>, domain: &str) -> Result<Self, String> {
        let root = root.as_ref();
        let file = domain_file(root, domain)?;
        fs::create_dir_all(root)
            .map_err(|err| format!("failed to create prefs dir {}: {err}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
            domain: domain.to_string(),
            file,
            write_lock: Mutex::new(()),
        })
    }

    /// Domain this store writes into.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Path of the map file backing this store's domain.
    pub fn file_path(&self) -> &Path {
        &self.file
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, String> {
        self.write_lock
            .lock()
            .map_err(|_| format!("prefs store lock for `{}` is poisoned", self.domain))
    }
}

impl PrefsStore for FilePrefsStore {
    fn domain_name(&self) -> Option<&str> {
        Some(&self.domain)
    }

    fn load_string(&self, key: &str) -> Result<Option<String>, String> {
        let _guard = self.lock()?;
        Ok(read_map(&self.file)?.remove(key))
    }

    fn save_string(&self, key: &str, value: &str) -> Result<(), String> {
        let _guard = self.lock()?;
        let mut map = read_map(&self.file)?;
        map.insert(key.to_string(), value.to_string());
        replace_map(&self.file, &map)
    }

    fn remove_domain(&self, domain: &str) -> Result<(), String> {
        let _guard = self.lock()?;
        let path = domain_file(&self.root, domain)?;
        if !path.exists() {
            debug!("prefs domain `{domain}` has no persisted values");
            return Ok(());
        }
        fs::remove_file(&path)
            .map_err(|err| format!("failed to delete {}: {err}", path.display()))?;
        info!("removed prefs domain `{domain}` at {}", path.display());
        Ok(())
    }

    fn synchronize(&self) -> Result<(), String> {
        let _guard = self.lock()?;
        if self.file.exists() {
            File::open(&self.file)
                .and_then(|file| file.sync_all())
                .map_err(|err| format!("failed to sync {}: {err}", self.file.display()))?;
        }
        // Persists renames and unlinks, including a removed domain file.
        sync_dir(&self.root)
    }
}
