//! Tauri command handler for the preference bridge channel.

use std::path::{Path, PathBuf};

use log::{info, warn};
use prefs_bridge::{BridgeConfig, MethodCall, MethodResponse, PreferenceBridge};
use prefs_host::FilePrefsStore;
use tauri::Manager;

/// Optional bridge config file name inside the app config dir.
pub(crate) const CONFIG_FILE_NAME: &str = "prefs_bridge.toml";

/// Bridge instance managed as Tauri state.
pub(crate) type HostBridge = PreferenceBridge<FilePrefsStore>;

/// Builds the bridge from an explicit identifier, config file path, and prefs root.
pub(crate) fn bridge_from_dirs(
    identifier: &str,
    config_path: &Path,
    prefs_root: &Path,
) -> Result<HostBridge, String> {
    let config = BridgeConfig::load_or_default(config_path)
        .map_err(|err| err.to_string())?
        .with_fallback_identity(identifier);
    let domain = config.app_identity.as_deref().unwrap_or(identifier);
    let store = FilePrefsStore::from_root(prefs_root, domain)?;
    info!(
        "preference bridge on `{}` backed by {}",
        config.channel,
        store.file_path().display()
    );
    PreferenceBridge::new(store, config).map_err(|err| err.to_string())
}

fn prefs_root(app: &tauri::AppHandle) -> Result<PathBuf, String> {
    Ok(app
        .path()
        .app_data_dir()
        .map_err(|err| format!("failed to resolve app data dir: {err}"))?
        .join("prefs"))
}

fn config_path(app: &tauri::AppHandle) -> Result<PathBuf, String> {
    Ok(app
        .path()
        .app_config_dir()
        .map_err(|err| format!("failed to resolve app config dir: {err}"))?
        .join(CONFIG_FILE_NAME))
}

/// Builds the bridge for a running app from its identifier and native directories.
pub(crate) fn bridge_from_app(app: &tauri::AppHandle) -> Result<HostBridge, String> {
    let identifier = app.config().identifier.clone();
    bridge_from_dirs(&identifier, &config_path(app)?, &prefs_root(app)?)
}

fn route(bridge: &HostBridge, channel: &str, call: &MethodCall) -> Result<MethodResponse, String> {
    if channel != bridge.channel() {
        warn!("call `{}` on unregistered channel `{channel}`", call.method);
        return Err(format!("No handler registered for channel `{channel}`"));
    }
    Ok(bridge.handle(call))
}

/// Forwards one method call on `channel` to the preference bridge.
#[tauri::command]
pub fn prefs_channel_invoke(
    bridge: tauri::State<'_, HostBridge>,
    channel: String,
    call: MethodCall,
) -> Result<MethodResponse, String> {
    route(&bridge, &channel, &call)
}
