//! Log backend for the desktop host.

use log::LevelFilter;
use tauri_plugin_log::{Target, TargetKind};

const LOG_FILE_NAME: &str = "prefs_bridge";

fn level_for(debug_build: bool) -> LevelFilter {
    if debug_build {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Builds the `tauri-plugin-log` backend: stdout plus a file in the app log dir.
pub(crate) fn builder() -> tauri_plugin_log::Builder {
    tauri_plugin_log::Builder::new()
        .clear_targets()
        .level(level_for(cfg!(debug_assertions)))
        .target(Target::new(TargetKind::Stdout))
        .target(Target::new(TargetKind::LogDir {
            file_name: Some(LOG_FILE_NAME.to_string()),
        }))
}
