//! Tauri desktop shell hosting the preference bridge.
//!
//! The shell owns the native side of the preference channel: it resolves the app-data and
//! app-config directories, builds a file-backed store for the app identifier, and exposes the
//! bridge to the webview through a single command.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod channel;
mod logging;

use tauri::Manager;

/// Starts the Tauri desktop host process.
pub fn run() {
    tauri::Builder::default()
        .plugin(logging::builder().build())
        .setup(|app| {
            let bridge = channel::bridge_from_app(app.handle())?;
            app.manage(bridge);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![channel::prefs_channel_invoke])
        .run(tauri::generate_context!())
        .expect("desktop_tauri failed to run Tauri application");
}
