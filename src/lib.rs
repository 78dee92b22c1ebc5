#[cfg(feature = "desktop")]
mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` level; a second call is a no-op.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use config::Settings;
    use services::classifier::gemini::GeminiClassifier;
    use services::view_controller::ClassificationSession;
    use std::sync::Arc;
    use tauri::{Emitter, Manager};

    init_logging();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_window_state::Builder::default().build())
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir()?;
            std::fs::create_dir_all(&app_data_dir)?;

            let settings = Settings::load(&app_data_dir).unwrap_or_else(|e| {
                tracing::error!("{}, falling back to defaults", e);
                let mut settings = Settings::default();
                settings.apply_overrides(|key| std::env::var(key).ok());
                settings
            });
            if !settings.has_api_key() {
                tracing::warn!(
                    "no API key configured, add one to {}",
                    Settings::path_in(&app_data_dir).display()
                );
            }
            tracing::info!(model = %settings.model, "classifier ready");

            let classifier = Arc::new(GeminiClassifier::new(&settings));
            let session = ClassificationSession::new(classifier, settings.preview_max_edge);

            // Forward every view transition to the window.
            let mut updates = session.subscribe();
            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                while updates.changed().await.is_ok() {
                    let snapshot = updates.borrow_and_update().clone();
                    if let Err(e) = app_handle.emit("view-state-changed", snapshot) {
                        tracing::warn!("failed to emit view state: {}", e);
                    }
                }
            });

            app.manage(session);
            app.manage(settings);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::classifier::upload_image,
            commands::classifier::upload_image_bytes,
            commands::classifier::reset_view,
            commands::classifier::get_view_state,
            commands::classifier::get_settings_status,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
