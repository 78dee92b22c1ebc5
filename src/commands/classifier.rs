use crate::config::Settings;
use crate::error::AppError;
use crate::models::view_types::{SettingsStatus, ViewSnapshot};
use crate::services::image_service;
use crate::services::view_controller::ClassificationSession;
use std::path::Path;
use tauri::State;

#[tauri::command]
pub async fn upload_image(
    session: State<'_, ClassificationSession>,
    settings: State<'_, Settings>,
    path: String,
) -> Result<ViewSnapshot, AppError> {
    let file = image_service::load_image_file(Path::new(&path), settings.max_image_bytes)?;
    Ok(session.upload_image(file).await)
}

#[tauri::command]
pub async fn upload_image_bytes(
    session: State<'_, ClassificationSession>,
    settings: State<'_, Settings>,
    file_name: String,
    bytes: Vec<u8>,
) -> Result<ViewSnapshot, AppError> {
    let file = image_service::image_file_from_bytes(file_name, bytes, settings.max_image_bytes)?;
    Ok(session.upload_image(file).await)
}

#[tauri::command]
pub async fn reset_view(session: State<'_, ClassificationSession>) -> Result<ViewSnapshot, AppError> {
    Ok(session.reset().await)
}

#[tauri::command]
pub async fn get_view_state(session: State<'_, ClassificationSession>) -> Result<ViewSnapshot, AppError> {
    Ok(session.snapshot().await)
}

#[tauri::command]
pub fn get_settings_status(settings: State<'_, Settings>) -> SettingsStatus {
    SettingsStatus {
        api_key_configured: settings.has_api_key(),
        model: settings.model.clone(),
    }
}
