use super::classify_types::{ClassificationResult, Status};
use serde::Serialize;

/// Flattened view state handed to the front end.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub status: Status,
    pub result: Option<ClassificationResult>,
    pub error: Option<String>,
    pub image_preview: Option<String>,
}

impl ViewSnapshot {
    pub fn idle() -> Self {
        Self {
            status: Status::Idle,
            result: None,
            error: None,
            image_preview: None,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct SettingsStatus {
    pub api_key_configured: bool,
    pub model: String,
}
