use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
// Inline image data is capped at 20 MB by the API.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024;
pub const DEFAULT_PREVIEW_MAX_EDGE: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub max_image_bytes: u64,
    pub preview_max_edge: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            preview_max_edge: DEFAULT_PREVIEW_MAX_EDGE,
        }
    }
}

impl Settings {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(SETTINGS_FILE)
    }

    /// Load `settings.json` from `dir` (defaults when absent), then apply
    /// environment overrides.
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let mut settings = Self::load_file(dir)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn load_file(dir: &Path) -> Result<Self, AppError> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| AppError {
            message: format!("Failed to read settings file {}: {}", path.display(), e),
        })?;

        serde_json::from_str(&content).map_err(|e| AppError {
            message: format!("Failed to parse settings file {}: {}", path.display(), e),
        })
    }

    pub fn save(&self, dir: &Path) -> Result<(), AppError> {
        std::fs::create_dir_all(dir).map_err(|e| AppError {
            message: format!("Failed to create settings directory: {}", e),
        })?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path_in(dir), content)?;
        Ok(())
    }

    /// `GEMINI_API_KEY` takes precedence over the shorter `API_KEY`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty("GEMINI_MODEL") {
            self.model = model;
        }
        if let Some(endpoint) = non_empty("GEMINI_ENDPOINT") {
            self.endpoint = endpoint;
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}
