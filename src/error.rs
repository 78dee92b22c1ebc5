use serde::Serialize;
use std::fmt;
use thiserror::Error;

const UNKNOWN_FAILURE: &str = "An unknown error occurred.";

#[derive(Debug, Serialize)]
pub struct AppError {
    pub message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<ClassifyError> for AppError {
    fn from(err: ClassifyError) -> Self {
        AppError {
            message: failure_message(&err),
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError { message: msg }
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError {
            message: msg.to_string(),
        }
    }
}

/// Why a classification attempt failed. Every variant surfaces to the user
/// as a single message in the error panel.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("No API key configured. Set GEMINI_API_KEY or add it to settings.json.")]
    MissingApiKey,

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Classification service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("The image was rejected by the classification service ({0})")]
    Blocked(String),

    #[error("The classification service returned an empty response")]
    EmptyResponse,

    #[error("Malformed classification response: {0}")]
    MalformedResponse(String),

    /// A failure reported by a classifier with nothing more than a message.
    #[error("{0}")]
    Other(String),
}

/// Human readable text for the error panel.
pub fn failure_message(err: &ClassifyError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        UNKNOWN_FAILURE.to_string()
    } else {
        message
    }
}
