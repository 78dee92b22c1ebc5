use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Cat,
    Dog,
    Unknown,
}

impl Classification {
    /// Lenient label parsing; anything that is not a cat or a dog is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "cat" => Classification::Cat,
            "dog" => Classification::Dog,
            _ => Classification::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Cat => "Cat",
            Classification::Dog => "Dog",
            Classification::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClassificationResult {
    pub classification: Classification,
    /// Normalized to 0.0..=1.0.
    pub confidence: f32,
    pub features: Vec<String>,
}

impl ClassificationResult {
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Loading,
    Success,
    Error,
}
