use super::response::parse_classification;
use super::Classifier;
use crate::config::Settings;
use crate::error::ClassifyError;
use crate::models::classify_types::ClassificationResult;
use crate::models::image_types::ImageFile;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;

const PROMPT: &str = "Analyze this image and decide whether it shows a cat or a dog. \
If it shows neither, or you cannot tell, answer \"Unknown\". \
Give your confidence as a number between 0 and 1, and list the key visual features \
(for example ear shape, snout, whiskers, fur pattern) that led to your decision.";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Classifier backed by the Gemini `generateContent` REST API.
#[derive(Clone)]
pub struct GeminiClassifier {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiClassifier {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: settings.model.clone(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, image: &ImageFile) -> Result<ClassificationResult, ClassifyError> {
        let api_key = self.api_key.as_deref().ok_or(ClassifyError::MissingApiKey)?;
        let start = Instant::now();

        let response = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", api_key)
            .json(&build_request_body(image))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(
            model = %self.model,
            status = status.as_u16(),
            ms = start.elapsed().as_millis() as u64,
            "classification request finished"
        );

        if !status.is_success() {
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let text = extract_text(&body)?;
        parse_classification(&text)
    }
}

pub fn build_request_body(image: &ImageFile) -> Value {
    let data = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
    json!({
        "contents": [{
            "parts": [
                { "inlineData": { "mimeType": image.mime_type, "data": data } },
                { "text": PROMPT }
            ]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "classification": {
                        "type": "STRING",
                        "enum": ["Cat", "Dog", "Unknown"]
                    },
                    "confidence": { "type": "NUMBER" },
                    "features": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" }
                    }
                },
                "required": ["classification", "confidence", "features"]
            }
        }
    })
}

/// Pull the model's answer text out of a successful response body.
pub fn extract_text(body: &str) -> Result<String, ClassifyError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ClassifyError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ClassifyError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(reason) if reason != "STOP" => Err(ClassifyError::Blocked(reason.to_string())),
            _ => Err(ClassifyError::EmptyResponse),
        };
    }

    Ok(text)
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}
