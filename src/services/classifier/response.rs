use crate::error::ClassifyError;
use crate::models::classify_types::{Classification, ClassificationResult};
use serde::Deserialize;

#[derive(Deserialize)]
struct RawClassification {
    classification: String,
    confidence: f64,
    #[serde(default)]
    features: Vec<String>,
}

/// Parse the JSON text the model produced into a `ClassificationResult`.
pub fn parse_classification(text: &str) -> Result<ClassificationResult, ClassifyError> {
    let json = strip_code_fence(text);
    if json.is_empty() {
        return Err(ClassifyError::EmptyResponse);
    }

    let raw: RawClassification = serde_json::from_str(json)
        .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;

    let confidence = normalize_confidence(raw.confidence)?;
    let features = raw
        .features
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();

    Ok(ClassificationResult {
        classification: Classification::from_label(&raw.classification),
        confidence,
        features,
    })
}

/// Models answer either as a fraction or as a percentage.
pub fn normalize_confidence(value: f64) -> Result<f32, ClassifyError> {
    if value.is_nan() || !(0.0..=100.0).contains(&value) {
        return Err(ClassifyError::MalformedResponse(format!(
            "confidence out of range: {}",
            value
        )));
    }
    let fraction = if value > 1.0 { value / 100.0 } else { value };
    Ok(fraction as f32)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let result = parse_classification(
            r#"{"classification":"Cat","confidence":0.97,"features":["pointed ears","whiskers"]}"#,
        )
        .unwrap();
        assert_eq!(result.classification, Classification::Cat);
        assert!((result.confidence - 0.97).abs() < 1e-6);
        assert_eq!(result.features, vec!["pointed ears", "whiskers"]);
    }

    #[test]
    fn parses_fenced_json_and_percentages() {
        let text = "```json\n{\"classification\":\"dog\",\"confidence\":88,\"features\":[\" floppy ears \",\"\"]}\n```";
        let result = parse_classification(text).unwrap();
        assert_eq!(result.classification, Classification::Dog);
        assert_eq!(result.confidence_percent(), 88);
        assert_eq!(result.features, vec!["floppy ears"]);
    }

    #[test]
    fn unexpected_label_is_unknown() {
        let result =
            parse_classification(r#"{"classification":"rabbit","confidence":0.4}"#).unwrap();
        assert_eq!(result.classification, Classification::Unknown);
        assert!(result.features.is_empty());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        assert!(matches!(
            parse_classification(r#"{"classification":"Cat","confidence":-0.2}"#),
            Err(ClassifyError::MalformedResponse(_))
        ));
        assert!(normalize_confidence(140.0).is_err());
        assert!(normalize_confidence(f64::NAN).is_err());
    }

    #[test]
    fn rejects_garbage_and_empty_text() {
        assert!(matches!(
            parse_classification("I think it is a cat"),
            Err(ClassifyError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_classification("   "),
            Err(ClassifyError::EmptyResponse)
        ));
    }
}
