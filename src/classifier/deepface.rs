use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::classifier::EmotionClassifier;
use crate::config::ClassifierConfig;
use crate::error::{MoodreelError, Result};

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    img: String,
    actions: [&'a str; 1],
    enforce_detection: bool,
    detector_backend: &'a str,
}

/// Client for the DeepFace REST API (`POST /analyze`).
pub struct DeepFaceClient {
    client: Client,
    analyze_url: String,
    detector_backend: String,
}

impl DeepFaceClient {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MoodreelError::ClassifierError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            analyze_url: format!("{}/analyze", config.endpoint.trim_end_matches('/')),
            detector_backend: config.detector_backend.clone(),
        })
    }
}

#[async_trait::async_trait]
impl EmotionClassifier for DeepFaceClient {
    async fn classify(&self, face_jpeg: &[u8]) -> Result<String> {
        let request = AnalyzeRequest {
            img: format!("data:image/jpeg;base64,{}", STANDARD.encode(face_jpeg)),
            actions: ["emotion"],
            enforce_detection: false,
            detector_backend: &self.detector_backend,
        };

        let response = self
            .client
            .post(&self.analyze_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MoodreelError::ClassifierError(format!("Failed to reach classifier: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MoodreelError::ClassifierError(format!(
                "Classifier returned status {}: {}",
                status, body
            ))
            .into());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MoodreelError::ClassifierError(format!("Invalid classifier response: {}", e)))?;

        let label = parse_dominant_emotion(&body)?;
        debug!("Classifier says {}", label);
        Ok(label)
    }
}

/// Pulls `dominant_emotion` out of the first analysis result. Accepts both
/// `{"results": [...]}` and a bare array of results.
pub fn parse_dominant_emotion(body: &Value) -> std::result::Result<String, MoodreelError> {
    let results = body
        .get("results")
        .unwrap_or(body)
        .as_array()
        .ok_or_else(|| MoodreelError::ClassifierError("Response has no results array".to_string()))?;

    results
        .first()
        .and_then(|result| result.get("dominant_emotion"))
        .and_then(Value::as_str)
        .map(|label| label.trim().to_lowercase())
        .filter(|label| !label.is_empty())
        .ok_or_else(|| MoodreelError::ClassifierError("Response has no dominant_emotion".to_string()))
}
