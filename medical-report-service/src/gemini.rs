use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, StatusCode};
use rig::{client::CompletionClient, completion::Prompt, providers::gemini};
use serde_json::{Value, json};
use tracing::info;

use crate::analysis::{AnalysisModel, AnalysisRequest, ModelError};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini behind the [`AnalysisModel`] seam.
///
/// Text prompts go through a rig agent; image requests are posted directly to
/// `generateContent` with the PNG inlined as base64.
pub struct GeminiModel {
    api_key: String,
    model: String,
    client: gemini::Client,
    http: Client,
}

impl GeminiModel {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: gemini::Client::new(api_key),
            http: Client::new(),
        }
    }

    async fn complete_text(&self, prompt: &str) -> Result<String, ModelError> {
        let agent = self.client.agent(&self.model).build();

        agent
            .prompt(prompt)
            .await
            .map_err(|e| ModelError::Permanent(e.to_string()))
    }

    async fn complete_with_image(
        &self,
        instruction: &str,
        png: &[u8],
    ) -> Result<String, ModelError> {
        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        { "text": instruction },
                        {
                            "inline_data": {
                                "mime_type": "image/png",
                                "data": STANDARD.encode(png)
                            }
                        }
                    ]
                }
            ]
        });

        let response = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                GEMINI_API_BASE, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let response_json: Value = response.json().await.map_err(transport_error)?;
        response_text(&response_json)
    }
}

#[async_trait]
impl AnalysisModel for GeminiModel {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String, ModelError> {
        match request {
            AnalysisRequest::Text(prompt) => self.complete_text(prompt).await,
            AnalysisRequest::Image { instruction, png } => {
                info!("Sending {} byte image to {}", png.len(), self.model);
                self.complete_with_image(instruction, png).await
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> ModelError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        ModelError::Transient(e.to_string())
    } else {
        ModelError::Permanent(e.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> ModelError {
    let message = format!("Gemini API request failed: {} {}", status, body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ModelError::Transient(message)
    } else {
        ModelError::Permanent(message)
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: &Value) -> Result<String, ModelError> {
    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| match response["promptFeedback"]["blockReason"].as_str() {
            Some(reason) => ModelError::Permanent(format!("Gemini blocked the request: {}", reason)),
            None => ModelError::Permanent("Invalid response format from Gemini".to_string()),
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.is_empty() {
        return Err(ModelError::Permanent(
            "Gemini returned an empty response".to_string(),
        ));
    }
    Ok(text)
}
