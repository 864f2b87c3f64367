//! # pb-ai-gemini
//!
//! `MetadataGenerator` backed by the Gemini REST API. The image travels as
//! inline base64 data and the model is asked for a JSON object matching
//! `PinMetadata`.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use pb_core::demo::CATEGORIES;
use pb_core::models::{ImagePayload, PinMetadata};
use pb_core::traits::MetadataGenerator;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GeminiMetadata {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiMetadata {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, api_key, model: model.into(), base_url: BASE_URL.to_string() })
    }

    /// Points the client at another endpoint (a proxy or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> anyhow::Result<String> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(body)
            .send()
            .await
            .context("Gemini API request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse =
            response.json().await.context("Failed to parse Gemini response")?;
        extract_text_response(parsed)
    }
}

pub fn prompt() -> String {
    format!(
        "Analyze this image for a Pinterest-style visual discovery application.\n\
         1. Generate a short, catchy Title (max 50 chars).\n\
         2. Generate an inspiring Description (max 150 chars).\n\
         3. Select the most relevant Category from this specific list: {}. \
         If none fit perfectly, pick the closest one.\n\
         4. Generate 5-8 relevant Tags (single words).\n\n\
         Return the result in JSON format.",
        CATEGORIES.join(", ")
    )
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "category": { "type": "STRING" },
            "tags": { "type": "ARRAY", "items": { "type": "STRING" } }
        }
    })
}

fn build_request(image: &ImagePayload) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![
                Part::InlineData {
                    inline_data: InlineDataPayload {
                        mime_type: image.mime_type.clone(),
                        data: BASE64_STANDARD.encode(&image.bytes),
                    },
                },
                Part::Text { text: prompt() },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: response_schema(),
        },
    }
}

/// Reads the model's JSON answer. Missing fields default to empty; a reply
/// wrapped in a markdown code fence is unwrapped first.
pub fn parse_metadata(text: &str) -> anyhow::Result<PinMetadata> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    let mut meta: PinMetadata = serde_json::from_str(body).context("model reply is not pin metadata")?;
    meta.tags.retain(|t| !t.trim().is_empty());
    Ok(meta)
}

#[async_trait]
impl MetadataGenerator for GeminiMetadata {
    async fn generate(&self, image: ImagePayload) -> anyhow::Result<PinMetadata> {
        if image.bytes.is_empty() {
            bail!("image is empty");
        }
        let request = build_request(&image);
        let text = self.send_request(&request).await?;
        let meta = parse_metadata(&text)?;
        tracing::debug!(model = %self.model, title = %meta.title, "metadata generated");
        Ok(meta)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> anyhow::Result<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| anyhow!("Gemini API returned no text in the response candidates"))
}

fn map_http_error(status: StatusCode, body: &str) -> anyhow::Error {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());
    anyhow!("Gemini API returned {}: {message}", status.as_u16())
}
