use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::Provider;
use crate::prompt::IMAGE_ASPECT_RATIO;
use crate::wire::TextRequest;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// `GEMINI_API_KEY`, falling back to `API_KEY`.
pub fn api_key_from_env() -> Option<String> {
    std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("API_KEY"))
        .ok()
        .filter(|k| !k.trim().is_empty())
}

pub struct GeminiProvider {
    text_model: String,
    image_model: String,
    api_base: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default = "default_mime")]
    mime_type: String,
    data: String,
}

fn default_mime() -> String {
    "image/png".into()
}

impl GeminiProvider {
    pub fn new(
        text_model: String,
        image_model: String,
        api_base: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            text_model,
            image_model,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    async fn generate_content(&self, model: &str, body: &Value) -> Result<GenerateResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("GEMINI_API_KEY (or API_KEY) env var is not set"))?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        );
        debug!(%url, "gemini: POST generateContent");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .context("gemini request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("gemini read body failed")?;
        debug!(%status, bytes = text.len(), "gemini: response received");

        if !status.is_success() {
            return Err(anyhow!("Gemini API error ({}): {}", status, text));
        }
        serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse Gemini response: {e}\nRaw: {text}"))
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": { "aspectRatio": IMAGE_ASPECT_RATIO }
            }
        });
        let parsed = self.generate_content(&self.image_model, &body).await?;
        parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .map(|d| format!("data:{};base64,{}", d.mime_type, d.data))
            .ok_or_else(|| anyhow!("Gemini returned no image data"))
    }

    async fn generate_text(&self, req: &TextRequest) -> Result<String> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": req.instruction.system }] },
            "contents": [{ "role": "user", "parts": [{ "text": req.instruction.user }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": req.response_schema
            }
        });
        let parsed = self.generate_content(&self.text_model, &body).await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        if text.trim().is_empty() {
            return Err(anyhow!("Gemini returned an empty text response"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Instruction;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, key: Option<&str>) -> GeminiProvider {
        GeminiProvider::new(
            "text-model".into(),
            "image-model".into(),
            Some(server.uri()),
            key.map(String::from),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn image_comes_back_as_data_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/image-model:generateContent"))
            .and(header("x-goog-api-key", "k"))
            .and(body_partial_json(json!({"generationConfig": {"imageConfig": {"aspectRatio": "1:1"}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [
                    { "text": "here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
                ]}}]
            })))
            .mount(&server)
            .await;

        let url = provider(&server, Some("k")).generate_image("a cat").await.unwrap();
        assert_eq!(url, "data:image/png;base64,QUJD");
    }

    #[tokio::test]
    async fn text_joins_parts_and_sends_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/text-model:generateContent"))
            .and(body_partial_json(json!({"generationConfig": {"responseMimeType": "application/json"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
            })))
            .mount(&server)
            .await;

        let req = TextRequest {
            instruction: Instruction { system: "s".into(), user: "u".into() },
            response_schema: json!({"type": "OBJECT"}),
        };
        let text = provider(&server, Some("k")).generate_text(&req).await.unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn http_error_and_missing_key_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        assert!(provider(&server, Some("k")).generate_image("x").await.is_err());
        let err = provider(&server, None).generate_image("x").await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
