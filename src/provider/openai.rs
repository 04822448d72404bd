use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::wire::TextRequest;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// OpenAI provider: chat completions in JSON mode for text, the images
/// endpoint for pictures.
pub struct OpenAIProvider {
    text_model: String,
    image_model: String,
    api_base: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

impl OpenAIProvider {
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

    async fn post(&self, endpoint: &str, body: &serde_json::Value) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY env var is not set"))?;
        let url = format!("{}{}", self.api_base.trim_end_matches('/'), endpoint);
        debug!(%url, "openai: POST");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(%status, bytes = text.len(), "openai: response received");

        if !status.is_success() {
            return Err(anyhow!("OpenAI API error ({}): {}", status, text));
        }
        Ok(text)
    }
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024"
        });
        let text = self.post("/v1/images/generations", &body).await?;
        let parsed: ImageResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse OpenAI image response: {e}"))?;
        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("OpenAI returned no image"))?;
        match (first.b64_json, first.url) {
            (Some(b64), _) => Ok(format!("data:image/png;base64,{b64}")),
            (None, Some(url)) => Ok(url),
            (None, None) => Err(anyhow!("OpenAI image entry had neither b64_json nor url")),
        }
    }

    async fn generate_text(&self, req: &TextRequest) -> Result<String> {
        // JSON mode does not take a schema, so it rides along in the system prompt.
        let system = format!(
            "{}\n\nRespond with a single JSON object matching this schema:\n{}",
            req.instruction.system,
            serde_json::to_string(&req.response_schema)?
        );
        let body = json!({
            "model": self.text_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": req.instruction.user }
            ],
            "temperature": 0.7,
            "response_format": { "type": "json_object" }
        });
        let text = self.post("/v1/chat/completions", &body).await?;
        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse OpenAI response: {e}\nRaw: {text}"))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("OpenAI returned an empty completion"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use crate::wire::Instruction;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAIProvider {
        OpenAIProvider::new(
            "gpt".into(),
            "img".into(),
            Some(server.uri()),
            Some("sk-test".into()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn image_prefers_b64_then_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "url": "https://cdn/img.png" }]
            })))
            .mount(&server)
            .await;

        let url = provider(&server).generate_image("p").await.unwrap();
        assert_eq!(url, "https://cdn/img.png");
    }

    #[tokio::test]
    async fn text_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{\"ok\":true}" } }]
            })))
            .mount(&server)
            .await;

        let req = TextRequest {
            instruction: Instruction { system: "s".into(), user: "u".into() },
            response_schema: json!({}),
        };
        assert_eq!(provider(&server).generate_text(&req).await.unwrap(), "{\"ok\":true}");
    }
}
