use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::Provider;
use crate::wire::{Instruction, TextRequest};

/// Local text-only backend. Image requests always fail, so every image slot
/// falls back to a placeholder.
pub struct Ollama {
    model: String,
    url: String,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg>,
    stream: bool,
    format: &'a str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct Msg {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

fn to_messages(ins: &Instruction, schema: &serde_json::Value) -> Vec<Msg> {
    let mut sys = ins.system.clone();
    sys.push_str("\n\nRespond with JSON matching this schema:\n");
    sys.push_str(&schema.to_string());
    vec![
        Msg { role: "system".into(), content: sys },
        Msg { role: "user".into(), content: ins.user.clone() },
    ]
}

impl Ollama {
    pub fn new(model: String, url: String, timeout: Duration) -> Result<Self> {
        Ok(Self { model, url, client: Client::builder().timeout(timeout).build()? })
    }
}

#[async_trait]
impl Provider for Ollama {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate_image(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("ollama backend does not generate images"))
    }

    async fn generate_text(&self, req: &TextRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: to_messages(&req.instruction, &req.response_schema),
            stream: false,
            format: "json",
            options: OllamaOptions { temperature: 0.7 },
        };
        debug!(%url, "ollama: POST");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("ollama request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("ollama read body failed")?;
        if !status.is_success() {
            return Err(anyhow!("Ollama error ({}): {}", status, text));
        }

        // Fall back to the raw body when it is not the standard chat envelope.
        let content = match serde_json::from_str::<ChatResponse>(&text) {
            Ok(c) => c.message.content,
            Err(_) => text,
        };
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn unwraps_chat_envelope_in_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"format": "json", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "role": "assistant", "content": "{\"x\":1}" }
            })))
            .mount(&server)
            .await;

        let p = Ollama::new("m".into(), server.uri(), Duration::from_secs(5)).unwrap();
        let req = TextRequest {
            instruction: Instruction { system: "s".into(), user: "u".into() },
            response_schema: json!({}),
        };
        assert_eq!(p.generate_text(&req).await.unwrap(), "{\"x\":1}");
        assert!(p.generate_image("anything").await.is_err());
    }
}
