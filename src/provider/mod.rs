use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::wire::TextRequest;

pub mod gemini;
pub mod ollama;
pub mod openai;

/// Generation backend. Images come back as a displayable URL (remote or
/// `data:` URL); text comes back as the raw JSON document the model produced.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate_image(&self, prompt: &str) -> Result<String>;
    async fn generate_text(&self, req: &TextRequest) -> Result<String>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(cfg: &Config) -> Result<DynProvider> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let provider: DynProvider = match cfg.provider {
        ProviderKind::Gemini => Box::new(gemini::GeminiProvider::new(
            cfg.text_model().to_string(),
            cfg.image_model().to_string(),
            cfg.api_base.clone(),
            gemini::api_key_from_env(),
            timeout,
        )?),
        ProviderKind::OpenAI => Box::new(openai::OpenAIProvider::new(
            cfg.text_model().to_string(),
            cfg.image_model().to_string(),
            cfg.api_base.clone(),
            std::env::var("OPENAI_API_KEY").ok(),
            timeout,
        )?),
        ProviderKind::Ollama => Box::new(ollama::Ollama::new(
            cfg.text_model().to_string(),
            cfg.ollama_url.clone(),
            timeout,
        )?),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_provider_kind() {
        for kind in [ProviderKind::Gemini, ProviderKind::OpenAI, ProviderKind::Ollama] {
            let cfg = Config { provider: kind, ..Config::default() };
            let p = make_provider(&cfg).unwrap();
            assert!(!p.name().is_empty());
        }
    }
}
