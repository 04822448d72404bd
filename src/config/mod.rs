use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{Args, ProviderKind, TextSource};
use crate::wire::CampaignParameters;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    /// Falls back to the provider's default when unset.
    pub text_model: Option<String>,
    pub image_model: Option<String>,
    pub api_base: Option<String>,
    pub ollama_url: String,
    pub timeout_secs: u64,
    pub image_cap: usize,
    pub text_source: TextSource,
    pub data_dir: PathBuf,
    pub save_request: bool,
    pub save_response: bool,
    pub profile_name: String,
    pub profile_email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            text_model: None,
            image_model: None,
            api_base: None,
            ollama_url: "http://localhost:11434".into(),
            timeout_secs: 300,
            image_cap: 8,
            text_source: TextSource::Model,
            data_dir: default_data_dir(),
            save_request: false,
            save_response: false,
            profile_name: "Indie Developer".into(),
            profile_email: "developer@localhost".into(),
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("indiemark")
}

impl Config {
    pub fn text_model(&self) -> &str {
        match (&self.text_model, self.provider) {
            (Some(m), _) => m,
            (None, ProviderKind::Gemini) => "gemini-2.5-pro",
            (None, ProviderKind::OpenAI) => "gpt-4.1-mini",
            (None, ProviderKind::Ollama) => "llama3.1",
        }
    }

    pub fn image_model(&self) -> &str {
        match (&self.image_model, self.provider) {
            (Some(m), _) => m,
            (None, ProviderKind::Gemini) => "gemini-2.5-flash-image",
            (None, ProviderKind::OpenAI) => "gpt-image-1",
            (None, ProviderKind::Ollama) => "none",
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config TOML")
    }

    /// Reads `path` if given (must exist), otherwise `<data_dir>/config.toml`
    /// when present, otherwise defaults. CLI flags are applied last.
    pub fn load(args: &Args) -> Result<Self> {
        let data_dir = args.data_dir.as_ref().map(PathBuf::from).unwrap_or_else(default_data_dir);
        let explicit = args.config.as_ref().map(PathBuf::from);
        let path = explicit.clone().unwrap_or_else(|| data_dir.join("config.toml"));

        let mut cfg = if explicit.is_some() || path.exists() {
            let text = fs::read_to_string(&path)?;
            Self::parse(&text).with_context(|| format!("loading {}", path.display()))?
        } else {
            Self::default()
        };
        if args.data_dir.is_some() {
            cfg.data_dir = data_dir;
        }
        cfg.apply_args(args);
        Ok(cfg)
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(p) = args.provider {
            self.provider = p;
        }
        if let Some(m) = &args.text_model {
            self.text_model = Some(m.clone());
        }
        if let Some(m) = &args.image_model {
            self.image_model = Some(m.clone());
        }
        if let Some(b) = &args.api_base {
            self.api_base = Some(b.clone());
        }
        if let Some(t) = args.timeout_secs {
            self.timeout_secs = t;
        }
        if let Some(c) = args.image_cap {
            self.image_cap = c;
        }
        if let Some(s) = args.text_source {
            self.text_source = s;
        }
        if let Some(v) = args.save_request {
            self.save_request = v;
        }
        if let Some(v) = args.save_response {
            self.save_response = v;
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("campaigns.sqlite")
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    pub fn ensure_data_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(&self.data_dir)
    }
}

/// Campaign parameters from a `.json` or `.toml` file. Other extensions are
/// tried as JSON, then TOML.
pub fn load_params(path: &Path) -> Result<CampaignParameters> {
    let text = fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
    let parsed = match ext.as_str() {
        "json" => serde_json::from_str(&text).map_err(anyhow::Error::from),
        "toml" => toml::from_str(&text).map_err(anyhow::Error::from),
        _ => serde_json::from_str(&text)
            .map_err(anyhow::Error::from)
            .or_else(|_| toml::from_str(&text).map_err(anyhow::Error::from)),
    };
    parsed.with_context(|| format!("invalid campaign parameters in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::parse("provider = \"openai\"\nimage_cap = 4\n").unwrap();
        assert_eq!(cfg.provider, ProviderKind::OpenAI);
        assert_eq!(cfg.image_cap, 4);
        assert_eq!(cfg.text_source, TextSource::Model);
        assert_eq!(cfg.text_model(), "gpt-4.1-mini");
        assert_eq!(cfg.image_model(), "gpt-image-1");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let cfg = Config::parse("schema_version = \"2025-11-03\"\nimage_cap = 2\n").unwrap();
        assert_eq!(cfg.image_cap, 2);
        assert_eq!(cfg.provider, ProviderKind::Gemini);
    }

    #[test]
    fn flags_override_file_values() {
        let mut cfg = Config::parse("provider = \"ollama\"\ntext_model = \"qwen\"\n").unwrap();
        let args = Args::parse_from([
            "indiemark",
            "--provider",
            "gemini",
            "--text-source",
            "templates",
            "--save-request",
            "true",
        ]);
        cfg.apply_args(&args);
        assert_eq!(cfg.provider, ProviderKind::Gemini);
        assert_eq!(cfg.text_model(), "qwen");
        assert_eq!(cfg.text_source, TextSource::Templates);
        assert!(cfg.save_request);
        assert!(!cfg.save_response);
    }

    #[test]
    fn load_reads_config_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "timeout_secs = 12\n").unwrap();
        let args = Args::parse_from(["indiemark", "--data-dir", dir.path().to_str().unwrap()]);
        let cfg = Config::load(&args).unwrap();
        assert_eq!(cfg.timeout_secs, 12);
        assert_eq!(cfg.data_dir, dir.path());
        assert_eq!(cfg.store_path(), dir.path().join("campaigns.sqlite"));
    }

    #[test]
    fn params_load_from_json_and_toml() {
        use crate::wire::{AppCategory, CampaignLength, TargetPlatform};

        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("p.json");
        std::fs::write(
            &json,
            r#"{"appName":"Zen","appCategory":"Meditation","keyFeatures":"- Breathe",
                "primaryAudience":["Students"],"uniqueness":"108 beads",
                "contentTone":"Casual","visualStyle":"Minimalist",
                "targetPlatforms":["Twitter / X"],"campaignLength":7}"#,
        )
        .unwrap();
        let p = load_params(&json).unwrap();
        assert_eq!(p.app_category, AppCategory::Meditation);
        assert_eq!(p.target_platforms, [TargetPlatform::Twitter]);
        assert_eq!(p.campaign_length, CampaignLength::Week);

        let toml_path = dir.path().join("p.toml");
        std::fs::write(
            &toml_path,
            "appName = \"Zen\"\nappCategory = \"Finance\"\nkeyFeatures = \"- Budgets\"\n\
             primaryAudience = [\"Parents\"]\nuniqueness = \"u\"\ncontentTone = \"Humorous\"\n\
             visualStyle = \"Lifestyle\"\ntargetPlatforms = [\"Reddit\"]\ncampaignLength = 30\n",
        )
        .unwrap();
        let p = load_params(&toml_path).unwrap();
        assert_eq!(p.app_category, AppCategory::Finance);
        assert_eq!(p.campaign_length, CampaignLength::Month);

        std::fs::write(&json, "{\"appName\": 1}").unwrap();
        assert!(load_params(&json).is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let args = Args::parse_from(["indiemark", "--config", "/definitely/not/here.toml"]);
        assert!(Config::load(&args).is_err());
    }
}
