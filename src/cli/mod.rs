use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(alias = "open-ai")]
    OpenAI,
    Ollama,
}

/// Where captions, hashtags, plan and guide text come from.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    /// Template drafts refined by one text-generation call.
    Model,
    /// Template drafts only; no text-generation call.
    Templates,
}

#[derive(Parser, Debug)]
#[command(name = "indiemark", version, about = "Marketing campaign generator for indie apps")]
pub struct Args {
    /// TOML config file (defaults to <data-dir>/config.toml when present)
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub text_model: Option<String>,

    #[arg(long)]
    pub image_model: Option<String>,

    #[arg(long)]
    pub api_base: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long)]
    pub image_cap: Option<usize>,

    #[arg(long, value_enum)]
    pub text_source: Option<TextSource>,

    /// Generate non-interactively from a JSON or TOML parameters file
    #[arg(long)]
    pub params: Option<String>,

    /// With --params: save the result to the signed-in user's history
    #[arg(long, default_value_t = false)]
    pub save: bool,

    /// With --params: export the result into this directory
    #[arg(long)]
    pub export: Option<String>,

    /// Print the template library and category mappings, then exit
    #[arg(long, default_value_t = false)]
    pub library: bool,

    /// Open on the campaign history
    #[arg(long, default_value_t = false)]
    pub history: bool,

    #[arg(long)]
    pub save_request: Option<bool>,

    #[arg(long)]
    pub save_response: Option<bool>,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
