//! Campaign generation: selects and fills templates, fans out the image
//! requests alongside the single text request, then assembles one record.

use chrono::{Local, NaiveDate};
use futures::future::{join, join_all};
use pulldown_cmark::{html, Options, Parser};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cli::TextSource;
use crate::config::Config;
use crate::errors::IndieMarkError;
use crate::library::{library, TemplateKind, TemplateLibrary, DEFAULT_CATEGORY};
use crate::log::save_stage;
use crate::plan;
use crate::prompt;
use crate::provider::Provider;
use crate::wire::{
    extract_first_json_object, CampaignDay, CampaignParameters, CampaignRecord, Caption,
    GeneratedImage, HashtagSet, PromptSnapshot, TextRequest, TextResponse,
};
use crate::wizard;

pub const TEMPLATES_ONLY_SUMMARY: &str =
    "Captions, hashtags, plan and guide assembled from the template library (no text-generation call).";

pub struct GenerateOptions<'a> {
    pub image_cap: usize,
    pub text_source: TextSource,
    pub today: NaiveDate,
    pub tx: Uuid,
    /// Where to write request/response artifacts, if anywhere.
    pub artifacts: Option<&'a Config>,
}

impl<'a> GenerateOptions<'a> {
    pub fn from_config(cfg: &'a Config) -> Self {
        Self {
            image_cap: cfg.image_cap,
            text_source: cfg.text_source,
            today: Local::now().date_naive(),
            tx: Uuid::new_v4(),
            artifacts: Some(cfg),
        }
    }
}

/// Distinct per call so a failed slot never collides with a real result.
pub fn failed_image_url() -> String {
    format!("https://picsum.photos/seed/error-{}/500/500", Uuid::new_v4().simple())
}

pub fn render_guide(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Strict parse first, then the first embedded JSON object.
pub fn parse_text_response(raw: &str) -> Result<TextResponse, IndieMarkError> {
    match serde_json::from_str::<TextResponse>(raw) {
        Ok(resp) => Ok(resp),
        Err(strict) => extract_first_json_object(raw)
            .and_then(|obj| serde_json::from_str::<TextResponse>(&obj).ok())
            .ok_or_else(|| IndieMarkError::Schema(strict.to_string())),
    }
}

/// Template-built text assets, before any model overlay.
struct Drafts {
    captions: Vec<Caption>,
    caption_templates: Vec<String>,
    hashtag_sets: Vec<HashtagSet>,
    hashtag_templates: Vec<String>,
}

/// Category's recommended names for `kind`, or the default category's when empty.
fn recommended_names<'a>(lib: &'a TemplateLibrary, key: &str, kind: TemplateKind) -> &'a [&'static str] {
    let list = lib.mapping(key).recommended(kind);
    if list.is_empty() {
        lib.mapping(DEFAULT_CATEGORY).recommended(kind)
    } else {
        list
    }
}

fn build_drafts(lib: &TemplateLibrary, key: &str, params: &CampaignParameters) -> Drafts {
    let mut hashtag_sets = Vec::new();
    let mut hashtag_templates: Vec<String> = Vec::new();
    for name in recommended_names(lib, key, TemplateKind::Hashtag) {
        match lib.template(TemplateKind::Hashtag, name) {
            Some(tpl) => {
                hashtag_sets.push(prompt::hashtag_set(tpl, &params.app_name));
                hashtag_templates.push(tpl.template.to_string());
            }
            None => warn!(template = %name, "hashtag template missing from library; skipped"),
        }
    }

    let days = params.campaign_length.days();
    let mut captions = Vec::with_capacity(days);
    let mut caption_templates: Vec<String> = Vec::new();
    for (i, name) in lib.select_templates(key, TemplateKind::Caption, days).into_iter().enumerate() {
        let Some(tpl) = lib.template(TemplateKind::Caption, name) else {
            warn!(template = %name, "caption template missing from library; skipped");
            continue;
        };
        let snippet = hashtag_sets
            .get(i % hashtag_sets.len().max(1))
            .map(prompt::hashtag_snippet)
            .unwrap_or_default();
        captions.push(prompt::caption(tpl, params, &snippet, captions.len()));
        if !caption_templates.iter().any(|t| t.as_str() == tpl.template) {
            caption_templates.push(tpl.template.to_string());
        }
    }

    Drafts { captions, caption_templates, hashtag_sets, hashtag_templates }
}

fn image_prompts(lib: &TemplateLibrary, key: &str, params: &CampaignParameters, cap: usize) -> Vec<String> {
    let mapping = lib.mapping(key);
    let available = recommended_names(lib, key, TemplateKind::Image).len();
    lib.select_templates(key, TemplateKind::Image, available.min(cap))
        .into_iter()
        .filter_map(|name| match lib.template(TemplateKind::Image, name) {
            Some(tpl) => Some(prompt::image_prompt(tpl, params, mapping)),
            None => {
                warn!(template = %name, "image template missing from library; skipped");
                None
            }
        })
        .collect()
}

fn normalize_tag(tag: &str) -> Option<String> {
    let t: String = tag.split_whitespace().collect();
    let t = t.trim_start_matches('#');
    if t.is_empty() {
        None
    } else {
        Some(format!("#{t}"))
    }
}

/// Overrides caption texts and hashtag sets with the non-blank parts of the
/// model response. Counts and ids stay as built locally.
fn overlay_text_assets(resp: &TextResponse, captions: &mut [Caption], sets: &mut Vec<HashtagSet>) {
    for (caption, text) in captions.iter_mut().zip(&resp.captions) {
        if !text.text.trim().is_empty() {
            caption.text = text.text.trim().to_string();
        }
    }

    let model_sets: Vec<HashtagSet> = resp
        .hashtag_sets
        .iter()
        .map(|s| HashtagSet {
            use_case: s.use_case.trim().to_string(),
            hashtags: s.hashtags.iter().filter_map(|t| normalize_tag(t)).collect(),
        })
        .filter(|s| !s.hashtags.is_empty())
        .collect();
    if !model_sets.is_empty() {
        *sets = model_sets;
    }
}

/// Overrides plan fields for every response day that matches a local day.
fn overlay_plan(resp: &TextResponse, days: &mut [CampaignDay]) {
    for entry in &resp.campaign_plan {
        let Some(day) = (entry.day as usize).checked_sub(1).and_then(|i| days.get_mut(i)) else {
            continue;
        };
        if !entry.post_type.trim().is_empty() {
            day.post_type = entry.post_type.trim().to_string();
        }
        if !entry.caption_preview.trim().is_empty() {
            day.caption_preview = plan::preview(&entry.caption_preview);
        }
        if !entry.best_time_to_post.trim().is_empty() {
            day.best_time_to_post = entry.best_time_to_post.trim().to_string();
        }
    }
}

async fn request_text(
    provider: &dyn Provider,
    request: &TextRequest,
    opts: &GenerateOptions<'_>,
) -> Result<TextResponse, IndieMarkError> {
    let raw = provider.generate_text(request).await.map_err(|e| {
        error!(provider = provider.name(), error = %e, "text generation failed");
        IndieMarkError::TextGeneration(format!("{e:#}"))
    })?;
    if let Some(cfg) = opts.artifacts {
        if let Err(e) = save_stage("text", request, Some(&raw), opts.tx, cfg) {
            warn!(error = %e, "could not save text artifacts");
        }
    }
    parse_text_response(&raw).map_err(|e| {
        error!(error = %e, "text response did not match the campaign schema");
        e
    })
}

async fn request_image(provider: &dyn Provider, index: usize, prompt: String) -> GeneratedImage {
    let url = match provider.generate_image(&prompt).await {
        Ok(url) => url,
        Err(e) => {
            warn!(slot = index + 1, error = %e, "image generation failed; using placeholder");
            failed_image_url()
        }
    };
    GeneratedImage { id: format!("img_{}", index + 1), url, prompt }
}

/// Builds one complete campaign. Individual image failures become
/// placeholders; a failed or malformed text response fails the whole call.
pub async fn generate(
    params: &CampaignParameters,
    provider: &dyn Provider,
    opts: &GenerateOptions<'_>,
) -> Result<CampaignRecord, IndieMarkError> {
    let errors = wizard::validate_params(params);
    if !errors.is_empty() {
        let fields: Vec<&str> = errors.keys().map(|f| f.key()).collect();
        return Err(IndieMarkError::InvalidParameters(fields.join(", ")));
    }

    let lib = library();
    let key = lib.resolve_category(params.app_category);
    let days = params.campaign_length.days();

    let prompts = image_prompts(lib, key, params, opts.image_cap);
    let Drafts { mut captions, caption_templates, mut hashtag_sets, hashtag_templates } =
        build_drafts(lib, key, params);

    let text_request = match opts.text_source {
        TextSource::Model => Some(prompt::text_request(params, &captions, &hashtag_sets)),
        TextSource::Templates => None,
    };
    info!(
        category = key,
        images = prompts.len(),
        days,
        provider = provider.name(),
        text = text_request.is_some(),
        "dispatching generation"
    );

    let image_futs = prompts.iter().cloned().enumerate().map(|(i, p)| request_image(provider, i, p));
    let text_fut = async {
        match &text_request {
            Some(req) => request_text(provider, req, opts).await.map(Some),
            None => Ok(None),
        }
    };
    let (images, text) = join(join_all(image_futs), text_fut).await;
    let text = text?;

    if let Some(resp) = &text {
        overlay_text_assets(resp, &mut captions, &mut hashtag_sets);
    }
    let mut campaign_plan = plan::build(lib, days, &captions, &images, opts.today);
    let mut guide = prompt::guide_markdown(lib, params);
    if let Some(resp) = &text {
        overlay_plan(resp, &mut campaign_plan);
        if !resp.quick_reference_guide.trim().is_empty() {
            guide = resp.quick_reference_guide.clone();
        }
    }

    let record = CampaignRecord {
        id: None,
        saved_at: None,
        app_name: params.app_name.clone(),
        images,
        captions,
        hashtag_sets,
        campaign_plan,
        quick_reference_guide: render_guide(&guide),
        prompt_library: PromptSnapshot {
            generated_image_prompts: prompts,
            caption_templates,
            hashtag_templates,
            text_generation_prompt_summary: text_request
                .map(|r| r.instruction.user)
                .unwrap_or_else(|| TEMPLATES_ONLY_SUMMARY.to_string()),
            user_input_summary: params.clone(),
        },
    };

    if let Some(cfg) = opts.artifacts {
        if let Err(e) = save_stage("campaign", params, Some(&record), opts.tx, cfg) {
            warn!(error = %e, "could not save campaign artifacts");
        }
    }
    info!(images = record.images.len(), captions = record.captions.len(), "campaign assembled");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::wire::{AppCategory, Audience, CampaignLength};

    struct FakeProvider {
        fail_image_call: Option<usize>,
        text: Result<String, String>,
        image_calls: AtomicUsize,
        text_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(text: Result<String, String>) -> Self {
            Self { fail_image_call: None, text, image_calls: AtomicUsize::new(0), text_calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn generate_image(&self, _prompt: &str) -> anyhow::Result<String> {
            let n = self.image_calls.fetch_add(1, Ordering::SeqCst);
            if Some(n) == self.fail_image_call {
                return Err(anyhow!("quota exceeded"));
            }
            Ok(format!("https://img.test/{n}"))
        }

        async fn generate_text(&self, _req: &TextRequest) -> anyhow::Result<String> {
            self.text_calls.fetch_add(1, Ordering::SeqCst);
            self.text.clone().map_err(|e| anyhow!(e))
        }
    }

    fn params() -> CampaignParameters {
        CampaignParameters {
            app_name: "Ledgerly".into(),
            app_category: AppCategory::Productivity,
            key_features: "- Tracks habits offline\n- Widgets".into(),
            primary_audience: vec![Audience::Students],
            uniqueness: "No signup, no cloud".into(),
            campaign_length: CampaignLength::Fortnight,
            ..Default::default()
        }
    }

    fn opts(text_source: TextSource, image_cap: usize) -> GenerateOptions<'static> {
        GenerateOptions {
            image_cap,
            text_source,
            today: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            tx: Uuid::new_v4(),
            artifacts: None,
        }
    }

    #[tokio::test]
    async fn templates_only_builds_full_record_without_text_call() {
        let provider = FakeProvider::new(Err("must not be called".into()));
        let rec = generate(&params(), &provider, &opts(TextSource::Templates, 8)).await.unwrap();

        assert_eq!(provider.text_calls.load(Ordering::SeqCst), 0);
        assert_eq!(rec.images.len(), 3);
        assert_eq!(rec.captions.len(), 14);
        assert_eq!(rec.campaign_plan.len(), 14);
        assert_eq!(rec.hashtag_sets.len(), 3);
        assert_eq!(rec.captions[13].id, "cap_14");
        assert!(rec.captions.iter().all(|c| !c.text.contains("{{")));
        assert!(rec.quick_reference_guide.contains("Ledgerly"));
        assert!(!rec.quick_reference_guide.contains("{{"));
        assert_eq!(rec.prompt_library.text_generation_prompt_summary, TEMPLATES_ONLY_SUMMARY);
        assert_eq!(rec.prompt_library.generated_image_prompts.len(), 3);
        assert_eq!(rec.prompt_library.user_input_summary, params());
        assert!(rec.id.is_none());
    }

    #[tokio::test]
    async fn prompt_snapshot_lists_each_caption_template_once() {
        let provider = FakeProvider::new(Ok(String::new()));
        let rec = generate(&params(), &provider, &opts(TextSource::Templates, 8)).await.unwrap();

        let snap = &rec.prompt_library;
        assert_eq!(snap.caption_templates.len(), 3);
        for (i, t) in snap.caption_templates.iter().enumerate() {
            assert!(!snap.caption_templates[..i].contains(t));
        }
        assert_eq!(snap.hashtag_templates.len(), 3);
    }

    #[tokio::test]
    async fn failed_image_keeps_slot_with_distinct_placeholder() {
        let mut provider = FakeProvider::new(Ok(String::new()));
        provider.fail_image_call = Some(1);
        let rec = generate(&params(), &provider, &opts(TextSource::Templates, 8)).await.unwrap();

        assert_eq!(rec.images.len(), 3);
        let ids: Vec<&str> = rec.images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["img_1", "img_2", "img_3"]);
        let placeholders: Vec<_> =
            rec.images.iter().filter(|i| i.url.starts_with("https://picsum.photos/seed/error-")).collect();
        assert_eq!(placeholders.len(), 1);
        let mut urls: Vec<&str> = rec.images.iter().map(|i| i.url.as_str()).collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 3);
        assert_ne!(failed_image_url(), failed_image_url());
    }

    #[tokio::test]
    async fn text_failure_is_fatal() {
        let provider = FakeProvider::new(Err("503 from backend".into()));
        let err = generate(&params(), &provider, &opts(TextSource::Model, 8)).await.unwrap_err();
        assert!(matches!(err, IndieMarkError::TextGeneration(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn malformed_text_is_a_schema_error() {
        let provider = FakeProvider::new(Ok("{\"captions\": \"nope\"}".into()));
        let err = generate(&params(), &provider, &opts(TextSource::Model, 8)).await.unwrap_err();
        assert!(matches!(err, IndieMarkError::Schema(_)));
    }

    #[tokio::test]
    async fn model_response_overrides_drafts_slot_by_slot() {
        let body = json!({
            "captions": [{ "text": "Model caption one" }, { "text": "   " }],
            "hashtagSets": [{ "useCase": "Launch", "hashtags": ["launchday", "#indie", " "] }],
            "campaignPlan": [
                { "day": 3, "postType": "Launch: Go live", "captionPreview": "", "bestTimeToPost": "12:00 PM" },
                { "day": 99, "postType": "Ignored", "captionPreview": "x", "bestTimeToPost": "x" }
            ],
            "quickReferenceGuide": "# Hi\n\nThere"
        });
        let raw = format!("Here you go:\n```json\n{body}\n```");
        let provider = FakeProvider::new(Ok(raw));
        let rec = generate(&params(), &provider, &opts(TextSource::Model, 8)).await.unwrap();

        let drafts = FakeProvider::new(Ok(String::new()));
        let baseline = generate(&params(), &drafts, &opts(TextSource::Templates, 8)).await.unwrap();

        assert_eq!(provider.text_calls.load(Ordering::SeqCst), 1);
        assert_eq!(rec.captions.len(), 14);
        assert_eq!(rec.captions[0].text, "Model caption one");
        assert_eq!(rec.captions[1].text, baseline.captions[1].text);
        assert_eq!(rec.hashtag_sets.len(), 1);
        assert_eq!(rec.hashtag_sets[0].hashtags, ["#launchday", "#indie"]);
        assert_eq!(rec.campaign_plan.len(), 14);
        assert_eq!(rec.campaign_plan[0].caption_preview, "Model caption one");
        assert_eq!(rec.campaign_plan[2].post_type, "Launch: Go live");
        assert_eq!(rec.campaign_plan[2].best_time_to_post, "12:00 PM");
        assert_eq!(rec.campaign_plan[2].caption_preview, baseline.campaign_plan[2].caption_preview);
        assert!(rec.quick_reference_guide.contains("<h1>Hi</h1>"));
        assert!(rec.prompt_library.text_generation_prompt_summary.contains("Ledgerly"));
    }

    #[tokio::test]
    async fn image_cap_limits_dispatch_and_zero_uses_plan_placeholders() {
        let provider = FakeProvider::new(Ok(String::new()));
        let rec = generate(&params(), &provider, &opts(TextSource::Templates, 2)).await.unwrap();
        assert_eq!(rec.images.len(), 2);

        let rec = generate(&params(), &provider, &opts(TextSource::Templates, 0)).await.unwrap();
        assert!(rec.images.is_empty());
        assert_eq!(rec.campaign_plan[4].image_preview_url, plan::placeholder_image(4));
    }

    #[tokio::test]
    async fn incomplete_parameters_are_rejected_before_dispatch() {
        let provider = FakeProvider::new(Ok(String::new()));
        let bad = CampaignParameters { app_name: "  ".into(), ..params() };
        let err = generate(&bad, &provider, &opts(TextSource::Model, 8)).await.unwrap_err();
        assert!(matches!(err, IndieMarkError::InvalidParameters(ref f) if f.contains("appName")));
        assert_eq!(provider.image_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn strict_json_parses_without_fallback() {
        let raw = r#"{"captions":[],"hashtagSets":[],"campaignPlan":[],"quickReferenceGuide":"g"}"#;
        assert_eq!(parse_text_response(raw).unwrap().quick_reference_guide, "g");
        assert!(matches!(parse_text_response("not json"), Err(IndieMarkError::Schema(_))));
    }
}
