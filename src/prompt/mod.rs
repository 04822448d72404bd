use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::library::{CategoryMapping, PromptTemplate, TemplateLibrary};
use crate::wire::{CampaignParameters, Caption, HashtagSet, Instruction, TextRequest};

pub type Values = HashMap<String, String>;

pub const IMAGE_ASPECT_RATIO: &str = "1:1";
/// Hashtags appended to a caption from its rotating set.
const CAPTION_HASHTAG_COUNT: usize = 5;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid"));
/// Any `{{...}}` pair, named or not.
static UNRESOLVED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{[^{}]*\}\}").expect("unresolved pattern is valid"));

/// Substitutes every `{{name}}` in `template` with `values[name]`.
///
/// Names are matched as literal tokens and values are inserted verbatim, so
/// regex metacharacters or `$` in either never change the result. Any
/// placeholder left unresolved (including ones carried in by a value) becomes
/// `[<appName>'s Detail]`, so the output never contains placeholder syntax.
pub fn fill(template: &str, values: &Values) -> String {
    let fallback = fallback_detail(values);
    let substituted = PLACEHOLDER.replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
        Some(v) => v.clone(),
        None => fallback.clone(),
    });
    UNRESOLVED.replace_all(&substituted, |_: &Captures| fallback.clone()).into_owned()
}

fn fallback_detail(values: &Values) -> String {
    let app = values
        .get("appName")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("App");
    format!("[{}'s Detail]", app)
}

fn with_examples(template: &PromptTemplate) -> Values {
    template
        .example_values()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Concrete image prompt: template examples overridden by the campaign inputs.
pub fn image_prompt(template: &PromptTemplate, params: &CampaignParameters, mapping: &CategoryMapping) -> String {
    let mut values = with_examples(template);
    values.insert("appName".into(), params.app_name.clone());
    values.insert("numPeople".into(), mapping.people_count.to_string());
    values.insert("deviceType".into(), mapping.device_type.to_string());
    values.insert("visualStyle".into(), params.visual_style.label().to_string());
    values.insert("specificDetail".into(), params.first_feature());
    values.insert("aspectRatio".into(), IMAGE_ASPECT_RATIO.to_string());
    fill(template.template, &values)
}

/// App name with all whitespace removed, for use inside a hashtag.
pub fn hashtag_app_name(app_name: &str) -> String {
    app_name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// "travelFocus" -> "Travel Focus"
pub fn humanize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

pub fn hashtag_set(template: &PromptTemplate, app_name: &str) -> HashtagSet {
    let mut values = Values::new();
    values.insert("AppName".into(), hashtag_app_name(app_name));
    values.insert("appName".into(), app_name.to_string());
    let filled = fill(template.template, &values);
    HashtagSet {
        use_case: humanize(template.name),
        hashtags: filled
            .split_whitespace()
            .filter(|t| t.starts_with('#') && t.len() > 1)
            .map(|t| t.to_string())
            .collect(),
    }
}

pub fn hashtag_snippet(set: &HashtagSet) -> String {
    set.hashtags.iter().take(CAPTION_HASHTAG_COUNT).cloned().collect::<Vec<_>>().join(" ")
}

pub fn caption(template: &PromptTemplate, params: &CampaignParameters, hashtags: &str, index: usize) -> Caption {
    let mut values = with_examples(template);
    values.insert("appName".into(), params.app_name.clone());
    values.insert("uniqueness".into(), params.uniqueness.trim().to_string());
    values.insert("whatItDoes".into(), params.uniqueness.trim().to_string());
    values.insert("solution".into(), params.uniqueness.trim().to_string());
    values.insert("hashtags".into(), hashtags.to_string());
    Caption {
        id: format!("cap_{}", index + 1),
        text: fill(template.template, &values),
    }
}

/// Guide markdown from the library's static template.
pub fn guide_markdown(library: &TemplateLibrary, params: &CampaignParameters) -> String {
    let mut values = Values::new();
    values.insert("appName".into(), params.app_name.clone());
    values.insert("contentTone".into(), params.content_tone.label().to_string());
    values.insert("visualStyle".into(), params.visual_style.label().to_string());
    values.insert("appCategory".into(), params.app_category.label().to_string());
    values.insert("primaryAudience".into(), params.audience_labels());
    fill(library.guide_template, &values)
}

pub fn system_prompt_text() -> String {
    r#"You are a senior social media marketer who writes launch campaigns for indie app developers.

Return EXACTLY ONE JSON object (no markdown, no prose, no code fences) that conforms to:

{
  "captions": [ { "text": string } ],
  "hashtagSets": [ { "useCase": string, "hashtags": [string] } ],
  "campaignPlan": [ { "day": integer, "postType": string, "captionPreview": string, "bestTimeToPost": string } ],
  "quickReferenceGuide": string
}

Rules:
- Every hashtag starts with '#'.
- "day" is 1-based and covers every day of the campaign exactly once.
- "quickReferenceGuide" is Markdown with sections for best practices, caption templates and a hashtag cheat sheet.
- Never invent statistics about the app; keep claims to what the details state.
- Starter copy is provided as a baseline; improve it, keep its structure."#
        .to_string()
}

pub fn user_prompt_text(params: &CampaignParameters, drafts: &[Caption], sets: &[HashtagSet]) -> String {
    let days = params.campaign_length.days();
    let mut out = format!(
        r#"Based on the following application details, generate a complete marketing campaign.

App Details:
- App Name: {name}
- App Category: {category}
- Key Features:
{features}
- Primary Audience: {audience}
- Uniqueness: {uniqueness}
- Competitors: {competitors}
- Content Tone: {tone}
- Visual Style: {style}
- Target Platforms: {platforms}
- Campaign Length: {days} days

Request:
1. Captions: Create {days} unique and engaging captions tailored to the specified tone and platforms.
2. Hashtag Sets: Create 4 distinct sets of hashtags for different use cases (e.g., General, Niche-specific, Launch Day, Community).
3. Campaign Plan: Create a day-by-day plan for a {days}-day campaign with varied post types.
4. Quick Reference Guide: Create a helpful guide in Markdown that summarizes best practices, provides caption templates, and includes a hashtag cheat sheet, all customized for this app.
"#,
        name = params.app_name,
        category = params.app_category,
        features = params.key_features,
        audience = params.audience_labels(),
        uniqueness = params.uniqueness,
        competitors = params.competitors.as_deref().filter(|c| !c.trim().is_empty()).unwrap_or("Not specified"),
        tone = params.content_tone,
        style = params.visual_style,
        platforms = params.platform_labels(),
        days = days,
    );

    if !drafts.is_empty() {
        out.push_str("\nStarter captions:\n");
        for c in drafts {
            out.push_str(&format!("--- {} ---\n{}\n", c.id, c.text));
        }
    }
    if !sets.is_empty() {
        out.push_str("\nStarter hashtag sets:\n");
        for s in sets {
            out.push_str(&format!("- {}: {}\n", s.use_case, s.hashtags.join(" ")));
        }
    }
    out
}

/// Response schema in the OpenAPI subset Gemini accepts.
pub fn response_schema(days: usize) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "captions": {
                "type": "ARRAY",
                "description": "A list of social media captions for the campaign.",
                "items": {
                    "type": "OBJECT",
                    "properties": { "text": { "type": "STRING" } },
                    "required": ["text"]
                }
            },
            "hashtagSets": {
                "type": "ARRAY",
                "description": "Sets of hashtags for different use cases.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "useCase": { "type": "STRING" },
                        "hashtags": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["useCase", "hashtags"]
                }
            },
            "campaignPlan": {
                "type": "ARRAY",
                "description": format!("A day-by-day campaign plan for {days} days."),
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "day": { "type": "INTEGER" },
                        "postType": { "type": "STRING" },
                        "captionPreview": { "type": "STRING" },
                        "bestTimeToPost": { "type": "STRING" }
                    },
                    "required": ["day", "postType", "captionPreview", "bestTimeToPost"]
                }
            },
            "quickReferenceGuide": {
                "type": "STRING",
                "description": "Markdown guide with caption templates and a hashtag cheat sheet."
            }
        },
        "required": ["captions", "hashtagSets", "campaignPlan", "quickReferenceGuide"]
    })
}

pub fn text_request(params: &CampaignParameters, drafts: &[Caption], sets: &[HashtagSet]) -> TextRequest {
    TextRequest {
        instruction: Instruction {
            system: system_prompt_text(),
            user: user_prompt_text(params, drafts, sets),
        },
        response_schema: response_schema(params.campaign_length.days()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{library, TemplateKind};

    fn values(pairs: &[(&str, &str)]) -> Values {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn fills_single_placeholder() {
        assert_eq!(fill("Hello {{name}}", &values(&[("name", "World")])), "Hello World");
    }

    #[test]
    fn replaces_every_occurrence() {
        assert_eq!(fill("{{x}}-{{x}}", &values(&[("x", "ab")])), "ab-ab");
    }

    #[test]
    fn unresolved_placeholders_use_fallback() {
        let out = fill("{{a}} {{missing}}", &values(&[("a", "X")]));
        assert!(!out.contains("{{"));
        assert!(out.contains('X'));
        assert_eq!(out, "X [App's Detail]");

        let out = fill("{{missing}}", &values(&[("appName", "Splitly")]));
        assert_eq!(out, "[Splitly's Detail]");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        assert_eq!(fill("plain text {not one}", &values(&[("a", "b")])), "plain text {not one}");
    }

    #[test]
    fn special_characters_are_literal() {
        let v = values(&[("price", "$1.00 (.*)"), ("appName", "A$B")]);
        assert_eq!(fill("Cost {{price}} {{nope}}", &v), "Cost $1.00 (.*) [A$B's Detail]");
    }

    #[test]
    fn placeholder_inside_value_does_not_leak() {
        let out = fill("{{a}}", &values(&[("a", "{{b}}")]));
        assert_eq!(out, "[App's Detail]");
    }

    #[test]
    fn malformed_placeholders_use_fallback() {
        let v = values(&[("appName", "Zen")]);
        assert_eq!(fill("Hi {{app-name}}", &v), "Hi [Zen's Detail]");
        assert_eq!(fill("Hi {{ }}", &v), "Hi [Zen's Detail]");
        assert_eq!(fill("Hi {{}}", &v), "Hi [Zen's Detail]");
        assert_eq!(fill("Hi {{first name}}", &v), "Hi [Zen's Detail]");
    }

    #[test]
    fn fill_is_idempotent() {
        let v = values(&[("name", "World"), ("appName", "Zen")]);
        let t = "Hi {{name}}, {{unknown}} and {{ name }}";
        let once = fill(t, &v);
        assert_eq!(fill(&once, &v), once);
    }

    #[test]
    fn hashtag_set_strips_spaces_from_brand_tag() {
        let lib = library();
        let t = lib.template(TemplateKind::Hashtag, "techApp").unwrap();
        let set = hashtag_set(t, "Split It Now");
        assert_eq!(set.use_case, "Tech App");
        assert_eq!(set.hashtags[0], "#SplitItNow");
        assert!(set.hashtags.iter().all(|h| h.starts_with('#')));
    }

    #[test]
    fn image_prompt_uses_campaign_inputs() {
        let lib = library();
        let params = CampaignParameters {
            app_name: "Zenly".into(),
            key_features: "- Guided breathing\n- Streaks".into(),
            ..Default::default()
        };
        let mapping = lib.mapping("meditation");
        let t = lib.template(TemplateKind::Image, "mountainSunriseMeditation").unwrap();
        let p = image_prompt(t, &params, mapping);
        assert!(p.contains("Zenly"));
        assert!(p.contains("'Guided breathing'"));
        assert!(p.contains("Apple Watch"));
        assert!(p.contains("Aspect ratio: 1:1."));
        assert!(!p.contains("{{"));
    }

    #[test]
    fn guide_mentions_audience_list() {
        let params = CampaignParameters {
            app_name: "Zenly".into(),
            primary_audience: vec![crate::wire::Audience::Students, crate::wire::Audience::Parents],
            ..Default::default()
        };
        let md = guide_markdown(library(), &params);
        assert!(md.starts_with("# Zenly Quick Reference Guide"));
        assert!(md.contains("Students, Parents"));
    }
}
