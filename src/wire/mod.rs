use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ========================================
/// Campaign data model
/// ========================================

macro_rules! labelled_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Case-insensitive match against the display label.
            pub fn from_label(s: &str) -> Option<Self> {
                let s = s.trim();
                Self::ALL.iter().copied().find(|v| v.label().eq_ignore_ascii_case(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_enum!(AppCategory {
    Meditation => "Meditation",
    Health => "Health",
    Productivity => "Productivity",
    Social => "Social",
    Travel => "Travel",
    Finance => "Finance",
    Education => "Education",
    Other => "Other",
});

labelled_enum!(Audience {
    Students => "Students",
    YoungAdults => "Young Adults",
    Professionals => "Professionals",
    Travelers => "Travelers",
    HealthConscious => "Health-Conscious",
    Parents => "Parents",
    Gamers => "Gamers",
});

labelled_enum!(ContentTone {
    Aspirational => "Aspirational",
    Relatable => "Relatable",
    Professional => "Professional",
    Casual => "Casual",
    Humorous => "Humorous",
});

labelled_enum!(VisualStyle {
    TravelInfluencer => "Travel Influencer",
    Lifestyle => "Lifestyle",
    Professional => "Professional",
    Minimalist => "Minimalist",
    ProductFocused => "Product-Focused",
});

labelled_enum!(TargetPlatform {
    Instagram => "Instagram",
    Twitter => "Twitter / X",
    Reddit => "Reddit",
    YouTube => "YouTube",
    LinkedIn => "LinkedIn",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum CampaignLength {
    Week,
    Fortnight,
    Month,
}

impl CampaignLength {
    pub const ALL: &'static [CampaignLength] =
        &[CampaignLength::Week, CampaignLength::Fortnight, CampaignLength::Month];

    pub fn days(&self) -> usize {
        match self {
            CampaignLength::Week => 7,
            CampaignLength::Fortnight => 14,
            CampaignLength::Month => 30,
        }
    }
}

impl TryFrom<u32> for CampaignLength {
    type Error = String;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        match v {
            7 => Ok(CampaignLength::Week),
            14 => Ok(CampaignLength::Fortnight),
            30 => Ok(CampaignLength::Month),
            other => Err(format!("campaign length must be 7, 14 or 30 days (got {other})")),
        }
    }
}

impl From<CampaignLength> for u32 {
    fn from(v: CampaignLength) -> u32 {
        v.days() as u32
    }
}

/// User-entered campaign input. Frozen once handed to generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignParameters {
    pub app_name: String,
    pub app_category: AppCategory,
    pub key_features: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_store_link: Option<String>,
    #[serde(default)]
    pub primary_audience: Vec<Audience>,
    #[serde(default)]
    pub uniqueness: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitors: Option<String>,
    pub content_tone: ContentTone,
    pub visual_style: VisualStyle,
    #[serde(default)]
    pub target_platforms: Vec<TargetPlatform>,
    pub campaign_length: CampaignLength,
}

impl Default for CampaignParameters {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            app_category: AppCategory::Productivity,
            key_features: "- Feature 1\n- Feature 2\n- Feature 3".into(),
            app_store_link: None,
            primary_audience: Vec::new(),
            uniqueness: String::new(),
            competitors: None,
            content_tone: ContentTone::Relatable,
            visual_style: VisualStyle::Lifestyle,
            target_platforms: vec![TargetPlatform::Instagram, TargetPlatform::Twitter],
            campaign_length: CampaignLength::Fortnight,
        }
    }
}

impl CampaignParameters {
    /// First line of the key features with any bullet marker stripped.
    pub fn first_feature(&self) -> String {
        let first = self.key_features.lines().next().unwrap_or("").trim();
        first
            .trim_start_matches(|c| c == '-' || c == '*' || c == '•')
            .trim()
            .to_string()
    }

    pub fn audience_labels(&self) -> String {
        self.primary_audience.iter().map(|a| a.label()).collect::<Vec<_>>().join(", ")
    }

    pub fn platform_labels(&self) -> String {
        self.target_platforms.iter().map(|p| p.label()).collect::<Vec<_>>().join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: String,
    pub url: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagSet {
    pub use_case: String,
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDay {
    pub day: u32,
    pub date: NaiveDate,
    pub post_type: String,
    pub caption_preview: String,
    pub image_preview_url: String,
    pub best_time_to_post: String,
}

/// The prompts actually sent, kept for the "Prompt Library" tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSnapshot {
    pub generated_image_prompts: Vec<String>,
    pub caption_templates: Vec<String>,
    pub hashtag_templates: Vec<String>,
    pub text_generation_prompt_summary: String,
    pub user_input_summary: CampaignParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub app_name: String,
    pub images: Vec<GeneratedImage>,
    pub captions: Vec<Caption>,
    pub hashtag_sets: Vec<HashtagSet>,
    pub campaign_plan: Vec<CampaignDay>,
    /// Rendered HTML.
    pub quick_reference_guide: String,
    pub prompt_library: PromptSnapshot,
}

impl CampaignRecord {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// ========================================
/// Text generation request/response
/// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    pub instruction: Instruction,
    /// JSON schema the response must follow (Gemini OpenAPI subset).
    pub response_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextCaption {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextHashtagSet {
    pub use_case: String,
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPlanDay {
    pub day: u32,
    pub post_type: String,
    pub caption_preview: String,
    pub best_time_to_post: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResponse {
    pub captions: Vec<TextCaption>,
    pub hashtag_sets: Vec<TextHashtagSet>,
    pub campaign_plan: Vec<TextPlanDay>,
    pub quick_reference_guide: String,
}

/// Extracts the first top-level JSON object substring from a string.
/// Handles nested braces; returns None if not found.
pub fn extract_first_json_object(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if start.is_some() => in_string = true,
            b'{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(st) = start {
                        return Some(s[st..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
pub(crate) fn sample_record(app_name: &str) -> CampaignRecord {
    CampaignRecord {
        id: None,
        saved_at: None,
        app_name: app_name.to_string(),
        images: vec![GeneratedImage {
            id: "img_1".into(),
            url: "https://img.test/1".into(),
            prompt: "A person at a desk".into(),
        }],
        captions: vec![Caption { id: "cap_1".into(), text: "Stop juggling, start doing.".into() }],
        hashtag_sets: vec![HashtagSet {
            use_case: "General".into(),
            hashtags: vec!["#indie".into(), "#apps".into()],
        }],
        campaign_plan: vec![CampaignDay {
            day: 1,
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
            post_type: "Pain Point: Relatable struggles".into(),
            caption_preview: "Stop juggling, start doing.".into(),
            image_preview_url: "https://img.test/1".into(),
            best_time_to_post: "9:00 AM".into(),
        }],
        quick_reference_guide: "<h1>Guide</h1>\n".into(),
        prompt_library: PromptSnapshot {
            generated_image_prompts: vec!["A person at a desk".into()],
            caption_templates: vec![],
            hashtag_templates: vec![],
            text_generation_prompt_summary: String::new(),
            user_input_summary: CampaignParameters { app_name: app_name.to_string(), ..Default::default() },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_serde() {
        let json = serde_json::to_string(&TargetPlatform::Twitter).unwrap();
        assert_eq!(json, "\"Twitter / X\"");
        let back: TargetPlatform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TargetPlatform::Twitter);
        assert_eq!(Audience::from_label("health-conscious"), Some(Audience::HealthConscious));
    }

    #[test]
    fn campaign_length_rejects_unknown_durations() {
        assert_eq!(serde_json::from_str::<CampaignLength>("30").unwrap(), CampaignLength::Month);
        assert!(serde_json::from_str::<CampaignLength>("10").is_err());
    }

    #[test]
    fn first_feature_strips_bullet() {
        let p = CampaignParameters {
            key_features: "- Splits bills in seconds\n- Offline".into(),
            ..Default::default()
        };
        assert_eq!(p.first_feature(), "Splits bills in seconds");
    }

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let raw = "Sure! Here it is:\n```json\n{\"a\": {\"b\": \"}\"}}\n```";
        assert_eq!(extract_first_json_object(raw).as_deref(), Some("{\"a\": {\"b\": \"}\"}}"));
        assert_eq!(extract_first_json_object("no json"), None);
    }

    #[test]
    fn record_serializes_without_persistence_metadata() {
        let rec = CampaignRecord {
            id: None,
            saved_at: None,
            app_name: "A".into(),
            images: vec![],
            captions: vec![],
            hashtag_sets: vec![],
            campaign_plan: vec![],
            quick_reference_guide: String::new(),
            prompt_library: PromptSnapshot {
                generated_image_prompts: vec![],
                caption_templates: vec![],
                hashtag_templates: vec![],
                text_generation_prompt_summary: String::new(),
                user_input_summary: CampaignParameters::default(),
            },
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert!(v.get("id").is_none());
        assert!(v.get("quickReferenceGuide").is_some());
    }
}
