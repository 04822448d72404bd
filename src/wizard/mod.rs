//! Four-step campaign form with per-step validation and review-mode jumps.

use std::collections::BTreeMap;

use crate::errors::IndieMarkError;
use crate::wire::{Audience, CampaignParameters, TargetPlatform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    AppBasics,
    AudiencePositioning,
    ContentPreferences,
    ReviewGenerate,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::AppBasics,
        WizardStep::AudiencePositioning,
        WizardStep::ContentPreferences,
        WizardStep::ReviewGenerate,
    ];

    /// 1-based position.
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn from_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::AppBasics => "App Basics",
            WizardStep::AudiencePositioning => "Audience & Positioning",
            WizardStep::ContentPreferences => "Content Preferences",
            WizardStep::ReviewGenerate => "Review & Generate",
        }
    }

    fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    fn prev(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    AppName,
    KeyFeatures,
    PrimaryAudience,
    Uniqueness,
    TargetPlatforms,
}

impl Field {
    /// Same key the serialized parameters use.
    pub fn key(self) -> &'static str {
        match self {
            Field::AppName => "appName",
            Field::KeyFeatures => "keyFeatures",
            Field::PrimaryAudience => "primaryAudience",
            Field::Uniqueness => "uniqueness",
            Field::TargetPlatforms => "targetPlatforms",
        }
    }
}

pub type FieldErrors = BTreeMap<Field, &'static str>;

pub fn validate_step(step: WizardStep, params: &CampaignParameters) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match step {
        WizardStep::AppBasics => {
            if params.app_name.trim().is_empty() {
                errors.insert(Field::AppName, "App name is required.");
            }
            if params.key_features.trim().is_empty() {
                errors.insert(Field::KeyFeatures, "Key features are required.");
            }
        }
        WizardStep::AudiencePositioning => {
            if params.primary_audience.is_empty() {
                errors.insert(Field::PrimaryAudience, "Select at least one primary audience.");
            }
            if params.uniqueness.trim().is_empty() {
                errors.insert(Field::Uniqueness, "This field is required.");
            }
        }
        WizardStep::ContentPreferences => {
            if params.target_platforms.is_empty() {
                errors.insert(Field::TargetPlatforms, "Select at least one target platform.");
            }
        }
        WizardStep::ReviewGenerate => {}
    }
    errors
}

/// Every validating step at once; empty means submittable.
pub fn validate_params(params: &CampaignParameters) -> FieldErrors {
    WizardStep::ALL
        .iter()
        .flat_map(|&step| validate_step(step, params))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOutcome {
    Advanced(WizardStep),
    Invalid,
    /// `next()` on the review step: the caller should start generation.
    ReadyToGenerate,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: WizardStep,
    draft: CampaignParameters,
    errors: FieldErrors,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self { step: WizardStep::AppBasics, draft: CampaignParameters::default(), errors: FieldErrors::new() }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &CampaignParameters {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn next(&mut self) -> NextOutcome {
        self.errors = validate_step(self.step, &self.draft);
        if !self.errors.is_empty() {
            return NextOutcome::Invalid;
        }
        match self.step.next() {
            Some(step) => {
                self.step = step;
                NextOutcome::Advanced(step)
            }
            None => NextOutcome::ReadyToGenerate,
        }
    }

    /// Returns false on the first step.
    pub fn back(&mut self) -> bool {
        match self.step.prev() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    /// Only honoured from the review step; keeps the draft as is.
    pub fn jump_to(&mut self, step: WizardStep) -> bool {
        if self.step != WizardStep::ReviewGenerate {
            return false;
        }
        self.step = step;
        true
    }

    /// Mutates the draft in place. Does not re-validate.
    pub fn edit(&mut self, f: impl FnOnce(&mut CampaignParameters)) {
        f(&mut self.draft);
    }

    pub fn toggle_audience(&mut self, audience: Audience) {
        toggle(&mut self.draft.primary_audience, audience);
    }

    pub fn toggle_platform(&mut self, platform: TargetPlatform) {
        toggle(&mut self.draft.target_platforms, platform);
    }

    /// Replaces the draft wholesale, e.g. from a parameters file.
    pub fn load(&mut self, params: CampaignParameters) {
        self.draft = params;
        self.errors.clear();
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Frozen copy of the draft, if every step validates.
    pub fn submission(&self) -> Result<CampaignParameters, IndieMarkError> {
        let errors = validate_params(&self.draft);
        if errors.is_empty() {
            Ok(self.draft.clone())
        } else {
            let msgs: Vec<String> = errors.iter().map(|(f, m)| format!("{}: {}", f.key(), m)).collect();
            Err(IndieMarkError::InvalidParameters(msgs.join(" ")))
        }
    }
}

fn toggle<T: PartialEq>(set: &mut Vec<T>, value: T) {
    if let Some(pos) = set.iter().position(|v| *v == value) {
        set.remove(pos);
    } else {
        set.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> Wizard {
        let mut w = Wizard::new();
        w.edit(|d| {
            d.app_name = "MyApp".into();
            d.key_features = "- a".into();
            d.uniqueness = "Only one that works offline".into();
        });
        w.toggle_audience(Audience::Students);
        w
    }

    #[test]
    fn empty_app_name_blocks_first_step() {
        let mut w = Wizard::new();
        assert_eq!(w.next(), NextOutcome::Invalid);
        assert_eq!(w.step(), WizardStep::AppBasics);
        assert_eq!(w.error(Field::AppName), Some("App name is required."));
        assert_eq!(w.error(Field::KeyFeatures), None);
    }

    #[test]
    fn valid_first_step_advances() {
        let mut w = Wizard::new();
        w.edit(|d| {
            d.app_name = "MyApp".into();
            d.key_features = "- a".into();
        });
        assert_eq!(w.next(), NextOutcome::Advanced(WizardStep::AudiencePositioning));
        assert!(w.errors().is_empty());
    }

    #[test]
    fn whitespace_only_fields_fail() {
        let mut w = Wizard::new();
        w.edit(|d| {
            d.app_name = "   ".into();
            d.key_features = "\n\t".into();
        });
        w.next();
        assert_eq!(w.errors().len(), 2);
    }

    #[test]
    fn second_and_third_step_rules() {
        let mut w = Wizard::new();
        w.edit(|d| d.app_name = "MyApp".into());
        w.next();
        assert_eq!(w.next(), NextOutcome::Invalid);
        assert_eq!(w.error(Field::PrimaryAudience), Some("Select at least one primary audience."));
        assert_eq!(w.error(Field::Uniqueness), Some("This field is required."));

        let mut w = filled();
        w.next();
        w.next();
        w.edit(|d| d.target_platforms.clear());
        assert_eq!(w.next(), NextOutcome::Invalid);
        assert_eq!(w.step(), WizardStep::ContentPreferences);
        assert_eq!(w.error(Field::TargetPlatforms), Some("Select at least one target platform."));
    }

    #[test]
    fn edits_do_not_revalidate() {
        let mut w = Wizard::new();
        w.next();
        w.edit(|d| d.app_name = "Fixed".into());
        assert!(w.error(Field::AppName).is_some());
    }

    #[test]
    fn review_next_requests_generation_and_back_is_noop_at_start() {
        let mut w = filled();
        assert!(!w.back());
        for _ in 0..3 {
            assert!(matches!(w.next(), NextOutcome::Advanced(_)));
        }
        assert_eq!(w.step(), WizardStep::ReviewGenerate);
        assert_eq!(w.next(), NextOutcome::ReadyToGenerate);
        assert_eq!(w.step(), WizardStep::ReviewGenerate);
        assert!(w.back());
        assert_eq!(w.step(), WizardStep::ContentPreferences);
    }

    #[test]
    fn jump_from_review_preserves_draft() {
        let mut w = filled();
        assert!(!w.jump_to(WizardStep::AppBasics));
        while w.step() != WizardStep::ReviewGenerate {
            w.next();
        }
        let before = w.draft().clone();
        assert!(w.jump_to(WizardStep::AppBasics));
        assert_eq!(w.step(), WizardStep::AppBasics);
        assert_eq!(w.draft(), &before);
    }

    #[test]
    fn toggles_keep_insertion_order() {
        let mut w = Wizard::new();
        w.toggle_audience(Audience::Gamers);
        w.toggle_audience(Audience::Students);
        w.toggle_audience(Audience::Parents);
        w.toggle_audience(Audience::Students);
        assert_eq!(w.draft().primary_audience, [Audience::Gamers, Audience::Parents]);

        w.toggle_platform(TargetPlatform::Instagram);
        assert_eq!(w.draft().target_platforms, [TargetPlatform::Twitter]);
    }

    #[test]
    fn reset_and_submission() {
        let mut w = filled();
        assert!(w.submission().is_ok());
        w.reset();
        assert_eq!(w.step(), WizardStep::AppBasics);
        assert_eq!(w.draft(), &CampaignParameters::default());
        assert!(matches!(w.submission(), Err(IndieMarkError::InvalidParameters(_))));
    }

    #[test]
    fn step_numbers() {
        assert_eq!(WizardStep::from_number(4), Some(WizardStep::ReviewGenerate));
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(5), None);
        assert_eq!(WizardStep::AudiencePositioning.number(), 2);
    }
}
