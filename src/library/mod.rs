//! Static prompt knowledge base: image prompts, caption templates and hashtag
//! sets, plus the per-category recommendation tables that pick between them.
//!
//! Built once on first access and never mutated afterwards.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::wire::AppCategory;

pub const DEFAULT_CATEGORY: &str = "productivity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TemplateKind {
    Image,
    Caption,
    Hashtag,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: &'static str,
    /// Theme group inside its kind (e.g. "aspirational", "painPoint").
    pub group: &'static str,
    pub template: &'static str,
    /// Placeholder name -> example value, in declaration order.
    pub variables: Vec<(&'static str, &'static str)>,
    pub best_for: Vec<&'static str>,
    /// Informational only.
    pub engagement_rate: f32,
}

impl PromptTemplate {
    pub fn example_values(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.variables.iter().copied()
    }
}

#[derive(Debug, Clone)]
pub struct CategoryMapping {
    pub key: &'static str,
    pub primary_audience: Vec<&'static str>,
    pub best_image_prompts: Vec<&'static str>,
    pub best_captions: Vec<&'static str>,
    pub hashtag_sets: Vec<&'static str>,
    pub visual_style: &'static str,
    pub mood: &'static str,
    pub people_count: &'static str,
    pub device_type: &'static str,
}

impl CategoryMapping {
    pub fn recommended(&self, kind: TemplateKind) -> &[&'static str] {
        match kind {
            TemplateKind::Image => &self.best_image_prompts,
            TemplateKind::Caption => &self.best_captions,
            TemplateKind::Hashtag => &self.hashtag_sets,
        }
    }
}

/// One weekday slot of the weekly content mix.
#[derive(Debug, Clone, Copy)]
pub struct ContentSlot {
    pub post_type: &'static str,
    pub goal: &'static str,
}

impl ContentSlot {
    pub fn label(&self) -> String {
        format!("{}: {}", self.post_type, self.goal)
    }
}

pub struct TemplateLibrary {
    pub version: &'static str,
    templates: BTreeMap<TemplateKind, BTreeMap<&'static str, PromptTemplate>>,
    mappings: BTreeMap<&'static str, CategoryMapping>,
    default_mapping: CategoryMapping,
    pub weekly_mix: [ContentSlot; 7],
    pub guide_template: &'static str,
}

impl TemplateLibrary {
    pub fn template(&self, kind: TemplateKind, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(&kind).and_then(|m| m.get(name))
    }

    pub fn templates(&self, kind: TemplateKind) -> impl Iterator<Item = &PromptTemplate> {
        self.templates.get(&kind).into_iter().flat_map(|m| m.values())
    }

    pub fn mappings(&self) -> impl Iterator<Item = &CategoryMapping> {
        self.mappings.values()
    }

    pub fn has_category(&self, key: &str) -> bool {
        self.mappings.contains_key(key)
    }

    /// Mapping for `key`, or the default category's mapping.
    pub fn mapping(&self, key: &str) -> &CategoryMapping {
        self.mappings.get(key).unwrap_or(&self.default_mapping)
    }

    /// Maps an app category to its lookup key, falling back to the default key.
    pub fn resolve_category(&self, category: AppCategory) -> &'static str {
        let key = match category {
            AppCategory::Finance => "expense",
            AppCategory::Meditation => "meditation",
            AppCategory::Health => "health",
            AppCategory::Productivity => "productivity",
            AppCategory::Social => "social",
            AppCategory::Travel => "travel",
            AppCategory::Education => "education",
            AppCategory::Other => "other",
        };
        if self.has_category(key) {
            key
        } else {
            DEFAULT_CATEGORY
        }
    }

    /// Returns exactly `count` template names from the category's recommended
    /// list for `kind`, cycling from the start when the list is shorter.
    /// An empty list is treated as if the default category had been asked for.
    pub fn select_templates(&self, key: &str, kind: TemplateKind, count: usize) -> Vec<&'static str> {
        let mut list = self.mapping(key).recommended(kind);
        if list.is_empty() {
            list = self.mapping(DEFAULT_CATEGORY).recommended(kind);
        }
        if list.is_empty() {
            return Vec::new();
        }
        (0..count).map(|i| list[i % list.len()]).collect()
    }

    pub fn content_slot(&self, index: usize) -> ContentSlot {
        self.weekly_mix[index % self.weekly_mix.len()]
    }
}

pub fn library() -> &'static TemplateLibrary {
    &LIBRARY
}

fn tpl(
    name: &'static str,
    group: &'static str,
    template: &'static str,
    variables: &[(&'static str, &'static str)],
    best_for: &[&'static str],
    engagement_rate: f32,
) -> PromptTemplate {
    PromptTemplate {
        name,
        group,
        template,
        variables: variables.to_vec(),
        best_for: best_for.to_vec(),
        engagement_rate,
    }
}

fn hashtags(name: &'static str, template: &'static str) -> PromptTemplate {
    tpl(name, "hashtags", template, &[("AppName", "app name without spaces")], &[], 0.0)
}

#[allow(clippy::too_many_arguments)]
fn mapping(
    key: &'static str,
    primary_audience: &[&'static str],
    best_image_prompts: &[&'static str],
    best_captions: &[&'static str],
    hashtag_sets: &[&'static str],
    visual_style: &'static str,
    mood: &'static str,
    people_count: &'static str,
    device_type: &'static str,
) -> CategoryMapping {
    CategoryMapping {
        key,
        primary_audience: primary_audience.to_vec(),
        best_image_prompts: best_image_prompts.to_vec(),
        best_captions: best_captions.to_vec(),
        hashtag_sets: hashtag_sets.to_vec(),
        visual_style,
        mood,
        people_count,
        device_type,
    }
}

fn image_prompts() -> Vec<PromptTemplate> {
    vec![
        tpl(
            "heroGroupVacation",
            "aspirational",
            "Create a stunning, aspirational vacation scene: Group of {{numPeople}} diverse friends at {{location}} during golden hour sunset. One person holding {{deviceType}} showing {{appName}} app with '{{specificDetail}}' visible on screen. Everyone relaxed, laughing, drinks in hand, celebrating. Golden hour lighting, warm tones, peaceful. Mood: '{{moodPhrase}}'. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("numPeople", "4-5"),
                ("location", "beach/rooftop/mountain viewpoint"),
                ("deviceType", "iPhone/iPad"),
                ("appName", "user's app name"),
                ("specificDetail", "key metric or feature visible"),
                ("moodPhrase", "This is how [activity] should feel"),
                ("visualStyle", "Travel influencer content"),
                ("aspectRatio", "4:5 for Instagram"),
            ],
            &["launch", "aspiration", "social apps", "travel apps"],
            6.1,
        ),
        tpl(
            "mountainSunriseMeditation",
            "aspirational",
            "Create a breathtaking landscape photograph: Person sitting on a flat rock overlooking misty mountain valley at sunrise. Person in meditation pose (lotus position), seen from behind/side angle. They're wearing {{deviceType}} clearly visible on wrist showing {{appName}} app interface with '{{specificDetail}}' readable on screen. Golden hour lighting streaming from right, creating warm glow. Peaceful mist in valley below. Majestic mountains in background. Natural, unposed moment of genuine practice. Atmosphere: serene, sacred, aspirational. Mood: '{{moodPhrase}}'. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("deviceType", "Apple Watch"),
                ("appName", "user's app name"),
                ("specificDetail", "key feature detail"),
                ("moodPhrase", "This is [practice/activity] done right"),
                ("visualStyle", "National Geographic meets mindfulness content"),
                ("aspectRatio", "4:5 for Instagram"),
            ],
            &["launch", "inspiration", "meditation apps", "health apps"],
            5.2,
        ),
        tpl(
            "morningRitualPeace",
            "aspirational",
            "Peaceful home scene: Person (late 20s-early 30s) sitting cross-legged on meditation cushion in minimalist room, soft morning light streaming through window. {{deviceType}} on wrist clearly visible showing {{appName}} app mid-practice ('{{specificDetail}}' visible). Small altar with candle and incense nearby. Expression of deep peace and focus. Clean, simple space (white walls, wooden floor, minimal furniture). Mood: '{{moodPhrase}}'. Atmosphere: Calm, sacred, accessible. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("deviceType", "Apple Watch/iPhone"),
                ("appName", "user's app name"),
                ("specificDetail", "progress or feature detail"),
                ("moodPhrase", "This could be your morning"),
                ("visualStyle", "Natural lifestyle photography, warm tones"),
                ("aspectRatio", "4:5"),
            ],
            &["daily practice", "routine", "morning content"],
            4.9,
        ),
        tpl(
            "collegeRoadTrip",
            "aspirational",
            "Inside car at scenic viewpoint: {{numPeople}} college-age friends (18-24) on road trip adventure. One person in front seat holding {{deviceType}} showing {{appName}} with '{{groupName}}' visible. Backpacks, snacks, maps visible. Youthful, adventurous energy. App shows clear breakdown: {{expenseBreakdown}}. Mountain road visible through windshield. Golden hour lighting. Everyone smiling, excited. Mood: '{{moodPhrase}}'. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("numPeople", "4-5"),
                ("deviceType", "iPhone"),
                ("appName", "user's app name"),
                ("groupName", "Trip name or group name"),
                ("expenseBreakdown", "key expenses shown"),
                ("moodPhrase", "Living best life on budget"),
                ("visualStyle", "Youth adventure content, authentic travel"),
                ("aspectRatio", "4:5 or 9:16 for Reels"),
            ],
            &["student audience", "adventure", "youth marketing"],
            5.9,
        ),
        tpl(
            "restaurantBillConfusion",
            "painPoint",
            "Trendy restaurant scene: Table of {{numPeople}} friends finishing dinner, bills and receipts scattered on table. One person holding {{deviceType}} showing {{appName}} app with bill clearly visible on screen, everyone looking at phone. Warm restaurant lighting, evening setting. Natural expressions of relief and satisfaction. Phone screen shows clear bill split among {{numPeople}} people. Background shows other diners slightly blurred. Mood: '{{moodPhrase}}'. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("numPeople", "6"),
                ("deviceType", "iPhone"),
                ("appName", "user's app name"),
                ("moodPhrase", "This app just saved us 45 minutes of awkwardness"),
                ("visualStyle", "Lifestyle content, authentic moment, candid"),
                ("aspectRatio", "1:1 square"),
            ],
            &["problem awareness", "relatable", "use case"],
            5.5,
        ),
        tpl(
            "morningChaosVsCalm",
            "painPoint",
            "Split screen comparison: LEFT - Person stressed in messy bedroom, alarm blaring (phone showing 6:00 AM with multiple snooze notifications), rushing, chaos, clothes everywhere, harsh artificial lighting. RIGHT - Same person calm and centered in meditation pose on yoga mat wearing {{deviceType}} showing {{appName}}, soft morning natural light, peaceful expression, organized room. Dramatic contrast showing transformation. Text overlay optional: 'Old me vs. New me'. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("deviceType", "Apple Watch"),
                ("appName", "user's app name"),
                ("visualStyle", "Relatable before/after storytelling, authentic transformation"),
                ("aspectRatio", "1:1 square"),
            ],
            &["transformation", "relatability", "before/after"],
            5.4,
        ),
        tpl(
            "spreadsheetChaos",
            "painPoint",
            "Split screen comparison: LEFT - Person stressed at laptop late at night, multiple spreadsheets visible on screen, scattered receipts covering desk, multiple coffee cups, clock showing 11:47 PM, frustrated expression, harsh lighting. RIGHT - Same person relaxed, clean organized desk, just holding {{deviceType}} showing {{appName}} app with simple '{{successMessage}}' screen, smiling, daylight streaming through window. Dramatic contrast between chaos and simplicity. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("deviceType", "iPhone/iPad"),
                ("appName", "user's app name"),
                ("successMessage", "Done! or Settled Up! or Completed!"),
                ("visualStyle", "Problem-solution storytelling, relatable content"),
                ("aspectRatio", "1:1 square"),
            ],
            &["pain point", "transformation", "productivity"],
            5.8,
        ),
        tpl(
            "thatFriendCallout",
            "painPoint",
            "Humorous but relatable scene: Group of {{numPeople}} friends at coffee shop, 3 looking slightly annoyed/amused at 4th friend who's 'forgetting wallet' again. One person holding {{deviceType}} showing {{appName}} with that friend's name highlighted owing {{amountOwed}} from multiple occasions. Casual coffee shop setting, afternoon light. Expressions are playful, not mean. Mood: '{{moodPhrase}}' Tone: Humorous, relatable, slightly calling out. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("numPeople", "4"),
                ("deviceType", "iPhone"),
                ("appName", "user's app name"),
                ("amountOwed", "amount with currency symbol"),
                ("moodPhrase", "We all have THAT friend 😂"),
                ("visualStyle", "Relatable social content, candid moment"),
                ("aspectRatio", "1:1 square"),
            ],
            &["viral potential", "tagging", "humor", "social"],
            7.1,
        ),
        tpl(
            "appleWatchCloseup",
            "feature",
            "Close-up product photography shot: {{deviceType}} on wrist during {{activity}}. Watch face displaying {{appName}} interface with '{{featureDetail}}' clearly visible and {{animationDetail}}. Person's hand in {{handPosition}}. Soft focus background showing {{backgroundSetting}}. Natural skin tones, {{lightingType}} light from side. Screen clearly readable, beautiful bokeh in background. Mood: '{{moodPhrase}}'. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("deviceType", "Apple Watch"),
                ("activity", "meditation/workout/activity session"),
                ("appName", "user's app name"),
                ("featureDetail", "specific feature or metric"),
                ("animationDetail", "animation description if applicable"),
                ("handPosition", "meditation mudra/relaxed position/gesture"),
                ("backgroundSetting", "meditation space/workspace/activity setting"),
                ("lightingType", "morning/golden hour/soft"),
                ("moodPhrase", "Traditional practice meets modern tool"),
                ("visualStyle", "Premium product photography meets lifestyle aesthetic"),
                ("aspectRatio", "4:5"),
            ],
            &["feature highlight", "product focus", "detail showcase"],
            4.7,
        ),
        tpl(
            "noSignupPrivacy",
            "feature",
            "Split vertical comparison: LEFT - Phone showing typical app signup flow (email, password, permissions), person looking skeptical. RIGHT - {{appName}} opening immediately to main screen, 'No signup required' text visible, person relieved. Clean design. Text overlay: 'Your {{dataType}} is YOUR business'. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("appName", "user's app name"),
                ("dataType", "expenses/meditation/data type"),
                ("visualStyle", "Tech comparison, clean UI focus"),
                ("aspectRatio", "1:1 or 4:5"),
            ],
            &["privacy feature", "USP", "differentiation"],
            4.5,
        ),
        tpl(
            "healthKitIntegration",
            "feature",
            "Split screen or layered composition: LEFT/TOP - {{deviceType}} showing {{appName}} with activity completion. RIGHT/BOTTOM - iPhone Health app showing {{metricType}} being logged automatically. Connection line or animation between the two. Clean, technical but approachable. Person in background using app naturally. Mood: '{{moodPhrase}}'. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("deviceType", "Apple Watch/iPhone"),
                ("appName", "user's app name"),
                ("metricType", "Meditation Minutes/Mindful Minutes/Activity"),
                ("moodPhrase", "It all counts, automatically"),
                ("visualStyle", "Tech feature showcase, Apple ecosystem aesthetic"),
                ("aspectRatio", "1:1 or 4:5"),
            ],
            &["integration showcase", "Apple ecosystem", "automation"],
            4.3,
        ),
        tpl(
            "streakCelebration",
            "achievement",
            "Joyful celebration shot: Person smiling genuinely, looking at {{deviceType}} showing '{{streakNumber}} Day Streak! 🎉' achievement screen on {{appName}} app. Natural setting (could be home, outdoors, or {{activityLocation}}). Genuine expression of accomplishment and pride. Screen clearly shows streak achievement with confetti animation. Soft natural lighting. Background slightly blurred, focus on person and device. Mood: '{{moodPhrase}}'. Style: {{visualStyle}}. Aspect ratio: {{aspectRatio}}.",
            &[
                ("deviceType", "Apple Watch/iPhone"),
                ("streakNumber", "30"),
                ("appName", "user's app name"),
                ("activityLocation", "yoga studio/workplace/relevant location"),
                ("moodPhrase", "I actually did it - X days of daily practice"),
                ("visualStyle", "User achievement content, authentic celebration"),
                ("aspectRatio", "4:5 or 9:16 for Reels"),
            ],
            &["milestones", "motivation", "user stories"],
            6.5,
        ),
    ]
}

fn caption_templates() -> Vec<PromptTemplate> {
    vec![
        tpl(
            "painPointHook",
            "captions",
            "{{relatableMoment}}\n\n{{awkwardPart}}\n• {{detail1}}\n• {{detail2}}\n• {{detail3}}\n\n{{timeWasted}} later, still figuring it out.\n\nThere's a better way.\n\n{{appName}}. {{whatItDoes}}. {{timeSaved}}.\n\nDownload free: [link in bio]\n\n{{hashtags}}",
            &[
                ("relatableMoment", "The bill arrives."),
                ("awkwardPart", "The awkward part:"),
                ("detail1", "Who ordered what"),
                ("detail2", "Who already paid"),
                ("detail3", "Who still owes"),
                ("timeWasted", "45 minutes"),
                ("appName", "user's app name"),
                ("whatItDoes", "Brief solution"),
                ("timeSaved", "Sorted in seconds"),
                ("hashtags", "relevant hashtag set"),
            ],
            &["problem awareness", "relatable content", "first touch"],
            4.2,
        ),
        tpl(
            "transformationStory",
            "captions",
            "BEFORE {{appName}}:\n{{beforeSituation}}\n⏰ Time: {{beforeTime}}\n😤 Stress: {{beforeStress}}\n\nAFTER {{appName}}:\n{{afterSituation}}\n⏰ Time: {{afterTime}}\n😊 Stress: {{afterStress}}\n\nTime saved per {{frequency}}: {{timeSaved}}\n\nTry it free: [link]\n\n{{hashtags}}",
            &[
                ("appName", "user's app name"),
                ("beforeSituation", "Juggling it all by hand"),
                ("beforeTime", "3 hours"),
                ("beforeStress", "Maximum"),
                ("afterSituation", "One tap and done"),
                ("afterTime", "10 minutes"),
                ("afterStress", "Zero"),
                ("frequency", "week"),
                ("timeSaved", "2 hours 50 minutes"),
                ("hashtags", "relevant hashtag set"),
            ],
            &["transformation", "before/after", "results"],
            5.1,
        ),
        tpl(
            "specificNumbers",
            "captions",
            "{{scenarioName}} for {{numPeople}} {{peopleType}}: {{totalAmount}}\n\nPer person: {{perPersonAmount}}\n\nBut:\n• {{complication1}}\n• {{complication2}}\n• {{complication3}}\n\nWITH {{appName}}:\n{{solution}}. {{timeframe}}. Done.\n\nFree download: [link]\n\n{{hashtags}}",
            &[
                ("scenarioName", "Weekend trip"),
                ("numPeople", "5"),
                ("peopleType", "friends"),
                ("totalAmount", "$1,250"),
                ("perPersonAmount", "$250"),
                ("complication1", "Who paid for what"),
                ("complication2", "Someone paid twice"),
                ("complication3", "Someone forgot to pay"),
                ("appName", "user's app name"),
                ("solution", "How app solves it"),
                ("timeframe", "5 minutes"),
                ("hashtags", "relevant hashtag set"),
            ],
            &["concrete examples", "use cases", "specificity"],
            4.8,
        ),
        tpl(
            "thatFriendCallout",
            "captions",
            "We all have that {{personType}} who {{behavior}} 😂\n\n\"{{excuse1}}\"\n\"{{excuse2}}\"\n\n[{{timeElapsed}} later...]\n\n{{appName}} tracks it all.\n\nScreenshots don't lie 📸\n\nTag that {{personType}} 👇\n\nDownload: [link]\n\n{{hashtags}}",
            &[
                ("personType", "friend"),
                ("behavior", "forgot their wallet again"),
                ("excuse1", "I'll get you next time"),
                ("excuse2", "Can you spot me?"),
                ("timeElapsed", "3 weeks"),
                ("appName", "user's app name"),
                ("hashtags", "relevant hashtag set"),
            ],
            &["viral potential", "tagging", "humor", "engagement"],
            6.2,
        ),
        tpl(
            "founderStory",
            "captions",
            "Real talk:\n\nI built {{appName}} because {{genuineReason}}\n\n{{specificProblem}}\n\nSo I built this.\n\nNow {{userCount}}+ people are using it.\n\nAnd hopefully, {{positiveImpact}}.\n\nThat's why I do this.\n\nDownload: [link in bio]\n\n{{hashtags}}",
            &[
                ("appName", "user's app name"),
                ("genuineReason", "nothing else worked the way I needed."),
                ("specificProblem", "Every tool I tried made the simple thing hard."),
                ("userCount", "1,000"),
                ("positiveImpact", "their days feel a little lighter"),
                ("hashtags", "relevant hashtag set"),
            ],
            &["authenticity", "personal story", "connection"],
            3.8,
        ),
        tpl(
            "morningRitualHook",
            "captions",
            "{{timeOfDay}}.\n\nThe alarm goes off.\n\nOld me: {{oldBehavior1}}. {{oldBehavior2}}. {{oldResult}}.\n\nNew me:\n• {{newBehavior1}}\n• {{newBehavior2}}\n• {{newDuration}} of {{activity}}\n\nThen I start my day.\n\n{{outcome}}.\n\nDownload {{appName}}: [link in bio]\n\n{{hashtags}}",
            &[
                ("timeOfDay", "5:47 AM"),
                ("oldBehavior1", "Snooze"),
                ("oldBehavior2", "Scroll"),
                ("oldResult", "Rushed and scattered"),
                ("newBehavior1", "Water"),
                ("newBehavior2", "Deep breath"),
                ("newDuration", "10 minutes"),
                ("activity", "peace"),
                ("outcome", "Calm, clear, ready"),
                ("appName", "user's app name"),
                ("hashtags", "relevant hashtag set"),
            ],
            &["routine", "habit building", "morning content"],
            4.5,
        ),
        tpl(
            "tradition108",
            "captions",
            "{{number}} {{item}}.\n\nSacred number in:\n• {{tradition1}}\n• {{tradition2}}\n• {{tradition3}}\n\nFor centuries, practitioners used {{oldMethod}}.\n\nNow? {{modernMethod}}.\n\nAncient practice. Modern tool.\n\n{{appName}}. Built for {{platform}}.\n\nDownload: [link in bio]\n\n{{hashtags}}",
            &[
                ("number", "108"),
                ("item", "beads"),
                ("tradition1", "Hinduism"),
                ("tradition2", "Buddhism"),
                ("tradition3", "Yoga"),
                ("oldMethod", "a mala in hand"),
                ("modernMethod", "A gentle tap on your wrist"),
                ("appName", "user's app name"),
                ("platform", "Apple Watch"),
                ("hashtags", "relevant hashtag set"),
            ],
            &["education", "tradition", "cultural connection"],
            4.6,
        ),
    ]
}

fn hashtag_templates() -> Vec<PromptTemplate> {
    vec![
        hashtags("travelFocus", "#{{AppName}} #GroupTravel #TravelWithFriends #VacationPlanning #BudgetTravel #TravelHacks #FriendshipGoals"),
        hashtags("roommateFocus", "#{{AppName}} #RoommateLife #BillSplit #CollegeLife #AdultingLife #MoneyManagement #SharedApartment #RoommateGoals"),
        hashtags("diningSocial", "#{{AppName}} #DinnerWithFriends #BillSplit #RestaurantLife #FoodieLife #BrunchSquad #SquadGoals"),
        hashtags("techApp", "#{{AppName}} #iOSApp #TechForGood #AppStore #MobileApp #ProductivityApp #TechTools"),
        hashtags("eventsWedding", "#{{AppName}} #BacheloretteParty #BachelorParty #WeddingSeason #EventPlanning #GroupEvents #PartyPlanning"),
        hashtags("meditationDaily", "#{{AppName}} #Meditation #DailyMeditation #MeditationPractice #Mindfulness #108Beads #SpiritualPractice #InnerPeace"),
        hashtags("appleWatchTech", "#{{AppName}} #AppleWatch #AppleWatchApp #WatchOS #HealthKit #AppleHealth #MindfulTech #WearableTech"),
        hashtags("morningRoutine", "#{{AppName}} #MorningRitual #MorningMeditation #MorningRoutine #5AMClub #MorningMotivation #HealthyHabits"),
        hashtags("spiritualTraditional", "#{{AppName}} #108Beads #SacredPractice #BuddhistMeditation #YogaPractice #SpiritualJourney #AncientWisdom"),
        hashtags("progressCommunity", "#{{AppName}} #MeditationStreak #MeditationJourney #MindfulLiving #InnerGrowth #DailyPractice #ConsistencyIsKey"),
        hashtags("productivityTools", "#{{AppName}} #Productivity #ProductivityHacks #WorkSmart #TimeManagement #DigitalTools #LifeHacks #Efficiency"),
        hashtags("healthWellness", "#{{AppName}} #Health #Wellness #SelfCare #MentalHealth #HealthyLifestyle #WellnessJourney #Mindfulness"),
    ]
}

fn productivity_mapping() -> CategoryMapping {
    mapping(
        DEFAULT_CATEGORY,
        &["professionals", "students", "entrepreneurs"],
        &["spreadsheetChaos", "morningRitualPeace", "noSignupPrivacy"],
        &["painPointHook", "transformationStory", "founderStory"],
        &["productivityTools", "techApp", "morningRoutine"],
        "Clean professional aesthetic",
        "Efficiency, clarity, relief",
        "1",
        "iPhone/iPad/Mac",
    )
}

fn category_mappings() -> Vec<CategoryMapping> {
    vec![
        mapping(
            "meditation",
            &["spiritual seekers", "wellness enthusiasts", "Apple Watch users"],
            &["mountainSunriseMeditation", "morningRitualPeace", "appleWatchCloseup", "streakCelebration"],
            &["morningRitualHook", "transformationStory", "tradition108", "founderStory"],
            &["meditationDaily", "appleWatchTech", "morningRoutine", "spiritualTraditional", "progressCommunity"],
            "National Geographic meets mindfulness content",
            "Peace, serenity, sacred practice",
            "1",
            "Apple Watch",
        ),
        mapping(
            "expense",
            &["travelers", "roommates", "social groups", "students"],
            &["heroGroupVacation", "restaurantBillConfusion", "spreadsheetChaos", "thatFriendCallout", "collegeRoadTrip"],
            &["painPointHook", "specificNumbers", "thatFriendCallout", "transformationStory"],
            &["travelFocus", "roommateFocus", "diningSocial", "techApp"],
            "Travel influencer content",
            "Fun, relatable, relief",
            "4-6",
            "iPhone",
        ),
        productivity_mapping(),
        mapping(
            "health",
            &["fitness enthusiasts", "Apple Watch users", "health-conscious"],
            &["appleWatchCloseup", "healthKitIntegration", "streakCelebration", "morningRitualPeace"],
            &["transformationStory", "morningRitualHook", "founderStory"],
            &["healthWellness", "appleWatchTech", "progressCommunity"],
            "Fitness lifestyle content",
            "Achievement, progress, vitality",
            "1",
            "Apple Watch",
        ),
        mapping(
            "social",
            &["young adults", "friend groups", "event organizers"],
            &["heroGroupVacation", "thatFriendCallout", "restaurantBillConfusion", "collegeRoadTrip"],
            &["thatFriendCallout", "painPointHook", "specificNumbers"],
            &["diningSocial", "eventsWedding", "travelFocus"],
            "Social media influencer style",
            "Fun, FOMO, celebration",
            "4-6",
            "iPhone",
        ),
    ]
}

const WEEKLY_MIX: [ContentSlot; 7] = [
    ContentSlot { post_type: "Pain Point", goal: "Relatable struggles" },
    ContentSlot { post_type: "Use Case", goal: "Specific scenarios" },
    ContentSlot { post_type: "Feature", goal: "How it works" },
    ContentSlot { post_type: "Social Proof", goal: "Testimonials" },
    ContentSlot { post_type: "Aspirational", goal: "Dream life" },
    ContentSlot { post_type: "Community", goal: "Milestones" },
    ContentSlot { post_type: "Rest", goal: "Optional content" },
];

const GUIDE_TEMPLATE: &str = r#"# {{appName}} Quick Reference Guide

## Campaign Snapshot

- **Category:** {{appCategory}}
- **Tone:** {{contentTone}}
- **Visual style:** {{visualStyle}}
- **Primary audience:** {{primaryAudience}}

## Posting Best Practices

1. Lead with a problem your audience already feels, then show {{appName}} solving it.
2. Keep the {{contentTone}} voice consistent on every platform.
3. Reply to every comment in the first hour after posting.
4. Re-run your best image a week later with a fresh caption.
5. Never post the same hashtag set two days in a row.

## Caption Templates

- **Pain point hook:** a moment your audience recognises, three frustrations, then {{appName}} as the better way.
- **Transformation:** before and after {{appName}}, with the time saved spelled out.
- **Founder story:** why you built {{appName}} and who it is for.

## Hashtag Cheat Sheet

- Mix broad, niche and branded tags in every post.
- Keep the branded tag first so it survives truncation.
- Rotate between the generated sets day by day.

## Visual Guidelines

- Keep every image in the **{{visualStyle}}** style.
- Show the app on screen in at least half of your posts.
- Favour natural light and real people over mock-ups.
"#;

static LIBRARY: Lazy<TemplateLibrary> = Lazy::new(|| {
    let mut templates = BTreeMap::new();
    for (kind, list) in [
        (TemplateKind::Image, image_prompts()),
        (TemplateKind::Caption, caption_templates()),
        (TemplateKind::Hashtag, hashtag_templates()),
    ] {
        templates.insert(kind, list.into_iter().map(|t| (t.name, t)).collect());
    }
    TemplateLibrary {
        version: "1.0",
        templates,
        mappings: category_mappings().into_iter().map(|m| (m.key, m)).collect(),
        default_mapping: productivity_mapping(),
        weekly_mix: WEEKLY_MIX,
        guide_template: GUIDE_TEMPLATE,
    }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finance_maps_to_expense_and_unknown_falls_back() {
        let lib = library();
        assert_eq!(lib.resolve_category(AppCategory::Finance), "expense");
        assert_eq!(lib.resolve_category(AppCategory::Meditation), "meditation");
        assert_eq!(lib.resolve_category(AppCategory::Travel), DEFAULT_CATEGORY);
        assert_eq!(lib.resolve_category(AppCategory::Other), DEFAULT_CATEGORY);
    }

    #[test]
    fn select_cycles_when_count_exceeds_list() {
        let lib = library();
        // productivity has three captions
        let picked = lib.select_templates("productivity", TemplateKind::Caption, 5);
        assert_eq!(
            picked,
            vec!["painPointHook", "transformationStory", "founderStory", "painPointHook", "transformationStory"]
        );
    }

    #[test]
    fn select_returns_prefix_when_count_is_smaller() {
        let lib = library();
        let picked = lib.select_templates("expense", TemplateKind::Image, 2);
        assert_eq!(picked, vec!["heroGroupVacation", "restaurantBillConfusion"]);
    }

    #[test]
    fn unknown_key_uses_default_mapping() {
        let lib = library();
        assert_eq!(lib.mapping("nope").key, DEFAULT_CATEGORY);
        assert_eq!(
            lib.select_templates("nope", TemplateKind::Hashtag, 1),
            vec!["productivityTools"]
        );
    }

    #[test]
    fn every_recommended_name_exists() {
        let lib = library();
        for m in lib.mappings.values() {
            for kind in [TemplateKind::Image, TemplateKind::Caption, TemplateKind::Hashtag] {
                for name in m.recommended(kind) {
                    assert!(lib.template(kind, name).is_some(), "{} missing {:?} {}", m.key, kind, name);
                }
            }
        }
    }

    #[test]
    fn weekly_mix_wraps() {
        let lib = library();
        assert_eq!(lib.content_slot(0).post_type, "Pain Point");
        assert_eq!(lib.content_slot(7).post_type, "Pain Point");
        assert_eq!(lib.content_slot(13).post_type, "Rest");
    }
}
