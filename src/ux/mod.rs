use colored::Colorize;
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

use crate::app::Notice;
use crate::auth::User;
use crate::export::{ExportKind, ExportSummary};
use crate::library::{TemplateKind, TemplateLibrary};
use crate::plan::display_date;
use crate::wire::{
    AppCategory, Audience, CampaignLength, CampaignParameters, CampaignRecord, ContentTone,
    TargetPlatform, VisualStyle,
};
use crate::wizard::{Field, Wizard, WizardStep};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Dashboard tabs of the Results view, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsTab {
    Images,
    Captions,
    Hashtags,
    Plan,
    Guide,
    Prompts,
}

impl ResultsTab {
    pub const ALL: [ResultsTab; 6] = [
        ResultsTab::Images,
        ResultsTab::Captions,
        ResultsTab::Hashtags,
        ResultsTab::Plan,
        ResultsTab::Guide,
        ResultsTab::Prompts,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ResultsTab::Images => "Images",
            ResultsTab::Captions => "Captions",
            ResultsTab::Hashtags => "Hashtags",
            ResultsTab::Plan => "Campaign Plan",
            ResultsTab::Guide => "Quick Reference Guide",
            ResultsTab::Prompts => "Prompt Library",
        }
    }
}

/// One line from stdin, trimmed. `None` on EOF or read error.
pub fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim().to_string()),
    }
}

pub fn confirm(prompt: &str) -> bool {
    read_line(&format!("{prompt} [y/N]: "))
        .map(|a| {
            let a = a.to_lowercase();
            a == "y" || a == "yes"
        })
        .unwrap_or(false)
}

/// Parses "1,3 5" or "2-4" into zero-based indices below `max`, in input
/// order and without duplicates.
pub fn parse_selection(input: &str, max: usize) -> Result<Vec<usize>, String> {
    let mut out = Vec::new();
    for part in input.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty()) {
        let (lo, hi) = match part.split_once('-') {
            Some((a, b)) => (parse_index(a, max)?, parse_index(b, max)?),
            None => {
                let i = parse_index(part, max)?;
                (i, i)
            }
        };
        if lo > hi {
            return Err(format!("range '{part}' is backwards"));
        }
        for i in lo..=hi {
            if !out.contains(&i) {
                out.push(i);
            }
        }
    }
    Ok(out)
}

fn parse_index(s: &str, max: usize) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n - 1),
        _ => Err(format!("'{}' is not a number between 1 and {max}", s.trim())),
    }
}

/// Terminal rendering of the guide HTML.
pub fn html_to_text(html: &str) -> String {
    let text = TAG.replace_all(html, "");
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let mut out = String::new();
    let mut blank = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            if !blank && !out.is_empty() {
                out.push('\n');
            }
            blank = true;
        } else {
            out.push_str(line);
            out.push('\n');
            blank = false;
        }
    }
    out
}

/// Long `data:` URLs are shortened for display.
pub fn short_ref(url: &str) -> String {
    if url.starts_with("data:") && url.len() > 48 {
        let kind = url.split(';').next().unwrap_or("data:");
        format!("{kind};base64,… ({})", format_size(url.len(), DECIMAL))
    } else {
        url.to_string()
    }
}

fn header(title: &str) {
    println!("\n{}", format!("┏━━━━━━━━━━━━━━━━━ {title} ━━━━━━━━━━━━━━━━━┓").bold());
}

fn footer() {
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());
}

fn indent(s: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    s.lines().map(|l| format!("{pad}{l}")).collect::<Vec<_>>().join("\n")
}

pub fn show_notice(notice: &Notice) {
    match notice {
        Notice::Info(m) => println!("{} {}", "✔".green().bold(), m),
        Notice::Error(m) => println!("{} {}", "✖".red().bold(), m.red()),
    }
}

pub fn show_error(message: &str) {
    println!("{} {}", "✖".red().bold(), message.red());
}

pub fn show_landing(user: Option<&User>) {
    header("IndieMark");
    println!("  {}", "Marketing campaigns for indie apps, in four steps.".italic());
    println!("  Images, captions, hashtags, a day-by-day plan and a quick reference guide.");
    match user {
        Some(u) => println!("  Signed in as {} <{}>", u.display_name.bold(), u.email),
        None => println!("  {}", "Not signed in (sign in to keep a campaign history)".dimmed()),
    }
    footer();
    println!("  [n] New campaign   [h] History   [s] Sign {}   [q] Quit", if user.is_some() { "out" } else { "in" });
}

pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn field_line(wizard: &Wizard, field: Field, label: &str, value: String) {
    println!("  {:<20} {}", format!("{label}:").bold(), value);
    if let Some(err) = wizard.error(field) {
        println!("  {:<20} {}", "", err.red());
    }
}

fn plain_line(label: &str, value: impl Display) {
    println!("  {:<20} {}", format!("{label}:").bold(), value);
}

fn or_dash(s: &str) -> String {
    if s.trim().is_empty() {
        "—".dimmed().to_string()
    } else {
        s.to_string()
    }
}

pub fn show_wizard_step(wizard: &Wizard) {
    let step = wizard.step();
    let bar: String = WizardStep::ALL
        .iter()
        .map(|s| if *s <= step { "■".green().to_string() } else { "□".dimmed().to_string() })
        .collect::<Vec<_>>()
        .join(" ");
    header(&format!("Step {} of 4: {}", step.number(), step.title()));
    println!("  {bar}\n");
    let d = wizard.draft();
    match step {
        WizardStep::AppBasics => {
            field_line(wizard, Field::AppName, "App name", or_dash(&d.app_name));
            plain_line("Category", d.app_category);
            field_line(wizard, Field::KeyFeatures, "Key features", format!("\n{}", indent(&d.key_features, 4)));
            plain_line("Store link", or_dash(d.app_store_link.as_deref().unwrap_or("")));
        }
        WizardStep::AudiencePositioning => {
            field_line(wizard, Field::PrimaryAudience, "Primary audience", or_dash(&d.audience_labels()));
            field_line(wizard, Field::Uniqueness, "What makes it unique", or_dash(&d.uniqueness));
            plain_line("Competitors", or_dash(d.competitors.as_deref().unwrap_or("")));
        }
        WizardStep::ContentPreferences => {
            plain_line("Content tone", d.content_tone);
            plain_line("Visual style", d.visual_style);
            field_line(wizard, Field::TargetPlatforms, "Target platforms", or_dash(&d.platform_labels()));
            plain_line("Campaign length", format!("{} days", d.campaign_length.days()));
        }
        WizardStep::ReviewGenerate => show_review(d),
    }
    footer();
}

pub fn show_review(d: &CampaignParameters) {
    println!("  {}", "[1] App Basics".cyan().bold());
    plain_line("App name", &d.app_name);
    plain_line("Category", d.app_category);
    println!("{}", indent(&d.key_features, 4));
    println!("  {}", "[2] Audience & Positioning".cyan().bold());
    plain_line("Primary audience", d.audience_labels());
    plain_line("Uniqueness", &d.uniqueness);
    println!("  {}", "[3] Content Preferences".cyan().bold());
    plain_line("Tone / style", format!("{} / {}", d.content_tone, d.visual_style));
    plain_line("Platforms", d.platform_labels());
    plain_line("Length", format!("{} days", d.campaign_length.days()));
}

fn ask(label: &str, current: &str) -> String {
    let shown = if current.is_empty() { String::new() } else { format!(" [{current}]") };
    match read_line(&format!("  {label}{shown}: ")) {
        Some(v) if !v.is_empty() => v,
        _ => current.to_string(),
    }
}

fn ask_optional(label: &str, current: Option<&str>) -> Option<String> {
    let v = ask(&format!("{label} ('-' to clear)"), current.unwrap_or(""));
    if v == "-" || v.trim().is_empty() {
        None
    } else {
        Some(v)
    }
}

fn ask_lines(label: &str, current: &str) -> String {
    println!("  {label} (one per line, empty line to finish; empty first line keeps current)");
    let mut lines = Vec::new();
    while let Some(l) = read_line("    > ") {
        if l.is_empty() {
            break;
        }
        lines.push(l);
    }
    if lines.is_empty() {
        current.to_string()
    } else {
        lines.join("\n")
    }
}

/// Picks one option by list number or, when `by_label` knows it, by name.
fn choose<T: Copy + Display + PartialEq>(
    label: &str,
    options: &[T],
    current: T,
    by_label: impl Fn(&str) -> Option<T>,
) -> T {
    let listing: Vec<String> = options
        .iter()
        .enumerate()
        .map(|(i, o)| if *o == current { format!("{}) {}", i + 1, o.to_string().bold()) } else { format!("{}) {o}", i + 1) })
        .collect();
    println!("  {label}: {}", listing.join("  "));
    match read_line(&format!("  {label} [{current}]: ")) {
        Some(v) if !v.is_empty() => match by_label(&v) {
            Some(picked) => picked,
            None => choose_by_number(&v, options, current),
        },
        _ => current,
    }
}

fn choose_by_number<T: Copy>(input: &str, options: &[T], current: T) -> T {
    match parse_selection(input, options.len()) {
        Ok(sel) if sel.len() == 1 => options[sel[0]],
        _ => {
            show_error("pick one number from the list; keeping current value");
            current
        }
    }
}

/// Indices of `options` to toggle, given as numbers or a single name.
fn choose_toggles<T: Display + PartialEq>(
    label: &str,
    options: &[T],
    selected: &[T],
    by_label: impl Fn(&str) -> Option<T>,
) -> Vec<usize> {
    let listing: Vec<String> = options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}) [{}] {o}", i + 1, if selected.contains(o) { "x" } else { " " }))
        .collect();
    println!("  {label}: {}", listing.join("  "));
    match read_line(&format!("  Toggle {label} (e.g. 1,3): ")) {
        Some(v) if !v.is_empty() => match by_label(&v).and_then(|t| options.iter().position(|o| *o == t)) {
            Some(i) => vec![i],
            None => parse_selection(&v, options.len()).unwrap_or_else(|e| {
                show_error(&e);
                Vec::new()
            }),
        },
        _ => Vec::new(),
    }
}

/// Prompts for every field of the current step. Blank input keeps a value.
pub fn edit_step(wizard: &mut Wizard) {
    let d = wizard.draft().clone();
    match wizard.step() {
        WizardStep::AppBasics => {
            let name = ask("App name", &d.app_name);
            let category = choose("Category", AppCategory::ALL, d.app_category, AppCategory::from_label);
            let features = ask_lines("Key features", &d.key_features);
            let link = ask_optional("App Store link", d.app_store_link.as_deref());
            wizard.edit(|p| {
                p.app_name = name;
                p.app_category = category;
                p.key_features = features;
                p.app_store_link = link;
            });
        }
        WizardStep::AudiencePositioning => {
            for i in choose_toggles("audience", Audience::ALL, &d.primary_audience, Audience::from_label) {
                wizard.toggle_audience(Audience::ALL[i]);
            }
            let uniqueness = ask("What makes it unique", &d.uniqueness);
            let competitors = ask_optional("Competitors", d.competitors.as_deref());
            wizard.edit(|p| {
                p.uniqueness = uniqueness;
                p.competitors = competitors;
            });
        }
        WizardStep::ContentPreferences => {
            let tone = choose("Content tone", ContentTone::ALL, d.content_tone, ContentTone::from_label);
            let style = choose("Visual style", VisualStyle::ALL, d.visual_style, VisualStyle::from_label);
            for i in choose_toggles("platforms", TargetPlatform::ALL, &d.target_platforms, TargetPlatform::from_label) {
                wizard.toggle_platform(TargetPlatform::ALL[i]);
            }
            let lengths: Vec<String> = CampaignLength::ALL.iter().map(|l| format!("{} days", l.days())).collect();
            let current = format!("{} days", d.campaign_length.days());
            let picked = choose("Campaign length", &lengths.iter().map(String::as_str).collect::<Vec<_>>(), current.as_str(), |_| None);
            let length = CampaignLength::ALL
                .iter()
                .zip(&lengths)
                .find(|(_, label)| label.as_str() == picked)
                .map(|(l, _)| *l)
                .unwrap_or(d.campaign_length);
            wizard.edit(|p| {
                p.content_tone = tone;
                p.visual_style = style;
                p.campaign_length = length;
            });
        }
        WizardStep::ReviewGenerate => {}
    }
}

pub fn show_results(record: &CampaignRecord, tab: ResultsTab, signed_in: bool) {
    header(&format!("{} campaign", record.app_name));
    let tabs: Vec<String> = ResultsTab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let label = format!("{}) {}", i + 1, t.title());
            if *t == tab { label.reversed().to_string() } else { label }
        })
        .collect();
    println!("  {}\n", tabs.join("  "));
    print_tab(record, tab);
    footer();
    let saved = match (&record.id, &record.saved_at) {
        (Some(_), Some(at)) => format!("Saved {}", at.format("%Y-%m-%d %H:%M")),
        _ if signed_in => "[s] Save".to_string(),
        _ => "[s] Sign in & save".to_string(),
    };
    println!("  [1-6] Tab   {saved}   [x] Export   [a] Generate another   [h] History   [m] Home");
}

pub fn print_tab(record: &CampaignRecord, tab: ResultsTab) {
    match tab {
        ResultsTab::Images => {
            for img in &record.images {
                println!("  {} {}", img.id.bold(), short_ref(&img.url).cyan());
                println!("{}", indent(&img.prompt, 6).dimmed());
            }
            if record.images.is_empty() {
                println!("  (no images)");
            }
        }
        ResultsTab::Captions => {
            for c in &record.captions {
                println!("  {}\n{}\n", c.id.bold(), indent(&c.text, 4));
            }
        }
        ResultsTab::Hashtags => {
            for s in &record.hashtag_sets {
                println!("  {}: {}", s.use_case.bold(), s.hashtags.join(" ").blue());
            }
        }
        ResultsTab::Plan => {
            for d in &record.campaign_plan {
                println!(
                    "  Day {:>2}  {:<7} {:<8} {}",
                    d.day,
                    display_date(d.date),
                    d.best_time_to_post,
                    d.post_type.bold()
                );
                println!("           {}", d.caption_preview.dimmed());
            }
        }
        ResultsTab::Guide => println!("{}", indent(&html_to_text(&record.quick_reference_guide), 2)),
        ResultsTab::Prompts => {
            let p = &record.prompt_library;
            println!("  {}", "Image prompts".bold());
            for (i, ip) in p.generated_image_prompts.iter().enumerate() {
                println!("  {}. {}", i + 1, ip);
            }
            println!("  {}", "Caption templates".bold());
            for t in &p.caption_templates {
                println!("{}\n", indent(t, 4));
            }
            println!("  {}", "Hashtag templates".bold());
            for t in &p.hashtag_templates {
                println!("    {t}");
            }
            println!("  {}", "Text generation prompt".bold());
            println!("{}", indent(&p.text_generation_prompt_summary, 4).dimmed());
        }
    }
}

/// Every tab, one after another, for non-interactive runs.
pub fn print_dashboard(record: &CampaignRecord) {
    header(&format!("{} campaign", record.app_name));
    println!(
        "  {}: {}   {}: {}   {}: {}   {}: {}",
        "Images".green().bold(),
        record.images.len(),
        "Captions".yellow().bold(),
        record.captions.len(),
        "Hashtag sets".cyan().bold(),
        record.hashtag_sets.len(),
        "Days".magenta().bold(),
        record.campaign_plan.len()
    );
    footer();
    for tab in ResultsTab::ALL {
        println!("\n{}", tab.title().underline());
        print_tab(record, tab);
    }
}

pub fn show_history(records: &[CampaignRecord]) {
    header("Campaign History");
    if records.is_empty() {
        println!("  (no saved campaigns yet)");
    }
    for (i, r) in records.iter().enumerate() {
        let when = r.saved_at.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default();
        println!(
            "  {:>2}. {:<28} {}  {} images, {} days",
            i + 1,
            r.app_name.bold(),
            when.dimmed(),
            r.images.len(),
            r.campaign_plan.len()
        );
    }
    footer();
    println!("  [o N] Open   [d N] Delete   [m] Home");
}

pub fn print_export_dashboard(sum: &ExportSummary) {
    header("Export");
    println!(
        "  {}: {}   {}: {}   {}: {}",
        "Created".green().bold(),
        sum.created,
        "Updated".yellow().bold(),
        sum.updated,
        "Size".bold(),
        format_size(sum.bytes_written, DECIMAL)
    );
    footer();
    for f in &sum.details {
        let sizes = match f.bytes_before {
            Some(b) => format!("{} -> {}", format_size(b, DECIMAL), format_size(f.bytes_after, DECIMAL)),
            None => format_size(f.bytes_after, DECIMAL),
        };
        let kind = match f.kind {
            ExportKind::Created => "created".green(),
            ExportKind::Updated => "updated".yellow(),
        };
        println!("  {kind:<8} {}  {}", f.path.display(), sizes.dimmed());
    }
}

pub fn print_library(lib: &TemplateLibrary) {
    header(&format!("Template Library v{}", lib.version));
    for (kind, title) in [
        (TemplateKind::Image, "Image prompts"),
        (TemplateKind::Caption, "Caption templates"),
        (TemplateKind::Hashtag, "Hashtag sets"),
    ] {
        println!("\n  {}", title.underline());
        for t in lib.templates(kind) {
            println!(
                "  {:<28} {:<16} {:>5.1}%  {}",
                t.name.bold(),
                t.group,
                t.engagement_rate * 100.0,
                t.best_for.join(", ").dimmed()
            );
        }
    }
    println!("\n  {}", "Category mappings".underline());
    for m in lib.mappings() {
        println!("  {}", m.key.cyan().bold());
        plain_line("Audience", m.primary_audience.join(", "));
        plain_line("Visual style", m.visual_style);
        plain_line("Mood", m.mood);
        plain_line("Device / people", format!("{} / {}", m.device_type, m.people_count));
    }
    footer();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_choice_falls_back_to_current() {
        let options = [AppCategory::Health, AppCategory::Social];
        assert_eq!(choose_by_number("2", &options, AppCategory::Health), AppCategory::Social);
        assert_eq!(choose_by_number("7", &options, AppCategory::Health), AppCategory::Health);
        assert_eq!(choose_by_number("1,2", &options, AppCategory::Social), AppCategory::Social);
    }

    #[test]
    fn selection_accepts_lists_and_ranges() {
        assert_eq!(parse_selection("1, 3 5", 5), Ok(vec![0, 2, 4]));
        assert_eq!(parse_selection("2-4,3", 5), Ok(vec![1, 2, 3]));
        assert_eq!(parse_selection("", 5), Ok(vec![]));
        assert!(parse_selection("0", 5).is_err());
        assert!(parse_selection("6", 5).is_err());
        assert!(parse_selection("4-2", 5).is_err());
        assert!(parse_selection("x", 5).is_err());
    }

    #[test]
    fn html_is_flattened_for_the_terminal() {
        let text = html_to_text("<h1>Tips &amp; Tricks</h1>\n\n\n<p>Post at 9 &lt;AM&gt;</p>\n");
        assert_eq!(text, "Tips & Tricks\n\nPost at 9 <AM>\n");
    }

    #[test]
    fn data_urls_are_shortened() {
        let url = format!("data:image/png;base64,{}", "A".repeat(100));
        assert_eq!(short_ref(&url), "data:image/png;base64,… (122 B)");
        assert_eq!(short_ref("https://x/y.png"), "https://x/y.png");
    }
}
