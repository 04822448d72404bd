use chrono::{Days, NaiveDate};

use crate::library::TemplateLibrary;
use crate::wire::{CampaignDay, Caption, GeneratedImage};

/// Recommended posting times, alternating by day parity.
pub const POST_TIMES: [&str; 2] = ["9:00 AM", "6:00 PM"];
pub const PREVIEW_CHARS: usize = 70;

/// First `PREVIEW_CHARS` characters of `text` on one line, with an ellipsis
/// when something was cut.
pub fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

pub fn placeholder_image(index: usize) -> String {
    format!("https://picsum.photos/seed/placeholder{index}/200/200")
}

pub fn display_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

pub fn post_time(index: usize) -> &'static str {
    POST_TIMES[index % POST_TIMES.len()]
}

/// Day `i` (0-based) of a plan starting `today`.
pub fn day_date(today: NaiveDate, index: usize) -> NaiveDate {
    today
        .checked_add_days(Days::new(index as u64))
        .unwrap_or(NaiveDate::MAX)
}

/// Template-driven plan: one entry per day, cycling the weekly content mix,
/// captions and images by index.
pub fn build(
    library: &TemplateLibrary,
    days: usize,
    captions: &[Caption],
    images: &[GeneratedImage],
    today: NaiveDate,
) -> Vec<CampaignDay> {
    (0..days)
        .map(|i| CampaignDay {
            day: (i + 1) as u32,
            date: day_date(today, i),
            post_type: library.content_slot(i).label(),
            caption_preview: captions
                .get(i % captions.len().max(1))
                .map(|c| preview(&c.text))
                .unwrap_or_default(),
            image_preview_url: images
                .get(i % images.len().max(1))
                .map(|img| img.url.clone())
                .unwrap_or_else(|| placeholder_image(i)),
            best_time_to_post: post_time(i).to_string(),
        })
        .collect()
}
