use anyhow::Result;
use fs_err as fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::plan::display_date;
use crate::wire::CampaignRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub kind: ExportKind,
    pub path: PathBuf,
    pub bytes_before: Option<u64>,
    pub bytes_after: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub created: usize,
    pub updated: usize,
    pub bytes_written: u64,
    pub details: Vec<ExportedFile>,
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn guide_document(record: &CampaignRecord) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{} Quick Reference Guide</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(&record.app_name),
        record.quick_reference_guide
    )
}

pub fn captions_markdown(record: &CampaignRecord) -> String {
    let mut out = format!("# {} captions\n", record.app_name);
    for c in &record.captions {
        out.push_str(&format!("\n## {}\n\n{}\n", c.id, c.text));
    }
    out
}

pub fn plan_csv(record: &CampaignRecord) -> String {
    let mut out = String::from("day,date,post_type,caption_preview,image,best_time_to_post\n");
    for d in &record.campaign_plan {
        let row = [
            d.day.to_string(),
            display_date(d.date),
            csv_field(&d.post_type),
            csv_field(&d.caption_preview),
            csv_field(&d.image_preview_url),
            csv_field(&d.best_time_to_post),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn image_list(record: &CampaignRecord) -> String {
    record.images.iter().map(|i| format!("{}\n", i.url)).collect()
}

fn write_atomic(dir: &Path, name: &str, data: &str, sum: &mut ExportSummary) -> Result<()> {
    let abs = dir.join(name);
    let before = if abs.exists() { Some(abs.metadata()?.len()) } else { None };
    let after = data.len() as u64;

    let tmp = NamedTempFile::new_in(dir)?;
    fs::write(tmp.path(), data)?;
    tmp.persist(&abs)?;

    let kind = if before.is_none() { ExportKind::Created } else { ExportKind::Updated };
    match kind {
        ExportKind::Created => sum.created += 1,
        ExportKind::Updated => sum.updated += 1,
    }
    sum.bytes_written += after;
    sum.details.push(ExportedFile { kind, path: abs, bytes_before: before, bytes_after: after });
    Ok(())
}

/// Writes the campaign as a bundle of files under `dir`, each replaced
/// atomically.
pub fn export_campaign(record: &CampaignRecord, dir: &Path) -> Result<ExportSummary> {
    fs::create_dir_all(dir)?;
    let mut sum = ExportSummary::default();
    write_atomic(dir, "campaign.json", &serde_json::to_string_pretty(record)?, &mut sum)?;
    write_atomic(dir, "guide.html", &guide_document(record), &mut sum)?;
    write_atomic(dir, "captions.md", &captions_markdown(record), &mut sum)?;
    write_atomic(dir, "plan.csv", &plan_csv(record), &mut sum)?;
    write_atomic(dir, "images.txt", &image_list(record), &mut sum)?;
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::sample_record;

    #[test]
    fn writes_bundle_then_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("export");
        let record = sample_record("Ledger <Lite>");

        let first = export_campaign(&record, &out).unwrap();
        assert_eq!(first.created, 5);
        assert_eq!(first.updated, 0);
        for name in ["campaign.json", "guide.html", "captions.md", "plan.csv", "images.txt"] {
            assert!(out.join(name).is_file(), "{name} missing");
        }

        let second = export_campaign(&record, &out).unwrap();
        assert_eq!(second.updated, 5);
        assert_eq!(second.bytes_written, first.bytes_written);

        let json = std::fs::read_to_string(out.join("campaign.json")).unwrap();
        let back: CampaignRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn plan_csv_quotes_fields_with_commas() {
        let csv = plan_csv(&sample_record("A"));
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("day,date,post_type,caption_preview,image,best_time_to_post"));
        assert_eq!(
            lines.next(),
            Some("1,Jan 1,Pain Point: Relatable struggles,\"Stop juggling, start doing.\",https://img.test/1,9:00 AM")
        );
    }

    #[test]
    fn guide_title_is_escaped() {
        let doc = guide_document(&sample_record("Ledger <Lite>"));
        assert!(doc.contains("<title>Ledger &lt;Lite&gt; Quick Reference Guide</title>"));
        assert!(doc.contains("<h1>Guide</h1>"));
    }
}
