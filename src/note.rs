use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};

use crate::error::{Error, Result};
use crate::hashtag;

/// Seconds between the Unix epoch and Core Data's reference date (2001-01-01).
pub const CORE_DATA_EPOCH_OFFSET: i64 = 978_307_200;

/// A note as read from the Bear database.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub pk: i64,
    pub unique_id: String,
    pub title: String,
    pub raw_body: Vec<u8>,
    /// Seconds since 2001-01-01.
    pub creation_timestamp: f64,
}

/// The parts of the configuration the transformer needs.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub note_tag: String,
    /// Index of the line carrying hashtags. Negative counts from the end.
    pub tag_line: i64,
    pub omit_non_note_tag_prefix: bool,
    pub categories: bool,
    pub tags: bool,
    pub time_format: String,
}

/// A note ready to be rendered into a page bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedNote {
    pub pk: i64,
    pub title: String,
    pub slug: String,
    pub date: String,
    pub hashtags: Vec<String>,
    pub draft: bool,
    pub categories: bool,
    pub tags: bool,
    pub body: String,
}

/// Check that `format` is a strftime pattern chrono can render.
pub fn validate_time_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidTimeFormat(format.to_string()));
    }
    Ok(())
}

/// Format a Core Data timestamp in the local timezone.
///
/// Fractional seconds are truncated. Timestamps chrono can't represent fall
/// back to the Unix epoch. `format` must have passed [`validate_time_format`].
pub fn format_date(creation_timestamp: f64, format: &str) -> String {
    let secs = (creation_timestamp as i64).saturating_add(CORE_DATA_EPOCH_OFFSET);
    let utc = DateTime::from_timestamp(secs, 0).unwrap_or_default();
    utc.with_timezone(&Local).format(format).to_string()
}

/// Directory name for a page bundle: lowercased title, spaces as hyphens.
pub fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

/// Resolve the configured tag line against `lines`.
///
/// Negative indexes count from the end, after trailing empty lines have been
/// dropped from `lines`. Returns `None` when the index falls outside the note.
fn resolve_tag_line(lines: &mut Vec<&str>, tag_line: i64) -> Option<usize> {
    let index = if tag_line < 0 {
        while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines.len() as i64 + tag_line
    } else {
        tag_line
    };

    if index < 0 || index >= lines.len() as i64 {
        return None;
    }
    Some(index as usize)
}

/// Turn a database note into page content.
///
/// Returns `None` when the note has an empty title, or when the configured
/// tag line doesn't exist in this note.
pub fn transform(note: &Note, options: &TransformOptions) -> Option<TransformedNote> {
    let slug = slugify(&note.title);
    if slug.is_empty() {
        // The page would land on the section's own index.md.
        log::debug!("Note {} has an empty title, skipping", note.pk);
        return None;
    }

    let raw = String::from_utf8_lossy(&note.raw_body).replace(['“', '”'], "\"");

    let date = format_date(note.creation_timestamp, &options.time_format);

    let mut lines: Vec<&str> = raw.split('\n').collect();
    let Some(tag_line) = resolve_tag_line(&mut lines, options.tag_line) else {
        log::debug!(
            "Tag line {} is outside of {:?}, skipping",
            options.tag_line,
            note.title
        );
        return None;
    };

    let hashtags = hashtag::scan(
        lines[tag_line],
        &options.note_tag,
        options.omit_non_note_tag_prefix,
    );
    let draft = hashtag::is_draft(&hashtags);

    lines.remove(tag_line);

    // The first line is the title.
    let body = lines.iter().skip(1).copied().collect::<Vec<_>>().join("\n");

    Some(TransformedNote {
        pk: note.pk,
        title: note.title.clone(),
        slug,
        date,
        hashtags,
        draft,
        categories: options.categories,
        tags: options.tags,
        body,
    })
}
