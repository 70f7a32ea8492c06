//! Outline markup: split raw outline text into typed slide records.
//!
//! The outline comes from an LLM (or a user editing one), so parsing is
//! best-effort and never fails. Unrecognised or malformed lines are skipped.
//!
//! ```text
//! [SLIDE]
//! [TITLE]Details
//! [CONTENT]
//! - point A
//! [IMAGE]a chart
//! [MINDMAP]Ownership|borrowing, lifetimes, moves
//! ```
//!
//! Tags are case-sensitive and must open the line (surrounding whitespace is
//! ignored). Everything before the first `[SLIDE]` marker is preamble and is
//! dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SLIDE_MARKER: &str = "[SLIDE]";
pub const TITLE_TAG: &str = "[TITLE]";
pub const SUBTITLE_TAG: &str = "[SUBTITLE]";
pub const CONTENT_TAG: &str = "[CONTENT]";
pub const IMAGE_TAG: &str = "[IMAGE]";
pub const MINDMAP_TAG: &str = "[MINDMAP]";
pub const BULLET_PREFIX: char = '-';

/// Older outlines write images inline as `[IMAGE:description]`.
const LEGACY_IMAGE_TAG: &str = "[IMAGE:";
const MINDMAP_FIELD_SEPARATOR: char = '|';

/// One slide as described by the outline.
///
/// Index 0 is the cover slide; every other index is a content slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideRecord {
    pub index: usize,
    /// Text of the first `[TITLE]` line, empty when the slide has none.
    pub title: String,
    /// On the cover this is the subtitle; on content slides every
    /// `[SUBTITLE]` line is accumulated here as body text, one per line.
    pub subtitle: Option<String>,
    /// Bullet and body lines in source order. Always empty on the cover.
    pub content: Vec<String>,
    pub images: Vec<ImageDescriptor>,
    pub mindmaps: Vec<MindmapDescriptor>,
}

impl SlideRecord {
    pub fn is_cover(&self) -> bool {
        self.index == 0
    }
}

/// Free-text description of an image the slide should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub description: String,
}

/// A mind-map request: a title plus reference text to seed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindmapDescriptor {
    pub title: String,
    pub reference: String,
}

/// Classification of one outline line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Title(&'a str),
    Subtitle(&'a str),
    ContentStart(&'a str),
    Bullet(&'a str),
    Image(&'a str),
    Mindmap(&'a str),
    Text(&'a str),
    Blank,
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if let Some(rest) = line.strip_prefix(TITLE_TAG) {
        Line::Title(rest.trim())
    } else if let Some(rest) = line.strip_prefix(SUBTITLE_TAG) {
        Line::Subtitle(rest.trim())
    } else if let Some(rest) = line.strip_prefix(CONTENT_TAG) {
        Line::ContentStart(rest.trim())
    } else if let Some(rest) = line.strip_prefix(IMAGE_TAG) {
        Line::Image(rest.trim())
    } else if let Some(rest) = line.strip_prefix(LEGACY_IMAGE_TAG) {
        let rest = rest.trim_end();
        Line::Image(rest.strip_suffix(']').unwrap_or(rest).trim())
    } else if let Some(rest) = line.strip_prefix(MINDMAP_TAG) {
        Line::Mindmap(rest)
    } else if line.starts_with(BULLET_PREFIX) {
        Line::Bullet(line)
    } else {
        Line::Text(line)
    }
}

/// Split `title|reference`. Lines without the separator yield nothing.
fn parse_mindmap(fields: &str) -> Option<MindmapDescriptor> {
    let (title, reference) = fields.split_once(MINDMAP_FIELD_SEPARATOR)?;
    Some(MindmapDescriptor {
        title: title.trim().to_string(),
        reference: reference.trim().to_string(),
    })
}

/// Parse one slide fragment (the text between two `[SLIDE]` markers).
pub fn parse_slide(index: usize, fragment: &str) -> SlideRecord {
    let mut record = SlideRecord {
        index,
        ..SlideRecord::default()
    };
    let cover = record.is_cover();
    let mut title_seen = false;
    let mut in_content = false;
    let mut skipped = 0usize;

    for raw in fragment.lines() {
        let mut line = classify(raw);
        // Text after `[CONTENT]` on the same line is classified like a line
        // of its own.
        while let Line::ContentStart(rest) = line {
            in_content = true;
            line = classify(rest);
        }
        match line {
            Line::Title(text) => {
                if !title_seen {
                    record.title = text.to_string();
                    title_seen = true;
                }
            }
            Line::Subtitle(text) => {
                if cover {
                    record.subtitle = Some(text.to_string());
                } else {
                    match record.subtitle {
                        Some(ref mut body) => {
                            body.push('\n');
                            body.push_str(text);
                        }
                        None => record.subtitle = Some(text.to_string()),
                    }
                }
            }
            Line::Bullet(text) => {
                if !cover {
                    record.content.push(text.to_string());
                }
            }
            Line::Text(text) => {
                if in_content && !cover {
                    record.content.push(text.to_string());
                } else {
                    skipped += 1;
                }
            }
            Line::Image(description) => record.images.push(ImageDescriptor {
                description: description.to_string(),
            }),
            Line::Mindmap(fields) => match parse_mindmap(fields) {
                Some(mindmap) => record.mindmaps.push(mindmap),
                None => skipped += 1,
            },
            Line::ContentStart(_) | Line::Blank => {}
        }
    }

    if skipped > 0 {
        debug!("Slide {}: skipped {} unrecognised line(s)", index, skipped);
    }
    record
}

/// Parse a whole outline into slide records.
///
/// Produces exactly one record per `[SLIDE]` marker, even for empty or
/// malformed fragments. An outline without markers yields no slides.
pub fn parse_outline(outline: &str) -> Vec<SlideRecord> {
    outline
        .split(SLIDE_MARKER)
        .skip(1)
        .enumerate()
        .map(|(index, fragment)| parse_slide(index, fragment))
        .collect()
}

/// Serialise records back into outline markup.
///
/// `parse_outline(&to_markup(&records))` reproduces `records`.
pub fn to_markup(records: &[SlideRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(SLIDE_MARKER);
        out.push('\n');
        if !record.title.is_empty() {
            push_line(&mut out, TITLE_TAG, &record.title);
        }
        if let Some(ref subtitle) = record.subtitle {
            if record.is_cover() {
                push_line(&mut out, SUBTITLE_TAG, subtitle);
            } else {
                for part in subtitle.split('\n') {
                    push_line(&mut out, SUBTITLE_TAG, part);
                }
            }
        }
        if !record.content.is_empty() {
            out.push_str(CONTENT_TAG);
            out.push('\n');
            for line in &record.content {
                out.push_str(line);
                out.push('\n');
            }
        }
        for image in &record.images {
            push_line(&mut out, IMAGE_TAG, &image.description);
        }
        for mindmap in &record.mindmaps {
            out.push_str(MINDMAP_TAG);
            out.push_str(&mindmap.title);
            out.push(MINDMAP_FIELD_SEPARATOR);
            out.push_str(&mindmap.reference);
            out.push('\n');
        }
    }
    out
}

fn push_line(out: &mut String, tag: &str, text: &str) {
    out.push_str(tag);
    out.push_str(text);
    out.push('\n');
}
