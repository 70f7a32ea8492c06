//! Post-processing: deterministic cleanup of LLM-generated outlines.
//!
//! Chat models follow the tag vocabulary most of the time, but they also wrap
//! the answer in ` ```markdown ` fences, decorate tags as Markdown headings
//! (`## [SLIDE]`), bold them (`**[TITLE]**`), or bullet with `*` and `•`
//! instead of `-`. The parser is strict about tags opening a line, so these
//! quirks would silently drop content. Each rule below is a pure `&str →
//! String` pass.
//!
//! Only generated outlines go through here. Outlines the user edited are
//! parsed exactly as written.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw completion.
///
/// Rules (applied in order):
/// 1. Strip outer Markdown fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Remove Markdown decoration in front of tags
/// 5. Normalise `*` / `•` bullets to `-`
/// 6. Trim trailing whitespace per line
/// 7. Ensure the text ends with exactly one newline
pub fn clean_outline(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = strip_tag_decoration(&s);
    let s = normalise_bullets(&s);
    let s = trim_trailing_whitespace(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md|text)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Remove Markdown decoration in front of tags ─────────────────────

static RE_DECORATED_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:#{1,6}[ \t]*|\*\*|__)(\[(?:SLIDE|TITLE|SUBTITLE|CONTENT|IMAGE|MINDMAP)[\]:])(?:\*\*|__)?",
    )
    .unwrap()
});

fn strip_tag_decoration(input: &str) -> String {
    RE_DECORATED_TAG.replace_all(input, "$1").to_string()
}

// ── Rule 5: Normalise bullet markers ─────────────────────────────────────────

static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^([ \t]*)[*•][ \t]+").unwrap());

fn normalise_bullets(input: &str) -> String {
    RE_BULLET.replace_all(input, "${1}- ").to_string()
}

// ── Rule 6: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 7: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
