//! Prompts for outline and mind-map generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the tag vocabulary the parser understands
//!    and the vocabulary the model is told to use live next to each other.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live model, so a prompt that stops mentioning a tag is caught early.
//!
//! Callers can override the outline system prompt via
//! [`crate::config::GenerationConfig::system_prompt`].

use crate::pipeline::mindmap::{MINDMAP_END, MINDMAP_START};

/// Default system prompt asking for a tagged slide outline.
pub const DEFAULT_OUTLINE_PROMPT: &str = r#"You are a professional presentation designer. Write the complete content of a slide deck for the topic the user gives you.

Requirements:
- Slide 1 is the cover: a main title and a subtitle.
- Slide 2 is a table of contents.
- Then at least 5 content slides, each with a title and detailed bullet points.
- Suggest pictures where they help, describing what the picture should show.
- Where a topic has a natural hierarchy, you may request a mind-map (at most 2 per deck).

Output format (plain text, one tag per line, tags exactly as written):
[SLIDE]                     starts a new slide
[TITLE]<slide title>
[SUBTITLE]<subtitle; on content slides a short lead sentence>
[CONTENT]                   starts the bullet list
- <bullet point>
[IMAGE]<description of a suggested picture>
[MINDMAP]<mind-map title>|<key points the mind-map should cover>

Do NOT use Markdown headings, bold markers or code fences. Do NOT add commentary before the first [SLIDE] or after the last slide."#;

/// Build the user turn for outline generation.
pub fn outline_user_prompt(topic: &str) -> String {
    format!("Create the slide deck for the topic \"{}\".", topic.trim())
}

/// Append reference material to the system prompt.
///
/// Empty or whitespace-only references leave the prompt unchanged.
pub fn with_reference(system_prompt: &str, reference: Option<&str>) -> String {
    match reference.map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) => format!("{system_prompt}\n\nReference material: {r}"),
        None => system_prompt.to_string(),
    }
}

/// System prompt for mind-map markup generation.
pub const MINDMAP_SYSTEM_PROMPT: &str =
    "You write PlantUML mind-maps. Answer with the mind-map block only.";

/// Build the instruction asking for a delimited mind-map block.
pub fn mindmap_instruction(title: &str, reference: &str) -> String {
    format!(
        "Create a hierarchical mind-map about \"{title}\" in PlantUML mindmap syntax.\n\
         Use line prefixes for depth: `*` for the root, `**` for main branches, `***` for details.\n\
         Start the block with the line {MINDMAP_START} and end it with the line {MINDMAP_END}.\n\
         Base the branches on this material: {reference}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_prompt_names_every_tag() {
        for tag in ["[SLIDE]", "[TITLE]", "[SUBTITLE]", "[CONTENT]", "[IMAGE]", "[MINDMAP]"] {
            assert!(DEFAULT_OUTLINE_PROMPT.contains(tag), "missing {tag}");
        }
    }

    #[test]
    fn reference_appended_only_when_present() {
        assert_eq!(with_reference("base", None), "base");
        assert_eq!(with_reference("base", Some("   ")), "base");
        let p = with_reference("base", Some("chapter 3"));
        assert!(p.starts_with("base"));
        assert!(p.ends_with("Reference material: chapter 3"));
    }

    #[test]
    fn mindmap_instruction_mentions_sentinels() {
        let p = mindmap_instruction("Ownership", "moves, borrows");
        assert!(p.contains("@startmindmap"));
        assert!(p.contains("@endmindmap"));
        assert!(p.contains("Ownership"));
        assert!(p.contains("moves, borrows"));
    }
}
