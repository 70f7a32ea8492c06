//! Slide rendering: parsed records + resolved mind-maps → [`Deck`].
//!
//! ## Layout policy
//!
//! * Record 0 uses the cover layout: centre title (44pt bold) and subtitle
//!   (32pt muted). Nothing else is drawn on the cover.
//! * Every other record uses the content layout: a title, a wrapped body
//!   text box (subtitle lines, then content lines, one paragraph each) and a
//!   column of image placeholder boxes on the right.
//! * Each `[MINDMAP]` occurrence gets its own blank slide right after the
//!   slide that declared it, holding either the fetched image or a failure
//!   box.
//!
//! All non-cover text is 18pt black in the configured typeface. Styles are
//! applied per shape once its text is in place.
//!
//! Rendering is pure: every image was fetched during resolution.

use crate::config::GenerationConfig;
use crate::output::MindmapBinding;
use crate::pipeline::markup::SlideRecord;
use crate::pptx::{inches, Align, Deck, Frame, Layout, PlaceholderKind, Slide, TextStyle};
use tracing::debug;

const MARGIN_IN: f64 = 0.5;
const BODY_TOP_IN: f64 = 1.5;
const IMAGE_BOX_WIDTH_IN: f64 = 4.5;
const IMAGE_BOX_HEIGHT_IN: f64 = 2.5;
const IMAGE_BOX_GAP_IN: f64 = 0.3;
const COLUMN_GAP_IN: f64 = 0.4;

const PLACEHOLDER_FILL: &str = "F0F0F0";
const PLACEHOLDER_LINE: &str = "C8C8C8";
const TEXT_COLOR: &str = "000000";
const COVER_TITLE_COLOR: &str = "1F2937";
const COVER_SUBTITLE_COLOR: &str = "6B7280";

pub const MINDMAP_FAILED_TEXT: &str = "mind-map generation failed";

/// Render the whole deck.
pub fn render_deck(
    records: &[SlideRecord],
    bindings: &[MindmapBinding],
    config: &GenerationConfig,
) -> Deck {
    let mut deck = Deck::new(config.slide_width, config.slide_height, &config.font_family);
    if let Some(cover) = records.first() {
        deck.set_title(&cover.title);
    }

    for record in records {
        render_slide(&mut deck, record, config);
        for (position, descriptor) in record.mindmaps.iter().enumerate() {
            let binding = bindings
                .iter()
                .find(|b| b.slide_index == record.index && b.position == position);
            render_mindmap_slide(&mut deck, &descriptor.title, binding, config);
        }
    }

    debug!(
        "Rendered {} record(s) into {} slide(s)",
        records.len(),
        deck.slide_count()
    );
    deck
}

/// Render one record on the cover or content layout.
pub fn render_slide(deck: &mut Deck, record: &SlideRecord, config: &GenerationConfig) {
    let (width, height) = (deck.width(), deck.height());
    if record.is_cover() {
        render_cover(deck.add_slide(Layout::Cover), record, width, height, config);
    } else {
        render_content(deck.add_slide(Layout::Content), record, width, config);
    }
}

fn render_cover(slide: &mut Slide, record: &SlideRecord, width: i64, height: i64, config: &GenerationConfig) {
    let box_width = width - 2 * inches(1.0);
    if let Some(title) = slide.placeholder_mut(PlaceholderKind::CenterTitle) {
        title.set_text(&record.title);
        title.frame = Some(Frame::new(inches(1.0), height * 23 / 75, box_width, inches(1.5)));
        title.anchor_center = true;
        title.style = Some(TextStyle {
            size_pt: 44.0,
            bold: true,
            color: COVER_TITLE_COLOR.to_string(),
            font: config.font_family.clone(),
            align: Align::Center,
        });
    }
    if let Some(subtitle) = slide.placeholder_mut(PlaceholderKind::Subtitle) {
        subtitle.set_text(record.subtitle.as_deref().unwrap_or_default());
        subtitle.frame = Some(Frame::new(inches(1.0), height * 40 / 75, box_width, inches(1.2)));
        subtitle.style = Some(TextStyle {
            size_pt: 32.0,
            bold: false,
            color: COVER_SUBTITLE_COLOR.to_string(),
            font: config.font_family.clone(),
            align: Align::Center,
        });
    }
    slide.remove_empty_placeholders();
}

fn render_content(slide: &mut Slide, record: &SlideRecord, width: i64, config: &GenerationConfig) {
    let margin = inches(MARGIN_IN);
    let full_width = width - 2 * margin;

    // The body goes into our own text box; the layout's body placeholder
    // would otherwise show its prompt text.
    slide.remove_placeholder(PlaceholderKind::Body);

    if let Some(title) = slide.placeholder_mut(PlaceholderKind::Title) {
        title.set_text(&record.title);
        title.frame = Some(Frame::new(margin, inches(0.4), full_width, inches(0.9)));
        title.style = Some(body_style(config));
    }

    let body: Vec<String> = record
        .subtitle
        .iter()
        .flat_map(|s| s.lines())
        .chain(record.content.iter().map(String::as_str))
        .map(str::to_string)
        .collect();

    let image_left = width - margin - inches(IMAGE_BOX_WIDTH_IN);
    if !body.is_empty() {
        let body_width = if record.images.is_empty() {
            full_width
        } else {
            image_left - inches(COLUMN_GAP_IN) - margin
        };
        let frame = Frame::new(margin, inches(BODY_TOP_IN), body_width, inches(5.5));
        let shape = slide.add_text_box(frame);
        shape.paragraphs = body;
        shape.style = Some(body_style(config));
    }

    let mut top = inches(BODY_TOP_IN);
    for image in &record.images {
        let text = format!("[image: {}]", image.description);
        let frame = add_placeholder_box(slide, image_left, top, &text, config);
        top = frame.bottom() + inches(IMAGE_BOX_GAP_IN);
    }

    slide.remove_empty_placeholders();
}

/// Draw a bordered grey box with centred text. Returns its frame.
pub fn add_placeholder_box(
    slide: &mut Slide,
    x: i64,
    y: i64,
    text: &str,
    config: &GenerationConfig,
) -> Frame {
    let frame = Frame::new(x, y, inches(IMAGE_BOX_WIDTH_IN), inches(IMAGE_BOX_HEIGHT_IN));
    let shape = slide.add_text_box(frame);
    shape.set_text(text);
    shape.fill = Some(PLACEHOLDER_FILL.to_string());
    shape.line = Some(PLACEHOLDER_LINE.to_string());
    shape.anchor_center = true;
    shape.style = Some(TextStyle {
        align: Align::Center,
        ..body_style(config)
    });
    frame
}

/// Render the dedicated slide for one mind-map occurrence.
///
/// Draws the image when `binding` is resolved, the failure box otherwise.
pub fn render_mindmap_slide(
    deck: &mut Deck,
    title: &str,
    binding: Option<&MindmapBinding>,
    config: &GenerationConfig,
) {
    let (width, height) = (deck.width(), deck.height());
    let margin = inches(MARGIN_IN);
    let region = Frame::new(
        margin,
        inches(BODY_TOP_IN),
        width - 2 * margin,
        height - inches(BODY_TOP_IN) - inches(0.4),
    );

    let image = binding
        .filter(|b| b.is_resolved())
        .and_then(|b| b.image.as_ref());
    let media = image.map(|img| deck.add_media(img));

    let slide = deck.add_slide(Layout::Blank);
    let heading = slide.add_text_box(Frame::new(margin, inches(0.4), width - 2 * margin, inches(0.9)));
    heading.set_text(&format!("mind-map: {title}"));
    heading.style = Some(body_style(config));

    match (media, image) {
        (Some(media), Some(img)) => {
            let frame = region.fit(img.width_px, img.height_px);
            slide.add_picture(media, frame, &format!("mind-map: {title}"));
        }
        _ => {
            let x = (width - inches(IMAGE_BOX_WIDTH_IN)) / 2;
            add_placeholder_box(slide, x, inches(BODY_TOP_IN), MINDMAP_FAILED_TEXT, config);
        }
    }
}

/// The one text style used everywhere except on the cover.
fn body_style(config: &GenerationConfig) -> TextStyle {
    TextStyle {
        size_pt: 18.0,
        bold: false,
        color: TEXT_COLOR.to_string(),
        font: config.font_family.clone(),
        align: Align::Left,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MindmapError;
    use crate::pipeline::encode::{EmbeddedImage, PictureFormat};
    use crate::pipeline::markup::parse_outline;
    use crate::pptx::ShapeKind;

    fn config() -> GenerationConfig {
        GenerationConfig::default()
    }

    fn resolved(slide_index: usize, position: usize, title: &str) -> MindmapBinding {
        let mut b = MindmapBinding::pending(slide_index, position, title, "ref");
        b.url = Some(format!("https://img.example/{title}.png"));
        b.image = Some(EmbeddedImage {
            bytes: vec![1, 2, 3],
            format: PictureFormat::Png,
            width_px: 200,
            height_px: 100,
        });
        b
    }

    #[test]
    fn cover_draws_only_title_and_subtitle() {
        let records = parse_outline("[SLIDE]\n[TITLE]Intro\n[SUBTITLE]Welcome\n- dropped\n[IMAGE]kept");
        let deck = render_deck(&records, &[], &config());
        let cover = &deck.slides()[0];
        assert_eq!(cover.layout, Layout::Cover);
        assert_eq!(cover.shapes().len(), 2);
        assert_eq!(cover.text(), "Intro\nWelcome");
        let title_style = cover.shapes()[0].style.as_ref().unwrap();
        assert_eq!(title_style.size_pt, 44.0);
        assert!(title_style.bold);
    }

    #[test]
    fn non_cover_text_is_uniform_18pt_black() {
        let records = parse_outline(
            "[SLIDE]\n[TITLE]Cover\n[SLIDE]\n[TITLE]Details\n[CONTENT]\n- a\n[IMAGE]x\n[MINDMAP]M|r",
        );
        let deck = render_deck(&records, &[], &config());
        for slide in &deck.slides()[1..] {
            for shape in slide.shapes() {
                let style = shape.style.as_ref().unwrap();
                assert_eq!(style.size_pt, 18.0);
                assert!(!style.bold);
                assert_eq!(style.color, "000000");
                assert_eq!(style.font, config().font_family);
            }
        }
    }

    #[test]
    fn cover_without_subtitle_drops_placeholder() {
        let records = parse_outline("[SLIDE]\n[TITLE]Only title");
        let deck = render_deck(&records, &[], &config());
        assert_eq!(deck.slides()[0].shapes().len(), 1);
    }

    #[test]
    fn bullets_keep_source_order() {
        let records = parse_outline(
            "[SLIDE]\n[TITLE]c\n[SLIDE]\n[TITLE]Details\n[CONTENT]\n- b\n- a\n- c",
        );
        let deck = render_deck(&records, &[], &config());
        let slide = &deck.slides()[1];
        assert_eq!(slide.layout, Layout::Content);
        let body = slide
            .shapes()
            .iter()
            .find(|s| s.kind == ShapeKind::TextBox)
            .unwrap();
        assert_eq!(body.paragraphs, vec!["- b", "- a", "- c"]);
        assert_eq!(body.style.as_ref().unwrap().size_pt, 18.0);
        assert_eq!(body.style.as_ref().unwrap().color, "000000");
    }

    #[test]
    fn image_placeholders_stack_without_overlap() {
        let records = parse_outline("[SLIDE]\n[SLIDE]\n[TITLE]t\n[IMAGE]first\n[IMAGE]second");
        let deck = render_deck(&records, &[], &config());
        let boxes: Vec<_> = deck.slides()[1]
            .shapes()
            .iter()
            .filter(|s| s.fill.is_some())
            .collect();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].paragraphs, vec!["[image: first]"]);
        let (a, b) = (boxes[0].frame.unwrap(), boxes[1].frame.unwrap());
        assert!(b.y >= a.y + a.cy);
    }

    #[test]
    fn content_body_placeholder_is_removed() {
        let records = parse_outline("[SLIDE]\n[SLIDE]\n[TITLE]t");
        let deck = render_deck(&records, &[], &config());
        let slide = &deck.slides()[1];
        assert!(slide
            .shapes()
            .iter()
            .all(|s| s.placeholder_kind() != Some(PlaceholderKind::Body)));
        assert_eq!(slide.shapes().len(), 1);
    }

    #[test]
    fn mindmap_slides_follow_declaring_slide() {
        let records = parse_outline(
            "[SLIDE]\n[TITLE]c\n[SLIDE]\n[TITLE]One\n[MINDMAP]M|r\n[SLIDE]\n[TITLE]Two",
        );
        let deck = render_deck(&records, &[resolved(1, 0, "M")], &config());
        assert_eq!(deck.slide_count(), 4);
        let mm = &deck.slides()[2];
        assert_eq!(mm.layout, Layout::Blank);
        assert!(mm.text().starts_with("mind-map: M"));
        assert_eq!(mm.picture_media(), vec![0]);
        assert_eq!(deck.slides()[3].text(), "Two");
    }

    #[test]
    fn failed_or_missing_binding_shows_failure_box() {
        let records = parse_outline("[SLIDE]\n[SLIDE]\n[MINDMAP]A|r\n[MINDMAP]B|r");
        let mut failed = MindmapBinding::pending(1, 0, "A", "r");
        failed.error = Some(MindmapError::CompletionFailed {
            title: "A".into(),
            detail: "HTTP 500".into(),
        });
        let deck = render_deck(&records, &[failed], &config());
        for slide in &deck.slides()[2..4] {
            assert!(slide.text().contains(MINDMAP_FAILED_TEXT));
            assert!(slide.picture_media().is_empty());
        }
        assert!(deck.media().is_empty());
    }

    #[test]
    fn duplicate_titles_bind_by_occurrence() {
        let records = parse_outline("[SLIDE]\n[SLIDE]\n[MINDMAP]Same|a\n[SLIDE]\n[MINDMAP]Same|b");
        let mut failed = MindmapBinding::pending(1, 0, "Same", "a");
        failed.error = Some(MindmapError::MissingSentinel { title: "Same".into() });
        let deck = render_deck(&records, &[failed, resolved(2, 0, "Same")], &config());
        // cover, content, mind-map (failed), content, mind-map (image)
        assert_eq!(deck.slide_count(), 5);
        assert!(deck.slides()[2].text().contains(MINDMAP_FAILED_TEXT));
        assert_eq!(deck.slides()[4].picture_media(), vec![0]);
    }

    #[test]
    fn picture_is_aspect_fitted() {
        let records = parse_outline("[SLIDE]\n[SLIDE]\n[MINDMAP]M|r");
        let deck = render_deck(&records, &[resolved(1, 0, "M")], &config());
        let pic = deck.slides()[2]
            .shapes()
            .iter()
            .find(|s| matches!(s.kind, ShapeKind::Picture { .. }))
            .unwrap();
        let f = pic.frame.unwrap();
        assert_eq!(f.cx / 2, f.cy);
    }

    #[test]
    fn empty_outline_renders_empty_deck() {
        let deck = render_deck(&[], &[], &config());
        assert_eq!(deck.slide_count(), 0);
        assert!(deck.to_bytes().is_ok());
    }
}
