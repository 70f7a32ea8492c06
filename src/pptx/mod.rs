//! Minimal PresentationML writer.
//!
//! Just enough of OOXML to produce a `.pptx` that PowerPoint, Keynote and
//! LibreOffice open without repair:
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/{core,app}.xml
//! ppt/presentation.xml            + _rels
//! ppt/presProps.xml
//! ppt/slideMasters/slideMaster1.xml + _rels
//! ppt/slideLayouts/slideLayout{1,2,3}.xml + _rels   (cover, content, blank)
//! ppt/theme/theme1.xml
//! ppt/slides/slide{N}.xml         + _rels
//! ppt/media/image{N}.{png,jpeg}
//! ```
//!
//! Geometry is in EMUs (914 400 per inch, 12 700 per point).

pub mod deck;
pub mod shape;
pub mod slide;
pub mod template;

pub use deck::{Deck, Media};
pub use shape::{Align, Frame, PlaceholderKind, Shape, ShapeKind, TextStyle};
pub use slide::{Layout, Slide};

/// EMUs per typographic point.
pub const EMU_PER_POINT: i64 = 12_700;

/// Convert inches to EMUs.
pub fn inches(value: f64) -> i64 {
    (value * crate::config::EMU_PER_INCH as f64).round() as i64
}

/// Escape text for XML content or attribute values.
///
/// Characters XML 1.0 cannot carry at all (most C0 controls, U+FFFE,
/// U+FFFF) are dropped.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => {}
            '\u{FFFE}' | '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}
