//! Result types returned by a build.

use crate::error::MindmapError;
use crate::pipeline::encode::EmbeddedImage;
use crate::pipeline::markup::SlideRecord;
use serde::{Deserialize, Serialize};

/// The outcome of resolving one `[MINDMAP]` occurrence.
///
/// Bindings are keyed by occurrence (`slide_index`, `position`), never by
/// title: two mind-maps that share a title each keep their own image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindmapBinding {
    /// Index of the slide that declared the mind-map.
    pub slide_index: usize,
    /// 0-based position among that slide's mind-maps.
    pub position: usize,
    pub title: String,
    pub reference: String,
    /// URL returned by the image service. `None` when the image came back
    /// inline or resolution failed before an image existed.
    pub url: Option<String>,
    /// Why resolution failed, if it did.
    pub error: Option<MindmapError>,
    /// The prepared picture, embedded by the renderer.
    #[serde(skip)]
    pub image: Option<EmbeddedImage>,
}

impl MindmapBinding {
    /// A binding that has not been resolved yet.
    pub fn pending(slide_index: usize, position: usize, title: &str, reference: &str) -> Self {
        Self {
            slide_index,
            position,
            title: title.to_string(),
            reference: reference.to_string(),
            url: None,
            error: None,
            image: None,
        }
    }

    /// A binding is resolved only when an embeddable image is present.
    pub fn is_resolved(&self) -> bool {
        self.image.is_some() && self.error.is_none()
    }
}

/// The serialised `.pptx` package.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    /// Slides in the package, mind-map slides included.
    pub slide_count: usize,
}

/// Counters for one build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStats {
    /// Slide records parsed from the outline.
    pub parsed_slides: usize,
    /// Slides in the rendered document.
    pub rendered_slides: usize,
    pub mindmaps_total: usize,
    pub mindmaps_resolved: usize,
    pub mindmaps_failed: usize,
    /// Wall-clock time of the whole build, outline generation included.
    pub total_duration_ms: u64,
}

/// Everything a build produces.
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    /// The outline text the deck was built from.
    pub outline: String,
    pub slides: Vec<SlideRecord>,
    /// One entry per mind-map occurrence, in outline order.
    pub bindings: Vec<MindmapBinding>,
    #[serde(skip)]
    pub document: RenderedDocument,
    pub stats: BuildStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_binding_is_unresolved() {
        let b = MindmapBinding::pending(2, 0, "Ownership", "moves and borrows");
        assert!(!b.is_resolved());
        assert_eq!(b.slide_index, 2);
        assert!(b.url.is_none());
    }

    #[test]
    fn binding_json_skips_image_bytes() {
        let mut b = MindmapBinding::pending(1, 0, "T", "R");
        b.url = Some("https://img.example/x.png".into());
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["url"], "https://img.example/x.png");
        assert!(json.get("image").is_none());
    }
}
