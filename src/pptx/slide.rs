//! Slides: layout choice, shape list, `<p:sld>` serialisation.

use super::shape::{Frame, PlaceholderKind, Shape, ShapeKind};
use std::fmt::{self, Write as FmtWrite};

/// The three layouts bundled in the deck template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Centre title + subtitle.
    Cover,
    /// Title + body.
    Content,
    /// No placeholders.
    Blank,
}

impl Layout {
    /// 1-based number of `slideLayoutN.xml`.
    pub fn number(&self) -> usize {
        match self {
            Self::Cover => 1,
            Self::Content => 2,
            Self::Blank => 3,
        }
    }

    /// Placeholders a new slide on this layout starts with.
    pub fn default_placeholders(&self) -> &'static [PlaceholderKind] {
        match self {
            Self::Cover => &[PlaceholderKind::CenterTitle, PlaceholderKind::Subtitle],
            Self::Content => &[PlaceholderKind::Title, PlaceholderKind::Body],
            Self::Blank => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slide {
    pub layout: Layout,
    shapes: Vec<Shape>,
    next_id: u32,
}

impl Slide {
    /// A slide carrying its layout's default placeholders, all empty.
    pub fn new(layout: Layout) -> Self {
        // id 1 is the group shape
        let mut slide = Self {
            layout,
            shapes: Vec::new(),
            next_id: 2,
        };
        for &kind in layout.default_placeholders() {
            let id = slide.allocate_id();
            slide.shapes.push(Shape::placeholder(id, kind));
        }
        slide
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// The first placeholder of `kind`, if still present.
    pub fn placeholder_mut(&mut self, kind: PlaceholderKind) -> Option<&mut Shape> {
        self.shapes
            .iter_mut()
            .find(|s| s.placeholder_kind() == Some(kind))
    }

    /// Drop placeholder `kind` regardless of content.
    pub fn remove_placeholder(&mut self, kind: PlaceholderKind) {
        self.shapes.retain(|s| s.placeholder_kind() != Some(kind));
    }

    /// Drop every placeholder that ended up without text.
    pub fn remove_empty_placeholders(&mut self) {
        self.shapes
            .retain(|s| s.placeholder_kind().is_none() || !s.is_empty());
    }

    pub fn add_text_box(&mut self, frame: Frame) -> &mut Shape {
        let id = self.allocate_id();
        self.push(Shape::text_box(id, frame))
    }

    pub fn add_picture(&mut self, media: usize, frame: Frame, description: &str) -> &mut Shape {
        let id = self.allocate_id();
        self.push(Shape::picture(id, media, frame, description))
    }

    fn push(&mut self, shape: Shape) -> &mut Shape {
        let at = self.shapes.len();
        self.shapes.push(shape);
        &mut self.shapes[at]
    }

    /// Media indices of pictures, in shape order.
    ///
    /// Picture `k` is relationship `rId{k + 2}`; `rId1` is the layout.
    pub fn picture_media(&self) -> Vec<usize> {
        self.shapes
            .iter()
            .filter_map(|s| match s.kind {
                ShapeKind::Picture { media } => Some(media),
                _ => None,
            })
            .collect()
    }

    /// Concatenated text of all shapes, for inspection.
    pub fn text(&self) -> String {
        self.shapes
            .iter()
            .flat_map(|s| s.paragraphs.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn to_xml(&self) -> Result<String, fmt::Error> {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#);
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
        );
        xml.push_str(r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
        );
        xml.push_str(
            r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
        );

        let mut picture = 0usize;
        for shape in &self.shapes {
            let rel_id = match shape.kind {
                ShapeKind::Picture { .. } => {
                    picture += 1;
                    Some(format!("rId{}", picture + 1))
                }
                _ => None,
            };
            shape.write_xml(&mut xml, rel_id.as_deref())?;
        }

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");
        Ok(xml)
    }

    /// `ppt/slides/_rels/slideN.xml.rels`. `media_names[i]` is the file
    /// name of deck media `i`.
    pub(crate) fn rels_xml(&self, media_names: &[String]) -> Result<String, fmt::Error> {
        let mut xml = String::with_capacity(512);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        write!(
            xml,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout{}.xml"/>"#,
            self.layout.number()
        )?;
        for (k, media) in self.picture_media().into_iter().enumerate() {
            let Some(name) = media_names.get(media) else {
                continue;
            };
            write!(
                xml,
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/{}"/>"#,
                k + 2,
                name
            )?;
        }
        xml.push_str("</Relationships>");
        Ok(xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_seed_placeholders() {
        assert_eq!(Slide::new(Layout::Cover).shapes().len(), 2);
        assert_eq!(Slide::new(Layout::Content).shapes().len(), 2);
        assert!(Slide::new(Layout::Blank).shapes().is_empty());
    }

    #[test]
    fn empty_placeholders_are_removed() {
        let mut slide = Slide::new(Layout::Cover);
        if let Some(title) = slide.placeholder_mut(PlaceholderKind::CenterTitle) {
            title.set_text("Intro");
        }
        slide.remove_empty_placeholders();
        assert_eq!(slide.shapes().len(), 1);
        assert_eq!(slide.text(), "Intro");
    }

    #[test]
    fn shape_ids_are_unique() {
        let mut slide = Slide::new(Layout::Content);
        slide.remove_placeholder(PlaceholderKind::Body);
        slide.add_text_box(Frame::new(0, 0, 1, 1));
        slide.add_text_box(Frame::new(0, 0, 1, 1));
        let mut ids: Vec<u32> = slide.shapes().iter().map(|s| s.id).collect();
        ids.dedup();
        assert_eq!(ids, vec![2, 4, 5]);
    }

    #[test]
    fn pictures_get_sequential_relationships() {
        let mut slide = Slide::new(Layout::Blank);
        slide.add_picture(3, Frame::new(0, 0, 10, 10), "a");
        slide.add_picture(0, Frame::new(0, 0, 10, 10), "b");
        let xml = slide.to_xml().unwrap();
        assert!(xml.find(r#"r:embed="rId2""#).unwrap() < xml.find(r#"r:embed="rId3""#).unwrap());

        let names: Vec<String> = (1..=4).map(|n| format!("image{n}.png")).collect();
        let rels = slide.rels_xml(&names).unwrap();
        assert!(rels.contains("slideLayout3.xml"));
        assert!(rels.contains(r#"Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image4.png""#));
        assert!(rels.contains(r#"Target="../media/image1.png""#));
    }
}
