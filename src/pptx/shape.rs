//! Shapes and their `<p:sp>` / `<p:pic>` serialisation.

use super::{escape_xml, EMU_PER_POINT};
use std::fmt::{self, Write as FmtWrite};

/// Position and size in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    /// Bottom edge.
    pub fn bottom(&self) -> i64 {
        self.y + self.cy
    }

    /// Largest frame with aspect `width_px:height_px`, centred in `self`.
    pub fn fit(&self, width_px: u32, height_px: u32) -> Frame {
        if width_px == 0 || height_px == 0 {
            return *self;
        }
        let scale = f64::min(
            self.cx as f64 / width_px as f64,
            self.cy as f64 / height_px as f64,
        );
        let cx = (width_px as f64 * scale).round() as i64;
        let cy = (height_px as f64 * scale).round() as i64;
        Frame {
            x: self.x + (self.cx - cx) / 2,
            y: self.y + (self.cy - cy) / 2,
            cx,
            cy,
        }
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// Run properties applied uniformly to every paragraph of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size_pt: f64,
    pub bold: bool,
    /// `RRGGBB`
    pub color: String,
    pub font: String,
    pub align: Align,
}

/// Placeholder roles used by the bundled layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    CenterTitle,
    Subtitle,
    Title,
    Body,
}

impl PlaceholderKind {
    fn ph_xml(&self) -> &'static str {
        match self {
            Self::CenterTitle => r#"<p:ph type="ctrTitle"/>"#,
            Self::Subtitle => r#"<p:ph type="subTitle" idx="1"/>"#,
            Self::Title => r#"<p:ph type="title"/>"#,
            Self::Body => r#"<p:ph idx="1"/>"#,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::CenterTitle | Self::Title => "Title",
            Self::Subtitle => "Subtitle",
            Self::Body => "Content Placeholder",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Inherits its frame from the layout unless one is set.
    Placeholder(PlaceholderKind),
    TextBox,
    /// Index into the deck's media list.
    Picture { media: usize },
}

/// One shape on a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: u32,
    pub kind: ShapeKind,
    pub frame: Option<Frame>,
    pub paragraphs: Vec<String>,
    pub style: Option<TextStyle>,
    /// Solid fill, `RRGGBB`.
    pub fill: Option<String>,
    /// 1pt outline, `RRGGBB`.
    pub line: Option<String>,
    /// Vertically centre the text body.
    pub anchor_center: bool,
    /// Alt text for pictures.
    pub description: String,
}

impl Shape {
    pub fn placeholder(id: u32, kind: PlaceholderKind) -> Self {
        Self::bare(id, ShapeKind::Placeholder(kind), None)
    }

    pub fn text_box(id: u32, frame: Frame) -> Self {
        Self::bare(id, ShapeKind::TextBox, Some(frame))
    }

    pub fn picture(id: u32, media: usize, frame: Frame, description: &str) -> Self {
        let mut shape = Self::bare(id, ShapeKind::Picture { media }, Some(frame));
        shape.description = description.to_string();
        shape
    }

    fn bare(id: u32, kind: ShapeKind, frame: Option<Frame>) -> Self {
        Self {
            id,
            kind,
            frame,
            paragraphs: Vec::new(),
            style: None,
            fill: None,
            line: None,
            anchor_center: false,
            description: String::new(),
        }
    }

    pub fn placeholder_kind(&self) -> Option<PlaceholderKind> {
        match self.kind {
            ShapeKind::Placeholder(kind) => Some(kind),
            _ => None,
        }
    }

    /// Replace the text with a single paragraph.
    pub fn set_text(&mut self, text: &str) {
        self.paragraphs = vec![text.to_string()];
    }

    /// True when no paragraph carries visible text.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|p| p.trim().is_empty())
    }

    /// Serialise into `xml`. `rel_id` is the picture's image relationship.
    pub(crate) fn write_xml(&self, xml: &mut String, rel_id: Option<&str>) -> fmt::Result {
        match &self.kind {
            ShapeKind::Picture { .. } => self.write_picture(xml, rel_id.unwrap_or("rId2")),
            ShapeKind::Placeholder(kind) => {
                xml.push_str("<p:sp><p:nvSpPr>");
                write!(xml, r#"<p:cNvPr id="{}" name="{} {}"/>"#, self.id, kind.name(), self.id)?;
                xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
                write!(xml, "<p:nvPr>{}</p:nvPr>", kind.ph_xml())?;
                xml.push_str("</p:nvSpPr>");
                self.write_sp_pr(xml)?;
                self.write_text_body(xml)?;
                xml.push_str("</p:sp>");
                Ok(())
            }
            ShapeKind::TextBox => {
                xml.push_str("<p:sp><p:nvSpPr>");
                write!(xml, r#"<p:cNvPr id="{}" name="TextBox {}"/>"#, self.id, self.id)?;
                xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);
                self.write_sp_pr(xml)?;
                self.write_text_body(xml)?;
                xml.push_str("</p:sp>");
                Ok(())
            }
        }
    }

    fn write_sp_pr(&self, xml: &mut String) -> fmt::Result {
        let Some(frame) = self.frame else {
            xml.push_str("<p:spPr/>");
            return Ok(());
        };
        xml.push_str("<p:spPr>");
        write_xfrm(xml, &frame)?;
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
        match self.fill {
            Some(ref color) => {
                write!(xml, r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill>"#)?
            }
            None if self.kind == ShapeKind::TextBox => xml.push_str("<a:noFill/>"),
            None => {}
        }
        if let Some(ref color) = self.line {
            write!(
                xml,
                r#"<a:ln w="{EMU_PER_POINT}"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill></a:ln>"#
            )?;
        }
        xml.push_str("</p:spPr>");
        Ok(())
    }

    fn write_text_body(&self, xml: &mut String) -> fmt::Result {
        xml.push_str("<p:txBody>");
        let anchor = if self.anchor_center { r#" anchor="ctr""# } else { "" };
        write!(xml, r#"<a:bodyPr wrap="square" rtlCol="0"{anchor}><a:normAutofit/></a:bodyPr>"#)?;
        xml.push_str("<a:lstStyle/>");

        if self.paragraphs.is_empty() {
            xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
        }
        for paragraph in &self.paragraphs {
            xml.push_str("<a:p>");
            if let Some(TextStyle { align: Align::Center, .. }) = self.style {
                xml.push_str(r#"<a:pPr algn="ctr"/>"#);
            }
            xml.push_str("<a:r>");
            self.write_run_props(xml)?;
            write!(xml, "<a:t>{}</a:t>", escape_xml(paragraph))?;
            xml.push_str("</a:r></a:p>");
        }
        xml.push_str("</p:txBody>");
        Ok(())
    }

    fn write_run_props(&self, xml: &mut String) -> fmt::Result {
        let Some(ref style) = self.style else {
            xml.push_str(r#"<a:rPr lang="en-US" dirty="0"/>"#);
            return Ok(());
        };
        write!(
            xml,
            r#"<a:rPr lang="en-US" sz="{}" b="{}" dirty="0">"#,
            (style.size_pt * 100.0).round() as u32,
            if style.bold { 1 } else { 0 }
        )?;
        write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, style.color)?;
        let font = escape_xml(&style.font);
        write!(xml, r#"<a:latin typeface="{font}"/><a:ea typeface="{font}"/>"#)?;
        xml.push_str("</a:rPr>");
        Ok(())
    }

    fn write_picture(&self, xml: &mut String, rel_id: &str) -> fmt::Result {
        xml.push_str("<p:pic><p:nvPicPr>");
        write!(
            xml,
            r#"<p:cNvPr id="{}" name="Picture {}" descr="{}"/>"#,
            self.id,
            self.id,
            escape_xml(&self.description)
        )?;
        xml.push_str(
            r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
        );
        write!(
            xml,
            r#"<p:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#
        )?;
        xml.push_str("<p:spPr>");
        if let Some(frame) = self.frame {
            write_xfrm(xml, &frame)?;
        }
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
        Ok(())
    }
}

fn write_xfrm(xml: &mut String, frame: &Frame) -> fmt::Result {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x, frame.y, frame.cx, frame.cy
    )
}
