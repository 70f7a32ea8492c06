//! The deck: slides, media and zip packaging.

use super::slide::{Layout, Slide};
use super::template;
use crate::error::PptGenError;
use crate::pipeline::encode::{EmbeddedImage, PictureFormat};
use std::fmt;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// An image stored once under `ppt/media/`.
#[derive(Debug, Clone)]
pub struct Media {
    pub bytes: Vec<u8>,
    pub format: PictureFormat,
}

/// A presentation under construction.
#[derive(Debug, Clone)]
pub struct Deck {
    slides: Vec<Slide>,
    media: Vec<Media>,
    width: i64,
    height: i64,
    font: String,
    title: String,
}

impl Deck {
    /// An empty deck of `width` × `height` EMUs whose theme uses `font`.
    pub fn new(width: i64, height: i64, font: &str) -> Self {
        Self {
            slides: Vec::new(),
            media: Vec::new(),
            width,
            height,
            font: font.to_string(),
            title: String::new(),
        }
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    /// Document title written to `docProps/core.xml`.
    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Append a slide seeded with `layout`'s placeholders.
    pub fn add_slide(&mut self, layout: Layout) -> &mut Slide {
        let at = self.slides.len();
        self.slides.push(Slide::new(layout));
        &mut self.slides[at]
    }

    /// Store an image; the returned index goes into
    /// [`Slide::add_picture`].
    pub fn add_media(&mut self, image: &EmbeddedImage) -> usize {
        self.media.push(Media {
            bytes: image.bytes.clone(),
            format: image.format,
        });
        self.media.len() - 1
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn media(&self) -> &[Media] {
        &self.media
    }

    fn media_names(&self) -> Vec<String> {
        self.media
            .iter()
            .enumerate()
            .map(|(i, m)| format!("image{}.{}", i + 1, m.format.extension()))
            .collect()
    }

    /// Serialise the deck into `.pptx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PptGenError> {
        let xml_err = |e: fmt::Error| PptGenError::Packaging(format!("XML generation: {e}"));
        let n = self.slides.len();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        // Images are already compressed.
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let mut parts: Vec<(String, String)> = vec![
            ("[Content_Types].xml".into(), template::content_types_xml(n).map_err(xml_err)?),
            ("_rels/.rels".into(), template::root_rels_xml()),
            ("docProps/core.xml".into(), template::core_props_xml(&self.title)),
            ("docProps/app.xml".into(), template::app_props_xml(n)),
            (
                "ppt/presentation.xml".into(),
                template::presentation_xml(n, self.width, self.height).map_err(xml_err)?,
            ),
            (
                "ppt/_rels/presentation.xml.rels".into(),
                template::presentation_rels_xml(n).map_err(xml_err)?,
            ),
            ("ppt/presProps.xml".into(), template::pres_props_xml()),
            (
                "ppt/slideMasters/slideMaster1.xml".into(),
                template::slide_master_xml(self.width, self.height).map_err(xml_err)?,
            ),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
                template::slide_master_rels_xml().map_err(xml_err)?,
            ),
        ];
        for layout in [Layout::Cover, Layout::Content, Layout::Blank] {
            let k = layout.number();
            parts.push((
                format!("ppt/slideLayouts/slideLayout{k}.xml"),
                template::slide_layout_xml(k, self.width, self.height).map_err(xml_err)?,
            ));
            parts.push((
                format!("ppt/slideLayouts/_rels/slideLayout{k}.xml.rels"),
                template::slide_layout_rels_xml(),
            ));
        }
        parts.push(("ppt/theme/theme1.xml".into(), template::theme_xml(&self.font)));

        let names = self.media_names();
        for (i, slide) in self.slides.iter().enumerate() {
            parts.push((
                format!("ppt/slides/slide{}.xml", i + 1),
                slide.to_xml().map_err(xml_err)?,
            ));
            parts.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                slide.rels_xml(&names).map_err(xml_err)?,
            ));
        }

        for (name, xml) in &parts {
            put_part(&mut zip, name, xml.as_bytes(), options)?;
        }
        for (media, name) in self.media.iter().zip(&names) {
            put_part(&mut zip, &format!("ppt/media/{name}"), &media.bytes, stored)?;
        }

        let bytes = zip.finish()?.into_inner();
        debug!(
            "Packaged {} slide(s), {} media file(s): {} bytes",
            n,
            self.media.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

fn put_part(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    data: &[u8],
    options: SimpleFileOptions,
) -> Result<(), PptGenError> {
    zip.start_file(name, options)?;
    zip.write_all(data)
        .map_err(|e| PptGenError::Packaging(format!("{name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::shape::{Frame, PlaceholderKind};
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut s = String::new();
        file.read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn empty_deck_is_a_valid_package() {
        let deck = Deck::new(12_188_952, 6_858_000, "Arial");
        let bytes = deck.to_bytes().unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout3.xml",
            "ppt/theme/theme1.xml",
        ] {
            assert!(names.contains(&part), "missing {part}");
        }
        assert!(!names.iter().any(|n| n.starts_with("ppt/slides/")));
    }

    #[test]
    fn slides_and_media_are_packaged() {
        let mut deck = Deck::new(12_188_952, 6_858_000, "Arial");
        deck.set_title("Intro");
        let image = EmbeddedImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            format: PictureFormat::Png,
            width_px: 1,
            height_px: 1,
        };
        let media = deck.add_media(&image);

        let cover = deck.add_slide(Layout::Cover);
        if let Some(t) = cover.placeholder_mut(PlaceholderKind::CenterTitle) {
            t.set_text("Intro");
        }
        deck.add_slide(Layout::Blank)
            .add_picture(media, Frame::new(0, 0, 10, 10), "mind-map");

        let bytes = deck.to_bytes().unwrap();
        assert!(read_part(&bytes, "ppt/slides/slide1.xml").contains("<a:t>Intro</a:t>"));
        let rels = read_part(&bytes, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains("../media/image1.png"));
        assert!(read_part(&bytes, "docProps/core.xml").contains("<dc:title>Intro</dc:title>"));
        assert!(read_part(&bytes, "docProps/app.xml").contains("<Slides>2</Slides>"));

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(archive.by_name("ppt/media/image1.png").unwrap().size(), 4);
    }
}
