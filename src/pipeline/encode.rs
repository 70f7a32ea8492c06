//! Image preparation: raw downloaded bytes → embeddable PNG/JPEG.
//!
//! PresentationML can embed many formats, but PNG and JPEG are the only ones
//! every viewer renders. Anything else the image service hands back (WebP,
//! GIF, BMP, …) is decoded and re-encoded as PNG. The pixel size is kept so
//! the renderer can fit the picture without distorting it.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Embeddable picture formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureFormat {
    Png,
    Jpeg,
}

impl PictureFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// A decoded, embeddable picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    pub format: PictureFormat,
    pub width_px: u32,
    pub height_px: u32,
}

/// Validate downloaded bytes and convert them to PNG when needed.
pub fn prepare_image(bytes: &[u8]) -> Result<EmbeddedImage, image::ImageError> {
    let format = image::guess_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)?;
    let (width_px, height_px) = (img.width(), img.height());

    let prepared = match format {
        ImageFormat::Png => EmbeddedImage {
            bytes: bytes.to_vec(),
            format: PictureFormat::Png,
            width_px,
            height_px,
        },
        ImageFormat::Jpeg => EmbeddedImage {
            bytes: bytes.to_vec(),
            format: PictureFormat::Jpeg,
            width_px,
            height_px,
        },
        _ => EmbeddedImage {
            bytes: encode_png(&img)?,
            format: PictureFormat::Png,
            width_px,
            height_px,
        },
    };
    debug!(
        "Prepared {}×{} {} ({} bytes)",
        width_px,
        height_px,
        prepared.format.extension(),
        prepared.bytes.len()
    );
    Ok(prepared)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([0, 128, 255, 255])));
        encode_png(&img).expect("encode should succeed")
    }

    #[test]
    fn png_passes_through() {
        let bytes = png_bytes(20, 10);
        let prepared = prepare_image(&bytes).unwrap();
        assert_eq!(prepared.format, PictureFormat::Png);
        assert_eq!((prepared.width_px, prepared.height_px), (20, 10));
        assert_eq!(prepared.bytes, bytes);
    }

    #[test]
    fn jpeg_passes_through() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([9, 9, 9])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg).unwrap();
        let prepared = prepare_image(&buf).unwrap();
        assert_eq!(prepared.format, PictureFormat::Jpeg);
        assert_eq!(prepared.format.mime_type(), "image/jpeg");
    }

    #[test]
    fn gif_and_bmp_are_reencoded_as_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 3, Rgba([200, 10, 10, 255])));
        for format in [ImageFormat::Gif, ImageFormat::Bmp] {
            let mut buf = Vec::new();
            img.write_to(&mut Cursor::new(&mut buf), format).unwrap();

            let prepared = prepare_image(&buf).unwrap();
            assert_eq!(prepared.format, PictureFormat::Png, "{format:?}");
            assert_eq!((prepared.width_px, prepared.height_px), (6, 3));
            assert_eq!(image::guess_format(&prepared.bytes).unwrap(), ImageFormat::Png);
        }
    }

    #[test]
    fn garbage_rejected() {
        assert!(prepare_image(b"<html>not an image</html>").is_err());
    }
}
