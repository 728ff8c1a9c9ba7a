use std::io::Cursor;

use ::image::{
    DynamicImage, ImageDecoder, ImageEncoder, ImageReader,
    codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder},
    imageops::FilterType,
};

use super::Resizer;
use crate::{BlogError, Result};

/// Lanczos3 resampling with EXIF auto-orientation; output is always PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanczosResizer;

impl LanczosResizer {
    pub fn new() -> Self {
        Self
    }
}

/// Target dimensions, deriving a zero side from the source aspect ratio.
pub fn target_dimensions(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    match (width, height) {
        (0, 0) => (src_w, src_h),
        (w, 0) => (w, scale(src_h, w, src_w)),
        (0, h) => (scale(src_w, h, src_h), h),
        (w, h) => (w, h),
    }
}

fn scale(side: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 1;
    }
    let scaled = (f64::from(side) * f64::from(numerator) / f64::from(denominator)).round();
    (scaled as u32).max(1)
}

impl Resizer for LanczosResizer {
    fn resize(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_decoder()?;
        let orientation = decoder.orientation()?;
        let mut img = DynamicImage::from_decoder(decoder)?;
        img.apply_orientation(orientation);

        let (w, h) = target_dimensions(img.width(), img.height(), width, height);
        let resized = img.resize_exact(w, h, FilterType::Lanczos3).to_rgba8();

        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Fast, PngFilter::NoFilter)
            .write_image(
                resized.as_raw(),
                resized.width(),
                resized.height(),
                ::image::ExtendedColorType::Rgba8,
            )
            .map_err(|err| BlogError::Internal(format!("failed to encode png: {err}")))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{ImageFormat, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode fixture");
        out.into_inner()
    }

    fn dimensions(bytes: &[u8]) -> (u32, u32) {
        let img = ::image::load_from_memory(bytes).expect("decode output");
        (img.width(), img.height())
    }

    #[test]
    fn resizes_square_png_preserving_aspect_ratio() {
        let out = LanczosResizer::new().resize(&png(100, 100), 10, 0).expect("resize");
        assert_eq!(dimensions(&out), (10, 10));
    }

    #[test]
    fn derives_width_from_height() {
        let out = LanczosResizer::new().resize(&png(200, 100), 0, 50).expect("resize");
        assert_eq!(dimensions(&out), (100, 50));
    }

    #[test]
    fn exact_dimensions_when_both_given() {
        let out = LanczosResizer::new().resize(&png(100, 100), 30, 20).expect("resize");
        assert_eq!(dimensions(&out), (30, 20));
    }

    #[test]
    fn output_is_png() {
        let out = LanczosResizer::new().resize(&png(20, 20), 5, 5).expect("resize");
        assert_eq!(
            ::image::guess_format(&out).expect("format"),
            ImageFormat::Png
        );
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        assert!(LanczosResizer::new().resize(b"definitely not an image", 10, 10).is_err());
    }

    #[test]
    fn target_dimensions_handles_zero_sides() {
        assert_eq!(target_dimensions(640, 480, 0, 0), (640, 480));
        assert_eq!(target_dimensions(640, 480, 320, 0), (320, 240));
        assert_eq!(target_dimensions(640, 480, 0, 240), (320, 240));
    }
}
