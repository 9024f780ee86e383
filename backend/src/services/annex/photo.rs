use image::imageops::FilterType;
use image::{load_from_memory, DynamicImage, GenericImageView};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Resolution photos are resampled to before embedding. Print quality at the
/// annex thumbnail size without carrying full camera resolution around.
const IMAGE_DPI: f64 = 300.0;

/// Tallest a photo may be drawn, in EMU (9 in, about a page body).
const MAX_HEIGHT_EMU: u64 = 9 * 914_400;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("could not read file: {0}")]
    Read(#[from] std::io::Error),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("could not encode PNG: {0}")]
    Encode(#[from] png::EncodingError),
}

/// A photo ready to be embedded: PNG bytes plus pixel size.
#[derive(Debug, Clone)]
pub struct PreparedPhoto {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl PreparedPhoto {
    /// Height in EMU once the photo is scaled to `width_emu`, preserving
    /// aspect ratio, capped at `MAX_HEIGHT_EMU`.
    pub fn height_for_width(&self, width_emu: u32) -> u32 {
        let width_px = u64::from(self.width_px.max(1));
        let height = (u64::from(width_emu) * u64::from(self.height_px) + width_px / 2) / width_px;
        // MAX_HEIGHT_EMU fits in a u32.
        height.min(MAX_HEIGHT_EMU) as u32
    }
}

/// Loads the photo at `path`, downscales it to what `width_in` inches need at
/// `IMAGE_DPI`, flattens any alpha channel over white and re-encodes it as
/// 8-bit RGB PNG.
pub fn prepare_photo(path: &Path, width_in: f64) -> Result<PreparedPhoto, PhotoError> {
    let bytes = fs::read(path)?;
    let img = load_from_memory(&bytes)?;

    let (orig_w, orig_h) = img.dimensions();
    let target_px = width_in * IMAGE_DPI;
    let scale = (target_px / orig_w.max(1) as f64).min(1.0);

    let resized: DynamicImage = if scale >= 1.0 {
        img
    } else {
        let new_w = (orig_w as f64 * scale).max(1.0).round() as u32;
        let new_h = (orig_h as f64 * scale).max(1.0).round() as u32;
        img.resize(new_w, new_h, FilterType::Lanczos3)
    };

    let rgba = resized.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut background = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, &rgba, 0, 0);
    let raw = DynamicImage::ImageRgba8(background).to_rgb8().into_raw();

    let mut png = Vec::new();
    {
        let mut encoder = PngEncoder::new(&mut png, w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&raw)?;
        writer.finish()?;
    }

    Ok(PreparedPhoto {
        png,
        width_px: w,
        height_px: h,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Writes a `w`×`h` semi-transparent PNG to `path`.
    pub(crate) fn write_test_png(path: &Path, w: u32, h: u32) {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 30, 30, 128]));
        img.save(path).unwrap();
    }

    #[test]
    fn large_photos_are_downscaled_preserving_ratio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.png");
        write_test_png(&path, 900, 1200);

        let photo = prepare_photo(&path, 1.5).unwrap();
        assert_eq!(photo.width_px, 450);
        assert_eq!(photo.height_px, 600);
        assert_eq!(&photo.png[1..4], b"PNG");
        assert_eq!(photo.height_for_width(1_371_600), 1_828_800);
    }

    #[test]
    fn small_photos_keep_their_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.png");
        write_test_png(&path, 40, 20);

        let photo = prepare_photo(&path, 1.5).unwrap();
        assert_eq!((photo.width_px, photo.height_px), (40, 20));
    }

    #[test]
    fn prepared_png_is_opaque_rgb_on_white() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        write_test_png(&path, 12, 8);

        let photo = prepare_photo(&path, 1.5).unwrap();
        let decoded = load_from_memory(&photo.png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!(decoded.dimensions(), (photo.width_px, photo.height_px));
        let image::Rgb([r, g, b]) = *decoded.to_rgb8().get_pixel(0, 0);
        assert!(r > 200 && g > 120 && b > 120, "not flattened over white: {r},{g},{b}");
    }

    #[test]
    fn extreme_aspect_ratios_are_capped() {
        let tall = PreparedPhoto {
            png: Vec::new(),
            width_px: 1,
            height_px: 100_000,
        };
        assert_eq!(tall.height_for_width(1_371_600), 9 * 914_400);

        let wide = PreparedPhoto {
            png: Vec::new(),
            width_px: 100_000,
            height_px: 1,
        };
        assert_eq!(wide.height_for_width(1_371_600), 14);
    }

    #[test]
    fn missing_and_corrupt_files_are_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            prepare_photo(&dir.path().join("nope.jpg"), 1.5),
            Err(PhotoError::Read(_))
        ));

        let corrupt = dir.path().join("corrupt.jpg");
        fs::write(&corrupt, b"definitely not a jpeg").unwrap();
        assert!(matches!(
            prepare_photo(&corrupt, 1.5),
            Err(PhotoError::Decode(_))
        ));
    }
}
