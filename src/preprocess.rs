//! Image decoding, contrast enhancement and PNG re-encoding.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ColorType, DynamicImage, ImageBuffer, ImageFormat, ImageOutputFormat, Pixel};
use thiserror::Error;

/// Contrast multiplier applied by [`enhance`].
pub const CONTRAST_FACTOR: f32 = 2.0;

/// Media type of every [`EncodedImage`].
pub const PNG_MIME_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is empty")]
    EmptyData,

    #[error("Unsupported image format (expected JPEG or PNG)")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode image as PNG: {0}")]
    EncodeFailed(String),
}

/// Formats accepted from the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Jpeg,
    Png,
}

impl UploadFormat {
    /// Detect the format from magic bytes.
    pub fn detect(bytes: &[u8]) -> Result<Self, ImageError> {
        match bytes {
            [] => Err(ImageError::EmptyData),
            // 0x89 P N G
            [0x89, 0x50, 0x4E, 0x47, ..] => Ok(UploadFormat::Png),
            [0xFF, 0xD8, 0xFF, ..] => Ok(UploadFormat::Jpeg),
            _ => Err(ImageError::UnsupportedFormat),
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            UploadFormat::Jpeg => ImageFormat::Jpeg,
            UploadFormat::Png => ImageFormat::Png,
        }
    }
}

/// An image exactly as the user submitted it.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    name: Option<String>,
    bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(name: Option<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name,
            bytes: bytes.into(),
        }
    }

    /// Client-supplied file name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn format(&self) -> Result<UploadFormat, ImageError> {
        UploadFormat::detect(&self.bytes)
    }

    /// Decode the raw bytes into a pixel buffer.
    pub fn decode(&self) -> Result<DynamicImage, ImageError> {
        let format = self.format()?;
        image::load_from_memory_with_format(&self.bytes, format.image_format())
            .map_err(|e| ImageError::DecodeFailed(e.to_string()))
    }
}

/// PNG bytes ready to be sent to the inference service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl EncodedImage {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Preprocessing applied before an image is sent for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preprocessing {
    /// Fixed 2.0x contrast enhancement.
    #[default]
    Contrast,
    /// Re-encode the decoded image as-is.
    None,
}

impl Preprocessing {
    /// Decode, optionally enhance, and encode one upload.
    pub fn prepare(&self, upload: &UploadedImage) -> Result<EncodedImage, ImageError> {
        let decoded = upload.decode()?;
        match self {
            Preprocessing::Contrast => encode(&enhance(&decoded)),
            Preprocessing::None => encode(&decoded),
        }
    }
}

/// Apply the fixed contrast enhancement.
///
/// Every colour channel is pushed away from the image's mean luminance by
/// [`CONTRAST_FACTOR`] and clamped to `0..=255`. Alpha is left untouched.
/// High bit-depth inputs are reduced to 8 bits per channel.
pub fn enhance(image: &DynamicImage) -> DynamicImage {
    let color = image.color();
    let grayscale = matches!(
        color,
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
    );

    match (grayscale, color.has_alpha()) {
        (true, false) => {
            let mut buf = image.to_luma8();
            let mean = mean_luma(buf.pixels().map(|p| p.0[0]));
            stretch(&mut buf, mean, 1);
            DynamicImage::ImageLuma8(buf)
        }
        (true, true) => {
            let mut buf = image.to_luma_alpha8();
            let mean = mean_luma(buf.pixels().map(|p| p.0[0]));
            stretch(&mut buf, mean, 1);
            DynamicImage::ImageLumaA8(buf)
        }
        (false, false) => {
            let mut buf = image.to_rgb8();
            let mean = mean_luma(buf.pixels().map(|p| luma(p.0[0], p.0[1], p.0[2])));
            stretch(&mut buf, mean, 3);
            DynamicImage::ImageRgb8(buf)
        }
        (false, true) => {
            let mut buf = image.to_rgba8();
            let mean = mean_luma(buf.pixels().map(|p| luma(p.0[0], p.0[1], p.0[2])));
            stretch(&mut buf, mean, 3);
            DynamicImage::ImageRgba8(buf)
        }
    }
}

/// Losslessly encode as PNG.
pub fn encode(image: &DynamicImage) -> Result<EncodedImage, ImageError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;

    Ok(EncodedImage {
        bytes,
        mime_type: PNG_MIME_TYPE,
    })
}

// ITU-R 601-2 luma in 16.16 fixed point.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
    l.min(255) as u8
}

fn mean_luma(values: impl Iterator<Item = u8>) -> u8 {
    let (sum, count) = values.fold((0u64, 0u64), |(s, c), v| (s + u64::from(v), c + 1));
    if count == 0 {
        return 0;
    }
    let mean = sum as f64 / count as f64;
    (mean + 0.5).floor().min(255.0) as u8
}

fn stretch<P>(buf: &mut ImageBuffer<P, Vec<u8>>, mean: u8, color_channels: usize)
where
    P: Pixel<Subpixel = u8>,
{
    let mean = f32::from(mean);
    for pixel in buf.pixels_mut() {
        for channel in pixel.channels_mut().iter_mut().take(color_channels) {
            *channel = blend(mean, *channel);
        }
    }
}

fn blend(mean: f32, value: u8) -> u8 {
    let v = mean + CONTRAST_FACTOR * (f32::from(value) - mean);
    if v <= 0.0 {
        0
    } else if v >= 255.0 {
        255
    } else {
        v as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        encode(image).unwrap().bytes
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            UploadFormat::detect(&[0x89, 0x50, 0x4E, 0x47, 0x0D]).unwrap(),
            UploadFormat::Png
        );
        assert_eq!(
            UploadFormat::detect(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap(),
            UploadFormat::Jpeg
        );
        assert!(matches!(
            UploadFormat::detect(b"GIF89a"),
            Err(ImageError::UnsupportedFormat)
        ));
        assert!(matches!(UploadFormat::detect(&[]), Err(ImageError::EmptyData)));
    }

    #[test]
    fn test_grayscale_contrast_stretches_around_mean() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([100]));
        img.put_pixel(1, 0, Luma([200]));

        let out = enhance(&DynamicImage::ImageLuma8(img)).to_luma8();

        // mean 150: 150 + 2 * (100 - 150) = 50, 150 + 2 * (200 - 150) = 250
        assert_eq!(out.get_pixel(0, 0).0, [50]);
        assert_eq!(out.get_pixel(1, 0).0, [250]);
    }

    #[test]
    fn test_rgb_contrast_uses_luma_mean() {
        let img = RgbImage::from_pixel(1, 1, Rgb([10, 20, 30]));

        let out = enhance(&DynamicImage::ImageRgb8(img)).to_rgb8();

        // luma(10, 20, 30) = 18
        assert_eq!(out.get_pixel(0, 0).0, [2, 22, 42]);
    }

    #[test]
    fn test_contrast_clamps() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([0]));
        img.put_pixel(1, 0, Luma([255]));

        let out = enhance(&DynamicImage::ImageLuma8(img)).to_luma8();

        assert_eq!(out.get_pixel(0, 0).0, [0]);
        assert_eq!(out.get_pixel(1, 0).0, [255]);
    }

    #[test]
    fn test_alpha_is_preserved() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([100, 100, 100, 17]));
        img.put_pixel(1, 0, Rgba([200, 200, 200, 230]));

        let out = enhance(&DynamicImage::ImageRgba8(img));

        assert_eq!(out.color(), ColorType::Rgba8);
        let out = out.to_rgba8();
        assert_eq!(out.get_pixel(0, 0).0, [50, 50, 50, 17]);
        assert_eq!(out.get_pixel(1, 0).0, [250, 250, 250, 230]);
    }

    #[test]
    fn test_enhance_is_deterministic() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 13) as u8, (y * 7) as u8, ((x + y) * 5) as u8])
        }));

        let first = enhance(&img);
        let second = enhance(&img);

        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_encode_declares_png() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([1, 2, 3])));

        let encoded = encode(&img).unwrap();

        assert_eq!(encoded.mime_type, "image/png");
        assert_eq!(&encoded.bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn test_prepare_jpeg_upload_yields_png() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([90, 120, 200])));
        let mut jpeg = Vec::new();
        img.write_to(&mut Cursor::new(&mut jpeg), ImageOutputFormat::Jpeg(85))
            .unwrap();

        let upload = UploadedImage::new(Some("photo.jpg".into()), jpeg);
        assert_eq!(upload.format().unwrap(), UploadFormat::Jpeg);

        let encoded = Preprocessing::Contrast.prepare(&upload).unwrap();
        assert_eq!(encoded.mime_type, PNG_MIME_TYPE);
        assert!(UploadFormat::detect(&encoded.bytes).unwrap() == UploadFormat::Png);
    }

    #[test]
    fn test_prepare_without_enhancement_keeps_pixels() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([10, 20, 30])));
        let upload = UploadedImage::new(None, png_bytes(&img));

        let encoded = Preprocessing::None.prepare(&upload).unwrap();
        let roundtrip = image::load_from_memory(&encoded.bytes).unwrap().to_rgb8();

        assert_eq!(roundtrip.get_pixel(1, 1).0, [10, 20, 30]);
    }

    #[test]
    fn test_truncated_png_fails_to_decode() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        let mut bytes = png_bytes(&img);
        bytes.truncate(12);

        let upload = UploadedImage::new(None, bytes);

        assert!(matches!(upload.decode(), Err(ImageError::DecodeFailed(_))));
    }
}
