// src/transcode.rs
use crate::negotiate::OutputFormat;
use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

pub const DEFAULT_JPEG_QUALITY: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeOptions {
    /// Target width in pixels, `0` keeps the native size.
    pub width: u32,
    /// 1-100, `0` picks the encoder default.
    pub quality: u8,
    pub format: OutputFormat,
}

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Cannot read image metadata: {0}")]
    Metadata(String),

    #[error("Cannot decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Cannot encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Transcode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The image processing capability used by the proxy. Errors are opaque to
/// callers: any failure means the request cannot be served.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn metadata(&self, source: Bytes) -> Result<ImageMetadata, TranscodeError>;

    async fn transcode(&self, source: Bytes, options: TranscodeOptions) -> Result<Bytes, TranscodeError>;
}

/// Default gateway backed by the `image` crate. Work runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTranscoder;

#[async_trait]
impl Transcoder for ImageTranscoder {
    async fn metadata(&self, source: Bytes) -> Result<ImageMetadata, TranscodeError> {
        tokio::task::spawn_blocking(move || read_metadata(&source)).await?
    }

    async fn transcode(&self, source: Bytes, options: TranscodeOptions) -> Result<Bytes, TranscodeError> {
        tokio::task::spawn_blocking(move || transcode_blocking(&source, options))
            .await?
            .map(Bytes::from)
    }
}

/// Reads the header only, the pixels are left alone.
fn read_metadata(source: &[u8]) -> Result<ImageMetadata, TranscodeError> {
    let (width, height) = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| TranscodeError::Metadata(e.to_string()))?
        .into_dimensions()
        .map_err(|e| TranscodeError::Metadata(e.to_string()))?;
    Ok(ImageMetadata { width, height })
}

fn transcode_blocking(source: &[u8], options: TranscodeOptions) -> Result<Vec<u8>, TranscodeError> {
    let img = image::load_from_memory(source).map_err(TranscodeError::Decode)?;
    let img = resize_to_width(img, options.width);

    let mut out = Vec::new();
    match options.format {
        OutputFormat::WebP => {
            // The `image` WebP encoder is lossless only, quality does not apply.
            let rgba = img.to_rgba8();
            WebPEncoder::new_lossless(&mut out).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )
        }
        OutputFormat::Jpeg => {
            let quality = match options.quality {
                0 => DEFAULT_JPEG_QUALITY,
                q => q.min(100),
            };
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut out, quality).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::Png => img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png),
    }
    .map_err(TranscodeError::Encode)?;

    Ok(out)
}

fn resize_to_width(img: DynamicImage, width: u32) -> DynamicImage {
    if width == 0 || width == img.width() || img.width() == 0 {
        return img;
    }
    let height = u64::from(img.height()) * u64::from(width) / u64::from(img.width());
    let height = u32::try_from(height.max(1)).unwrap_or(u32::MAX);
    img.resize_exact(width, height, FilterType::Lanczos3)
}
