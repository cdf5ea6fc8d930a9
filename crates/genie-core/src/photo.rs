//! Photo preparation before upload.
//!
//! JPEG, PNG, WebP and GIF are forwarded as-is unless they exceed the
//! configured bound, in which case they are shrunk (aspect ratio kept) and
//! re-encoded as JPEG. Any other format (BMP, TIFF, ...) is always converted
//! to JPEG, since providers only accept those four media types.

use crate::config::PhotoConfig;
use crate::error::PhotoError;
use crate::llm::ImageInput;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Format identifier understood by `ImageInput::from_bytes`, for formats
/// providers accept directly.
fn format_id(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("jpeg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Gif => Some("gif"),
        _ => None,
    }
}

/// Turn raw photo bytes into an upload-ready `ImageInput`.
pub fn prepare(bytes: &[u8], config: &PhotoConfig) -> Result<ImageInput, PhotoError> {
    if bytes.is_empty() {
        return Err(PhotoError::Empty);
    }

    let sniffed = image::guess_format(bytes).ok();
    let accepted = sniffed.and_then(format_id);

    if let (Some(id), false) = (accepted, config.downscale) {
        return Ok(ImageInput::from_bytes(bytes, id));
    }

    let decoded = match (image::load_from_memory(bytes), accepted) {
        (Ok(img), _) => img,
        (Err(e), Some(id)) => {
            tracing::warn!("Photo could not be decoded ({e}); sending it unmodified");
            return Ok(ImageInput::from_bytes(bytes, id));
        }
        (Err(e), None) => {
            let what = sniffed.map_or_else(|| "unrecognized data".to_string(), |f| format!("{f:?}"));
            return Err(PhotoError::Unsupported(format!("{what} ({e})")));
        }
    };

    let max = config.max_dimension;
    let fits = decoded.width() <= max && decoded.height() <= max;
    if let (Some(id), true) = (accepted, fits) {
        return Ok(ImageInput::from_bytes(bytes, id));
    }

    let prepared = if fits || !config.downscale {
        tracing::debug!("Converting {sniffed:?} photo to JPEG");
        decoded
    } else {
        let resized = decoded.thumbnail(max, max);
        tracing::debug!(
            "Downscaled photo {}x{} -> {}x{}",
            decoded.width(),
            decoded.height(),
            resized.width(),
            resized.height()
        );
        resized
    };
    let jpeg = encode_jpeg(&prepared, config.jpeg_quality)?;
    Ok(ImageInput::from_bytes(&jpeg, "jpeg"))
}

/// Read a photo from disk and prepare it.
pub async fn prepare_file(
    path: &std::path::Path,
    config: &PhotoConfig,
) -> crate::error::Result<ImageInput> {
    let bytes = tokio::fs::read(path).await?;
    Ok(prepare(&bytes, config)?)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, PhotoError> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| PhotoError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}
