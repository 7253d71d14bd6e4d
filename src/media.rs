use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

use crate::error::{ApiError, ApiResult};

/// Upload size ceiling: 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Stored images are bounded to fit within this square, aspect preserved.
pub const MAX_DIMENSION: u32 = 1920;

// Declared content types accepted on upload. SVG is the one vector format and
// bypasses the raster pipeline.
const ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
    "image/svg+xml",
];

const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "svg"];

/// ProcessedImage
///
/// The normalized artifact produced by the ingestion pipeline: bounded
/// dimensions, predictable encoding, and the extension/content type the
/// storage layer should record.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub extension: String,
    pub content_type: String,
}

pub fn is_allowed_type(content_type: &str) -> bool {
    ALLOWED_TYPES.contains(&content_type)
}

/// Rejects uploads over the size ceiling before any decoding work happens.
pub fn ensure_upload_size(len: usize) -> ApiResult<()> {
    if len > MAX_UPLOAD_BYTES {
        return Err(ApiError::Validation(
            "File size too large. Maximum size is 10MB".to_string(),
        ));
    }
    Ok(())
}

/// process_upload
///
/// Normalizes an arbitrary accepted image into a bounded, predictable storage
/// footprint. Raster formats are decoded, flattened onto a white background
/// (transparency does not survive JPEG), downsampled to fit within
/// 1920x1920 preserving aspect ratio, and re-encoded: JPEG quality 85 for
/// photographic input, lossless PNG for everything else. SVG passes through
/// untouched.
pub fn process_upload(
    bytes: &[u8],
    content_type: &str,
    filename: Option<&str>,
) -> ApiResult<ProcessedImage> {
    if !is_allowed_type(content_type) {
        return Err(ApiError::Validation(format!(
            "Unsupported file type: {}. Supported formats: JPEG, PNG, GIF, WebP, BMP, TIFF, SVG",
            content_type
        )));
    }
    ensure_upload_size(bytes.len())?;

    let extension = extension_for(content_type, filename);

    if content_type == "image/svg+xml" {
        return Ok(ProcessedImage {
            bytes: bytes.to_vec(),
            extension,
            content_type: content_type.to_string(),
        });
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| {
            tracing::warn!("image decode failed: {:?}", e);
            ApiError::Validation("Invalid or corrupted image file".to_string())
        })?;

    let flattened = flatten_onto_white(decoded);
    let bounded = if flattened.width() > MAX_DIMENSION || flattened.height() > MAX_DIMENSION {
        image::imageops::resize(
            &flattened,
            // resize() scales to the exact box; compute the fitted box first.
            fitted_width(flattened.width(), flattened.height()),
            fitted_height(flattened.width(), flattened.height()),
            FilterType::Lanczos3,
        )
    } else {
        flattened
    };

    let photographic = content_type == "image/jpeg" || content_type == "image/jpg";
    let mut out = Vec::new();
    if photographic {
        let encoder = JpegEncoder::new_with_quality(&mut out, 85);
        bounded
            .write_with_encoder(encoder)
            .map_err(|e| ApiError::Upstream(format!("jpeg encode: {}", e)))?;
    } else {
        let encoder = PngEncoder::new(&mut out);
        bounded
            .write_with_encoder(encoder)
            .map_err(|e| ApiError::Upstream(format!("png encode: {}", e)))?;
    }

    Ok(ProcessedImage {
        bytes: out,
        extension,
        content_type: if photographic {
            "image/jpeg".to_string()
        } else {
            "image/png".to_string()
        },
    })
}

fn fitted_width(width: u32, height: u32) -> u32 {
    if width >= height {
        MAX_DIMENSION
    } else {
        // Scale down proportionally to the bounded height.
        ((width as u64 * MAX_DIMENSION as u64) / height as u64).max(1) as u32
    }
}

fn fitted_height(width: u32, height: u32) -> u32 {
    if height >= width {
        MAX_DIMENSION
    } else {
        ((height as u64 * MAX_DIMENSION as u64) / width as u64).max(1) as u32
    }
}

/// Composites any alpha channel onto a white background, yielding opaque RGB.
fn flatten_onto_white(img: DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut canvas = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = px[3] as u32;
        let target = canvas.get_pixel_mut(x, y);
        for channel in 0..3 {
            target[channel] =
                ((px[channel] as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        }
    }
    canvas
}

/// Picks the stored file extension: the original filename's extension when it
/// is one we recognize, otherwise derived from the declared content type.
fn extension_for(content_type: &str, filename: Option<&str>) -> String {
    if let Some(name) = filename {
        if let Some(ext) = name.rsplit('.').next() {
            let ext = ext.to_lowercase();
            if name.contains('.') && KNOWN_EXTENSIONS.contains(&ext.as_str()) {
                return ext;
            }
        }
    }
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg".to_string(),
        "image/svg+xml" => "svg".to_string(),
        _ => "png".to_string(),
    }
}

/// placeholder_png
///
/// Neutral solid placeholder served at GET /placeholder/{w}x{h}. Dimensions
/// are clamped to 50..=1200 to prevent abuse. Encoding failures degrade to an
/// empty body rather than an error page.
pub fn placeholder_png(width: u32, height: u32) -> Vec<u8> {
    let width = width.clamp(50, 1200);
    let height = height.clamp(50, 1200);

    // Neutral gray (#f3f4f6).
    let img = RgbImage::from_pixel(width, height, Rgb([0xf3, 0xf4, 0xf6]));

    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    if let Err(e) = img.write_with_encoder(encoder) {
        tracing::error!("placeholder encode failed: {:?}", e);
        return Vec::new();
    }
    out
}
