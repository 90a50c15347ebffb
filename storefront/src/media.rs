//! Image upload processing
//!
//! Validates an uploaded image, keeps the original bytes, and renders the
//! downscaled JPEG variants stored beside it. Pure CPU work; callers run it
//! on the blocking pool.

use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use sha2::{Digest, Sha256};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::media::{ImageVariant, variant_path};

/// JPEG quality for generated variants
const JPEG_QUALITY: u8 = 85;

/// Supported image formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// One object to write to the bucket
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of processing one upload
#[derive(Debug, Clone)]
pub struct ProcessedUpload {
    /// SHA-256 of the uploaded bytes (hex)
    pub hash: String,
    pub width: u32,
    pub height: u32,
    /// The untouched upload; its key is the asset path
    pub original: StoredObject,
    pub variants: Vec<StoredObject>,
}

impl ProcessedUpload {
    /// Every object to store, original first
    pub fn objects(&self) -> impl Iterator<Item = &StoredObject> {
        std::iter::once(&self.original).chain(self.variants.iter())
    }
}

/// SHA-256 of uploaded bytes (hex)
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Lowercased extension of an uploaded file name
fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Object key of the original: `products/{hash}/original.{ext}`
pub fn original_key(hash: &str, ext: &str) -> String {
    format!("products/{hash}/original.{ext}")
}

fn encode_jpeg(img: &DynamicImage) -> AppResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    img.to_rgb8().write_with_encoder(encoder).map_err(|e| {
        AppError::with_message(
            ErrorCode::ImageProcessingFailed,
            format!("Image compression failed: {e}"),
        )
    })?;
    Ok(buffer)
}

/// Downscale to `max_width`, keeping the aspect ratio. Narrower images are
/// left at their own size.
fn fit_width(img: &DynamicImage, max_width: u32) -> DynamicImage {
    if img.width() <= max_width {
        return img.clone();
    }
    let height = (u64::from(img.height()) * u64::from(max_width) / u64::from(img.width())).max(1);
    img.resize_exact(max_width, height as u32, FilterType::Lanczos3)
}

/// Validate and render an upload.
pub fn process_upload(
    data: Vec<u8>,
    filename: &str,
    max_bytes: usize,
) -> AppResult<ProcessedUpload> {
    if data.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::NoFileProvided,
            "Empty file provided",
        ));
    }
    if data.len() > max_bytes {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("File too large: {} bytes (max {max_bytes})", data.len()),
        )
        .with_detail("max_bytes", max_bytes as u64));
    }

    let ext = file_extension(filename).unwrap_or_default();
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!(
                "Unsupported file format '{ext}'. Supported: {}",
                SUPPORTED_FORMATS.join(", ")
            ),
        ));
    }

    let img = image::load_from_memory(&data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image: {e}"))
    })?;

    let hash = content_hash(&data);
    let key = original_key(&hash, &ext);

    let mut variants = Vec::with_capacity(ImageVariant::GENERATED.len());
    for variant in ImageVariant::GENERATED {
        let (Some(max_width), Some(variant_key)) =
            (variant.max_width(), variant_path(&key, variant))
        else {
            continue;
        };
        variants.push(StoredObject {
            key: variant_key,
            content_type: "image/jpeg".to_string(),
            bytes: encode_jpeg(&fit_width(&img, max_width))?,
        });
    }

    let content_type = mime_guess::from_ext(&ext)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(ProcessedUpload {
        hash,
        width: img.width(),
        height: img.height(),
        original: StoredObject {
            key,
            content_type,
            bytes: data,
        },
        variants,
    })
}
