//! Image variant naming
//!
//! Uploads store the original under its key and derived JPEGs beside it:
//! `dir/stem.ext` -> `dir/stem_thumb.jpg`, `dir/stem_medium.jpg`,
//! `dir/stem_full.jpg`. Absolute URLs are external images and are never
//! rewritten.

use serde::{Deserialize, Serialize};

/// A stored rendition of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageVariant {
    Thumb,
    Medium,
    Full,
    Original,
}

impl ImageVariant {
    /// Variants produced at upload time, smallest first
    pub const GENERATED: [ImageVariant; 3] =
        [ImageVariant::Thumb, ImageVariant::Medium, ImageVariant::Full];

    /// Target width in pixels; `None` for the untouched original.
    pub fn max_width(&self) -> Option<u32> {
        match self {
            ImageVariant::Thumb => Some(320),
            ImageVariant::Medium => Some(768),
            ImageVariant::Full => Some(1600),
            ImageVariant::Original => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageVariant::Thumb => "thumb",
            ImageVariant::Medium => "medium",
            ImageVariant::Full => "full",
            ImageVariant::Original => "original",
        }
    }
}

fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//")
}

/// Object key of `variant` for a stored image path.
///
/// Returns `None` for a blank path. Absolute URLs and the original variant
/// come back unchanged.
pub fn variant_path(path: &str, variant: ImageVariant) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if variant == ImageVariant::Original || is_absolute_url(path) {
        return Some(path.to_string());
    }

    let (dir, file) = match path.rfind('/') {
        Some(i) => path.split_at(i + 1),
        None => ("", path),
    };
    let stem = match file.rfind('.') {
        Some(i) if i > 0 => &file[..i],
        _ => file,
    };
    Some(format!("{dir}{stem}_{}.jpg", variant.as_str()))
}

/// Public URL of a variant under `base_url` (the bucket's public origin).
pub fn resolve_variant_url(base_url: &str, path: &str, variant: ImageVariant) -> Option<String> {
    let key = variant_path(path, variant)?;
    if is_absolute_url(&key) {
        return Some(key);
    }
    Some(format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    ))
}

/// Every rendition of one image, as sent to the storefront
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSet {
    pub thumb: String,
    pub medium: String,
    pub full: String,
    pub original: String,
}

impl ImageSet {
    /// `None` for a blank path.
    pub fn resolve(base_url: &str, path: &str) -> Option<Self> {
        Some(Self {
            thumb: resolve_variant_url(base_url, path, ImageVariant::Thumb)?,
            medium: resolve_variant_url(base_url, path, ImageVariant::Medium)?,
            full: resolve_variant_url(base_url, path, ImageVariant::Full)?,
            original: resolve_variant_url(base_url, path, ImageVariant::Original)?,
        })
    }
}
