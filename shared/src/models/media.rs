//! Media Asset Model

use serde::{Deserialize, Serialize};

/// Uploaded image stored in the object store
///
/// `path` is the key of the original; variants live beside it (see
/// [`crate::media::variant_path`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MediaAsset {
    pub id: String,
    /// SHA-256 of the uploaded bytes (hex)
    pub hash: String,
    pub path: String,
    pub original_filename: Option<String>,
    pub content_type: String,
    pub width: i32,
    pub height: i32,
    pub size_bytes: i64,
    pub created_at: i64,
}
