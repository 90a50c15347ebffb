//! Unified error codes for the storefront
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Catalog errors
//! - 2xxx: Content errors
//! - 3xxx: Media errors
//! - 4xxx: Sales errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Codes serialize as bare `u16` values so the front end can switch on them
/// without string parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 1001,
    /// Product slug already exists
    ProductSlugExists = 1002,
    /// Product has invalid price
    ProductInvalidPrice = 1003,
    /// Category not found
    CategoryNotFound = 1101,
    /// Category parent is missing or belongs to another scope
    CategoryParentInvalid = 1102,
    /// Category move would create a cycle
    CategoryCycle = 1103,
    /// Tag key already used by another category in the same scope
    CategoryTagKeyExists = 1104,
    /// Category merge request is invalid
    CategoryMergeInvalid = 1105,

    // ==================== 2xxx: Content ====================
    /// Banner not found
    BannerNotFound = 2001,
    /// Banner schedule window is invalid
    BannerScheduleInvalid = 2002,
    /// Blog post not found
    PostNotFound = 2101,
    /// Blog post slug already exists
    PostSlugExists = 2102,

    // ==================== 3xxx: Media ====================
    /// Media asset not found
    MediaNotFound = 3001,
    /// File too large
    FileTooLarge = 3002,
    /// Unsupported file format
    UnsupportedFileFormat = 3003,
    /// Invalid/corrupted image file
    InvalidImageFile = 3004,
    /// No file provided in request
    NoFileProvided = 3005,
    /// Image processing failed
    ImageProcessingFailed = 3006,
    /// Object storage write failed
    FileStorageFailed = 3007,

    // ==================== 4xxx: Sales ====================
    /// Sales order not found
    OrderNotFound = 4001,
    /// Order number already exists
    OrderNumberExists = 4002,
    /// Sales import could not be read at all
    OrderImportFailed = 4003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductSlugExists => "Product slug already exists",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryParentInvalid => {
                "Parent category must exist and belong to the same scope"
            }
            ErrorCode::CategoryCycle => "Category cannot be nested under itself",
            ErrorCode::CategoryTagKeyExists => "Tag key already used in this scope",
            ErrorCode::CategoryMergeInvalid => "Invalid category merge",

            // Content
            ErrorCode::BannerNotFound => "Banner not found",
            ErrorCode::BannerScheduleInvalid => "Banner must end after it starts",
            ErrorCode::PostNotFound => "Post not found",
            ErrorCode::PostSlugExists => "Post slug already exists",

            // Media
            ErrorCode::MediaNotFound => "Media asset not found",
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::ImageProcessingFailed => "Image processing failed",
            ErrorCode::FileStorageFailed => "File storage failed",

            // Sales
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderNumberExists => "Order number already exists",
            ErrorCode::OrderImportFailed => "Sales import failed",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown `u16` into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Catalog
            1001 => Ok(ErrorCode::ProductNotFound),
            1002 => Ok(ErrorCode::ProductSlugExists),
            1003 => Ok(ErrorCode::ProductInvalidPrice),
            1101 => Ok(ErrorCode::CategoryNotFound),
            1102 => Ok(ErrorCode::CategoryParentInvalid),
            1103 => Ok(ErrorCode::CategoryCycle),
            1104 => Ok(ErrorCode::CategoryTagKeyExists),
            1105 => Ok(ErrorCode::CategoryMergeInvalid),

            // Content
            2001 => Ok(ErrorCode::BannerNotFound),
            2002 => Ok(ErrorCode::BannerScheduleInvalid),
            2101 => Ok(ErrorCode::PostNotFound),
            2102 => Ok(ErrorCode::PostSlugExists),

            // Media
            3001 => Ok(ErrorCode::MediaNotFound),
            3002 => Ok(ErrorCode::FileTooLarge),
            3003 => Ok(ErrorCode::UnsupportedFileFormat),
            3004 => Ok(ErrorCode::InvalidImageFile),
            3005 => Ok(ErrorCode::NoFileProvided),
            3006 => Ok(ErrorCode::ImageProcessingFailed),
            3007 => Ok(ErrorCode::FileStorageFailed),

            // Sales
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderNumberExists),
            4003 => Ok(ErrorCode::OrderImportFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);

        assert_eq!(ErrorCode::ProductNotFound.code(), 1001);
        assert_eq!(ErrorCode::CategoryNotFound.code(), 1101);
        assert_eq!(ErrorCode::CategoryCycle.code(), 1103);
        assert_eq!(ErrorCode::CategoryMergeInvalid.code(), 1105);

        assert_eq!(ErrorCode::BannerNotFound.code(), 2001);
        assert_eq!(ErrorCode::PostSlugExists.code(), 2102);

        assert_eq!(ErrorCode::FileTooLarge.code(), 3002);
        assert_eq!(ErrorCode::OrderImportFailed.code(), 4003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::InternalError.is_success());
    }

    #[test]
    fn test_try_from_round_trips_every_listed_code() {
        let all = [
            ErrorCode::Success,
            ErrorCode::ProductSlugExists,
            ErrorCode::CategoryParentInvalid,
            ErrorCode::CategoryTagKeyExists,
            ErrorCode::BannerScheduleInvalid,
            ErrorCode::PostNotFound,
            ErrorCode::MediaNotFound,
            ErrorCode::FileStorageFailed,
            ErrorCode::OrderNumberExists,
            ErrorCode::ConfigError,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(6001), Err(InvalidErrorCode(6001)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::CategoryCycle).unwrap();
        assert_eq!(json, "1103");
        let code: ErrorCode = serde_json::from_str("4001").unwrap();
        assert_eq!(code, ErrorCode::OrderNotFound);
    }
}
