//! Database access layer
//!
//! Enum and array columns are read through private row structs and mapped
//! into the shared models.

pub mod banner;
pub mod category;
pub mod media;
pub mod post;
pub mod product;
pub mod sales_order;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// True for Postgres `unique_violation` (23505).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == "23505")
}
