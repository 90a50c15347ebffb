//! Shared types for the Telar storefront
//!
//! Domain models, the unified error system, and the pure catalog logic
//! (tag/category resolution, category trees, search, image variants) used by
//! the storefront service.

pub mod catalog;
pub mod error;
pub mod media;
pub mod models;
pub mod util;
