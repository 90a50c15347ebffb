//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Stock situation shown on the storefront
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    InStock,
    /// Crafted after the order is placed
    MadeToOrder,
    SoldOut,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::MadeToOrder => "made_to_order",
            Availability::SoldOut => "sold_out",
        }
    }

    /// Parse the stored column value. Unknown values read as `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_stock" => Some(Availability::InStock),
            "made_to_order" => Some(Availability::MadeToOrder),
            "sold_out" => Some(Availability::SoldOut),
            _ => None,
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed product metadata (materials, sizes, care instructions...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub materials: Vec<String>,
    pub dimensions: Option<String>,
    pub care: Option<String>,
    pub origin: Option<String>,
    /// Days to craft a made-to-order piece
    pub lead_time_days: Option<u16>,
}

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Free-text tags; matched case-insensitively against category tag keys
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Display category, filled in by the catalog resolver
    pub category: Option<String>,
    /// Stored image paths (object-store keys), first one is the cover
    #[serde(default, deserialize_with = "null_as_default")]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub availability: Availability,
    /// Higher first on the storefront
    pub priority: i32,
    pub is_active: bool,
    #[serde(default)]
    pub metadata: ProductMetadata,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    /// Generated from the name when absent
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gallery: Vec<String>,
    pub availability: Option<Availability>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
    pub metadata: Option<ProductMetadata>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub category: Option<Option<String>>,
    pub gallery: Option<Vec<String>>,
    pub availability: Option<Availability>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
    pub metadata: Option<ProductMetadata>,
}

/// One entry of a product reorder request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPriority {
    pub id: String,
    pub priority: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_null_tags_read_as_empty() {
        let json = r#"{
            "id": "1", "name": "Cojín", "slug": "cojin", "description": null,
            "price": "24.50", "tags": null, "category": null, "gallery": null,
            "priority": 0, "is_active": true, "created_at": 0, "updated_at": 0
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.tags.is_empty());
        assert!(product.gallery.is_empty());
        assert_eq!(product.availability, Availability::InStock);
        assert_eq!(product.metadata, ProductMetadata::default());
    }

    #[test]
    fn test_availability_round_trip() {
        for a in [
            Availability::InStock,
            Availability::MadeToOrder,
            Availability::SoldOut,
        ] {
            assert_eq!(Availability::parse(a.as_str()), Some(a));
        }
        assert_eq!(Availability::parse("backorder"), None);
    }

    #[test]
    fn test_update_null_clears_description() {
        let update: ProductUpdate =
            serde_json::from_str(r#"{"description": null, "price": "12.00"}"#).unwrap();
        assert_eq!(update.description, Some(None));
        assert_eq!(update.category, None);
    }
}
