//! Data models
//!
//! Shared between the storefront service and its API consumers.
//! Row-compatible types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`;
//! types with enum or array columns are mapped by row structs in the service.
//! All IDs are opaque strings.

pub mod banner;
pub mod category;
pub mod media;
pub mod post;
pub mod product;
pub mod sales_order;

// Re-exports
pub use banner::*;
pub use category::*;
pub use media::*;
pub use post::*;
pub use product::*;
pub use sales_order::*;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Whole digits a stored amount may carry (`NUMERIC(12, 2)` columns)
const MONEY_INTEGER_DIGITS: u32 = 10;

/// True when `amount`, rounded to cents, fits a money column.
pub fn money_in_range(amount: Decimal) -> bool {
    amount.round_dp(2).abs() < Decimal::from(10_i64.pow(MONEY_INTEGER_DIGITS))
}

/// Deserialize `null` as `T::default()`.
///
/// Used on list fields fed by loosely typed admin forms, where a missing and
/// a null value both mean "empty".
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Pair with `#[serde(default)]` on update payloads where `null` clears a value.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim, drop empties, and de-duplicate case-insensitively, keeping the
/// first spelling of each tag.
pub fn clean_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let trimmed = tag.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_in_range() {
        use std::str::FromStr;
        let dec = |s: &str| Decimal::from_str(s).unwrap();
        assert!(money_in_range(dec("9999999999.99")));
        assert!(money_in_range(dec("-9999999999.99")));
        assert!(money_in_range(Decimal::ZERO));
        assert!(!money_in_range(dec("10000000000")));
        // rounds up past the limit
        assert!(!money_in_range(dec("9999999999.999")));
        assert!(!money_in_range(dec("123456789012.00")));
    }

    #[test]
    fn test_clean_tags() {
        let tags = clean_tags(["  Bordados ", "bordados", "", "Rayas", "   "]);
        assert_eq!(tags, vec!["Bordados".to_string(), "Rayas".to_string()]);
    }
}
