//! Tag/category resolution
//!
//! Products carry free-text tags; selectable categories carry a `tag_key`.
//! Both sides are compared after [`normalize_tag`].
//!
//! Precedence when several categories share a key: header categories are
//! indexed before filter categories, and within a list the first occurrence
//! wins. Later duplicates are recorded in [`TagIndex::duplicate_keys`] so the
//! caller can log them; writes reject duplicates within a scope.

use std::collections::{HashMap, HashSet};

use crate::models::{Category, Product};

/// Trim and lowercase a tag or tag key.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Normalized tag key -> category name lookup
#[derive(Debug, Clone, Default)]
pub struct TagIndex<'a> {
    names: HashMap<String, &'a str>,
    duplicates: Vec<String>,
}

impl<'a> TagIndex<'a> {
    pub fn new(header: &'a [Category], filter: &'a [Category]) -> Self {
        let mut names = HashMap::new();
        let mut duplicates: Vec<String> = Vec::new();

        for category in header.iter().chain(filter) {
            let Some(key) = category.normalized_tag_key() else {
                continue;
            };
            match names.entry(key) {
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(category.name.as_str());
                }
                std::collections::hash_map::Entry::Occupied(slot) => {
                    if !duplicates.contains(slot.key()) {
                        duplicates.push(slot.key().clone());
                    }
                }
            }
        }

        Self { names, duplicates }
    }

    /// Category name for a raw product tag.
    pub fn lookup(&self, tag: &str) -> Option<&'a str> {
        let key = normalize_tag(tag);
        if key.is_empty() {
            return None;
        }
        self.names.get(&key).copied()
    }

    /// First tag (in product order) that names a category, else the
    /// product's existing category.
    pub fn resolve(&self, product: &Product) -> Option<String> {
        product
            .tags
            .iter()
            .find_map(|tag| self.lookup(tag))
            .map(str::to_string)
            .or_else(|| product.category.clone())
    }

    /// Keys claimed by more than one category, in discovery order.
    pub fn duplicate_keys(&self) -> &[String] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Display category for one product.
///
/// Returns the first matching category name, the product's own `category`
/// when nothing matches, or `None`.
pub fn resolve_display_category(
    product: &Product,
    header: &[Category],
    filter: &[Category],
) -> Option<String> {
    TagIndex::new(header, filter).resolve(product)
}

/// Overwrite `category` on every product, building the index once.
pub fn apply_display_categories(
    products: &mut [Product],
    header: &[Category],
    filter: &[Category],
) {
    let index = TagIndex::new(header, filter);
    if !index.duplicate_keys().is_empty() {
        tracing::warn!(
            keys = ?index.duplicate_keys(),
            "Tag keys claimed by several categories, first match wins"
        );
    }
    for product in products.iter_mut() {
        product.category = index.resolve(product);
    }
}

/// Products carrying at least one of the selected tag keys.
///
/// OR semantics: each selected key widens the result. Relative order is
/// preserved. Blank keys are ignored, and a selection with no usable key
/// returns every product.
pub fn filter_products_by_tags<'a, S: AsRef<str>>(
    products: &'a [Product],
    selected_tag_keys: &[S],
) -> Vec<&'a Product> {
    let keys: HashSet<String> = selected_tag_keys
        .iter()
        .map(|k| normalize_tag(k.as_ref()))
        .filter(|k| !k.is_empty())
        .collect();

    if keys.is_empty() {
        return products.iter().collect();
    }

    products
        .iter()
        .filter(|p| p.tags.iter().any(|t| keys.contains(&normalize_tag(t))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryScope;
    use rust_decimal::Decimal;

    fn product(id: &str, tags: &[&str], category: Option<&str>) -> Product {
        Product {
            id: id.into(),
            name: format!("Product {id}"),
            slug: id.into(),
            description: None,
            price: Decimal::ZERO,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: category.map(str::to_string),
            gallery: vec![],
            availability: Default::default(),
            priority: 0,
            is_active: true,
            metadata: Default::default(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn category(id: &str, scope: CategoryScope, name: &str, tag_key: Option<&str>) -> Category {
        Category {
            id: id.into(),
            scope,
            name: name.into(),
            tag_key: tag_key.map(str::to_string),
            parent_id: None,
            sort_order: 0,
        }
    }

    #[test]
    fn test_first_matching_tag_wins() {
        let filter = vec![
            category("f1", CategoryScope::Filter, "Rayas", Some("rayas")),
            category("f2", CategoryScope::Filter, "Bordados a Mano", Some("Bordados")),
        ];
        let p = product("p1", &["Bordados", "Rayas"], None);
        assert_eq!(
            resolve_display_category(&p, &[], &filter).as_deref(),
            Some("Bordados a Mano")
        );
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let filter = vec![category("f1", CategoryScope::Filter, "Para el hogar", Some("De Home"))];
        let p = product("p1", &["  de home "], None);
        assert_eq!(
            resolve_display_category(&p, &[], &filter).as_deref(),
            Some("Para el hogar")
        );
    }

    #[test]
    fn test_fallback_to_existing_category() {
        let filter = vec![category("f1", CategoryScope::Filter, "Rayas", Some("rayas"))];
        let p = product("p1", &["lisos"], Some("Textiles"));
        assert_eq!(
            resolve_display_category(&p, &[], &filter).as_deref(),
            Some("Textiles")
        );
        let p = product("p2", &[], None);
        assert_eq!(resolve_display_category(&p, &[], &filter), None);
    }

    #[test]
    fn test_header_takes_precedence_over_filter() {
        let header = vec![category("h1", CategoryScope::Header, "Hogar", Some("home"))];
        let filter = vec![category("f1", CategoryScope::Filter, "Casa", Some("HOME"))];
        let index = TagIndex::new(&header, &filter);
        assert_eq!(index.lookup("Home"), Some("Hogar"));
        assert_eq!(index.duplicate_keys(), &["home".to_string()]);
    }

    #[test]
    fn test_grouping_nodes_are_not_indexed() {
        let filter = vec![
            category("f1", CategoryScope::Filter, "Colores", None),
            category("f2", CategoryScope::Filter, "Vacío", Some("  ")),
        ];
        let index = TagIndex::new(&[], &filter);
        assert!(index.is_empty());
        assert_eq!(index.lookup(""), None);
    }

    #[test]
    fn test_apply_display_categories() {
        let filter = vec![category("f1", CategoryScope::Filter, "Cestas", Some("cesta"))];
        let mut products = vec![
            product("p1", &["Cesta"], None),
            product("p2", &["bolso"], Some("Bolsos")),
        ];
        apply_display_categories(&mut products, &[], &filter);
        assert_eq!(products[0].category.as_deref(), Some("Cestas"));
        assert_eq!(products[1].category.as_deref(), Some("Bolsos"));
    }

    #[test]
    fn test_filter_is_or_and_order_preserving() {
        let products = vec![
            product("p1", &["A"], None),
            product("p2", &["B"], None),
            product("p3", &["A", "B"], None),
            product("p4", &["C"], None),
        ];
        let ids = |v: Vec<&Product>| v.into_iter().map(|p| p.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(filter_products_by_tags(&products, &["a"])), ["p1", "p3"]);
        assert_eq!(
            ids(filter_products_by_tags(&products, &["C", "b"])),
            ["p2", "p3", "p4"]
        );
    }

    #[test]
    fn test_empty_or_blank_selection_is_identity() {
        let products = vec![product("p1", &["A"], None), product("p2", &[], None)];
        let none: [&str; 0] = [];
        assert_eq!(filter_products_by_tags(&products, &none).len(), 2);
        assert_eq!(filter_products_by_tags(&products, &["  "]).len(), 2);
    }
}
