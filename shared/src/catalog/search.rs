//! Catalog text search
//!
//! Queries and product text go through the same normalization: accents
//! folded, lowercase, anything that is not a letter or digit becomes a
//! single space. Every query term must match somewhere in the product
//! (name, tags, display category, description). A term matches when one of
//! its expansions starts a word of the product text.

use crate::models::Product;
use crate::util::fold_text;

/// Alias groups: any member of a group also searches for the others.
///
/// Entries are already normalized and singular.
pub const DEFAULT_ALIASES: &[&[&str]] = &[
    &["bolso", "bolsa", "cartera", "bag"],
    &["cojin", "almohadon", "funda", "cushion"],
    &["bordado", "bordada", "embroidery"],
    &["cesta", "cesto", "canasta", "basket"],
    &["manta", "plaid", "throw"],
    &["tapiz", "wall hanging"],
    &["home", "hogar", "casa", "deco"],
    &["macrame", "nudo"],
    &["pendiente", "arete", "earring"],
];

/// Fold accents and case, collapse separators to single spaces.
pub fn normalize_search(text: &str) -> String {
    let folded = fold_text(text);
    let mut out = String::with_capacity(folded.len());
    for word in folded.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Naive Spanish/English singular forms, most specific first.
fn singular_forms(word: &str) -> Vec<String> {
    let mut forms = Vec::new();
    let chars = word.chars().count();
    if chars > 4 && word.ends_with("ces") {
        forms.push(format!("{}z", &word[..word.len() - 3]));
    }
    if chars > 4 && word.ends_with("es") {
        forms.push(word[..word.len() - 2].to_string());
    }
    if chars > 3 && word.ends_with('s') {
        forms.push(word[..word.len() - 1].to_string());
    }
    forms
}

/// A parsed query: one list of accepted spellings per term
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<Vec<String>>,
}

impl SearchQuery {
    pub fn parse(query: &str) -> Self {
        Self::with_aliases(query, DEFAULT_ALIASES)
    }

    pub fn with_aliases(query: &str, aliases: &[&[&str]]) -> Self {
        let normalized = normalize_search(query);
        let terms = normalized
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(|term| expand_term(term, aliases))
            .collect();
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Match against already normalized text.
    pub fn matches_text(&self, normalized: &str) -> bool {
        let padded = format!(" {normalized}");
        self.terms.iter().all(|spellings| {
            spellings
                .iter()
                .any(|s| padded.contains(&format!(" {s}")))
        })
    }

    pub fn matches(&self, product: &Product) -> bool {
        if self.is_empty() {
            return true;
        }
        self.matches_text(&searchable_text(product))
    }
}

fn expand_term(term: &str, aliases: &[&[&str]]) -> Vec<String> {
    let mut spellings = vec![term.to_string()];
    spellings.extend(singular_forms(term));

    let bases: Vec<String> = spellings.clone();
    for group in aliases {
        if group.iter().any(|alias| bases.iter().any(|b| b == alias)) {
            for alias in group.iter() {
                if !spellings.iter().any(|s| s == alias) {
                    spellings.push(alias.to_string());
                }
            }
        }
    }
    spellings
}

/// Everything a query can hit, normalized.
fn searchable_text(product: &Product) -> String {
    let mut text = String::new();
    text.push_str(&product.name);
    for tag in &product.tags {
        text.push(' ');
        text.push_str(tag);
    }
    if let Some(category) = &product.category {
        text.push(' ');
        text.push_str(category);
    }
    if let Some(description) = &product.description {
        text.push(' ');
        text.push_str(description);
    }
    normalize_search(&text)
}
