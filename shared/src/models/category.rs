//! Category Model

use serde::{Deserialize, Serialize};

use super::double_option;

/// Category namespace: top navigation or catalog sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryScope {
    Header,
    Filter,
}

impl CategoryScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryScope::Header => "header",
            CategoryScope::Filter => "filter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "header" => Some(CategoryScope::Header),
            "filter" => Some(CategoryScope::Filter),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category entity
///
/// A category with a `tag_key` is selectable and stands for every product
/// carrying that tag. Without one it is a grouping node only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub scope: CategoryScope,
    pub name: String,
    pub tag_key: Option<String>,
    /// Parent in the same scope
    pub parent_id: Option<String>,
    pub sort_order: i32,
}

impl Category {
    /// Normalized tag key, `None` when absent or blank.
    pub fn normalized_tag_key(&self) -> Option<String> {
        self.tag_key
            .as_deref()
            .map(crate::catalog::normalize_tag)
            .filter(|k| !k.is_empty())
    }
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub scope: CategoryScope,
    pub name: String,
    pub tag_key: Option<String>,
    pub parent_id: Option<String>,
    pub sort_order: Option<i32>,
}

/// Update category payload
///
/// `tag_key` and `parent_id` distinguish "absent" (keep) from `null` (clear).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub tag_key: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<String>>,
    pub sort_order: Option<i32>,
}

/// One entry of a bulk reorder: new parent and position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMove {
    pub id: String,
    pub parent_id: Option<String>,
    pub sort_order: i32,
}

/// Fold `sources` into `target`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMerge {
    pub target_id: String,
    pub source_ids: Vec<String>,
}
