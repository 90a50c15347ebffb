//! Catalog logic over per-request snapshots
//!
//! Everything here is pure: callers fetch products and categories, pass them
//! in, and get derived views back. Nothing is cached between calls.
//!
//! - [`resolver`]: tag key -> display category, OR tag filtering
//! - [`tree`]: header/filter category forests
//! - [`search`]: query normalization and alias expansion
//! - [`validate`]: write-path checks for category parents, cycles, tag keys
//! - [`merge`]: planning a category merge

pub mod merge;
pub mod resolver;
pub mod search;
pub mod tree;
pub mod validate;

pub use merge::{MergePlan, plan_merge};
pub use resolver::{
    TagIndex, apply_display_categories, filter_products_by_tags, normalize_tag,
    resolve_display_category,
};
pub use search::{SearchQuery, normalize_search};
pub use tree::{CategoryForest, CategoryTreeNode, build_category_tree, expand_selection};
