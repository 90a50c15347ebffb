//! Category merge planning
//!
//! A merge folds source categories into a target of the same scope:
//! children of the sources move under the target, products tagged with a
//! source key get the target key instead, and the sources are deleted.
//! Tag keys are unique per scope only: a source key still claimed by a
//! category outside the merge stays on the product next to the target key.
//! The plan is computed here and applied by the caller in one transaction.

use std::collections::HashSet;

use serde::Serialize;

use super::validate::is_descendant;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{Category, CategoryMerge, Product, clean_tags};

/// Changes a merge will make
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergePlan {
    pub target_id: String,
    /// Categories whose parent becomes the target
    pub reparent: Vec<String>,
    /// Product id -> replacement tag list
    pub retag: Vec<(String, Vec<String>)>,
    /// Source categories to delete
    pub delete: Vec<String>,
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::with_message(ErrorCode::CategoryMergeInvalid, message)
}

/// Validate a merge request and work out its effects.
pub fn plan_merge(
    categories: &[Category],
    products: &[Product],
    merge: &CategoryMerge,
) -> AppResult<MergePlan> {
    let find = |id: &str| categories.iter().find(|c| c.id == id);

    let target = find(&merge.target_id).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::CategoryNotFound,
            format!("Category {} not found", merge.target_id),
        )
        .with_detail("id", merge.target_id.clone())
    })?;

    let mut source_ids: Vec<&str> = Vec::new();
    for id in &merge.source_ids {
        if !source_ids.contains(&id.as_str()) {
            source_ids.push(id.as_str());
        }
    }
    if source_ids.is_empty() {
        return Err(invalid("At least one source category is required"));
    }
    if source_ids.contains(&target.id.as_str()) {
        return Err(
            invalid("A category cannot be merged into itself").with_detail("id", target.id.clone())
        );
    }

    let mut sources: Vec<&Category> = Vec::with_capacity(source_ids.len());
    for id in &source_ids {
        let source = find(id).ok_or_else(|| {
            AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {id} not found"))
                .with_detail("id", *id)
        })?;
        if source.scope != target.scope {
            return Err(invalid(format!(
                "Category '{}' is in the {} scope, target is in {}",
                source.name, source.scope, target.scope
            ))
            .with_detail("id", source.id.clone()));
        }
        if is_descendant(categories, &target.id, &source.id) {
            return Err(invalid(format!(
                "Target '{}' sits under source '{}'",
                target.name, source.name
            ))
            .with_detail("id", source.id.clone()));
        }
        sources.push(source);
    }

    let source_set: HashSet<&str> = source_ids.iter().copied().collect();
    let reparent = categories
        .iter()
        .filter(|c| !source_set.contains(c.id.as_str()) && c.id != target.id)
        .filter(|c| c.parent_id.as_deref().is_some_and(|p| source_set.contains(p)))
        .map(|c| c.id.clone())
        .collect();

    let target_key = target.normalized_tag_key();
    let source_keys: HashSet<String> = sources
        .iter()
        .filter_map(|s| s.normalized_tag_key())
        .filter(|k| Some(k) != target_key.as_ref())
        .collect();

    // Keys other categories (usually the other scope) still resolve through
    let shared_keys: HashSet<&String> = source_keys
        .iter()
        .filter(|k| {
            categories.iter().any(|c| {
                !source_set.contains(c.id.as_str())
                    && c.normalized_tag_key().as_ref() == Some(*k)
            })
        })
        .collect();

    let mut retag = Vec::new();
    if !source_keys.is_empty() {
        let replacement = target
            .tag_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        for product in products {
            let hit = product
                .tags
                .iter()
                .any(|t| source_keys.contains(&super::normalize_tag(t)));
            if !hit {
                continue;
            }
            let rewritten = product.tags.iter().flat_map(|t| {
                let key = super::normalize_tag(t);
                if !source_keys.contains(&key) {
                    [Some(t.as_str()), None]
                } else if shared_keys.contains(&key) {
                    [Some(t.as_str()), replacement]
                } else {
                    [replacement, None]
                }
            });
            let tags = clean_tags(rewritten.flatten());
            if tags != product.tags {
                retag.push((product.id.clone(), tags));
            }
        }
    }

    Ok(MergePlan {
        target_id: target.id.clone(),
        reparent,
        retag,
        delete: source_ids.iter().map(|s| s.to_string()).collect(),
    })
}
