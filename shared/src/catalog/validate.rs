//! Write-path checks for the category hierarchy
//!
//! The read path tolerates bad data; these keep new bad data out.

use std::collections::{HashMap, HashSet};

use super::resolver::normalize_tag;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{Category, CategoryMove, CategoryScope};

/// Check a (new or changed) parent link.
///
/// `id` is `None` for a category that does not exist yet. The parent must
/// exist, share the scope, and must not be the category or one of its
/// descendants.
pub fn validate_parent(
    categories: &[Category],
    id: Option<&str>,
    scope: CategoryScope,
    parent_id: Option<&str>,
) -> AppResult<()> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };

    let by_id: HashMap<&str, &Category> = categories.iter().map(|c| (c.id.as_str(), c)).collect();

    let Some(parent) = by_id.get(parent_id) else {
        return Err(AppError::with_message(
            ErrorCode::CategoryParentInvalid,
            format!("Parent category {parent_id} does not exist"),
        )
        .with_detail("parent_id", parent_id));
    };
    if parent.scope != scope {
        return Err(AppError::with_message(
            ErrorCode::CategoryParentInvalid,
            format!("Parent category belongs to the {} scope", parent.scope),
        )
        .with_detail("parent_id", parent_id));
    }

    if let Some(id) = id {
        if ancestors(&by_id, parent_id).any(|a| a == id) {
            return Err(AppError::with_message(
                ErrorCode::CategoryCycle,
                "A category cannot be placed under itself or its descendants",
            )
            .with_detail("id", id)
            .with_detail("parent_id", parent_id));
        }
    }
    Ok(())
}

/// Reject a tag key already used by another category of the same scope.
pub fn validate_tag_key_unique(
    categories: &[Category],
    id: Option<&str>,
    scope: CategoryScope,
    tag_key: Option<&str>,
) -> AppResult<()> {
    let Some(key) = tag_key.map(normalize_tag).filter(|k| !k.is_empty()) else {
        return Ok(());
    };
    let taken = categories.iter().find(|c| {
        c.scope == scope
            && Some(c.id.as_str()) != id
            && c.normalized_tag_key().as_deref() == Some(key.as_str())
    });
    match taken {
        Some(other) => Err(AppError::with_message(
            ErrorCode::CategoryTagKeyExists,
            format!("Tag key '{key}' is already used by '{}'", other.name),
        )
        .with_detail("tag_key", key)
        .with_detail("category_id", other.id.clone())),
        None => Ok(()),
    }
}

/// Validate a bulk reorder against the current categories.
///
/// All moves are applied first and the resulting hierarchy is checked as a
/// whole, so swaps that are only valid together pass. Returns the categories
/// with the moves applied.
pub fn validate_moves(categories: &[Category], moves: &[CategoryMove]) -> AppResult<Vec<Category>> {
    let mut seen = HashSet::new();
    for mv in moves {
        if !seen.insert(mv.id.as_str()) {
            return Err(AppError::validation(format!(
                "Category {} appears more than once",
                mv.id
            )));
        }
    }

    let mut next: Vec<Category> = categories.to_vec();
    {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (i, c) in categories.iter().enumerate() {
            positions.entry(c.id.as_str()).or_insert(i);
        }
        for mv in moves {
            let Some(&pos) = positions.get(mv.id.as_str()) else {
                return Err(AppError::with_message(
                    ErrorCode::CategoryNotFound,
                    format!("Category {} not found", mv.id),
                )
                .with_detail("id", mv.id.clone()));
            };
            next[pos].parent_id = mv.parent_id.clone();
            next[pos].sort_order = mv.sort_order;
        }
    }

    for mv in moves {
        let Some(cat) = next.iter().find(|c| c.id == mv.id) else {
            continue;
        };
        validate_parent(&next, Some(&cat.id), cat.scope, cat.parent_id.as_deref())?;
    }
    Ok(next)
}

/// Ancestor ids starting at `start` (inclusive). Stops on a missing parent
/// or a repeated id, so stored cycles terminate.
fn ancestors<'a>(
    by_id: &'a HashMap<&'a str, &'a Category>,
    start: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    let mut visited = HashSet::new();
    let mut current = Some(start);
    std::iter::from_fn(move || {
        let id = current?;
        if !visited.insert(id) {
            return None;
        }
        current = by_id.get(id).and_then(|c| c.parent_id.as_deref());
        Some(id)
    })
}

/// True when `descendant` sits somewhere under `ancestor`.
pub fn is_descendant(categories: &[Category], descendant: &str, ancestor: &str) -> bool {
    let by_id: HashMap<&str, &Category> = categories.iter().map(|c| (c.id.as_str(), c)).collect();
    let Some(parent) = by_id.get(descendant).and_then(|c| c.parent_id.as_deref()) else {
        return false;
    };
    ancestors(&by_id, parent).any(|a| a == ancestor)
}
