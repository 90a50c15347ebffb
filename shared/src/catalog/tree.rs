//! Category forests
//!
//! Header and filter categories form two independent forests. A node whose
//! parent is missing, belongs to the other scope, or points at itself becomes
//! a root. Siblings are ordered by `sort_order`, then by name compared without
//! case or accents, then by the raw name.

use std::collections::HashMap;

use serde::Serialize;

use super::resolver::normalize_tag;
use crate::models::{Category, CategoryScope};
use crate::util::fold_text;

/// A category with its ordered children
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTreeNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTreeNode {
    /// Nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Depth of this subtree; a leaf is 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Normalized tag keys of every selectable node in this subtree,
    /// in pre-order.
    pub fn subtree_tag_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        self.collect_tag_keys(&mut keys);
        keys
    }

    fn collect_tag_keys(&self, out: &mut Vec<String>) {
        if let Some(key) = self.category.normalized_tag_key() {
            if !out.contains(&key) {
                out.push(key);
            }
        }
        for child in &self.children {
            child.collect_tag_keys(out);
        }
    }

    /// Pre-order search by id.
    pub fn find(&self, id: &str) -> Option<&CategoryTreeNode> {
        if self.category.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// Both category forests, as served to the storefront
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryForest {
    pub header: Vec<CategoryTreeNode>,
    pub filter: Vec<CategoryTreeNode>,
}

impl CategoryForest {
    pub fn roots(&self, scope: CategoryScope) -> &[CategoryTreeNode] {
        match scope {
            CategoryScope::Header => &self.header,
            CategoryScope::Filter => &self.filter,
        }
    }

    pub fn node_count(&self) -> usize {
        self.header
            .iter()
            .chain(&self.filter)
            .map(CategoryTreeNode::node_count)
            .sum()
    }

    pub fn find(&self, id: &str) -> Option<&CategoryTreeNode> {
        self.header
            .iter()
            .chain(&self.filter)
            .find_map(|root| root.find(id))
    }

    /// Tag keys a category selection stands for: the node's own key plus
    /// those of its descendants. Unknown ids select nothing.
    pub fn selection_tag_keys(&self, category_id: &str) -> Vec<String> {
        self.find(category_id)
            .map(CategoryTreeNode::subtree_tag_keys)
            .unwrap_or_default()
    }
}

/// Build both forests from a flat category list.
///
/// Every input category appears exactly once. Stored data with a parent
/// cycle is still rendered: the walk detects the loop and turns the node
/// where it closes into a root.
pub fn build_category_tree(categories: &[Category]) -> CategoryForest {
    let (header, filter): (Vec<&Category>, Vec<&Category>) = categories
        .iter()
        .partition(|c| c.scope == CategoryScope::Header);

    CategoryForest {
        header: build_scope(&header),
        filter: build_scope(&filter),
    }
}

fn build_scope(categories: &[&Category]) -> Vec<CategoryTreeNode> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(categories.len());
    for (i, cat) in categories.iter().enumerate() {
        index.entry(cat.id.as_str()).or_insert(i);
    }

    let mut parents: Vec<Option<usize>> = categories
        .iter()
        .enumerate()
        .map(|(i, cat)| {
            cat.parent_id
                .as_deref()
                .and_then(|p| index.get(p).copied())
                .filter(|&p| p != i)
        })
        .collect();
    break_cycles(&mut parents);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); categories.len()];
    let mut roots = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    let sort_key = |i: &usize| {
        let cat = categories[*i];
        (cat.sort_order, fold_text(&cat.name), cat.name.clone())
    };
    roots.sort_by_cached_key(sort_key);
    for siblings in &mut children {
        siblings.sort_by_cached_key(sort_key);
    }

    roots
        .into_iter()
        .map(|i| assemble(i, categories, &children))
        .collect()
}

/// Cut one parent link per cycle so every chain ends at a root.
fn break_cycles(parents: &mut [Option<usize>]) {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; parents.len()];
    let mut path = Vec::new();

    for start in 0..parents.len() {
        let mut current = start;
        loop {
            match marks[current] {
                Mark::Done => break,
                Mark::OnPath => {
                    parents[current] = None;
                    break;
                }
                Mark::Unvisited => {
                    marks[current] = Mark::OnPath;
                    path.push(current);
                    match parents[current] {
                        Some(p) => current = p,
                        None => break,
                    }
                }
            }
        }
        for i in path.drain(..) {
            marks[i] = Mark::Done;
        }
    }
}

fn assemble(i: usize, categories: &[&Category], children: &[Vec<usize>]) -> CategoryTreeNode {
    CategoryTreeNode {
        category: categories[i].clone(),
        children: children[i]
            .iter()
            .map(|&c| assemble(c, categories, children))
            .collect(),
    }
}

/// Tag keys of a free selection, as accepted by the public catalog:
/// explicit tags plus everything under the selected categories.
pub fn expand_selection<S: AsRef<str>, C: AsRef<str>>(
    forest: &CategoryForest,
    tags: &[S],
    category_ids: &[C],
) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let explicit = tags.iter().map(|t| normalize_tag(t.as_ref()));
    let from_categories = category_ids
        .iter()
        .flat_map(|id| forest.selection_tag_keys(id.as_ref()));
    for key in explicit.chain(from_categories) {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(
        id: &str,
        scope: CategoryScope,
        name: &str,
        parent: Option<&str>,
        order: i32,
    ) -> Category {
        Category {
            id: id.into(),
            scope,
            name: name.into(),
            tag_key: None,
            parent_id: parent.map(str::to_string),
            sort_order: order,
        }
    }

    fn names(nodes: &[CategoryTreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.category.name.as_str()).collect()
    }

    #[test]
    fn test_children_attach_and_sort() {
        let cats = vec![
            cat("2", CategoryScope::Filter, "Zurcidos", Some("1"), 0),
            cat("1", CategoryScope::Filter, "Textiles", None, 0),
            cat("3", CategoryScope::Filter, "Bordados", Some("1"), 0),
            cat("4", CategoryScope::Filter, "Aplicaciones", Some("1"), 5),
        ];
        let forest = build_category_tree(&cats);
        assert!(forest.header.is_empty());
        assert_eq!(names(&forest.filter), ["Textiles"]);
        assert_eq!(
            names(&forest.filter[0].children),
            ["Bordados", "Zurcidos", "Aplicaciones"]
        );
    }

    #[test]
    fn test_name_order_ignores_case_and_accents() {
        let cats = vec![
            cat("1", CategoryScope::Header, "Ñandutí", None, 0),
            cat("2", CategoryScope::Header, "bolsos", None, 0),
            cat("3", CategoryScope::Header, "Álbumes", None, 0),
            cat("4", CategoryScope::Header, "Cestas", None, 0),
        ];
        let forest = build_category_tree(&cats);
        assert_eq!(
            names(&forest.header),
            ["Álbumes", "bolsos", "Cestas", "Ñandutí"]
        );
    }

    #[test]
    fn test_missing_self_and_cross_scope_parents_become_roots() {
        let cats = vec![
            cat("h", CategoryScope::Header, "Hogar", None, 0),
            cat("a", CategoryScope::Filter, "Huérfana", Some("ghost"), 0),
            cat("b", CategoryScope::Filter, "Propia", Some("b"), 1),
            cat("c", CategoryScope::Filter, "Cruzada", Some("h"), 2),
        ];
        let forest = build_category_tree(&cats);
        assert_eq!(names(&forest.header), ["Hogar"]);
        assert!(forest.header[0].children.is_empty());
        assert_eq!(names(&forest.filter), ["Huérfana", "Propia", "Cruzada"]);
    }

    #[test]
    fn test_stored_cycle_keeps_every_node() {
        let cats = vec![
            cat("a", CategoryScope::Filter, "A", Some("c"), 0),
            cat("b", CategoryScope::Filter, "B", Some("a"), 0),
            cat("c", CategoryScope::Filter, "C", Some("b"), 0),
            cat("d", CategoryScope::Filter, "D", Some("c"), 0),
        ];
        let forest = build_category_tree(&cats);
        assert_eq!(forest.node_count(), 4);
        assert_eq!(forest.filter.len(), 1);
        assert_eq!(forest.filter[0].depth(), 4);
    }

    #[test]
    fn test_arbitrary_depth() {
        let mut cats = vec![cat("0", CategoryScope::Filter, "n0", None, 0)];
        for i in 1..50 {
            let parent = (i - 1).to_string();
            cats.push(cat(
                &i.to_string(),
                CategoryScope::Filter,
                &format!("n{i}"),
                Some(&parent),
                0,
            ));
        }
        let forest = build_category_tree(&cats);
        assert_eq!(forest.filter[0].depth(), 50);
    }

    #[test]
    fn test_selection_includes_descendant_keys() {
        let mut colors = cat("colors", CategoryScope::Filter, "Colores", None, 0);
        colors.tag_key = None;
        let mut blue = cat("blue", CategoryScope::Filter, "Azul", Some("colors"), 0);
        blue.tag_key = Some("Azul".into());
        let mut red = cat("red", CategoryScope::Filter, "Rojo", Some("colors"), 1);
        red.tag_key = Some("rojo".into());

        let forest = build_category_tree(&[colors, blue, red]);
        assert_eq!(forest.selection_tag_keys("colors"), ["azul", "rojo"]);
        assert_eq!(forest.selection_tag_keys("red"), ["rojo"]);
        assert!(forest.selection_tag_keys("nope").is_empty());

        let keys = expand_selection(&forest, &["Rojo", "rayas"], &["colors"]);
        assert_eq!(keys, ["rojo", "rayas", "azul"]);
    }
}
