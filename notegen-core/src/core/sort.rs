//! Ordering of a [`FileTree`] by name or timestamp.

use crate::core::tree::{FileTree, NodeId, Parent, TreeNode};
use crate::{SortDirection, SortKey};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Returns a sorted copy of `tree`; the input is left untouched.
///
/// Directories always precede files, independent of `key` and `direction`.
/// Every nested child list is sorted, not only the root level. The sort is
/// stable, so applying it twice yields the same order.
#[must_use]
pub fn sort_tree(tree: &FileTree, key: SortKey, direction: SortDirection) -> FileTree {
    let mut sorted = tree.clone();
    if key == SortKey::None {
        return sorted;
    }

    let mut pending = vec![Parent::Root];
    while let Some(parent) = pending.pop() {
        let mut ids: Vec<NodeId> = sorted.children(parent).to_vec();
        ids.sort_by(|a, b| match (sorted.get(*a), sorted.get(*b)) {
            (Some(a), Some(b)) => compare_nodes(a, b, key, direction),
            _ => Ordering::Equal,
        });
        pending.extend(
            ids.iter()
                .filter(|id| sorted.get(**id).is_some_and(|n| n.children.is_some()))
                .map(|id| Parent::Node(*id)),
        );
        if let Some(list) = sorted.children_mut(parent) {
            *list = ids;
        }
    }
    sorted
}

/// Compares two siblings: directories first, then by `key` in `direction`.
///
/// For the timestamp keys, nodes without the timestamp come after every node
/// that has one, in either direction, and are ordered by name among
/// themselves.
#[must_use]
pub fn compare_nodes(a: &TreeNode, b: &TreeNode, key: SortKey, direction: SortDirection) -> Ordering {
    match (a.is_directory, b.is_directory) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    match key {
        SortKey::None => Ordering::Equal,
        SortKey::Name => directed(compare_names(&a.name, &b.name), direction),
        SortKey::Created => compare_times(a.created_at, b.created_at, a, b, direction),
        SortKey::Modified => compare_times(a.modified_at, b.modified_at, a, b, direction),
    }
}

fn compare_times(
    x: Option<DateTime<Utc>>,
    y: Option<DateTime<Utc>>,
    a: &TreeNode,
    b: &TreeNode,
    direction: SortDirection,
) -> Ordering {
    match (x, y) {
        (Some(x), Some(y)) => directed(x.cmp(&y), direction),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => directed(compare_names(&a.name, &b.name), direction),
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Case-insensitive comparison with the raw string as tie-break, so that
/// `"apple"` sorts next to `"Apple"` rather than after `"Zebra"`.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
