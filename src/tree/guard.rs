//! Reparent legality.
//!
//! The backend accepts any `parentId`, so every reparent request is checked
//! here first against an immutable snapshot of the store.

use super::store::TreeStore;
use std::collections::HashSet;

/// Why a proposed reparent is (not) allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MoveVerdict {
    Legal,
    /// The notebook already has this parent. Callers may treat it as done.
    Unchanged,
    SelfParent,
    /// The candidate parent sits inside the moved notebook's subtree.
    WouldCycle,
    UnknownNotebook,
    UnknownParent,
}

impl MoveVerdict {
    pub fn is_legal(self) -> bool {
        self == MoveVerdict::Legal
    }
}

/// Checks moving `notebook_id` under `candidate_parent` (`None` = root).
pub(crate) fn check_move(
    tree: &TreeStore,
    notebook_id: &str,
    candidate_parent: Option<&str>,
) -> MoveVerdict {
    let Some(current_parent) = tree.parent_of(notebook_id) else {
        return MoveVerdict::UnknownNotebook;
    };

    let Some(parent_id) = candidate_parent else {
        return if current_parent.is_none() {
            MoveVerdict::Unchanged
        } else {
            MoveVerdict::Legal
        };
    };

    if parent_id == notebook_id {
        return MoveVerdict::SelfParent;
    }
    if !tree.contains(parent_id) {
        return MoveVerdict::UnknownParent;
    }
    if current_parent == Some(parent_id) {
        return MoveVerdict::Unchanged;
    }
    if is_descendant(tree, notebook_id, parent_id) {
        return MoveVerdict::WouldCycle;
    }
    MoveVerdict::Legal
}

pub(crate) fn is_legal_move(
    tree: &TreeStore,
    notebook_id: &str,
    candidate_parent: Option<&str>,
) -> bool {
    check_move(tree, notebook_id, candidate_parent).is_legal()
}

/// True when `target_id` is `ancestor_id` or lies anywhere below it.
///
/// Walks parent pointers upward from `target_id`. A corrupted (cyclic)
/// parent chain stops the walk at the first revisited id.
pub(crate) fn is_descendant(tree: &TreeStore, ancestor_id: &str, target_id: &str) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = Some(target_id);

    while let Some(id) = current {
        if id == ancestor_id {
            return true;
        }
        if !visited.insert(id) {
            return false;
        }
        current = tree.parent_of(id).flatten();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::notebook;

    fn sample() -> TreeStore {
        // a
        // ├─ b
        // │  └─ c
        // d
        TreeStore::from_notebooks(vec![
            notebook("a", None),
            notebook("b", Some("a")),
            notebook("c", Some("b")),
            notebook("d", None),
        ])
    }

    #[test]
    fn test_self_parent_is_rejected() {
        assert_eq!(check_move(&sample(), "a", Some("a")), MoveVerdict::SelfParent);
    }

    #[test]
    fn test_descendant_parent_is_rejected_at_any_depth() {
        let tree = sample();
        assert_eq!(check_move(&tree, "a", Some("b")), MoveVerdict::WouldCycle);
        assert_eq!(check_move(&tree, "a", Some("c")), MoveVerdict::WouldCycle);
        assert!(!is_legal_move(&tree, "b", Some("c")));
    }

    #[test]
    fn test_current_parent_is_unchanged() {
        let tree = sample();
        assert_eq!(check_move(&tree, "b", Some("a")), MoveVerdict::Unchanged);
        assert_eq!(check_move(&tree, "a", None), MoveVerdict::Unchanged);
    }

    #[test]
    fn test_unrelated_and_root_moves_are_legal() {
        let tree = sample();
        assert!(is_legal_move(&tree, "d", Some("c")));
        assert!(is_legal_move(&tree, "c", Some("d")));
        assert!(is_legal_move(&tree, "c", None));
        // Moving a child up to its grandparent is fine.
        assert!(is_legal_move(&tree, "c", Some("a")));
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        let tree = sample();
        assert_eq!(check_move(&tree, "zz", Some("a")), MoveVerdict::UnknownNotebook);
        assert_eq!(check_move(&tree, "a", Some("zz")), MoveVerdict::UnknownParent);
    }

    #[test]
    fn test_walk_terminates_on_corrupted_cycle() {
        // x -> y -> x is already cyclic on the server side.
        let tree = TreeStore::from_notebooks(vec![
            notebook("x", Some("y")),
            notebook("y", Some("x")),
            notebook("z", None),
        ]);
        assert!(!is_descendant(&tree, "z", "x"));
        assert!(is_legal_move(&tree, "z", Some("x")));
        assert!(!is_legal_move(&tree, "x", Some("y")));
    }

    #[test]
    fn test_accepted_moves_keep_forest_acyclic() {
        let ids = ["a", "b", "c", "d"];
        let mut tree = sample();

        // Try every (node, parent) pair in a few rounds; apply only legal ones.
        for _ in 0..3 {
            for node in ids {
                for parent in ids.iter().map(|p| Some(*p)).chain([None]) {
                    if is_legal_move(&tree, node, parent) {
                        tree.set_parent(node, parent);
                    }
                    for id in ids {
                        let parent = tree.parent_of(id).flatten();
                        assert!(
                            parent.map_or(true, |p| !is_descendant(&tree, id, p)),
                            "{id} became its own ancestor"
                        );
                    }
                }
            }
        }
    }
}
