//! Keyboard navigation over the projected rows.
//!
//! The controller keeps only the focused row id. Every handler takes the
//! freshly projected rows, so a focused row that disappeared (deleted, or
//! hidden by a collapse) simply counts as "no focus".

use super::project::{ExpansionSet, FlatRow, RowId};

/// Tree keys, decoupled from DOM key names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TreeKey {
    Next,
    Previous,
    Expand,
    Collapse,
    Activate,
    First,
    Last,
    Cancel,
}

impl TreeKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowDown" => Some(TreeKey::Next),
            "ArrowUp" => Some(TreeKey::Previous),
            "ArrowRight" => Some(TreeKey::Expand),
            "ArrowLeft" => Some(TreeKey::Collapse),
            "Enter" | " " => Some(TreeKey::Activate),
            "Home" => Some(TreeKey::First),
            "End" => Some(TreeKey::Last),
            "Escape" => Some(TreeKey::Cancel),
            _ => None,
        }
    }
}

/// What the view has to do after a key was handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NavEffect {
    /// Key did nothing (empty tree, leaf without action, ...).
    None,
    /// Focus moved; scroll the row into view.
    Focused(RowId),
    Expanded(String),
    Collapsed(String),
    /// Invoke the row's selection callback.
    Activate(RowId),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NavigationController {
    focused: Option<RowId>,
}

impl NavigationController {
    pub fn focused(&self) -> Option<&RowId> {
        self.focused.as_ref()
    }

    /// Index of the focused row in `rows`, if it is still visible.
    pub fn focused_index(&self, rows: &[FlatRow]) -> Option<usize> {
        let id = self.focused.as_ref()?;
        rows.iter().position(|r| &r.id == id)
    }

    pub fn set_focus(&mut self, id: Option<RowId>) {
        self.focused = id;
    }

    /// Focus entered the tree from outside: start at the selected row when
    /// it is visible, otherwise at the first row.
    pub fn focus_in(&mut self, rows: &[FlatRow], selected: Option<&RowId>) {
        self.focused = selected
            .filter(|sel| rows.iter().any(|r| &r.id == *sel))
            .cloned()
            .or_else(|| rows.first().map(|r| r.id.clone()));
    }

    /// Focus left the tree. Selection is not touched.
    pub fn focus_out(&mut self) {
        self.focused = None;
    }

    pub fn handle_key(
        &mut self,
        rows: &[FlatRow],
        expanded: &mut ExpansionSet,
        key: TreeKey,
    ) -> NavEffect {
        if rows.is_empty() {
            return NavEffect::None;
        }

        let current = self.focused_index(rows);
        let last = rows.len() - 1;

        match key {
            TreeKey::Next => {
                let next = match current {
                    Some(i) if i < last => i + 1,
                    _ => 0,
                };
                self.move_to(&rows[next])
            }
            TreeKey::Previous => {
                let prev = match current {
                    Some(i) if i > 0 => i - 1,
                    _ => last,
                };
                self.move_to(&rows[prev])
            }
            TreeKey::First => self.move_to(&rows[0]),
            TreeKey::Last => self.move_to(&rows[last]),
            TreeKey::Expand => {
                let Some(i) = current else {
                    return NavEffect::None;
                };
                let row = &rows[i];
                let Some(id) = row.id.notebook_id() else {
                    return NavEffect::None;
                };

                if !row.has_children() {
                    NavEffect::None
                } else if !row.is_expanded() {
                    expanded.expand(id);
                    NavEffect::Expanded(id.to_string())
                } else {
                    match rows.get(i + 1) {
                        Some(child) if child.depth == row.depth + 1 => self.move_to(child),
                        _ => NavEffect::None,
                    }
                }
            }
            TreeKey::Collapse => {
                let Some(i) = current else {
                    return NavEffect::None;
                };
                let row = &rows[i];

                if let Some(id) = row.id.notebook_id().filter(|_| row.is_expanded()) {
                    expanded.collapse(id);
                    return NavEffect::Collapsed(id.to_string());
                }

                let parent = row.parent_id.as_deref().and_then(|pid| {
                    rows.iter()
                        .find(|r| r.id.notebook_id() == Some(pid))
                });
                match parent {
                    Some(p) => self.move_to(p),
                    None => NavEffect::None,
                }
            }
            TreeKey::Activate => match current {
                Some(i) => NavEffect::Activate(rows[i].id.clone()),
                None => NavEffect::None,
            },
            TreeKey::Cancel => NavEffect::None,
        }
    }

    fn move_to(&mut self, row: &FlatRow) -> NavEffect {
        self.focused = Some(row.id.clone());
        NavEffect::Focused(row.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{notebook, summary};
    use crate::tree::project::project;
    use crate::tree::store::TreeStore;
    use pretty_assertions::assert_eq;

    fn nb(id: &str) -> RowId {
        RowId::Notebook(id.to_string())
    }

    // a
    // ├─ b
    // │  └─ note n1
    // c
    fn store() -> TreeStore {
        let mut s = TreeStore::from_notebooks(vec![
            notebook("a", None),
            notebook("b", Some("a")),
            notebook("c", None),
        ]);
        s.set_notes(Some("b"), vec![summary("n1", "2024-01-01")]);
        s
    }

    #[test]
    fn test_empty_tree_ignores_every_key() {
        let mut nav = NavigationController::default();
        let mut expanded = ExpansionSet::default();
        for key in [TreeKey::Next, TreeKey::Expand, TreeKey::Activate, TreeKey::Last] {
            assert_eq!(nav.handle_key(&[], &mut expanded, key), NavEffect::None);
        }
        assert!(nav.focused().is_none());
    }

    #[test]
    fn test_next_and_previous_wrap_around() {
        let s = store();
        let mut expanded = ExpansionSet::default();
        let rows = project(&s, &expanded);
        let mut nav = NavigationController::default();

        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Next), NavEffect::Focused(nb("a")));
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Next), NavEffect::Focused(nb("c")));
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Next), NavEffect::Focused(nb("a")));
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Previous), NavEffect::Focused(nb("c")));
    }

    #[test]
    fn test_previous_without_focus_goes_to_last() {
        let s = store();
        let mut expanded = ExpansionSet::default();
        let rows = project(&s, &expanded);
        let mut nav = NavigationController::default();
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Previous), NavEffect::Focused(nb("c")));
    }

    #[test]
    fn test_expand_collapsed_keeps_focus_then_descends() {
        let s = store();
        let mut expanded = ExpansionSet::default();
        let mut nav = NavigationController::default();
        nav.set_focus(Some(nb("a")));

        let rows = project(&s, &expanded);
        assert_eq!(
            nav.handle_key(&rows, &mut expanded, TreeKey::Expand),
            NavEffect::Expanded("a".to_string())
        );
        assert_eq!(nav.focused(), Some(&nb("a")));

        let rows = project(&s, &expanded);
        assert_eq!(rows[1].id, nb("b"));
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Expand), NavEffect::Focused(nb("b")));
    }

    #[test]
    fn test_expand_on_childless_notebook_or_note_is_noop() {
        let s = store();
        let mut expanded: ExpansionSet = ["a", "b"].into_iter().collect();
        let rows = project(&s, &expanded);
        let mut nav = NavigationController::default();

        nav.set_focus(Some(nb("c")));
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Expand), NavEffect::None);

        nav.set_focus(Some(RowId::Note("n1".to_string())));
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Expand), NavEffect::None);
    }

    #[test]
    fn test_expanded_without_visible_children_does_not_cross_boundary() {
        // Server says "a" has notes but none are loaded yet.
        let mut a = notebook("a", None);
        a.count.notes = 2;
        let s = TreeStore::from_notebooks(vec![a, notebook("z", None)]);
        let mut expanded: ExpansionSet = ["a"].into_iter().collect();
        let rows = project(&s, &expanded);
        let mut nav = NavigationController::default();
        nav.set_focus(Some(nb("a")));

        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Expand), NavEffect::None);
        assert_eq!(nav.focused(), Some(&nb("a")));
    }

    #[test]
    fn test_collapse_expanded_then_move_to_parent() {
        let s = store();
        let mut expanded: ExpansionSet = ["a", "b"].into_iter().collect();
        let mut nav = NavigationController::default();

        nav.set_focus(Some(RowId::Note("n1".to_string())));
        let rows = project(&s, &expanded);
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Collapse), NavEffect::Focused(nb("b")));
        assert_eq!(
            nav.handle_key(&rows, &mut expanded, TreeKey::Collapse),
            NavEffect::Collapsed("b".to_string())
        );

        let rows = project(&s, &expanded);
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Collapse), NavEffect::Focused(nb("a")));
        // Root row without expansion: nothing above it.
        nav.set_focus(Some(nb("c")));
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Collapse), NavEffect::None);
    }

    #[test]
    fn test_home_end_and_activate() {
        let s = store();
        let mut expanded: ExpansionSet = ["a"].into_iter().collect();
        let rows = project(&s, &expanded);
        let mut nav = NavigationController::default();

        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Activate), NavEffect::None);
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Last), NavEffect::Focused(nb("c")));
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::First), NavEffect::Focused(nb("a")));
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Activate), NavEffect::Activate(nb("a")));
    }

    #[test]
    fn test_stale_focus_counts_as_none() {
        let s = store();
        let mut expanded = ExpansionSet::default();
        let rows = project(&s, &expanded);
        let mut nav = NavigationController::default();
        nav.set_focus(Some(nb("deleted")));

        assert!(nav.focused_index(&rows).is_none());
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Expand), NavEffect::None);
        assert_eq!(nav.handle_key(&rows, &mut expanded, TreeKey::Next), NavEffect::Focused(nb("a")));
    }

    #[test]
    fn test_focus_in_prefers_visible_selection() {
        let s = store();
        let rows = project(&s, &ExpansionSet::default());
        let mut nav = NavigationController::default();

        nav.focus_in(&rows, Some(&nb("c")));
        assert_eq!(nav.focused(), Some(&nb("c")));

        // Selected note is hidden inside a collapsed notebook.
        nav.focus_in(&rows, Some(&RowId::Note("n1".to_string())));
        assert_eq!(nav.focused(), Some(&nb("a")));

        nav.focus_out();
        assert!(nav.focused().is_none());
    }

    #[test]
    fn test_key_names_map_to_tree_keys() {
        assert_eq!(TreeKey::from_key("ArrowRight"), Some(TreeKey::Expand));
        assert_eq!(TreeKey::from_key(" "), Some(TreeKey::Activate));
        assert_eq!(TreeKey::from_key("Tab"), None);
    }
}
