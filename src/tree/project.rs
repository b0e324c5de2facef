//! Tree projection
//!
//! Flattens the notebook forest into the ordered rows the sidebar renders
//! and the keyboard navigates.

use super::store::TreeStore;
use crate::models::{NoteSummary, Notebook};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Notebook ids currently shown with their children visible.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub(crate) struct ExpansionSet(BTreeSet<String>);

impl ExpansionSet {
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Returns true when the set changed.
    pub fn expand(&mut self, id: &str) -> bool {
        self.0.insert(id.to_string())
    }

    pub fn collapse(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.collapse(id) {
            self.expand(id);
        }
    }

    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        self.0.retain(|id| keep(id.as_str()));
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExpansionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Row identity. Notebook and note ids come from different tables, so the
/// kind is part of the key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum RowId {
    Notebook(String),
    Note(String),
}

impl RowId {
    pub fn notebook_id(&self) -> Option<&str> {
        match self {
            RowId::Notebook(id) => Some(id),
            RowId::Note(_) => None,
        }
    }

    /// DOM id used for scroll-into-view.
    pub fn dom_id(&self) -> String {
        format!("treeitem-{self}")
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Notebook(id) => write!(f, "nb-{id}"),
            RowId::Note(id) => write!(f, "note-{id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RowKind {
    Notebook {
        has_children: bool,
        is_expanded: bool,
        note_count: u32,
    },
    Note {
        is_pinned: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FlatRow {
    pub id: RowId,
    pub label: String,
    pub depth: usize,
    /// Owning notebook; `None` for root-level rows.
    pub parent_id: Option<String>,
    pub kind: RowKind,
}

impl FlatRow {
    pub fn has_children(&self) -> bool {
        matches!(self.kind, RowKind::Notebook { has_children: true, .. })
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self.kind, RowKind::Notebook { is_expanded: true, .. })
    }
}

fn notebook_order(a: &&Notebook, b: &&Notebook) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Pinned first, then most recently updated.
fn note_order(a: &&NoteSummary, b: &&NoteSummary) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| b.updated_at.cmp(&a.updated_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn has_children(tree: &TreeStore, nb: &Notebook) -> bool {
    nb.count.notes > 0
        || tree.has_sub_notebooks(&nb.id)
        || tree.notes_in(Some(&nb.id)).is_some_and(|n| !n.is_empty())
}

fn push_notes(tree: &TreeStore, parent: Option<&str>, depth: usize, out: &mut Vec<FlatRow>) {
    let Some(notes) = tree.notes_in(parent) else {
        return;
    };
    let mut notes: Vec<&NoteSummary> = notes.iter().collect();
    notes.sort_by(note_order);

    out.extend(notes.into_iter().map(|n| FlatRow {
        id: RowId::Note(n.id.clone()),
        label: if n.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            n.title.clone()
        },
        depth,
        parent_id: parent.map(str::to_string),
        kind: RowKind::Note {
            is_pinned: n.is_pinned,
        },
    }));
}

fn collect(
    tree: &TreeStore,
    expanded: &ExpansionSet,
    parent: Option<&str>,
    depth: usize,
    out: &mut Vec<FlatRow>,
) {
    let mut children = tree.children(parent);
    children.sort_by(notebook_order);

    for nb in children {
        let is_expanded = expanded.contains(&nb.id);
        out.push(FlatRow {
            id: RowId::Notebook(nb.id.clone()),
            label: nb.name.clone(),
            depth,
            parent_id: parent.map(str::to_string),
            kind: RowKind::Notebook {
                has_children: has_children(tree, nb),
                is_expanded,
                note_count: nb.count.notes,
            },
        });

        if is_expanded {
            collect(tree, expanded, Some(&nb.id), depth + 1, out);
            push_notes(tree, Some(&nb.id), depth + 1, out);
        }
    }
}

/// Pre-order rows: each expanded notebook is followed by its sub-notebooks
/// (recursively), then its notes. Root notes come after the root notebooks.
///
/// Only notebooks reachable from a root are emitted, which also keeps a
/// corrupted parent cycle out of the traversal.
pub(crate) fn project(tree: &TreeStore, expanded: &ExpansionSet) -> Vec<FlatRow> {
    let mut out = Vec::with_capacity(tree.notebooks().len());
    collect(tree, expanded, None, 0, &mut out);
    push_notes(tree, None, 0, &mut out);
    out
}
