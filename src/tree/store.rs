//! TreeStore
//!
//! Last known notebook forest plus the leaf (note) lists loaded so far.
//! Mutators are `pub(super)`: only `TreeSession` changes the shape.

use crate::models::{NoteSummary, Notebook};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub(crate) struct TreeStore {
    notebooks: Vec<Notebook>,
    index: HashMap<String, usize>,

    /// Owning notebook id (`None` = forest root) -> loaded notes.
    notes: HashMap<Option<String>, Vec<NoteSummary>>,
}

impl TreeStore {
    #[cfg(test)]
    pub fn from_notebooks(notebooks: Vec<Notebook>) -> Self {
        let mut s = Self::default();
        s.replace_notebooks(notebooks);
        s
    }

    pub fn notebooks(&self) -> &[Notebook] {
        &self.notebooks
    }

    pub fn notebook(&self, id: &str) -> Option<&Notebook> {
        self.index.get(id).map(|&i| &self.notebooks[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// `None` when the notebook is unknown, `Some(None)` for a root.
    pub fn parent_of(&self, id: &str) -> Option<Option<&str>> {
        self.notebook(id).map(|nb| nb.parent_id.as_deref())
    }

    pub fn children(&self, parent: Option<&str>) -> Vec<&Notebook> {
        self.notebooks
            .iter()
            .filter(|nb| nb.parent_id.as_deref() == parent)
            .collect()
    }

    pub fn has_sub_notebooks(&self, id: &str) -> bool {
        self.notebooks
            .iter()
            .any(|nb| nb.parent_id.as_deref() == Some(id))
    }

    /// Loaded notes of a notebook (or of the root). `None` = never fetched.
    pub fn notes_in(&self, parent: Option<&str>) -> Option<&[NoteSummary]> {
        self.notes
            .get(&parent.map(str::to_string))
            .map(Vec::as_slice)
    }

    pub fn note(&self, id: &str) -> Option<&NoteSummary> {
        self.notes.values().flatten().find(|n| n.id == id)
    }

    /// Which leaf list currently holds the note.
    pub fn note_location(&self, id: &str) -> Option<Option<&str>> {
        self.notes
            .iter()
            .find(|(_, list)| list.iter().any(|n| n.id == id))
            .map(|(parent, _)| parent.as_deref())
    }

    pub(super) fn replace_notebooks(&mut self, notebooks: Vec<Notebook>) {
        self.notebooks = notebooks;
        self.reindex();
        let stale: Vec<Option<String>> = self
            .notes
            .keys()
            .filter(|k| k.as_deref().is_some_and(|id| !self.index.contains_key(id)))
            .cloned()
            .collect();
        for k in stale {
            self.notes.remove(&k);
        }
    }

    pub(super) fn set_notes(&mut self, parent: Option<&str>, mut notes: Vec<NoteSummary>) {
        let owner = parent.map(str::to_string);
        for n in notes.iter_mut() {
            n.notebook_id = owner.clone();
        }
        if let Some(nb) = parent.and_then(|id| self.notebook_mut(id)) {
            nb.count.notes = notes.len() as u32;
        }
        self.notes.insert(owner, notes);
    }

    pub(super) fn set_parent(&mut self, id: &str, parent: Option<&str>) -> bool {
        match self.notebook_mut(id) {
            Some(nb) => {
                nb.parent_id = parent.map(str::to_string);
                true
            }
            None => false,
        }
    }

    pub(super) fn upsert_notebook(&mut self, notebook: Notebook) {
        match self.index.get(&notebook.id) {
            Some(&i) => self.notebooks[i] = notebook,
            None => {
                self.index.insert(notebook.id.clone(), self.notebooks.len());
                self.notebooks.push(notebook);
            }
        }
    }

    pub(super) fn rename_notebook(&mut self, id: &str, name: &str) -> bool {
        match self.notebook_mut(id) {
            Some(nb) => {
                nb.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Removes the notebook, its descendants and their loaded notes.
    /// Returns the removed notebook ids.
    pub(super) fn remove_notebook(&mut self, id: &str) -> Vec<String> {
        if !self.contains(id) {
            return Vec::new();
        }

        let mut removed = vec![id.to_string()];
        let mut i = 0;
        while i < removed.len() {
            let current = removed[i].clone();
            for nb in &self.notebooks {
                if nb.parent_id.as_deref() == Some(current.as_str())
                    && !removed.iter().any(|r| r == &nb.id)
                {
                    removed.push(nb.id.clone());
                }
            }
            i += 1;
        }

        self.notebooks.retain(|nb| !removed.contains(&nb.id));
        for r in &removed {
            self.notes.remove(&Some(r.clone()));
        }
        self.reindex();
        removed
    }

    /// Puts a note summary into the leaf list its `notebook_id` names,
    /// taking it out of any other list first. A destination list that was
    /// never fetched stays unfetched; only the counter moves.
    pub(super) fn place_note(&mut self, note: NoteSummary) {
        self.remove_note(&note.id);

        if let Some(nb) = note.notebook_id.as_deref().and_then(|id| self.notebook_mut(id)) {
            nb.count.notes += 1;
        }
        if let Some(list) = self.notes.get_mut(&note.notebook_id) {
            list.push(note);
        }
    }

    /// Replaces a loaded note in place, keeping the list it sits in.
    pub(super) fn refresh_note(&mut self, mut note: NoteSummary) -> bool {
        for (owner, list) in self.notes.iter_mut() {
            if let Some(slot) = list.iter_mut().find(|n| n.id == note.id) {
                note.notebook_id = owner.clone();
                *slot = note;
                return true;
            }
        }
        false
    }

    pub(super) fn remove_note(&mut self, id: &str) -> Option<NoteSummary> {
        let owner = self.note_location(id).map(|p| p.map(str::to_string))?;
        let list = self.notes.get_mut(&owner)?;
        let pos = list.iter().position(|n| n.id == id)?;
        let removed = list.remove(pos);

        if let Some(nb) = owner.as_deref().and_then(|oid| self.notebook_mut(oid)) {
            nb.count.notes = nb.count.notes.saturating_sub(1);
        }
        Some(removed)
    }

    fn notebook_mut(&mut self, id: &str) -> Option<&mut Notebook> {
        let i = *self.index.get(id)?;
        self.notebooks.get_mut(i)
    }

    fn reindex(&mut self) {
        self.index = self
            .notebooks
            .iter()
            .enumerate()
            .map(|(i, nb)| (nb.id.clone(), i))
            .collect();
    }
}
