//! Shared fixtures for native unit tests.

use crate::api::{ApiError, ApiErrorKind, ApiResult, NotesBackend};
use crate::models::{Note, NoteDraft, NoteSummary, Notebook, NotebookCount};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub(crate) fn notebook(id: &str, parent: Option<&str>) -> Notebook {
    Notebook {
        id: id.to_string(),
        name: id.to_string(),
        icon: None,
        sort_order: 0,
        parent_id: parent.map(str::to_string),
        created_at: String::new(),
        updated_at: String::new(),
        count: NotebookCount::default(),
    }
}

pub(crate) fn summary(id: &str, updated_at: &str) -> NoteSummary {
    NoteSummary {
        id: id.to_string(),
        title: format!("Note {id}"),
        content: String::new(),
        notebook_id: None,
        is_pinned: false,
        sort_order: 0,
        updated_at: updated_at.to_string(),
        created_at: updated_at.to_string(),
    }
}

pub(crate) fn pinned(id: &str, updated_at: &str) -> NoteSummary {
    NoteSummary {
        is_pinned: true,
        ..summary(id, updated_at)
    }
}

pub(crate) fn note(id: &str, notebook_id: Option<&str>) -> Note {
    Note {
        id: id.to_string(),
        title: format!("Note {id}"),
        content: String::new(),
        notebook_id: notebook_id.map(str::to_string),
        is_pinned: false,
        sort_order: 0,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

/// In-memory backend. Records every call as a short line and can be told
/// to fail the next request.
#[derive(Default)]
pub(crate) struct FakeBackend {
    notebooks: RefCell<Vec<Notebook>>,
    notes: RefCell<HashMap<String, Note>>,
    calls: RefCell<Vec<String>>,
    fail_next: Cell<bool>,
    next_id: Cell<u32>,
}

impl FakeBackend {
    pub fn with_notebooks(notebooks: Vec<Notebook>) -> Self {
        let b = Self::default();
        *b.notebooks.borrow_mut() = notebooks;
        b
    }

    pub fn insert_note(&self, note: Note) {
        self.notes.borrow_mut().insert(note.id.clone(), note);
    }

    pub fn stored_note(&self, id: &str) -> Option<Note> {
        self.notes.borrow().get(id).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.set(true);
    }

    fn record(&self, call: String) -> ApiResult<()> {
        self.calls.borrow_mut().push(call);
        if self.fail_next.replace(false) {
            return Err(ApiError {
                kind: ApiErrorKind::Network,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn not_found(what: &str, id: &str) -> ApiError {
        ApiError {
            kind: ApiErrorKind::Http,
            message: format!("{what} {id} not found"),
        }
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        format!("{prefix}{n}")
    }
}

impl NotesBackend for FakeBackend {
    async fn list_notebooks(&self) -> ApiResult<Vec<Notebook>> {
        self.record("list notebooks".to_string())?;
        Ok(self.notebooks.borrow().clone())
    }

    async fn create_notebook(&self, name: &str, parent_id: Option<&str>) -> ApiResult<Notebook> {
        self.record(format!("create notebook {name} in {parent_id:?}"))?;
        let mut nb = notebook(&self.fresh_id("nb"), parent_id);
        nb.name = name.to_string();
        self.notebooks.borrow_mut().push(nb.clone());
        Ok(nb)
    }

    async fn rename_notebook(&self, id: &str, name: &str) -> ApiResult<Notebook> {
        self.record(format!("rename {id} -> {name}"))?;
        let mut all = self.notebooks.borrow_mut();
        let nb = all
            .iter_mut()
            .find(|nb| nb.id == id)
            .ok_or_else(|| Self::not_found("notebook", id))?;
        nb.name = name.to_string();
        Ok(nb.clone())
    }

    async fn reparent_notebook(&self, id: &str, parent_id: Option<&str>) -> ApiResult<Notebook> {
        self.record(format!("reparent {id} -> {parent_id:?}"))?;
        let mut all = self.notebooks.borrow_mut();
        let nb = all
            .iter_mut()
            .find(|nb| nb.id == id)
            .ok_or_else(|| Self::not_found("notebook", id))?;
        nb.parent_id = parent_id.map(str::to_string);
        Ok(nb.clone())
    }

    async fn delete_notebook(&self, id: &str) -> ApiResult<()> {
        self.record(format!("delete notebook {id}"))?;
        self.notebooks.borrow_mut().retain(|nb| nb.id != id);
        Ok(())
    }

    async fn list_notes(&self, notebook_id: Option<&str>) -> ApiResult<Vec<NoteSummary>> {
        self.record(format!("list notes {notebook_id:?}"))?;
        Ok(self
            .notes
            .borrow()
            .values()
            .filter(|n| n.notebook_id.as_deref() == notebook_id)
            .map(Note::summary)
            .collect())
    }

    async fn get_note(&self, id: &str) -> ApiResult<Note> {
        self.record(format!("get {id}"))?;
        self.stored_note(id)
            .ok_or_else(|| Self::not_found("note", id))
    }

    async fn create_note(&self, notebook_id: Option<&str>) -> ApiResult<Note> {
        self.record(format!("create note in {notebook_id:?}"))?;
        let n = note(&self.fresh_id("n"), notebook_id);
        self.insert_note(n.clone());
        Ok(n)
    }

    async fn move_note(&self, id: &str, notebook_id: Option<&str>) -> ApiResult<Note> {
        self.record(format!("move {id} -> {notebook_id:?}"))?;
        let mut notes = self.notes.borrow_mut();
        let n = notes
            .entry(id.to_string())
            .or_insert_with(|| note(id, None));
        n.notebook_id = notebook_id.map(str::to_string);
        Ok(n.clone())
    }

    async fn delete_note(&self, id: &str) -> ApiResult<()> {
        self.record(format!("delete note {id}"))?;
        self.notes.borrow_mut().remove(id);
        Ok(())
    }

    async fn save_note(&self, id: &str, draft: &NoteDraft) -> ApiResult<Note> {
        self.record(format!("save {id}: {}", draft.content))?;
        let mut notes = self.notes.borrow_mut();
        let n = notes
            .get_mut(id)
            .ok_or_else(|| Self::not_found("note", id))?;
        n.title = draft.title.clone();
        n.content = draft.content.clone();
        Ok(n.clone())
    }

    async fn set_pinned(&self, id: &str, pinned: bool) -> ApiResult<Note> {
        self.record(format!("pin {id}: {pinned}"))?;
        let mut notes = self.notes.borrow_mut();
        let n = notes
            .get_mut(id)
            .ok_or_else(|| Self::not_found("note", id))?;
        n.is_pinned = pinned;
        Ok(n.clone())
    }
}
