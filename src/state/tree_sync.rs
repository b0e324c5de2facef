use crate::api::{ApiError, ApiErrorKind, NotesBackend};
use crate::models::{Note, Notebook};
use crate::state::AppContext;
use crate::storage::save_expanded;
use crate::tree::nav::{NavEffect, TreeKey};
use crate::tree::project::RowId;
use crate::tree::{send_mutation, Mutation};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Runs the tree's backend traffic and mirrors the answers into
/// `AppState::tree`. All tree logic stays in `TreeSession`.
#[derive(Clone, Copy)]
pub(crate) struct TreeSyncController {
    app_state: AppContext,
    /// Bumped on every full reload; stale listing responses are dropped.
    load_request_id: RwSignal<u64>,
}

impl TreeSyncController {
    pub fn new(app_state: AppContext) -> Self {
        Self {
            app_state,
            load_request_id: RwSignal::new(0),
        }
    }

    fn report(&self, ctx: &str, e: &ApiError) {
        log::warn!("{ctx}: {e}");
        let msg = if e.kind == ApiErrorKind::Unauthorized {
            self.app_state.0.api_client.update(|c| c.logout());
            "Session expired. Please sign in again.".to_string()
        } else {
            format!("{ctx}: {e}")
        };
        self.app_state.0.tree_error.set(Some(msg));
    }

    fn persist_expanded(&self) {
        self.app_state
            .0
            .tree
            .with_untracked(|t| save_expanded(t.expanded()));
    }

    /// Full reload: notebooks, root notes, then the notes of every notebook
    /// that is expanded.
    pub fn load(&self) {
        let s = *self;
        let tree = self.app_state.0.tree;
        let req_id = self.load_request_id.get_untracked() + 1;
        self.load_request_id.set(req_id);
        self.app_state.0.tree_loading.set(true);
        self.app_state.0.tree_error.set(None);

        spawn_local(async move {
            let client = s.app_state.0.api_client.get_untracked();
            if !client.is_authenticated() {
                log::info!("no stored auth token; loading notebooks anonymously");
            }
            let result = client.list_notebooks().await;
            if s.load_request_id.get_untracked() != req_id {
                return;
            }
            s.app_state.0.tree_loading.set(false);

            match result {
                Ok(notebooks) => {
                    tree.update(|t| t.reload(notebooks));
                    s.persist_expanded();

                    s.load_notes(None);
                    let open: Vec<String> =
                        tree.with_untracked(|t| t.expanded().iter().map(str::to_string).collect());
                    for id in open {
                        s.load_notes(Some(id));
                    }
                }
                Err(e) => s.report("Failed to load notebooks", &e),
            }
        });
    }

    pub fn load_notes(&self, notebook_id: Option<String>) {
        let s = *self;
        spawn_local(async move {
            let client = s.app_state.0.api_client.get_untracked();
            match client.list_notes(notebook_id.as_deref()).await {
                Ok(notes) => s
                    .app_state
                    .0
                    .tree
                    .update(|t| t.notes_loaded(notebook_id.as_deref(), notes)),
                Err(e) => s.report("Failed to load notes", &e),
            }
        });
    }

    fn ensure_notes(&self, notebook_id: &str) {
        let loaded = self
            .app_state
            .0
            .tree
            .with_untracked(|t| t.store().notes_in(Some(notebook_id)).is_some());
        if !loaded {
            self.load_notes(Some(notebook_id.to_string()));
        }
    }

    pub fn toggle(&self, notebook_id: &str) {
        let expanded = self
            .app_state
            .0
            .tree
            .try_update(|t| t.toggle_expanded(notebook_id))
            .unwrap_or(false);
        if expanded {
            self.ensure_notes(notebook_id);
        }
        self.persist_expanded();
    }

    /// Sends a mutation and applies the answer. Expansion changes made
    /// optimistically are persisted right away.
    pub fn dispatch(&self, mutation: Mutation) {
        if let Mutation::MoveNote {
            notebook_id: Some(id),
            ..
        } = &mutation
        {
            self.ensure_notes(id);
        }
        self.persist_expanded();

        let s = *self;
        spawn_local(async move {
            let client = s.app_state.0.api_client.get_untracked();
            let result = send_mutation(&client, &mutation).await;
            if let Err(e) = &result {
                s.report("Move failed", e);
            }
            s.app_state.0.tree.update(|t| t.apply(&mutation, result));
        });
    }

    pub fn request_reparent(&self, notebook_id: &str, new_parent_id: Option<&str>) {
        let mutation = self
            .app_state
            .0
            .tree
            .try_update(|t| t.request_reparent(notebook_id, new_parent_id))
            .flatten();
        if let Some(m) = mutation {
            self.dispatch(m);
        }
    }

    /// Pointer released while dragging.
    pub fn finish_drop(&self) {
        let mutation = self
            .app_state
            .0
            .tree
            .try_update(|t| t.finish_drop())
            .flatten();
        if let Some(m) = mutation {
            self.dispatch(m);
        }
    }

    /// Routes a key to the tree and performs the I/O side of its effect.
    /// Returns the effect so the view can move DOM focus or navigate.
    pub fn on_key(&self, key: TreeKey) -> NavEffect {
        let effect = self
            .app_state
            .0
            .tree
            .try_update(|t| t.on_key(key))
            .unwrap_or(NavEffect::None);

        match &effect {
            NavEffect::Expanded(id) => {
                self.ensure_notes(id);
                self.persist_expanded();
            }
            NavEffect::Collapsed(_) => self.persist_expanded(),
            NavEffect::Activate(RowId::Notebook(id)) => {
                self.app_state.0.selected_notebook_id.set(Some(id.clone()));
                self.toggle(id);
            }
            _ => {}
        }
        effect
    }

    pub fn create_notebook(&self, name: String, parent_id: Option<String>) {
        let name = name.trim().to_string();
        if name.is_empty() {
            return;
        }
        let s = *self;
        spawn_local(async move {
            let client = s.app_state.0.api_client.get_untracked();
            match client.create_notebook(&name, parent_id.as_deref()).await {
                Ok(nb) => {
                    s.app_state.0.tree.update(|t| t.notebook_created(nb));
                    s.persist_expanded();
                }
                Err(e) => s.report("Failed to create notebook", &e),
            }
        });
    }

    pub fn rename_notebook(&self, notebook_id: String, name: String) {
        let name = name.trim().to_string();
        if name.is_empty() {
            return;
        }
        let s = *self;
        spawn_local(async move {
            let client = s.app_state.0.api_client.get_untracked();
            match client.rename_notebook(&notebook_id, &name).await {
                Ok(Notebook { id, name, .. }) => {
                    s.app_state.0.tree.update(|t| t.notebook_renamed(&id, &name));
                }
                Err(e) => s.report("Failed to rename notebook", &e),
            }
        });
    }

    pub fn delete_notebook(&self, notebook_id: String) {
        let s = *self;
        spawn_local(async move {
            let client = s.app_state.0.api_client.get_untracked();
            match client.delete_notebook(&notebook_id).await {
                Ok(()) => {
                    s.app_state.0.tree.update(|t| t.notebook_deleted(&notebook_id));
                    s.persist_expanded();
                    if s.app_state.0.selected_notebook_id.get_untracked().as_deref()
                        == Some(notebook_id.as_str())
                    {
                        s.app_state.0.selected_notebook_id.set(None);
                    }
                }
                Err(e) => s.report("Failed to delete notebook", &e),
            }
        });
    }

    /// Creates an empty note and hands it to `on_created` (usually to open it).
    pub fn create_note(
        &self,
        notebook_id: Option<String>,
        on_created: impl FnOnce(Note) + 'static,
    ) {
        if let Some(id) = notebook_id.as_deref() {
            self.ensure_notes(id);
        }
        let s = *self;
        spawn_local(async move {
            let client = s.app_state.0.api_client.get_untracked();
            match client.create_note(notebook_id.as_deref()).await {
                Ok(note) => {
                    s.app_state.0.tree.update(|t| t.note_created(&note));
                    s.persist_expanded();
                    on_created(note);
                }
                Err(e) => s.report("Failed to create note", &e),
            }
        });
    }

    /// Pins or unpins a note; the row moves once the server answers.
    pub fn set_pinned(&self, note_id: String, pinned: bool, on_done: impl FnOnce(Note) + 'static) {
        let s = *self;
        spawn_local(async move {
            let client = s.app_state.0.api_client.get_untracked();
            match client.set_pinned(&note_id, pinned).await {
                Ok(note) => {
                    s.app_state.0.tree.update(|t| t.note_updated(&note));
                    on_done(note);
                }
                Err(e) => s.report("Failed to update note", &e),
            }
        });
    }

    pub fn delete_note(&self, note_id: String, on_deleted: impl FnOnce() + 'static) {
        let s = *self;
        spawn_local(async move {
            let client = s.app_state.0.api_client.get_untracked();
            match client.delete_note(&note_id).await {
                Ok(()) => {
                    s.app_state.0.tree.update(|t| t.note_deleted(&note_id));
                    on_deleted();
                }
                Err(e) => s.report("Failed to delete note", &e),
            }
        });
    }
}
