//! Notebook tree engine
//!
//! `TreeSession` is the one place that changes tree shape: structural edits
//! go through `request_reparent` / `request_move`, which consult the cycle
//! guard, and server answers come back through `apply`.

pub(crate) mod drag;
pub(crate) mod guard;
pub(crate) mod nav;
pub(crate) mod project;
pub(crate) mod store;

use crate::api::{ApiResult, NotesBackend};
use crate::models::{Note, NoteSummary, Notebook};
use drag::{DragConfig, DragController, DragSubject, DropOutcome, DropTarget};
use guard::{check_move, is_legal_move};
use nav::{NavEffect, NavigationController, TreeKey};
use project::{project, ExpansionSet, FlatRow, RowId};
use store::TreeStore;

/// A structural edit that still has to reach the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Mutation {
    Reparent {
        notebook_id: String,
        new_parent_id: Option<String>,
    },
    MoveNote {
        note_id: String,
        notebook_id: Option<String>,
    },
}

/// Server answer to a `Mutation`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum MutationAck {
    Notebook(Notebook),
    Note(Note),
}

/// Issues the single request behind a mutation.
pub(crate) async fn send_mutation<B: NotesBackend>(
    backend: &B,
    mutation: &Mutation,
) -> ApiResult<MutationAck> {
    match mutation {
        Mutation::Reparent {
            notebook_id,
            new_parent_id,
        } => backend
            .reparent_notebook(notebook_id, new_parent_id.as_deref())
            .await
            .map(MutationAck::Notebook),
        Mutation::MoveNote {
            note_id,
            notebook_id,
        } => backend
            .move_note(note_id, notebook_id.as_deref())
            .await
            .map(MutationAck::Note),
    }
}

/// Tree state owned by one view: data, expansion, focus and drag gesture.
#[derive(Clone, Debug, Default)]
pub(crate) struct TreeSession {
    store: TreeStore,
    expanded: ExpansionSet,
    nav: NavigationController,
    drag: DragController,
}

impl TreeSession {
    pub fn new(drag: DragConfig, expanded: ExpansionSet) -> Self {
        Self {
            store: TreeStore::default(),
            expanded,
            nav: NavigationController::default(),
            drag: DragController::new(drag),
        }
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn expanded(&self) -> &ExpansionSet {
        &self.expanded
    }

    pub fn nav(&self) -> &NavigationController {
        &self.nav
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn drag_mut(&mut self) -> &mut DragController {
        &mut self.drag
    }

    pub fn rows(&self) -> Vec<FlatRow> {
        project(&self.store, &self.expanded)
    }

    // ---- loading ----

    /// Full notebook reload. Expansion entries of vanished notebooks go.
    pub fn reload(&mut self, notebooks: Vec<Notebook>) {
        self.store.replace_notebooks(notebooks);
        let store = &self.store;
        self.expanded.retain(|id| store.contains(id));
    }

    pub fn notes_loaded(&mut self, notebook_id: Option<&str>, notes: Vec<NoteSummary>) {
        if notebook_id.is_some_and(|id| !self.store.contains(id)) {
            return;
        }
        self.store.set_notes(notebook_id, notes);
    }

    // ---- expansion ----

    /// Returns whether the notebook is expanded afterwards.
    pub fn toggle_expanded(&mut self, notebook_id: &str) -> bool {
        self.expanded.toggle(notebook_id);
        self.expanded.contains(notebook_id)
    }

    // ---- structural edits ----

    /// Reparent entry point. `None` when the guard rejects the move
    /// (including the "already there" no-op).
    pub fn request_reparent(
        &mut self,
        notebook_id: &str,
        new_parent_id: Option<&str>,
    ) -> Option<Mutation> {
        let verdict = check_move(&self.store, notebook_id, new_parent_id);
        if !verdict.is_legal() {
            log::debug!("reparent of {notebook_id} to {new_parent_id:?} rejected: {verdict:?}");
            return None;
        }

        if let Some(parent) = new_parent_id {
            self.expanded.expand(parent);
        }
        Some(Mutation::Reparent {
            notebook_id: notebook_id.to_string(),
            new_parent_id: new_parent_id.map(str::to_string),
        })
    }

    /// Note move entry point. Notes have no children, so only the
    /// destination has to exist.
    pub fn request_move(&mut self, note_id: &str, notebook_id: Option<&str>) -> Option<Mutation> {
        if notebook_id.is_some_and(|id| !self.store.contains(id)) {
            log::debug!("move of note {note_id} to unknown notebook {notebook_id:?} rejected");
            return None;
        }

        if let Some(parent) = notebook_id {
            self.expanded.expand(parent);
        }
        Some(Mutation::MoveNote {
            note_id: note_id.to_string(),
            notebook_id: notebook_id.map(str::to_string),
        })
    }

    /// Whether releasing the current drag over `target` would change anything.
    pub fn accepts_drop(&self, target: &DropTarget) -> bool {
        match self.drag.subject() {
            Some(DragSubject::Notebook(id)) => is_legal_move(&self.store, id, target.parent_id()),
            Some(DragSubject::Note(_)) => true,
            None => false,
        }
    }

    /// Ends an active drag gesture. At most one mutation per drop.
    pub fn finish_drop(&mut self) -> Option<Mutation> {
        match self.drag.release(&self.store) {
            DropOutcome::Reparent {
                notebook_id,
                new_parent_id,
            } => self.request_reparent(&notebook_id, new_parent_id.as_deref()),
            DropOutcome::MoveNote {
                note_id,
                notebook_id,
            } => self.request_move(&note_id, notebook_id.as_deref()),
            DropOutcome::Rejected(verdict) => {
                log::debug!("drop rejected: {verdict:?}");
                None
            }
            DropOutcome::Click | DropOutcome::Discarded => None,
        }
    }

    /// Mirrors a mutation's server answer. Failures are logged; the
    /// optimistic expansion stays and the next reload reconciles.
    pub fn apply(&mut self, mutation: &Mutation, result: ApiResult<MutationAck>) {
        match result {
            Ok(MutationAck::Notebook(nb)) => {
                self.store.set_parent(&nb.id, nb.parent_id.as_deref());
            }
            Ok(MutationAck::Note(note)) => {
                let mut summary = self
                    .store
                    .note(&note.id)
                    .cloned()
                    .unwrap_or_else(|| note.summary());
                summary.notebook_id = note.notebook_id.clone();
                self.store.place_note(summary);
            }
            Err(e) => {
                log::warn!("{mutation:?} failed: {e}");
            }
        }
    }

    // ---- plain CRUD mirrors ----

    pub fn notebook_created(&mut self, notebook: Notebook) {
        if let Some(parent) = notebook.parent_id.clone() {
            self.expanded.expand(&parent);
        }
        self.store.upsert_notebook(notebook);
    }

    pub fn notebook_renamed(&mut self, notebook_id: &str, name: &str) {
        self.store.rename_notebook(notebook_id, name);
    }

    pub fn notebook_deleted(&mut self, notebook_id: &str) {
        let removed = self.store.remove_notebook(notebook_id);
        self.expanded.retain(|id| !removed.iter().any(|r| r == id));
    }

    pub fn note_created(&mut self, note: &Note) {
        if let Some(parent) = note.notebook_id.as_deref() {
            self.expanded.expand(parent);
        }
        self.store.place_note(note.summary());
    }

    pub fn note_deleted(&mut self, note_id: &str) {
        self.store.remove_note(note_id);
    }

    /// Mirrors the server's copy of a note after a save or a pin toggle, so
    /// the label, pin flag and recency order follow.
    pub fn note_updated(&mut self, note: &Note) {
        self.store.refresh_note(note.summary());
    }

    // ---- keyboard ----

    pub fn focus_in(&mut self, selected: Option<&RowId>) {
        let rows = self.rows();
        self.nav.focus_in(&rows, selected);
    }

    pub fn focus_out(&mut self) {
        self.nav.focus_out();
    }

    pub fn set_focus(&mut self, id: Option<RowId>) {
        self.nav.set_focus(id);
    }

    /// Keyboard input. A drag in progress owns the row set: navigation keys
    /// are swallowed and Escape cancels the gesture.
    pub fn on_key(&mut self, key: TreeKey) -> NavEffect {
        if self.drag.is_dragging() || self.drag.is_pending() {
            if key == TreeKey::Cancel {
                self.drag.cancel();
            }
            return NavEffect::None;
        }

        let rows = project(&self.store, &self.expanded);
        self.nav.handle_key(&rows, &mut self.expanded, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{note, notebook, summary, FakeBackend};
    use drag::{DragSubject, DropTarget, PointerKind};
    use futures::executor::block_on;
    use project::RowKind;
    use pretty_assertions::assert_eq;

    // A (root) ─ B ; C (root)
    fn session() -> TreeSession {
        let mut s = TreeSession::default();
        s.reload(vec![
            notebook("A", None),
            notebook("B", Some("A")),
            notebook("C", None),
        ]);
        s
    }

    fn start_drag(s: &mut TreeSession, subject: DragSubject, over: DropTarget) {
        let d = s.drag_mut();
        d.press(subject, PointerKind::Mouse, 0.0, 0.0, 0);
        assert!(d.pointer_move(50.0, 0.0, 5));
        d.hover(Some(over));
    }

    #[test]
    fn test_scenario_drag_keyboard_and_reparent() {
        let backend = FakeBackend::with_notebooks(vec![
            notebook("A", None),
            notebook("B", Some("A")),
            notebook("C", None),
        ]);
        let mut s = session();

        // A onto its own child B: rejected, nothing sent.
        start_drag(
            &mut s,
            DragSubject::Notebook("A".to_string()),
            DropTarget::Notebook("B".to_string()),
        );
        assert_eq!(s.finish_drop(), None);
        assert!(!s.drag().is_dragging());

        // C onto A: one reparent request.
        start_drag(
            &mut s,
            DragSubject::Notebook("C".to_string()),
            DropTarget::Notebook("A".to_string()),
        );
        let m = s.finish_drop().expect("C onto A is legal");
        let ack = block_on(send_mutation(&backend, &m));
        s.apply(&m, ack);
        assert_eq!(backend.calls(), vec!["reparent C -> Some(\"A\")"]);
        assert_eq!(s.store().parent_of("C"), Some(Some("A")));
        assert!(s.expanded().contains("A"));

        // Collapse A again, focus it and expand with the keyboard.
        s.toggle_expanded("A");
        s.set_focus(Some(RowId::Notebook("A".to_string())));
        assert_eq!(s.on_key(TreeKey::Expand), NavEffect::Expanded("A".to_string()));
        assert_eq!(s.nav().focused(), Some(&RowId::Notebook("A".to_string())));
        let rows = s.rows();
        assert_eq!(rows[1].id, RowId::Notebook("B".to_string()));
        assert_eq!(s.on_key(TreeKey::Next), NavEffect::Focused(RowId::Notebook("B".to_string())));
    }

    #[test]
    fn test_drop_highlight_follows_guard() {
        let mut s = session();
        start_drag(
            &mut s,
            DragSubject::Notebook("A".to_string()),
            DropTarget::Root,
        );
        assert!(!s.accepts_drop(&DropTarget::Notebook("B".to_string())));
        assert!(!s.accepts_drop(&DropTarget::Root));
        assert!(s.accepts_drop(&DropTarget::Notebook("C".to_string())));
        s.drag_mut().cancel();
        assert!(!s.accepts_drop(&DropTarget::Notebook("C".to_string())));
    }

    #[test]
    fn test_noop_reparent_sends_nothing() {
        let mut s = session();
        assert_eq!(s.request_reparent("B", Some("A")), None);
        assert_eq!(s.request_reparent("A", None), None);
        assert_eq!(s.request_reparent("A", Some("A")), None);
        assert!(s.expanded().iter().next().is_none());
    }

    #[test]
    fn test_note_drop_expands_destination_and_moves_leaf() {
        let backend = FakeBackend::default();
        let mut s = session();
        s.notes_loaded(None, vec![summary("n1", "2024-01-01")]);
        s.notes_loaded(Some("C"), vec![]);

        start_drag(
            &mut s,
            DragSubject::Note("n1".to_string()),
            DropTarget::Notebook("C".to_string()),
        );
        let m = s.finish_drop().expect("note drop is always legal");
        assert!(s.expanded().contains("C"));

        let ack = block_on(send_mutation(&backend, &m));
        s.apply(&m, ack);
        assert_eq!(backend.calls(), vec!["move n1 -> Some(\"C\")"]);
        assert_eq!(s.store().note_location("n1"), Some(Some("C")));
        assert!(s.store().notes_in(None).is_some_and(|n| n.is_empty()));
    }

    #[test]
    fn test_failed_reparent_keeps_optimistic_expansion() {
        let backend = FakeBackend::with_notebooks(vec![notebook("C", None)]);
        let mut s = session();
        let m = s.request_reparent("C", Some("A")).expect("legal");

        backend.fail_next();
        let ack = block_on(send_mutation(&backend, &m));
        assert!(ack.is_err());
        s.apply(&m, ack);

        assert!(s.expanded().contains("A"));
        assert_eq!(s.store().parent_of("C"), Some(None));
        assert_eq!(backend.calls(), vec!["reparent C -> Some(\"A\")"]);
    }

    #[test]
    fn test_failed_note_move_leaves_leaf_lists_alone() {
        let backend = FakeBackend::default();
        let mut s = session();
        s.notes_loaded(None, vec![summary("n1", "2024-01-01")]);
        s.notes_loaded(Some("C"), vec![]);
        let m = s.request_move("n1", Some("C")).expect("known note");

        backend.fail_next();
        let ack = block_on(send_mutation(&backend, &m));
        s.apply(&m, ack);

        assert_eq!(s.store().note_location("n1"), Some(None));
        assert!(s.store().notes_in(Some("C")).is_some_and(|n| n.is_empty()));
    }

    #[test]
    fn test_pinning_moves_note_ahead_of_newer_ones() {
        let backend = FakeBackend::default();
        backend.insert_note(note("old", Some("C")));
        let mut s = session();
        s.toggle_expanded("C");
        s.notes_loaded(
            Some("C"),
            vec![summary("old", "2024-01-01"), summary("new", "2024-02-01")],
        );

        let pinned = block_on(backend.set_pinned("old", true)).expect("stored note");
        s.note_updated(&pinned);
        let labels: Vec<String> = s.rows().iter().map(|r| r.label.clone()).collect();
        assert_eq!(labels, vec!["A", "C", "Note old", "Note new"]);
        assert!(matches!(s.rows()[2].kind, RowKind::Note { is_pinned: true }));

        let unpinned = block_on(backend.set_pinned("old", false)).expect("stored note");
        s.note_updated(&unpinned);
        let labels: Vec<String> = s.rows().iter().map(|r| r.label.clone()).collect();
        assert_eq!(labels, vec!["A", "C", "Note new", "Note old"]);
        assert_eq!(backend.calls(), vec!["pin old: true", "pin old: false"]);
    }

    #[test]
    fn test_keys_are_suppressed_while_dragging() {
        let mut s = session();
        s.set_focus(Some(RowId::Notebook("A".to_string())));
        start_drag(
            &mut s,
            DragSubject::Notebook("C".to_string()),
            DropTarget::Notebook("A".to_string()),
        );

        assert_eq!(s.on_key(TreeKey::Next), NavEffect::None);
        assert_eq!(s.nav().focused(), Some(&RowId::Notebook("A".to_string())));
        assert_eq!(s.on_key(TreeKey::Cancel), NavEffect::None);
        assert!(!s.drag().is_dragging());
        assert_eq!(s.finish_drop(), None);
    }

    #[test]
    fn test_reload_prunes_expansion_and_stale_focus() {
        let mut s = session();
        s.toggle_expanded("A");
        s.toggle_expanded("B");
        s.set_focus(Some(RowId::Notebook("B".to_string())));

        s.reload(vec![notebook("A", None), notebook("C", None)]);
        assert!(s.expanded().contains("A"));
        assert!(!s.expanded().contains("B"));
        assert!(s.nav().focused_index(&s.rows()).is_none());
    }

    #[test]
    fn test_delete_notebook_cascades_expansion() {
        let mut s = session();
        s.toggle_expanded("A");
        s.toggle_expanded("B");
        s.notebook_deleted("A");
        assert!(s.expanded().iter().next().is_none());
        let ids: Vec<String> = s.rows().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["nb-C"]);
    }

    #[test]
    fn test_note_updated_refreshes_label_and_order() {
        let mut s = session();
        s.toggle_expanded("C");
        s.notes_loaded(
            Some("C"),
            vec![summary("old", "2024-01-01"), summary("new", "2024-02-01")],
        );

        let mut saved = Note {
            id: "old".to_string(),
            title: "Renamed".to_string(),
            content: String::new(),
            notebook_id: Some("C".to_string()),
            is_pinned: false,
            sort_order: 0,
            created_at: String::new(),
            updated_at: "2024-03-01".to_string(),
        };
        s.note_updated(&saved);
        let labels: Vec<String> = s.rows().iter().map(|r| r.label.clone()).collect();
        assert_eq!(labels, vec!["A", "C", "Renamed", "Note new"]);

        // A note the tree never loaded is ignored.
        saved.id = "ghost".to_string();
        s.note_updated(&saved);
        assert!(s.store().note("ghost").is_none());
    }
}
