pub(crate) mod note_sync;
pub(crate) mod tree_sync;

use crate::api::ApiClient;
use crate::config::EnvConfig;
use crate::storage::load_expanded;
use crate::tree::drag::DragConfig;
use crate::tree::TreeSession;
use leptos::prelude::*;

pub(crate) use note_sync::AutosaveController;
pub(crate) use tree_sync::TreeSyncController;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,
    pub config: StoredValue<EnvConfig>,

    /// Sidebar tree: notebooks, loaded notes, expansion, focus and drag.
    pub tree: RwSignal<TreeSession>,
    pub tree_loading: RwSignal<bool>,
    pub tree_error: RwSignal<Option<String>>,

    /// Note shown in the editor (mirrors the `/notes/:note_id` route).
    pub selected_note_id: RwSignal<Option<String>>,
    /// Target notebook for "new note".
    pub selected_notebook_id: RwSignal<Option<String>>,
}

impl AppState {
    pub fn new() -> Self {
        let config = EnvConfig::new();
        let tree = TreeSession::new(DragConfig::default(), load_expanded());

        Self {
            api_client: RwSignal::new(ApiClient::load_from_storage()),
            config: StoredValue::new(config),
            tree: RwSignal::new(tree),
            tree_loading: RwSignal::new(false),
            tree_error: RwSignal::new(None),
            selected_note_id: RwSignal::new(None),
            selected_notebook_id: RwSignal::new(None),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
