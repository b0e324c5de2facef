use crate::components::editor::{NoNoteSelected, NoteEditor};
use crate::components::sidebar::NotebookTree;
use crate::state::{AppContext, AppState, AutosaveController, TreeSyncController};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let app_state = AppContext(AppState::new());
    provide_context(app_state);
    provide_context(TreeSyncController::new(app_state));
    provide_context(AutosaveController::new(app_state));

    // Router hooks (`use_navigate`, `use_params`) need the sidebar inside <Router>.
    view! {
        <Router>
            <div class="flex h-screen min-h-0 bg-background text-foreground">
                <NotebookTree />
                <main class="min-w-0 flex-1">
                    <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                        <Route path=path!("notes/:note_id") view=NoteEditor />
                        <Route path=path!("") view=NoNoteSelected />
                    </Routes>
                </main>
            </div>
        </Router>
    }
}
