use crate::api::NotesBackend;
use crate::autosave::SaveStatus;
use crate::components::ui::{Alert, Button, ButtonSize, ButtonVariant, Spinner};
use crate::models::NoteDraft;
use crate::state::{AppContext, AutosaveController, TreeSyncController};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;

#[derive(Params, PartialEq, Clone, Debug)]
pub struct NoteRouteParams {
    pub note_id: Option<String>,
}

#[component]
pub fn NoteEditor() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let autosave = expect_context::<AutosaveController>();
    let sync = expect_context::<TreeSyncController>();
    let params = use_params::<NoteRouteParams>();
    let navigate = StoredValue::new(use_navigate());

    let note_id = move || {
        params
            .get()
            .ok()
            .and_then(|p| p.note_id)
            .unwrap_or_default()
    };

    let title: RwSignal<String> = RwSignal::new(String::new());
    let content: RwSignal<String> = RwSignal::new(String::new());
    // Id of the note whose content is in the fields; `None` while loading.
    let loaded_id: RwSignal<Option<String>> = RwSignal::new(None);
    let pinned: RwSignal<bool> = RwSignal::new(false);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let request_id: RwSignal<u64> = RwSignal::new(0);

    let draft = move || NoteDraft {
        title: title.get_untracked(),
        content: content.get_untracked(),
    };

    // Route change: flush the note being left, then load the new one.
    let autosave_load = autosave.clone();
    Effect::new(move |_| {
        let id = note_id();
        autosave_load.close();
        loaded_id.set(None);
        error.set(None);

        if id.trim().is_empty() {
            app_state.0.selected_note_id.set(None);
            return;
        }
        app_state.0.selected_note_id.set(Some(id.clone()));

        let req_id = request_id.get_untracked() + 1;
        request_id.set(req_id);
        loading.set(true);

        let autosave = autosave_load.clone();
        spawn_local(async move {
            let client = app_state.0.api_client.get_untracked();
            let result = client.get_note(&id).await;
            if request_id.get_untracked() != req_id {
                return;
            }
            loading.set(false);

            match result {
                Ok(note) => {
                    autosave.open(&note);
                    title.set(note.title.clone());
                    content.set(note.content.clone());
                    pinned.set(note.is_pinned);
                    app_state.0.selected_notebook_id.set(note.notebook_id.clone());
                    loaded_id.set(Some(note.id));
                }
                Err(e) => {
                    log::warn!("loading note {id} failed: {e}");
                    error.set(Some(format!("Failed to load note: {e}")));
                }
            }
        });
    });

    let autosave_cleanup = autosave.clone();
    on_cleanup(move || autosave_cleanup.close());

    let autosave_title = autosave.clone();
    let on_title_input = move |ev: web_sys::Event| {
        title.set(event_target_value(&ev));
        if let Some(id) = loaded_id.get_untracked() {
            autosave_title.on_edit(&id, draft());
        }
    };

    let autosave_blur = autosave.clone();
    let on_title_blur = move |_ev: web_sys::FocusEvent| {
        if let Some(id) = loaded_id.get_untracked() {
            autosave_blur.flush_with(&id, draft());
        }
    };

    let autosave_body = autosave.clone();
    let on_body_input = move |ev: web_sys::Event| {
        content.set(event_target_value(&ev));
        if let Some(id) = loaded_id.get_untracked() {
            autosave_body.on_edit(&id, draft());
        }
    };

    let autosave_status = autosave.clone();
    let status_label = move || {
        let id = loaded_id.get()?;
        Some(match autosave_status.status(&id) {
            SaveStatus::Saving => "Saving…",
            SaveStatus::Dirty => "Unsaved",
            SaveStatus::Clean => "Saved",
        })
    };

    let on_toggle_pin = move |_| {
        let Some(id) = loaded_id.get_untracked() else {
            return;
        };
        let want = !pinned.get_untracked();
        sync.set_pinned(id, want, move |note| {
            if loaded_id.get_untracked().as_deref() == Some(note.id.as_str()) {
                pinned.set(note.is_pinned);
            }
        });
    };

    let autosave_delete = autosave.clone();
    let on_delete = move |_| {
        let Some(id) = loaded_id.get_untracked() else {
            return;
        };
        let confirmed = window()
            .confirm_with_message("Delete this note?")
            .unwrap_or(false);
        if !confirmed {
            return;
        }
        autosave_delete.forget(&id);
        sync.delete_note(id, move || {
            navigate.with_value(|nav| nav("/", Default::default()));
        });
    };

    view! {
        <div class="flex h-full min-h-0 flex-col">
            <div class="flex items-center gap-2 border-b px-4 py-2">
                <input
                    class="min-w-0 flex-1 bg-transparent text-lg font-semibold outline-none"
                    placeholder="Untitled"
                    disabled=move || loaded_id.get().is_none()
                    prop:value=move || title.get()
                    on:input=on_title_input
                    on:blur=on_title_blur
                />
                <span class="text-xs text-muted-foreground" aria-live="polite">
                    {status_label}
                </span>
                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <Spinner class="text-muted-foreground" />
                </Show>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    attr:aria-pressed=move || pinned.get().to_string()
                    attr:disabled=move || loaded_id.get().is_none()
                    on:click=on_toggle_pin
                >
                    {move || if pinned.get() { "Unpin" } else { "Pin" }}
                </Button>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    class="text-destructive"
                    attr:title="Delete note"
                    on:click=on_delete
                >
                    "Delete"
                </Button>
            </div>

            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                <div class="px-4 pt-2">
                    <Alert>{move || error.get().unwrap_or_default()}</Alert>
                </div>
            </Show>

            <textarea
                class="min-h-0 flex-1 resize-none bg-transparent p-4 text-sm leading-relaxed outline-none"
                disabled=move || loaded_id.get().is_none()
                prop:value=move || content.get()
                on:input=on_body_input
            />
        </div>
    }
}

/// Shown at `/`: no note open.
#[component]
pub fn NoNoteSelected() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    Effect::new(move |_| app_state.0.selected_note_id.set(None));

    view! {
        <div class="flex h-full items-center justify-center text-sm text-muted-foreground">
            "Select a note or create one."
        </div>
    }
}
