use crate::components::ui::{
    tree_row_class, Alert, Button, ButtonSize, ButtonVariant, Panel, PanelHeader, Spinner,
};
use crate::state::{AppContext, TreeSyncController};
use crate::tree::drag::{DragSubject, DropTarget, PointerKind};
use crate::tree::nav::{NavEffect, TreeKey};
use crate::tree::project::{FlatRow, RowId, RowKind};
use crate::util::now_ms;
use icons::{ChevronDown, ChevronRight};
use leptos::ev;
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use wasm_bindgen::JsCast;

const INDENT_PX: usize = 16;

fn scroll_row_into_view(id: &RowId) {
    let Some(el) = document().get_element_by_id(&id.dom_id()) else {
        return;
    };
    let opts = web_sys::ScrollIntoViewOptions::new();
    opts.set_block(web_sys::ScrollLogicalPosition::Nearest);
    el.scroll_into_view_with_scroll_into_view_options(&opts);
}

/// Drop zone under the pointer. Rows mark themselves with `data-drop`.
fn drop_target_at(x: i32, y: i32) -> Option<DropTarget> {
    let el = document().element_from_point(x as f32, y as f32)?;
    let zone = el.closest("[data-drop]").ok().flatten()?;
    match zone.get_attribute("data-drop")?.as_str() {
        "root" => Some(DropTarget::Root),
        _ => zone
            .get_attribute("data-notebook-id")
            .map(DropTarget::Notebook),
    }
}

fn subject_of(id: &RowId) -> DragSubject {
    match id {
        RowId::Notebook(nb) => DragSubject::Notebook(nb.clone()),
        RowId::Note(n) => DragSubject::Note(n.clone()),
    }
}

fn is_text_input(ev: &web_sys::KeyboardEvent) -> bool {
    ev.target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        .is_some()
}

#[component]
pub fn NotebookTree() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = expect_context::<TreeSyncController>();
    let navigate = StoredValue::new(use_navigate());

    let tree = app_state.0.tree;
    let selected_note = app_state.0.selected_note_id;
    let selected_notebook = app_state.0.selected_notebook_id;

    let rows = Memo::new(move |_| tree.with(|t| t.rows()));
    let focused = Memo::new(move |_| tree.with(|t| t.nav().focused().cloned()));
    let drag_subject = Memo::new(move |_| {
        tree.with(|t| t.drag().is_dragging().then(|| t.drag().subject().cloned()).flatten())
    });
    // Touch panning would fire `pointercancel` mid-gesture.
    let gesture_active = Memo::new(move |_| {
        tree.with(|t| t.drag().is_pending() || t.drag().is_dragging())
    });
    let drop_target = Memo::new(move |_| {
        tree.with(|t| t.drag().drop_target().filter(|d| t.accepts_drop(d)).cloned())
    });

    // Inline rename / create state.
    let editing: RwSignal<Option<String>> = RwSignal::new(None);
    let edit_name: RwSignal<String> = RwSignal::new(String::new());
    let new_notebook_name: RwSignal<String> = RwSignal::new(String::new());

    // The click that follows a completed drop must not select the row.
    let swallow_click = StoredValue::new(false);

    let open_note = move |id: &str| {
        let path = format!("/notes/{}", urlencoding::encode(id));
        navigate.with_value(|nav| nav(&path, Default::default()));
    };

    Effect::new(move |_| sync.load());

    // Pointer tracking happens on the window so a drag can leave its row.
    let move_handle = window_event_listener(ev::pointermove, move |ev: web_sys::PointerEvent| {
        let active = tree.with_untracked(|t| t.drag().is_pending() || t.drag().is_dragging());
        if !active {
            return;
        }
        let (x, y) = (ev.client_x(), ev.client_y());
        let dragging = tree
            .try_update(|t| {
                t.drag_mut()
                    .track(x as f64, y as f64, now_ms(), || drop_target_at(x, y))
            })
            .unwrap_or(false);
        if dragging {
            ev.prevent_default();
        }
    });
    let up_handle = window_event_listener(ev::pointerup, move |ev: web_sys::PointerEvent| {
        if tree.with_untracked(|t| t.drag().is_dragging()) {
            let target = drop_target_at(ev.client_x(), ev.client_y());
            tree.update(|t| t.drag_mut().hover(target));
            swallow_click.set_value(true);
            sync.finish_drop();
        } else if tree.with_untracked(|t| t.drag().is_pending()) {
            tree.update(|t| t.drag_mut().cancel());
        }
    });
    let cancel_handle = window_event_listener(ev::pointercancel, move |_ev: web_sys::PointerEvent| {
        tree.update(|t| t.drag_mut().cancel());
    });
    on_cleanup(move || {
        move_handle.remove();
        up_handle.remove();
        cancel_handle.remove();
    });

    let on_pointerdown = move |id: RowId, ev: web_sys::PointerEvent| {
        // A drop that ended over another row clicks their common ancestor,
        // which never clears the flag.
        swallow_click.set_value(false);
        let kind = PointerKind::from_pointer_type(&ev.pointer_type());
        if kind == PointerKind::Mouse && ev.button() != 0 {
            return;
        }
        if editing.get_untracked().is_some() {
            return;
        }
        let (x, y) = (ev.client_x() as f64, ev.client_y() as f64);
        tree.update(|t| t.drag_mut().press(subject_of(&id), kind, x, y, now_ms()));

        if kind == PointerKind::Touch {
            let delay = tree.with_untracked(|t| t.drag().config().touch_delay_ms);
            let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
                tree.update(|t| {
                    t.drag_mut().tick(now_ms());
                });
            });
            let _ = window().set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                delay as i32,
            );
        }
    };

    let on_row_click = move |row: FlatRow| {
        if swallow_click.get_value() {
            swallow_click.set_value(false);
            return;
        }
        tree.update(|t| t.set_focus(Some(row.id.clone())));
        match &row.id {
            RowId::Notebook(id) => {
                selected_notebook.set(Some(id.clone()));
                sync.toggle(id);
            }
            RowId::Note(id) => {
                selected_notebook.set(row.parent_id.clone());
                open_note(id);
            }
        }
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        if is_text_input(&ev) {
            return;
        }
        let Some(key) = TreeKey::from_key(&ev.key()) else {
            return;
        };
        ev.prevent_default();

        match sync.on_key(key) {
            NavEffect::Focused(id) => scroll_row_into_view(&id),
            NavEffect::Activate(RowId::Note(id)) => open_note(&id),
            _ => {}
        }
    };

    let on_focus = move |_ev: web_sys::FocusEvent| {
        let selected = selected_note.get_untracked().map(RowId::Note).or_else(|| {
            selected_notebook.get_untracked().map(RowId::Notebook)
        });
        tree.update(|t| t.focus_in(selected.as_ref()));
    };
    let on_blur = move |_ev: web_sys::FocusEvent| tree.update(|t| t.focus_out());

    let commit_rename = move |id: String| {
        if editing.get_untracked().as_deref() != Some(id.as_str()) {
            return;
        }
        editing.set(None);
        sync.rename_notebook(id, edit_name.get_untracked());
    };

    let create_notebook = move || {
        let name = new_notebook_name.get_untracked();
        if name.trim().is_empty() {
            return;
        }
        new_notebook_name.set(String::new());
        sync.create_notebook(name, selected_notebook.get_untracked());
    };

    let create_note = move || {
        let notebook_id = selected_notebook.get_untracked();
        sync.create_note(notebook_id, move |note| open_note(&note.id));
    };

    let delete_notebook = move |id: String, name: String| {
        let confirmed = window()
            .confirm_with_message(&format!("Delete notebook \"{name}\" and everything in it?"))
            .unwrap_or(false);
        if confirmed {
            sync.delete_notebook(id);
        }
    };

    let render_row = move |row: FlatRow| {
        let id = row.id.clone();
        let dom_id = id.dom_id();
        let is_focused = focused.get().as_ref() == Some(&id);
        let is_selected = match &id {
            RowId::Notebook(nb) => {
                selected_note.get().is_none() && selected_notebook.get().as_deref() == Some(nb.as_str())
            }
            RowId::Note(n) => selected_note.get().as_deref() == Some(n.as_str()),
        };
        let is_drop = matches!(
            (&id, drop_target.get()),
            (RowId::Notebook(nb), Some(DropTarget::Notebook(t))) if *nb == t
        );
        let is_dragged = drag_subject.get().is_some_and(|s| subject_of(&id) == s);
        // Reactive on its own so a press does not re-render the row under the pointer.
        let class = move || {
            tree_row_class(is_selected, is_focused, is_drop, is_dragged, gesture_active.get())
        };
        let padding = format!("padding-left: {}px", row.depth * INDENT_PX + 8);

        let notebook_id = id.notebook_id().map(str::to_string);
        let is_editing = notebook_id.is_some() && editing.get() == notebook_id;
        let aria_expanded = row.has_children().then(|| row.is_expanded().to_string());

        let chevron = match row.kind {
            RowKind::Notebook { has_children: true, is_expanded, .. } => {
                let nb = notebook_id.clone().unwrap_or_default();
                view! {
                    <button
                        class="rounded p-0.5 hover:bg-accent"
                        tabindex="-1"
                        on:pointerdown=move |ev: web_sys::PointerEvent| ev.stop_propagation()
                        on:click=move |ev: web_sys::MouseEvent| {
                            ev.stop_propagation();
                            sync.toggle(&nb);
                        }
                    >
                        {if is_expanded {
                            view! { <ChevronDown class="size-3.5" /> }.into_any()
                        } else {
                            view! { <ChevronRight class="size-3.5" /> }.into_any()
                        }}
                    </button>
                }
                .into_any()
            }
            _ => view! { <span class="inline-block w-[18px]" /> }.into_any(),
        };

        let trailing = match row.kind {
            RowKind::Notebook { note_count, .. } => {
                let nb_rename = notebook_id.clone().unwrap_or_default();
                let nb_delete = nb_rename.clone();
                let label_rename = row.label.clone();
                let label_delete = row.label.clone();
                let nb_lift = nb_rename.clone();
                let lift = row.parent_id.is_some().then(|| {
                    view! {
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Icon
                            attr:title="Move to top level"
                            attr:tabindex="-1"
                            on:pointerdown=move |ev: web_sys::PointerEvent| ev.stop_propagation()
                            on:click=move |ev: web_sys::MouseEvent| {
                                ev.stop_propagation();
                                sync.request_reparent(&nb_lift, None);
                            }
                        >
                            <span class="text-xs">"⇱"</span>
                        </Button>
                    }
                });
                view! {
                    <div class="flex shrink-0 items-center gap-1">
                    <span class="text-xs text-muted-foreground">{note_count}</span>
                    <div class="hidden items-center gap-1 group-hover:flex">
                        {lift}
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Icon
                            attr:title="Rename"
                            attr:tabindex="-1"
                            on:pointerdown=move |ev: web_sys::PointerEvent| ev.stop_propagation()
                            on:click=move |ev: web_sys::MouseEvent| {
                                ev.stop_propagation();
                                edit_name.set(label_rename.clone());
                                editing.set(Some(nb_rename.clone()));
                            }
                        >
                            <span class="text-xs">"✎"</span>
                        </Button>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Icon
                            class="text-destructive"
                            attr:title="Delete"
                            attr:tabindex="-1"
                            on:pointerdown=move |ev: web_sys::PointerEvent| ev.stop_propagation()
                            on:click=move |ev: web_sys::MouseEvent| {
                                ev.stop_propagation();
                                delete_notebook(nb_delete.clone(), label_delete.clone());
                            }
                        >
                            <span class="text-xs">"✕"</span>
                        </Button>
                    </div>
                    </div>
                }
                .into_any()
            }
            RowKind::Note { is_pinned: true } => {
                view! { <span class="text-xs text-muted-foreground" title="Pinned">"•"</span> }
                    .into_any()
            }
            RowKind::Note { .. } => ().into_any(),
        };

        let label = if is_editing {
            let nb_commit = notebook_id.clone().unwrap_or_default();
            let nb_blur = nb_commit.clone();
            view! {
                <input
                    class="min-w-0 flex-1 rounded bg-background px-1 py-0.5 text-sm outline-none"
                    prop:value=move || edit_name.get()
                    autofocus=true
                    on:input=move |ev: web_sys::Event| edit_name.set(event_target_value(&ev))
                    on:pointerdown=move |ev: web_sys::PointerEvent| ev.stop_propagation()
                    on:click=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                    on:blur=move |_| commit_rename(nb_blur.clone())
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        match ev.key().as_str() {
                            "Enter" => commit_rename(nb_commit.clone()),
                            "Escape" => editing.set(None),
                            _ => {}
                        }
                    }
                />
            }
            .into_any()
        } else {
            view! { <span class="min-w-0 flex-1 truncate">{row.label.clone()}</span> }.into_any()
        };

        let drop_attr = notebook_id.as_ref().map(|_| "notebook");
        let id_down = id.clone();
        let row_click = row.clone();

        view! {
            <div
                id=dom_id
                role="treeitem"
                attr:aria-level=(row.depth + 1).to_string()
                aria-expanded=aria_expanded
                aria-selected=is_selected.to_string()
                data-drop=drop_attr
                data-notebook-id=notebook_id.clone()
                class=class
                style=padding
                on:pointerdown=move |ev: web_sys::PointerEvent| on_pointerdown(id_down.clone(), ev)
                on:click=move |_| on_row_click(row_click.clone())
            >
                {chevron}
                {label}
                {trailing}
            </div>
        }
    };

    view! {
        <Panel class="w-72">
            <PanelHeader>
                <span class="text-sm font-semibold">"Notebooks"</span>
                <div class="flex items-center gap-1">
                    <Show when=move || app_state.0.tree_loading.get() fallback=|| ().into_view()>
                        <Spinner class="text-muted-foreground" />
                    </Show>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Icon
                        attr:title="New note"
                        on:click=move |_| create_note()
                    >
                        <span class="text-xs text-muted-foreground">"+"</span>
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Icon
                        attr:title="Refresh"
                        on:click=move |_| sync.load()
                    >
                        <span class="text-xs text-muted-foreground">"↻"</span>
                    </Button>
                </div>
            </PanelHeader>

            <div class="px-3 pb-2">
                <input
                    class="h-8 w-full rounded-md border bg-transparent px-2 text-sm outline-none"
                    placeholder=move || {
                        if selected_notebook.get().is_some() { "New sub-notebook…" } else { "New notebook…" }
                    }
                    prop:value=move || new_notebook_name.get()
                    on:input=move |ev: web_sys::Event| new_notebook_name.set(event_target_value(&ev))
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Enter" {
                            create_notebook();
                        }
                    }
                />
            </div>

            <Show when=move || app_state.0.tree_error.get().is_some() fallback=|| ().into_view()>
                <div class="px-3 pb-2">
                    <Alert>{move || app_state.0.tree_error.get().unwrap_or_default()}</Alert>
                </div>
            </Show>

            <div
                role="tree"
                tabindex="0"
                aria-label="Notebooks"
                aria-activedescendant=move || focused.get().map(|id| id.dom_id())
                class=move || {
                    if gesture_active.get() {
                        "min-h-0 flex-1 overflow-y-auto px-1 outline-none touch-none"
                    } else {
                        "min-h-0 flex-1 overflow-y-auto px-1 outline-none"
                    }
                }
                on:keydown=on_keydown
                on:focus=on_focus
                on:blur=on_blur
            >
                {move || rows.get().into_iter().map(render_row).collect_view()}

                <Show when=move || drag_subject.get().is_some() fallback=|| ().into_view()>
                    <div
                        data-drop="root"
                        class=move || {
                            if drop_target.get() == Some(DropTarget::Root) {
                                "mx-2 my-1 flex h-8 items-center justify-center rounded-md border-2 border-dashed border-primary bg-primary/10 text-primary"
                            } else {
                                "mx-2 my-1 flex h-8 items-center justify-center rounded-md border-2 border-dashed text-muted-foreground"
                            }
                        }
                    >
                        <span class="text-xs">"Drop here for root level"</span>
                    </div>
                </Show>
            </div>
        </Panel>
    }
}
