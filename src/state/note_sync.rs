use crate::autosave::{AutosaveEngine, SaveJob, SaveStatus, TimerRequest};
use crate::models::{Note, NoteDraft};
use crate::state::AppContext;
use crate::util::now_ms;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wasm_bindgen::JsCast;

/// Browser driver for `AutosaveEngine`.
///
/// Owns the window timers, performs the writes and mirrors saved notes into
/// the sidebar tree. Flushes everything on `pagehide`.
#[derive(Clone)]
pub(crate) struct AutosaveController {
    app_state: AppContext,
    engine: Arc<Mutex<AutosaveEngine<NoteDraft>>>,

    /// Per-note debounce timer ids.
    timers: Arc<Mutex<HashMap<String, i32>>>,

    /// Bumped whenever engine state changes so views can re-read `status`.
    revision: RwSignal<u64>,

    _pagehide_handle: StoredValue<Option<WindowListenerHandle>>,
}

impl AutosaveController {
    pub fn new(app_state: AppContext) -> Self {
        let quiet_ms = app_state.0.config.with_value(|c| c.autosave_ms);
        let s = Self {
            app_state,
            engine: Arc::new(Mutex::new(AutosaveEngine::new(quiet_ms))),
            timers: Arc::new(Mutex::new(HashMap::new())),
            revision: RwSignal::new(0),
            _pagehide_handle: StoredValue::new(None),
        };

        let s2 = s.clone();
        let pagehide = window_event_listener(ev::pagehide, move |_ev: web_sys::PageTransitionEvent| {
            s2.teardown();
        });
        s._pagehide_handle.set_value(Some(pagehide));

        s
    }

    fn with_engine<R>(&self, f: impl FnOnce(&mut AutosaveEngine<NoteDraft>) -> R) -> Option<R> {
        let out = self.engine.lock().ok().map(|mut e| f(&mut *e));
        self.revision.update(|r| *r += 1);
        out
    }

    /// Reactive save indicator for one note.
    pub fn status(&self, note_id: &str) -> SaveStatus {
        self.revision.track();
        self.engine
            .lock()
            .ok()
            .map(|e| e.status(note_id))
            .unwrap_or(SaveStatus::Clean)
    }

    /// A note was opened: it becomes the active one and its persisted
    /// content becomes the baseline. The previously open note is flushed.
    pub fn open(&self, note: &Note) {
        let job = self.with_engine(|e| {
            let job = e.switch_to(Some(note.id.as_str()));
            e.track(&note.id, NoteDraft::of(note));
            job
        });
        self.run(job.flatten());
    }

    /// The editor closed without opening another note.
    pub fn close(&self) {
        let job = self.with_engine(|e| e.switch_to(None)).flatten();
        self.run(job);
    }

    pub fn on_edit(&self, note_id: &str, draft: NoteDraft) {
        if let Some(req) = self.with_engine(|e| e.record(note_id, draft, now_ms())) {
            self.arm_timer(req);
        }
    }

    /// Saves the given content now (title blur).
    pub fn flush_with(&self, note_id: &str, draft: NoteDraft) {
        self.clear_timer(note_id);
        let job = self.with_engine(|e| e.flush_with(note_id, draft)).flatten();
        self.run(job);
    }

    /// The note is gone; unsaved edits are dropped.
    pub fn forget(&self, note_id: &str) {
        self.clear_timer(note_id);
        let _ = self.with_engine(|e| e.forget(note_id));
    }

    pub fn teardown(&self) {
        let ids: Vec<String> = self
            .timers
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        for id in ids {
            self.clear_timer(&id);
        }

        for job in self.with_engine(|e| e.teardown()).unwrap_or_default() {
            self.run(Some(job));
        }
    }

    fn clear_timer(&self, note_id: &str) {
        let Some(win) = web_sys::window() else {
            return;
        };
        if let Ok(mut map) = self.timers.lock() {
            if let Some(tid) = map.remove(note_id) {
                win.clear_timeout_with_handle(tid);
            }
        }
    }

    fn arm_timer(&self, req: TimerRequest) {
        let Some(win) = web_sys::window() else {
            return;
        };
        self.clear_timer(&req.entity_id);

        let s2 = self.clone();
        let id = req.entity_id.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            if let Ok(mut map) = s2.timers.lock() {
                map.remove(&id);
            }
            let job = s2.with_engine(|e| e.on_timer(&id, now_ms())).flatten();
            s2.run(job);
        });

        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                req.delay_ms as i32,
            )
            .unwrap_or(0);

        if let Ok(mut map) = self.timers.lock() {
            map.insert(req.entity_id, tid);
        }
    }

    /// Performs one write, reports it back and chains the follow-up write.
    fn run(&self, job: Option<SaveJob<NoteDraft>>) {
        let Some(job) = job else {
            return;
        };

        let s2 = self.clone();
        spawn_local(async move {
            let client = s2.app_state.0.api_client.get_untracked();
            let ok = match job.send(&client).await {
                Ok(note) => {
                    s2.app_state.0.tree.update(|t| t.note_updated(&note));
                    true
                }
                Err(e) => {
                    log::warn!("saving note {} failed: {e}", job.entity_id);
                    false
                }
            };
            let next = s2.with_engine(|e| e.complete(job, ok)).flatten();
            s2.run(next);
        });
    }
}
