//! Debounced per-note autosave.
//!
//! The engine does no I/O. Edits are buffered per entity; the engine asks
//! its driver for timers (`TimerRequest`) and hands out writes (`SaveJob`).
//! The driver performs each write and reports back through `complete`.
//!
//! At most one write per entity is in flight. Edits made meanwhile coalesce
//! into a single follow-up write carrying the latest content.

use crate::api::{ApiResult, NotesBackend};
use crate::models::{Note, NoteDraft};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SaveStatus {
    Clean,
    Dirty,
    Saving,
}

/// (Re)arm the entity's timer. Any earlier timer for it is superseded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TimerRequest {
    pub entity_id: String,
    pub delay_ms: i64,
}

/// One write the driver must perform and then pass to `complete`.
#[must_use = "a save job must be sent and reported back with `complete`"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SaveJob<C> {
    pub entity_id: String,
    pub content: C,
    ticket: u64,
}

impl SaveJob<NoteDraft> {
    pub(crate) async fn send<B: NotesBackend>(&self, backend: &B) -> ApiResult<Note> {
        backend.save_note(&self.entity_id, &self.content).await
    }
}

#[derive(Debug)]
struct Entry<C> {
    /// Latest unsaved content.
    buffered: Option<C>,
    /// Last content known to be persisted.
    baseline: Option<C>,
    deadline_ms: Option<i64>,
    in_flight: Option<u64>,
    /// A flush was requested while a write was in flight.
    follow_up: bool,
}

impl<C> Default for Entry<C> {
    fn default() -> Self {
        Self {
            buffered: None,
            baseline: None,
            deadline_ms: None,
            in_flight: None,
            follow_up: false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct AutosaveEngine<C> {
    quiet_ms: i64,
    entries: HashMap<String, Entry<C>>,
    active: Option<String>,
    next_ticket: u64,
}

impl<C: Clone + PartialEq> AutosaveEngine<C> {
    pub fn new(quiet_ms: i64) -> Self {
        Self {
            quiet_ms,
            entries: HashMap::new(),
            active: None,
            next_ticket: 0,
        }
    }

    #[allow(dead_code)]
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Seeds the persisted baseline, typically right after loading.
    pub fn track(&mut self, entity_id: &str, persisted: C) {
        let entry = self.entries.entry(entity_id.to_string()).or_default();
        if entry.buffered.as_ref() == Some(&persisted) {
            entry.buffered = None;
            entry.deadline_ms = None;
        }
        entry.baseline = Some(persisted);
    }

    /// Buffers an edit and restarts the quiet period.
    pub fn record(&mut self, entity_id: &str, content: C, now_ms: i64) -> TimerRequest {
        let entry = self.entries.entry(entity_id.to_string()).or_default();
        entry.buffered = Some(content);
        entry.deadline_ms = Some(now_ms + self.quiet_ms);
        TimerRequest {
            entity_id: entity_id.to_string(),
            delay_ms: self.quiet_ms,
        }
    }

    /// A timer fired. Timers that fire before the current deadline belong to
    /// an edit that has since been superseded and are ignored.
    pub fn on_timer(&mut self, entity_id: &str, now_ms: i64) -> Option<SaveJob<C>> {
        let entry = self.entries.get_mut(entity_id)?;
        match entry.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                entry.deadline_ms = None;
                self.take_job(entity_id)
            }
            _ => None,
        }
    }

    /// Writes whatever is buffered now, without waiting for the timer.
    pub fn flush(&mut self, entity_id: &str) -> Option<SaveJob<C>> {
        let entry = self.entries.get_mut(entity_id)?;
        entry.deadline_ms = None;
        self.take_job(entity_id)
    }

    /// Buffers `content` and flushes it immediately.
    pub fn flush_with(&mut self, entity_id: &str, content: C) -> Option<SaveJob<C>> {
        let entry = self.entries.entry(entity_id.to_string()).or_default();
        entry.buffered = Some(content);
        self.flush(entity_id)
    }

    /// Reports a finished write. Returns the follow-up write when more edits
    /// were flushed while this one was in flight.
    ///
    /// A failed write is not retried; its content goes back into the buffer
    /// (unless newer content is already there) so the next flush carries it.
    pub fn complete(&mut self, job: SaveJob<C>, ok: bool) -> Option<SaveJob<C>> {
        let entry = self.entries.get_mut(&job.entity_id)?;
        if entry.in_flight != Some(job.ticket) {
            return None;
        }
        entry.in_flight = None;

        if ok {
            if entry.buffered.as_ref() == Some(&job.content) {
                entry.buffered = None;
            }
            entry.baseline = Some(job.content);
        } else {
            log::warn!("autosave of {} failed; keeping content buffered", job.entity_id);
            if entry.buffered.is_none() {
                entry.buffered = Some(job.content);
            }
        }

        if std::mem::take(&mut entry.follow_up) {
            self.take_job(&job.entity_id)
        } else {
            None
        }
    }

    /// Makes `entity_id` the active entity, flushing the previous one.
    pub fn switch_to(&mut self, entity_id: Option<&str>) -> Option<SaveJob<C>> {
        if self.active.as_deref() == entity_id {
            return None;
        }
        let previous = std::mem::replace(&mut self.active, entity_id.map(str::to_string));
        previous.and_then(|id| self.flush(&id))
    }

    /// Flushes every entity with pending content. Jobs for entities that are
    /// mid-write are deferred to their `complete`.
    pub fn teardown(&mut self) -> Vec<SaveJob<C>> {
        self.active = None;
        let pending: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.buffered.is_some())
            .map(|(id, _)| id.clone())
            .collect();
        pending.iter().filter_map(|id| self.flush(id)).collect()
    }

    /// Drops all state for an entity (e.g. the note was deleted).
    pub fn forget(&mut self, entity_id: &str) {
        self.entries.remove(entity_id);
        if self.active.as_deref() == Some(entity_id) {
            self.active = None;
        }
    }

    pub fn status(&self, entity_id: &str) -> SaveStatus {
        let Some(entry) = self.entries.get(entity_id) else {
            return SaveStatus::Clean;
        };
        if entry.in_flight.is_some() {
            SaveStatus::Saving
        } else if entry.buffered.is_some() && entry.buffered != entry.baseline {
            SaveStatus::Dirty
        } else {
            SaveStatus::Clean
        }
    }

    fn take_job(&mut self, entity_id: &str) -> Option<SaveJob<C>> {
        let entry = self.entries.get_mut(entity_id)?;
        if entry.in_flight.is_some() {
            if entry.buffered.is_some() {
                entry.follow_up = true;
            }
            return None;
        }

        let content = entry.buffered.take()?;
        if entry.baseline.as_ref() == Some(&content) {
            log::debug!("autosave of {entity_id} skipped: unchanged");
            return None;
        }

        self.next_ticket += 1;
        entry.in_flight = Some(self.next_ticket);
        Some(SaveJob {
            entity_id: entity_id.to_string(),
            content,
            ticket: self.next_ticket,
        })
    }
}
