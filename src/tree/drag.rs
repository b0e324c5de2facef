//! Pointer-driven drag and drop over the tree rows.
//!
//! A press only becomes a drag after the pointer moved far enough (mouse)
//! or was held long enough without scrolling (touch). Anything shorter is a
//! click and is left to the row's own click handler.

use super::guard::{check_move, MoveVerdict};
use super::store::TreeStore;

/// Movement threshold in pixels to start dragging with a mouse.
const MOUSE_DISTANCE_PX: f64 = 8.0;
/// Press-and-hold delay before a touch turns into a drag.
const TOUCH_DELAY_MS: i64 = 200;
/// Finger travel tolerated during the hold; more than this is a scroll.
const TOUCH_TOLERANCE_PX: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DragConfig {
    pub mouse_distance_px: f64,
    pub touch_delay_ms: i64,
    pub touch_tolerance_px: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            mouse_distance_px: MOUSE_DISTANCE_PX,
            touch_delay_ms: TOUCH_DELAY_MS,
            touch_tolerance_px: TOUCH_TOLERANCE_PX,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PointerKind {
    Mouse,
    Touch,
}

impl PointerKind {
    /// Maps `PointerEvent.pointerType`; pens behave like a mouse.
    pub fn from_pointer_type(t: &str) -> Self {
        if t == "touch" {
            PointerKind::Touch
        } else {
            PointerKind::Mouse
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DragSubject {
    Notebook(String),
    Note(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DropTarget {
    Notebook(String),
    /// The "drop here for root level" zone.
    Root,
}

impl DropTarget {
    /// Parent the dropped item would get (`None` = root).
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            DropTarget::Notebook(id) => Some(id),
            DropTarget::Root => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
enum DragState {
    #[default]
    Idle,
    Pending {
        subject: DragSubject,
        kind: PointerKind,
        start: (f64, f64),
        pressed_at_ms: i64,
    },
    Dragging {
        subject: DragSubject,
        over: Option<DropTarget>,
    },
}

/// Result of releasing the pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DropOutcome {
    /// The press never became a drag; let the click through.
    Click,
    /// Released over nothing droppable, or cancelled.
    Discarded,
    /// CycleGuard said no. `Unchanged` is the "already there" no-op.
    Rejected(MoveVerdict),
    Reparent {
        notebook_id: String,
        new_parent_id: Option<String>,
    },
    MoveNote {
        note_id: String,
        notebook_id: Option<String>,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DragController {
    config: DragConfig,
    state: DragState,
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

impl DragController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            state: DragState::Idle,
        }
    }

    pub fn config(&self) -> DragConfig {
        self.config
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, DragState::Pending { .. })
    }

    pub fn subject(&self) -> Option<&DragSubject> {
        match &self.state {
            DragState::Dragging { subject, .. } => Some(subject),
            _ => None,
        }
    }

    /// Current drop candidate, for highlighting.
    pub fn drop_target(&self) -> Option<&DropTarget> {
        match &self.state {
            DragState::Dragging { over, .. } => over.as_ref(),
            _ => None,
        }
    }

    /// Pointer went down on a row.
    pub fn press(&mut self, subject: DragSubject, kind: PointerKind, x: f64, y: f64, now_ms: i64) {
        self.state = DragState::Pending {
            subject,
            kind,
            start: (x, y),
            pressed_at_ms: now_ms,
        };
    }

    /// Pointer moved. Returns true when this move activated the drag.
    pub fn pointer_move(&mut self, x: f64, y: f64, now_ms: i64) -> bool {
        let DragState::Pending {
            subject,
            kind,
            start,
            pressed_at_ms,
        } = &self.state
        else {
            return false;
        };

        let moved = distance(*start, (x, y));
        let held = now_ms - *pressed_at_ms >= self.config.touch_delay_ms;
        let activate = match kind {
            PointerKind::Mouse if moved >= self.config.mouse_distance_px => Some(true),
            PointerKind::Mouse => None,
            PointerKind::Touch if held => Some(true),
            // Finger travelled before the hold elapsed: it is a scroll.
            PointerKind::Touch if moved > self.config.touch_tolerance_px => Some(false),
            PointerKind::Touch => None,
        };

        let subject = subject.clone();
        match activate {
            Some(true) => {
                self.activate(subject);
                true
            }
            Some(false) => {
                self.state = DragState::Idle;
                false
            }
            None => false,
        }
    }

    /// Pointer moved over whatever `under` resolves to. Activates a pending
    /// gesture and keeps the drop candidate current while dragging; `under`
    /// is only consulted once the drag is active. Returns whether a drag is
    /// active afterwards.
    pub fn track(
        &mut self,
        x: f64,
        y: f64,
        now_ms: i64,
        under: impl FnOnce() -> Option<DropTarget>,
    ) -> bool {
        self.pointer_move(x, y, now_ms);
        if !self.is_dragging() {
            return false;
        }
        self.hover(under());
        true
    }

    /// Hold timer for touch presses that have not moved.
    pub fn tick(&mut self, now_ms: i64) -> bool {
        let subject = match &self.state {
            DragState::Pending {
                subject,
                kind: PointerKind::Touch,
                pressed_at_ms,
                ..
            } if now_ms - *pressed_at_ms >= self.config.touch_delay_ms => subject.clone(),
            _ => return false,
        };
        self.activate(subject);
        true
    }

    /// Pointer entered a droppable row (or left all of them with `None`).
    pub fn hover(&mut self, target: Option<DropTarget>) {
        if let DragState::Dragging { subject, over } = &mut self.state {
            let onto_self = matches!(
                (&*subject, &target),
                (DragSubject::Notebook(a), Some(DropTarget::Notebook(b))) if a == b
            );
            *over = if onto_self { None } else { target };
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Pointer released. Decides what, if anything, the drop means.
    pub fn release(&mut self, tree: &TreeStore) -> DropOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DropOutcome::Discarded,
            DragState::Pending { .. } => DropOutcome::Click,
            DragState::Dragging { over: None, .. } => DropOutcome::Discarded,
            DragState::Dragging {
                subject: DragSubject::Notebook(notebook_id),
                over: Some(target),
            } => match check_move(tree, &notebook_id, target.parent_id()) {
                MoveVerdict::Legal => DropOutcome::Reparent {
                    notebook_id,
                    new_parent_id: target.parent_id().map(str::to_string),
                },
                verdict => DropOutcome::Rejected(verdict),
            },
            DragState::Dragging {
                subject: DragSubject::Note(note_id),
                over: Some(target),
            } => DropOutcome::MoveNote {
                note_id,
                notebook_id: target.parent_id().map(str::to_string),
            },
        }
    }

    fn activate(&mut self, subject: DragSubject) {
        self.state = DragState::Dragging {
            subject,
            over: None,
        };
    }
}
