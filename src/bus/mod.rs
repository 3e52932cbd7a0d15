//! Dead simple DDD-like event bus.
//!
//! Delivery is synchronous and depth-first: a listener that emits during its
//! own invocation causes the nested emission to be fully delivered before the
//! outer one resumes. Listener order is registration order, always.

use crate::{
    domain::{AudioBlob, SourceId},
    error::BusError,
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};
use tracing::trace;

/// The closed set of event kinds the bus dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TimeChange,
    SeekRequest,
    FileChange,
}

/// Immutable event payloads, one variant per [`EventKind`].
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Playback progressed (or jumped). The sole channel by which components
    /// other than the controller learn of playback position.
    TimeChange {
        position: f64,
        duration: Option<f64>,
    },
    /// A user asked to seek to a normalized [0, 1] position.
    SeekRequest { fraction: f64 },
    /// A new audio source was loaded. Carries the identity used for cache
    /// validation plus a handle on the raw bytes for extraction.
    FileChange { source: SourceId, bytes: AudioBlob },
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AppEvent::TimeChange { .. } => EventKind::TimeChange,
            AppEvent::SeekRequest { .. } => EventKind::SeekRequest,
            AppEvent::FileChange { .. } => EventKind::FileChange,
        }
    }
}

pub type Listener = Rc<dyn Fn(&AppEvent)>;

/// Page-lifetime pub/sub hub. Constructed once at startup and handed by
/// reference to every component; tests build their own instance.
///
/// Listener lists are owned exclusively by the bus and live for its whole
/// lifetime; there is no unregister and no replay.
pub struct EventBus {
    listeners: RefCell<HashMap<EventKind, Vec<Listener>>>,
    sealed: Cell<bool>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            listeners: RefCell::new(HashMap::new()),
            sealed: Cell::new(false),
        }
    }

    /// Appends a listener to the kind's delivery list. Fails once the bus has
    /// been sealed; that is a wiring bug and the error should propagate.
    pub fn register(&self, kind: EventKind, listener: Listener) -> Result<(), BusError> {
        if self.sealed.get() {
            return Err(BusError::Sealed);
        }

        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(listener);
        Ok(())
    }

    /// Synchronously invokes every listener registered for the event's kind,
    /// in registration order. Listeners are infallible; components translate
    /// their own failures into state rather than letting them escape here.
    pub fn emit(&self, event: &AppEvent) {
        trace!(?event, "emit");

        // Snapshot before invoking so a reentrant emit (or the runtime being
        // mid-delivery) never holds the listener map borrowed.
        let snapshot: Vec<Listener> = match self.listeners.borrow().get(&event.kind()) {
            Some(list) => list.clone(),
            None => return,
        };

        for listener in &snapshot {
            listener(event);
        }
    }

    /// One-way transition: the wiring phase is over, the runtime phase has
    /// begun. Every later `register` call fails.
    pub fn seal(&self) {
        self.sealed.set(true);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.get()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
