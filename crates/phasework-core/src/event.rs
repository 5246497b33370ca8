//! The user-visible event payload.

use phasework_types::EventId;

/// A unit of work dispatched through the state machine.
///
/// Handlers read `type_name` and the completion flags; only the core
/// writes the flags, via the crate-private setters below. User code never
/// constructs a mutable reference to these flags directly.
#[derive(Debug)]
pub struct Event {
    id: EventId,
    type_name: &'static str,
    is_cancelled: bool,
    has_failures: bool,
    is_completed: bool,
    is_waiting: bool,
}

impl Event {
    /// Create a new event of the given type.
    ///
    /// `type_name` selects which handlers the dispatcher snapshots at
    /// dispatch time (see `HandlerRegistry::snapshot_for`).
    pub fn new(type_name: &'static str) -> Self {
        Self {
            id: EventId::next(),
            type_name,
            is_cancelled: false,
            has_failures: false,
            is_completed: false,
            is_waiting: false,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }

    pub fn has_failures(&self) -> bool {
        self.has_failures
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn is_waiting(&self) -> bool {
        self.is_waiting
    }

    pub(crate) fn set_cancelled(&mut self) {
        self.is_cancelled = true;
    }

    pub(crate) fn set_has_failures(&mut self) {
        self.has_failures = true;
    }

    pub(crate) fn set_completed(&mut self) {
        self.is_completed = true;
    }

    pub(crate) fn set_waiting(&mut self, waiting: bool) {
        self.is_waiting = waiting;
    }
}
