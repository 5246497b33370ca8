//! Per-event mutable bag: the event, a typed heterogeneous data map, and
//! the dispatch-time handler snapshot.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use phasework_types::PhaseTag;

use crate::event::Event;
use crate::handler::HandlerEntry;
use crate::registry::Snapshot;
use std::sync::Arc;

/// Opaque key for the data map. Identity-based: two keys are equal only
/// if they are the same key, never by name or type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DataKey(u64);

impl DataKey {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for DataKey {
    fn default() -> Self {
        Self::new()
    }
}

/// Reserved key under which a handler panic's payload is recorded (see
/// `phase::run_handler`). Exposed so tests and diagnostics can look it up;
/// never collides with a user-created `DataKey` since it's allocated the
/// same way, just once, lazily, on first use.
pub fn handler_panic_key() -> DataKey {
    use std::sync::OnceLock;
    static KEY: OnceLock<DataKey> = OnceLock::new();
    *KEY.get_or_init(DataKey::new)
}

/// Owns one event for the duration of processing.
///
/// Created when the dispatcher accepts an event; destroyed when a
/// terminal state reports completion. Handlers read the event and the
/// data map through this type; only phase code (same crate) mutates the
/// event's completion flags, via `Event`'s `pub(crate)` setters.
pub struct EventContext {
    event: RefCell<Event>,
    data: RefCell<HashMap<DataKey, Box<dyn Any + Send>>>,
    snapshot: Arc<Snapshot>,
    catch_handler_panics: bool,
}

impl EventContext {
    pub fn new(event: Event, snapshot: Arc<Snapshot>, catch_handler_panics: bool) -> Self {
        Self {
            event: RefCell::new(event),
            data: RefCell::new(HashMap::new()),
            snapshot,
            catch_handler_panics,
        }
    }

    /// Whether a panic unwinding out of a handler should be caught and
    /// converted to `HandlerResult::Failure` (see `EngineConfig`).
    pub(crate) fn catch_handler_panics(&self) -> bool {
        self.catch_handler_panics
    }

    /// Read-only view of the event's identity and completion flags.
    pub fn event(&self) -> std::cell::Ref<'_, Event> {
        self.event.borrow()
    }

    /// Handler entries registered for `tag` in this event's dispatch-time
    /// snapshot — lets a handler inspect its siblings without being able
    /// to mutate the registration set mid-event.
    pub fn siblings(&self, tag: PhaseTag) -> Vec<Arc<HandlerEntry>> {
        self.snapshot.entries_for(tag).to_vec()
    }

    /// Fetch a value by key, if present and of the requested type.
    ///
    /// A type mismatch is not an exception, it returns `None`.
    pub fn get_data<T: Clone + 'static>(&self, key: DataKey) -> Option<T> {
        self.data
            .borrow()
            .get(&key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Overwrite (or insert) the value for `key`. Writes never fail.
    pub fn set_data<T: Send + 'static>(&self, key: DataKey, value: T) {
        self.data.borrow_mut().insert(key, Box::new(value));
    }

    /// Like `get_data`, but reports presence/type-match via the return
    /// value and writes the value into `out` on success.
    pub fn try_get_data<T: Clone + 'static>(&self, key: DataKey, out: &mut T) -> bool {
        match self.get_data::<T>(key) {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn event_mut(&self) -> std::cell::RefMut<'_, Event> {
        self.event.borrow_mut()
    }
}

impl fmt::Debug for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("event", &*self.event.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
impl EventContext {
    pub(crate) fn for_test() -> Self {
        Self::new(Event::new("test"), Arc::new(Snapshot::default()), true)
    }
}
