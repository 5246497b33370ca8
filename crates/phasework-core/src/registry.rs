//! Handler registry: per-event-type ordered sets of handler entries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use phasework_types::{HandlerId, PhaseTag};

use crate::handler::HandlerEntry;

/// Registered handlers for one event type, grouped by phase tag.
///
/// Reads (`list_for`, `snapshot_for`) and writes (`register`,
/// `unregister`) share one lock, matching the "read under a lock during
/// dispatch snapshotting; writes acquire the same lock" resource model.
#[derive(Default)]
struct TypeEntries {
    by_phase: HashMap<PhaseTag, Vec<Arc<HandlerEntry>>>,
}

impl TypeEntries {
    fn insert(&mut self, entry: Arc<HandlerEntry>) {
        let phase = entry.phase();
        let bucket = self.by_phase.entry(phase).or_default();
        bucket.push(entry);
        // Stable sort by priority ordinal keeps registration order as the
        // tiebreaker, satisfying "ties broken by registration order".
        bucket.sort_by_key(|e| e.priority().ordinal());
    }

    fn remove(&mut self, id: HandlerId) -> bool {
        let mut removed = false;
        for bucket in self.by_phase.values_mut() {
            let before = bucket.len();
            bucket.retain(|e| e.id() != id);
            removed |= bucket.len() != before;
        }
        removed
    }
}

/// Ordered, per-event-type collection of handler entries.
///
/// Registration/deregistration is by id. `snapshot_for` takes the
/// dispatch-time snapshot that later registrations cannot affect — the
/// registry itself stays live and mutable across many dispatches.
pub struct HandlerRegistry {
    by_type: RwLock<HashMap<&'static str, TypeEntries>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            by_type: RwLock::new(HashMap::new()),
        }
    }

    /// Register a handler entry for `event_type`. Returns its id.
    pub fn register(&self, event_type: &'static str, entry: HandlerEntry) -> HandlerId {
        let id = entry.id();
        let entry = Arc::new(entry);
        let mut guard = self.by_type.write().expect("registry lock poisoned");
        guard.entry(event_type).or_default().insert(entry);
        id
    }

    /// Remove a handler entry by id, across all event types. Returns
    /// whether an entry was actually removed.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut guard = self.by_type.write().expect("registry lock poisoned");
        let mut removed = false;
        for entries in guard.values_mut() {
            removed |= entries.remove(id);
        }
        removed
    }

    /// Ordered handler entries for `event_type` at phase `tag`.
    ///
    /// Ascending priority ordinal, ties by registration order (stable).
    pub fn list_for(&self, event_type: &str, tag: PhaseTag) -> Vec<Arc<HandlerEntry>> {
        let guard = self.by_type.read().expect("registry lock poisoned");
        guard
            .get(event_type)
            .and_then(|entries| entries.by_phase.get(&tag))
            .cloned()
            .unwrap_or_default()
    }

    /// Take the full dispatch-time snapshot for `event_type`: every phase
    /// and listener bucket, frozen against later registration changes.
    pub fn snapshot_for(&self, event_type: &str) -> Snapshot {
        Snapshot {
            validate: self.list_for(event_type, PhaseTag::Validate),
            configure: self.list_for(event_type, PhaseTag::Configure),
            execute: self.list_for(event_type, PhaseTag::Execute),
            cleanup: self.list_for(event_type, PhaseTag::Cleanup),
            success: self.list_for(event_type, PhaseTag::SuccessListener),
            failure: self.list_for(event_type, PhaseTag::FailureListener),
            cancel: self.list_for(event_type, PhaseTag::CancelListener),
            complete: self.list_for(event_type, PhaseTag::CompleteListener),
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen set of handler entries applicable to one in-flight event.
///
/// Taken once at dispatch time; later `register`/`unregister` calls on the
/// originating `HandlerRegistry` never affect an already-dispatched event.
#[derive(Clone, Default)]
pub struct Snapshot {
    pub validate: Vec<Arc<HandlerEntry>>,
    pub configure: Vec<Arc<HandlerEntry>>,
    pub execute: Vec<Arc<HandlerEntry>>,
    pub cleanup: Vec<Arc<HandlerEntry>>,
    pub success: Vec<Arc<HandlerEntry>>,
    pub failure: Vec<Arc<HandlerEntry>>,
    pub cancel: Vec<Arc<HandlerEntry>>,
    pub complete: Vec<Arc<HandlerEntry>>,
}

impl Snapshot {
    pub fn entries_for(&self, tag: PhaseTag) -> &[Arc<HandlerEntry>] {
        match tag {
            PhaseTag::Validate => &self.validate,
            PhaseTag::Configure => &self.configure,
            PhaseTag::Execute => &self.execute,
            PhaseTag::Cleanup => &self.cleanup,
            PhaseTag::SuccessListener => &self.success,
            PhaseTag::FailureListener => &self.failure,
            PhaseTag::CancelListener => &self.cancel,
            PhaseTag::CompleteListener => &self.complete,
        }
    }
}
