//! Handler entries: immutable registration records plus the builder that
//! produces them.
//!
//! The builder is consumed by `build`, so there is no "already built"
//! flag to track — ownership rules it out.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use phasework_types::{HandlerId, HandlerResult, Priority, TypesError};
use phasework_types::PhaseTag;

use crate::event::Event;
use crate::context::EventContext;

/// Predicate evaluated immediately before a handler runs.
pub type Condition = Arc<dyn Fn(&Event, &HandlerEntry) -> bool + Send + Sync>;

/// The handler body itself.
pub type HandlerFn = Arc<dyn Fn(&EventContext) -> HandlerResult + Send + Sync>;

/// Immutable-after-build registration record.
///
/// Every field except `execution_count` is fixed at construction; the
/// registry may remove an entry but never edit one (see module invariant
/// in `registry`). `execution_count` is incremented by the core each time
/// the handler actually runs (condition-skipped runs do not count).
pub struct HandlerEntry {
    id: HandlerId,
    phase: PhaseTag,
    priority: Priority,
    condition: Condition,
    handler: HandlerFn,
    execution_count: AtomicU64,
}

impl HandlerEntry {
    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn phase(&self) -> PhaseTag {
        self.phase
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Evaluate this entry's condition against the in-flight event.
    pub fn condition_holds(&self, event: &Event) -> bool {
        (self.condition)(event, self)
    }

    /// Run the handler body and record one execution.
    pub fn invoke(&self, ctx: &EventContext) -> HandlerResult {
        self.execution_count.fetch_add(1, Ordering::Relaxed);
        (self.handler)(ctx)
    }

    /// Number of times this entry's handler body has actually run.
    pub fn execution_count(&self) -> u64 {
        self.execution_count.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .field("execution_count", &self.execution_count())
            .finish_non_exhaustive()
    }
}

/// Builds a [`HandlerEntry`]. Consumed by `build`, so reuse is a compile
/// error rather than a runtime flag check.
#[derive(Default)]
pub struct HandlerEntryBuilder {
    phase: Option<PhaseTag>,
    priority: Option<Priority>,
    condition: Option<Condition>,
    handler: Option<HandlerFn>,
}

impl HandlerEntryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(mut self, phase: PhaseTag) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the condition. Defaults to "always run" if never called.
    pub fn condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Event, &HandlerEntry) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext) -> HandlerResult + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<HandlerEntry, TypesError> {
        let phase = self
            .phase
            .ok_or(TypesError::IncompleteBuilder { field: "phase" })?;
        let handler = self
            .handler
            .ok_or(TypesError::IncompleteBuilder { field: "handler" })?;
        Ok(HandlerEntry {
            id: HandlerId::next(),
            phase,
            priority: self.priority.unwrap_or_default(),
            condition: self.condition.unwrap_or_else(|| Arc::new(|_, _| true)),
            handler,
            execution_count: AtomicU64::new(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[test]
    fn build_requires_phase_and_handler() {
        let err = HandlerEntryBuilder::new().build().unwrap_err();
        assert_eq!(err, TypesError::IncompleteBuilder { field: "phase" });

        let err = HandlerEntryBuilder::new()
            .phase(PhaseTag::Validate)
            .build()
            .unwrap_err();
        assert_eq!(err, TypesError::IncompleteBuilder { field: "handler" });
    }

    #[test]
    fn default_condition_always_holds() {
        let entry = HandlerEntryBuilder::new()
            .phase(PhaseTag::Validate)
            .handler(|_ctx| HandlerResult::Success)
            .build()
            .expect("valid builder");
        let event = Event::new("demo");
        assert!(entry.condition_holds(&event));
    }

    #[test]
    fn execution_count_increments_only_on_invoke() {
        let entry = HandlerEntryBuilder::new()
            .phase(PhaseTag::Validate)
            .handler(|_ctx| HandlerResult::Success)
            .build()
            .expect("valid builder");
        assert_eq!(entry.execution_count(), 0);
        let ctx = EventContext::for_test();
        entry.invoke(&ctx);
        entry.invoke(&ctx);
        assert_eq!(entry.execution_count(), 2);
    }
}
