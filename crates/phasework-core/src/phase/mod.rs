//! Shared phase machinery: the remaining-handler cursor, the per-handler
//! result map, and condition/panic handling common to all four business
//! phases.
//!
//! Concrete behavior per phase lives in sibling modules (`validate`,
//! `configure`, `execute`, `cleanup`); each exposes a `process` and,
//! where suspension is possible, a `resume`/`fail`/`cancel` that operate
//! on the shared [`Phase`] state below. This is the "tagged variant plus
//! shared data" shape favored over a phase-state inheritance hierarchy.

mod cleanup;
mod configure;
mod execute;
mod validate;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use phasework_types::{HandlerId, HandlerResult, PhaseResult, PhaseTag};
use tracing::debug;

use crate::context::{EventContext, handler_panic_key};
use crate::handler::HandlerEntry;

/// Result of advancing or resuming a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The phase finished its current pass; `BusinessState` decides the
    /// next phase from the carried `PhaseResult`.
    Advance(PhaseResult),
    /// A handler is genuinely waiting; the dispatcher yields here.
    Suspend,
}

/// Per-invocation state for one business phase.
pub struct Phase {
    tag: PhaseTag,
    entries: Vec<Arc<HandlerEntry>>,
    next_index: usize,
    results: HashMap<HandlerId, HandlerResult>,
    waiting_count: i64,
    has_failures: bool,
    saw_cancelled: bool,
}

impl Phase {
    pub fn new(tag: PhaseTag, entries: Vec<Arc<HandlerEntry>>) -> Self {
        Self {
            tag,
            entries,
            next_index: 0,
            results: HashMap::new(),
            waiting_count: 0,
            has_failures: false,
            saw_cancelled: false,
        }
    }

    pub fn tag(&self) -> PhaseTag {
        self.tag
    }

    pub fn has_failures(&self) -> bool {
        self.has_failures
    }

    pub fn saw_cancelled(&self) -> bool {
        self.saw_cancelled
    }

    pub fn result_of(&self, id: HandlerId) -> Option<HandlerResult> {
        self.results.get(&id).copied()
    }

    /// Run this phase's handlers starting from wherever the cursor left
    /// off (the start, on the first call; mid-stream, after a resume
    /// brought `waiting_count` back to a non-negative value).
    pub fn process(&mut self, ctx: &EventContext) -> StepOutcome {
        match self.tag {
            PhaseTag::Validate => validate::process(self, ctx),
            PhaseTag::Configure => configure::process(self, ctx),
            PhaseTag::Execute => execute::process(self, ctx),
            PhaseTag::Cleanup => cleanup::process(self, ctx),
            _ => unreachable!("Phase is only constructed for business phase tags"),
        }
    }

    /// A pending suspension's resume signal arrived.
    pub fn resume(&mut self, ctx: &EventContext) -> StepOutcome {
        match self.tag {
            PhaseTag::Configure => configure::resume(self, ctx),
            PhaseTag::Execute => execute::resume(self, ctx),
            PhaseTag::Cleanup => cleanup::resume(self, ctx),
            PhaseTag::Validate => unreachable!("Validate never suspends"),
            _ => unreachable!("Phase is only constructed for business phase tags"),
        }
    }

    /// An outstanding suspension's producing handler failed externally.
    pub fn fail(&mut self, ctx: &EventContext) -> StepOutcome {
        match self.tag {
            PhaseTag::Configure => configure::fail(self, ctx),
            PhaseTag::Execute => execute::fail(self, ctx),
            PhaseTag::Cleanup => cleanup::fail(self, ctx),
            PhaseTag::Validate => unreachable!("Validate never suspends"),
            _ => unreachable!("Phase is only constructed for business phase tags"),
        }
    }

    /// The suspend handle was cancelled: behaves as a `Cancelled`
    /// `HandlerResult` for whichever handler suspended this phase.
    pub fn cancel(&mut self) -> StepOutcome {
        self.saw_cancelled = true;
        StepOutcome::Advance(PhaseResult::Cancelled)
    }

    /// Advance `next_index` and iterate from the cursor, dispatching each
    /// entry to `on_result`. `on_result` returns `Some(outcome)` to stop
    /// the loop early (suspend or short-circuit), or `None` to continue.
    fn drive<F>(&mut self, ctx: &EventContext, mut on_result: F) -> Option<StepOutcome>
    where
        F: FnMut(&mut Phase, &Arc<HandlerEntry>, HandlerResult) -> Option<StepOutcome>,
    {
        while self.next_index < self.entries.len() {
            let entry = Arc::clone(&self.entries[self.next_index]);
            self.next_index += 1;

            let event_snapshot = ctx.event().type_name();
            if !entry.condition_holds(&ctx.event()) {
                debug!(event = event_snapshot, handler = %entry.id(), phase = ?self.tag, "condition skipped handler");
                self.results.insert(entry.id(), HandlerResult::Success);
                continue;
            }

            let result = run_handler(&entry, ctx);
            debug!(event = event_snapshot, handler = %entry.id(), phase = ?self.tag, result = ?result, "handler ran");
            self.results.insert(entry.id(), result);

            if let Some(outcome) = on_result(self, &entry, result) {
                return Some(outcome);
            }
        }
        None
    }
}

/// Invoke one handler, converting an unwinding panic into
/// `HandlerResult::Failure` and recording the panic payload on the event's
/// data map under the reserved key, per the "exception thrown by handler"
/// error mode.
fn run_handler(entry: &HandlerEntry, ctx: &EventContext) -> HandlerResult {
    if !ctx.catch_handler_panics() {
        return entry.invoke(ctx);
    }
    match panic::catch_unwind(AssertUnwindSafe(|| entry.invoke(ctx))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());
            ctx.set_data(handler_panic_key(), message);
            HandlerResult::Failure
        }
    }
}
