//! Business state: composes the four phases into the fixed sequence from
//! §4.8 and folds their outcomes into one aggregate `StateResult`.

use phasework_types::{PhaseResult, PhaseTag, StateResult};
use tracing::info;

use crate::context::EventContext;
use crate::phase::{Phase, StepOutcome};
use crate::registry::Snapshot;

/// Which business phase currently owns the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    Validate,
    Configure,
    Execute,
    Cleanup,
}

/// Outcome of driving the business state forward, whether from a fresh
/// dispatch or a resume/fail/cancel re-entry.
#[derive(Debug)]
pub enum Drive {
    Terminal(StateResult),
    Suspended,
}

/// Owns the four phase states and the cross-phase aggregate flags
/// (`any_cancelled`, `has_failures`) that decide which terminal runs.
pub struct BusinessState {
    validate: Phase,
    configure: Phase,
    execute: Phase,
    cleanup: Phase,
    cursor: Cursor,
    any_cancelled: bool,
    has_failures: bool,
}

impl BusinessState {
    pub fn new(snapshot: &Snapshot) -> Self {
        Self {
            validate: Phase::new(PhaseTag::Validate, snapshot.validate.clone()),
            configure: Phase::new(PhaseTag::Configure, snapshot.configure.clone()),
            execute: Phase::new(PhaseTag::Execute, snapshot.execute.clone()),
            cleanup: Phase::new(PhaseTag::Cleanup, snapshot.cleanup.clone()),
            cursor: Cursor::Validate,
            any_cancelled: false,
            has_failures: false,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.has_failures
    }

    pub fn any_cancelled(&self) -> bool {
        self.any_cancelled
    }

    /// Start (or continue) processing from wherever the cursor sits.
    pub fn drive(&mut self, ctx: &EventContext) -> Drive {
        let outcome = self.current_phase_mut().process(ctx);
        self.continue_driving(ctx, outcome)
    }

    pub fn resume(&mut self, ctx: &EventContext) -> Drive {
        let outcome = self.current_phase_mut().resume(ctx);
        self.continue_driving(ctx, outcome)
    }

    pub fn fail(&mut self, ctx: &EventContext) -> Drive {
        let outcome = self.current_phase_mut().fail(ctx);
        self.continue_driving(ctx, outcome)
    }

    pub fn cancel(&mut self) -> Drive {
        let outcome = self.current_phase_mut().cancel();
        // `cancel` takes no context; the caller (`SuspendHandle`) only
        // reaches here while a phase is already suspended, so no further
        // handler runs before the next `Advance`.
        match outcome {
            StepOutcome::Suspend => Drive::Suspended,
            StepOutcome::Advance(result) => match self.advance(result) {
                Some(final_result) => Drive::Terminal(final_result),
                None => unreachable!("cancel always resolves to a terminal PhaseResult"),
            },
        }
    }

    fn continue_driving(&mut self, ctx: &EventContext, mut outcome: StepOutcome) -> Drive {
        loop {
            match outcome {
                StepOutcome::Suspend => return Drive::Suspended,
                StepOutcome::Advance(result) => match self.advance(result) {
                    Some(final_result) => return Drive::Terminal(final_result),
                    None => outcome = self.current_phase_mut().process(ctx),
                },
            }
        }
    }

    fn current_phase_mut(&mut self) -> &mut Phase {
        match self.cursor {
            Cursor::Validate => &mut self.validate,
            Cursor::Configure => &mut self.configure,
            Cursor::Execute => &mut self.execute,
            Cursor::Cleanup => &mut self.cleanup,
        }
    }

    /// Apply one phase's `Advance(result)` to the cursor and aggregate
    /// flags. Returns the final `StateResult` once Cleanup (or an earlier
    /// short-circuit) has resolved; `None` means keep driving.
    fn advance(&mut self, result: PhaseResult) -> Option<StateResult> {
        let from = self.cursor;
        let outcome = match (from, result) {
            (Cursor::Validate, PhaseResult::Cancelled) => {
                self.any_cancelled = true;
                Some(StateResult::Cancelled)
            }
            (Cursor::Validate, PhaseResult::Failure) => {
                self.has_failures = true;
                Some(StateResult::Failure)
            }
            (Cursor::Validate, PhaseResult::Continue) => {
                self.cursor = Cursor::Configure;
                None
            }
            (Cursor::Configure, PhaseResult::Cancelled) => {
                self.any_cancelled = true;
                self.cursor = Cursor::Cleanup;
                None
            }
            (Cursor::Configure, PhaseResult::Failure) => {
                // Every Configure handler failed: Execute never runs.
                self.has_failures = true;
                self.cursor = Cursor::Cleanup;
                None
            }
            (Cursor::Configure, PhaseResult::Continue) => {
                self.cursor = Cursor::Execute;
                None
            }
            (Cursor::Execute, PhaseResult::Cancelled) => {
                self.any_cancelled = true;
                self.cursor = Cursor::Cleanup;
                None
            }
            (Cursor::Execute, PhaseResult::Failure) => {
                self.has_failures = true;
                self.cursor = Cursor::Cleanup;
                None
            }
            (Cursor::Execute, PhaseResult::Continue) => {
                self.cursor = Cursor::Cleanup;
                None
            }
            (Cursor::Cleanup, PhaseResult::Cancelled) => {
                self.any_cancelled = true;
                Some(self.terminal_result())
            }
            (Cursor::Cleanup, PhaseResult::Failure) => {
                self.has_failures = true;
                Some(self.terminal_result())
            }
            (Cursor::Cleanup, PhaseResult::Continue) => Some(self.terminal_result()),
            (phase, result) => {
                unreachable!("{phase:?} phase never advances with PhaseResult::{result:?}")
            }
        };
        info!(phase = ?from, result = ?result, "phase advanced");
        outcome
    }

    fn terminal_result(&self) -> StateResult {
        if self.any_cancelled {
            StateResult::Cancelled
        } else if self.has_failures {
            StateResult::Failure
        } else {
            StateResult::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerEntryBuilder;
    use phasework_types::HandlerResult;
    use std::sync::Arc;

    fn snapshot_with(phase: PhaseTag, results: Vec<HandlerResult>) -> Snapshot {
        let entries: Vec<_> = results
            .into_iter()
            .map(|r| {
                Arc::new(
                    HandlerEntryBuilder::new()
                        .phase(phase)
                        .handler(move |_ctx| r)
                        .build()
                        .expect("valid builder"),
                )
            })
            .collect();
        let mut snapshot = Snapshot::default();
        match phase {
            PhaseTag::Validate => snapshot.validate = entries,
            PhaseTag::Configure => snapshot.configure = entries,
            PhaseTag::Execute => snapshot.execute = entries,
            PhaseTag::Cleanup => snapshot.cleanup = entries,
            _ => unreachable!(),
        }
        snapshot
    }

    #[test]
    fn all_success_reaches_success_terminal() {
        let mut snapshot = Snapshot::default();
        for (phase, v) in [
            (PhaseTag::Validate, &mut snapshot.validate),
            (PhaseTag::Configure, &mut snapshot.configure),
            (PhaseTag::Execute, &mut snapshot.execute),
            (PhaseTag::Cleanup, &mut snapshot.cleanup),
        ] {
            *v = vec![Arc::new(
                HandlerEntryBuilder::new()
                    .phase(phase)
                    .handler(|_ctx| HandlerResult::Success)
                    .build()
                    .unwrap(),
            )];
        }
        let mut state = BusinessState::new(&snapshot);
        let ctx = EventContext::for_test();
        match state.drive(&ctx) {
            Drive::Terminal(StateResult::Success) => {}
            other => panic!("expected Success terminal, got {other:?}"),
        }
        assert!(!state.has_failures());
        assert!(!state.any_cancelled());
    }

    #[test]
    fn validate_failure_skips_straight_to_failure_terminal() {
        let snapshot = snapshot_with(PhaseTag::Validate, vec![HandlerResult::Failure]);
        let mut state = BusinessState::new(&snapshot);
        let ctx = EventContext::for_test();
        match state.drive(&ctx) {
            Drive::Terminal(StateResult::Failure) => {}
            other => panic!("expected Failure terminal, got {other:?}"),
        }
    }

    #[test]
    fn configure_cancel_still_runs_cleanup_before_cancelled_terminal() {
        let mut snapshot = Snapshot::default();
        snapshot.configure = vec![Arc::new(
            HandlerEntryBuilder::new()
                .phase(PhaseTag::Configure)
                .handler(|_ctx| HandlerResult::Cancelled)
                .build()
                .unwrap(),
        )];
        snapshot.cleanup = vec![Arc::new(
            HandlerEntryBuilder::new()
                .phase(PhaseTag::Cleanup)
                .handler(|_ctx| HandlerResult::Success)
                .build()
                .unwrap(),
        )];
        let mut state = BusinessState::new(&snapshot);
        let ctx = EventContext::for_test();
        match state.drive(&ctx) {
            Drive::Terminal(StateResult::Cancelled) => {}
            other => panic!("expected Cancelled terminal, got {other:?}"),
        }
        assert!(state.any_cancelled());
    }

    #[test]
    fn suspend_in_configure_then_resume_runs_execute_and_cleanup() {
        let mut snapshot = Snapshot::default();
        snapshot.configure = vec![Arc::new(
            HandlerEntryBuilder::new()
                .phase(PhaseTag::Configure)
                .handler(|_ctx| HandlerResult::Waiting)
                .build()
                .unwrap(),
        )];
        snapshot.execute = vec![Arc::new(
            HandlerEntryBuilder::new()
                .phase(PhaseTag::Execute)
                .handler(|_ctx| HandlerResult::Success)
                .build()
                .unwrap(),
        )];
        let mut state = BusinessState::new(&snapshot);
        let ctx = EventContext::for_test();
        match state.drive(&ctx) {
            Drive::Suspended => {}
            other => panic!("expected Suspended, got {other:?}"),
        }
        match state.resume(&ctx) {
            Drive::Terminal(StateResult::Success) => {}
            other => panic!("expected Success terminal after resume, got {other:?}"),
        }
    }
}
