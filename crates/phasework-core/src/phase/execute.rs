//! Execute phase (spec §4.6): core business logic. Failures are recorded
//! but never short-circuit; cancellation is fatal. Waiting handlers do
//! not block later handlers in the same pass — the phase only suspends
//! once the whole loop has run and `waiting_count` is still positive.

use phasework_types::{HandlerResult, PhaseResult};

use super::{Phase, StepOutcome};
use crate::context::EventContext;

pub(super) fn process(phase: &mut Phase, ctx: &EventContext) -> StepOutcome {
    let short_circuit = phase.drive(ctx, |phase, entry, result| match result {
        HandlerResult::Success | HandlerResult::Unknown => None,
        HandlerResult::Failure => {
            phase.has_failures = true;
            None
        }
        HandlerResult::Cancelled => Some(StepOutcome::Advance(PhaseResult::Cancelled)),
        HandlerResult::Waiting => {
            phase.waiting_count += 1;
            if phase.waiting_count == 0 {
                phase.results.insert(entry.id(), HandlerResult::Success);
            }
            // Unlike Configure, a genuine wait does not stop the loop —
            // subsequent handlers still run in this pass.
            None
        }
    });
    if let Some(outcome) = short_circuit {
        return outcome;
    }

    finish(phase)
}

fn finish(phase: &Phase) -> StepOutcome {
    if phase.waiting_count > 0 {
        StepOutcome::Suspend
    } else if phase.has_failures {
        StepOutcome::Advance(PhaseResult::Failure)
    } else {
        StepOutcome::Advance(PhaseResult::Continue)
    }
}

pub(super) fn resume(phase: &mut Phase, ctx: &EventContext) -> StepOutcome {
    phase.waiting_count -= 1;
    if phase.waiting_count < 0 {
        StepOutcome::Suspend
    } else {
        process(phase, ctx)
    }
}

pub(super) fn fail(phase: &mut Phase, ctx: &EventContext) -> StepOutcome {
    phase.has_failures = true;
    resume(phase, ctx)
}
