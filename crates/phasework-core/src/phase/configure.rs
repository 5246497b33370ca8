//! Configure phase (spec §4.5): resource allocation that may legitimately
//! be asynchronous. Individual failures do not abort the phase; only a
//! unanimous-failure outcome or an explicit cancellation do.

use phasework_types::{HandlerResult, PhaseResult};

use super::{Phase, StepOutcome};
use crate::context::EventContext;

pub(super) fn process(phase: &mut Phase, ctx: &EventContext) -> StepOutcome {
    let short_circuit = phase.drive(ctx, |phase, entry, result| match result {
        HandlerResult::Success | HandlerResult::Failure | HandlerResult::Unknown => None,
        HandlerResult::Cancelled => Some(StepOutcome::Advance(PhaseResult::Cancelled)),
        HandlerResult::Waiting => {
            phase.waiting_count += 1;
            if phase.waiting_count == 0 {
                // A resume arrived before this handler's Waiting was
                // observed; treat it as already resumed.
                phase.results.insert(entry.id(), HandlerResult::Success);
                None
            } else {
                Some(StepOutcome::Suspend)
            }
        }
    });
    if let Some(outcome) = short_circuit {
        return outcome;
    }

    finish(phase)
}

fn finish(phase: &mut Phase) -> StepOutcome {
    let all_failed = !phase.results.is_empty()
        && phase.results.values().all(|r| *r == HandlerResult::Failure);
    if all_failed {
        phase.has_failures = true;
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
    // The suspended handler's own result is still recorded as Waiting;
    // per the "fail() is equivalent to the handler having returned
    // Failure" contract, overwrite it so the all-failed check below
    // (and any caller inspecting `result_of`) sees Failure, not a
    // Waiting entry that will never otherwise be touched.
    for result in phase.results.values_mut() {
        if *result == HandlerResult::Waiting {
            *result = HandlerResult::Failure;
        }
    }
    resume(phase, ctx)
}
