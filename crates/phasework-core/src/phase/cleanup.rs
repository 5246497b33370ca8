//! Cleanup phase (spec §4.7): release whatever was acquired, regardless of
//! how the event got here. Unlike every other phase, nothing short-circuits
//! — every handler runs, and failures or cancellations are only aggregated.

use phasework_types::{HandlerResult, PhaseResult};

use super::{Phase, StepOutcome};
use crate::context::EventContext;

pub(super) fn process(phase: &mut Phase, ctx: &EventContext) -> StepOutcome {
    phase.drive(ctx, |phase, entry, result| {
        match result {
            HandlerResult::Success | HandlerResult::Unknown => {}
            HandlerResult::Failure => phase.has_failures = true,
            HandlerResult::Cancelled => phase.saw_cancelled = true,
            HandlerResult::Waiting => {
                phase.waiting_count += 1;
                if phase.waiting_count == 0 {
                    phase.results.insert(entry.id(), HandlerResult::Success);
                }
            }
        }
        // Cleanup never stops early for any handler outcome.
        None
    });

    finish(phase)
}

fn finish(phase: &Phase) -> StepOutcome {
    if phase.waiting_count > 0 {
        StepOutcome::Suspend
    } else if phase.saw_cancelled {
        StepOutcome::Advance(PhaseResult::Cancelled)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerEntryBuilder;
    use phasework_types::PhaseTag;
    use std::sync::Arc;

    fn entry(result: HandlerResult) -> Arc<crate::handler::HandlerEntry> {
        Arc::new(
            HandlerEntryBuilder::new()
                .phase(PhaseTag::Cleanup)
                .handler(move |_ctx| result)
                .build()
                .expect("valid builder"),
        )
    }

    #[test]
    fn cancelled_does_not_stop_later_handlers() {
        let mut phase = Phase::new(
            PhaseTag::Cleanup,
            vec![entry(HandlerResult::Cancelled), entry(HandlerResult::Success)],
        );
        let ctx = EventContext::for_test();
        assert_eq!(process(&mut phase, &ctx), StepOutcome::Advance(PhaseResult::Cancelled));
        assert_eq!(phase.next_index, 2, "cleanup must run every handler");
    }

    #[test]
    fn failure_alone_is_reported_after_full_pass() {
        let mut phase = Phase::new(
            PhaseTag::Cleanup,
            vec![entry(HandlerResult::Failure), entry(HandlerResult::Success)],
        );
        let ctx = EventContext::for_test();
        assert_eq!(process(&mut phase, &ctx), StepOutcome::Advance(PhaseResult::Failure));
    }

    #[test]
    fn all_success_advances_as_continue() {
        let mut phase = Phase::new(
            PhaseTag::Cleanup,
            vec![entry(HandlerResult::Success), entry(HandlerResult::Success)],
        );
        let ctx = EventContext::for_test();
        assert_eq!(process(&mut phase, &ctx), StepOutcome::Advance(PhaseResult::Continue));
    }

    #[test]
    fn waiting_suspends_after_full_pass_and_resume_drains_it() {
        let mut phase = Phase::new(
            PhaseTag::Cleanup,
            vec![entry(HandlerResult::Waiting), entry(HandlerResult::Success)],
        );
        let ctx = EventContext::for_test();
        assert_eq!(process(&mut phase, &ctx), StepOutcome::Suspend);
        assert_eq!(phase.next_index, 2, "later handler still ran despite the wait");
        assert_eq!(resume(&mut phase, &ctx), StepOutcome::Advance(PhaseResult::Continue));
    }
}
