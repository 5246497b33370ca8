//! Validate phase (spec §4.4): synchronous, fast checks. Any failure
//! short-circuits straight to the failure terminal without running
//! Configure, Execute, or Cleanup.

use phasework_types::{HandlerResult, PhaseResult};

use super::{Phase, StepOutcome};
use crate::context::EventContext;

pub(super) fn process(phase: &mut Phase, ctx: &EventContext) -> StepOutcome {
    let short_circuit = phase.drive(ctx, |_phase, _entry, result| match result {
        HandlerResult::Failure => Some(StepOutcome::Advance(PhaseResult::Failure)),
        HandlerResult::Cancelled => Some(StepOutcome::Advance(PhaseResult::Cancelled)),
        // Success and condition-skips continue; Waiting is recorded but
        // does not stop the loop — Validate must stay synchronous.
        HandlerResult::Success | HandlerResult::Waiting | HandlerResult::Unknown => None,
    });
    if let Some(outcome) = short_circuit {
        return outcome;
    }

    // Waiting in Validate is a hard failure, never a real suspension —
    // Validate must stay synchronous. A recorded Waiting downgrades the
    // whole phase.
    if phase.results.values().any(|r| *r == HandlerResult::Waiting) {
        StepOutcome::Advance(PhaseResult::Failure)
    } else {
        StepOutcome::Advance(PhaseResult::Continue)
    }
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
                .phase(PhaseTag::Validate)
                .handler(move |_ctx| result)
                .build()
                .expect("valid builder"),
        )
    }

    #[test]
    fn all_success_continues() {
        let mut phase = Phase::new(PhaseTag::Validate, vec![entry(HandlerResult::Success)]);
        let ctx = EventContext::for_test();
        assert_eq!(process(&mut phase, &ctx), StepOutcome::Advance(PhaseResult::Continue));
    }

    #[test]
    fn failure_short_circuits_before_later_handlers() {
        let mut phase = Phase::new(
            PhaseTag::Validate,
            vec![entry(HandlerResult::Failure), entry(HandlerResult::Success)],
        );
        let ctx = EventContext::for_test();
        assert_eq!(process(&mut phase, &ctx), StepOutcome::Advance(PhaseResult::Failure));
        assert_eq!(phase.next_index, 1, "second handler must not run");
    }

    #[test]
    fn cancelled_short_circuits() {
        let mut phase = Phase::new(PhaseTag::Validate, vec![entry(HandlerResult::Cancelled)]);
        let ctx = EventContext::for_test();
        assert_eq!(process(&mut phase, &ctx), StepOutcome::Advance(PhaseResult::Cancelled));
    }

    #[test]
    fn waiting_is_recorded_but_keeps_processing_then_downgrades_to_failure() {
        let mut phase = Phase::new(
            PhaseTag::Validate,
            vec![entry(HandlerResult::Waiting), entry(HandlerResult::Success)],
        );
        let ctx = EventContext::for_test();
        assert_eq!(process(&mut phase, &ctx), StepOutcome::Advance(PhaseResult::Failure));
        assert_eq!(phase.next_index, 2, "both handlers ran");
    }
}
