//! Dispatcher misuse errors: never raised for handler failure or
//! cancellation, those are ordinary `HandlerResult` values.

use thiserror::Error;

use phasework_types::EventId;

/// Errors a `SuspendHandle` can return. Never alters event state.
///
/// A handle's phase always has a genuinely outstanding wait for as long
/// as the dispatch hasn't reached a terminal state — `continue_driving`
/// only ever hands control back to the caller at one of those two
/// points — so "resume on a handle with nothing outstanding" and
/// "resume after termination" are the same observable case.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("event {event} has already reached a terminal state")]
    AlreadyTerminal { event: EventId },
}
