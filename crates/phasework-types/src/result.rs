/// Outcome of a single handler invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerResult {
    Success,
    Failure,
    Waiting,
    Cancelled,
    Unknown,
}

/// Outcome of a phase's `process` step, reported up to `BusinessState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseResult {
    Unknown,
    Continue,
    Failure,
    Waiting,
    Cancelled,
}

/// Aggregate outcome of the whole business-state sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateResult {
    Unknown,
    Continue,
    Failure,
    Waiting,
    Cancelled,
    Success,
}
