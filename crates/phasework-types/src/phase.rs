/// Identifies which stage of event processing a handler entry belongs to.
///
/// The first four variants are business phases, run in fixed order by
/// `BusinessState`. The remaining four are terminal listener phases, run
/// by whichever terminal state (`Completed` or `Cancelled`) the business
/// phases settle into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseTag {
    Validate,
    Configure,
    Execute,
    Cleanup,
    SuccessListener,
    FailureListener,
    CancelListener,
    CompleteListener,
}

impl PhaseTag {
    /// Whether this tag names one of the four business phases (as opposed
    /// to a terminal listener phase).
    pub const fn is_business_phase(self) -> bool {
        matches!(
            self,
            Self::Validate | Self::Configure | Self::Execute | Self::Cleanup
        )
    }
}
