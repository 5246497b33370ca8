//! Engine-wide configuration knobs.

/// Configuration shared by every dispatch through a given `Dispatcher`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Catch a panic unwinding out of a handler closure and convert it to
    /// `HandlerResult::Failure` instead of letting it propagate. Disabling
    /// this is only useful for tests that want a handler panic to fail loudly.
    pub catch_handler_panics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catch_handler_panics: true,
        }
    }
}
