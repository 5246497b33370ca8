pub mod error;
pub mod ids;
pub mod phase;
pub mod priority;
pub mod result;

pub use error::TypesError;
pub use ids::{EventId, HandlerId};
pub use phase::PhaseTag;
pub use priority::Priority;
pub use result::{HandlerResult, PhaseResult, StateResult};
