//! Phased event-processing state machine.
//!
//! An event traverses Validate, Configure, Execute, and Cleanup, then
//! terminates as Completed, CompletedWithFailures, or Cancelled. Handlers
//! are registered per event type and phase, run in priority order, and
//! may suspend the in-flight phase for later external resume/fail/cancel.
//!
//! ```
//! use std::sync::Arc;
//! use phasework_core::{Dispatcher, Event, HandlerEntryBuilder, HandlerRegistry, Outcome};
//! use phasework_types::{HandlerResult, PhaseTag};
//!
//! let registry = Arc::new(HandlerRegistry::new());
//! registry.register(
//!     "order.placed",
//!     HandlerEntryBuilder::new()
//!         .phase(PhaseTag::Validate)
//!         .handler(|_ctx| HandlerResult::Success)
//!         .build()
//!         .unwrap(),
//! );
//!
//! let dispatcher = Dispatcher::new(registry);
//! match dispatcher.dispatch(Event::new("order.placed")) {
//!     Outcome::Completed => {}
//!     _ => unreachable!(),
//! }
//! ```

mod business;
mod config;
mod context;
mod dispatcher;
mod error;
mod event;
mod handler;
mod phase;
mod registry;
mod terminal;

pub use config::EngineConfig;
pub use context::{DataKey, EventContext};
pub use dispatcher::{Dispatcher, Outcome, SuspendHandle};
pub use error::DispatchError;
pub use event::Event;
pub use handler::{Condition, HandlerEntry, HandlerEntryBuilder, HandlerFn};
pub use registry::{HandlerRegistry, Snapshot};
