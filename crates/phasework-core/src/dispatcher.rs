//! Dispatcher façade (spec §4.3): accepts an event, snapshots the
//! registry, drives the business state, and yields a suspend handle when a
//! phase genuinely waits.

use std::sync::{Arc, Mutex};

use phasework_types::{EventId, HandlerId, StateResult};
use tracing::info;

use crate::business::{BusinessState, Drive};
use crate::config::EngineConfig;
use crate::context::EventContext;
use crate::error::DispatchError;
use crate::event::Event;
use crate::handler::HandlerEntry;
use crate::registry::{HandlerRegistry, Snapshot};
use crate::terminal;

/// Result of `dispatch` or of resolving a suspended event further.
pub enum Outcome {
    Completed,
    CompletedWithFailures,
    Cancelled,
    Suspended(SuspendHandle),
}

struct DispatchInner {
    ctx: EventContext,
    business: BusinessState,
    snapshot: Arc<Snapshot>,
    event_id: EventId,
    terminal: bool,
}

/// Entry point for registering handlers and dispatching events against one
/// handler registry. Not a global singleton: callers construct and inject
/// their own.
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    config: EngineConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: Arc<HandlerRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn register_handler(&self, event_type: &'static str, entry: HandlerEntry) -> HandlerId {
        self.registry.register(event_type, entry)
    }

    pub fn unregister_handler(&self, id: HandlerId) -> bool {
        self.registry.unregister(id)
    }

    /// Accept an event: snapshot applicable handlers, build the initial
    /// business state at Validate, and drive it until termination or the
    /// first genuine suspension.
    pub fn dispatch(&self, event: Event) -> Outcome {
        let event_id = event.id();
        let snapshot = Arc::new(self.registry.snapshot_for(event.type_name()));
        let ctx = EventContext::new(event, Arc::clone(&snapshot), self.config.catch_handler_panics);
        let business = BusinessState::new(&snapshot);

        info!(event = %event_id, "dispatch starting");

        let inner = Arc::new(Mutex::new(DispatchInner {
            ctx,
            business,
            snapshot,
            event_id,
            terminal: false,
        }));

        let drive = {
            let mut guard = inner.lock().expect("dispatch mutex poisoned");
            let DispatchInner { ctx, business, .. } = &mut *guard;
            business.drive(ctx)
        };
        finish(inner, drive)
    }
}

/// Turn a `Drive` result into the public `Outcome`, running terminal
/// listeners on the spot when the business state has resolved.
fn finish(inner: Arc<Mutex<DispatchInner>>, drive: Drive) -> Outcome {
    match drive {
        Drive::Suspended => {
            let guard = inner.lock().expect("dispatch mutex poisoned");
            guard.ctx.event_mut().set_waiting(true);
            drop(guard);
            Outcome::Suspended(SuspendHandle { inner })
        }
        Drive::Terminal(result) => {
            let mut guard = inner.lock().expect("dispatch mutex poisoned");
            guard.terminal = true;
            let DispatchInner { ctx, snapshot, event_id, .. } = &*guard;
            ctx.event_mut().set_waiting(false);
            info!(event = %event_id, result = ?result, "business state resolved");
            match result {
                StateResult::Cancelled => {
                    terminal::run_cancelled(ctx, snapshot);
                    Outcome::Cancelled
                }
                StateResult::Failure => {
                    terminal::run_completed(ctx, snapshot, true);
                    Outcome::CompletedWithFailures
                }
                StateResult::Success => {
                    terminal::run_completed(ctx, snapshot, false);
                    Outcome::Completed
                }
                other => unreachable!("business state never resolves to StateResult::{other:?}"),
            }
        }
    }
}

/// External control surface produced when a handler requests `Waiting`.
///
/// Cloning is cheap (shares the same dispatch state); every method takes
/// `&self` and forwards into the business state behind a mutex, so a
/// handle may be used from any thread.
pub struct SuspendHandle {
    inner: Arc<Mutex<DispatchInner>>,
}

impl SuspendHandle {
    pub fn id(&self) -> EventId {
        self.inner.lock().expect("dispatch mutex poisoned").event_id
    }

    /// Signal that the producing handler completed successfully.
    pub fn resume(&self) -> Result<Outcome, DispatchError> {
        self.act(|business, ctx| business.resume(ctx))
    }

    /// Signal that the producing handler failed.
    pub fn fail(&self) -> Result<Outcome, DispatchError> {
        self.act(|business, ctx| business.fail(ctx))
    }

    /// Signal that the producing handler was cancelled.
    pub fn cancel(&self) -> Result<Outcome, DispatchError> {
        let mut guard = self.inner.lock().expect("dispatch mutex poisoned");
        if guard.terminal {
            return Err(DispatchError::AlreadyTerminal { event: guard.event_id });
        }
        let drive = guard.business.cancel();
        drop(guard);
        Ok(finish(Arc::clone(&self.inner), drive))
    }

    fn act<F>(&self, f: F) -> Result<Outcome, DispatchError>
    where
        F: FnOnce(&mut BusinessState, &EventContext) -> Drive,
    {
        let mut guard = self.inner.lock().expect("dispatch mutex poisoned");
        if guard.terminal {
            return Err(DispatchError::AlreadyTerminal { event: guard.event_id });
        }
        let DispatchInner { ctx, business, .. } = &mut *guard;
        let drive = f(business, ctx);
        drop(guard);
        Ok(finish(Arc::clone(&self.inner), drive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerEntryBuilder;
    use phasework_types::{HandlerResult, PhaseTag, Priority};

    fn builder(tag: PhaseTag) -> HandlerEntryBuilder {
        HandlerEntryBuilder::new().phase(tag)
    }

    #[test]
    fn all_success_dispatch_completes() {
        let registry = Arc::new(HandlerRegistry::new());
        for tag in [PhaseTag::Validate, PhaseTag::Configure, PhaseTag::Execute, PhaseTag::Cleanup] {
            registry.register(
                "order.placed",
                builder(tag).handler(|_ctx| HandlerResult::Success).build().unwrap(),
            );
        }
        registry.register(
            "order.placed",
            builder(PhaseTag::SuccessListener)
                .handler(|_ctx| HandlerResult::Success)
                .build()
                .unwrap(),
        );

        let dispatcher = Dispatcher::new(registry);
        let event = Event::new("order.placed");
        match dispatcher.dispatch(event) {
            Outcome::Completed => {}
            _ => panic!("expected Completed"),
        }
    }

    #[test]
    fn execute_waiting_suspends_then_resume_completes() {
        let registry = Arc::new(HandlerRegistry::new());
        registry.register(
            "order.placed",
            builder(PhaseTag::Execute)
                .priority(Priority::High)
                .handler(|_ctx| HandlerResult::Waiting)
                .build()
                .unwrap(),
        );
        registry.register(
            "order.placed",
            builder(PhaseTag::Cleanup).handler(|_ctx| HandlerResult::Success).build().unwrap(),
        );

        let dispatcher = Dispatcher::new(registry);
        let handle = match dispatcher.dispatch(Event::new("order.placed")) {
            Outcome::Suspended(handle) => handle,
            _ => panic!("expected Suspended"),
        };
        match handle.resume().expect("resume should succeed") {
            Outcome::Completed => {}
            _ => panic!("expected Completed after resume"),
        }
    }

    #[test]
    fn resume_after_terminal_is_an_error() {
        let registry = Arc::new(HandlerRegistry::new());
        registry.register(
            "order.placed",
            builder(PhaseTag::Execute).handler(|_ctx| HandlerResult::Waiting).build().unwrap(),
        );
        let dispatcher = Dispatcher::new(registry);
        let handle = match dispatcher.dispatch(Event::new("order.placed")) {
            Outcome::Suspended(handle) => handle,
            _ => panic!("expected Suspended"),
        };
        handle.resume().expect("first resume completes the event");
        assert!(matches!(handle.resume(), Err(DispatchError::AlreadyTerminal { .. })));
    }
}
