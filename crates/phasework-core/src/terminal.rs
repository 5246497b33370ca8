//! Terminal listener execution (spec §4.9): runs unconditionally, in
//! priority order, and can never suspend — a `Waiting` result here is
//! treated as `Success`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::context::EventContext;
use crate::handler::HandlerEntry;
use crate::registry::Snapshot;

/// Run `Completed`'s listener sequence: Success or Failure listeners
/// depending on `has_failures`, then Complete listeners. Sets the event's
/// `is_completed` flag.
pub fn run_completed(ctx: &EventContext, snapshot: &Snapshot, has_failures: bool) {
    info!(event = ctx.event().type_name(), has_failures, "completed terminal running");
    if has_failures {
        ctx.event_mut().set_has_failures();
        run_listeners(ctx, &snapshot.failure);
    } else {
        run_listeners(ctx, &snapshot.success);
    }
    run_listeners(ctx, &snapshot.complete);
    ctx.event_mut().set_completed();
}

/// Run `Cancelled`'s listener sequence: Cancel listeners, then Complete
/// listeners. Sets both `is_cancelled` and `is_completed`.
pub fn run_cancelled(ctx: &EventContext, snapshot: &Snapshot) {
    info!(event = ctx.event().type_name(), "cancelled terminal running");
    ctx.event_mut().set_cancelled();
    run_listeners(ctx, &snapshot.cancel);
    run_listeners(ctx, &snapshot.complete);
    ctx.event_mut().set_completed();
}

fn run_listeners(ctx: &EventContext, entries: &[Arc<HandlerEntry>]) {
    for entry in entries {
        if !entry.condition_holds(&ctx.event()) {
            debug!(handler = %entry.id(), "condition skipped listener");
            continue;
        }
        let result = entry.invoke(ctx);
        debug!(handler = %entry.id(), result = ?result, "listener ran");
        // Terminal handlers cannot suspend; Waiting degrades to Success
        // and every other result is simply best-effort, not aggregated.
    }
}
