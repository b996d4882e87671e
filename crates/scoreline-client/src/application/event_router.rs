//! EventRouter: fans decoded frames out to the handlers of their action.
//!
//! # Dispatch rules
//!
//! - Handlers for one action run in registration order, synchronously, on
//!   the task that calls [`EventRouter::dispatch`] (the transport reader).
//! - A handler that returns an error *or panics* is logged and skipped; the
//!   remaining handlers of the same fan-out still run.
//! - Frames for an action nobody registered are discarded silently.
//! - The handler list is snapshotted before the fan-out starts.  A handler
//!   that registers or removes handlers mid-dispatch affects the next frame,
//!   not the current one, and never deadlocks on the router's lock.
//!
//! # Why handler ids?
//!
//! Rust closures cannot be compared for equality, so [`EventRouter::on`]
//! hands back a [`HandlerId`] and [`EventRouter::off`] removes by id.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use scoreline_core::Frame;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::{lock, panic_message};

/// Error returned by a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The frame payload does not match the schema the handler expects.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// Anything else the handler wants reported.
    #[error("{0}")]
    Failed(String),
}

/// Identifies one registration on the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// A registered handler.  It receives the frame payload (`null` when absent).
pub type Handler = Arc<dyn Fn(&Value) -> Result<(), HandlerError> + Send + Sync>;

/// Outcome of one fan-out, mostly useful for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers invoked, including the ones that failed.
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

/// Maps action names to ordered handler lists.
#[derive(Default)]
pub struct EventRouter {
    handlers: Mutex<HashMap<String, Vec<(HandlerId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `action` and returns its id.
    ///
    /// Handlers registered later for the same action run later.
    pub fn on<F>(&self, action: &str, handler: F) -> HandlerId
    where
        F: Fn(&Value) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.handlers)
            .entry(action.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        debug!("registered handler {id:?} for action {action}");
        id
    }

    /// Removes the handler `id` from `action`.
    ///
    /// Returns `false` (and does nothing) if it was not registered there.
    pub fn off(&self, action: &str, id: HandlerId) -> bool {
        let mut handlers = lock(&self.handlers);
        let Some(list) = handlers.get_mut(action) else {
            return false;
        };
        let before = list.len();
        list.retain(|(h, _)| *h != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(action);
        }
        if removed {
            debug!("removed handler {id:?} from action {action}");
        }
        removed
    }

    /// Number of handlers currently registered for `action`.
    pub fn handler_count(&self, action: &str) -> usize {
        lock(&self.handlers).get(action).map_or(0, Vec::len)
    }

    /// Invokes every handler registered for `frame.action`, in order.
    pub fn dispatch(&self, frame: &Frame) -> DispatchReport {
        // Clone the Arcs so no lock is held while user code runs.
        let snapshot: Vec<(HandlerId, Handler)> = match lock(&self.handlers).get(&frame.action) {
            Some(list) => list.clone(),
            None => return DispatchReport::default(),
        };

        let payload = frame.payload();
        let mut report = DispatchReport::default();

        for (id, handler) in snapshot {
            report.invoked += 1;
            match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!("handler {id:?} for action {} failed: {e}", frame.action);
                }
                Err(panic) => {
                    report.failed += 1;
                    error!(
                        "handler {id:?} for action {} panicked: {}",
                        frame.action,
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
