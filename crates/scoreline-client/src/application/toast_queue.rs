//! ToastQueue: a bounded, ordered collection of transient toasts.
//!
//! # Phases
//!
//! ```text
//!  push ──► Entering ──(settle, 50 ms)──► Visible ──(ttl from push)──► Leaving ──(exit, 300 ms)──► removed
//!                                            │                            ▲
//!                                            └──────── close(id) ─────────┘
//! ```
//!
//! - A ttl of zero means the toast never closes on its own.
//! - A ttl shorter than the settle delay goes straight to Leaving.
//! - When a push takes the queue past its capacity, the oldest records are
//!   evicted first, whatever their phase, and their timers are aborted.
//! - [`ToastQueue::clear`] removes everything at once, skipping the exit
//!   transition.
//!
//! Each record is driven by one spawned task that holds a [`Weak`] reference
//! to the queue.  Collaborators that should be able to show toasts without
//! owning the queue get a [`ToastHandle`].

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use scoreline_core::{ToastId, ToastPhase, ToastRecord, ToastRequest};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::lock;
use crate::domain::ToastTimings;

struct Slot {
    record: ToastRecord,
    driver: Option<JoinHandle<()>>,
}

impl Slot {
    fn cancel(self) {
        if let Some(driver) = self.driver {
            driver.abort();
        }
    }
}

struct Shared {
    capacity: usize,
    timings: ToastTimings,
    slots: Mutex<Vec<Slot>>,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    fn push(self: &Arc<Self>, request: ToastRequest) -> ToastId {
        let id = Uuid::new_v4();
        let ttl = request.ttl_or(self.timings.default_ttl);
        let record = ToastRecord {
            id,
            severity: request.severity,
            title: request.title,
            message: request.message,
            ttl,
            phase: ToastPhase::Entering,
        };

        let pushed = Instant::now();
        let evicted: Vec<Slot> = {
            let mut slots = lock(&self.slots);
            slots.push(Slot {
                record,
                driver: None,
            });
            // The driver starts after the insert so it always finds its slot.
            let driver = self.spawn(drive(Arc::downgrade(self), id, pushed, ttl));
            if let Some(slot) = slots.last_mut() {
                slot.driver = driver;
            }
            let excess = slots.len().saturating_sub(self.capacity);
            slots.drain(..excess).collect()
        };
        for slot in evicted {
            debug!("toast {} evicted (capacity {})", slot.record.id, self.capacity);
            slot.cancel();
        }

        debug!("toast {id} pushed, ttl {ttl:?}");
        self.bump();
        id
    }

    fn close(self: &Arc<Self>, id: ToastId) -> bool {
        {
            let mut slots = lock(&self.slots);
            let Some(slot) = slots.iter_mut().find(|s| s.record.id == id) else {
                return false;
            };
            if slot.record.phase == ToastPhase::Leaving {
                return false;
            }
            slot.record.phase = ToastPhase::Leaving;
            if let Some(driver) = slot.driver.take() {
                driver.abort();
            }
            slot.driver = self.spawn(remove_after(Arc::downgrade(self), id, self.timings.exit));
        }
        debug!("toast {id} closed");
        self.bump();
        true
    }

    fn clear(&self) -> usize {
        let drained: Vec<Slot> = lock(&self.slots).drain(..).collect();
        let count = drained.len();
        for slot in drained {
            slot.cancel();
        }
        if count > 0 {
            debug!("cleared {count} toast(s)");
            self.bump();
        }
        count
    }

    /// Moves `id` to `phase` if it is still in `from`.  Returns `false` when
    /// the record is gone, which ends its driver.
    fn advance(&self, id: ToastId, from: ToastPhase, phase: ToastPhase) -> bool {
        let changed = {
            let mut slots = lock(&self.slots);
            let Some(slot) = slots.iter_mut().find(|s| s.record.id == id) else {
                return false;
            };
            let changed = slot.record.phase == from;
            if changed {
                slot.record.phase = phase;
            }
            changed
        };
        if changed {
            self.bump();
        }
        true
    }

    fn remove(&self, id: ToastId) {
        let removed = {
            let mut slots = lock(&self.slots);
            let before = slots.len();
            slots.retain(|s| s.record.id != id);
            slots.len() != before
        };
        if removed {
            debug!("toast {id} removed");
            self.bump();
        }
    }

    fn spawn<F>(&self, task: F) -> Option<JoinHandle<()>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(task)),
            Err(_) => {
                warn!("no runtime, toast timers disabled");
                None
            }
        }
    }
}

/// Runs the automatic part of one toast's lifecycle.
async fn drive(shared: Weak<Shared>, id: ToastId, pushed: Instant, ttl: Duration) {
    let Some(settle) = shared.upgrade().map(|s| s.timings.settle) else {
        return;
    };
    let visible_at = pushed + settle;
    let close_at = (!ttl.is_zero()).then(|| pushed + ttl);

    let from = match close_at {
        Some(close_at) if close_at <= visible_at => ToastPhase::Entering,
        _ => {
            sleep_until(visible_at).await;
            let Some(s) = shared.upgrade() else { return };
            if !s.advance(id, ToastPhase::Entering, ToastPhase::Visible) {
                return;
            }
            ToastPhase::Visible
        }
    };

    // Sticky toasts stay until closed, evicted or cleared.
    let Some(close_at) = close_at else { return };
    sleep_until(close_at).await;
    let exit = {
        let Some(s) = shared.upgrade() else { return };
        if !s.advance(id, from, ToastPhase::Leaving) {
            return;
        }
        s.timings.exit
    };

    remove_after(shared, id, exit).await;
}

async fn remove_after(shared: Weak<Shared>, id: ToastId, delay: Duration) {
    sleep(delay).await;
    if let Some(s) = shared.upgrade() {
        s.remove(id);
    }
}

/// Owns the toast collection.  Dropping it aborts every pending timer.
pub struct ToastQueue {
    shared: Arc<Shared>,
}

impl ToastQueue {
    /// Creates a queue holding at most `capacity` toasts (at least one).
    pub fn new(capacity: usize, timings: ToastTimings) -> Self {
        if capacity == 0 {
            warn!("toast capacity 0 is not usable, using 1");
        }
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                capacity: capacity.max(1),
                timings,
                slots: Mutex::new(Vec::new()),
                revision,
            }),
        }
    }

    /// Appends a toast, evicting the oldest ones beyond capacity.
    pub fn push(&self, request: ToastRequest) -> ToastId {
        self.shared.push(request)
    }

    /// Starts the exit transition of `id`.
    ///
    /// Returns `false` for unknown ids and toasts already leaving.
    pub fn close(&self, id: ToastId) -> bool {
        self.shared.close(id)
    }

    /// Removes every toast immediately; returns how many there were.
    pub fn clear(&self) -> usize {
        self.shared.clear()
    }

    /// Current toasts, oldest first.
    pub fn snapshot(&self) -> Vec<ToastRecord> {
        lock(&self.shared.slots)
            .iter()
            .map(|s| s.record.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Receiver whose value increases on every visible change.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Non-owning handle for collaborators.
    pub fn handle(&self) -> ToastHandle {
        ToastHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl Drop for ToastQueue {
    fn drop(&mut self) {
        super::toast_hub::release(self);
        self.shared.clear();
    }
}

/// Cloneable, non-owning access to a [`ToastQueue`].
///
/// Every operation returns `None` once the queue has been dropped.
#[derive(Clone)]
pub struct ToastHandle {
    shared: Weak<Shared>,
}

impl ToastHandle {
    pub fn push(&self, request: ToastRequest) -> Option<ToastId> {
        self.shared.upgrade().map(|s| s.push(request))
    }

    pub fn close(&self, id: ToastId) -> Option<bool> {
        self.shared.upgrade().map(|s| s.close(id))
    }

    pub fn clear(&self) -> Option<usize> {
        self.shared.upgrade().map(|s| s.clear())
    }

    /// Whether the queue behind this handle still exists.
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    pub(super) fn targets(&self, queue: &ToastQueue) -> bool {
        Weak::ptr_eq(&self.shared, &Arc::downgrade(&queue.shared))
    }
}

impl std::fmt::Debug for ToastHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToastHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
