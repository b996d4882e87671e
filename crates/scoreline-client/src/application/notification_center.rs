//! NotificationCenter: the live, self-expiring set of notification records.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//! notify() ──► record appended ──► (ttl elapses) ──► removed
//!                    │
//!                    └──► dismiss(id) ──► removed now, expiry timer aborted
//! ```
//!
//! Every record owns one expiry task.  The task holds only a [`Weak`]
//! reference to the center, so a center that has been dropped never hears
//! from its old timers; dropping the center also aborts them.
//!
//! Presentation code does not poll: it calls
//! [`NotificationCenter::subscribe_changes`] and re-reads
//! [`NotificationCenter::snapshot`] whenever the revision moves.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use scoreline_core::{NotificationId, NotificationKind, NotificationRecord};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{lock, now_ms};
use crate::domain::NotificationTtls;

struct Entry {
    record: NotificationRecord,
    expiry: Option<JoinHandle<()>>,
}

struct Shared {
    entries: Mutex<Vec<Entry>>,
    revision: watch::Sender<u64>,
}

impl Shared {
    /// Removes `id` and returns its entry, bumping the revision.
    fn take(&self, id: NotificationId) -> Option<Entry> {
        let entry = {
            let mut entries = lock(&self.entries);
            let pos = entries.iter().position(|e| e.record.id == id)?;
            entries.remove(pos)
        };
        self.revision.send_modify(|r| *r += 1);
        Some(entry)
    }
}

/// Owns the notification records.
pub struct NotificationCenter {
    ttls: NotificationTtls,
    shared: Arc<Shared>,
}

impl NotificationCenter {
    pub fn new(ttls: NotificationTtls) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            ttls,
            shared: Arc::new(Shared {
                entries: Mutex::new(Vec::new()),
                revision,
            }),
        }
    }

    /// Creates a record and schedules its removal.
    ///
    /// `ttl` of `None` or zero means the configured default for `kind`.
    /// Outside a Tokio runtime the record is kept until dismissed.
    pub fn notify(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        ttl: Option<Duration>,
    ) -> NotificationId {
        let ttl = ttl
            .filter(|t| !t.is_zero())
            .unwrap_or_else(|| self.ttls.for_kind(kind));
        let record = NotificationRecord {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            created_at_ms: now_ms(),
            ttl,
        };
        let id = record.id;

        {
            let mut entries = lock(&self.shared.entries);
            entries.push(Entry {
                record,
                expiry: None,
            });
            // Spawned only once the record is in, so the timer always finds it.
            let expiry = match Handle::try_current() {
                Ok(runtime) => {
                    let deadline = Instant::now() + ttl;
                    let weak = Arc::downgrade(&self.shared);
                    Some(runtime.spawn(expire_at(weak, id, deadline)))
                }
                Err(_) => {
                    warn!("notification {id}: no runtime, expiry disabled");
                    None
                }
            };
            if let Some(entry) = entries.last_mut() {
                entry.expiry = expiry;
            }
        }

        debug!("notification {id} ({}) added, ttl {ttl:?}", kind.as_str());
        self.shared.revision.send_modify(|r| *r += 1);
        id
    }

    /// Removes `id` now.  Returns `false` if it was not present.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        match self.shared.take(id) {
            Some(entry) => {
                if let Some(timer) = entry.expiry {
                    timer.abort();
                }
                debug!("notification {id} dismissed");
                true
            }
            None => false,
        }
    }

    /// Live records in insertion order.
    pub fn snapshot(&self) -> Vec<NotificationRecord> {
        lock(&self.shared.entries)
            .iter()
            .map(|e| e.record.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver whose value increases on every add or removal.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        for entry in lock(&self.shared.entries).drain(..) {
            if let Some(timer) = entry.expiry {
                timer.abort();
            }
        }
    }
}

async fn expire_at(shared: Weak<Shared>, id: NotificationId, deadline: Instant) {
    sleep_until(deadline).await;
    let Some(shared) = shared.upgrade() else {
        return;
    };
    if shared.take(id).is_some() {
        debug!("notification {id} expired");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
