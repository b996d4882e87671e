//! Process-wide toast accessor.
//!
//! Most code should be handed a [`ToastHandle`] explicitly.  The hub exists
//! for call sites that cannot be (deep helpers, panic hooks): one queue at a
//! time binds itself here, and [`show`] / [`clear`] reach it from anywhere.
//!
//! A binding ends when its [`HubBinding`] is dropped or when the bound queue
//! itself is dropped, whichever comes first.
//!
//! ```text
//! let queue = ToastQueue::new(5, timings);
//! let _binding = toast_hub::bind(&queue)?;   // unbinds when dropped
//! toast_hub::show(ToastRequest::new(ToastSeverity::Info, "Hi", "there"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use scoreline_core::{ToastId, ToastRequest};
use thiserror::Error;
use tracing::{debug, warn};

use super::toast_queue::{ToastHandle, ToastQueue};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("a toast queue is already bound to the hub")]
    AlreadyBound,
}

static HUB: RwLock<Option<(u64, ToastHandle)>> = RwLock::new(None);
static NEXT_BINDING: AtomicU64 = AtomicU64::new(1);

/// Keeps `queue` bound to the hub until dropped.
#[derive(Debug)]
#[must_use = "the hub unbinds as soon as the binding is dropped"]
pub struct HubBinding {
    token: u64,
}

impl Drop for HubBinding {
    fn drop(&mut self) {
        let mut hub = HUB.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(hub.as_ref(), Some((token, _)) if *token == self.token) {
            *hub = None;
            debug!("toast hub unbound");
        }
    }
}

/// Binds `queue` as the process-wide toast target.
pub fn bind(queue: &ToastQueue) -> Result<HubBinding, HubError> {
    let mut hub = HUB.write().unwrap_or_else(PoisonError::into_inner);
    if matches!(hub.as_ref(), Some((_, handle)) if handle.is_alive()) {
        return Err(HubError::AlreadyBound);
    }
    let token = NEXT_BINDING.fetch_add(1, Ordering::Relaxed);
    *hub = Some((token, queue.handle()));
    debug!("toast hub bound");
    Ok(HubBinding { token })
}

/// Clears the hub if it points at `queue`.  Called from the queue's teardown.
pub(super) fn release(queue: &ToastQueue) {
    let mut hub = HUB.write().unwrap_or_else(PoisonError::into_inner);
    if matches!(hub.as_ref(), Some((_, handle)) if handle.targets(queue)) {
        *hub = None;
        debug!("toast hub unbound, queue dropped");
    }
}

/// Whether a live queue is currently bound.
pub fn is_bound() -> bool {
    current().is_some()
}

fn current() -> Option<ToastHandle> {
    HUB.read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(|(_, handle)| handle.clone())
        .filter(ToastHandle::is_alive)
}

/// Shows a toast on the bound queue.
pub fn show(request: ToastRequest) -> Option<ToastId> {
    let Some(handle) = current() else {
        warn!("toast hub: no queue bound, dropping toast {:?}", request.title);
        return None;
    };
    handle.push(request)
}

/// Clears the bound queue; returns how many toasts were removed.
pub fn clear() -> Option<usize> {
    let Some(handle) = current() else {
        warn!("toast hub: no queue bound, nothing to clear");
        return None;
    };
    handle.clear()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ToastTimings;
    use scoreline_core::ToastSeverity;

    // The hub is process-global, so the whole lifecycle lives in one test.
    #[tokio::test(start_paused = true)]
    async fn test_hub_bind_show_clear_unbind() {
        let request = || ToastRequest::new(ToastSeverity::Info, "t", "m");

        // Unbound: warns and returns None
        assert!(!is_bound());
        assert!(show(request()).is_none());
        assert!(clear().is_none());

        // Bound: reaches the queue
        let queue = ToastQueue::new(5, ToastTimings::default());
        let binding = bind(&queue).unwrap();
        assert!(is_bound());
        let id = show(request()).unwrap();
        assert_eq!(queue.snapshot()[0].id, id);

        // Second binding is refused while the first is live
        let other = ToastQueue::new(5, ToastTimings::default());
        assert_eq!(bind(&other).unwrap_err(), HubError::AlreadyBound);

        assert_eq!(clear(), Some(1));
        assert!(queue.is_empty());

        // Teardown unbinds, after which another queue may bind
        drop(binding);
        assert!(!is_bound());
        assert!(show(request()).is_none());
        let rebinding = bind(&other).unwrap();
        assert!(show(request()).is_some());
        assert_eq!(other.len(), 1);
        drop(rebinding);

        // Dropping the queue first also unbinds, even with the guard alive
        let short_lived = ToastQueue::new(5, ToastTimings::default());
        let orphaned = bind(&short_lived).unwrap();
        drop(short_lived);
        assert!(!is_bound());
        assert!(show(request()).is_none());
        let fresh = ToastQueue::new(5, ToastTimings::default());
        let fresh_binding = bind(&fresh).unwrap();
        assert!(show(request()).is_some());
        assert_eq!(fresh.len(), 1);

        // The stale guard must not unbind the newer binding
        drop(orphaned);
        assert!(is_bound());
        drop(fresh_binding);
        assert!(!is_bound());
    }
}
