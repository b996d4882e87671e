//! Application layer for scoreline-client.
//!
//! The application layer knows *what* to do with a decoded frame; the
//! infrastructure layer knows *how* frames arrive.
//!
//! # Use cases
//!
//! - **`event_router`** – Maps an action name to its ordered handlers and fans
//!   each frame out to them, isolating failures per handler.
//!
//! - **`subscription_scope`** – Groups a consumer's registrations so that they
//!   are all released when the consumer goes away.
//!
//! - **`notification_center`** – The live, self-expiring collection of
//!   notification records.
//!
//! - **`toast_queue`** – The bounded toast collection with timed phases, plus
//!   the optional process-wide accessor (`toast_hub`).
//!
//! - **`score_alerts`** – Subscribes the score actions and turns each event
//!   into a notification, a toast, a leaderboard refresh request, and an
//!   optional callback.
//!
//! # What does NOT belong here?
//!
//! - Opening sockets (that is `infrastructure::transport`)
//! - Reading config files or parsing CLI flags

use std::any::Any;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod event_router;
pub mod notification_center;
pub mod score_alerts;
pub mod subscription_scope;
pub mod toast_hub;
pub mod toast_queue;

pub use event_router::{DispatchReport, EventRouter, HandlerError, HandlerId};
pub use notification_center::NotificationCenter;
pub use score_alerts::{AlertDeps, HighScoreCallback, LeaderboardRefresher, RefreshError, ScoreAlerts};
pub use subscription_scope::{Subscription, SubscriptionScope};
pub use toast_hub::{HubBinding, HubError};
pub use toast_queue::{ToastHandle, ToastQueue};

/// Locks `mutex`, recovering the data if a previous holder panicked.
///
/// Handlers run under `catch_unwind`, so a poisoned lock only means a panic
/// happened somewhere else; the guarded collections stay consistent because
/// every mutation completes before the guard is released.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_str_payload() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");
    }

    #[test]
    fn test_panic_message_from_string_payload() {
        let payload = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "code 7");
    }

    #[test]
    fn test_lock_recovers_from_poison() {
        // Arrange: poison the mutex by panicking while holding it
        let m = std::sync::Arc::new(Mutex::new(1));
        let m2 = std::sync::Arc::clone(&m);
        let _ = std::thread::spawn(move || {
            let _g = m2.lock().unwrap();
            panic!("poison");
        })
        .join();

        // Act / Assert: the value is still reachable
        assert!(m.is_poisoned());
        assert_eq!(*lock(&m), 1);
    }

    #[test]
    fn test_now_ms_is_positive() {
        assert!(now_ms() > 0);
    }
}
