//! SubscriptionScope: router registrations bound to a consumer's lifetime.
//!
//! A consumer (for example [`super::ScoreAlerts`]) owns one scope and makes
//! all of its registrations through it.  When the scope ends, every
//! registration it made is removed from the router, whether or not the
//! consumer remembered to unsubscribe.  A listener can therefore never fire
//! into a consumer that has already been torn down.
//!
//! ```text
//! let scope = SubscriptionScope::new(router, "panel");
//! let sub = scope.subscribe("high-score", handler);
//! sub.unsubscribe();   // optional, idempotent
//! drop(scope);         // releases whatever is still registered
//! ```
//!
//! Dropping a [`Subscription`] handle does *not* unsubscribe: the scope owns
//! the registration, the handle is only a way to release it early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tracing::{debug, warn};

use super::event_router::{EventRouter, HandlerError, HandlerId};
use super::lock;

/// One registration made through a scope.
#[derive(Debug)]
struct Registration {
    action: String,
    /// `None` for the inert handle handed out by a closed scope.
    id: Option<HandlerId>,
    released: AtomicBool,
}

impl Registration {
    /// Removes the registration from the router exactly once.
    fn release(&self, router: &Weak<EventRouter>) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let (Some(router), Some(id)) = (router.upgrade(), self.id) {
            router.off(&self.action, id);
        }
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

/// Release handle returned by [`SubscriptionScope::subscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    router: Weak<EventRouter>,
    registration: Arc<Registration>,
}

impl Subscription {
    /// Removes the handler from the router.  Further calls do nothing.
    pub fn unsubscribe(&self) {
        self.registration.release(&self.router);
    }

    /// Whether the handler is still registered through this handle.
    pub fn is_active(&self) -> bool {
        !self.registration.is_released()
    }

    pub fn action(&self) -> &str {
        &self.registration.action
    }
}

/// Owns the registrations of one consumer.
pub struct SubscriptionScope {
    name: String,
    router: Arc<EventRouter>,
    registrations: Mutex<Vec<Arc<Registration>>>,
    closed: AtomicBool,
}

impl SubscriptionScope {
    /// Creates an empty scope on `router`.  `name` only appears in logs.
    pub fn new(router: Arc<EventRouter>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            router,
            registrations: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Registers `handler` for `action` for as long as this scope lives.
    ///
    /// Subscribing on a closed scope registers nothing and returns an
    /// inactive handle.
    pub fn subscribe<F>(&self, action: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(&self.router);
        let mut registrations = lock(&self.registrations);

        if self.closed.load(Ordering::Acquire) {
            warn!("scope {}: subscribe to {action} after close ignored", self.name);
            return Subscription {
                router: weak,
                registration: Arc::new(Registration {
                    action: action.to_string(),
                    id: None,
                    released: AtomicBool::new(true),
                }),
            };
        }

        let id = self.router.on(action, handler);
        let registration = Arc::new(Registration {
            action: action.to_string(),
            id: Some(id),
            released: AtomicBool::new(false),
        });

        registrations.retain(|r| !r.is_released());
        registrations.push(Arc::clone(&registration));

        Subscription {
            router: weak,
            registration,
        }
    }

    /// Number of registrations of this scope still on the router.
    pub fn active_count(&self) -> usize {
        lock(&self.registrations)
            .iter()
            .filter(|r| !r.is_released())
            .count()
    }

    /// Releases every registration and refuses new ones.  Idempotent.
    pub fn close(&self) {
        let drained: Vec<Arc<Registration>> = {
            let mut registrations = lock(&self.registrations);
            self.closed.store(true, Ordering::Release);
            registrations.drain(..).collect()
        };

        let weak = Arc::downgrade(&self.router);
        let mut released = 0;
        for registration in drained {
            if !registration.is_released() {
                registration.release(&weak);
                released += 1;
            }
        }
        if released > 0 {
            debug!("scope {}: released {released} subscription(s)", self.name);
        }
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
