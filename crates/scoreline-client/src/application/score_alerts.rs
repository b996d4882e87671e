//! ScoreAlerts: turns score frames into notifications, toasts and refreshes.
//!
//! | Action         | Notification                   | Toast (fallback)                  | Refresh | Callback |
//! |----------------|--------------------------------|-----------------------------------|---------|----------|
//! | `high-score`   | "🎉 High Score Alert!", 7 s    | success "High Score Achievement!" | yes     | yes      |
//! | `new-leader`   | "👑 New Leader!", 8 s          | warning "New Leaderboard Leader!" | yes     | no       |
//! | `notification` | payload title/message/duration | none                              | no      | no       |
//!
//! A toast bundled with the backend payload replaces the fallback toast.
//!
//! The side effects of one event are independent: each runs under its own
//! `catch_unwind`, so a refresh port that errors or a callback that panics
//! does not stop the notification or the toast.  The handler still reports
//! the failure to the router so it shows up in the dispatch log.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use scoreline_core::protocol::actions;
use scoreline_core::{GeneralNotice, NotificationKind, ScoreEvent, ToastRequest, ToastSeverity};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::event_router::{EventRouter, HandlerError};
use super::notification_center::NotificationCenter;
use super::panic_message;
use super::subscription_scope::SubscriptionScope;
use super::toast_queue::ToastHandle;

/// Error returned by a [`LeaderboardRefresher`].
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Nobody is listening for refresh requests any more.
    #[error("refresh channel closed")]
    Closed,

    #[error("refresh failed: {0}")]
    Failed(String),
}

/// Port through which a score event asks for fresh leaderboard data.
///
/// Implementations must not block: the call happens on the transport's
/// reader task.
#[cfg_attr(test, mockall::automock)]
pub trait LeaderboardRefresher: Send + Sync {
    fn request_refresh(&self) -> Result<(), RefreshError>;
}

/// Callback invoked after every high-score event.
pub type HighScoreCallback = Arc<dyn Fn() + Send + Sync>;

/// Collaborators of [`ScoreAlerts`].
#[derive(Clone)]
pub struct AlertDeps {
    pub notifications: Arc<NotificationCenter>,
    pub toasts: ToastHandle,
    pub refresher: Arc<dyn LeaderboardRefresher>,
    pub on_high_score: Option<HighScoreCallback>,
}

/// Live subscriptions of the score alert wiring.  Dropping it detaches.
pub struct ScoreAlerts {
    scope: SubscriptionScope,
}

impl ScoreAlerts {
    /// Subscribes the score actions on `router`.
    pub fn attach(router: Arc<EventRouter>, deps: AlertDeps) -> Self {
        let scope = SubscriptionScope::new(router, "score-alerts");

        for action in actions::ALERT_ACTIONS {
            let d = deps.clone();
            scope.subscribe(action, move |payload| match action {
                actions::HIGH_SCORE => on_high_score(&d, payload),
                actions::NEW_LEADER => on_new_leader(&d, payload),
                _ => on_general(&d.notifications, payload),
            });
        }

        info!("score alerts attached");
        Self { scope }
    }

    /// Number of actions still subscribed.
    pub fn active_subscriptions(&self) -> usize {
        self.scope.active_count()
    }

    /// Releases every subscription.  Dropping `self` does the same.
    pub fn detach(&self) {
        self.scope.close();
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

fn on_high_score(deps: &AlertDeps, payload: &Value) -> Result<(), HandlerError> {
    let event = ScoreEvent::from_payload(payload)?;
    let user = &event.user_name;
    let score = &event.score;
    debug!("high score: {user} {score}");

    let mut failures = Effects::new(actions::HIGH_SCORE);
    failures.run("notification", || {
        deps.notifications.notify(
            NotificationKind::HighScore,
            "🎉 High Score Alert!",
            format!("{user} just scored {score} points!"),
            None,
        );
        true
    });
    failures.run("toast", || {
        let toast = event.toast.clone().unwrap_or_else(|| {
            ToastRequest::new(
                ToastSeverity::Success,
                "High Score Achievement!",
                format!("{user} achieved an amazing score of {score} points!"),
            )
            .with_ttl(Duration::from_millis(6000))
        });
        push_toast(&deps.toasts, toast)
    });
    failures.run("refresh", || refresh(deps.refresher.as_ref()));
    if let Some(callback) = &deps.on_high_score {
        failures.run("callback", || {
            (**callback)();
            true
        });
    }
    failures.finish()
}

fn on_new_leader(deps: &AlertDeps, payload: &Value) -> Result<(), HandlerError> {
    let event = ScoreEvent::from_payload(payload)?;
    let user = &event.user_name;
    let score = &event.score;
    debug!("new leader: {user} {score}");

    let mut failures = Effects::new(actions::NEW_LEADER);
    failures.run("notification", || {
        deps.notifications.notify(
            NotificationKind::NewLeader,
            "👑 New Leader!",
            format!("{user} is now in the lead with {score} points!"),
            None,
        );
        true
    });
    failures.run("toast", || {
        let toast = event.toast.clone().unwrap_or_else(|| {
            ToastRequest::new(
                ToastSeverity::Warning,
                "New Leaderboard Leader!",
                format!("{user} has taken the lead with {score} points!"),
            )
            .with_ttl(Duration::from_millis(7000))
        });
        push_toast(&deps.toasts, toast)
    });
    failures.run("refresh", || refresh(deps.refresher.as_ref()));
    failures.finish()
}

fn on_general(notifications: &NotificationCenter, payload: &Value) -> Result<(), HandlerError> {
    let notice = GeneralNotice::from_payload(payload)?;
    notifications.notify(
        NotificationKind::General,
        notice.title(),
        notice.message(),
        notice.duration.map(Duration::from_millis),
    );
    Ok(())
}

fn push_toast(toasts: &ToastHandle, toast: ToastRequest) -> bool {
    if toasts.push(toast).is_some() {
        true
    } else {
        warn!("toast queue is gone, toast dropped");
        false
    }
}

fn refresh(refresher: &dyn LeaderboardRefresher) -> bool {
    match refresher.request_refresh() {
        Ok(()) => true,
        Err(e) => {
            warn!("leaderboard refresh request failed: {e}");
            false
        }
    }
}

/// Runs side effects in isolation and counts the ones that failed.
struct Effects {
    action: &'static str,
    failed: Vec<&'static str>,
}

impl Effects {
    fn new(action: &'static str) -> Self {
        Self {
            action,
            failed: Vec::new(),
        }
    }

    fn run(&mut self, effect: &'static str, f: impl FnOnce() -> bool) {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(true) => {}
            Ok(false) => self.failed.push(effect),
            Err(panic) => {
                error!(
                    "{} {effect} panicked: {}",
                    self.action,
                    panic_message(panic.as_ref())
                );
                self.failed.push(effect);
            }
        }
    }

    fn finish(self) -> Result<(), HandlerError> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(HandlerError::Failed(format!(
                "{} side effect(s) failed: {}",
                self.action,
                self.failed.join(", ")
            )))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::toast_queue::ToastQueue;
    use crate::domain::{NotificationTtls, ToastTimings};
    use scoreline_core::Frame;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        router: Arc<EventRouter>,
        notifications: Arc<NotificationCenter>,
        toasts: ToastQueue,
        alerts: ScoreAlerts,
    }

    fn fixture(refresher: MockLeaderboardRefresher, callback: Option<HighScoreCallback>) -> Fixture {
        let router = Arc::new(EventRouter::new());
        let notifications = Arc::new(NotificationCenter::new(NotificationTtls::default()));
        let toasts = ToastQueue::new(5, ToastTimings::default());
        let alerts = ScoreAlerts::attach(
            Arc::clone(&router),
            AlertDeps {
                notifications: Arc::clone(&notifications),
                toasts: toasts.handle(),
                refresher: Arc::new(refresher),
                on_high_score: callback,
            },
        );
        Fixture {
            router,
            notifications,
            toasts,
            alerts,
        }
    }

    fn refresher_expecting(times: usize) -> MockLeaderboardRefresher {
        let mut mock = MockLeaderboardRefresher::new();
        mock.expect_request_refresh().times(times).returning(|| Ok(()));
        mock
    }

    fn high_score(user: &str, score: i64) -> Frame {
        Frame::new(actions::HIGH_SCORE, "c1").with_data(json!({"user_name": user, "score": score}))
    }

    #[tokio::test(start_paused = true)]
    async fn test_high_score_creates_notification_toast_and_refresh() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let f = fixture(
            refresher_expecting(1),
            Some(Arc::new(move || {
                calls2.fetch_add(1, Ordering::SeqCst);
            })),
        );

        // Act
        let report = f.router.dispatch(&high_score("Ann", 1500));

        // Assert
        assert_eq!(report.failed, 0);
        let notes = f.notifications.snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::HighScore);
        assert_eq!(notes[0].title, "🎉 High Score Alert!");
        assert_eq!(notes[0].message, "Ann just scored 1500 points!");
        assert_eq!(notes[0].ttl, Duration::from_millis(7000));

        let toasts = f.toasts.snapshot();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].severity, ToastSeverity::Success);
        assert_eq!(toasts[0].title, "High Score Achievement!");
        assert_eq!(toasts[0].ttl, Duration::from_millis(6000));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_float_score_is_accepted_and_rendered_as_integer() {
        // Arrange
        let f = fixture(refresher_expecting(1), None);
        let frame = Frame::new(actions::HIGH_SCORE, "c1")
            .with_data(json!({"user_name": "Ann", "score": 1500.0}));

        // Act
        let report = f.router.dispatch(&frame);

        // Assert
        assert_eq!(report.failed, 0);
        let notes = f.notifications.snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "Ann just scored 1500 points!");
        assert_eq!(f.toasts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_float_duration_sets_general_ttl() {
        let f = fixture(refresher_expecting(0), None);
        let frame = Frame::new(actions::NOTIFICATION, "c1")
            .with_data(json!({"title": "Heads up", "duration": 2500.0}));

        let report = f.router.dispatch(&frame);

        assert_eq!(report.failed, 0);
        let notes = f.notifications.snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].ttl, Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_toast_replaces_fallback() {
        let f = fixture(refresher_expecting(1), None);
        let frame = Frame::new(actions::NEW_LEADER, "c1").with_data(json!({
            "data": {"user_name": "Bo", "score": 9000},
            "toast": {"type": "info", "title": "Server says", "message": "Bo leads", "duration": 1234}
        }));

        f.router.dispatch(&frame);

        let toasts = f.toasts.snapshot();
        assert_eq!(toasts[0].severity, ToastSeverity::Info);
        assert_eq!(toasts[0].title, "Server says");
        assert_eq!(toasts[0].ttl, Duration::from_millis(1234));
        assert_eq!(f.notifications.snapshot()[0].message, "Bo is now in the lead with 9000 points!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_leader_uses_warning_fallback_and_no_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let f = fixture(
            refresher_expecting(1),
            Some(Arc::new(move || {
                calls2.fetch_add(1, Ordering::SeqCst);
            })),
        );

        f.router.dispatch(
            &Frame::new(actions::NEW_LEADER, "c1").with_data(json!({"user_name": "Cy", "score": 42})),
        );

        let note = &f.notifications.snapshot()[0];
        assert_eq!(note.title, "👑 New Leader!");
        assert_eq!(note.ttl, Duration::from_millis(8000));
        let toast = &f.toasts.snapshot()[0];
        assert_eq!(toast.severity, ToastSeverity::Warning);
        assert_eq!(toast.title, "New Leaderboard Leader!");
        assert_eq!(toast.message, "Cy has taken the lead with 42 points!");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_does_not_block_other_effects() {
        // Arrange
        let mut mock = MockLeaderboardRefresher::new();
        mock.expect_request_refresh()
            .times(1)
            .returning(|| Err(RefreshError::Closed));
        let f = fixture(mock, None);

        // Act
        let report = f.router.dispatch(&high_score("Ann", 1));

        // Assert: reported, but notification and toast exist
        assert_eq!(report.failed, 1);
        assert_eq!(f.notifications.len(), 1);
        assert_eq!(f.toasts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_callback_does_not_block_other_effects() {
        let f = fixture(refresher_expecting(1), Some(Arc::new(|| panic!("callback bug"))));

        let report = f.router.dispatch(&high_score("Ann", 1));

        assert_eq!(report.failed, 1);
        assert_eq!(f.notifications.len(), 1);
        assert_eq!(f.toasts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_payload_is_a_handler_error() {
        let f = fixture(refresher_expecting(0), None);

        let report = f
            .router
            .dispatch(&Frame::new(actions::HIGH_SCORE, "c1").with_data(json!({"score": "lots"})));

        assert_eq!(report.failed, 1);
        assert!(f.notifications.is_empty());
        assert!(f.toasts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_general_notification_defaults() {
        let f = fixture(refresher_expecting(0), None);

        f.router.dispatch(&Frame::new(actions::NOTIFICATION, "c1"));
        f.router.dispatch(
            &Frame::new(actions::NOTIFICATION, "c1")
                .with_data(json!({"title": "Maintenance", "message": "At noon", "duration": 2000})),
        );

        let notes = f.notifications.snapshot();
        assert_eq!(notes[0].title, "Notification");
        assert_eq!(notes[0].message, "You have a new notification");
        assert_eq!(notes[0].ttl, Duration::from_millis(5000));
        assert_eq!(notes[1].title, "Maintenance");
        assert_eq!(notes[1].ttl, Duration::from_millis(2000));
        assert!(f.toasts.is_empty(), "general notices do not toast");
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_releases_all_subscriptions() {
        let f = fixture(refresher_expecting(0), None);
        assert_eq!(f.alerts.active_subscriptions(), 3);

        f.alerts.detach();
        f.router.dispatch(&high_score("Ann", 1));

        assert_eq!(f.alerts.active_subscriptions(), 0);
        assert_eq!(f.router.handler_count(actions::HIGH_SCORE), 0);
        assert!(f.notifications.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_alerts_detaches() {
        let Fixture { router, alerts, .. } = fixture(refresher_expecting(0), None);

        drop(alerts);

        assert_eq!(router.handler_count(actions::NEW_LEADER), 0);
        assert_eq!(router.handler_count(actions::NOTIFICATION), 0);
    }
}
