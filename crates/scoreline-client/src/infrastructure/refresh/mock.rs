//! Recording refresher for tests.
//!
//! # Usage in tests
//!
//! ```ignore
//! let refresher = Arc::new(MockRefresher::new());
//! let alerts = ScoreAlerts::attach(router, AlertDeps { refresher: refresher.clone(), .. });
//!
//! router.dispatch(&high_score_frame);
//!
//! assert_eq!(refresher.calls(), 1);
//! ```
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every call return
//! [`RefreshError::Failed`] while still being counted.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::{LeaderboardRefresher, RefreshError};

/// Counts refresh requests instead of performing them.
#[derive(Debug, Default)]
pub struct MockRefresher {
    calls: AtomicUsize,
    /// When `true`, every request fails after being counted.
    pub should_fail: bool,
}

impl MockRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LeaderboardRefresher for MockRefresher {
    fn request_refresh(&self) -> Result<(), RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(RefreshError::Failed("mock failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_calls() {
        let mock = MockRefresher::new();
        mock.request_refresh().unwrap();
        mock.request_refresh().unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_failing_mock_still_counts() {
        let mock = MockRefresher::failing();
        assert!(mock.request_refresh().is_err());
        assert_eq!(mock.calls(), 1);
    }
}
