//! Leaderboard refresh adapters.
//!
//! Score handlers run on the transport's reader task and must not wait for a
//! data fetch.  [`ChannelRefresher`] therefore only enqueues a
//! [`RefreshRequest`]; whoever owns the receiving end (the binary's refresh
//! consumer) does the actual work at its own pace.
//!
//! [`mock::MockRefresher`] records calls for integration tests.

pub mod mock;

use std::time::SystemTime;

use tokio::sync::mpsc;
use tracing::trace;

use crate::application::{LeaderboardRefresher, RefreshError};

/// One request for fresh leaderboard data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest {
    pub requested_at: SystemTime,
}

/// Sends refresh requests over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelRefresher {
    tx: mpsc::UnboundedSender<RefreshRequest>,
}

impl ChannelRefresher {
    /// Creates the refresher and the receiver its requests arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RefreshRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LeaderboardRefresher for ChannelRefresher {
    fn request_refresh(&self) -> Result<(), RefreshError> {
        self.tx
            .send(RefreshRequest {
                requested_at: SystemTime::now(),
            })
            .map_err(|_| RefreshError::Closed)?;
        trace!("leaderboard refresh queued");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
