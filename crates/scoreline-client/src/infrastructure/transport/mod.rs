//! Live transport: the WebSocket link to the scoreboard backend.
//!
//! Owns at most one physical connection at a time and feeds every decoded
//! inbound frame to the [`EventRouter`].
//!
//! # State machine
//!
//! ```text
//!            connect()                 handshake ok
//!  Closed ─────────────► Connecting ─────────────────► Open
//!    ▲                       │                           │
//!    │   handshake failed    │          drop / error     │
//!    ├───────────────────────┘◄──────────────────────────┤
//!    │                                                   │ disconnect()
//!    └──────────────────────── Closing ◄─────────────────┘
//! ```
//!
//! Every drop that was not asked for by [`LiveTransport::disconnect`] bumps
//! the retry counter and schedules one more attempt after the fixed retry
//! interval.  Once the counter reaches the configured maximum the transport
//! stops and reports itself exhausted; only an explicit `connect()` starts a
//! new budget.  Entering Open resets the counter.
//!
//! # Stale callbacks
//!
//! Each attempt carries a generation number.  A session that ends, or a retry
//! timer that fires, on behalf of a generation that has since been replaced
//! is ignored.  Background tasks only hold a [`Weak`] reference, so dropping
//! the transport ends them too.
//!
//! # Tasks
//!
//! One session task per open connection.  It selects between the outbound
//! queue (filled by [`LiveTransport::send`]) and the inbound stream, and
//! dispatches inbound frames synchronously on the router.

use std::sync::{Arc, Mutex, Weak};

use futures_util::{SinkExt, StreamExt};
use scoreline_core::{decode_frame, decode_frame_bytes, encode_frame, Frame};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::application::EventRouter;
use crate::domain::ReconnectPolicy;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Errors of the live transport.
///
/// Only [`TransportError::InvalidUrl`] ever reaches a caller; the others are
/// logged and drive the reconnect policy.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint cannot be turned into a WebSocket request.
    #[error("invalid WebSocket URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// TCP connect or WebSocket upgrade failed.
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[from] WsError),

    /// An open connection ended without `disconnect()`.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
    Closing,
}

/// Published on every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    pub state: ConnectionState,
    pub retry_count: u32,
    pub max_retries: u32,
    /// `true` once the retry budget is spent and nothing is scheduled.
    pub exhausted: bool,
}

impl LinkStatus {
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }
}

struct Link {
    state: ConnectionState,
    generation: u64,
    retry_count: u32,
    exhausted: bool,
    /// Cleared by `disconnect()`, set again by `connect()`.
    auto_reconnect: bool,
    outbound: Option<mpsc::UnboundedSender<WsMessage>>,
    session: Option<JoinHandle<()>>,
    retry_timer: Option<JoinHandle<()>>,
}

struct Inner {
    url: String,
    policy: ReconnectPolicy,
    router: Arc<EventRouter>,
    link: Mutex<Link>,
    status: watch::Sender<LinkStatus>,
}

/// WebSocket client with bounded fixed-interval reconnects.
pub struct LiveTransport {
    inner: Arc<Inner>,
}

impl LiveTransport {
    /// Creates a closed transport.  Nothing happens until [`Self::connect`].
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy, router: Arc<EventRouter>) -> Self {
        let (status, _) = watch::channel(LinkStatus {
            state: ConnectionState::Closed,
            retry_count: 0,
            max_retries: policy.max_attempts,
            exhausted: false,
        });
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                policy,
                router,
                link: Mutex::new(Link {
                    state: ConnectionState::Closed,
                    generation: 0,
                    retry_count: 0,
                    exhausted: false,
                    auto_reconnect: false,
                    outbound: None,
                    session: None,
                    retry_timer: None,
                }),
                status,
            }),
        }
    }

    /// Opens the connection and waits for the first attempt to settle.
    ///
    /// A refused or failed handshake is not an error here: it is logged, the
    /// retry policy takes over and [`Self::is_connected`] stays `false`.
    /// Calling this while connected (or connecting) does nothing.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidUrl`] when the URL is not a usable `ws://` or
    /// `wss://` endpoint.
    pub async fn connect(&self) -> Result<(), TransportError> {
        let request = build_request(&self.inner.url)?;

        let generation = {
            let mut link = lock(&self.inner.link);
            if matches!(link.state, ConnectionState::Open | ConnectionState::Connecting) {
                debug!("connect() ignored, link is {:?}", link.state);
                return Ok(());
            }
            if let Some(timer) = link.retry_timer.take() {
                timer.abort();
            }
            link.retry_count = 0;
            link.exhausted = false;
            link.auto_reconnect = true;
            link.generation += 1;
            link.state = ConnectionState::Connecting;
            self.inner.publish(&link);
            link.generation
        };

        info!("connecting to {}", self.inner.url);
        Inner::attempt(&self.inner, request, generation).await;
        Ok(())
    }

    /// Closes the connection and stops reconnecting.
    ///
    /// Sends a Close frame if a connection is open, cancels a pending retry
    /// and resets the retry counter.  Safe to call in any state.
    pub fn disconnect(&self) {
        let mut link = lock(&self.inner.link);
        link.auto_reconnect = false;
        link.retry_count = 0;
        link.exhausted = false;
        if let Some(timer) = link.retry_timer.take() {
            timer.abort();
        }

        match link.state {
            ConnectionState::Open => {
                // The session sends the Close frame, exits, and reports Closed.
                if let Some(tx) = link.outbound.take() {
                    let _ = tx.send(WsMessage::Close(None));
                }
                link.state = ConnectionState::Closing;
                info!("disconnecting from {}", self.inner.url);
            }
            ConnectionState::Connecting => {
                // Invalidate the attempt in flight.
                link.generation += 1;
                link.state = ConnectionState::Closed;
                info!("connect attempt to {} cancelled", self.inner.url);
            }
            ConnectionState::Closing | ConnectionState::Closed => {}
        }
        self.inner.publish(&link);
    }

    /// Queues `frame` for transmission.
    ///
    /// Returns `false` (after logging a warning) when the link is not open
    /// or the frame cannot be encoded.  Never fails loudly.
    pub fn send(&self, frame: &Frame) -> bool {
        let link = lock(&self.inner.link);
        let Some(tx) = link.outbound.as_ref().filter(|_| link.state == ConnectionState::Open) else {
            warn!("WebSocket is not connected, dropping {} frame", frame.action);
            return false;
        };
        match encode_frame(frame) {
            Ok(text) => tx.send(WsMessage::Text(text)).is_ok(),
            Err(e) => {
                warn!("cannot send {} frame: {e}", frame.action);
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.inner.link).state
    }

    /// Automatic attempts made since the link was last open.
    pub fn retry_count(&self) -> u32 {
        lock(&self.inner.link).retry_count
    }

    /// Whether the retry budget has been spent.
    pub fn reconnect_exhausted(&self) -> bool {
        lock(&self.inner.link).exhausted
    }

    pub fn status(&self) -> LinkStatus {
        *self.inner.status.borrow()
    }

    /// Receiver that sees every [`LinkStatus`] change.
    pub fn status_receiver(&self) -> watch::Receiver<LinkStatus> {
        self.inner.status.subscribe()
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }
}

impl Drop for LiveTransport {
    fn drop(&mut self) {
        let mut link = lock(&self.inner.link);
        link.auto_reconnect = false;
        link.generation += 1;
        link.outbound = None;
        if let Some(timer) = link.retry_timer.take() {
            timer.abort();
        }
        if let Some(session) = link.session.take() {
            session.abort();
        }
    }
}

impl Inner {
    fn status_of(&self, link: &Link) -> LinkStatus {
        LinkStatus {
            state: link.state,
            retry_count: link.retry_count,
            max_retries: self.policy.max_attempts,
            exhausted: link.exhausted,
        }
    }

    fn publish(&self, link: &Link) {
        self.status.send_replace(self.status_of(link));
    }

    /// Whether frames of `generation` should still be dispatched.
    fn is_live(&self, generation: u64) -> bool {
        let link = lock(&self.link);
        link.generation == generation && link.state == ConnectionState::Open
    }

    /// Runs one handshake and records its outcome.
    async fn attempt(this: &Arc<Self>, request: Request, generation: u64) {
        match connect_async(request).await {
            Ok((ws, _response)) => Self::on_open(this, ws, generation),
            Err(e) => {
                let err = TransportError::Handshake(e);
                warn!("{}: {err}", this.url);
                Self::on_closed(this, generation, &err);
            }
        }
    }

    fn on_open(this: &Arc<Self>, ws: WsStream, generation: u64) {
        let mut link = lock(&this.link);
        if link.generation != generation {
            debug!("dropping connection of superseded attempt {generation}");
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        link.outbound = Some(tx);
        link.session = Some(tokio::spawn(run_session(
            Arc::downgrade(this),
            Arc::clone(&this.router),
            ws,
            rx,
            generation,
        )));
        link.state = ConnectionState::Open;
        link.retry_count = 0;
        link.exhausted = false;
        info!("connected to {}", this.url);
        this.publish(&link);
    }

    /// Moves to Closed and, unless told otherwise, schedules a retry.
    fn on_closed(this: &Arc<Self>, generation: u64, cause: &TransportError) {
        let mut link = lock(&this.link);
        if link.generation != generation {
            debug!("ignoring close of superseded attempt {generation}");
            return;
        }

        link.state = ConnectionState::Closed;
        link.outbound = None;
        // Dropping the handle detaches; this may be the session's own task.
        link.session = None;

        if !link.auto_reconnect {
            info!("disconnected from {}", this.url);
            this.publish(&link);
            return;
        }

        let max = this.policy.max_attempts;
        if link.retry_count >= max {
            link.exhausted = true;
            warn!("giving up on {} after {max} reconnect attempts ({cause})", this.url);
            this.publish(&link);
            return;
        }

        link.retry_count += 1;
        let interval = this.policy.interval;
        info!(
            "reconnecting to {} in {interval:?} (attempt {}/{max})",
            this.url, link.retry_count
        );
        link.retry_timer = Some(tokio::spawn(retry_after(Arc::downgrade(this), generation)));
        this.publish(&link);
    }
}

async fn retry_after(weak: Weak<Inner>, generation: u64) {
    let Some(interval) = weak.upgrade().map(|inner| inner.policy.interval) else {
        return;
    };
    sleep(interval).await;
    let Some(inner) = weak.upgrade() else {
        return;
    };

    let request = match build_request(&inner.url) {
        Ok(request) => request,
        Err(e) => {
            warn!("{e}");
            return;
        }
    };

    let next = {
        let mut link = lock(&inner.link);
        if link.generation != generation || !link.auto_reconnect {
            debug!("stale retry timer of attempt {generation} ignored");
            return;
        }
        link.retry_timer = None;
        link.generation += 1;
        link.state = ConnectionState::Connecting;
        inner.publish(&link);
        link.generation
    };

    Inner::attempt(&inner, request, next).await;
}

/// Pumps one open connection until it ends.
async fn run_session(
    weak: Weak<Inner>,
    router: Arc<EventRouter>,
    ws: WsStream,
    mut outbound: mpsc::UnboundedReceiver<WsMessage>,
    generation: u64,
) {
    let (mut sink, mut stream) = ws.split();

    let reason = loop {
        tokio::select! {
            msg = outbound.recv() => {
                let Some(msg) = msg else {
                    break "outbound queue closed".to_string();
                };
                let closing = matches!(msg, WsMessage::Close(_));
                if let Err(e) = sink.send(msg).await {
                    break format!("write failed: {e}");
                }
                if closing {
                    break "closed by client".to_string();
                }
            }
            inbound = stream.next() => {
                let msg = match inbound {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => break format!("read failed: {e}"),
                    None => break "stream ended".to_string(),
                };
                if !weak.upgrade().is_some_and(|inner| inner.is_live(generation)) {
                    break "link no longer open".to_string();
                }
                if let Some(reason) = handle_inbound(&router, msg) {
                    break reason;
                }
            }
        }
    };

    // A disconnect may have queued a Close frame the loop never got to.
    while let Ok(msg) = outbound.try_recv() {
        if matches!(msg, WsMessage::Close(_)) {
            let _ = sink.send(msg).await;
            break;
        }
    }

    debug!("session {generation} ended: {reason}");
    if let Some(inner) = weak.upgrade() {
        Inner::on_closed(&inner, generation, &TransportError::ConnectionLost(reason));
    }
}

/// Dispatches one inbound message.  Returns a reason when the session must end.
fn handle_inbound(router: &EventRouter, msg: WsMessage) -> Option<String> {
    let decoded = match msg {
        WsMessage::Text(text) => decode_frame(&text),
        WsMessage::Binary(bytes) => decode_frame_bytes(&bytes),
        WsMessage::Ping(_) | WsMessage::Pong(_) => {
            trace!("keepalive frame");
            return None;
        }
        WsMessage::Close(frame) => {
            return Some(match frame {
                Some(f) => format!("closed by server ({} {})", f.code, f.reason),
                None => "closed by server".to_string(),
            });
        }
        WsMessage::Frame(_) => return None,
    };

    match decoded {
        Ok(frame) => {
            let report = router.dispatch(&frame);
            trace!(
                "{} dispatched to {} handler(s), {} failed",
                frame.action,
                report.invoked,
                report.failed
            );
        }
        Err(e) => warn!("dropping inbound frame: {e}"),
    }
    None
}

fn build_request(url: &str) -> Result<Request, TransportError> {
    let invalid = |reason: String| TransportError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let request = url.into_client_request().map_err(|e| invalid(e.to_string()))?;
    match request.uri().scheme_str() {
        Some("ws") | Some("wss") => Ok(request),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn transport(url: &str) -> LiveTransport {
        LiveTransport::new(
            url,
            ReconnectPolicy {
                interval: Duration::from_millis(10),
                max_attempts: 2,
            },
            Arc::new(EventRouter::new()),
        )
    }

    /// Port with nothing listening on it.
    async fn dead_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_build_request_accepts_ws_and_wss() {
        assert!(build_request("ws://127.0.0.1:3001").is_ok());
        assert!(build_request("wss://scores.example.com/live").is_ok());
    }

    #[test]
    fn test_build_request_rejects_other_schemes() {
        let err = build_request("http://127.0.0.1:3001").unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
        assert!(build_request("not a url").is_err());
    }

    #[tokio::test]
    async fn test_connect_with_invalid_url_is_an_error() {
        let t = transport("ftp://example.com");

        let result = t.connect().await;

        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
        assert_eq!(t.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_new_transport_is_closed() {
        let t = transport("ws://127.0.0.1:1");
        assert_eq!(t.state(), ConnectionState::Closed);
        assert!(!t.is_connected());
        assert_eq!(t.retry_count(), 0);
        assert!(!t.reconnect_exhausted());
    }

    #[tokio::test]
    async fn test_send_while_closed_is_a_noop() {
        let t = transport("ws://127.0.0.1:1");
        assert!(!t.send(&Frame::new("ping", "c1")));
    }

    #[tokio::test]
    async fn test_refused_connect_resolves_ok_and_schedules_retry() {
        // Arrange
        let port = dead_port().await;
        let t = transport(&format!("ws://127.0.0.1:{port}"));

        // Act
        let result = t.connect().await;

        // Assert: absorbed, retry #1 is pending
        assert!(result.is_ok());
        assert!(!t.is_connected());
        assert_eq!(t.retry_count(), 1);
    }

    #[tokio::test]
    async fn test_refused_connects_exhaust_budget() {
        let port = dead_port().await;
        let t = transport(&format!("ws://127.0.0.1:{port}"));
        let mut status = t.status_receiver();

        t.connect().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| s.exhausted))
            .await
            .expect("budget should be spent")
            .unwrap();

        assert_eq!(t.retry_count(), 2);
        assert_eq!(t.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_disconnect_cancels_pending_retry() {
        // Arrange: a long interval keeps the retry pending
        let port = dead_port().await;
        let t = LiveTransport::new(
            format!("ws://127.0.0.1:{port}"),
            ReconnectPolicy {
                interval: Duration::from_secs(60),
                max_attempts: 5,
            },
            Arc::new(EventRouter::new()),
        );
        t.connect().await.unwrap();
        assert_eq!(t.retry_count(), 1);

        // Act
        t.disconnect();

        // Assert
        assert_eq!(t.retry_count(), 0);
        assert_eq!(t.state(), ConnectionState::Closed);
        assert!(lock(&t.inner.link).retry_timer.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_when_closed_is_harmless() {
        let t = transport("ws://127.0.0.1:1");
        t.disconnect();
        t.disconnect();
        assert_eq!(t.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_close_message_ends_session() {
        let router = EventRouter::new();
        let reason = handle_inbound(&router, WsMessage::Close(None));
        assert_eq!(reason.as_deref(), Some("closed by server"));
    }

    #[test]
    fn test_malformed_text_is_dropped_without_ending_session() {
        let router = EventRouter::new();
        assert!(handle_inbound(&router, WsMessage::Text("{oops".into())).is_none());
        assert!(handle_inbound(&router, WsMessage::Binary(vec![0xff, 0xfe])).is_none());
        assert!(handle_inbound(&router, WsMessage::Ping(vec![1])).is_none());
    }

    #[test]
    fn test_text_frame_reaches_router() {
        // Arrange
        let router = EventRouter::new();
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let hits2 = Arc::clone(&hits);
        router.on("high-score", move |_| {
            hits2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });

        // Act
        let text = r#"{"action":"high-score","connectionId":"c1","data":{}}"#;
        handle_inbound(&router, WsMessage::Text(text.into()));

        // Assert
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
