use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(45);
pub const DEFAULT_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_READ_BUFFER: usize = 1024;

/// Liveness policy, fixed for the lifetime of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAlive {
    /// Answer server pings; drop the connection after `timeout` without any inbound traffic
    Passive { timeout: Duration },
    /// Ping every `interval`; drop the connection when a ping goes unanswered for `timeout`
    Active { interval: Duration, timeout: Duration },
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self::Passive {
            timeout: DEFAULT_KEEPALIVE_TIMEOUT,
        }
    }
}

impl KeepAlive {
    fn check_interval(&self) -> Duration {
        match *self {
            Self::Passive { timeout } => (timeout / 4).max(Duration::from_millis(10)),
            Self::Active { interval, .. } => interval.max(Duration::from_millis(10)),
        }
    }

    fn timeout(&self) -> Duration {
        match *self {
            Self::Passive { timeout } | Self::Active { timeout, .. } => timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    Disabled,
    /// Delay doubles from `initial_delay` up to `max_delay`, with up to 10% jitter
    Backoff {
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Backoff {
            max_attempts: 10,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnection attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Self::Disabled => Duration::ZERO,
            Self::Backoff {
                initial_delay,
                max_delay,
                ..
            } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                let base = initial_delay.saturating_mul(factor).min(max_delay);
                let jitter_ms = (base.as_millis() / 10) as u64;
                if jitter_ms == 0 {
                    base
                } else {
                    base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
                }
            }
        }
    }
}

/// WebSocket connection configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    pub handshake_timeout: Duration,
    pub keepalive: KeepAlive,
    pub reconnect: ReconnectPolicy,
    /// Capacity of the inbound channel handed to async consumers
    pub read_buffer: usize,
}

impl WsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            keepalive: KeepAlive::default(),
            reconnect: ReconnectPolicy::default(),
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_keepalive(mut self, keepalive: KeepAlive) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_read_buffer(mut self, read_buffer: usize) -> Self {
        self.read_buffer = read_buffer.max(1);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Closing,
}

/// Receives everything the read loop observes
#[async_trait]
pub trait ConnectionHandler: Send + Sync + 'static {
    /// A text or binary frame arrived
    async fn on_frame(&self, frame: Vec<u8>);

    /// The socket failed underneath us; reconnection may follow
    async fn on_connection_lost(&self, error: ExchangeError);

    /// A failure not tied to the socket going away, e.g. giving up on reconnection
    async fn on_error(&self, error: ExchangeError);

    async fn on_reconnected(&self, _reconnect_count: u64) {}

    /// The read loop has ended for good
    async fn on_closed(&self);
}

enum ReadOutcome {
    Stopped,
    Failed(ExchangeError),
}

enum ReconnectOutcome {
    Connected(WsReader),
    Stopped,
    GaveUp(Option<ExchangeError>),
}

struct Shared {
    config: WsConfig,
    writer: Mutex<Option<WsWriter>>,
    state: watch::Sender<ConnectionState>,
    stop: watch::Sender<bool>,
    reconnect_count: AtomicU64,
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn is_stopping(&self) -> bool {
        *self.stop.borrow()
    }

    async fn send_message(&self, message: Message) -> Result<(), ExchangeError> {
        let mut writer = self.writer.lock().await;
        let sink = writer.as_mut().ok_or(ExchangeError::NotConnected)?;
        sink.send(message)
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Failed to send WebSocket message: {}", e)))
    }

    async fn supervise<H: ConnectionHandler>(
        self: Arc<Self>,
        handler: Arc<H>,
        mut reader: WsReader,
    ) {
        let mut stop = self.stop.subscribe();

        loop {
            let outcome = self.read_loop(handler.as_ref(), &mut reader, &mut stop).await;
            self.writer.lock().await.take();

            let error = match outcome {
                ReadOutcome::Stopped => break,
                ReadOutcome::Failed(error) => error,
            };

            warn!(url = %self.config.url, error = %error, "WebSocket connection lost");
            self.set_state(ConnectionState::Reconnecting);
            handler.on_connection_lost(error).await;

            match self.reconnect(&mut stop).await {
                ReconnectOutcome::Connected(new_reader) => {
                    reader = new_reader;
                    let count = self.reconnect_count.fetch_add(1, Ordering::SeqCst) + 1;
                    info!(url = %self.config.url, reconnect_count = count, "WebSocket reconnected");
                    self.set_state(ConnectionState::Connected);
                    handler.on_reconnected(count).await;
                }
                ReconnectOutcome::Stopped => break,
                ReconnectOutcome::GaveUp(error) => {
                    if let Some(error) = error {
                        handler.on_error(error).await;
                    }
                    break;
                }
            }
        }

        self.writer.lock().await.take();
        self.set_state(ConnectionState::Disconnected);
        handler.on_closed().await;
        debug!(url = %self.config.url, "WebSocket read loop finished");
    }

    async fn read_loop<H: ConnectionHandler>(
        &self,
        handler: &H,
        reader: &mut WsReader,
        stop: &mut watch::Receiver<bool>,
    ) -> ReadOutcome {
        let keepalive = self.config.keepalive;
        let mut ticker = tokio::time::interval_at(
            Instant::now() + keepalive.check_interval(),
            keepalive.check_interval(),
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Passive: last inbound traffic. Active: deadline of the oldest unanswered ping.
        let mut last_seen = Instant::now();
        let mut pong_deadline: Option<Instant> = None;

        loop {
            if self.is_stopping() {
                return ReadOutcome::Stopped;
            }

            let deadline = pong_deadline.unwrap_or_else(|| Instant::now() + keepalive.timeout());

            tokio::select! {
                _ = stop.changed() => return ReadOutcome::Stopped,
                message = reader.next() => {
                    let frame = match message {
                        Some(Ok(Message::Text(text))) => text.into_bytes(),
                        Some(Ok(Message::Binary(data))) => data,
                        Some(Ok(Message::Ping(payload))) => {
                            last_seen = Instant::now();
                            if let Err(e) = self.send_message(Message::Pong(payload)).await {
                                return ReadOutcome::Failed(e);
                            }
                            continue;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            last_seen = Instant::now();
                            pong_deadline = None;
                            continue;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame.map_or_else(
                                || "closed by server".to_string(),
                                |f| format!("closed by server: {} {}", f.code, f.reason),
                            );
                            return ReadOutcome::Failed(ExchangeError::ConnectionClosed(reason));
                        }
                        Some(Ok(Message::Frame(_))) => continue,
                        Some(Err(e)) => {
                            return ReadOutcome::Failed(ExchangeError::NetworkError(format!(
                                "WebSocket error: {}",
                                e
                            )));
                        }
                        None => {
                            return ReadOutcome::Failed(ExchangeError::ConnectionClosed(
                                "stream ended".to_string(),
                            ));
                        }
                    };

                    last_seen = Instant::now();

                    tokio::select! {
                        () = handler.on_frame(frame) => {}
                        _ = stop.changed() => return ReadOutcome::Stopped,
                    }
                }
                () = sleep_until(deadline), if pong_deadline.is_some() => {
                    return ReadOutcome::Failed(keepalive_timeout(keepalive.timeout()));
                }
                _ = ticker.tick() => match keepalive {
                    KeepAlive::Passive { timeout } => {
                        if last_seen.elapsed() > timeout {
                            return ReadOutcome::Failed(keepalive_timeout(timeout));
                        }
                    }
                    KeepAlive::Active { timeout, .. } => {
                        if let Err(e) = self.send_message(Message::Ping(Vec::new())).await {
                            return ReadOutcome::Failed(e);
                        }
                        pong_deadline.get_or_insert_with(|| Instant::now() + timeout);
                    }
                },
            }
        }
    }

    async fn reconnect(&self, stop: &mut watch::Receiver<bool>) -> ReconnectOutcome {
        let policy = self.config.reconnect;
        let ReconnectPolicy::Backoff { max_attempts, .. } = policy else {
            return ReconnectOutcome::GaveUp(None);
        };

        for attempt in 1..=max_attempts {
            let delay = policy.delay_for(attempt);
            tokio::select! {
                () = sleep(delay) => {}
                _ = stop.changed() => return ReconnectOutcome::Stopped,
            }
            if self.is_stopping() {
                return ReconnectOutcome::Stopped;
            }

            debug!(url = %self.config.url, attempt, "reconnecting");
            let dialed = tokio::select! {
                result = dial(&self.config) => result,
                _ = stop.changed() => return ReconnectOutcome::Stopped,
            };

            match dialed {
                Ok(stream) => {
                    let (write, read) = stream.split();
                    *self.writer.lock().await = Some(write);
                    return ReconnectOutcome::Connected(read);
                }
                Err(e) => warn!(url = %self.config.url, attempt, error = %e, "reconnection attempt failed"),
            }
        }

        ReconnectOutcome::GaveUp(Some(ExchangeError::NetworkError(format!(
            "Failed to reconnect after {} attempts",
            max_attempts
        ))))
    }
}

fn keepalive_timeout(timeout: Duration) -> ExchangeError {
    ExchangeError::ConnectionTimeout(format!("no keepalive response within {:?}", timeout))
}

async fn dial(config: &WsConfig) -> Result<WsStream, ExchangeError> {
    let (stream, _) = tokio::time::timeout(config.handshake_timeout, connect_async(config.url.as_str()))
        .await
        .map_err(|_| {
            ExchangeError::ConnectionTimeout(format!(
                "WebSocket handshake with {} timed out after {:?}",
                config.url, config.handshake_timeout
            ))
        })?
        .map_err(|e| ExchangeError::NetworkError(format!("WebSocket connection failed: {}", e)))?;
    Ok(stream)
}

/// One physical WebSocket connection with its background read loop
///
/// Dialing happens once in [`WsConnection::connect`] and fails fast. After that a
/// supervisor task owns the read half, answers or sends pings per [`KeepAlive`],
/// and redials per [`ReconnectPolicy`]. Writes made while the socket is down fail
/// with [`ExchangeError::NotConnected`]; nothing is buffered for replay.
pub struct WsConnection {
    shared: Arc<Shared>,
    task: StdMutex<Option<JoinHandle<()>>>,
}

impl WsConnection {
    #[instrument(skip(config, handler), fields(url = %config.url))]
    pub async fn connect<H: ConnectionHandler>(
        config: WsConfig,
        handler: Arc<H>,
    ) -> Result<Self, ExchangeError> {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let (stop, _) = watch::channel(false);

        let stream = dial(&config).await?;
        let (write, read) = stream.split();
        info!("WebSocket connected");

        let shared = Arc::new(Shared {
            config,
            writer: Mutex::new(Some(write)),
            state,
            stop,
            reconnect_count: AtomicU64::new(0),
        });
        shared.set_state(ConnectionState::Connected);

        let task = tokio::spawn(Arc::clone(&shared).supervise(handler, read));

        Ok(Self {
            shared,
            task: StdMutex::new(Some(task)),
        })
    }

    /// Write one text frame
    pub async fn send(&self, payload: Vec<u8>) -> Result<(), ExchangeError> {
        let text = String::from_utf8(payload).map_err(|e| {
            ExchangeError::SerializationError(format!("Payload is not valid UTF-8: {}", e))
        })?;
        self.shared.send_message(Message::Text(text)).await
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Successful reconnections so far
    pub fn reconnect_count(&self) -> u64 {
        self.shared.reconnect_count.load(Ordering::SeqCst)
    }

    /// Stop the read loop, send a close frame and wait for the background task
    #[instrument(skip(self), fields(url = %self.shared.config.url))]
    pub async fn close(&self) {
        self.shared.set_state(ConnectionState::Closing);
        self.shared.stop.send_replace(true);

        if let Some(mut sink) = self.shared.writer.lock().await.take() {
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        }

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
        info!("WebSocket closed");
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.shared.stop.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy::Backoff {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1_000),
        };

        let first = policy.delay_for(1);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(110));
        let third = policy.delay_for(3);
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(440));
        let capped = policy.delay_for(30);
        assert!(capped >= Duration::from_millis(1_000) && capped <= Duration::from_millis(1_100));
    }

    #[test]
    fn test_config_defaults() {
        let config = WsConfig::new("wss://example.test/ws").with_read_buffer(0);
        assert_eq!(config.handshake_timeout, Duration::from_secs(45));
        assert_eq!(config.read_buffer, 1);
        assert_eq!(
            config.keepalive,
            KeepAlive::Passive {
                timeout: Duration::from_secs(600)
            }
        );
        assert!(matches!(config.reconnect, ReconnectPolicy::Backoff { max_attempts: 10, .. }));
    }

    #[test]
    fn test_keepalive_check_interval() {
        let passive = KeepAlive::Passive {
            timeout: Duration::from_secs(60),
        };
        assert_eq!(passive.check_interval(), Duration::from_secs(15));

        let active = KeepAlive::Active {
            interval: Duration::from_secs(20),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(active.check_interval(), Duration::from_secs(20));
        assert_eq!(active.timeout(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_connect_refused_fails_fast() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        struct Nop;
        #[async_trait]
        impl ConnectionHandler for Nop {
            async fn on_frame(&self, _frame: Vec<u8>) {}
            async fn on_connection_lost(&self, _error: ExchangeError) {}
            async fn on_error(&self, _error: ExchangeError) {}
            async fn on_closed(&self) {}
        }

        let config = WsConfig::new(format!("ws://{}", addr));
        let result = WsConnection::connect(config, Arc::new(Nop)).await;
        assert!(matches!(result, Err(ExchangeError::NetworkError(_))));
    }
}
