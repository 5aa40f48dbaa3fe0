use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::extract_request_id;
use crate::core::kernel::pending::PendingRequests;
use crate::core::kernel::ws::{ConnectionHandler, ConnectionState, WsConfig, WsConnection};
use crate::core::traits::WsApiClient;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, instrument, warn};

pub const DEFAULT_WRITE_SYNC_TIMEOUT: Duration = Duration::from_secs(5);

const ERROR_BUFFER: usize = 64;

/// Hands out the receiving half of a channel exactly once
struct Outlet<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<Option<mpsc::Receiver<T>>>,
    taken: AtomicBool,
}

impl<T> Outlet<T> {
    fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            taken: AtomicBool::new(false),
        }
    }

    fn take(&self) -> Option<mpsc::Receiver<T>> {
        let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner).take();
        if rx.is_some() {
            self.taken.store(true, Ordering::SeqCst);
        }
        rx
    }

    fn is_taken(&self) -> bool {
        self.taken.load(Ordering::SeqCst)
    }

    fn offer(&self, item: T, what: &str) {
        match self.tx.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("{} channel is full, dropping item", what),
            Err(TrySendError::Closed(_)) => debug!("{} channel receiver is gone", what),
        }
    }
}

/// Routes inbound frames either to a blocked `write_sync` caller or to the read channel
struct Router {
    pending: PendingRequests,
    outstanding: watch::Sender<HashSet<String>>,
    frames: Outlet<Vec<u8>>,
    errors: Outlet<ExchangeError>,
}

impl Router {
    fn new(read_buffer: usize) -> Self {
        let (outstanding, _) = watch::channel(HashSet::new());
        Self {
            pending: PendingRequests::new(),
            outstanding,
            frames: Outlet::new(read_buffer),
            errors: Outlet::new(ERROR_BUFFER),
        }
    }

    fn track(&self, request_id: &str) {
        self.outstanding.send_modify(|ids| {
            ids.insert(request_id.to_string());
        });
    }

    fn untrack(&self, request_id: &str) {
        self.outstanding.send_if_modified(|ids| ids.remove(request_id));
    }

    fn clear_outstanding(&self) {
        self.outstanding.send_if_modified(|ids| {
            let had_any = !ids.is_empty();
            ids.clear();
            had_any
        });
    }

    /// Once a consumer holds the read channel, delivery waits for room instead of dropping
    async fn publish(&self, frame: Vec<u8>) {
        if self.frames.is_taken() {
            if self.frames.tx.send(frame).await.is_err() {
                debug!("read channel receiver is gone, dropping frame");
            }
        } else {
            self.frames.offer(frame, "read");
        }
    }
}

#[async_trait]
impl ConnectionHandler for Router {
    async fn on_frame(&self, frame: Vec<u8>) {
        let request_id = extract_request_id(&frame);

        let frame = match request_id.as_deref() {
            Some(id) => match self.pending.resolve(id, frame) {
                Ok(()) => return,
                Err(unclaimed) => unclaimed,
            },
            None => frame,
        };

        self.publish(frame).await;
        if let Some(id) = request_id {
            self.untrack(&id);
        }
    }

    async fn on_connection_lost(&self, error: ExchangeError) {
        let reason = error.to_string();
        let failed = self
            .pending
            .fail_all(|| ExchangeError::ConnectionClosed(reason.clone()));
        if failed > 0 {
            warn!(failed, "failing requests waiting on a lost connection");
        }
        self.clear_outstanding();
        self.errors.offer(error, "error");
    }

    async fn on_error(&self, error: ExchangeError) {
        self.errors.offer(error, "error");
    }

    async fn on_closed(&self) {
        self.pending
            .fail_all(|| ExchangeError::Cancelled("WebSocket API client closed".to_string()));
        self.clear_outstanding();
    }
}

/// Removes a `write_sync` registration unless the response was taken
struct Registration<'a> {
    pending: &'a PendingRequests,
    request_id: &'a str,
    armed: bool,
}

impl Registration<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pending.remove(self.request_id);
        }
    }
}

/// WebSocket API client multiplexing many requests over one tungstenite connection
pub struct TungsteniteWsApi {
    router: Arc<Router>,
    connection: WsConnection,
}

impl TungsteniteWsApi {
    /// Dial `config.url` and start routing responses
    pub async fn connect(config: WsConfig) -> Result<Self, ExchangeError> {
        let router = Arc::new(Router::new(config.read_buffer));
        let connection = WsConnection::connect(config, Arc::clone(&router)).await?;
        Ok(Self { router, connection })
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Requests currently blocked in `write_sync`
    pub fn pending_count(&self) -> usize {
        self.router.pending.len()
    }

    pub fn is_pending(&self, request_id: &str) -> bool {
        self.router.pending.contains(request_id)
    }
}

#[async_trait]
impl WsApiClient for TungsteniteWsApi {
    #[instrument(skip(self, payload), fields(request_id = %request_id))]
    async fn write(&self, request_id: &str, payload: Vec<u8>) -> Result<(), ExchangeError> {
        if request_id.is_empty() {
            return Err(ExchangeError::RequestIdNotSet);
        }

        self.router.track(request_id);
        if let Err(e) = self.connection.send(payload).await {
            self.router.untrack(request_id);
            return Err(e);
        }
        Ok(())
    }

    #[instrument(skip(self, payload), fields(request_id = %request_id, timeout = ?timeout))]
    async fn write_sync(
        &self,
        request_id: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, ExchangeError> {
        if request_id.is_empty() {
            return Err(ExchangeError::RequestIdNotSet);
        }

        let mut response = self.router.pending.register(request_id)?;
        let mut registration = Registration {
            pending: &self.router.pending,
            request_id,
            armed: true,
        };

        self.connection.send(payload).await?;

        if let Ok(delivered) = tokio::time::timeout(timeout, &mut response).await {
            registration.disarm();
            return delivered.unwrap_or_else(|_| {
                Err(ExchangeError::ConnectionClosed(
                    "response slot dropped".to_string(),
                ))
            });
        }

        registration.disarm();
        if self.router.pending.remove(request_id) {
            debug!("no response before timeout");
            return Err(ExchangeError::Timeout {
                request_id: request_id.to_string(),
                timeout,
            });
        }

        // Resolved under the table lock just as the timer fired; the value is already in the slot.
        response.try_recv().unwrap_or_else(|_| {
            Err(ExchangeError::ConnectionClosed(
                "response slot dropped".to_string(),
            ))
        })
    }

    async fn wait(&self, timeout: Duration) -> bool {
        let mut outstanding = self.router.outstanding.subscribe();
        let drained = tokio::time::timeout(timeout, outstanding.wait_for(|ids| ids.is_empty())).await;
        matches!(drained, Ok(Ok(_)))
    }

    fn read_channel(&self) -> Option<mpsc::Receiver<Vec<u8>>> {
        self.router.frames.take()
    }

    fn read_error_channel(&self) -> Option<mpsc::Receiver<ExchangeError>> {
        self.router.errors.take()
    }

    fn reconnect_count(&self) -> u64 {
        self.connection.reconnect_count()
    }

    async fn close(&self) {
        self.connection.close().await;
    }
}
