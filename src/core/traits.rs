use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Request/response correlation over one WebSocket API connection
///
/// This is the only contract per-endpoint services depend on; they never see the
/// underlying connection.
#[async_trait]
pub trait WsApiClient: Send + Sync {
    /// Send without waiting; the response shows up on [`WsApiClient::read_channel`]
    async fn write(&self, request_id: &str, payload: Vec<u8>) -> Result<(), ExchangeError>;

    /// Send and wait for the frame carrying the same `id`, at most `timeout`
    async fn write_sync(
        &self,
        request_id: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, ExchangeError>;

    /// Wait until every response to [`WsApiClient::write`] has reached the read
    /// channel; false if `timeout` expired first
    async fn wait(&self, timeout: Duration) -> bool;

    /// Frames not claimed by a `write_sync` caller; handed out once
    fn read_channel(&self) -> Option<mpsc::Receiver<Vec<u8>>>;

    /// Errors not tied to any outstanding request; handed out once
    fn read_error_channel(&self) -> Option<mpsc::Receiver<ExchangeError>>;

    fn reconnect_count(&self) -> u64;

    /// Stop the connection; outstanding `write_sync` calls end with `Cancelled`
    async fn close(&self);
}
