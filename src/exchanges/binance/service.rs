use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::decode_response;
use crate::core::kernel::request::{create_request, RequestData};
use crate::core::kernel::ws_api::DEFAULT_WRITE_SYNC_TIMEOUT;
use crate::core::traits::WsApiClient;
use crate::core::types::{Params, WsApiMethod, WsApiResponse};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::instrument;

/// Parameters of one WebSocket API operation
pub trait WsApiCall {
    /// Shape of the `result` field in the response
    type Response: DeserializeOwned + Send;

    fn method(&self) -> WsApiMethod;

    fn params(&self) -> Result<Params, ExchangeError>;
}

/// Signs requests with the configured credentials and sends them through a [`WsApiClient`]
pub struct WsApiService<C: WsApiClient> {
    client: C,
    config: ExchangeConfig,
    sync_timeout: Duration,
}

impl<C: WsApiClient> WsApiService<C> {
    pub fn new(client: C, config: ExchangeConfig) -> Self {
        Self {
            client,
            config,
            sync_timeout: DEFAULT_WRITE_SYNC_TIMEOUT,
        }
    }

    /// Set how long `sync_do` waits for a response
    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn sync_timeout(&self) -> Duration {
        self.sync_timeout
    }

    fn sign(
        &self,
        request_id: &str,
        method: WsApiMethod,
        params: Params,
    ) -> Result<Vec<u8>, ExchangeError> {
        create_request(&RequestData::from_config(request_id, &self.config), method, params)
    }

    /// Send `request` without waiting; the response arrives on the read channel
    pub async fn do_async<R: WsApiCall + Sync>(
        &self,
        request_id: &str,
        request: &R,
    ) -> Result<(), ExchangeError> {
        self.call_async(request_id, request.method(), request.params()?)
            .await
    }

    /// Send `request` and wait for its typed response
    pub async fn sync_do<R: WsApiCall + Sync>(
        &self,
        request_id: &str,
        request: &R,
    ) -> Result<WsApiResponse<R::Response>, ExchangeError> {
        self.call(request_id, request.method(), request.params()?)
            .await
    }

    /// Sign and send an arbitrary method without waiting
    #[instrument(skip(self, params), fields(exchange = "binance", method = %method))]
    pub async fn call_async(
        &self,
        request_id: &str,
        method: WsApiMethod,
        params: Params,
    ) -> Result<(), ExchangeError> {
        let raw = self.sign(request_id, method, params)?;
        self.client.write(request_id, raw).await
    }

    /// Sign and send an arbitrary method, then decode the correlated response
    #[instrument(skip(self, params), fields(exchange = "binance", method = %method))]
    pub async fn call<T: DeserializeOwned>(
        &self,
        request_id: &str,
        method: WsApiMethod,
        params: Params,
    ) -> Result<WsApiResponse<T>, ExchangeError> {
        let raw = self.sign(request_id, method, params)?;
        let response = self
            .client
            .write_sync(request_id, raw, self.sync_timeout)
            .await?;
        decode_response(&response)
    }

    /// Wait until responses to everything sent with `do_async` have been received
    pub async fn receive_all_data_before_stop(&self, timeout: Duration) -> bool {
        self.client.wait(timeout).await
    }

    /// Responses and frames not claimed by `sync_do`, including API errors
    pub fn read_channel(&self) -> Option<mpsc::Receiver<Vec<u8>>> {
        self.client.read_channel()
    }

    /// Errors that occurred while reading the connection
    pub fn read_error_channel(&self) -> Option<mpsc::Receiver<ExchangeError>> {
        self.client.read_error_channel()
    }

    pub fn reconnect_count(&self) -> u64 {
        self.client.reconnect_count()
    }

    pub async fn close(&self) {
        self.client.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::binance::trading::{AccountStatusRequest, OrderListCancelRequest};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        written: Mutex<Vec<(String, Value)>>,
        sync_timeouts: Mutex<Vec<Duration>>,
    }

    impl RecordingClient {
        fn record(&self, request_id: &str, payload: &[u8]) {
            let value = serde_json::from_slice(payload).unwrap();
            self.written
                .lock()
                .unwrap()
                .push((request_id.to_string(), value));
        }
    }

    #[async_trait]
    impl WsApiClient for RecordingClient {
        async fn write(&self, request_id: &str, payload: Vec<u8>) -> Result<(), ExchangeError> {
            self.record(request_id, &payload);
            Ok(())
        }

        async fn write_sync(
            &self,
            request_id: &str,
            payload: Vec<u8>,
            timeout: Duration,
        ) -> Result<Vec<u8>, ExchangeError> {
            self.record(request_id, &payload);
            self.sync_timeouts.lock().unwrap().push(timeout);
            Ok(json!({
                "id": request_id,
                "status": 400,
                "error": {"code": -2011, "msg": "Unknown order sent."}
            })
            .to_string()
            .into_bytes())
        }

        async fn wait(&self, _timeout: Duration) -> bool {
            true
        }

        fn read_channel(&self) -> Option<mpsc::Receiver<Vec<u8>>> {
            None
        }

        fn read_error_channel(&self) -> Option<mpsc::Receiver<ExchangeError>> {
            None
        }

        fn reconnect_count(&self) -> u64 {
            3
        }

        async fn close(&self) {}
    }

    fn service() -> WsApiService<RecordingClient> {
        let config = ExchangeConfig::new("api-key".to_string(), "secret".to_string());
        WsApiService::new(RecordingClient::default(), config)
    }

    #[tokio::test]
    async fn test_do_async_writes_signed_envelope() {
        let service = service();
        service
            .do_async("req-1", &AccountStatusRequest::new().omit_zero_balances(true))
            .await
            .unwrap();

        let written = service.client().written.lock().unwrap();
        let (request_id, envelope) = &written[0];
        assert_eq!(request_id, "req-1");
        assert_eq!(envelope["id"], json!("req-1"));
        assert_eq!(envelope["method"], json!("account.status"));
        assert_eq!(envelope["params"]["apiKey"], json!("api-key"));
        assert_eq!(envelope["params"]["omitZeroBalances"], json!(true));
        assert!(envelope["params"]["timestamp"].is_i64());
        assert_eq!(envelope["params"]["signature"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_sync_do_decodes_exchange_error() {
        let service = service().with_sync_timeout(Duration::from_millis(750));
        let request = OrderListCancelRequest::new("BTCUSDT").order_list_id(1);

        let response = service.sync_do("req-2", &request).await.unwrap();
        assert!(response.is_error());
        assert_eq!(response.error.as_ref().unwrap().code, -2011);
        assert!(matches!(
            response.into_result(),
            Err(ExchangeError::ApiError { code: -2011, .. })
        ));
        assert_eq!(
            service.client().sync_timeouts.lock().unwrap()[0],
            Duration::from_millis(750)
        );
    }

    #[tokio::test]
    async fn test_validation_happens_before_write() {
        let client = RecordingClient::default();
        let service = WsApiService::new(
            client,
            ExchangeConfig::new(String::new(), "secret".to_string()),
        );

        let err = service
            .do_async("req-3", &AccountStatusRequest::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::ApiKeyNotSet));

        let err = service
            .call_async("", ACCOUNT_STATUS_METHOD, Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::RequestIdNotSet));
        assert!(service.client().written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_passthrough_accessors() {
        let service = service();
        assert_eq!(service.sync_timeout(), DEFAULT_WRITE_SYNC_TIMEOUT);
        assert_eq!(service.reconnect_count(), 3);
        assert!(service.receive_all_data_before_stop(Duration::from_millis(1)).await);
        assert!(service.read_channel().is_none());
    }

    const ACCOUNT_STATUS_METHOD: WsApiMethod = WsApiMethod("account.status");
}
