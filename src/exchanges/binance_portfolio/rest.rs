use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::types::Params;
use crate::exchanges::binance::trading::{put, put_opt};
use crate::exchanges::binance_portfolio::types::MarginOrder;
use tracing::instrument;

pub const MARGIN_ORDER_ENDPOINT: &str = "/papi/v1/margin/order";

/// REST API operations for Binance portfolio margin
pub struct BinancePortfolioRestClient<R: RestClient> {
    rest: R,
}

impl<R: RestClient> BinancePortfolioRestClient<R> {
    /// Create a new REST client wrapper
    pub fn new(rest: R) -> Self {
        Self { rest }
    }

    pub fn rest(&self) -> &R {
        &self.rest
    }

    /// Query a single cross-margin order
    pub fn get_margin_order(&self, symbol: impl Into<String>) -> GetMarginOrderService<'_, R> {
        GetMarginOrderService {
            rest: &self.rest,
            symbol: symbol.into(),
            order_id: None,
            orig_client_order_id: None,
            recv_window: None,
        }
    }
}

/// Signed `GET /papi/v1/margin/order`
pub struct GetMarginOrderService<'a, R: RestClient> {
    rest: &'a R,
    symbol: String,
    order_id: Option<i64>,
    orig_client_order_id: Option<String>,
    recv_window: Option<u64>,
}

impl<R: RestClient> GetMarginOrderService<'_, R> {
    pub fn order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn orig_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.orig_client_order_id = Some(id.into());
        self
    }

    pub fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }

    pub fn params(&self) -> Result<Params, ExchangeError> {
        if self.symbol.is_empty() {
            return Err(ExchangeError::InvalidParameters("symbol is required".to_string()));
        }
        if self.order_id.is_none() && self.orig_client_order_id.is_none() {
            return Err(ExchangeError::InvalidParameters(
                "either orderId or origClientOrderId must be sent".to_string(),
            ));
        }

        let mut params = Params::new();
        put(&mut params, "symbol", self.symbol.as_str());
        put_opt(&mut params, "orderId", self.order_id);
        put_opt(&mut params, "origClientOrderId", self.orig_client_order_id.as_deref());
        put_opt(&mut params, "recvWindow", self.recv_window);
        Ok(params)
    }

    #[instrument(skip(self), fields(exchange = "binance_portfolio", symbol = %self.symbol))]
    pub async fn send(self) -> Result<MarginOrder, ExchangeError> {
        let params = self.params()?;
        self.rest.get_json(MARGIN_ORDER_ENDPOINT, &params, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRest {
        calls: Mutex<Vec<(String, Params, bool)>>,
    }

    #[async_trait]
    impl RestClient for RecordingRest {
        async fn get(
            &self,
            endpoint: &str,
            params: &Params,
            authenticated: bool,
        ) -> Result<Value, ExchangeError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), params.clone(), authenticated));
            Ok(json!({
                "clientOrderId": "c", "cummulativeQuoteQty": "0", "executedQty": "0",
                "orderId": 42, "origQty": "1", "price": "10", "side": "BUY",
                "status": "FILLED", "symbol": "BNBUSDT", "time": 1, "timeInForce": "IOC",
                "type": "LIMIT", "updateTime": 2
            }))
        }

        async fn get_json<T: DeserializeOwned>(
            &self,
            endpoint: &str,
            params: &Params,
            authenticated: bool,
        ) -> Result<T, ExchangeError> {
            let value = self.get(endpoint, params, authenticated).await?;
            Ok(serde_json::from_value(value)?)
        }
    }

    #[tokio::test]
    async fn test_get_margin_order_is_signed_get() {
        let client = BinancePortfolioRestClient::new(RecordingRest::default());
        let order = client
            .get_margin_order("BNBUSDT")
            .order_id(42)
            .recv_window(3000)
            .send()
            .await
            .unwrap();
        assert_eq!(order.order_id, 42);

        let calls = client.rest().calls.lock().unwrap();
        let (endpoint, params, authenticated) = &calls[0];
        assert_eq!(endpoint, MARGIN_ORDER_ENDPOINT);
        assert!(*authenticated);
        assert_eq!(params["symbol"], json!("BNBUSDT"));
        assert_eq!(params["orderId"], json!(42));
        assert_eq!(params["recvWindow"], json!(3000));
        assert!(!params.contains_key("origClientOrderId"));
    }

    #[tokio::test]
    async fn test_get_margin_order_requires_reference() {
        let client = BinancePortfolioRestClient::new(RecordingRest::default());
        let err = client.get_margin_order("BNBUSDT").send().await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidParameters(_)));
        assert!(client.rest().calls.lock().unwrap().is_empty());
    }
}
