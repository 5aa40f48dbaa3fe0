use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{TungsteniteWsApi, WsConfig};
use crate::exchanges::binance::service::WsApiService;
use tracing::info;

pub const WS_API_URL: &str = "wss://ws-api.binance.com:443/ws-api/v3";
pub const WS_API_TESTNET_URL: &str = "wss://ws-api.testnet.binance.vision/ws-api/v3";

/// Spot WebSocket API service over a live connection
pub type BinanceWsApi = WsApiService<TungsteniteWsApi>;

/// Resolve the spot WebSocket API endpoint; an explicit `ws_api_url` wins
pub fn ws_api_url(config: &ExchangeConfig) -> String {
    if let Some(url) = &config.ws_api_url {
        return url.clone();
    }
    if config.testnet {
        WS_API_TESTNET_URL.to_string()
    } else {
        WS_API_URL.to_string()
    }
}

/// Connect to the spot WebSocket API with default connection settings
pub async fn connect_ws_api(config: ExchangeConfig) -> Result<BinanceWsApi, ExchangeError> {
    let ws_config = WsConfig::new(ws_api_url(&config));
    connect_ws_api_with(config, ws_config).await
}

/// Connect to the spot WebSocket API with custom keepalive, reconnect or buffer settings
pub async fn connect_ws_api_with(
    config: ExchangeConfig,
    ws_config: WsConfig,
) -> Result<BinanceWsApi, ExchangeError> {
    if !config.has_credentials() {
        return Err(ExchangeError::AuthError(
            "WebSocket API requests are signed; api key and secret key are required".to_string(),
        ));
    }

    info!(url = %ws_config.url, testnet = config.testnet, "connecting to binance WebSocket API");
    let client = TungsteniteWsApi::connect(ws_config).await?;
    Ok(WsApiService::new(client, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_api_url_selection() {
        let config = ExchangeConfig::new("k".to_string(), "s".to_string());
        assert_eq!(ws_api_url(&config), WS_API_URL);

        let config = config.testnet(true);
        assert_eq!(ws_api_url(&config), WS_API_TESTNET_URL);

        let config = config.ws_api_url("ws://127.0.0.1:9000".to_string());
        assert_eq!(ws_api_url(&config), "ws://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_connect_requires_credentials() {
        let config = ExchangeConfig::new(String::new(), String::new());
        let err = connect_ws_api(config).await.err().unwrap();
        assert!(matches!(err, ExchangeError::AuthError(_)));
    }
}
