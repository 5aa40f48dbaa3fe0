use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{TungsteniteWsApi, WsConfig};
use crate::exchanges::binance::service::WsApiService;
use tracing::info;

pub const WS_API_URL: &str = "wss://ws-fapi.binance.com/ws-fapi/v1";
pub const WS_API_TESTNET_URL: &str = "wss://testnet.binancefuture.com/ws-fapi/v1";

/// USDⓈ-M futures WebSocket API service over a live connection
pub type BinancePerpWsApi = WsApiService<TungsteniteWsApi>;

/// Resolve the futures WebSocket API endpoint; an explicit `ws_api_url` wins
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

/// Connect to the futures WebSocket API with default connection settings
pub async fn build_ws_api(config: ExchangeConfig) -> Result<BinancePerpWsApi, ExchangeError> {
    let ws_config = WsConfig::new(ws_api_url(&config));
    build_ws_api_with(config, ws_config).await
}

/// Connect to the futures WebSocket API with custom connection settings
pub async fn build_ws_api_with(
    config: ExchangeConfig,
    ws_config: WsConfig,
) -> Result<BinancePerpWsApi, ExchangeError> {
    if !config.has_credentials() {
        return Err(ExchangeError::AuthError(
            "WebSocket API requests are signed; api key and secret key are required".to_string(),
        ));
    }

    info!(url = %ws_config.url, testnet = config.testnet, "connecting to binance futures WebSocket API");
    let client = TungsteniteWsApi::connect(ws_config).await?;
    Ok(WsApiService::new(client, config))
}
