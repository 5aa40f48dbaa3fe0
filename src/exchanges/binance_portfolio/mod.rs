// Portfolio margin REST API
pub mod rest; // typed wrapper around RestClient
pub mod types; // serde structs ← raw JSON

use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, RestClientBuilder, RestClientConfig};

pub use rest::{BinancePortfolioRestClient, GetMarginOrderService};
pub use types::MarginOrder;

pub const PAPI_URL: &str = "https://papi.binance.com";

/// Create a portfolio margin REST client signing with the configured key
pub fn build_rest_client(
    config: &ExchangeConfig,
) -> Result<BinancePortfolioRestClient<ReqwestRest>, ExchangeError> {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| PAPI_URL.to_string());

    let rest = RestClientBuilder::new(RestClientConfig::new(
        base_url,
        "binance_portfolio".to_string(),
    ))
    .with_exchange_config(config)?
    .build()?;

    Ok(BinancePortfolioRestClient::new(rest))
}
