pub mod core;
pub mod exchanges;

pub use core::{config::ExchangeConfig, errors::ExchangeError, traits::WsApiClient, types::*};
pub use core::kernel::{KeyType, TungsteniteWsApi, WsConfig};
pub use exchanges::binance::{connect_ws_api, BinanceWsApi, WsApiService};
