// USDⓈ-M futures WebSocket API, sharing the spot service layer
pub mod algo; // algoOrder.place / algoOrder.cancel
pub mod builder; // endpoint selection + connect helpers
pub mod trading; // order.place / order.cancel / order.status
pub mod types; // serde structs ← raw JSON

pub use algo::{AlgoOrderCancelRequest, AlgoOrderPlaceRequest};
pub use builder::{build_ws_api, build_ws_api_with, ws_api_url, BinancePerpWsApi};
pub use trading::{FuturesOrderCancelRequest, FuturesOrderPlaceRequest, FuturesOrderStatusRequest};
pub use types::*;
