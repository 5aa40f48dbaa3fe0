// Spot WebSocket API
pub mod builder; // endpoint selection + connect helpers
pub mod order_list; // orderList.place / .oco / .oto / .otoco builders
pub mod service; // WsApiService: signing + correlation for every method
pub mod trading; // request builders for order/account methods
pub mod types; // serde structs ← response `result` payloads
pub mod user_data; // userDataStream.subscribe.signature + pushed events

pub use builder::{connect_ws_api, connect_ws_api_with, ws_api_url, BinanceWsApi};
pub use order_list::{
    OrderListLeg, OrderListPlaceOcoRequest, OrderListPlaceOtoRequest, OrderListPlaceOtocoRequest,
    OrderListPlaceRequest,
};
pub use service::{WsApiCall, WsApiService};
pub use trading::{
    AccountStatusRequest, OrderListCancelRequest, OrderPlaceRequest, OrderTestRequest,
    SorOrderPlaceRequest, SorOrderTestRequest,
};
pub use types::*;
pub use user_data::{BinanceUserDataEvent, BinanceUserDataSubscription, UserDataStreamSubscribeRequest};
