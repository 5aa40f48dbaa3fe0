use super::service::WsApiCall;
use crate::core::errors::ExchangeError;
use crate::core::types::{Params, WsApiMethod};
use serde::Deserialize;
use serde_json::Value;

pub const USER_DATA_STREAM_SUBSCRIBE_SIGNATURE: WsApiMethod =
    WsApiMethod("userDataStream.subscribe.signature");

/// Parameters for `userDataStream.subscribe.signature`
///
/// Subscribes the connection to the account's user data stream, authenticated by
/// the request signature instead of a listen key. Events then arrive on the read
/// channel; see [`BinanceUserDataEvent::from_frame`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserDataStreamSubscribeRequest;

impl UserDataStreamSubscribeRequest {
    pub fn new() -> Self {
        Self
    }
}

impl WsApiCall for UserDataStreamSubscribeRequest {
    type Response = BinanceUserDataSubscription;

    fn method(&self) -> WsApiMethod {
        USER_DATA_STREAM_SUBSCRIBE_SIGNATURE
    }

    fn params(&self) -> Result<Params, ExchangeError> {
        Ok(Params::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceUserDataSubscription {
    pub subscription_id: i64,
}

/// One pushed user data event: `{"subscriptionId": .., "event": {"e": .., ..}}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceUserDataEvent {
    pub subscription_id: i64,
    pub event: Value,
}

impl BinanceUserDataEvent {
    /// Parse a frame from the read channel; `None` for anything that is not a pushed event
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        serde_json::from_slice(frame).ok()
    }

    /// Event type such as `executionReport` or `outboundAccountPosition`
    pub fn event_type(&self) -> Option<&str> {
        self.event.get("e").and_then(Value::as_str)
    }

    pub fn event_time(&self) -> Option<i64> {
        self.event.get("E").and_then(Value::as_i64)
    }
}
