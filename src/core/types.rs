use crate::core::errors::ExchangeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Request parameters, kept sorted by key
pub type Params = serde_json::Map<String, Value>;

/// Operation name sent in the `method` field of a WebSocket API request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WsApiMethod(pub &'static str);

impl WsApiMethod {
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for WsApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for WsApiMethod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0)
    }
}

/// Signed request envelope written to the socket
#[derive(Debug, Clone, Serialize)]
pub struct WsApiRequest {
    pub id: String,
    pub method: WsApiMethod,
    pub params: Params,
}

/// Error object carried by a failed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub msg: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<APIError> code={}, msg={}", self.code, self.msg)
    }
}

impl From<ApiError> for ExchangeError {
    fn from(err: ApiError) -> Self {
        Self::ApiError {
            code: err.code as i32,
            message: err.msg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub rate_limit_type: String,
    pub interval: String,
    pub interval_num: u32,
    pub limit: u64,
    #[serde(default)]
    pub count: u64,
}

/// Response envelope correlated to a request by `id`
#[derive(Debug, Clone, Deserialize)]
pub struct WsApiResponse<T> {
    pub id: String,
    pub status: u16,
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<ApiError>,
    #[serde(default, rename = "rateLimits")]
    pub rate_limits: Vec<RateLimit>,
}

impl<T> WsApiResponse<T> {
    /// The exchange rejected the request; `result` is meaningless
    pub fn is_error(&self) -> bool {
        self.status >= 400 || self.error.is_some()
    }

    /// Convert an exchange-reported failure into `ExchangeError::ApiError`
    pub fn into_result(self) -> Result<T, ExchangeError> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        if self.status >= 400 {
            return Err(ExchangeError::ApiError {
                code: i32::from(self.status),
                message: format!("request {} failed with status {}", self.id, self.status),
            });
        }
        self.result.ok_or_else(|| {
            ExchangeError::DeserializationError(format!("response {} has no result", self.id))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
    StopLoss,
    StopLossLimit,
    TakeProfit,
    TakeProfitLimit,
    LimitMaker,
    Stop,
    StopMarket,
    TakeProfitMarket,
    TrailingStopMarket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    GTC, // Good Till Canceled
    IOC, // Immediate or Cancel
    FOK, // Fill or Kill
    GTX, // Post only
    GTD, // Good till date, futures only
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NewOrderRespType {
    Ack,
    Result,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelfTradePreventionMode {
    None,
    ExpireTaker,
    ExpireMaker,
    ExpireBoth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    PendingCancel,
    Rejected,
    Expired,
    ExpiredInMatch,
    #[serde(other)]
    Unknown,
}

/// Wire name of a serde unit variant, e.g. `OrderSide::Buy` -> `"BUY"`
pub(crate) fn wire_name<T: Serialize>(value: &T) -> Result<String, ExchangeError> {
    match serde_json::to_value(value)? {
        Value::String(s) => Ok(s),
        other => Err(ExchangeError::SerializationError(format!(
            "expected a string enum, got {}",
            other
        ))),
    }
}
