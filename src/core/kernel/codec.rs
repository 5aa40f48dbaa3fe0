use crate::core::errors::ExchangeError;
use crate::core::types::{Params, WsApiResponse};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Canonical `key=value&...` form of `params`, the exact bytes that get signed
///
/// Keys are taken in sorted order and both sides are form-urlencoded. Strings are
/// written without JSON quotes; numbers and booleans use their JSON text.
pub fn encode_params(params: &Params) -> Result<String, ExchangeError> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        pairs.push((key.as_str(), param_text(value)?));
    }
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    serde_urlencoded::to_string(&pairs).map_err(|e| {
        ExchangeError::SerializationError(format!("Failed to encode parameters: {}", e))
    })
}

fn param_text(value: &Value) -> Result<String, ExchangeError> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value)?,
    })
}

#[derive(Deserialize)]
struct IdProbe {
    #[serde(default)]
    id: Option<Value>,
}

/// Pull the correlation id out of an inbound frame without decoding the payload
///
/// Integer ids are returned in decimal form. Frames that are not JSON objects or
/// carry no usable id yield `None`.
pub fn extract_request_id(frame: &[u8]) -> Option<String> {
    let probe: IdProbe = serde_json::from_slice(frame).ok()?;
    match probe.id? {
        Value::String(id) if !id.is_empty() => Some(id),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a correlated frame into its typed envelope
pub fn decode_response<T: DeserializeOwned>(
    frame: &[u8],
) -> Result<WsApiResponse<T>, ExchangeError> {
    serde_json::from_slice(frame).map_err(|e| {
        ExchangeError::DeserializationError(format!("Failed to decode response: {}", e))
    })
}

/// Source of request ids, unique within a connection's lifetime
pub trait RequestIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// UUID v4 request ids
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestIds;

impl RequestIdGenerator for UuidRequestIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Fresh request id from the default generator
pub fn new_request_id() -> String {
    UuidRequestIds.next_id()
}
