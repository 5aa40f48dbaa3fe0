use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::encode_params;
use crate::core::kernel::signer::{signer_for, KeyType};
use crate::core::types::{Params, WsApiMethod, WsApiRequest};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use tracing::{instrument, trace};

pub const API_KEY_PARAM: &str = "apiKey";
pub const TIMESTAMP_PARAM: &str = "timestamp";
pub const SIGNATURE_PARAM: &str = "signature";

/// Everything needed to sign one WebSocket API request
///
/// Credentials are borrowed from their owner, usually an [`ExchangeConfig`].
#[derive(Clone)]
pub struct RequestData<'a> {
    pub request_id: String,
    pub api_key: &'a str,
    pub secret_key: &'a Secret<String>,
    /// Local clock minus exchange clock, in milliseconds
    pub time_offset: i64,
    pub key_type: KeyType,
}

impl std::fmt::Debug for RequestData<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestData")
            .field("request_id", &self.request_id)
            .field("time_offset", &self.time_offset)
            .field("key_type", &self.key_type)
            .finish_non_exhaustive()
    }
}

impl<'a> RequestData<'a> {
    pub fn new(
        request_id: impl Into<String>,
        api_key: &'a str,
        secret_key: &'a Secret<String>,
        time_offset: i64,
        key_type: KeyType,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            api_key,
            secret_key,
            time_offset,
            key_type,
        }
    }

    /// Request data for `request_id` using the credentials held by `config`
    pub fn from_config(request_id: impl Into<String>, config: &'a ExchangeConfig) -> Self {
        Self::new(
            request_id,
            config.api_key(),
            &config.secret_key,
            config.time_offset_ms,
            config.key_type,
        )
    }

    fn validate(&self) -> Result<(), ExchangeError> {
        if self.request_id.is_empty() {
            return Err(ExchangeError::RequestIdNotSet);
        }
        if self.api_key.is_empty() {
            return Err(ExchangeError::ApiKeyNotSet);
        }
        if self.secret_key.expose_secret().is_empty() {
            return Err(ExchangeError::SecretKeyNotSet);
        }
        Ok(())
    }
}

/// Current exchange time in milliseconds, compensated by `time_offset`
pub fn current_timestamp(time_offset: i64) -> i64 {
    chrono::Utc::now().timestamp_millis() - time_offset
}

/// Build the signed request envelope
///
/// `apiKey` and `timestamp` are injected into `params`, the canonical encoding of
/// the result is signed and `signature` is added last. Null params are dropped so
/// that what is signed is exactly what is sent.
pub fn sign_request(
    data: &RequestData<'_>,
    method: WsApiMethod,
    mut params: Params,
) -> Result<WsApiRequest, ExchangeError> {
    data.validate()?;

    params.retain(|_, value| !value.is_null());
    params.insert(API_KEY_PARAM.to_string(), Value::from(data.api_key));
    params.insert(
        TIMESTAMP_PARAM.to_string(),
        Value::from(current_timestamp(data.time_offset)),
    );
    params.remove(SIGNATURE_PARAM);

    let payload = encode_params(&params)?;
    let signature = signer_for(data.key_type, data.secret_key.expose_secret())?.sign(&payload)?;
    params.insert(SIGNATURE_PARAM.to_string(), Value::from(signature));

    Ok(WsApiRequest {
        id: data.request_id.clone(),
        method,
        params,
    })
}

/// Build and serialize the signed request envelope, ready for the socket
#[instrument(skip(data, params), fields(request_id = %data.request_id, method = %method))]
pub fn create_request(
    data: &RequestData<'_>,
    method: WsApiMethod,
    params: Params,
) -> Result<Vec<u8>, ExchangeError> {
    let request = sign_request(data, method, params)?;
    let raw = serde_json::to_vec(&request).map_err(|e| {
        ExchangeError::SerializationError(format!("Failed to serialize request: {}", e))
    })?;
    trace!(bytes = raw.len(), "built signed request");
    Ok(raw)
}
