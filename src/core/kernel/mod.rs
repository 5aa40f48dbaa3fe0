/// Transport kernel for the Binance WebSocket API
///
/// Everything here is independent of individual endpoints. Per-endpoint services in
/// `exchanges::*` build parameters and decode results; the kernel signs, frames,
/// correlates and delivers.
///
/// # Layers
///
/// ## Signing
/// - `Signer`: signs a canonical payload (`HmacSigner`, `RsaSigner`, `Ed25519Signer`)
/// - `request::create_request`: builds the signed `{id, method, params}` envelope
///
/// ## Transport
/// - `WsConnection`: one WebSocket with keepalive and reconnect, feeding a `ConnectionHandler`
/// - `TungsteniteWsApi`: the correlator; matches responses to `write_sync` callers by
///   `id` and routes everything else to the read channel
/// - `ReqwestRest`: signed REST requests
///
/// # Example
///
/// ```rust,no_run
/// use binance_wsapi::core::kernel::*;
/// use binance_wsapi::core::traits::WsApiClient;
/// use binance_wsapi::core::types::{Params, WsApiMethod};
/// use secrecy::Secret;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TungsteniteWsApi::connect(WsConfig::new(
///     "wss://ws-api.binance.com:443/ws-api/v3",
/// ))
/// .await?;
///
/// let secret = Secret::new("secret_key".to_string());
/// let data = RequestData::new(new_request_id(), "api_key", &secret, 0, KeyType::Hmac);
/// let raw = create_request(&data, WsApiMethod("account.status"), Params::new())?;
/// let response = client
///     .write_sync(&data.request_id, raw, Duration::from_secs(5))
///     .await?;
/// println!("{}", String::from_utf8_lossy(&response));
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod pending;
pub mod request;
pub mod rest;
pub mod signer;
pub mod ws;
pub mod ws_api;

pub use codec::{
    decode_response, encode_params, extract_request_id, new_request_id, RequestIdGenerator,
    UuidRequestIds,
};
pub use pending::PendingRequests;
pub use request::{create_request, current_timestamp, sign_request, RequestData};
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{signer_for, Ed25519Signer, HmacSigner, KeyType, RsaSigner, Signer};
pub use ws::{ConnectionHandler, ConnectionState, KeepAlive, ReconnectPolicy, WsConfig, WsConnection};
pub use ws_api::{TungsteniteWsApi, DEFAULT_WRITE_SYNC_TIMEOUT};
