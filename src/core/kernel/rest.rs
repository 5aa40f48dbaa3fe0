use crate::core::config::{ConfigError, ExchangeConfig};
use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::encode_params;
use crate::core::kernel::request::{current_timestamp, SIGNATURE_PARAM, TIMESTAMP_PARAM};
use crate::core::kernel::signer::{signer_for, Signer};
use crate::core::types::{ApiError, Params};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";
pub const RECV_WINDOW_PARAM: &str = "recvWindow";

/// REST client trait for making HTTP requests
///
/// Signed requests carry `timestamp`, optionally `recvWindow`, and a `signature`
/// computed over the exact query string that is sent.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Make a GET request
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `params` - Query parameters
    /// * `authenticated` - Whether to sign the request
    async fn get(
        &self,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<Value, ExchangeError>;

    /// Make a GET request with strongly-typed response
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<T, ExchangeError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    /// `recvWindow` added to signed requests that do not set one
    pub recv_window: Option<u64>,
    /// Local clock minus exchange clock, in milliseconds
    pub time_offset_ms: i64,
}

impl RestClientConfig {
    /// Create a new configuration
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 30,
            user_agent: concat!("binance-wsapi/", env!("CARGO_PKG_VERSION")).to_string(),
            recv_window: None,
            time_offset_ms: 0,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Set the default `recvWindow` for signed requests
    pub fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }

    /// Set the clock-skew compensation for signed timestamps
    pub fn with_time_offset(mut self, time_offset_ms: i64) -> Self {
        self.time_offset_ms = time_offset_ms;
        self
    }
}

#[derive(Clone)]
struct Credentials {
    api_key: Secret<String>,
    signer: Arc<dyn Signer>,
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    credentials: Option<Credentials>,
}

impl RestClientBuilder {
    /// Create a new builder with the given configuration
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            credentials: None,
        }
    }

    /// Set the API key and signer for authenticated requests
    pub fn with_signer(mut self, api_key: String, signer: Arc<dyn Signer>) -> Self {
        self.credentials = Some(Credentials {
            api_key: Secret::new(api_key),
            signer,
        });
        self
    }

    /// Take credentials, key type and time offset from an exchange config
    pub fn with_exchange_config(mut self, config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        self.config.time_offset_ms = config.time_offset_ms;
        if !config.has_credentials() {
            return Ok(self);
        }
        let signer: Arc<dyn Signer> = Arc::from(signer_for(config.key_type, config.secret_key())?);
        Ok(self.with_signer(config.api_key().to_string(), signer))
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ConfigError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            credentials: self.credentials,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    credentials: Option<Credentials>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_credentials", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Query string for a request, signed when `authenticated`
    ///
    /// `@` is left unescaped, as the exchange expects, and the signature covers the
    /// query exactly as it is sent.
    pub fn build_query(&self, params: &Params, authenticated: bool) -> Result<String, ExchangeError> {
        let mut params = params.clone();
        params.retain(|_, v| !v.is_null());

        if !authenticated {
            return Ok(encode_params(&params)?.replace("%40", "@"));
        }

        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::AuthError("Authentication required but no signer provided".to_string())
        })?;

        if let Some(recv_window) = self.config.recv_window {
            params
                .entry(RECV_WINDOW_PARAM)
                .or_insert_with(|| Value::from(recv_window));
        }
        params.insert(
            TIMESTAMP_PARAM.to_string(),
            Value::from(current_timestamp(self.config.time_offset_ms)),
        );

        let query = encode_params(&params)?.replace("%40", "@");
        let signature = credentials.signer.sign(&query)?;
        let signature = serde_urlencoded::to_string([(SIGNATURE_PARAM, signature.as_str())])
            .map_err(|e| {
                ExchangeError::SerializationError(format!("Failed to encode signature: {}", e))
            })?;

        if query.is_empty() {
            Ok(signature)
        } else {
            Ok(format!("{}&{}", query, signature))
        }
    }

    /// Build the full URL for an endpoint
    fn build_url(&self, endpoint: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.config.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.config.base_url, endpoint, query)
        }
    }

    /// Handle the response and extract JSON
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", response_text);

        if status.as_u16() >= 400 {
            return Err(match serde_json::from_str::<ApiError>(&response_text) {
                Ok(api_error) if api_error.code != 0 => api_error.into(),
                _ => ExchangeError::ApiError {
                    code: i32::from(status.as_u16()),
                    message: response_text,
                },
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            ExchangeError::DeserializationError(format!("Failed to parse JSON response: {}", e))
        })
    }

    /// Make a request with the given parameters
    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        let query = self.build_query(params, authenticated)?;
        let url = self.build_url(endpoint, &query);
        let mut request = self.client.request(method, &url);

        if let Some(credentials) = &self.credentials {
            if authenticated {
                request = request.header(API_KEY_HEADER, credentials.api_key.expose_secret());
            }
        }

        debug!(param_count = params.len(), authenticated, "sending request");
        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Request failed: {}", e)))?;

        self.handle_response(response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    async fn get(
        &self,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        self.make_request(Method::GET, endpoint, params, authenticated)
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &Params,
        authenticated: bool,
    ) -> Result<T, ExchangeError> {
        self.make_request(Method::GET, endpoint, params, authenticated)
            .await
            .and_then(|value| {
                serde_json::from_value(value).map_err(|e| {
                    ExchangeError::DeserializationError(format!(
                        "Failed to deserialize JSON: {}",
                        e
                    ))
                })
            })
    }
}
