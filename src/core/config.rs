use crate::core::kernel::signer::KeyType;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub key_type: KeyType,
    /// Local clock minus exchange clock, in milliseconds
    pub time_offset_ms: i64,
    pub testnet: bool,
    pub base_url: Option<String>,
    pub ws_api_url: Option<String>,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 7)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("key_type", &self.key_type)?;
        state.serialize_field("time_offset_ms", &self.time_offset_ms)?;
        state.serialize_field("testnet", &self.testnet)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("ws_api_url", &self.ws_api_url)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            key_type: KeyType,
            #[serde(default)]
            time_offset_ms: i64,
            #[serde(default)]
            testnet: bool,
            base_url: Option<String>,
            ws_api_url: Option<String>,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            key_type: helper.key_type,
            time_offset_ms: helper.time_offset_ms,
            testnet: helper.testnet,
            base_url: helper.base_url,
            ws_api_url: helper.ws_api_url,
        })
    }
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials, signing with HMAC
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            key_type: KeyType::Hmac,
            time_offset_ms: 0,
            testnet: false,
            base_url: None,
            ws_api_url: None,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{EXCHANGE}_API_KEY` (e.g., `BINANCE_API_KEY`)
    /// - `{EXCHANGE}_SECRET_KEY` (HMAC secret or PEM private key)
    /// - `{EXCHANGE}_KEY_TYPE` (optional, `HMAC`, `RSA` or `ED25519`, defaults to `HMAC`)
    /// - `{EXCHANGE}_TIME_OFFSET` (optional, milliseconds, defaults to 0)
    /// - `{EXCHANGE}_TESTNET` (optional, defaults to false)
    /// - `{EXCHANGE}_BASE_URL` (optional)
    /// - `{EXCHANGE}_WS_API_URL` (optional)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = exchange_prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);
        let key_type_var = format!("{}_KEY_TYPE", prefix);
        let time_offset_var = format!("{}_TIME_OFFSET", prefix);
        let testnet_var = format!("{}_TESTNET", prefix);
        let base_url_var = format!("{}_BASE_URL", prefix);
        let ws_api_url_var = format!("{}_WS_API_URL", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let key_type = match env::var(&key_type_var) {
            Ok(raw) => raw.parse::<KeyType>().map_err(|_| {
                ConfigError::InvalidConfiguration(format!("{}: unknown key type {:?}", key_type_var, raw))
            })?,
            Err(_) => KeyType::Hmac,
        };

        let time_offset_ms = match env::var(&time_offset_var) {
            Ok(raw) => raw.trim().parse::<i64>().map_err(|e| {
                ConfigError::InvalidConfiguration(format!("{}: {}", time_offset_var, e))
            })?,
            Err(_) => 0,
        };

        let testnet = env::var(&testnet_var)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            key_type,
            time_offset_ms,
            testnet,
            base_url: env::var(&base_url_var).ok(),
            ws_api_url: env::var(&ws_api_url_var).ok(),
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    ///
    /// A missing file is not an error; system environment variables are used instead.
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(_) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(exchange_prefix)
    }

    /// Check if this configuration has valid credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    /// Set testnet mode
    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Set the signature scheme matching the secret key
    #[must_use]
    pub const fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    /// Set the clock-skew compensation applied to every signed timestamp
    #[must_use]
    pub const fn time_offset_ms(mut self, time_offset_ms: i64) -> Self {
        self.time_offset_ms = time_offset_ms;
        self
    }

    /// Set custom REST base URL
    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set custom WebSocket API URL
    #[must_use]
    pub fn ws_api_url(mut self, ws_api_url: String) -> Self {
        self.ws_api_url = Some(ws_api_url);
        self
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
