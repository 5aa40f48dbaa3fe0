use crate::core::errors::ExchangeError;
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::pkcs8::DecodePrivateKey as _;
use ed25519_dalek::{Signer as _, SigningKey};
use hmac::{Hmac, Mac};
use rsa::pkcs1::DecodeRsaPrivateKey as _;
use rsa::pkcs1v15;
use rsa::signature::SignatureEncoding as _;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme matching the kind of secret the API key was registered with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// HMAC-SHA256, hex encoded
    #[default]
    #[serde(rename = "HMAC")]
    Hmac,
    /// RSASSA-PKCS1-v1_5 with SHA-256, base64 encoded
    #[serde(rename = "RSA")]
    Rsa,
    /// Ed25519, base64 encoded
    #[serde(rename = "ED25519")]
    Ed25519,
}

impl KeyType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hmac => "HMAC",
            Self::Rsa => "RSA",
            Self::Ed25519 => "ED25519",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HMAC" => Ok(Self::Hmac),
            "RSA" => Ok(Self::Rsa),
            "ED25519" => Ok(Self::Ed25519),
            _ => Err(ExchangeError::UnsupportedKeyType(s.to_string())),
        }
    }
}

/// Signs canonical request payloads
///
/// Implementations parse their key material once at construction so that
/// signing a request is only the cryptographic operation itself.
pub trait Signer: Send + Sync {
    /// Scheme this signer implements
    fn key_type(&self) -> KeyType;

    /// Sign `payload` and return the encoded signature
    fn sign(&self, payload: &str) -> Result<String, ExchangeError>;
}

/// HMAC-SHA256 signer
pub struct HmacSigner {
    secret: Zeroizing<Vec<u8>>,
}

impl HmacSigner {
    pub fn new(secret_key: &str) -> Self {
        Self {
            secret: Zeroizing::new(secret_key.as_bytes().to_vec()),
        }
    }
}

impl Signer for HmacSigner {
    fn key_type(&self) -> KeyType {
        KeyType::Hmac
    }

    fn sign(&self, payload: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| ExchangeError::AuthError(format!("Invalid secret key: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// RSA PKCS#1 v1.5 / SHA-256 signer
pub struct RsaSigner {
    signing_key: pkcs1v15::SigningKey<Sha256>,
}

impl RsaSigner {
    /// Create a signer from a PEM private key, PKCS#8 or PKCS#1
    pub fn new(private_key_pem: &str) -> Result<Self, ExchangeError> {
        let pem = private_key_pem.trim();
        let key = if pem.contains("BEGIN RSA PRIVATE KEY") {
            RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|e| ExchangeError::AuthError(format!("Invalid RSA private key: {}", e)))?
        } else {
            RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|e| ExchangeError::AuthError(format!("Invalid RSA private key: {}", e)))?
        };

        Ok(Self {
            signing_key: pkcs1v15::SigningKey::<Sha256>::new(key),
        })
    }
}

impl Signer for RsaSigner {
    fn key_type(&self) -> KeyType {
        KeyType::Rsa
    }

    fn sign(&self, payload: &str) -> Result<String, ExchangeError> {
        let signature = self
            .signing_key
            .try_sign(payload.as_bytes())
            .map_err(|e| ExchangeError::AuthError(format!("RSA signing failed: {}", e)))?;
        Ok(general_purpose::STANDARD.encode(signature.to_bytes()))
    }
}

/// Ed25519 signer
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    /// Create a signer from a PEM PKCS#8 key or a base64-encoded 32-byte seed
    pub fn new(private_key: &str) -> Result<Self, ExchangeError> {
        let private_key = private_key.trim();

        let signing_key = if private_key.starts_with("-----BEGIN") {
            SigningKey::from_pkcs8_pem(private_key).map_err(|e| {
                ExchangeError::AuthError(format!("Invalid Ed25519 private key: {}", e))
            })?
        } else {
            let key_bytes = general_purpose::STANDARD.decode(private_key).map_err(|e| {
                ExchangeError::AuthError(format!("Invalid private key format: {}", e))
            })?;
            let seed: [u8; 32] = key_bytes.as_slice().try_into().map_err(|_| {
                ExchangeError::AuthError("Invalid private key length".to_string())
            })?;
            SigningKey::from_bytes(&seed)
        };

        Ok(Self { signing_key })
    }

    pub fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl Signer for Ed25519Signer {
    fn key_type(&self) -> KeyType {
        KeyType::Ed25519
    }

    fn sign(&self, payload: &str) -> Result<String, ExchangeError> {
        let signature = self.signing_key.sign(payload.as_bytes());
        Ok(general_purpose::STANDARD.encode(signature.to_bytes()))
    }
}

/// Build the signer for `key_type` from its secret
pub fn signer_for(key_type: KeyType, secret_key: &str) -> Result<Box<dyn Signer>, ExchangeError> {
    Ok(match key_type {
        KeyType::Hmac => Box::new(HmacSigner::new(secret_key)),
        KeyType::Rsa => Box::new(RsaSigner::new(secret_key)?),
        KeyType::Ed25519 => Box::new(Ed25519Signer::new(secret_key)?),
    })
}

/// Sign `payload` with `secret_key` using the scheme named by `key_type`
pub fn sign(secret_key: &str, key_type: KeyType, payload: &str) -> Result<String, ExchangeError> {
    signer_for(key_type, secret_key)?.sign(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier as _;
    use rsa::pkcs8::EncodePrivateKey as _;

    // Published Binance signing examples
    const BINANCE_TEST_SECRET: &str =
        "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

    #[test]
    fn test_key_type_parsing() {
        assert_eq!("HMAC".parse::<KeyType>().unwrap(), KeyType::Hmac);
        assert_eq!("rsa".parse::<KeyType>().unwrap(), KeyType::Rsa);
        assert_eq!("Ed25519".parse::<KeyType>().unwrap(), KeyType::Ed25519);
        assert!(matches!(
            "".parse::<KeyType>(),
            Err(ExchangeError::UnsupportedKeyType(_))
        ));
        assert!(matches!(
            "ECDSA".parse::<KeyType>(),
            Err(ExchangeError::UnsupportedKeyType(ref k)) if k == "ECDSA"
        ));
    }

    #[test]
    fn test_hmac_matches_binance_vector() {
        let message = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let expected = "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71";

        assert_eq!(sign(BINANCE_TEST_SECRET, KeyType::Hmac, message).unwrap(), expected);
    }

    #[test]
    fn test_hmac_is_deterministic() {
        let first = sign("s", KeyType::Hmac, "apiKey=k&timestamp=1").unwrap();
        let second = sign("s", KeyType::Hmac, "apiKey=k&timestamp=1").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_rsa_signature_verifies() {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let pem = private_key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();
        let payload = "apiKey=k&symbol=BTCUSDT&timestamp=1700000000000";

        let encoded = sign(&pem, KeyType::Rsa, payload).unwrap();
        let raw = general_purpose::STANDARD.decode(encoded).unwrap();

        let verifying_key = pkcs1v15::VerifyingKey::<Sha256>::new(private_key.to_public_key());
        let signature = pkcs1v15::Signature::try_from(raw.as_slice()).unwrap();
        assert!(verifying_key.verify(payload.as_bytes(), &signature).is_ok());
        assert!(verifying_key.verify(b"tampered", &signature).is_err());
    }

    #[test]
    fn test_ed25519_from_base64_seed_verifies() {
        let seed = [7u8; 32];
        let secret = general_purpose::STANDARD.encode(seed);
        let signer = Ed25519Signer::new(&secret).unwrap();
        let payload = "apiKey=k&timestamp=1700000000000";

        let raw = general_purpose::STANDARD
            .decode(signer.sign(payload).unwrap())
            .unwrap();
        let signature = ed25519_dalek::Signature::from_slice(&raw).unwrap();
        assert!(signer.verifying_key().verify(payload.as_bytes(), &signature).is_ok());
    }

    #[test]
    fn test_ed25519_from_pem() {

        let key = SigningKey::from_bytes(&[42u8; 32]);
        let pem = key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();

        let signer = signer_for(KeyType::Ed25519, &pem).unwrap();
        assert_eq!(signer.key_type(), KeyType::Ed25519);

        let raw = general_purpose::STANDARD
            .decode(signer.sign("timestamp=1").unwrap())
            .unwrap();
        let signature = ed25519_dalek::Signature::from_slice(&raw).unwrap();
        assert!(key.verifying_key().verify(b"timestamp=1", &signature).is_ok());
    }

    #[test]
    fn test_invalid_key_material() {
        assert!(matches!(
            sign("not a pem", KeyType::Rsa, "x"),
            Err(ExchangeError::AuthError(_))
        ));
        assert!(matches!(
            sign("c2hvcnQ=", KeyType::Ed25519, "x"),
            Err(ExchangeError::AuthError(_))
        ));
    }
}
