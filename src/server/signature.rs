//! HMAC-SHA256 signatures over `/fetch` target URLs.
//!
//! With a key configured, only URLs signed with that key are fetched, which
//! keeps the proxy from being used to reach arbitrary hosts. Without a key,
//! every URL is accepted.

use crate::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct SigningKey {
    key: Option<Arc<[u8]>>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = if self.key.is_some() {
            "[REDACTED]"
        } else {
            "[DISABLED]"
        };
        f.debug_struct("SigningKey").field("key", &key).finish()
    }
}

impl SigningKey {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: Some(key.into().into()),
        }
    }

    pub fn disabled() -> Self {
        Self { key: None }
    }

    /// Read `CREST_SIGNING_KEY`, hex-decoded when possible, raw bytes otherwise.
    pub fn from_env() -> Self {
        match std::env::var("CREST_SIGNING_KEY") {
            Ok(key) if !key.is_empty() => {
                tracing::info!("URL signature validation is enabled");
                Self::new(hex::decode(&key).unwrap_or_else(|_| key.into_bytes()))
            }
            _ => {
                tracing::warn!("CREST_SIGNING_KEY is not set, /fetch accepts any URL");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    fn mac(key: &[u8], url: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(key).ok()?;
        mac.update(url.as_bytes());
        Some(mac)
    }

    /// Hex signature for `url`, or an empty string when disabled.
    pub fn sign(&self, url: &str) -> String {
        self.key
            .as_deref()
            .and_then(|key| Self::mac(key, url))
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default()
    }

    /// Always `true` when disabled.
    pub fn verify(&self, url: &str, signature: Option<&str>) -> bool {
        let Some(key) = self.key.as_deref() else {
            return true;
        };

        let (Some(sig), Some(mac)) = (signature, Self::mac(key, url)) else {
            return false;
        };

        hex::decode(sig).is_ok_and(|bytes| mac.verify_slice(&bytes).is_ok())
    }

    pub fn require(&self, url: &str, signature: Option<&str>) -> Result<()> {
        if self.verify(url, signature) {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }
}
