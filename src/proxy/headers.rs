use crate::{Error, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

/// Headers to forward upstream, carried in a query parameter as base64url
/// (unpadded) JSON: `{"Referer": "https://x.com/"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardHeaders(BTreeMap<String, String>);

impl ForwardHeaders {
    pub fn decode(encoded: &str) -> Result<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| Error::InvalidHeaderEncoding(e.to_string()))?;

        serde_json::from_slice(&json)
            .map(Self)
            .map_err(|e| Error::InvalidHeaderEncoding(e.to_string()))
    }

    /// Empty when the parameter is absent or blank.
    pub fn decode_optional(encoded: Option<&str>) -> Result<Self> {
        match encoded {
            Some(s) if !s.is_empty() => Self::decode(s),
            _ => Ok(Self::default()),
        }
    }

    pub fn encode(&self) -> Result<String> {
        let json =
            serde_json::to_vec(&self.0).map_err(|e| Error::InvalidHeaderEncoding(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate names and values for use on an outgoing request.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeaderEncoding(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidHeaderEncoding(format!("{name}: {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}
