use serde::Deserialize;

/// Query parameters for the /fetch endpoint.
#[derive(Debug, Deserialize)]
pub struct FetchParams {
    /// Target URL.
    pub url: String,

    /// Base64url-encoded JSON headers to forward upstream.
    #[serde(default)]
    pub h: Option<String>,

    /// HMAC-SHA256 signature of `url` (hex encoded).
    /// Required when CREST_SIGNING_KEY is set.
    #[serde(default)]
    pub sig: Option<String>,
}
