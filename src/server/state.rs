use super::signature::SigningKey;
use crate::{
    Result,
    config::ProxyConfig,
    proxy::ProxyClient,
    stream::{BestVariantInterceptor, PlaylistClassifier},
};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub client: ProxyClient,
    pub interceptor: Arc<BestVariantInterceptor>,
    pub signing_key: SigningKey,
}

impl AppState {
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let classifier =
            PlaylistClassifier::new(config.playlist_host.as_str()).allow_http(config.allow_http);

        Ok(Self {
            client: ProxyClient::new(config.upstream_timeout, config.max_inspect_bytes)?,
            interceptor: Arc::new(BestVariantInterceptor::new(classifier)),
            signing_key: config.signing_key.clone(),
        })
    }
}
