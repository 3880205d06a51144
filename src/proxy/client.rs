use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use reqwest::{
    Client, StatusCode,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use std::{fmt, time::Duration};

/// Upstream body, buffered when small enough to inspect.
pub enum UpstreamBody {
    Buffered(Bytes),
    /// Larger than the inspection limit. Already-read bytes come first.
    Streamed(BoxStream<'static, reqwest::Result<Bytes>>),
}

impl fmt::Debug for UpstreamBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Streamed(_) => f.write_str("Streamed"),
        }
    }
}

#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: UpstreamBody,
}

/// HTTP client for fetching upstream resources on behalf of callers.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    max_buffered: u64,
}

impl ProxyClient {
    /// Bodies over `max_buffered` bytes are streamed through uninspected.
    pub fn new(timeout: Duration, max_buffered: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_buffered,
        })
    }

    /// GET `url` with the given headers. Non-success statuses are returned,
    /// not turned into errors, so the caller sees what upstream said.
    pub async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<UpstreamResponse> {
        let mut response = self.client.get(url).headers(headers).send().await?;
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();

        if status.is_server_error() {
            tracing::warn!("Upstream {} answered {}", url, status);
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_buffered)
        {
            tracing::debug!("Streaming oversized body from {}", url);
            return Ok(UpstreamResponse {
                status,
                content_type,
                body: UpstreamBody::Streamed(response.bytes_stream().boxed()),
            });
        }

        let mut buffered = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            buffered.extend_from_slice(&chunk);

            if buffered.len() as u64 > self.max_buffered {
                tracing::debug!("Body from {} exceeded {} bytes, streaming", url, self.max_buffered);
                let head = buffered.freeze();
                let body = stream::once(async move { Ok(head) })
                    .chain(response.bytes_stream())
                    .boxed();
                return Ok(UpstreamResponse {
                    status,
                    content_type,
                    body: UpstreamBody::Streamed(body),
                });
            }
        }

        Ok(UpstreamResponse {
            status,
            content_type,
            body: UpstreamBody::Buffered(buffered.freeze()),
        })
    }
}
