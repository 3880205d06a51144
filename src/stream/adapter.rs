//! Boundary between the rewrite engine and whatever intercepts requests.
//!
//! A substrate opens an [`InterceptedRequest`] before a request is sent and
//! calls [`InterceptedRequest::complete`] when its response is available.
//! Responses are exposed to the engine through [`ResponseView`].

use super::tracker::RequestId;
use crate::{Error, Result, logging::RewriteRecord};
use bytes::Bytes;
use std::{sync::Arc, time::Instant};

/// What happened to a completed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The request was never subscribed.
    Declined,
    /// The response was already inspected.
    Skipped,
    /// Inspected and left untouched.
    Passthrough,
    Rewritten { variant_count: usize, bandwidth: u64 },
    /// The original response flows through.
    Failed(String),
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declined => "declined",
            Self::Skipped => "skipped",
            Self::Passthrough => "passthrough",
            Self::Rewritten { .. } => "rewritten",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten { .. })
    }
}

/// A response body as downstream code will read it.
pub trait ResponseView {
    /// The structured result accessor.
    fn body(&self) -> &[u8];

    /// The raw text accessor. `None` when the body is not UTF-8.
    fn text(&self) -> Option<&str> {
        std::str::from_utf8(self.body()).ok()
    }

    /// Replace what both accessors return from now on.
    fn substitute(&mut self, text: String) -> Result<()>;
}

/// Hooks the engine exposes to an interception substrate.
pub trait Interceptor: Send + Sync {
    /// Called before a request is sent. Returning `true` subscribes to its
    /// completion.
    fn before_send(&self, request: &RequestId, url: &str) -> bool;

    /// Called when a subscribed request completes. May fire more than once.
    fn on_complete(&self, request: &RequestId, response: &mut dyn ResponseView) -> Outcome;

    /// Called once the request identity is gone.
    fn release(&self, _request: &RequestId) {}
}

/// In-memory response body with an optional substitution.
#[derive(Debug, Clone)]
pub struct ResponseBody {
    original: Bytes,
    substituted: Option<Bytes>,
    sealed: bool,
}

impl ResponseBody {
    pub fn new(original: impl Into<Bytes>) -> Self {
        Self {
            original: original.into(),
            substituted: None,
            sealed: false,
        }
    }

    /// Refuse further substitution, e.g. once the response head is committed.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_substituted(&self) -> bool {
        self.substituted.is_some()
    }

    pub fn original(&self) -> &Bytes {
        &self.original
    }

    pub fn into_bytes(self) -> Bytes {
        self.substituted.unwrap_or(self.original)
    }
}

impl ResponseView for ResponseBody {
    fn body(&self) -> &[u8] {
        self.substituted.as_ref().unwrap_or(&self.original)
    }

    fn substitute(&mut self, text: String) -> Result<()> {
        if self.sealed {
            return Err(Error::SubstitutionFailure(
                "response body is sealed".to_string(),
            ));
        }
        self.substituted = Some(Bytes::from(text));
        Ok(())
    }
}

/// One request seen by an interceptor. Dropping it releases the request
/// identity.
pub struct InterceptedRequest {
    id: RequestId,
    url: String,
    subscribed: bool,
    interceptor: Arc<dyn Interceptor>,
}

impl InterceptedRequest {
    /// Fire the before-send hook for `url`.
    pub fn open(interceptor: Arc<dyn Interceptor>, url: impl Into<String>) -> Self {
        let id = RequestId::new();
        let url = url.into();
        let subscribed = interceptor.before_send(&id, &url);

        Self {
            id,
            url,
            subscribed,
            interceptor,
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Fire the completion hook. Unsubscribed requests are left alone.
    pub fn complete(&self, response: &mut dyn ResponseView) -> Outcome {
        if !self.subscribed {
            return Outcome::Declined;
        }

        let started = Instant::now();
        let original_len = response.body().len();
        let outcome = self.interceptor.on_complete(&self.id, response);

        RewriteRecord::new(&self.id, &self.url)
            .with_outcome(&outcome)
            .with_sizes(original_len, response.body().len())
            .with_elapsed(started.elapsed())
            .emit();

        outcome
    }
}

impl Drop for InterceptedRequest {
    fn drop(&mut self) {
        if self.subscribed {
            self.interceptor.release(&self.id);
        }
    }
}
