use super::{
    adapter::{Interceptor, Outcome, ResponseView},
    classifier::PlaylistClassifier,
    rewriter::{ModifyReport, modify_reported},
    tracker::{RequestId, ResponseRewriteTracker},
};
use crate::Error;

/// Rewrites master playlists down to their highest-bandwidth variant, at most
/// once per request.
#[derive(Debug, Default)]
pub struct BestVariantInterceptor {
    classifier: PlaylistClassifier,
    tracker: ResponseRewriteTracker,
}

impl BestVariantInterceptor {
    pub fn new(classifier: PlaylistClassifier) -> Self {
        Self {
            classifier,
            tracker: ResponseRewriteTracker::new(),
        }
    }

    pub fn tracker(&self) -> &ResponseRewriteTracker {
        &self.tracker
    }
}

impl Interceptor for BestVariantInterceptor {
    fn before_send(&self, request: &RequestId, url: &str) -> bool {
        let subscribe = self.classifier.is_playlist_url(url);
        if subscribe {
            tracing::debug!(%request, url, "Watching playlist request");
        }
        subscribe
    }

    fn on_complete(&self, request: &RequestId, response: &mut dyn ResponseView) -> Outcome {
        if !self.tracker.try_claim(request) {
            tracing::debug!(%request, "Response already processed");
            return Outcome::Skipped;
        }

        let Some(text) = response.text() else {
            tracing::debug!(%request, error = %Error::NonTextualBody, "Not inspecting response");
            return Outcome::Passthrough;
        };

        let (text, variant_count, bandwidth) = match modify_reported(text) {
            (
                text,
                ModifyReport::Rewritten {
                    variant_count,
                    bandwidth,
                },
            ) => (text, variant_count, bandwidth),
            (_, ModifyReport::Unchanged) => return Outcome::Passthrough,
            (_, ModifyReport::FellBack(reason)) => return Outcome::Failed(reason),
        };

        match response.substitute(text) {
            Ok(()) => Outcome::Rewritten {
                variant_count,
                bandwidth,
            },
            Err(e) => {
                tracing::warn!(%request, error = %e, "Leaving original playlist in place");
                Outcome::Failed(e.to_string())
            }
        }
    }

    fn release(&self, request: &RequestId) {
        self.tracker.forget(request);
    }
}
