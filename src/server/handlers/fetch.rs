use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};

use crate::{
    Result,
    proxy::{ForwardHeaders, UpstreamBody},
    server::{params::FetchParams, state::AppState},
    stream::{InterceptedRequest, Outcome, ResponseBody},
};

/// Set on responses whose playlist was reduced to a single variant.
pub const REWRITTEN_HEADER: &str = "x-crest-rewritten";

/// Handle GET /fetch requests.
pub async fn handle_fetch(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Response> {
    tracing::info!("Fetch request: {}", params.url);

    state
        .signing_key
        .require(&params.url, params.sig.as_deref())?;

    let target = url::Url::parse(&params.url)?;
    let headers = ForwardHeaders::decode_optional(params.h.as_deref())?.to_header_map()?;

    // Dropping the request at the end of the handler releases its identity.
    let request = InterceptedRequest::open(state.interceptor.clone(), params.url.as_str());

    let upstream = state.client.fetch(target.as_str(), headers).await?;

    let (mut response, outcome) = match upstream.body {
        UpstreamBody::Buffered(bytes) => {
            let mut body = ResponseBody::new(bytes);
            // Error pages are observed but never rewritten.
            if !upstream.status.is_success() {
                body.seal();
            }
            let outcome = request.complete(&mut body);
            ((upstream.status, body.into_bytes()).into_response(), outcome)
        }
        UpstreamBody::Streamed(stream) => {
            tracing::debug!(request = %request.id(), "Body too large to inspect");
            (
                (upstream.status, Body::from_stream(stream)).into_response(),
                Outcome::Declined,
            )
        }
    };

    if let Some(content_type) = upstream.content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    if outcome.is_rewritten() {
        response
            .headers_mut()
            .insert(REWRITTEN_HEADER, HeaderValue::from_static("1"));
    }

    Ok(response)
}
