pub mod client;
pub mod headers;

pub use client::{ProxyClient, UpstreamBody, UpstreamResponse};
pub use headers::ForwardHeaders;
