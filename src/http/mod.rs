mod client;
mod request;

pub use client::RateLimitedClient;
pub use request::{RequestBody, UpstreamRequest, with_query};
