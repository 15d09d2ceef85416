use crate::errors::with_fetch_context;
use crate::http::request::{RequestBody, UpstreamRequest};
use crate::rate_limiter::RateLimiter;
use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// HTTP client with built-in rate limiting
pub struct RateLimitedClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl RateLimitedClient {
    pub fn new(user_agent: &str, timeout_secs: u64, rate_limit_ms: u64) -> Result<Self> {
        let client = Self::build_client(user_agent, timeout_secs)?;
        let rate_limiter = RateLimiter::new(rate_limit_ms);

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// Switch the gap enforced between requests, e.g. when moving to another venue
    pub fn set_delay(&mut self, delay_ms: u64) {
        self.rate_limiter.set_delay(delay_ms);
    }

    /// Requests sent so far
    pub fn request_count(&self) -> usize {
        self.rate_limiter.request_count()
    }

    /// Send a request after the rate limiter lets it through; non-2xx is an error
    pub async fn execute(&mut self, request: &UpstreamRequest) -> Result<Response> {
        self.rate_limiter.wait().await;
        debug!("{} {}", request.method, request.url);

        let response = with_fetch_context(self.build_request(request).send().await, &request.url)?;
        Self::check_response_status(&response, &request.url)?;
        Ok(response)
    }

    pub async fn fetch_text(&mut self, request: &UpstreamRequest) -> Result<String> {
        let response = self.execute(request).await?;
        response.text().await.context("Failed to read response body")
    }

    fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
        Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")
    }

    fn build_request(&self, request: &UpstreamRequest) -> RequestBuilder {
        let mut builder = self.client.request(request.method.clone(), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some((username, password)) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(password));
        }

        match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Json(value) => builder.json(value),
        }
    }

    fn check_response_status(response: &Response, url: &str) -> Result<()> {
        if !response.status().is_success() {
            anyhow::bail!("HTTP error {} from {}", response.status(), url);
        }
        Ok(())
    }
}
