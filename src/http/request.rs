use reqwest::Method;
use serde_json::Value;

/// Body of an upstream request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Form(Vec<(String, String)>),
    Json(Value),
}

/// A fully described upstream request.
///
/// Fetchers build these as plain data so request shapes can be checked
/// without touching the network; `RateLimitedClient` turns them into
/// reqwest calls.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub basic_auth: Option<(String, String)>,
    pub body: RequestBody,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url.into(), RequestBody::Empty)
    }

    pub fn post_form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self::new(Method::POST, url.into(), RequestBody::Form(fields))
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, url.into(), RequestBody::Json(body))
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Attach a session cookie when one is configured
    pub fn with_cookie(self, cookie: Option<&str>) -> Self {
        match cookie {
            Some(cookie) if !cookie.is_empty() => self.with_header("Cookie", cookie),
            _ => self,
        }
    }

    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.basic_auth = Some((username.to_string(), password.to_string()));
        self
    }

    /// Form field value by name
    pub fn form_value(&self, name: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(fields) => fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// JSON body, if the request carries one
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }

    fn new(method: Method, url: String, body: RequestBody) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            basic_auth: None,
            body,
        }
    }
}

/// Build a URL with query parameters, percent-encoding the values
pub fn with_query(base: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return base.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, separator, query)
}
