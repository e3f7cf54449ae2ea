//! Client configuration and the single request dispatch path.
//!
//! # Design
//! `GristClient` holds the base URL, bearer token, an optional global filter
//! and a shared `Transport` handle. It is read-only while dispatching, so one
//! client (or its clones) can serve concurrent callers as long as the
//! transport allows it. Dispatch is split into `build_http_request`, which is
//! pure, and `send`, which executes the request and normalizes the result:
//! status 200 yields the raw body, anything else an `ApiError`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{ApiError, Error, Result};
use crate::filter::Filter;
use crate::http::{HttpRequest, HttpResponse, Method};
use crate::request::GristRequest;
use crate::transport::{Transport, UreqTransport};

pub const URL_ENV: &str = "GRIST_URL";
pub const API_KEY_ENV: &str = "GRIST_API_KEY";

const FILTER_PARAM: &str = "filter";

/// Blocking client for the Grist REST API.
#[derive(Clone)]
pub struct GristClient {
    base_url: String,
    token: String,
    transport: Arc<dyn Transport>,
    global_filter: Option<Filter>,
}

impl fmt::Debug for GristClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GristClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("global_filter", &self.global_filter)
            .finish_non_exhaustive()
    }
}

/// Builder for `GristClient`. Every field is optional; an unset transport
/// falls back to `UreqTransport::new()`.
#[derive(Default)]
pub struct ClientBuilder {
    url: String,
    api_key: String,
    transport: Option<Arc<dyn Transport>>,
    global_filter: Option<Filter>,
}

impl ClientBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(transport);
        self.transport = Some(transport);
        self
    }

    /// Share an existing transport handle between several clients.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a preconfigured `ureq::Agent` (timeouts, proxy, TLS settings).
    pub fn agent(self, agent: ureq::Agent) -> Self {
        self.transport(UreqTransport::with_agent(agent))
    }

    /// Filter applied to every request that does not carry its own.
    pub fn global_filter(mut self, filter: Filter) -> Self {
        self.global_filter = Some(filter);
        self
    }

    pub fn build(self) -> GristClient {
        GristClient {
            base_url: self.url.trim_end_matches('/').to_string(),
            token: self.api_key,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(UreqTransport::new())),
            global_filter: self.global_filter,
        }
    }
}

impl GristClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Client for `base_url` using the default transport.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::builder().url(base_url).api_key(api_key).build()
    }

    /// Configure from `GRIST_URL` (required) and `GRIST_API_KEY` (optional).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup(URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{URL_ENV} is not set")))?;
        let api_key = lookup(API_KEY_ENV).unwrap_or_default();
        Ok(Self::builder().url(url).api_key(api_key).build())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn global_filter(&self) -> Option<&Filter> {
        self.global_filter.as_ref()
    }

    pub fn set_global_filter(&mut self, filter: Filter) {
        self.global_filter = Some(filter);
    }

    pub fn clear_global_filter(&mut self) {
        self.global_filter = None;
    }

    /// Resolve a `GristRequest` into the exact HTTP request that will be sent.
    ///
    /// A request-level filter replaces the global one; the two are never
    /// merged.
    pub fn build_http_request(&self, request: &GristRequest) -> HttpRequest {
        let mut query: Vec<(String, String)> = Vec::new();
        if let Some(global) = &self.global_filter {
            query.push((FILTER_PARAM.to_string(), global.as_str().to_string()));
        }
        if let Some(filter) = &request.filter {
            query.retain(|(name, _)| name != FILTER_PARAM);
            query.push((FILTER_PARAM.to_string(), filter.as_str().to_string()));
        }

        HttpRequest {
            method: request.method,
            url: format!("{}{}", self.base_url, request.path),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {}", self.token)),
            ],
            query,
            body: request.body.clone(),
        }
    }

    /// Execute `request` and return the raw response body.
    pub fn send(&self, request: GristRequest) -> Result<Vec<u8>> {
        let http = self.build_http_request(&request);
        tracing::debug!(
            method = %http.method,
            path = %request.path,
            filtered = http.query_value(FILTER_PARAM).is_some(),
            "dispatching grist request"
        );

        let response = self.transport.execute(http)?;
        tracing::debug!(
            status = response.status,
            bytes = response.body.len(),
            "grist response received"
        );

        check_status(response)
    }

    /// Encode `payload` as JSON and send it as the body of a `method` request.
    pub(crate) fn send_json<T>(
        &self,
        method: Method,
        path: String,
        payload: &T,
    ) -> Result<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload)?;
        self.send(GristRequest::new(method, path).body(body))
    }
}

/// Only status 200 counts as success; 201 and 204 are failures too.
fn check_status(response: HttpResponse) -> Result<Vec<u8>> {
    if response.status == 200 {
        return Ok(response.body);
    }
    Err(ApiError {
        status: response.status,
        details: response.text(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GristClient {
        GristClient::builder()
            .url("http://localhost:8484")
            .api_key("secret")
            .build()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn build_request_joins_url_and_sets_headers() {
        let req = client().build_http_request(&GristRequest::new(Method::Get, "/api/orgs"));
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url, "http://localhost:8484/api/orgs");
        assert_eq!(req.header("authorization"), Some("Bearer secret"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.query.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn empty_token_still_sends_bearer_header() {
        let client = GristClient::builder().url("http://localhost:8484").build();
        let req = client.build_http_request(&GristRequest::new(Method::Delete, "/api/docs/x"));
        assert_eq!(req.header("Authorization"), Some("Bearer "));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = GristClient::builder().url("http://localhost:8484/").build();
        let req = client.build_http_request(&GristRequest::new(Method::Get, "/api/orgs"));
        assert_eq!(req.url, "http://localhost:8484/api/orgs");
    }

    #[test]
    fn global_filter_applies_without_request_filter() {
        let mut client = client();
        client.set_global_filter(Filter::raw(r#"{"pet":["cat"]}"#));
        let req = client.build_http_request(&GristRequest::new(Method::Get, "/records"));
        assert_eq!(
            req.query,
            vec![("filter".to_string(), r#"{"pet":["cat"]}"#.to_string())]
        );
    }

    #[test]
    fn request_filter_replaces_global_filter() {
        let client = GristClient::builder()
            .url("http://localhost:8484")
            .global_filter(Filter::raw(r#"{"pet":["cat"]}"#))
            .build();
        let request =
            GristRequest::new(Method::Get, "/records").filter(Filter::raw(r#"{"id":[1]}"#));
        let req = client.build_http_request(&request);
        assert_eq!(
            req.query,
            vec![("filter".to_string(), r#"{"id":[1]}"#.to_string())]
        );
    }

    #[test]
    fn clear_global_filter_removes_query() {
        let mut client = client();
        client.set_global_filter(Filter::raw("{}"));
        client.clear_global_filter();
        let req = client.build_http_request(&GristRequest::new(Method::Get, "/records"));
        assert!(req.query.is_empty());
    }

    #[test]
    fn status_200_returns_body_unchanged() {
        let body = check_status(response(200, r#"{"records":[]}"#)).unwrap();
        assert_eq!(body, br#"{"records":[]}"#.to_vec());
    }

    #[test]
    fn other_success_codes_are_errors() {
        for status in [201, 204] {
            let err = check_status(response(status, "")).unwrap_err();
            assert!(matches!(err, Error::Api(ApiError { status: s, .. }) if s == status));
        }
    }

    #[test]
    fn error_keeps_body_verbatim() {
        let err = check_status(response(500, "boom\n")).unwrap_err();
        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 500);
                assert_eq!(api.details, "boom\n");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn from_lookup_requires_url() {
        let err = GristClient::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn from_lookup_reads_url_and_key() {
        let client = GristClient::from_lookup(|name| match name {
            URL_ENV => Some("https://docs.example.com/".to_string()),
            API_KEY_ENV => Some("k".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(client.base_url(), "https://docs.example.com");
        let req = client.build_http_request(&GristRequest::default());
        assert_eq!(req.header("authorization"), Some("Bearer k"));
    }
}
