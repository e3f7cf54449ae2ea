//! Transports execute a resolved `HttpRequest`.
//!
//! # Design
//! `Transport` is the only I/O seam of the client. It must return every
//! completed HTTP exchange as an `HttpResponse`, whatever the status code;
//! interpreting the status is the dispatcher's job. Only failures that
//! prevent an exchange (DNS, connect, TLS, I/O) are errors.

use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse, Method};

/// Executes HTTP requests on behalf of a `GristClient`.
///
/// The handle is shared by every clone of a client, so implementations must
/// be safe for concurrent reuse.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Blocking transport backed by a pooled `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap a caller-configured agent, e.g. one with timeouts or a proxy.
    ///
    /// Status handling is overridden per request, so 4xx/5xx responses keep
    /// their bodies whatever the agent was built with.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply headers and query pairs to a ureq request builder, and make sure
/// every status comes back as a response rather than an error.
fn prepare<B>(
    builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
) -> ureq::RequestBuilder<B> {
    let mut builder = builder.config().http_status_as_error(false).build();
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (name, value) in &request.query {
        builder = builder.query(name, value);
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let result = match request.method {
            Method::Get => prepare(self.agent.get(url), &request).call(),
            Method::Delete => prepare(self.agent.delete(url), &request).call(),
            Method::Post => {
                let builder = prepare(self.agent.post(url), &request);
                match request.body.as_deref() {
                    Some(body) => builder.send(body),
                    None => builder.send_empty(),
                }
            }
            Method::Patch => {
                let builder = prepare(self.agent.patch(url), &request);
                match request.body.as_deref() {
                    Some(body) => builder.send(body),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(Error::transport)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // ureq caps bodies at 10 MiB by default; record pages can be larger.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(Error::transport)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
