//! Executes `HttpRequest` values.
//!
//! # Design
//! The client never performs I/O itself; it hands each finished request to a
//! `Transport`. A transport reports every response it receives as data, 4xx
//! and 5xx included, and only fails when no response arrived at all. Status
//! interpretation belongs to the client.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: &HttpRequest, base_url: &str) -> Result<HttpResponse, ApiError>;
}

/// Blocking network transport built on `ureq`.
///
/// Status-code-as-error is disabled so 4xx/5xx responses come back as data.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest, base_url: &str) -> Result<HttpResponse, ApiError> {
        let url = request.url(base_url);
        let headers = &request.headers;

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(&url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(&url), headers).call(),
            (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(&url), headers).send(body.as_bytes()),
            (HttpMethod::Post, None) => with_headers(self.agent.post(&url), headers).send_empty(),
            (HttpMethod::Patch, Some(body)) => with_headers(self.agent.patch(&url), headers).send(body.as_bytes()),
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(&url), headers).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// Offline transport that replays queued responses and records every request.
///
/// When the queue runs dry it answers `404` with an empty body.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<HttpResponse, String>>>,
    sent: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, status: u16, body: impl Into<String>) -> &Self {
        self.replies.borrow_mut().push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a transport-level failure (no response at all).
    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.replies.borrow_mut().push_back(Err(message.into()));
        self
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.borrow().clone()
    }

    pub fn last_sent(&self) -> Option<HttpRequest> {
        self.sent.borrow().last().cloned()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest, _base_url: &str) -> Result<HttpResponse, ApiError> {
        self.sent.borrow_mut().push(request.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(resp)) => Ok(resp),
            Some(Err(message)) => Err(ApiError::Transport(message)),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}

// Lets a caller keep a handle on a transport it gave to the client.
impl<T: Transport + ?Sized> Transport for std::rc::Rc<T> {
    fn execute(&self, request: &HttpRequest, base_url: &str) -> Result<HttpResponse, ApiError> {
        (**self).execute(request, base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_transport_replays_in_order() {
        let transport = ScriptedTransport::new();
        transport.reply(200, "first").fail("refused");

        let req = HttpRequest::get("/crops/");
        assert_eq!(transport.execute(&req, "http://x").unwrap().body, "first");
        assert!(matches!(transport.execute(&req, "http://x"), Err(ApiError::Transport(_))));
        assert_eq!(transport.execute(&req, "http://x").unwrap().status, 404);
        assert_eq!(transport.sent().len(), 3);
    }
}
