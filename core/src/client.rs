//! HTTP client wrapper for the farm API.
//!
//! # Design
//! `ApiClient` owns a fixed base URL, a set of default headers, the transport,
//! and the middleware chain. Every call goes through `send`:
//!
//! 1. default headers are applied (a request may already override them),
//! 2. `before` hooks run in order,
//! 3. the transport executes the request,
//! 4. non-2xx responses become `ApiError::Status`,
//! 5. `after` hooks run in reverse order,
//! 6. the outcome is returned to the caller untouched.
//!
//! There is no retry at this layer. The default chain is
//! `[RequestLog, BearerAuth, SessionExpiry]`.

use std::rc::Rc;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::middleware::{BearerAuth, Middleware, RequestLog, SessionContext, SessionExpiry, LOGIN_ROUTE};
use crate::session::SessionStore;
use crate::transport::{Transport, UreqTransport};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable that overrides the base URL.
pub const BASE_URL_ENV: &str = "FARM_API_URL";

/// Construction-time settings. Fixed for the lifetime of the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub login_route: String,
    pub timeout: Duration,
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_route: LOGIN_ROUTE.to_string(),
            timeout: Duration::from_secs(30),
            default_headers: vec![("content-type".to_string(), "application/json".to_string())],
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Defaults, with the base URL taken from `FARM_API_URL` when set.
    pub fn from_env() -> Self {
        Self::with_base_url_override(std::env::var(BASE_URL_ENV).ok().as_deref())
    }

    /// `url` when it is present and not blank, otherwise the default base URL.
    pub fn with_base_url_override(url: Option<&str>) -> Self {
        match url.map(str::trim) {
            Some(url) if !url.is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }
}

pub struct ApiClient {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    context: SessionContext,
    middleware: Vec<Box<dyn Middleware>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, transport: impl Transport + 'static, context: SessionContext) -> Self {
        let middleware: Vec<Box<dyn Middleware>> = vec![
            Box::new(RequestLog),
            Box::new(BearerAuth),
            Box::new(SessionExpiry::new(config.login_route.clone())),
        ];
        Self {
            config,
            transport: Box::new(transport),
            context,
            middleware,
        }
    }

    /// Client that talks to the network through `ureq`.
    pub fn connect(config: ClientConfig, context: SessionContext) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::new(config, transport, context)
    }

    /// Append a hook after the default chain.
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn session(&self) -> &Rc<dyn SessionStore> {
        &self.context.store
    }

    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    pub fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        for (name, value) in &self.config.default_headers {
            if request.header(name).is_none() {
                request.headers.push((name.clone(), value.clone()));
            }
        }

        for m in &self.middleware {
            m.before(&mut request, &self.context);
        }

        let outcome = self
            .transport
            .execute(&request, &self.config.base_url)
            .and_then(check_status);

        for m in self.middleware.iter().rev() {
            m.after(&request, &outcome, &self.context);
        }

        outcome
    }
}

/// Map non-2xx status codes to `ApiError::Status`, keeping the body.
fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(ApiError::Status {
        status: response.status,
        body: response.body,
    })
}
