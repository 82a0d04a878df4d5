//! Request/response hooks run by `ApiClient` around every call.
//!
//! # Design
//! The chain is an ordered list of `Middleware` values. `before` hooks run in
//! registration order on the outgoing request; `after` hooks run in reverse
//! order on the outcome, which they may observe but not replace. Shared state
//! (the session store and the navigator) is handed to every hook through an
//! explicit `SessionContext` rather than reached for globally.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::SessionStore;

/// Route of the login view that session expiry sends the user to.
pub const LOGIN_ROUTE: &str = "/login";

/// Moves the user to another view.
pub trait Navigator {
    fn redirect(&self, target: &str);
}

/// Navigator that only remembers where it was asked to go.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: RefCell<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.borrow().clone()
    }

    pub fn current(&self) -> Option<String> {
        self.redirects.borrow().last().cloned()
    }

    /// Drain recorded redirects, so a view loop can act on each one once.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.redirects.borrow_mut())
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, target: &str) {
        self.redirects.borrow_mut().push(target.to_string());
    }
}

/// Shared state injected into the client at construction.
#[derive(Clone)]
pub struct SessionContext {
    pub store: Rc<dyn SessionStore>,
    pub navigator: Rc<dyn Navigator>,
}

impl SessionContext {
    pub fn new(store: Rc<dyn SessionStore>, navigator: Rc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    /// Drop both tokens, then send the user to `route`.
    pub fn end_session(&self, route: &str) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear stored session");
        }
        self.navigator.redirect(route);
    }
}

pub trait Middleware {
    fn name(&self) -> &'static str;

    fn before(&self, _request: &mut HttpRequest, _ctx: &SessionContext) {}

    fn after(&self, _request: &HttpRequest, _outcome: &Result<HttpResponse, ApiError>, _ctx: &SessionContext) {}
}

/// Attaches `Authorization: Bearer <access token>` when a session exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct BearerAuth;

impl Middleware for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn before(&self, request: &mut HttpRequest, ctx: &SessionContext) {
        if let Some(token) = ctx.store.access_token() {
            request.set_header("Authorization", format!("Bearer {token}"));
        }
    }
}

/// Ends the session on any 401: clears both tokens, then redirects to login.
#[derive(Debug, Clone)]
pub struct SessionExpiry {
    login_route: String,
}

impl SessionExpiry {
    pub fn new(login_route: impl Into<String>) -> Self {
        Self {
            login_route: login_route.into(),
        }
    }
}

impl Default for SessionExpiry {
    fn default() -> Self {
        Self::new(LOGIN_ROUTE)
    }
}

impl Middleware for SessionExpiry {
    fn name(&self) -> &'static str {
        "session-expiry"
    }

    fn after(&self, request: &HttpRequest, outcome: &Result<HttpResponse, ApiError>, ctx: &SessionContext) {
        if let Err(err) = outcome {
            if err.is_unauthorized() {
                info!(target_path = %request.path, "session rejected by server, signing out");
                ctx.end_session(&self.login_route);
            }
        }
    }
}

/// Emits a tracing event per request and per outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLog;

impl Middleware for RequestLog {
    fn name(&self) -> &'static str {
        "request-log"
    }

    fn before(&self, request: &mut HttpRequest, _ctx: &SessionContext) {
        debug!(method = %request.method, path = %request.target(), "sending request");
    }

    fn after(&self, request: &HttpRequest, outcome: &Result<HttpResponse, ApiError>, _ctx: &SessionContext) {
        match outcome {
            Ok(resp) => debug!(method = %request.method, path = %request.target(), status = resp.status, "request completed"),
            Err(e) => warn!(method = %request.method, path = %request.target(), error = %e, "request failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, TokenPair};

    fn context(tokens: Option<TokenPair>) -> (SessionContext, Rc<MemorySessionStore>, Rc<RecordingNavigator>) {
        let store = Rc::new(match tokens {
            Some(t) => MemorySessionStore::with_tokens(t),
            None => MemorySessionStore::new(),
        });
        let navigator = Rc::new(RecordingNavigator::new());
        let ctx = SessionContext::new(store.clone(), navigator.clone());
        (ctx, store, navigator)
    }

    #[test]
    fn bearer_auth_attaches_token() {
        let (ctx, _, _) = context(Some(TokenPair::new("abc", "def")));
        let mut req = HttpRequest::get("/crops/");
        BearerAuth.before(&mut req, &ctx);
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
    }

    #[test]
    fn bearer_auth_leaves_anonymous_request_alone() {
        let (ctx, _, _) = context(None);
        let mut req = HttpRequest::get("/crops/");
        let before = req.clone();
        BearerAuth.before(&mut req, &ctx);
        assert_eq!(req, before);
    }

    #[test]
    fn session_expiry_clears_and_redirects_on_401() {
        let (ctx, store, navigator) = context(Some(TokenPair::new("abc", "def")));
        let outcome = Err(ApiError::Status {
            status: 401,
            body: String::new(),
        });
        SessionExpiry::default().after(&HttpRequest::get("/profile/"), &outcome, &ctx);

        assert!(store.tokens().is_none());
        assert_eq!(navigator.redirects(), vec!["/login".to_string()]);
    }

    #[test]
    fn session_expiry_ignores_other_failures() {
        let (ctx, store, navigator) = context(Some(TokenPair::new("abc", "def")));
        for outcome in [
            Err(ApiError::Status {
                status: 403,
                body: String::new(),
            }),
            Err(ApiError::Transport("connection refused".into())),
            Ok(HttpResponse::new(200, "[]")),
        ] {
            SessionExpiry::default().after(&HttpRequest::get("/crops/"), &outcome, &ctx);
        }

        assert_eq!(store.access_token().as_deref(), Some("abc"));
        assert!(navigator.redirects().is_empty());
    }

    #[test]
    fn session_expiry_uses_configured_route() {
        let (ctx, _, navigator) = context(Some(TokenPair::new("abc", "def")));
        let outcome = Err(ApiError::Status {
            status: 401,
            body: String::new(),
        });
        SessionExpiry::new("/signin").after(&HttpRequest::get("/"), &outcome, &ctx);
        assert_eq!(navigator.current().as_deref(), Some("/signin"));
    }

    #[test]
    fn recording_navigator_take_drains() {
        let navigator = RecordingNavigator::new();
        navigator.redirect("/login");
        assert_eq!(navigator.take(), vec!["/login".to_string()]);
        assert!(navigator.redirects().is_empty());
    }
}
