//! Blocking API client core for the farming-assistant backend.
//!
//! # Overview
//! Views call endpoint functions on `FarmApi`; each builds one `HttpRequest`
//! and hands it to `ApiClient::send`, which runs the middleware chain around a
//! `Transport`. The session token store and the navigator are injected through
//! a `SessionContext` at construction.
//!
//! # Design
//! - Requests and responses are plain data (`http`), so every hook and every
//!   endpoint is testable with `ScriptedTransport` and no network.
//! - `BearerAuth` attaches the stored access token; `SessionExpiry` ends the
//!   session on any 401 and redirects to the login view. Neither retries.
//! - Errors pass through unchanged; the caller decides what to show.
//! - Everything runs on one thread: the store and navigator use `RefCell`
//!   and the client is intentionally `!Send`.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod middleware;
pub mod session;
pub mod transport;
pub mod types;

pub use api::FarmApi;
pub use client::{ApiClient, ClientConfig, DEFAULT_BASE_URL};
pub use error::{ApiError, SessionError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use middleware::{BearerAuth, Middleware, Navigator, RecordingNavigator, RequestLog, SessionContext, SessionExpiry};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, TokenPair};
pub use transport::{ScriptedTransport, Transport, UreqTransport};
