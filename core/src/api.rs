//! Endpoint catalog for the farm backend.
//!
//! Each method maps its parameters to exactly one `ApiClient::send` call and
//! returns the outcome unchanged: no retries, no caching, no error
//! translation. Callers interpret the `HttpResponse` (usually via
//! `HttpResponse::json`) and decide what to show on failure.

use serde::Serialize;
use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::TokenPair;
use crate::types::ChatMessage;

pub struct FarmApi {
    client: ApiClient,
}

impl FarmApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // -- auth ---------------------------------------------------------------

    pub fn login<B: Serialize + ?Sized>(&self, credentials: &B) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::post("/auth/login/").with_json(credentials)?)
    }

    pub fn register<B: Serialize + ?Sized>(&self, account: &B) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::post("/auth/register/").with_json(account)?)
    }

    /// Exchange a refresh token for a new access token. Never called implicitly.
    pub fn refresh(&self, refresh_token: &str) -> Result<HttpResponse, ApiError> {
        let body = serde_json::json!({ "refresh": refresh_token });
        self.client.send(HttpRequest::post("/auth/refresh/").with_json(&body)?)
    }

    pub fn current_user(&self) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::get("/auth/user/"))
    }

    // -- profile ------------------------------------------------------------

    pub fn profile(&self) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::get("/profile/"))
    }

    pub fn update_profile<B: Serialize + ?Sized>(&self, data: &B) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::patch("/profile/").with_json(data)?)
    }

    // -- crops --------------------------------------------------------------

    pub fn crops(&self) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::get("/crops/"))
    }

    pub fn create_crop<B: Serialize + ?Sized>(&self, data: &B) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::post("/crops/").with_json(data)?)
    }

    pub fn update_crop<B: Serialize + ?Sized>(&self, id: i64, data: &B) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::patch(format!("/crops/{id}/")).with_json(data)?)
    }

    pub fn delete_crop(&self, id: i64) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::delete(format!("/crops/{id}/")))
    }

    // -- reference data -----------------------------------------------------

    pub fn weather(&self, location: &str) -> Result<HttpResponse, ApiError> {
        self.client.send(HttpRequest::get("/weather/").with_query("location", location))
    }

    /// `None` or an empty name asks for every crop.
    pub fn crop_suggestions(&self, crop: Option<&str>) -> Result<HttpResponse, ApiError> {
        let request = match crop.filter(|c| !c.is_empty()) {
            Some(crop) => HttpRequest::get("/suggestions/").with_query("crop", crop),
            None => HttpRequest::get("/suggestions/"),
        };
        self.client.send(request)
    }

    pub fn send_chat_message(&self, message: &str) -> Result<HttpResponse, ApiError> {
        let body = ChatMessage {
            message: message.to_string(),
        };
        self.client.send(HttpRequest::post("/chatbot/").with_json(&body)?)
    }

    // -- session lifecycle --------------------------------------------------

    /// Log in and store the issued token pair.
    pub fn sign_in<B: Serialize + ?Sized>(&self, credentials: &B) -> Result<TokenPair, ApiError> {
        let tokens: TokenPair = self.login(credentials)?.json()?;
        self.client.session().set(tokens.clone())?;
        info!("signed in");
        Ok(tokens)
    }

    /// Register and store the token pair issued for the new account.
    pub fn sign_up<B: Serialize + ?Sized>(&self, account: &B) -> Result<TokenPair, ApiError> {
        let tokens: TokenPair = self.register(account)?.json()?;
        self.client.session().set(tokens.clone())?;
        info!("registered and signed in");
        Ok(tokens)
    }

    /// Drop the stored session and return to the login view.
    pub fn logout(&self) {
        self.client.context().end_session(&self.client.config().login_route);
        info!("signed out");
    }
}
