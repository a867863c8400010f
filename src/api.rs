//! HTTP collaborator for the SprintSync API.
//!
//! Every response is wrapped in an `{statusCode, message, data}` envelope; a
//! non-success `statusCode` is an application-level error even on HTTP 200.
//! The client injects the static `x-api-key` header and the bearer token on
//! every request, and tears the session down on any 401.

use std::sync::{Arc, RwLock};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::SessionStore;

/// Response envelope used by every SprintSync endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub status_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

/// Application-level success is any 2xx `statusCode`, regardless of the HTTP
/// status the envelope rode in on.
pub fn is_success(status_code: &str) -> bool {
    status_code.trim().starts_with('2')
}

/// HTTP client for the SprintSync API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    token: Arc<RwLock<Option<String>>>,
    session: Option<SessionStore>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            token: Arc::new(RwLock::new(None)),
            session: None,
        }
    }

    /// Client bound to a session store: the stored access token is adopted
    /// immediately and the store is cleared when the server answers 401.
    pub fn with_session(config: &Config, store: SessionStore) -> Self {
        let mut client = Self::new(config);
        if let Some(session) = store.load() {
            client.set_token(session.access_token);
        }
        client.session = Some(store);
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    // =========================================================================
    // Typed endpoint helpers
    // =========================================================================

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let mut builder = self.request(Method::GET, path);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        self.execute(builder).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.request(Method::POST, path).json(body)).await
    }

    /// POST with a body where only the acknowledgement matters.
    pub async fn post_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.execute_ack(self.request(Method::POST, path).json(body)).await
    }

    /// Body-less POST (logout and friends).
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        self.execute_ack(self.request(Method::POST, path)).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn patch_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.execute_ack(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn delete_ack(&self, path: &str) -> Result<()> {
        self.execute_ack(self.request(Method::DELETE, path)).await
    }

    /// POST returning the raw response for incremental consumption. The
    /// status is checked here; decoding the body is the caller's concern.
    pub async fn post_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(self.teardown_session());
        }
        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }
        Ok(response)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T> {
        let envelope = self.fetch_envelope::<T>(builder).await?;
        envelope.data.ok_or_else(|| Error::Api {
            status_code: envelope.status_code,
            message: "response envelope is missing data".to_string(),
        })
    }

    async fn execute_ack(&self, builder: reqwest::RequestBuilder) -> Result<()> {
        self.fetch_envelope::<serde_json::Value>(builder).await?;
        Ok(())
    }

    async fn fetch_envelope<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Envelope<T>> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(self.teardown_session());
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status_code: status.as_u16().to_string(),
                message: envelope_message(&body).unwrap_or_else(|| truncate(&body)),
            });
        }

        if body.trim().is_empty() {
            // Ack-style endpoints may answer 204 with no envelope at all.
            return Ok(Envelope {
                status_code: status.as_u16().to_string(),
                message: String::new(),
                data: None,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        if !is_success(&envelope.status_code) {
            return Err(Error::Api {
                status_code: envelope.status_code.clone(),
                message: envelope.message.clone(),
            });
        }
        Ok(envelope)
    }

    /// 401 anywhere invalidates the whole session: drop the in-memory token
    /// and the persisted one, then report the auth failure.
    fn teardown_session(&self) -> Error {
        self.clear_token();
        if let Some(store) = &self.session {
            if let Err(err) = store.clear() {
                tracing::warn!(%err, "failed to clear persisted session after 401");
            }
        }
        Error::AuthRequired("session expired or rejected by the server".to_string())
    }

    async fn status_error(&self, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::Api {
            status_code: status.as_u16().to_string(),
            message: envelope_message(&body).unwrap_or_else(|| truncate(&body)),
        }
    }
}

/// Pull the server's message out of an error-bearing envelope body.
fn envelope_message(body: &str) -> Option<String> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(body).ok()?;
    if envelope.message.is_empty() {
        None
    } else {
        Some(envelope.message)
    }
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    let mut end = LIMIT.min(trimmed.len());
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
