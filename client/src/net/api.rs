//! REST API helpers for the backend user endpoints.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `Result<_, ApiError>`. The auth context decides what a
//! failure means (it forces a sign-out); nothing here panics or retries.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::types::{CreateUserPayload, UserRecord, VerifyTokenResponse};
use crate::config::HttpTimeouts;
use crate::identity::IdentityProvider;

/// Errors produced by backend REST calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request failed before a response arrived.
    #[error("API request failed: {0}")]
    Request(String),

    /// The backend returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Backend calls the auth context depends on.
#[async_trait::async_trait]
pub trait UserBackend: Send + Sync {
    /// Look up the user record for an identity uid. `Ok(None)` when absent.
    async fn check_user_exists(&self, id: &str) -> Result<Option<UserRecord>, ApiError>;

    /// Persist a new user record.
    async fn create_user(&self, payload: &CreateUserPayload) -> Result<UserRecord, ApiError>;

    /// Ask the backend whether a bearer token is still accepted.
    async fn verify_token(&self, token: &str) -> Result<bool, ApiError>;
}

fn user_endpoint(base_url: &str, user_id: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(base_url).map_err(|e| ApiError::Request(format!("invalid base URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::Request(format!("base URL cannot carry a path: {base_url}")))?
        .pop_if_empty()
        .push("users")
        .push(user_id);
    Ok(url)
}

fn users_endpoint(base_url: &str) -> String {
    format!("{base_url}/users")
}

fn verify_token_endpoint(base_url: &str) -> String {
    format!("{base_url}/auth/verify-token")
}

/// [`UserBackend`] over HTTP, authenticating with the current identity token.
pub struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    identity: Arc<dyn IdentityProvider>,
}

impl RestBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(
        base_url: &str,
        identity: Arc<dyn IdentityProvider>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), identity })
    }

    async fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.identity.current_token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<(u16, String), ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok((status, text))
    }

    async fn post_json<B, T>(&self, url: String, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.authorized(self.http.post(url).json(body)).await;
        let (status, text) = self.send(builder).await?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Status { status, body: text });
        }
        parse_body(&text)
    }
}

#[async_trait::async_trait]
impl UserBackend for RestBackend {
    async fn check_user_exists(&self, id: &str) -> Result<Option<UserRecord>, ApiError> {
        let builder = self.authorized(self.http.get(user_endpoint(&self.base_url, id)?)).await;
        let (status, text) = self.send(builder).await?;
        match status {
            404 => {
                debug!(uid = %id, "user record not found");
                Ok(None)
            }
            200..=299 => parse_body(&text).map(Some),
            _ => Err(ApiError::Status { status, body: text }),
        }
    }

    async fn create_user(&self, payload: &CreateUserPayload) -> Result<UserRecord, ApiError> {
        let record: UserRecord = self.post_json(users_endpoint(&self.base_url), payload).await?;
        debug!(uid = %record.id, role = %record.user_type, "user record created");
        Ok(record)
    }

    async fn verify_token(&self, token: &str) -> Result<bool, ApiError> {
        let builder = self
            .http
            .post(verify_token_endpoint(&self.base_url))
            .bearer_auth(token)
            .json(&serde_json::json!({ "token": token }));
        let (status, text) = self.send(builder).await?;
        match status {
            401 | 403 => Ok(false),
            200..=299 => parse_body::<VerifyTokenResponse>(&text).map(|r| r.valid),
            _ => Err(ApiError::Status { status, body: text }),
        }
    }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}
