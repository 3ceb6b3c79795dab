//! Firebase Identity Toolkit client.
//!
//! Talks to the REST surface of Firebase Auth (`accounts:*` on the
//! Identity Toolkit host, `token` on the Secure Token host). Both base URLs
//! come from config so the local emulator can stand in.
//!
//! TRADE-OFFS
//! ==========
//! The credential lock is held across a token refresh. Concurrent callers
//! wait for the one refresh instead of racing to spend the same refresh token.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{IdentityError, IdentityProvider, Session};
use crate::config::{HttpTimeouts, IdentityConfig};

/// Tokens expiring within this window are refreshed before use.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

struct Credentials {
    id_token: String,
    refresh_token: String,
    expires_at: Instant,
}

impl Credentials {
    fn new(id_token: String, refresh_token: String, expires_in: &str) -> Self {
        let secs = expires_in.trim().parse::<u64>().unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        Self { id_token, refresh_token, expires_at: Instant::now() + Duration::from_secs(secs) }
    }

    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now() + REFRESH_MARGIN
    }
}

/// [`IdentityProvider`] backed by Firebase Auth.
pub struct FirebaseIdentity {
    http: reqwest::Client,
    api_key: String,
    auth_url: String,
    token_url: String,
    credentials: Mutex<Option<Credentials>>,
    session_tx: watch::Sender<Option<Session>>,
}

impl FirebaseIdentity {
    /// Build a signed-out provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &IdentityConfig, timeouts: HttpTimeouts) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| IdentityError::HttpClientBuild(e.to_string()))?;
        let (session_tx, _) = watch::channel(None);
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.trim_end_matches('/').to_string(),
            credentials: Mutex::new(None),
            session_tx,
        })
    }

    /// Sign in with email and password, replacing any current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let body = PasswordRequest { email, password, return_secure_token: true };
        let resp: AccountResponse = self.post_account("accounts:signInWithPassword", &body).await?;
        info!(uid = %resp.local_id, "identity sign-in succeeded");
        Ok(self.establish(resp).await)
    }

    /// Register a new email/password account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the email is already taken.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Session, IdentityError> {
        let body = PasswordRequest { email, password, return_secure_token: true };
        let mut resp: AccountResponse = self.post_account("accounts:signUp", &body).await?;

        if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
            let update = ProfileUpdateRequest { id_token: &resp.id_token, display_name: name, return_secure_token: true };
            let updated: ProfileUpdateResponse = self.post_account("accounts:update", &update).await?;
            resp.display_name = updated.display_name.or_else(|| Some(name.to_owned()));
            if let (Some(id_token), Some(refresh_token)) = (updated.id_token, updated.refresh_token) {
                resp.id_token = id_token;
                resp.refresh_token = refresh_token;
                resp.expires_in = updated.expires_in.unwrap_or(resp.expires_in);
            }
        }

        info!(uid = %resp.local_id, "identity sign-up succeeded");
        Ok(self.establish(resp).await)
    }

    async fn establish(&self, resp: AccountResponse) -> Session {
        let session = Session {
            uid: resp.local_id,
            display_name: resp.display_name.filter(|n| !n.is_empty()),
            email: resp.email,
            photo_url: resp.profile_picture.filter(|p| !p.is_empty()),
        };
        *self.credentials.lock().await = Some(Credentials::new(resp.id_token, resp.refresh_token, &resp.expires_in));
        self.session_tx.send_replace(Some(session.clone()));
        session
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Credentials, IdentityError> {
        let url = format!("{}/token", self.token_url);
        let form = [("grant_type", "refresh_token"), ("refresh_token", refresh_token)];
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .form(&form)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        let resp: RefreshResponse = decode_response(response).await?;
        debug!(uid = %resp.user_id, "identity token refreshed");
        Ok(Credentials::new(resp.id_token, resp.refresh_token, &resp.expires_in))
    }

    async fn post_account<B, T>(&self, method: &str, body: &B) -> Result<T, IdentityError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{method}", self.auth_url);
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        decode_response(response).await
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseIdentity {
    fn current_session(&self) -> Option<Session> {
        self.session_tx.borrow().clone()
    }

    async fn current_token(&self) -> Option<String> {
        let mut credentials = self.credentials.lock().await;
        let current = credentials.as_ref()?;
        if current.is_fresh() {
            return Some(current.id_token.clone());
        }

        let refresh_token = current.refresh_token.clone();
        match self.refresh(&refresh_token).await {
            Ok(fresh) => {
                let token = fresh.id_token.clone();
                *credentials = Some(fresh);
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "identity token refresh failed");
                None
            }
        }
    }

    async fn sign_out(&self) {
        *self.credentials.lock().await = None;
        let changed = self.session_tx.send_if_modified(|session| session.take().is_some());
        if changed {
            info!("identity signed out");
        }
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, IdentityError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| IdentityError::Request(e.to_string()))?;
    if !(200..300).contains(&status) {
        return Err(IdentityError::Rejected { status, code: error_code(&text) });
    }
    serde_json::from_str(&text).map_err(|e| IdentityError::Parse(e.to_string()))
}

/// Pull the `error.message` code (e.g. `EMAIL_NOT_FOUND`) out of an error body.
fn error_code(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.message)
        .unwrap_or_else(|| "UNKNOWN".to_owned())
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    profile_picture: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdateResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: String,
    #[serde(default)]
    user_id: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

fn default_expires_in() -> String {
    DEFAULT_EXPIRES_IN_SECS.to_string()
}

#[cfg(test)]
#[path = "firebase_test.rs"]
mod tests;
