//! Session/token provider over the external identity backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! The auth context and the REST wrappers never talk to the identity
//! backend directly; they go through [`IdentityProvider`]. Sign-in and
//! sign-out are announced on a `watch` channel so dependents subscribe
//! instead of polling.
//!
//! ERROR HANDLING
//! ==============
//! Token access degrades to `None` on any failure. Callers read `None` as
//! "no auth available", never as a hard error.

pub mod firebase;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub use firebase::FirebaseIdentity;

/// A signed-in identity as reported by the identity backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identity uid; also the key of the backend user record.
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// Errors produced by explicit identity operations (sign-in, sign-up).
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The HTTP request to the identity backend failed.
    #[error("identity request failed: {0}")]
    Request(String),

    /// The identity backend refused the operation (e.g. `INVALID_PASSWORD`).
    #[error("identity backend rejected request: {code}")]
    Rejected { status: u16, code: String },

    /// The identity backend response body could not be deserialized.
    #[error("identity response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Abstraction over the identity backend.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in session, or `None` when no one is signed in.
    fn current_session(&self) -> Option<Session>;

    /// A fresh bearer token for the current session.
    ///
    /// Returns `None` when signed out or when the backend is unreachable.
    async fn current_token(&self) -> Option<String>;

    /// Drop the current session and notify subscribers.
    async fn sign_out(&self);

    /// Receiver that observes every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}
