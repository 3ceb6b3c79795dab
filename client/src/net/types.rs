//! Wire DTOs for the client/backend boundary.
//!
//! DESIGN
//! ======
//! The role field arrives as a string; it is decoded into the closed
//! [`UserRole`] set here so nothing past this module handles raw role text.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

use crate::identity::Session;

/// Display name used when a session carries neither a name nor an email.
pub const FALLBACK_DISPLAY_NAME: &str = "Swimmer";

/// Application role of a user record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Instructor,
    Admin,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable user profile stored by the backend, keyed by the identity uid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Identity uid shared with the session.
    pub id: String,
    pub email: String,
    pub name: String,
    /// Profile picture URL, if any.
    #[serde(default)]
    pub profile_image: Option<String>,
    pub user_type: UserRole,
    /// Free-form bio shown on instructor pages.
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /users` when provisioning a first-time sign-in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateUserPayload {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub user_type: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateUserPayload {
    /// Build a provisional record from session attributes with the default role.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let email = session.email.clone().unwrap_or_default();
        let name = session
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .or_else(|| email.split('@').next().filter(|local| !local.is_empty()).map(str::to_owned))
            .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_owned());
        Self {
            id: session.uid.clone(),
            email,
            name,
            profile_image: session.photo_url.clone(),
            user_type: UserRole::User,
            description: None,
        }
    }
}

/// Response of `POST /auth/verify-token`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
}
