//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by the route guard and user-aware views to coordinate login prompts
//! and identity-dependent rendering.
//!
//! DESIGN
//! ======
//! [`AuthContext`] is the only writer of [`AuthState`]. Every session change
//! runs one resolution: look up the backend user record (provisioning it on
//! first sign-in), then verify the session token server-side. Resolutions
//! carry a generation number; a result is committed only if no newer
//! resolution started in the meantime.
//!
//! ERROR HANDLING
//! ==============
//! Failures never reach callers. Any lookup, provisioning, or verification
//! failure forces a sign-out and leaves `user = None, loading = false`.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::identity::{IdentityProvider, Session};
use crate::net::api::{ApiError, UserBackend};
use crate::net::types::{CreateUserPayload, UserRecord, UserRole};

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthState {
    pub user: Option<UserRecord>,
    pub loading: bool,
}

impl Default for AuthState {
    /// Nothing resolved yet: no user, still loading.
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|u| u.user_type)
    }

    #[must_use]
    pub fn is_instructor(&self) -> bool {
        self.role() == Some(UserRole::Instructor)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Some(UserRole::Admin)
    }
}

/// How a single session-change resolution ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// No session; state cleared.
    SignedOut,
    /// Session resolved to a verified user record.
    Authenticated(UserRecord),
    /// Resolution failed and the session was signed out.
    ForcedSignOut,
    /// A newer resolution started first; this result was dropped.
    Superseded,
}

#[derive(Debug, thiserror::Error)]
enum ResolveError {
    #[error("user lookup failed: {0}")]
    Lookup(ApiError),
    #[error("user provisioning failed: {0}")]
    Provision(ApiError),
    #[error("no token available for session")]
    TokenUnavailable,
    #[error("token rejected by backend")]
    TokenRejected,
    #[error("token verification failed: {0}")]
    Verify(ApiError),
}

/// Process-wide auth state container.
pub struct AuthContext {
    identity: Arc<dyn IdentityProvider>,
    backend: Arc<dyn UserBackend>,
    state_tx: watch::Sender<AuthState>,
    generation: AtomicU64,
    /// Records created during the current session, keyed by uid.
    provisioned: Mutex<HashMap<String, UserRecord>>,
}

impl AuthContext {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, backend: Arc<dyn UserBackend>) -> Arc<Self> {
        let (state_tx, _) = watch::channel(AuthState::default());
        Arc::new(Self {
            identity,
            backend,
            state_tx,
            generation: AtomicU64::new(0),
            provisioned: Mutex::new(HashMap::new()),
        })
    }

    /// Receiver for state updates.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    /// Wait until the current resolution (if any) has finished.
    pub async fn resolved(&self) -> AuthState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Spawn [`AuthContext::run`] on the current runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run())
    }

    /// Resolve identity notifications one at a time until the provider goes away.
    pub async fn run(self: Arc<Self>) {
        let mut sessions = self.identity.subscribe();
        loop {
            let session = sessions.borrow_and_update().clone();
            self.handle_session_change(session).await;
            if sessions.changed().await.is_err() {
                debug!("identity provider closed; auth context stopping");
                break;
            }
        }
    }

    /// User-initiated sign-out.
    pub async fn sign_out(&self) {
        self.identity.sign_out().await;
        self.handle_session_change(None).await;
    }

    /// Run one resolution for a session change.
    pub async fn handle_session_change(&self, session: Option<Session>) -> Resolution {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(session) = session else {
            self.provisioned.lock().await.clear();
            return if self.commit(generation, None) { Resolution::SignedOut } else { Resolution::Superseded };
        };

        self.mark_loading(generation, &session.uid);

        match self.resolve(&session).await {
            Ok(user) => {
                if self.commit(generation, Some(user.clone())) {
                    info!(uid = %user.id, role = %user.user_type, "auth resolved");
                    Resolution::Authenticated(user)
                } else {
                    Resolution::Superseded
                }
            }
            Err(e) => {
                if !self.is_current(generation) {
                    debug!(uid = %session.uid, error = %e, "stale auth resolution failed; ignoring");
                    return Resolution::Superseded;
                }
                warn!(uid = %session.uid, error = %e, "auth resolution failed; forcing sign-out");
                self.provisioned.lock().await.clear();
                self.identity.sign_out().await;
                self.commit(generation, None);
                Resolution::ForcedSignOut
            }
        }
    }

    async fn resolve(&self, session: &Session) -> Result<UserRecord, ResolveError> {
        let user = self.lookup_or_provision(session).await?;

        let token = self.identity.current_token().await.ok_or(ResolveError::TokenUnavailable)?;
        if !self.backend.verify_token(&token).await.map_err(ResolveError::Verify)? {
            return Err(ResolveError::TokenRejected);
        }
        Ok(user)
    }

    async fn lookup_or_provision(&self, session: &Session) -> Result<UserRecord, ResolveError> {
        if let Some(found) = self
            .backend
            .check_user_exists(&session.uid)
            .await
            .map_err(ResolveError::Lookup)?
        {
            return Ok(found);
        }

        // Held across the create so overlapping resolutions provision once.
        let mut provisioned = self.provisioned.lock().await;
        if let Some(created) = provisioned.get(&session.uid) {
            debug!(uid = %session.uid, "reusing record provisioned this session");
            return Ok(created.clone());
        }

        let payload = CreateUserPayload::from_session(session);
        let created = self.backend.create_user(&payload).await.map_err(ResolveError::Provision)?;
        info!(uid = %created.id, "provisioned user record on first sign-in");
        provisioned.insert(session.uid.clone(), created.clone());
        Ok(created)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Flag a resolution in flight; drop a user that belongs to another uid.
    fn mark_loading(&self, generation: u64, uid: &str) {
        self.state_tx.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            let before = state.clone();
            if state.user.as_ref().is_some_and(|u| u.id != uid) {
                state.user = None;
            }
            state.loading = true;
            *state != before
        });
    }

    /// Publish a finished resolution unless a newer one has started.
    fn commit(&self, generation: u64, user: Option<UserRecord>) -> bool {
        // Checked under the channel's write lock so a newer commit cannot interleave.
        let committed = self.state_tx.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            *state = AuthState { user, loading: false };
            true
        });
        if !committed {
            debug!(generation, "discarding stale auth resolution");
        }
        committed
    }
}
