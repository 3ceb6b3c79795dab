//! Shared fakes for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::{Notify, watch};

use crate::identity::{IdentityProvider, Session};
use crate::net::api::{ApiError, UserBackend};
use crate::net::types::{CreateUserPayload, UserRecord, UserRole};

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn spawn_http(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server failed");
    });
    format!("http://{addr}")
}

pub fn session(uid: &str) -> Session {
    Session {
        uid: uid.to_owned(),
        display_name: Some(format!("Swimmer {uid}")),
        email: Some(format!("{uid}@pool.test")),
        photo_url: None,
    }
}

pub fn record(uid: &str, role: UserRole) -> UserRecord {
    UserRecord {
        id: uid.to_owned(),
        email: format!("{uid}@pool.test"),
        name: format!("Swimmer {uid}"),
        profile_image: None,
        user_type: role,
        description: None,
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// In-memory identity provider with a settable token.
pub struct MockIdentity {
    tx: watch::Sender<Option<Session>>,
    token: Mutex<Option<String>>,
    pub sign_outs: Mutex<usize>,
}

impl MockIdentity {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx, token: Mutex::new(None), sign_outs: Mutex::new(0) }
    }

    pub fn sign_in(&self, session: Session, token: Option<&str>) {
        *self.token.lock().expect("token mutex") = token.map(str::to_owned);
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out_count(&self) -> usize {
        *self.sign_outs.lock().expect("sign-out mutex")
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockIdentity {
    fn current_session(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    async fn current_token(&self) -> Option<String> {
        self.current_session()?;
        self.token.lock().expect("token mutex").clone()
    }

    async fn sign_out(&self) {
        *self.sign_outs.lock().expect("sign-out mutex") += 1;
        *self.token.lock().expect("token mutex") = None;
        self.tx.send_if_modified(|s| s.take().is_some());
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// Scriptable backend that records every call.
#[derive(Default)]
pub struct MockBackend {
    pub users: Mutex<HashMap<String, UserRecord>>,
    /// When set, lookups always miss even after a create (lagging read replica).
    pub lookups_always_miss: Mutex<bool>,
    pub fail_lookup: Mutex<bool>,
    pub fail_create: Mutex<bool>,
    pub fail_verify: Mutex<bool>,
    pub valid_tokens: Mutex<Vec<String>>,
    pub lookup_calls: Mutex<Vec<String>>,
    pub create_calls: Mutex<Vec<CreateUserPayload>>,
    pub verify_calls: Mutex<Vec<String>>,
    /// Per-uid gates, used to force overlapping resolutions; a lookup for
    /// the uid blocks until the gate is notified.
    pub lookup_gates: Mutex<HashMap<String, std::sync::Arc<Notify>>>,
}

impl MockBackend {
    pub fn with_user(self, user: UserRecord) -> Self {
        self.users.lock().expect("users mutex").insert(user.id.clone(), user);
        self
    }

    pub fn with_valid_token(self, token: &str) -> Self {
        self.valid_tokens.lock().expect("tokens mutex").push(token.to_owned());
        self
    }

    pub fn set(flag: &Mutex<bool>, value: bool) {
        *flag.lock().expect("flag mutex") = value;
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.lock().expect("create mutex").len()
    }
}

#[async_trait::async_trait]
impl UserBackend for MockBackend {
    async fn check_user_exists(&self, id: &str) -> Result<Option<UserRecord>, ApiError> {
        self.lookup_calls.lock().expect("lookup mutex").push(id.to_owned());
        let gate = self.lookup_gates.lock().expect("gate mutex").get(id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if *self.fail_lookup.lock().expect("flag mutex") {
            return Err(ApiError::Request("connection refused".into()));
        }
        if *self.lookups_always_miss.lock().expect("flag mutex") {
            return Ok(None);
        }
        Ok(self.users.lock().expect("users mutex").get(id).cloned())
    }

    async fn create_user(&self, payload: &CreateUserPayload) -> Result<UserRecord, ApiError> {
        self.create_calls.lock().expect("create mutex").push(payload.clone());
        if *self.fail_create.lock().expect("flag mutex") {
            return Err(ApiError::Status { status: 500, body: "boom".into() });
        }
        let record = UserRecord {
            id: payload.id.clone(),
            email: payload.email.clone(),
            name: payload.name.clone(),
            profile_image: payload.profile_image.clone(),
            user_type: payload.user_type,
            description: payload.description.clone(),
        };
        self.users.lock().expect("users mutex").insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn verify_token(&self, token: &str) -> Result<bool, ApiError> {
        self.verify_calls.lock().expect("verify mutex").push(token.to_owned());
        if *self.fail_verify.lock().expect("flag mutex") {
            return Err(ApiError::Request("timed out".into()));
        }
        Ok(self.valid_tokens.lock().expect("tokens mutex").iter().any(|t| t == token))
    }
}
