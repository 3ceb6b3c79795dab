//! Route gating for protected views.
//!
//! DESIGN
//! ======
//! The guard is a small state machine fed typed [`GuardEvent`]s (auth
//! updates, navigations, login-prompt answers). Each event yields a
//! [`GuardOutcome`]: what to render, plus an optional navigation for the
//! router to perform. The UI shell only forwards events and applies
//! outcomes.
//!
//! The first resolved (non-loading) auth state latches "initial load done".
//! After that a transient `loading = true` is decided on the user alone and
//! never brings the loading view back.

#[cfg(test)]
#[path = "route_guard_test.rs"]
mod route_guard_test;

use url::form_urlencoded;

use crate::state::auth::AuthState;

/// Path prefixes reachable without signing in (besides `/` itself).
pub const DEFAULT_PUBLIC_PREFIXES: &[&str] =
    &["/login", "/register", "/courses", "/instructors", "/about", "/contact", "/search"];

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
/// Query parameter carrying the return target on the login route.
pub const RETURN_PARAM: &str = "redirect";

/// Message shown when a protected view is requested while signed out.
pub const LOGIN_PROMPT: &str = "Please sign in to continue. Go to the login page?";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// Fixed allow-list of public paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicRoutes {
    prefixes: Vec<String>,
}

impl Default for PublicRoutes {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PREFIXES.iter().copied())
    }
}

impl PublicRoutes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { prefixes }
    }

    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// `/` matches exactly; other entries match whole path segments.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize_path(path);
        if path == ROOT_PATH {
            return true;
        }
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.is_public(path) { RouteClass::Public } else { RouteClass::Protected }
    }
}

/// Strip query and fragment; collapse a trailing slash (except on `/`).
fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    if path.is_empty() {
        return ROOT_PATH;
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { ROOT_PATH } else { trimmed }
}

/// Login route carrying `path` as the return target.
#[must_use]
pub fn login_redirect(path: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(RETURN_PARAM, path)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardView {
    /// Auth has not resolved yet; no decision made.
    Loading,
    /// The requested view may render.
    Render,
    /// Protected content suppressed; the login prompt is showing.
    LoginPrompt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptAnswer {
    Confirm,
    Cancel,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GuardEvent {
    AuthChanged(AuthState),
    Navigated(String),
    PromptAnswered(PromptAnswer),
}

/// Router action requested by the guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Redirect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardOutcome {
    pub view: GuardView,
    pub navigation: Option<Navigation>,
}

/// Per-navigation gate in front of protected views.
#[derive(Clone, Debug)]
pub struct RouteGuard {
    routes: PublicRoutes,
    path: String,
    auth: AuthState,
    initial_load_done: bool,
    view: GuardView,
}

impl RouteGuard {
    pub fn new(routes: PublicRoutes, path: impl Into<String>) -> Self {
        let mut guard = Self {
            routes,
            path: path.into(),
            auth: AuthState::default(),
            initial_load_done: false,
            view: GuardView::Loading,
        };
        guard.view = guard.decide();
        guard
    }

    #[must_use]
    pub fn view(&self) -> GuardView {
        self.view
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn initial_load_done(&self) -> bool {
        self.initial_load_done
    }

    #[must_use]
    pub fn route_class(&self) -> RouteClass {
        self.routes.classify(&self.path)
    }

    /// Apply one event and report what the UI should do.
    pub fn dispatch(&mut self, event: GuardEvent) -> GuardOutcome {
        let navigation = match event {
            GuardEvent::AuthChanged(auth) => {
                if !auth.loading {
                    self.initial_load_done = true;
                }
                self.auth = auth;
                None
            }
            GuardEvent::Navigated(path) => {
                self.path = path;
                None
            }
            GuardEvent::PromptAnswered(answer) => self.answer_prompt(answer),
        };
        self.view = self.decide();
        GuardOutcome { view: self.view, navigation }
    }

    fn answer_prompt(&mut self, answer: PromptAnswer) -> Option<Navigation> {
        if self.view != GuardView::LoginPrompt {
            return None;
        }
        let target = match answer {
            PromptAnswer::Confirm => login_redirect(&self.path),
            PromptAnswer::Cancel => ROOT_PATH.to_owned(),
        };
        self.path = normalize_path(&target).to_owned();
        Some(Navigation::Redirect(target))
    }

    fn decide(&self) -> GuardView {
        if !self.initial_load_done {
            return GuardView::Loading;
        }
        if self.auth.user.is_some() || self.routes.is_public(&self.path) {
            return GuardView::Render;
        }
        GuardView::LoginPrompt
    }
}
