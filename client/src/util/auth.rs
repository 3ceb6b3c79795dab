//! Leptos wiring for the route guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Protected pages share one guard instance fed from the auth signal and the
//! router location. The confirm dialog and navigation are injected so the
//! same code serves the browser shell and tests.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use crate::state::auth::AuthState;
use crate::util::route_guard::{
    GuardEvent, GuardView, LOGIN_PROMPT, Navigation, PromptAnswer, PublicRoutes, RouteGuard,
};

/// Feed the current auth state and path into `guard`, asking `confirm` when
/// the login prompt shows. Returns the view and any redirect target.
pub fn sync_guard<C>(guard: &mut RouteGuard, auth: AuthState, path: String, confirm: C) -> (GuardView, Option<String>)
where
    C: FnOnce(&str) -> bool,
{
    if guard.path() != path {
        guard.dispatch(GuardEvent::Navigated(path));
    }
    let outcome = guard.dispatch(GuardEvent::AuthChanged(auth));
    if outcome.view != GuardView::LoginPrompt {
        return (outcome.view, None);
    }

    let answer = if confirm(LOGIN_PROMPT) { PromptAnswer::Confirm } else { PromptAnswer::Cancel };
    let answered = guard.dispatch(GuardEvent::PromptAnswered(answer));
    let target = answered.navigation.map(|Navigation::Redirect(target)| target);
    (answered.view, target)
}

/// Install the guard for the current route tree and return its view signal.
pub fn install_route_guard<P, F, C>(
    auth: RwSignal<AuthState>,
    routes: PublicRoutes,
    path: P,
    navigate: F,
    confirm: C,
) -> ReadSignal<GuardView>
where
    P: Fn() -> String + 'static,
    F: Fn(&str, NavigateOptions) + Clone + 'static,
    C: Fn(&str) -> bool + Clone + 'static,
{
    let guard = StoredValue::new(RouteGuard::new(routes, path()));
    let view = RwSignal::new(GuardView::Loading);

    Effect::new(move || {
        let state = auth.get();
        let current = path();
        let confirm = confirm.clone();
        let Some((next, target)) = guard.try_update_value(|g| sync_guard(g, state, current, confirm)) else {
            return;
        };
        view.set(next);
        if let Some(target) = target {
            navigate(&target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    view.read_only()
}
