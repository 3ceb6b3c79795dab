//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route gating and display formatting live here as plain functions and
//! state machines so pages stay thin and the logic stays testable without
//! a rendering harness.

#[cfg(feature = "leptos")]
pub mod auth;
pub mod money;
pub mod route_guard;
pub mod schedule;
