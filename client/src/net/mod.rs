//! Networking modules for the backend REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` wraps the REST calls the auth context depends on, and `types`
//! defines the wire schema shared with the backend.

pub mod api;
pub mod types;
