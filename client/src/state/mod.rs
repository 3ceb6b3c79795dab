//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! Each state container has exactly one writer. Readers subscribe to a
//! `watch` channel and never mutate.

pub mod auth;
