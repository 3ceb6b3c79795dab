//! # swimclass
//!
//! Client-side core for the swimming-lesson marketplace frontend.
//!
//! This crate holds the pieces of the UI that carry logic rather than
//! markup: the identity/session provider, the process-wide auth context,
//! the route guard that gates protected views, the REST wrappers those
//! depend on, and the schedule and money formatters used across pages.
//! Rendering stays in the UI shell; everything here is testable without it.

pub mod config;
pub mod identity;
pub mod net;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_helpers;
