//! # friend-core
//!
//! Shared error taxonomy for the match pipeline ([`MatchError`]) and tracing initialization.
//! Transport-agnostic; used by matcher and friend-cli.

pub mod error;
pub mod logger;

pub use error::{MatchError, Result};
pub use logger::init_tracing;
