//! # friend-cli
//!
//! Command-line front end for the match pipeline: argument parsing and plain-text rendering.

pub mod cli;
pub mod render;

pub use cli::{Cli, Commands};
pub use render::{render_outcome, render_recent};
