//! Operation mode handlers for the binary.
//!
//! - [`migrations`]: database schema migrations
//! - [`watch`]: the polling loop, or a single cycle with `--once`

pub mod migrations;
pub mod watch;
