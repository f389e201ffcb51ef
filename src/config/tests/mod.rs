//! Unit tests for configuration loading and resolution.
//!
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `field_resolution`: Token, username, interval, and filter resolution
//! - `watchlist`: Watchlist file loading and merging

mod field_resolution;
mod helpers;
mod precedence;
mod watchlist;
