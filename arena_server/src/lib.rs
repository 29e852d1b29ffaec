//! HTTP server for esports events and tournament brackets.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
