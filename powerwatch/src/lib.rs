//! Power presence monitor.
//!
//! Polls a device whose reachability stands in for mains power, turns the
//! noisy results into a debounced state timeline, keeps a retention-bounded
//! log of closed intervals and reports calendar-aligned time-in-state
//! summaries.

pub mod api;
pub mod api_client;
pub mod commands;
pub mod config;
pub mod monitor;
pub mod notify;
pub mod schedule;
pub mod source;
pub mod store;
pub mod summary;
pub mod timeline;
pub mod tracing;
