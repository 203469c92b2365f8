//! Labeling job synchronization engine.
//!
//! Keeps local volume annotations (segments, tags, per-item status)
//! consistent with a remote labeling platform's job/item state machine:
//! settings-driven save filtering, remote-first status transitions, and a
//! crash-safe local cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod save_filter;
pub mod session;
pub mod state_machine;
pub mod ui;

pub use error::{Result, SyncError};
