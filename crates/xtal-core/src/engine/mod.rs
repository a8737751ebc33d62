//! # Engine Module
//!
//! Shared machinery for the workflows: the conversion configuration and its builder,
//! the workflow error type, and the progress-reporting hook used by front ends.
//!
//! - **Configuration** ([`config`]) - Validated inputs of a conversion run
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Errors surfaced by workflows

pub mod config;
pub mod error;
pub mod progress;
