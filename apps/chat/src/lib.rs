//! # Chat Library
//!
//! This library exposes the chat server, client and front ends for testing
//! and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod app;
pub mod cli;
pub mod client;
pub mod error;
pub mod server;
pub mod telemetry;

pub use error::{Error, Result};

// Re-export chat_core for convenience
pub use chat_core;
