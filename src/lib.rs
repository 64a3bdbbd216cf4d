//! # Chat Relay
//!
//! A conversational relay between WebSocket clients and an OpenAI-compatible
//! completion service.
//!
//! ## Features
//!
//! - **Session Gateway:** one long-lived WebSocket session per client, with
//!   a fixed `start` / `stream` / `end` frame protocol
//! - **Bounded Memory:** chat completion remembering the last k exchanges
//! - **Retrieval:** question answering over a pre-built document index,
//!   with follow-up questions condensed from session history

pub mod agent;
pub mod config;
pub mod error;
pub mod gateway;
pub mod knowledge;
pub mod logging;
pub mod provider;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
