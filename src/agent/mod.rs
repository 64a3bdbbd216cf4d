//! Agent module - completion client and prompt engineering
//!
//! This module handles all LLM-facing functionality:
//! - Client for OpenAI-compatible chat completion and embedding APIs
//! - Wire types for those APIs
//! - Prompt templates

mod client;
pub mod prompts;
mod types;

pub use client::CompletionClient;
pub use prompts::PromptTemplate;
pub use types::*;
