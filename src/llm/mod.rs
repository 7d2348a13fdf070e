//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for interacting with the Large
//! Language Model providers used by the interview panel. It abstracts away
//! provider-specific implementations behind a common trait, allowing the rest
//! of the crate (and its tests) to work with any client.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection, builds boxed clients
//! - [`RetryPolicy`] - Bounded retry with exponential backoff
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `openai` - OpenAI API (GPT-4o, etc.)
//! - `ollama` - Local Ollama server
//!
//! # Example
//!
//! ```ignore
//! use research_panel::llm::Provider;
//!
//! let client = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! }
//! .create_client()
//! .await?;
//!
//! let answer = client.generate_with_system("Be brief.", "What is 2+2?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// Retry policy shared by every LLM-calling component.
pub mod retry;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, Provider};
pub use retry::RetryPolicy;
