//! # research-panel - Multi-Analyst Research Assistant
//!
//! Turns a topic into a cited report by interviewing a panel of simulated
//! analysts concurrently. Every interview is a bounded question, search and
//! answer loop grounded in web and encyclopedia results. Every prompt carries
//! strategic rules learned from earlier runs.
//!
//! ## Overview
//!
//! research-panel can be used in two ways:
//!
//! 1. **As a CLI** - Run the `research-panel` binary
//! 2. **As a library** - Import components into your own Rust project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use research_panel::{ResearchAssistant, ResearchConfig, ResearchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResearchConfig::load_or_default("research.toml")?;
//!     let assistant = ResearchAssistant::from_config(&config).await?;
//!
//!     let run = assistant
//!         .run(&ResearchRequest::new("renewable energy"))
//!         .await?;
//!     println!("{}", run.markdown());
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Custom Collaborators
//!
//! ```rust,ignore
//! use research_panel::rules::MemoryRuleStore;
//! use research_panel::tools::WikipediaSearch;
//! use std::sync::Arc;
//!
//! let assistant = ResearchAssistant::new(
//!     my_llm,                                  // Arc<dyn LLMClient>
//!     Arc::new(MemoryRuleStore::new()),
//!     vec![Arc::new(WikipediaSearch::default())],
//!     &ResearchConfig::default(),
//! );
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `openai` | OpenAI API support (default) |
//!
//! ## Modules
//!
//! - [`research`] - Analysts, interviews, orchestration and report assembly
//! - [`rules`] - Strategic rule store, synthesis and feedback
//! - [`llm`] - LLM client implementations and retry policy
//! - [`tools`] - Search backends and source quality
//! - [`types`] - Domain types and error handling
//! - [`utils`] - Configuration and JSON helpers

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Multi-analyst research pipeline.
pub mod research;
/// Strategic rule learning.
pub mod rules;
/// Search backends and source assessment.
pub mod tools;
/// Core types and errors.
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, Provider, RetryPolicy};
pub use research::{ResearchAssistant, ResearchRequest, ResearchRun};
pub use rules::{MemoryRuleStore, RuleStore};
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigError, ResearchConfig};
