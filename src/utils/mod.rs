/// JSON extraction from LLM output.
pub mod json;
/// TOML configuration loading and validation.
pub mod toml_config;

pub use toml_config::{ConfigError, ResearchConfig};
