//! Strategic rule learning
//!
//! Agents read rules before building a prompt and report observations after
//! each step. The store may turn an observation into a new rule that later
//! prompt builds for the same agent id will carry.
//!
//! # Components
//!
//! - [`RuleStore`] - Trait consumed by agents (`get_rules`, `record_observation`)
//! - [`MemoryRuleStore`] - Per-agent rule lists with optional JSON persistence
//! - [`DisabledRuleStore`] - Inert store for runs without learning
//! - [`RuleSynthesizer`] / [`LlmRuleSynthesizer`] - Observation to rule
//! - [`RuleFeedback`] - Fire-and-forget submission with an explicit flush

/// Non-blocking observation submission.
pub mod feedback;
/// Persistent in-process store.
pub mod memory;
/// The store trait and observation type.
pub mod store;
/// LLM-backed rule synthesis.
pub mod synthesizer;

pub use feedback::RuleFeedback;
pub use memory::MemoryRuleStore;
pub use store::{DisabledRuleStore, Observation, RuleStore};
pub use synthesizer::{LlmRuleSynthesizer, ProposedRule, RuleSynthesizer};
