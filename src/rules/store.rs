use crate::types::{Result, StrategicRule};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What an agent reports after finishing one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Agent role identifier the rules are keyed by, e.g. `section_writer`
    pub agent_id: String,
    /// One-line description of what the agent is for
    pub agent_role: String,
    /// The concrete task performed in this step
    pub task: String,
    /// What the agent produced (may be truncated)
    pub output: String,
    /// Measured outcome: result counts, quality, citations
    pub metrics: String,
    /// The augmented prompt the step ran under
    pub prompt: String,
}

impl Observation {
    pub fn new(agent_id: impl Into<String>, agent_role: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_role: agent_role.into(),
            task: String::new(),
            output: String::new(),
            metrics: String::new(),
            prompt: String::new(),
        }
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_metrics(mut self, metrics: impl Into<String>) -> Self {
        self.metrics = metrics.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

/// Prompt-learning store consulted before every prompt build.
///
/// Implementations must return rules in a stable order and must not change
/// what [`get_rules`](RuleStore::get_rules) returns except through
/// [`record_observation`](RuleStore::record_observation).
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Ordered rule texts for an agent role. Empty is valid.
    async fn get_rules(&self, agent_id: &str) -> Result<Vec<String>>;

    /// Feed one observation; returns the rule it produced, if any.
    async fn record_observation(&self, observation: Observation) -> Result<Option<StrategicRule>>;

    /// Every stored rule across all agents, grouped by agent id.
    async fn all_rules(&self) -> Result<Vec<StrategicRule>>;
}

/// Store used when rule learning is switched off. Never yields rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRuleStore;

#[async_trait]
impl RuleStore for DisabledRuleStore {
    async fn get_rules(&self, _agent_id: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn record_observation(&self, _observation: Observation) -> Result<Option<StrategicRule>> {
        Ok(None)
    }

    async fn all_rules(&self) -> Result<Vec<StrategicRule>> {
        Ok(Vec::new())
    }
}
