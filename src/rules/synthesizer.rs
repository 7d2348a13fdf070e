//! Turns observations into candidate strategic rules.

use crate::llm::{LLMClient, RetryPolicy};
use crate::rules::store::Observation;
use crate::types::Result;
use crate::utils::json::extract_json;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// A rule proposed by a synthesizer, not yet accepted by the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProposedRule {
    pub rule: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub confidence: f32,
}

#[async_trait]
pub trait RuleSynthesizer: Send + Sync {
    /// Propose at most one new rule given an observation and the agent's
    /// current rules.
    async fn synthesize(
        &self,
        observation: &Observation,
        existing: &[String],
    ) -> Result<Option<ProposedRule>>;
}

#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    #[serde(default)]
    rule: Option<String>,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    confidence: f32,
}

const SYNTHESIS_SYSTEM: &str = "You improve the instructions of an AI agent by \
learning from its recent performance. You write short, concrete, reusable \
guidelines. You answer with JSON only.";

/// Rule synthesizer backed by an LLM call.
pub struct LlmRuleSynthesizer {
    llm: Arc<dyn LLMClient>,
    retry: RetryPolicy,
}

impl LlmRuleSynthesizer {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self {
            llm,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_prompt(observation: &Observation, existing: &[String]) -> String {
        let existing = if existing.is_empty() {
            "(none)".to_string()
        } else {
            existing
                .iter()
                .map(|r| format!("- {}", r))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"Agent: {agent} ({role})
Task: {task}

Output:
{output}

Observed outcome:
{metrics}

Rules the agent already follows:
{existing}

If the outcome reveals a lesson that would make this agent's future work
better, and it is not already covered by an existing rule, propose ONE new
rule. Otherwise propose nothing.

Respond with JSON only:
{{"rule": "<imperative guideline or null>", "rationale": "<why>", "confidence": <0.0-1.0>}}"#,
            agent = observation.agent_id,
            role = observation.agent_role,
            task = observation.task,
            output = observation.output,
            metrics = observation.metrics,
            existing = existing,
        )
    }
}

#[async_trait]
impl RuleSynthesizer for LlmRuleSynthesizer {
    async fn synthesize(
        &self,
        observation: &Observation,
        existing: &[String],
    ) -> Result<Option<ProposedRule>> {
        let prompt = Self::build_prompt(observation, existing);
        let llm = &self.llm;
        let prompt = &prompt;

        let response: SynthesisResponse = self
            .retry
            .run("rule synthesis", None, move || async move {
                let raw = llm.generate_with_system(SYNTHESIS_SYSTEM, prompt).await?;
                extract_json(&raw)
            })
            .await?;

        Ok(response
            .rule
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .map(|rule| ProposedRule {
                rule,
                rationale: response.rationale,
                confidence: response.confidence.clamp(0.0, 1.0),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_existing_rules() {
        let observation = Observation::new("search_query_generator_web", "Generate web queries")
            .with_task("Generate query for: battery costs")
            .with_metrics("Found 0 web results");
        let prompt = LlmRuleSynthesizer::build_prompt(
            &observation,
            &["Use specific technical terms".to_string()],
        );
        assert!(prompt.contains("- Use specific technical terms"));
        assert!(prompt.contains("Found 0 web results"));
        assert!(prompt.contains("search_query_generator_web"));
    }

    #[test]
    fn test_prompt_without_rules() {
        let observation = Observation::new("section_writer", "Write sections");
        let prompt = LlmRuleSynthesizer::build_prompt(&observation, &[]);
        assert!(prompt.contains("(none)"));
    }

    #[test]
    fn test_null_rule_deserializes() {
        let parsed: SynthesisResponse =
            serde_json::from_str(r#"{"rule": null, "rationale": "", "confidence": 0}"#).unwrap();
        assert!(parsed.rule.is_none());
    }
}
