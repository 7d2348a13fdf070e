//! Strategic-rule prompt augmentation
//!
//! [`augment`] is the pure composition step; [`PromptAugmenter`] adds the
//! store lookup around it.

use crate::rules::RuleStore;
use crate::types::{AppError, Result};
use std::sync::Arc;

const RULES_HEADER: &str = "## Strategic Rules (learned from previous runs)";

/// Compose a template with rule texts. No rules means the template comes back
/// unchanged; otherwise the rules follow as a bulleted addendum in the order
/// given.
pub fn augment(template: &str, rules: &[String]) -> String {
    if rules.is_empty() {
        return template.to_string();
    }

    let mut prompt = String::with_capacity(
        template.len() + RULES_HEADER.len() + rules.iter().map(|r| r.len() + 3).sum::<usize>() + 4,
    );
    prompt.push_str(template.trim_end());
    prompt.push_str("\n\n");
    prompt.push_str(RULES_HEADER);
    for rule in rules {
        prompt.push_str("\n- ");
        prompt.push_str(rule.trim());
    }
    prompt.push('\n');
    prompt
}

/// Builds final instruction strings for agents from a template and the rules
/// the store holds for their agent id.
#[derive(Clone)]
pub struct PromptAugmenter {
    store: Arc<dyn RuleStore>,
}

impl PromptAugmenter {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// Fetch the rules for `agent_id` and append them to `base_template`.
    ///
    /// # Errors
    ///
    /// [`AppError::Configuration`] when the template is empty or whitespace.
    /// Store failures are passed through unchanged.
    pub async fn build(&self, base_template: &str, agent_id: &str) -> Result<String> {
        if base_template.trim().is_empty() {
            return Err(AppError::Configuration(format!(
                "Prompt template for '{}' is empty",
                agent_id
            )));
        }

        let rules = self.store.get_rules(agent_id).await?;
        tracing::debug!(agent = agent_id, rules = rules.len(), "Built augmented prompt");
        Ok(augment(base_template, &rules))
    }

    /// Like [`build`](Self::build), but a failing store degrades to the bare
    /// template instead of failing the step.
    pub async fn build_or_base(&self, base_template: &str, agent_id: &str) -> Result<String> {
        match self.build(base_template, agent_id).await {
            Ok(prompt) => Ok(prompt),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(agent = agent_id, error = %e, "Rule lookup failed, using base prompt");
                Ok(base_template.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{DisabledRuleStore, MemoryRuleStore, Observation};
    use crate::types::StrategicRule;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl RuleStore for BrokenStore {
        async fn get_rules(&self, _agent_id: &str) -> Result<Vec<String>> {
            Err(AppError::Transport("store offline".into()))
        }

        async fn record_observation(
            &self,
            _observation: Observation,
        ) -> Result<Option<StrategicRule>> {
            Ok(None)
        }

        async fn all_rules(&self) -> Result<Vec<StrategicRule>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_augment_without_rules_is_identity() {
        assert_eq!(augment("Ask one question.", &[]), "Ask one question.");
    }

    #[test]
    fn test_augment_appends_rules_in_order() {
        let rules = vec!["First rule".to_string(), "Second rule".to_string()];
        let prompt = augment("Ask one question.\n", &rules);
        assert_eq!(
            prompt,
            "Ask one question.\n\n## Strategic Rules (learned from previous runs)\n- First rule\n- Second rule\n"
        );
    }

    #[test]
    fn test_augment_is_deterministic() {
        let rules = vec!["a".to_string(), "b".to_string()];
        assert_eq!(augment("t", &rules), augment("t", &rules));
    }

    #[tokio::test]
    async fn test_build_rejects_blank_template() {
        let augmenter = PromptAugmenter::new(Arc::new(DisabledRuleStore));
        let err = augmenter.build("  \n\t", "section_writer").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));

        let err = augmenter.build_or_base("", "section_writer").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_build_uses_agent_rules_only() {
        let store = MemoryRuleStore::new();
        store
            .add_rule(StrategicRule {
                agent_id: "section_writer".into(),
                rule_text: "Cite every claim".into(),
                rationale: String::new(),
                confidence: 1.0,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        let augmenter = PromptAugmenter::new(Arc::new(store));

        let writer = augmenter.build("Write.", "section_writer").await.unwrap();
        assert!(writer.ends_with("- Cite every claim\n"));

        let asker = augmenter.build("Ask.", "analyst_question_generator").await.unwrap();
        assert_eq!(asker, "Ask.");
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_base() {
        let augmenter = PromptAugmenter::new(Arc::new(BrokenStore));
        assert!(augmenter.build("Ask.", "a").await.is_err());
        assert_eq!(augmenter.build_or_base("Ask.", "a").await.unwrap(), "Ask.");
    }
}
