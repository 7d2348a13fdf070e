use crate::llm::{LLMClient, RetryPolicy};
use crate::research::augmenter::PromptAugmenter;
use crate::research::prompts::{agents, render};
use crate::types::{AnalystPersona, AppError, Result};
use crate::utils::json::extract_json;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct GeneratedAnalyst {
    name: String,
    #[serde(default)]
    affiliation: String,
    #[serde(default)]
    role: String,
    #[serde(default, alias = "focus_area")]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratedPanel {
    List(Vec<GeneratedAnalyst>),
    Wrapped { analysts: Vec<GeneratedAnalyst> },
}

impl GeneratedPanel {
    fn into_analysts(self) -> Vec<GeneratedAnalyst> {
        match self {
            GeneratedPanel::List(list) => list,
            GeneratedPanel::Wrapped { analysts } => analysts,
        }
    }
}

/// Creates the analyst panel for a topic.
pub struct AnalystGenerator {
    llm: Arc<dyn LLMClient>,
    augmenter: PromptAugmenter,
    template: String,
    retry: RetryPolicy,
}

impl AnalystGenerator {
    pub fn new(llm: Arc<dyn LLMClient>, augmenter: PromptAugmenter, template: impl Into<String>) -> Self {
        Self {
            llm,
            augmenter,
            template: template.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Generate up to `max_analysts` personas with ids `analyst-1..n`.
    ///
    /// Editorial `feedback` steers the themes when given. Malformed LLM
    /// output is re-sampled under the retry policy.
    pub async fn generate(
        &self,
        topic: &str,
        max_analysts: usize,
        feedback: Option<&str>,
    ) -> Result<Vec<AnalystPersona>> {
        if topic.trim().is_empty() {
            return Err(AppError::InvalidInput("Topic must not be empty".to_string()));
        }
        if max_analysts == 0 {
            return Ok(Vec::new());
        }

        let max = max_analysts.to_string();
        let template = render(
            &self.template,
            &[
                ("topic", topic),
                ("feedback", feedback.unwrap_or("")),
                ("max_analysts", max.as_str()),
            ],
        );
        let system = self
            .augmenter
            .build_or_base(&template, agents::ANALYST_GENERATOR)
            .await?;

        let llm = &self.llm;
        let system = &system;
        let generated = self
            .retry
            .run("analyst generation", None, move || async move {
                let raw = llm
                    .generate_with_system(system, "Generate the set of analysts.")
                    .await?;
                let panel: GeneratedPanel = extract_json(&raw)?;
                let analysts = panel.into_analysts();
                if analysts.is_empty() {
                    return Err(AppError::Parse("LLM returned no analysts".to_string()));
                }
                Ok(analysts)
            })
            .await?;

        let personas: Vec<AnalystPersona> = generated
            .into_iter()
            .take(max_analysts)
            .enumerate()
            .map(|(i, a)| AnalystPersona {
                id: format!("analyst-{}", i + 1),
                name: a.name.trim().to_string(),
                affiliation: a.affiliation.trim().to_string(),
                role: a.role.trim().to_string(),
                focus_area: a.description.trim().to_string(),
            })
            .collect();

        tracing::info!(topic, count = personas.len(), "Generated analyst panel");
        Ok(personas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::prompts::ANALYST_INSTRUCTIONS;
    use crate::rules::DisabledRuleStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct FixedLLM {
        responses: Mutex<Vec<String>>,
        last_system: Mutex<String>,
    }

    impl FixedLLM {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().rev().map(|r| r.to_string()).collect()),
                last_system: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl LLMClient for FixedLLM {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.generate_with_system("", prompt).await
        }

        async fn generate_with_system(&self, system: &str, _prompt: &str) -> Result<String> {
            *self.last_system.lock() = system.to_string();
            self.responses
                .lock()
                .pop()
                .ok_or_else(|| AppError::Transport("no more responses".into()))
        }

        async fn complete(&self, system: &str, _messages: &[(String, String)]) -> Result<String> {
            self.generate_with_system(system, "").await
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn generator(llm: Arc<FixedLLM>) -> AnalystGenerator {
        AnalystGenerator::new(
            llm,
            PromptAugmenter::new(Arc::new(DisabledRuleStore)),
            ANALYST_INSTRUCTIONS,
        )
        .with_retry(RetryPolicy::default().without_backoff())
    }

    const PANEL: &str = r#"```json
[
  {"name": "Dr. Ada Grid", "affiliation": "Energy Institute", "role": "Grid analyst", "description": "Storage economics"},
  {"name": "Ravi Sun", "affiliation": "Solar Co-op", "role": "Community organizer", "description": "Rooftop adoption"},
  {"name": "Extra", "affiliation": "X", "role": "Y", "description": "Z"}
]
```"#;

    #[tokio::test]
    async fn test_generates_capped_panel_with_ids() {
        let llm = Arc::new(FixedLLM::new(&[PANEL]));
        let personas = generator(llm.clone())
            .generate("renewable energy", 2, Some("Include a community voice"))
            .await
            .unwrap();

        assert_eq!(personas.len(), 2);
        assert_eq!(personas[0].id, "analyst-1");
        assert_eq!(personas[1].id, "analyst-2");
        assert_eq!(personas[0].focus_area, "Storage economics");

        let system = llm.last_system.lock().clone();
        assert!(system.contains("renewable energy"));
        assert!(system.contains("Include a community voice"));
        assert!(system.contains("Pick the top 2 themes"));
    }

    #[tokio::test]
    async fn test_malformed_output_is_resampled() {
        let llm = Arc::new(FixedLLM::new(&["Sure! Here are some analysts.", r#"{"analysts": [{"name": "A"}]}"#]));
        let personas = generator(llm).generate("topic", 3, None).await.unwrap();
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].name, "A");
    }

    #[tokio::test]
    async fn test_blank_topic_rejected() {
        let llm = Arc::new(FixedLLM::new(&[PANEL]));
        let err = generator(llm).generate("   ", 2, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
