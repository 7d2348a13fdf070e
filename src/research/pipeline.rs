//! End-to-end research run
//!
//! topic -> analyst panel -> concurrent interviews -> section drafts ->
//! report, with a closing coordinator observation once the report exists.

use crate::llm::LLMClient;
use crate::research::analysts::AnalystGenerator;
use crate::research::augmenter::PromptAugmenter;
use crate::research::interview::{InterviewResources, TurnPolicy};
use crate::research::orchestrator::InterviewOrchestrator;
use crate::research::prompts::{agents, PromptTemplates};
use crate::research::report::{render_markdown, ReportAssembler};
use crate::rules::{
    DisabledRuleStore, LlmRuleSynthesizer, MemoryRuleStore, Observation, RuleFeedback, RuleStore,
};
use crate::tools::{SearchBackend, WebSearch, WikipediaSearch};
use crate::types::{AnalystPersona, AppError, Report, Result};
use crate::utils::toml_config::ResearchConfig;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

static CITATION_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("static regex"));

/// Input for one research run.
#[derive(Debug, Clone, Default)]
pub struct ResearchRequest {
    pub topic: String,
    /// Editorial feedback used when generating the analyst panel
    pub feedback: Option<String>,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            feedback: None,
        }
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

/// Result and learning statistics of one run.
#[derive(Debug, Clone)]
pub struct ResearchRun {
    pub run_id: Uuid,
    pub personas: Vec<AnalystPersona>,
    pub report: Report,
    pub escalations: usize,
    pub rules_before: usize,
    pub rules_after: usize,
    pub duration: Duration,
}

impl ResearchRun {
    pub fn markdown(&self) -> String {
        render_markdown(&self.report)
    }

    pub fn rules_learned(&self) -> usize {
        self.rules_after.saturating_sub(self.rules_before)
    }
}

/// Rule store selected by the `[rules]` section.
pub fn build_rule_store(
    config: &ResearchConfig,
    llm: Arc<dyn LLMClient>,
) -> Result<Arc<dyn RuleStore>> {
    if !config.rules.enabled {
        return Ok(Arc::new(DisabledRuleStore));
    }

    let synthesizer =
        LlmRuleSynthesizer::new(llm).with_retry(config.interview.retry_policy());
    let store = MemoryRuleStore::open(&config.rules.data_path)?
        .with_synthesizer(Arc::new(synthesizer))
        .with_max_rules_per_agent(config.rules.max_rules_per_agent)
        .with_min_confidence(config.rules.min_confidence);
    Ok(Arc::new(store))
}

/// Search backends enabled by the `[search]` section, web first.
pub fn build_backends(config: &ResearchConfig) -> Vec<Arc<dyn SearchBackend>> {
    let mut backends: Vec<Arc<dyn SearchBackend>> = Vec::new();
    if config.search.web.enabled {
        backends.push(Arc::new(WebSearch::new(config.search.web.max_results)));
    }
    if config.search.wikipedia.enabled {
        backends.push(Arc::new(WikipediaSearch::new(
            config.search.wikipedia.base_url.clone(),
            config.search.wikipedia.max_results,
        )));
    }
    backends
}

/// The assembled research assistant.
pub struct ResearchAssistant {
    store: Arc<dyn RuleStore>,
    feedback: RuleFeedback,
    analysts: AnalystGenerator,
    orchestrator: InterviewOrchestrator,
    assembler: ReportAssembler,
    max_analysts: usize,
}

impl ResearchAssistant {
    /// Wire components from explicit collaborators.
    pub fn new(
        llm: Arc<dyn LLMClient>,
        store: Arc<dyn RuleStore>,
        backends: Vec<Arc<dyn SearchBackend>>,
        config: &ResearchConfig,
    ) -> Self {
        let templates = PromptTemplates::from_config(&config.prompts);
        let retry = config.interview.retry_policy();
        let feedback = RuleFeedback::new(store.clone());
        let augmenter = PromptAugmenter::new(store.clone());

        let analysts = AnalystGenerator::new(llm.clone(), augmenter.clone(), templates.analysts.clone())
            .with_retry(retry.clone());
        let assembler =
            ReportAssembler::new(llm.clone(), augmenter, templates.intro_conclusion.clone())
                .with_retry(retry.clone());

        let resources = InterviewResources::new(llm, backends, feedback.clone())
            .with_templates(templates)
            .with_retry(retry)
            .with_policy(TurnPolicy::new(config.interview.stop_phrase.clone()))
            .with_max_turns(config.interview.max_turns)
            .with_search_timeout(config.interview.search_timeout());
        let orchestrator = InterviewOrchestrator::new(resources)
            .with_max_concurrent(config.interview.max_concurrent_interviews)
            .with_require_all(config.interview.require_all)
            .with_run_timeout(config.interview.run_timeout());

        Self {
            store,
            feedback,
            analysts,
            orchestrator,
            assembler,
            max_analysts: config.interview.max_analysts,
        }
    }

    /// Build the provider, rule store and backends named by `config`.
    pub async fn from_config(config: &ResearchConfig) -> Result<Self> {
        config.validate()?;
        let provider = config.llm.to_provider()?;
        let llm: Arc<dyn LLMClient> = Arc::from(provider.create_client().await?);
        tracing::info!(provider = provider.name(), model = provider.model(), "LLM client ready");

        let store = build_rule_store(config, llm.clone())?;
        let backends = build_backends(config);
        Ok(Self::new(llm, store, backends, config))
    }

    pub fn rule_store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    pub async fn generate_analysts(
        &self,
        topic: &str,
        feedback: Option<&str>,
    ) -> Result<Vec<AnalystPersona>> {
        self.analysts
            .generate(topic, self.max_analysts, feedback)
            .await
    }

    /// Run the full pipeline once.
    ///
    /// Rule observations made during the run are flushed before returning,
    /// so the next run sees every rule this one produced.
    pub async fn run(&self, request: &ResearchRequest) -> Result<ResearchRun> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(AppError::InvalidInput("Topic must not be empty".to_string()));
        }

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let rules_before = self.store.all_rules().await?.len();
        tracing::info!(%run_id, topic, rules = rules_before, "Research run started");

        let personas = self
            .generate_analysts(topic, request.feedback.as_deref())
            .await?;
        let drafts = self.orchestrator.run(topic, &personas).await?;
        let escalations = drafts.iter().filter(|d| d.is_escalated()).count();
        let report = self.assembler.assemble(topic, drafts).await?;

        let markdown = render_markdown(&report);
        self.feedback.submit(
            Observation::new(
                agents::RESEARCH_COORDINATOR,
                "Orchestrate multi-analyst research process",
            )
            .with_task(format!("Complete research on: {}", topic))
            .with_output("Research process completed")
            .with_metrics(format!(
                "Research completed successfully\n\
                 - Report length: {} chars\n\
                 - Sections synthesized: {}\n\
                 - Sources cited: {}\n\
                 - Analysts involved: {}\n\
                 - Interviews escalated: {}",
                markdown.chars().count(),
                report.sections.len(),
                CITATION_MARK.find_iter(&markdown).count(),
                personas.len(),
                escalations
            )),
        );

        let flushed = self.feedback.flush().await;
        let rules_after = self.store.all_rules().await?.len();
        let duration = started.elapsed();

        tracing::info!(
            %run_id,
            observations = flushed,
            rules = rules_after,
            escalations,
            elapsed_ms = duration.as_millis() as u64,
            "Research run finished"
        );

        Ok(ResearchRun {
            run_id,
            personas,
            report,
            escalations,
            rules_before,
            rules_after,
            duration,
        })
    }
}
