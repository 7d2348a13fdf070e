use crate::research::interview::{InterviewAgent, InterviewResources};
use crate::types::{AnalystPersona, AppError, Result, SectionDraft};
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Runs one [`InterviewAgent`] per persona concurrently and collects their
/// drafts at a barrier.
pub struct InterviewOrchestrator {
    resources: InterviewResources,
    max_concurrent: usize,
    require_all: bool,
    run_timeout: Duration,
}

impl InterviewOrchestrator {
    pub fn new(resources: InterviewResources) -> Self {
        Self {
            resources,
            max_concurrent: 4,
            require_all: false,
            run_timeout: Duration::from_secs(600),
        }
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn with_require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Interview every persona and return their drafts in input order.
    ///
    /// Completes only once every interview is done or escalated. A panicked
    /// or cancelled interview task contributes an escalated placeholder at
    /// its index.
    pub async fn run(&self, topic: &str, personas: &[AnalystPersona]) -> Result<Vec<SectionDraft>> {
        let mut seen = HashSet::new();
        for persona in personas {
            if !seen.insert(persona.id.as_str()) {
                return Err(AppError::InvalidInput(format!(
                    "Duplicate persona id: {}",
                    persona.id
                )));
            }
        }
        if personas.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            topic,
            interviews = personas.len(),
            max_concurrent = self.max_concurrent,
            "Starting interviews"
        );

        let deadline = Instant::now() + self.run_timeout;
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut set = JoinSet::new();

        for (index, persona) in personas.iter().cloned().enumerate() {
            let agent = InterviewAgent::new(persona, topic, self.resources.clone())
                .with_deadline(deadline);
            let permits = permits.clone();

            set.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome = AssertUnwindSafe(agent.run()).catch_unwind().await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<SectionDraft>> = vec![None; personas.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(Ok(outcome)))) => slots[index] = Some(outcome.draft),
                Ok((index, Ok(Err(e)))) => {
                    set.abort_all();
                    tracing::error!(persona = %personas[index].id, error = %e, "Interview failed fatally");
                    return Err(e);
                }
                Ok((index, Err(_panic))) => {
                    tracing::error!(persona = %personas[index].id, "Interview task panicked");
                    slots[index] = Some(SectionDraft::escalated(
                        &personas[index],
                        "interview task panicked",
                    ));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Interview task could not be joined");
                }
            }
        }

        let drafts: Vec<SectionDraft> = slots
            .into_iter()
            .zip(personas)
            .map(|(slot, persona)| {
                slot.unwrap_or_else(|| SectionDraft::escalated(persona, "interview task was cancelled"))
            })
            .collect();

        let escalated: Vec<&str> = drafts
            .iter()
            .filter(|d| d.is_escalated())
            .map(|d| d.persona_id.as_str())
            .collect();

        if !escalated.is_empty() {
            if self.require_all {
                return Err(AppError::Assembly(format!(
                    "{} of {} interviews escalated: {}",
                    escalated.len(),
                    drafts.len(),
                    escalated.join(", ")
                )));
            }
            tracing::warn!(
                escalated = escalated.len(),
                total = drafts.len(),
                personas = %escalated.join(", "),
                "Continuing with partial interviews"
            );
        }

        Ok(drafts)
    }
}
