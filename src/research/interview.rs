//! One analyst's interview with the expert
//!
//! An [`InterviewAgent`] owns its [`InterviewState`] and walks the phases
//! `AwaitingQuestion -> Searching -> Answering -> (AwaitingQuestion | Done)`.
//! Which phase follows is decided by the pure [`advance`] function; the agent
//! only performs the action attached to the current phase.
//!
//! Once `Done`, exactly one section-writing pass turns the transcript and the
//! sources observed during this interview into a [`SectionDraft`]. Any LLM
//! failure that survives the retry policy, or hitting the run deadline,
//! force-terminates the interview and yields an escalated placeholder draft
//! instead of an error.

use crate::llm::{LLMClient, RetryPolicy};
use crate::research::augmenter::PromptAugmenter;
use crate::research::prompts::{self, agents, render, PromptTemplates};
use crate::rules::{Observation, RuleFeedback};
use crate::tools::quality::{encyclopedia_observation, search_observation};
use crate::tools::SearchBackend;
use crate::types::{
    AnalystPersona, AppError, BackendKind, DraftStatus, Result, SearchQuery, SearchResult,
    SectionDraft, Speaker, TranscriptEntry,
};
use futures::future::join_all;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewPhase {
    AwaitingQuestion,
    Searching,
    Answering,
    Done,
}

/// Mutable interview record, owned by exactly one agent.
#[derive(Debug, Clone)]
pub struct InterviewState {
    pub persona_id: String,
    pub transcript: Vec<TranscriptEntry>,
    /// Completed expert answers
    pub turn_count: usize,
    pub max_turns: usize,
    pub terminated: bool,
}

impl InterviewState {
    pub fn new(persona_id: impl Into<String>, max_turns: usize) -> Self {
        Self {
            persona_id: persona_id.into(),
            transcript: Vec::new(),
            turn_count: 0,
            max_turns,
            terminated: false,
        }
    }

    /// The most recent analyst question, if any has been asked.
    pub fn last_question(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|e| e.speaker == Speaker::Analyst)
            .map(|e| e.message.as_str())
    }

    fn record(&mut self, speaker: Speaker, message: String, sources: Vec<String>) {
        if self.terminated {
            return;
        }
        if speaker == Speaker::Expert {
            self.turn_count += 1;
        }
        self.transcript.push(TranscriptEntry {
            speaker,
            message,
            sources,
        });
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Plain `speaker: message` rendering used by the section writer.
    pub fn transcript_text(&self) -> String {
        self.transcript
            .iter()
            .map(|e| format!("{}: {}", e.speaker, e.message))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Loop-or-stop parameters.
#[derive(Debug, Clone)]
pub struct TurnPolicy {
    pub stop_phrase: String,
}

impl TurnPolicy {
    pub fn new(stop_phrase: impl Into<String>) -> Self {
        Self {
            stop_phrase: stop_phrase.into(),
        }
    }

    /// Case-insensitive equality after trimming whitespace and trailing
    /// `.`, `!`, `?`.
    pub fn is_stop_phrase(&self, question: &str) -> bool {
        let wanted = normalize_phrase(&self.stop_phrase);
        !wanted.is_empty() && normalize_phrase(question) == wanted
    }
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self::new("Thank you so much for your help!")
    }
}

fn normalize_phrase(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!', '?'])
        .trim_end()
        .to_lowercase()
}

/// Phase an interview starts in.
pub fn initial_phase(state: &InterviewState) -> InterviewPhase {
    if state.terminated || state.max_turns == 0 {
        InterviewPhase::Done
    } else {
        InterviewPhase::AwaitingQuestion
    }
}

/// The phase that follows `phase` once its action has been applied to
/// `state`.
pub fn advance(
    phase: InterviewPhase,
    state: &InterviewState,
    policy: &TurnPolicy,
) -> InterviewPhase {
    if state.terminated {
        return InterviewPhase::Done;
    }

    match phase {
        InterviewPhase::AwaitingQuestion => InterviewPhase::Searching,
        InterviewPhase::Searching => InterviewPhase::Answering,
        InterviewPhase::Answering => {
            let stop_asked = state
                .last_question()
                .is_some_and(|q| policy.is_stop_phrase(q));
            if state.turn_count < state.max_turns && !stop_asked {
                InterviewPhase::AwaitingQuestion
            } else {
                InterviewPhase::Done
            }
        }
        InterviewPhase::Done => InterviewPhase::Done,
    }
}

/// Ordered, de-duplicated `[n]` citation numbers in `text`.
pub fn extract_citations(text: &str) -> Vec<usize> {
    let mut seen = BTreeSet::new();
    CITATION
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<usize>().ok())
        .filter(|n| *n > 0 && seen.insert(*n))
        .collect()
}

/// Rewrite every `[n]` marker through `map`. Markers mapped to `None` are
/// removed together with the whitespace before them.
pub fn renumber_citations(text: &str, map: impl Fn(usize) -> Option<usize>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in CITATION.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        match caps[1].parse::<usize>().ok().and_then(&map) {
            Some(n) => out.push_str(&format!("[{}]", n)),
            None => {
                let kept = out.trim_end_matches([' ', '\t']).len();
                out.truncate(kept);
            }
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Numbered source list shown to the expert and the section writer.
pub fn format_sources(sources: &[SearchResult]) -> String {
    if sources.is_empty() {
        return "(no sources found)".to_string();
    }
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {}\n{}\n{}", i + 1, s.title, s.url, s.snippet))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Everything an interview needs besides its persona. Cheap to clone; one
/// copy is handed to every agent of a run.
#[derive(Clone)]
pub struct InterviewResources {
    pub llm: Arc<dyn LLMClient>,
    pub backends: Vec<Arc<dyn SearchBackend>>,
    pub augmenter: PromptAugmenter,
    pub feedback: RuleFeedback,
    pub templates: Arc<PromptTemplates>,
    pub retry: RetryPolicy,
    pub policy: TurnPolicy,
    pub max_turns: usize,
    pub search_timeout: Duration,
}

impl InterviewResources {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        backends: Vec<Arc<dyn SearchBackend>>,
        feedback: RuleFeedback,
    ) -> Self {
        Self {
            llm,
            backends,
            augmenter: PromptAugmenter::new(feedback.store().clone()),
            feedback,
            templates: Arc::new(PromptTemplates::default()),
            retry: RetryPolicy::default(),
            policy: TurnPolicy::default(),
            max_turns: 2,
            search_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = Arc::new(templates);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_policy(mut self, policy: TurnPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }
}

/// Final state and draft of a finished interview.
#[derive(Debug, Clone)]
pub struct InterviewOutcome {
    pub draft: SectionDraft,
    pub state: InterviewState,
}

pub struct InterviewAgent {
    persona: AnalystPersona,
    topic: String,
    resources: InterviewResources,
    deadline: Option<Instant>,
    state: InterviewState,
    /// Every source seen in this interview, numbered by position
    observed: Vec<SearchResult>,
    /// Source ids returned by the current turn's searches
    turn_sources: Vec<String>,
}

impl InterviewAgent {
    pub fn new(
        persona: AnalystPersona,
        topic: impl Into<String>,
        resources: InterviewResources,
    ) -> Self {
        let state = InterviewState::new(persona.id.clone(), resources.max_turns);
        Self {
            persona,
            topic: topic.into(),
            resources,
            deadline: None,
            state,
            observed: Vec::new(),
            turn_sources: Vec::new(),
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Drive the interview to completion.
    ///
    /// Only fatal errors ([`AppError::is_fatal`]) are returned; everything
    /// else ends in an escalated draft.
    pub async fn run(mut self) -> Result<InterviewOutcome> {
        info!(persona = %self.persona.id, topic = %self.topic, "Starting interview");

        let mut phase = initial_phase(&self.state);
        loop {
            let step = match phase {
                InterviewPhase::AwaitingQuestion => self.ask_question().await,
                InterviewPhase::Searching => self.search().await,
                InterviewPhase::Answering => self.answer().await,
                InterviewPhase::Done => break,
            };
            if let Err(e) = step {
                return self.escalate(e);
            }
            phase = advance(phase, &self.state, &self.resources.policy);
        }

        self.state.terminate();
        let written = self.write_section().await;
        match written {
            Ok(draft) => {
                info!(
                    persona = %self.persona.id,
                    turns = self.state.turn_count,
                    citations = draft.cited_sources.len(),
                    "Interview complete"
                );
                Ok(InterviewOutcome {
                    draft,
                    state: self.state,
                })
            }
            Err(e) => self.escalate(e),
        }
    }

    fn escalate(mut self, error: AppError) -> Result<InterviewOutcome> {
        if error.is_fatal() {
            return Err(error);
        }
        warn!(
            persona = %self.persona.id,
            turn = self.state.turn_count,
            error = %error,
            "Interview escalated"
        );
        self.state.terminate();
        Ok(InterviewOutcome {
            draft: SectionDraft::escalated(&self.persona, error.to_string()),
            state: self.state,
        })
    }

    fn check_deadline(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(AppError::Timeout(format!(
                "interview for {} passed the run deadline",
                self.persona.id
            ))),
            _ => Ok(()),
        }
    }

    /// Transcript replayed as chat messages from `perspective`'s side.
    fn conversation(&self, perspective: Speaker) -> Vec<(String, String)> {
        let mut messages = Vec::with_capacity(self.state.transcript.len() + 1);
        messages.push((
            "user".to_string(),
            format!("So you said you were writing an article on {}?", self.topic),
        ));
        messages.extend(
            self.state
                .transcript
                .iter()
                .map(|e| (e.speaker.chat_role(perspective).to_string(), e.message.clone())),
        );
        messages
    }

    async fn complete(
        &self,
        label: &str,
        system: &str,
        messages: &[(String, String)],
    ) -> Result<String> {
        let llm = &self.resources.llm;
        self.resources
            .retry
            .run(label, self.deadline, move || async move {
                let text = llm.complete(system, messages).await?;
                let text = text.trim();
                if text.is_empty() {
                    return Err(AppError::Parse(format!("{} returned an empty response", label)));
                }
                Ok(text.to_string())
            })
            .await
    }

    async fn ask_question(&mut self) -> Result<()> {
        self.check_deadline()?;

        let goals = self.persona.persona();
        let template = render(
            &self.resources.templates.question,
            &[
                ("goals", goals.as_str()),
                ("stop_phrase", self.resources.policy.stop_phrase.as_str()),
            ],
        );
        let system = self
            .resources
            .augmenter
            .build_or_base(&template, agents::ANALYST_QUESTION_GENERATOR)
            .await?;

        let messages = self.conversation(Speaker::Analyst);
        let question = self.complete("question", &system, &messages).await?;
        debug!(persona = %self.persona.id, turn = self.state.turn_count + 1, %question, "Analyst asked");

        self.resources.feedback.submit(
            Observation::new(
                agents::ANALYST_QUESTION_GENERATOR,
                "Generate insightful interview questions",
            )
            .with_task(format!(
                "Interview {} on {}",
                self.persona.affiliation,
                truncate(&goals, 80)
            ))
            .with_output(question.clone())
            .with_metrics(format!(
                "Question generated for {}",
                truncate(&self.persona.focus_area, 60)
            ))
            .with_prompt(system),
        );

        self.state.record(Speaker::Analyst, question, Vec::new());
        Ok(())
    }

    async fn search(&mut self) -> Result<()> {
        self.check_deadline()?;

        let question = self.state.last_question().unwrap_or_default().to_string();
        let searches = self
            .resources
            .backends
            .iter()
            .map(|backend| self.search_backend(backend.as_ref(), &question));
        let outcomes = join_all(searches).await;

        self.turn_sources.clear();
        for outcome in outcomes {
            for result in outcome? {
                self.turn_sources.push(result.source_id.clone());
                if !self.observed.iter().any(|o| o.source_id == result.source_id) {
                    self.observed.push(result);
                }
            }
        }

        debug!(
            persona = %self.persona.id,
            new_sources = self.turn_sources.len(),
            total_sources = self.observed.len(),
            "Search phase finished"
        );
        Ok(())
    }

    /// One backend's contribution to a search phase. Failures of the backend
    /// itself degrade to an empty result set.
    async fn search_backend(
        &self,
        backend: &dyn SearchBackend,
        question: &str,
    ) -> Result<Vec<SearchResult>> {
        let kind = backend.kind();
        let (query, prompt) = self.generate_query(kind, question).await?;

        let timeout = Instant::now() + self.resources.search_timeout;
        let deadline = match self.deadline {
            Some(deadline) => deadline.min(timeout),
            None => timeout,
        };

        let search = backend.search(&query.query_text);
        let results = match tokio::time::timeout_at(deadline, search).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                warn!(
                    persona = %query.persona_id,
                    backend = %kind,
                    error = %e,
                    "Search failed, continuing without results"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    persona = %query.persona_id,
                    backend = %kind,
                    "Search timed out, continuing without results"
                );
                Vec::new()
            }
        };

        let metrics = match kind {
            BackendKind::Web => search_observation(kind.as_str(), &query.query_text, &results),
            BackendKind::Wikipedia => encyclopedia_observation(&query.query_text, &results),
        };
        self.resources.feedback.submit(
            Observation::new(
                prompts::search_agent_id(kind),
                format!("Generate effective {} search queries", kind),
            )
            .with_task(format!("Generate query for: {}", truncate(question, 150)))
            .with_output(query.query_text.clone())
            .with_metrics(metrics)
            .with_prompt(prompt),
        );

        Ok(results)
    }

    /// Ask the LLM for a backend-specific query. Falls back to the raw
    /// question when generation fails for non-fatal reasons.
    async fn generate_query(
        &self,
        backend: BackendKind,
        question: &str,
    ) -> Result<(SearchQuery, String)> {
        let system = self
            .resources
            .augmenter
            .build_or_base(&self.resources.templates.search, prompts::search_agent_id(backend))
            .await?;

        let messages = self.conversation(Speaker::Expert);
        let query_text = match self.complete("search query", &system, &messages).await {
            Ok(text) => clean_query(&text).unwrap_or_else(|| question.to_string()),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(
                    persona = %self.persona.id,
                    backend = %backend,
                    error = %e,
                    "Query generation failed, searching with the question"
                );
                question.to_string()
            }
        };

        Ok((
            SearchQuery {
                backend,
                query_text,
                persona_id: self.persona.id.clone(),
            },
            system,
        ))
    }

    async fn answer(&mut self) -> Result<()> {
        self.check_deadline()?;

        let goals = self.persona.persona();
        let context = format_sources(&self.observed);
        let template = render(
            &self.resources.templates.answer,
            &[("goals", goals.as_str()), ("context", context.as_str())],
        );
        let system = self
            .resources
            .augmenter
            .build_or_base(&template, agents::EXPERT)
            .await?;

        let messages = self.conversation(Speaker::Expert);
        let answer = self.complete("answer", &system, &messages).await?;

        let sources = std::mem::take(&mut self.turn_sources);
        self.state.record(Speaker::Expert, answer, sources);
        debug!(persona = %self.persona.id, turn = self.state.turn_count, "Expert answered");
        Ok(())
    }

    async fn write_section(&self) -> Result<SectionDraft> {
        self.check_deadline()?;

        let template = render(
            &self.resources.templates.section_writer,
            &[("focus", self.persona.focus_area.as_str())],
        );
        let system = self
            .resources
            .augmenter
            .build_or_base(&template, agents::SECTION_WRITER)
            .await?;

        let transcript = if self.state.transcript.is_empty() {
            "(no interview took place)".to_string()
        } else {
            self.state.transcript_text()
        };
        let request = format!(
            "Interview transcript:\n\n{}\n\nUse these sources to write your section:\n\n{}",
            transcript,
            format_sources(&self.observed)
        );
        let body = self
            .complete("section", &system, &[("user".to_string(), request)])
            .await?;

        // The body is renumbered so that `[k]` is `sources[k - 1]`
        let cited: Vec<usize> = extract_citations(&body)
            .into_iter()
            .filter(|n| *n <= self.observed.len())
            .collect();
        let body = renumber_citations(&body, |n| {
            cited.iter().position(|c| *c == n).map(|i| i + 1)
        });
        let sources: Vec<SearchResult> = cited
            .iter()
            .map(|n| self.observed[n - 1].clone())
            .collect();
        let cited_sources: BTreeSet<String> = sources.iter().map(|s| s.source_id.clone()).collect();

        self.resources.feedback.submit(
            Observation::new(
                agents::SECTION_WRITER,
                "Transform interviews into report sections",
            )
            .with_task(format!(
                "Write section on: {}",
                truncate(&self.persona.focus_area, 80)
            ))
            .with_output(truncate(&body, 200))
            .with_metrics(format!(
                "Section: {} chars, {} citations",
                body.chars().count(),
                CITATION.find_iter(&body).count()
            ))
            .with_prompt(system),
        );

        Ok(SectionDraft {
            persona_id: self.persona.id.clone(),
            title: section_title(&body).unwrap_or_else(|| self.persona.focus_area.clone()),
            body,
            cited_sources,
            sources,
            status: DraftStatus::Complete,
        })
    }
}

/// First line of a generated query, stripped of quotes and labels.
fn clean_query(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .strip_prefix("Search query:")
        .or_else(|| line.strip_prefix("Query:"))
        .unwrap_or(line);
    let query = line.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`').trim();
    (!query.is_empty()).then(|| query.to_string())
}

/// Text of the first `## ` heading.
fn section_title(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("## "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
