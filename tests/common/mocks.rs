//! Mock implementations for testing.
//!
//! Scripted LLM clients and search backends shared by the integration tests,
//! so no test depends on a live model or network.

use async_trait::async_trait;
use parking_lot::Mutex;
use research_panel::llm::LLMClient;
use research_panel::tools::SearchBackend;
use research_panel::types::{
    AnalystPersona, AppError, BackendKind, Result, SearchResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Which research step a system prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Analysts,
    Question,
    SearchQuery,
    Answer,
    Section,
    IntroConclusion,
    RuleSynthesis,
    Other,
}

impl PromptKind {
    /// Classify a system prompt by the wording of the built-in templates.
    pub fn of(system: &str) -> Self {
        if system.contains("creating a set of AI analyst personas") {
            PromptKind::Analysts
        } else if system.contains("You are an analyst tasked with interviewing") {
            PromptKind::Question
        } else if system.contains("well-structured query") {
            PromptKind::SearchQuery
        } else if system.contains("You are an expert being interviewed") {
            PromptKind::Answer
        } else if system.contains("You are an expert technical writer") {
            PromptKind::Section
        } else if system.contains("You are a technical writer finishing a report") {
            PromptKind::IntroConclusion
        } else if system.contains("You improve the instructions of an AI agent") {
            PromptKind::RuleSynthesis
        } else {
            PromptKind::Other
        }
    }
}

/// Mock LLM client that answers every research step with canned text.
///
/// The analyst asks `stop_at - 1` ordinary questions and then the stop
/// phrase. Questions name the asking persona and search queries repeat the
/// latest question, so a [`MockSearch::keyed`] backend can serve each
/// persona its own results. Personas listed in `failing_personas` get a transport error on
/// every prompt that carries their persona block.
pub struct MockLLMClient {
    analysts_json: String,
    stop_at: Option<usize>,
    stop_phrase: String,
    section_body: String,
    rule_json: String,
    failing_personas: Vec<String>,
    fail_all: bool,
    delay: Duration,
    calls: Mutex<HashMap<PromptKind, usize>>,
    /// Every system prompt received, in call order
    pub systems: Mutex<Vec<String>>,
}

impl Default for MockLLMClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLLMClient {
    pub fn new() -> Self {
        Self {
            analysts_json: analysts_json(&[
                ("Ada", "Grid storage economics"),
                ("Ben", "Community solar adoption"),
            ]),
            stop_at: None,
            stop_phrase: "Thank you so much for your help!".to_string(),
            section_body: "## Findings\n### Summary\nCosts are falling [1].".to_string(),
            rule_json: r#"{"rule": null, "rationale": "nothing to learn", "confidence": 0.0}"#
                .to_string(),
            failing_personas: Vec::new(),
            fail_all: false,
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            systems: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub fn with_analysts(mut self, analysts: &[(&str, &str)]) -> Self {
        self.analysts_json = analysts_json(analysts);
        self
    }

    /// Ask the stop phrase as question number `turn` (1-based).
    pub fn with_stop_at(mut self, turn: usize) -> Self {
        self.stop_at = Some(turn);
        self
    }

    pub fn with_section_body(mut self, body: &str) -> Self {
        self.section_body = body.to_string();
        self
    }

    /// Synthesize this rule for every observation.
    pub fn with_rule(mut self, rule: &str) -> Self {
        self.rule_json = serde_json::json!({
            "rule": rule,
            "rationale": "observed in tests",
            "confidence": 0.9
        })
        .to_string();
        self
    }

    pub fn failing_for(mut self, persona_name: &str) -> Self {
        self.failing_personas.push(persona_name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self, kind: PromptKind) -> usize {
        self.calls.lock().get(&kind).copied().unwrap_or(0)
    }

    fn respond(
        &self,
        system: &str,
        prompt: &str,
        messages: &[(String, String)],
    ) -> Result<String> {
        let kind = PromptKind::of(system);
        *self.calls.lock().entry(kind).or_insert(0) += 1;
        self.systems.lock().push(system.to_string());

        if self.fail_all {
            return Err(AppError::Transport("Mock LLM failure".to_string()));
        }
        if self
            .failing_personas
            .iter()
            .any(|name| system.contains(&format!("Name: {}\n", name)))
        {
            return Err(AppError::Transport("Mock LLM failure for persona".to_string()));
        }

        let text = match kind {
            PromptKind::Analysts => self.analysts_json.clone(),
            PromptKind::Question => {
                let turn = messages.iter().filter(|(role, _)| role == "assistant").count() + 1;
                if self.stop_at == Some(turn) {
                    self.stop_phrase.clone()
                } else {
                    match persona_name(system) {
                        Some(name) => format!("{} asks {}: what changed recently?", name, turn),
                        None => format!("Question {}: what changed recently?", turn),
                    }
                }
            }
            PromptKind::SearchQuery => messages
                .iter()
                .rev()
                .find(|(role, _)| role == "user")
                .map(|(_, question)| question.clone())
                .unwrap_or_else(|| "renewable energy trends".to_string()),
            PromptKind::Answer => "Prices dropped sharply [1].".to_string(),
            PromptKind::Section => self.section_body.clone(),
            PromptKind::IntroConclusion => {
                if prompt.contains("introduction") {
                    "# Report\n## Introduction\nAn overview.".to_string()
                } else {
                    "## Conclusion\nA recap.".to_string()
                }
            }
            PromptKind::RuleSynthesis => self.rule_json.clone(),
            PromptKind::Other => "ok".to_string(),
        };
        Ok(text)
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.respond(system, prompt, &[])
    }

    async fn complete(&self, system: &str, messages: &[(String, String)]) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.respond(system, "", messages)
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// The `Name:` line of the persona block in a system prompt.
fn persona_name(system: &str) -> Option<&str> {
    let start = system.find("Name: ")? + "Name: ".len();
    let rest = &system[start..];
    Some(rest.split('\n').next().unwrap_or(rest).trim())
}

fn analysts_json(analysts: &[(&str, &str)]) -> String {
    let list: Vec<serde_json::Value> = analysts
        .iter()
        .map(|(name, focus)| {
            serde_json::json!({
                "name": name,
                "affiliation": "Test Institute",
                "role": "Analyst",
                "description": focus,
            })
        })
        .collect();
    serde_json::Value::Array(list).to_string()
}

/// Persona with a predictable id and name.
pub fn persona(id: &str, name: &str) -> AnalystPersona {
    AnalystPersona {
        id: id.to_string(),
        name: name.to_string(),
        affiliation: "Test Institute".to_string(),
        role: "Analyst".to_string(),
        focus_area: format!("{} focus", name),
    }
}

pub fn result(source_id: &str, title: &str) -> SearchResult {
    SearchResult {
        source_id: source_id.to_string(),
        url: source_id.to_string(),
        title: title.to_string(),
        snippet: format!("Snippet about {}", title),
        authority_score: None,
    }
}

/// Search backend with canned results. Keyed entries win when their key
/// occurs in the query; otherwise every query gets `results`.
pub struct MockSearch {
    kind: BackendKind,
    results: Vec<SearchResult>,
    keyed: Vec<(String, Vec<SearchResult>)>,
    fail: bool,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl MockSearch {
    pub fn empty(kind: BackendKind) -> Self {
        Self::with_results(kind, Vec::new())
    }

    pub fn with_results(kind: BackendKind, results: Vec<SearchResult>) -> Self {
        Self {
            kind,
            results,
            keyed: Vec::new(),
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Results chosen by a substring of the query, e.g. a persona name.
    pub fn keyed(kind: BackendKind, keyed: Vec<(&str, Vec<SearchResult>)>) -> Self {
        Self {
            keyed: keyed
                .into_iter()
                .map(|(key, results)| (key.to_string(), results))
                .collect(),
            ..Self::empty(kind)
        }
    }

    pub fn failing(kind: BackendKind) -> Self {
        Self {
            fail: true,
            ..Self::empty(kind)
        }
    }

    pub fn slow(kind: BackendKind, delay: Duration, results: Vec<SearchResult>) -> Self {
        Self {
            delay,
            ..Self::with_results(kind, results)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for MockSearch {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(AppError::Transport("Mock search failure".to_string()));
        }
        let results = self
            .keyed
            .iter()
            .find(|(key, _)| query.contains(key.as_str()))
            .map(|(_, results)| results)
            .unwrap_or(&self.results);
        Ok(results.clone())
    }
}
