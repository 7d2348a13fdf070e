use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============= Persona Types =============

/// A simulated analyst with a fixed focus area. One persona drives exactly
/// one interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystPersona {
    pub id: String,
    pub name: String,
    pub affiliation: String,
    pub role: String,
    pub focus_area: String,
}

impl AnalystPersona {
    /// Multi-line persona block injected into question and answer prompts.
    pub fn persona(&self) -> String {
        format!(
            "Name: {}\nRole: {}\nAffiliation: {}\nDescription: {}\n",
            self.name, self.role, self.affiliation, self.focus_area
        )
    }
}

// ============= Interview Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Analyst,
    Expert,
}

impl Speaker {
    /// Chat role used when replaying the transcript to the LLM. The roles
    /// flip depending on which side of the interview is being generated.
    pub fn chat_role(&self, generating_for: Speaker) -> &'static str {
        if *self == generating_for {
            "assistant"
        } else {
            "user"
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Analyst => write!(f, "analyst"),
            Speaker::Expert => write!(f, "expert"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub message: String,
    /// Source ids the entry was conditioned on (expert answers only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

// ============= Search Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Web,
    Wikipedia,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Web => "web",
            BackendKind::Wikipedia => "wikipedia",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub backend: BackendKind,
    pub query_text: String,
    pub persona_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub source_id: String,
    pub url: String,
    pub title: String,
    pub snippet: String,
    /// Source authority on a 0-10 scale, when assessed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_score: Option<u8>,
}

// ============= Rule Types =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicRule {
    pub agent_id: String,
    pub rule_text: String,
    pub rationale: String,
    pub confidence: f32,
    pub created_at: DateTime<Utc>,
}

// ============= Report Types =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DraftStatus {
    Complete,
    /// The interview was force-terminated (retry exhaustion or deadline)
    Escalated { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDraft {
    pub persona_id: String,
    pub title: String,
    pub body: String,
    pub cited_sources: BTreeSet<String>,
    /// The search results behind `cited_sources`, in first-citation order
    pub sources: Vec<SearchResult>,
    pub status: DraftStatus,
}

impl SectionDraft {
    /// Placeholder for an interview that was force-terminated. Carries no
    /// body and no citations.
    pub fn escalated(persona: &AnalystPersona, reason: impl Into<String>) -> Self {
        Self {
            persona_id: persona.id.clone(),
            title: format!("{} (interview incomplete)", persona.name),
            body: String::new(),
            cited_sources: BTreeSet::new(),
            sources: Vec::new(),
            status: DraftStatus::Escalated {
                reason: reason.into(),
            },
        }
    }

    pub fn is_escalated(&self) -> bool {
        matches!(self.status, DraftStatus::Escalated { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub topic: String,
    pub introduction: String,
    pub sections: Vec<SectionDraft>,
    pub conclusion: String,
    pub sources: Vec<SearchResult>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Assembly error: {0}")]
    Assembly(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a failed call is worth repeating. Malformed LLM output is
    /// retried too since a second sample usually parses.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transport(_) | AppError::Parse(_))
    }

    /// Errors that must abort the whole run instead of degrading locally.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Configuration(_) | AppError::Assembly(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
