//! Multi-Analyst Research
//!
//! This module turns a topic into a report by interviewing a panel of
//! simulated analysts in parallel and assembling what they learned.
//!
//! # Architecture
//!
//! - [`analysts::AnalystGenerator`] - Builds the persona panel from the topic
//! - [`interview::InterviewAgent`] - One bounded question/search/answer loop per persona
//! - [`orchestrator::InterviewOrchestrator`] - Fan-out of interviews, fan-in of drafts
//! - [`report::ReportAssembler`] - Introduction, conclusion and merged sources
//! - [`augmenter::PromptAugmenter`] - Appends learned strategic rules to every prompt
//! - [`pipeline::ResearchAssistant`] - Wires the above into a single run
//!
//! # Usage
//!
//! ```ignore
//! use research_panel::research::{ResearchAssistant, ResearchRequest};
//! use research_panel::ResearchConfig;
//!
//! let config = ResearchConfig::load_or_default("research.toml")?;
//! let assistant = ResearchAssistant::from_config(&config).await?;
//!
//! let run = assistant.run(&ResearchRequest::new("renewable energy")).await?;
//! println!("{}", run.markdown());
//! ```
//!
//! # Research Workflow
//!
//! 1. **Panel** - Generate analyst personas, optionally steered by feedback
//! 2. **Interviews** - Each analyst questions the expert, grounded in web and
//!    encyclopedia search
//! 3. **Sections** - Each finished interview becomes a cited section draft
//! 4. **Report** - Introduction and conclusion are written around the sections
//! 5. **Learning** - Observations from every step feed the rule store

/// Analyst panel generation.
pub mod analysts;
/// Strategic-rule prompt augmentation.
pub mod augmenter;
/// Interview state machine and agent.
pub mod interview;
/// Concurrent interview execution.
pub mod orchestrator;
/// End-to-end research runs.
pub mod pipeline;
/// Prompt templates and agent ids.
pub mod prompts;
/// Report assembly and rendering.
pub mod report;

pub use analysts::AnalystGenerator;
pub use augmenter::{augment, PromptAugmenter};
pub use interview::{
    advance, initial_phase, InterviewAgent, InterviewOutcome, InterviewPhase, InterviewResources,
    InterviewState, TurnPolicy,
};
pub use orchestrator::InterviewOrchestrator;
pub use pipeline::{ResearchAssistant, ResearchRequest, ResearchRun};
pub use prompts::PromptTemplates;
pub use report::{render_markdown, ReportAssembler};
