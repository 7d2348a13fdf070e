//! Prompt templates and agent identifiers
//!
//! Templates use `{name}` placeholders filled by [`render`]. Every template
//! can be overridden from the `[prompts]` config section.

use crate::types::BackendKind;
use crate::utils::toml_config::PromptsConfig;

/// Agent ids the rule store keys strategic rules by.
pub mod agents {
    pub const ANALYST_QUESTION_GENERATOR: &str = "analyst_question_generator";
    pub const SEARCH_QUERY_GENERATOR_WEB: &str = "search_query_generator_web";
    pub const SEARCH_QUERY_GENERATOR_WIKIPEDIA: &str = "search_query_generator_wikipedia";
    pub const SECTION_WRITER: &str = "section_writer";
    pub const RESEARCH_COORDINATOR: &str = "research_coordinator";
    pub const ANALYST_GENERATOR: &str = "analyst_generator";
    pub const EXPERT: &str = "expert";
    pub const REPORT_WRITER: &str = "report_writer";
}

/// Agent id for a backend's query generator
pub fn search_agent_id(backend: BackendKind) -> &'static str {
    match backend {
        BackendKind::Web => agents::SEARCH_QUERY_GENERATOR_WEB,
        BackendKind::Wikipedia => agents::SEARCH_QUERY_GENERATOR_WIKIPEDIA,
    }
}

pub const ANALYST_INSTRUCTIONS: &str = r#"You are tasked with creating a set of AI analyst personas. Follow these instructions carefully:

1. First, review the research topic:
{topic}

2. Examine any editorial feedback that has been optionally provided to guide creation of the analysts:
{feedback}

3. Determine the most interesting themes based upon the documents and / or feedback above.

4. Pick the top {max_analysts} themes.

5. Assign one analyst to each theme.

Respond with a JSON array only, one object per analyst:
[{"name": "...", "affiliation": "...", "role": "...", "description": "focus, concerns and motives"}]"#;

pub const QUESTION_INSTRUCTIONS: &str = r#"You are an analyst tasked with interviewing an expert to learn about a specific topic.

Your goal is boil down to interesting and specific insights related to your topic.

1. Interesting: Insights that people will find surprising or non-obvious.

2. Specific: Insights that avoid generalities and include specific examples from the expert.

Here is your topic of focus and set of goals:
{goals}

Begin by introducing yourself using a name that fits your persona, and then ask your question.

Continue to ask questions to drill down and refine your understanding of the topic.

When you are satisfied with your understanding, complete the interview with: "{stop_phrase}"

Remember to stay in character throughout your response, reflecting the persona and goals provided to you."#;

pub const SEARCH_INSTRUCTIONS: &str = r#"You will be given a conversation between an analyst and an expert.

Your goal is to generate a well-structured query for use in retrieval and / or web-search related to the conversation.

First, analyze the full conversation.

Pay particular attention to the final question posed by the analyst.

Convert this final question into a well-structured search query.

Respond with the search query only, on a single line."#;

pub const ANSWER_INSTRUCTIONS: &str = r#"You are an expert being interviewed by an analyst.

Here is analyst area of focus:
{goals}

Your goal is to answer a question posed by the interviewer.

To answer the question, use this context:

{context}

When answering questions, follow these guidelines:

1. Use only the information provided in the context.

2. Do not introduce external information or make assumptions beyond what is explicitly stated in the context.

3. The context contains sources, each numbered like [1].

4. Include these sources in your answer next to any relevant statements. For example, for source # 1 use [1].

5. If the context is empty, say that you could not find sources and answer cautiously."#;

pub const SECTION_WRITER_INSTRUCTIONS: &str = r#"You are an expert technical writer.

Your task is to create a short, easily digestible section of a report based on a set of source documents.

1. Analyze the content of the source documents. Each source is numbered like [1].

2. Create a report structure using markdown formatting:
- Use ## for the section title
- Use ### for sub-section headers

3. Write the report following this structure:
a. Title (## header)
b. Summary (### header)

4. Make your title engaging based upon the focus area of the analyst:
{focus}

5. For the summary section:
- Set up summary with general background / context related to the focus area of the analyst
- Emphasize what is novel, interesting, or surprising about insights gathered from the interview
- Cite sources inline using their numbers, e.g. [1], [2]
- Aim for approximately 400 words maximum

6. Never cite a number that is not in the source list. Do not write a sources list; it is added for you."#;

pub const INTRO_CONCLUSION_INSTRUCTIONS: &str = r#"You are a technical writer finishing a report on {topic}.

You will be given all of the sections of the report.

Your job is to write a crisp and compelling {part} section.

The user will instruct you whether to write the introduction or conclusion.

Include no pre-amble for either section.

Target around 100 words, crisply previewing (for introduction) or recapping (for conclusion) all of the sections of the report.

Use markdown formatting.

For your introduction, create a compelling title and use the # header for the title.

For your introduction, use ## Introduction as the section header.

For your conclusion, use ## Conclusion as the section header.

Here are the sections to reflect on for writing: {sections}"#;

/// Substitute `{key}` placeholders. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}

/// The full template set an interview run uses.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub analysts: String,
    pub question: String,
    pub search: String,
    pub answer: String,
    pub section_writer: String,
    pub intro_conclusion: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            analysts: ANALYST_INSTRUCTIONS.to_string(),
            question: QUESTION_INSTRUCTIONS.to_string(),
            search: SEARCH_INSTRUCTIONS.to_string(),
            answer: ANSWER_INSTRUCTIONS.to_string(),
            section_writer: SECTION_WRITER_INSTRUCTIONS.to_string(),
            intro_conclusion: INTRO_CONCLUSION_INSTRUCTIONS.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Defaults with any configured overrides applied.
    pub fn from_config(config: &PromptsConfig) -> Self {
        let defaults = Self::default();
        let pick = |custom: &Option<String>, default: String| custom.clone().unwrap_or(default);
        Self {
            analysts: pick(&config.analysts, defaults.analysts),
            question: pick(&config.question, defaults.question),
            search: pick(&config.search, defaults.search),
            answer: pick(&config.answer, defaults.answer),
            section_writer: pick(&config.section_writer, defaults.section_writer),
            intro_conclusion: pick(&config.intro_conclusion, defaults.intro_conclusion),
        }
    }
}
