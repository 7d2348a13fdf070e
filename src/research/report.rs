//! Report assembly
//!
//! The assembler adds an introduction and a conclusion around the section
//! drafts. Both passes see every section and run concurrently. Sections keep
//! their order. Sources are merged across sections with the first occurrence
//! of each source id winning, and each section's `[k]` markers are rewritten
//! to positions in the merged list.

use crate::llm::{LLMClient, RetryPolicy};
use crate::research::augmenter::PromptAugmenter;
use crate::research::interview::renumber_citations;
use crate::research::prompts::{agents, render};
use crate::types::{AppError, Report, Result, SearchResult, SectionDraft};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct ReportAssembler {
    llm: Arc<dyn LLMClient>,
    augmenter: PromptAugmenter,
    template: String,
    retry: RetryPolicy,
}

impl ReportAssembler {
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

    pub async fn assemble(&self, topic: &str, mut sections: Vec<SectionDraft>) -> Result<Report> {
        if sections.is_empty() {
            return Err(AppError::Assembly("No sections to assemble".to_string()));
        }

        let sources = merge_sources(&sections);
        renumber_sections(&mut sections, &sources);

        let formatted = format_sections(&sections);
        let (introduction, conclusion) = tokio::join!(
            self.write_part(topic, &formatted, "introduction"),
            self.write_part(topic, &formatted, "conclusion"),
        );

        let report = Report {
            topic: topic.to_string(),
            introduction: introduction?,
            conclusion: conclusion?,
            sources,
            sections,
        };

        tracing::info!(
            topic,
            sections = report.sections.len(),
            sources = report.sources.len(),
            "Report assembled"
        );
        Ok(report)
    }

    async fn write_part(&self, topic: &str, sections: &str, part: &str) -> Result<String> {
        let template = render(
            &self.template,
            &[("topic", topic), ("part", part), ("sections", sections)],
        );
        let system = self
            .augmenter
            .build_or_base(&template, agents::REPORT_WRITER)
            .await?;
        let instruction = format!("Write the report {}", part);

        let llm = &self.llm;
        let system = &system;
        let instruction = &instruction;
        self.retry
            .run(part, None, move || async move {
                let text = llm.generate_with_system(system, instruction).await?;
                let text = text.trim();
                if text.is_empty() {
                    return Err(AppError::Parse(format!("Empty {}", part)));
                }
                Ok(text.to_string())
            })
            .await
            .map_err(|e| {
                if e.is_fatal() {
                    e
                } else {
                    AppError::Assembly(format!("Could not write the {}: {}", part, e))
                }
            })
    }
}

fn format_sections(sections: &[SectionDraft]) -> String {
    sections
        .iter()
        .filter(|s| !s.body.trim().is_empty())
        .map(|s| s.body.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// All cited sources across sections, deduplicated by source id. The first
/// section to cite a source decides its position.
pub fn merge_sources(sections: &[SectionDraft]) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    sections
        .iter()
        .flat_map(|s| s.sources.iter())
        .filter(|source| seen.insert(source.source_id.clone()))
        .cloned()
        .collect()
}

/// Rewrite section-local `[k]` markers (pointing into `section.sources`) to
/// 1-based positions in the merged `sources` list.
fn renumber_sections(sections: &mut [SectionDraft], sources: &[SearchResult]) {
    let position: HashMap<&str, usize> = sources
        .iter()
        .enumerate()
        .map(|(i, s)| (s.source_id.as_str(), i + 1))
        .collect();

    for section in sections.iter_mut() {
        let body = renumber_citations(&section.body, |k| {
            let local = section.sources.get(k.checked_sub(1)?)?;
            position.get(local.source_id.as_str()).copied()
        });
        section.body = body;
    }
}

/// Plain markdown rendering of a report.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(report.introduction.trim());
    out.push_str("\n\n---\n\n");

    for section in &report.sections {
        if section.is_escalated() {
            out.push_str(&format!("## {}\n\n_This interview could not be completed._\n\n", section.title));
        } else {
            out.push_str(section.body.trim());
            out.push_str("\n\n");
        }
    }

    out.push_str("---\n\n");
    out.push_str(report.conclusion.trim());

    if !report.sources.is_empty() {
        out.push_str("\n\n## Sources\n");
        for (i, source) in report.sources.iter().enumerate() {
            out.push_str(&format!("\n[{}] {} - {}", i + 1, source.title, source.url));
        }
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DraftStatus;
    use std::collections::BTreeSet;

    fn source(id: &str) -> SearchResult {
        SearchResult {
            source_id: id.to_string(),
            url: format!("https://{}.example", id),
            title: id.to_uppercase(),
            snippet: String::new(),
            authority_score: None,
        }
    }

    fn draft(persona: &str, sources: &[&str]) -> SectionDraft {
        let sources: Vec<SearchResult> = sources.iter().map(|s| source(s)).collect();
        SectionDraft {
            persona_id: persona.to_string(),
            title: format!("Section {}", persona),
            body: format!("## Section {}\n\nBody [1]", persona),
            cited_sources: sources.iter().map(|s| s.source_id.clone()).collect::<BTreeSet<_>>(),
            sources,
            status: DraftStatus::Complete,
        }
    }

    #[test]
    fn test_merge_sources_first_seen_wins() {
        let sections = vec![draft("a", &["x", "y"]), draft("b", &["y", "z"]), draft("c", &["x"])];
        let ids: Vec<String> = merge_sources(&sections)
            .into_iter()
            .map(|s| s.source_id)
            .collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_format_sections_skips_empty_bodies() {
        let mut empty = draft("b", &[]);
        empty.body = String::new();
        let text = format_sections(&[draft("a", &[]), empty, draft("c", &[])]);
        assert!(text.contains("Section a"));
        assert!(text.contains("Section c"));
        assert!(!text.contains("Section b"));
    }

    #[test]
    fn test_renumber_sections_to_merged_positions() {
        let mut a = draft("a", &["x", "y"]);
        a.body = "## A\n\nFirst [1]. Second [2]. Stray [3].".into();
        let mut b = draft("b", &["z", "y"]);
        b.body = "## B\n\nOnly z [1] and y [2].".into();
        let mut sections = vec![a, b];

        let sources = merge_sources(&sections);
        renumber_sections(&mut sections, &sources);

        assert_eq!(sections[0].body, "## A\n\nFirst [1]. Second [2]. Stray.");
        assert_eq!(sections[1].body, "## B\n\nOnly z [3] and y [2].");
        let ids: Vec<&str> = sources.iter().map(|s| s.source_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_render_markdown_layout() {
        let mut escalated = draft("b", &[]);
        escalated.status = DraftStatus::Escalated {
            reason: "deadline".into(),
        };
        let report = Report {
            topic: "t".into(),
            introduction: "# Title\n\n## Introduction\n\nIntro".into(),
            sections: vec![draft("a", &["x"]), escalated],
            conclusion: "## Conclusion\n\nDone".into(),
            sources: vec![source("x")],
        };

        let md = render_markdown(&report);
        let intro = md.find("## Introduction").unwrap();
        let section = md.find("## Section a").unwrap();
        let conclusion = md.find("## Conclusion").unwrap();
        assert!(intro < section && section < conclusion);
        assert!(md.contains("_This interview could not be completed._"));
        assert!(md.contains("[1] X - https://x.example"));
    }
}
