//! Subcommand handlers
//!
//! Each handler takes the loaded configuration plus its own arguments and
//! reports progress through [`Output`].

use crate::cli::output::Output;
use crate::research::{ResearchAssistant, ResearchRequest, ResearchRun};
use crate::rules::{MemoryRuleStore, RuleStore};
use crate::types::{AppError, Result};
use crate::utils::toml_config::{LlmConfig, ResearchConfig};
use std::path::{Path, PathBuf};

/// Arguments of the `run` subcommand.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub topic: String,
    pub analysts: Option<usize>,
    pub max_turns: Option<usize>,
    pub iterations: u32,
    pub feedback: Option<String>,
    pub output: Option<PathBuf>,
}

/// Apply command-line overrides on top of the file configuration.
pub fn apply_overrides(
    config: &mut ResearchConfig,
    analysts: Option<usize>,
    max_turns: Option<usize>,
) -> Result<()> {
    if let Some(n) = analysts {
        if n == 0 {
            return Err(AppError::InvalidInput(
                "--analysts must be at least 1".to_string(),
            ));
        }
        config.interview.max_analysts = n;
    }
    if let Some(turns) = max_turns {
        config.interview.max_turns = turns;
    }
    Ok(())
}

/// Run the research pipeline `iterations` times and emit the last report.
pub async fn run(mut config: ResearchConfig, args: RunArgs, output: &Output) -> Result<()> {
    apply_overrides(&mut config, args.analysts, args.max_turns)?;
    let iterations = args.iterations.max(1);

    output.banner();
    output.kv("Topic", &args.topic);
    output.kv("Model", config.llm.model());
    output.kv("Analysts", &config.interview.max_analysts.to_string());
    output.kv("Max turns", &config.interview.max_turns.to_string());

    let assistant = ResearchAssistant::from_config(&config).await?;
    let mut request = ResearchRequest::new(args.topic.clone());
    if let Some(feedback) = &args.feedback {
        request = request.with_feedback(feedback.clone());
    }

    let mut runs: Vec<ResearchRun> = Vec::with_capacity(iterations as usize);
    for i in 1..=iterations {
        output.step(i, iterations, "Interviewing analysts...");
        let run = assistant.run(&request).await?;

        output.success(&format!(
            "{} sections, {} sources, {} rules learned",
            run.report.sections.len(),
            run.report.sources.len(),
            run.rules_learned()
        ));
        if run.escalations > 0 {
            output.warning(&format!(
                "{} interview(s) ended without a complete section",
                run.escalations
            ));
        }
        runs.push(run);
    }

    if iterations > 1 {
        print_learning_summary(&runs, output);
    }

    let Some(last) = runs.last() else {
        return Ok(());
    };
    let markdown = last.markdown();
    match &args.output {
        Some(path) => {
            write_report(path, &markdown).await?;
            output.success(&format!("Report written to {}", path.display()));
        }
        None => output.document(&markdown),
    }

    Ok(())
}

fn print_learning_summary(runs: &[ResearchRun], output: &Output) {
    output.header("Learning Summary");
    output.table_header(&["Iteration", "Rules", "Escalated", "Duration"]);
    for (i, run) in runs.iter().enumerate() {
        output.table_row(&[
            &(i + 1).to_string(),
            &format!("{} -> {}", run.rules_before, run.rules_after),
            &run.escalations.to_string(),
            &format!("{:.1}s", run.duration.as_secs_f64()),
        ]);
    }

    let first = runs.first().map(|r| r.rules_before).unwrap_or(0);
    let last = runs.last().map(|r| r.rules_after).unwrap_or(0);
    output.kv("Total rules learned", &last.saturating_sub(first).to_string());
}

async fn write_report(path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, markdown).await?;
    Ok(())
}

/// Generate and print the analyst panel without running interviews.
pub async fn analysts(
    mut config: ResearchConfig,
    topic: &str,
    count: Option<usize>,
    feedback: Option<&str>,
    output: &Output,
) -> Result<()> {
    apply_overrides(&mut config, count, None)?;
    let assistant = ResearchAssistant::from_config(&config).await?;
    let personas = assistant.generate_analysts(topic, feedback).await?;

    output.header(&format!("Analysts for \"{}\"", topic));
    for persona in &personas {
        output.subheader(&persona.name);
        output.kv("Id", &persona.id);
        output.kv("Role", &persona.role);
        output.kv("Affiliation", &persona.affiliation);
        output.kv("Focus", &persona.focus_area);
    }
    if personas.is_empty() {
        output.warning("No analysts were generated");
    }
    Ok(())
}

fn open_store(config: &ResearchConfig) -> Result<MemoryRuleStore> {
    MemoryRuleStore::open(&config.rules.data_path)
}

/// List learned rules, optionally for one agent.
pub async fn rules_list(
    config: &ResearchConfig,
    agent: Option<&str>,
    output: &Output,
) -> Result<()> {
    let store = open_store(config)?;
    let mut rules = store.all_rules().await?;
    if let Some(agent) = agent {
        rules.retain(|r| r.agent_id == agent);
    }

    if rules.is_empty() {
        output.info("No strategic rules learned yet");
        output.hint("Rules are synthesized after each `research-panel run`");
        return Ok(());
    }

    let mut current: Option<&str> = None;
    for rule in &rules {
        if current != Some(rule.agent_id.as_str()) {
            output.subheader(&rule.agent_id);
            current = Some(rule.agent_id.as_str());
        }
        output.list_item(&format!(
            "{} (confidence {:.2}, {})",
            rule.rule_text,
            rule.confidence,
            rule.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    output.newline();
    output.info(&format!("{} rule(s)", rules.len()));
    Ok(())
}

/// Delete every learned rule from the configured data path.
pub async fn rules_clear(config: &ResearchConfig, output: &Output) -> Result<()> {
    let store = open_store(config)?;
    let removed = store.clear().await?;
    output.success(&format!(
        "Removed {} rule(s) from {}",
        removed, config.rules.data_path
    ));
    Ok(())
}

/// Show the effective configuration, optionally validating it.
pub fn show_config(
    config: &ResearchConfig,
    path: &Path,
    validate: bool,
    output: &Output,
) -> Result<()> {
    output.header("Configuration");
    if path.exists() {
        output.kv("File", &path.display().to_string());
    } else {
        output.kv("File", &format!("{} (not found, using defaults)", path.display()));
    }

    output.subheader("LLM");
    match &config.llm {
        LlmConfig::OpenAI {
            api_key_env,
            api_base,
            model,
        } => {
            output.kv("Provider", "openai");
            output.kv("Model", model);
            output.kv("API key env", api_key_env);
            output.kv("API base", api_base);
        }
        LlmConfig::Ollama { base_url, model } => {
            output.kv("Provider", "ollama");
            output.kv("Model", model);
            output.kv("Base URL", base_url);
        }
    }

    output.subheader("Interview");
    let interview = &config.interview;
    output.kv("Max analysts", &interview.max_analysts.to_string());
    output.kv("Max turns", &interview.max_turns.to_string());
    output.kv("Stop phrase", &interview.stop_phrase);
    output.kv("Concurrency", &interview.max_concurrent_interviews.to_string());
    output.kv("Run timeout", &format!("{}s", interview.run_timeout_secs));
    output.kv("Require all", &interview.require_all.to_string());

    output.subheader("Search");
    output.kv("Web", &backend_summary(config.search.web.enabled, config.search.web.max_results));
    output.kv(
        "Wikipedia",
        &backend_summary(
            config.search.wikipedia.enabled,
            config.search.wikipedia.max_results,
        ),
    );

    output.subheader("Rules");
    output.kv("Enabled", &config.rules.enabled.to_string());
    output.kv("Data path", &config.rules.data_path);
    output.kv(
        "Max rules per agent",
        &config.rules.max_rules_per_agent.to_string(),
    );

    if validate {
        output.newline();
        config.validate()?;
        output.success("Configuration is valid");
    }
    Ok(())
}

fn backend_summary(enabled: bool, max_results: usize) -> String {
    if enabled {
        format!("enabled ({} results)", max_results)
    } else {
        "disabled".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_apply_overrides() {
        let mut config = ResearchConfig::default();
        apply_overrides(&mut config, Some(5), Some(0)).unwrap();
        assert_eq!(config.interview.max_analysts, 5);
        assert_eq!(config.interview.max_turns, 0);

        let untouched = ResearchConfig::default();
        let mut config = ResearchConfig::default();
        apply_overrides(&mut config, None, None).unwrap();
        assert_eq!(config.interview.max_analysts, untouched.interview.max_analysts);
    }

    #[test]
    fn test_zero_analysts_rejected() {
        let mut config = ResearchConfig::default();
        let err = apply_overrides(&mut config, Some(0), None).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_backend_summary() {
        assert_eq!(backend_summary(true, 3), "enabled (3 results)");
        assert_eq!(backend_summary(false, 3), "disabled");
    }

    #[tokio::test]
    async fn test_write_report_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("report.md");
        write_report(&path, "# Report").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report");
    }

    #[tokio::test]
    async fn test_rules_list_and_clear_on_empty_store() {
        let dir = TempDir::new().unwrap();
        let mut config = ResearchConfig::default();
        config.rules.data_path = dir.path().to_string_lossy().to_string();
        let output = Output::no_color();

        rules_list(&config, None, &output).await.unwrap();
        rules_clear(&config, &output).await.unwrap();
    }

    #[test]
    fn test_config_display_without_validation() {
        let config = ResearchConfig::default();
        show_config(&config, Path::new("missing.toml"), false, &Output::no_color()).unwrap();
    }
}
