//! CLI module for research-panel
//!
//! Provides command-line interface parsing and handling for the
//! research-panel binary. Uses clap for argument parsing and owo-colors for
//! colored terminal output.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// research-panel - Multi-Analyst Research Assistant
///
/// Interviews a panel of simulated analysts in parallel and assembles a cited
/// report, learning strategic prompt rules across runs.
#[derive(Parser, Debug)]
#[command(
    name = "research-panel",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Multi-analyst research assistant with prompt-rule learning",
    long_about = "Generates a panel of analyst personas for a topic, runs one expert interview\n\
                  per analyst concurrently (grounded in web and Wikipedia search), and assembles\n\
                  the resulting sections into a report. Every prompt carries strategic rules\n\
                  learned from earlier runs.",
    after_help = "EXAMPLES:\n    \
                  research-panel run --topic \"renewable energy\"            # One research run\n    \
                  research-panel run --topic \"grid storage\" --iterations 3 # Show learning across runs\n    \
                  research-panel analysts --topic \"urban heat\"            # Preview the analyst panel\n    \
                  research-panel rules list                               # Inspect learned rules\n    \
                  research-panel config --validate                        # Check research.toml"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "research.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full research pipeline
    ///
    /// Repeating the run with --iterations shows how learned rules change
    /// later runs. The report of the last iteration is printed.
    Run {
        /// Research topic
        #[arg(short, long)]
        topic: String,

        /// Number of analysts (overrides config)
        #[arg(short, long)]
        analysts: Option<usize>,

        /// Expert answers per interview (overrides config)
        #[arg(short, long)]
        max_turns: Option<usize>,

        /// Number of consecutive runs
        #[arg(short, long, default_value = "1")]
        iterations: u32,

        /// Editorial feedback for analyst generation
        #[arg(short, long)]
        feedback: Option<String>,

        /// Write the final report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate and print the analyst panel only
    Analysts {
        /// Research topic
        #[arg(short, long)]
        topic: String,

        /// Number of analysts (overrides config)
        #[arg(short, long)]
        analysts: Option<usize>,

        /// Editorial feedback for analyst generation
        #[arg(short, long)]
        feedback: Option<String>,
    },

    /// Inspect or reset learned strategic rules
    #[command(subcommand)]
    Rules(RuleCommands),

    /// Show configuration information
    Config {
        /// Validate the configuration, including environment variables
        #[arg(long)]
        validate: bool,
    },
}

/// Rule store subcommands
#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// List learned rules
    List {
        /// Only show rules for this agent id
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// Delete all learned rules
    Clear,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "research-panel",
            "run",
            "--topic",
            "renewable energy",
            "--iterations",
            "3",
            "--max-turns",
            "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                topic,
                iterations,
                max_turns,
                analysts,
                ..
            } => {
                assert_eq!(topic, "renewable energy");
                assert_eq!(iterations, 3);
                assert_eq!(max_turns, Some(4));
                assert_eq!(analysts, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("research.toml"));
    }

    #[test]
    fn test_parse_rules_list_with_global_flags() {
        let cli = Cli::try_parse_from([
            "research-panel",
            "rules",
            "list",
            "--agent",
            "section_writer",
            "--no-color",
            "-c",
            "custom.toml",
        ])
        .unwrap();

        assert!(cli.no_color);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert!(matches!(
            cli.command,
            Commands::Rules(RuleCommands::List { agent: Some(ref a) }) if a == "section_writer"
        ));
    }

    #[test]
    fn test_run_requires_topic() {
        assert!(Cli::try_parse_from(["research-panel", "run"]).is_err());
    }
}
