//! research-panel CLI entry point
//!
//! - `research-panel run --topic <topic>` - Full research run
//! - `research-panel analysts --topic <topic>` - Preview the analyst panel
//! - `research-panel rules list|clear` - Inspect or reset learned rules
//! - `research-panel config [--validate]` - Show configuration

use research_panel::cli::commands::{self, RunArgs};
use research_panel::cli::output::Output;
use research_panel::cli::{Cli, Commands, RuleCommands};
use research_panel::utils::toml_config::{ConfigSource, LoggingConfig};
use research_panel::ResearchConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        output.error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<()> {
    let (config, source) = ResearchConfig::load_with_source(&cli.config)?;
    init_tracing(&config.logging, cli.verbose)?;
    if source == ConfigSource::Defaults {
        output.warning(&format!(
            "No {} found, using built-in defaults",
            cli.config.display()
        ));
    }

    match cli.command {
        Commands::Run {
            topic,
            analysts,
            max_turns,
            iterations,
            feedback,
            output: report_path,
        } => {
            let args = RunArgs {
                topic,
                analysts,
                max_turns,
                iterations,
                feedback,
                output: report_path,
            };
            commands::run(config, args, output).await?;
        }
        Commands::Analysts {
            topic,
            analysts,
            feedback,
        } => {
            commands::analysts(config, &topic, analysts, feedback.as_deref(), output).await?;
        }
        Commands::Rules(RuleCommands::List { agent }) => {
            commands::rules_list(&config, agent.as_deref(), output).await?;
        }
        Commands::Rules(RuleCommands::Clear) => {
            commands::rules_clear(&config, output).await?;
        }
        Commands::Config { validate } => {
            commands::show_config(&config, &cli.config, validate, output)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins, then `--verbose`, then the `[logging]` level.
fn init_tracing(logging: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let json = logging.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text = (!logging.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
