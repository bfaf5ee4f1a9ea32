//! bdictl - BDI symptom analysis from the command line
//!
//! Sends the user's text to a local Ollama model once per BDI symptom and
//! prints the per-symptom levels and the overall score.

use anyhow::{Context, Result};
use bdi_common::{BdiConfig, CancelToken};
use bdictl::commands::{self, AnalyzeOptions, InputSource, ModelOverrides};
use bdictl::errors::{EXIT_CANCELLED, EXIT_GENERAL_ERROR};
use bdictl::logging;
use bdictl::output::Style;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bdictl")]
#[command(about = "Beck Depression Inventory symptom analysis using a local LLM", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ModelArgs {
    /// Ollama base URL
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze text against all 21 BDI symptoms
    Analyze {
        /// Agree to the analysis of your text (required)
        #[arg(long)]
        consent: bool,

        /// Text to analyze
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Print the run as JSON instead of the report
        #[arg(long)]
        json: bool,

        /// Analyze this many symptoms concurrently
        #[arg(long, value_name = "N")]
        parallel: Option<usize>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// List the 21 symptoms that are assessed
    Symptoms,

    /// Check that the model server is reachable and the model is pulled
    Check {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Show the effective configuration
    Config {
        #[command(flatten)]
        model: ModelArgs,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<BdiConfig> {
    match path {
        Some(path) => {
            let mut config = BdiConfig::load_from(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => BdiConfig::load(),
    }
}

fn overrides(args: ModelArgs, parallel: Option<usize>) -> ModelOverrides {
    ModelOverrides {
        url: args.url,
        model: args.model,
        timeout_secs: args.timeout_secs,
        parallel,
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let style = Style::detect(cli.no_color);
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Symptoms => Ok(commands::symptoms()),
        Commands::Config { model } => {
            overrides(model, None).apply(&mut config);
            commands::show_config(&config)
        }
        Commands::Check { model } => {
            overrides(model, None).apply(&mut config);
            tokio::task::spawn_blocking(move || commands::check(&config))
                .await
                .context("Health check task failed")?
        }
        Commands::Analyze {
            consent,
            text,
            file,
            json,
            parallel,
            model,
        } => {
            overrides(model, parallel).apply(&mut config);
            let input = match (text, file) {
                (Some(text), _) => InputSource::Text(text),
                (None, Some(path)) => InputSource::File(path),
                (None, None) => InputSource::Stdin,
            };
            let options = AnalyzeOptions {
                consent,
                input,
                json,
                style,
            };

            let cancel = CancelToken::new();
            let worker_cancel = cancel.clone();
            let mut task = tokio::task::spawn_blocking(move || {
                commands::analyze(&config, &options, worker_cancel)
            });

            tokio::select! {
                joined = &mut task => joined.context("Analysis task failed")?,
                Ok(()) = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupt received, stopping after the current symptom");
                    cancel.cancel();
                    match task.await.context("Analysis task failed")? {
                        Ok(code) => Ok(code),
                        Err(e) => {
                            tracing::debug!(error = %e, "analysis failed after interrupt");
                            Ok(EXIT_CANCELLED)
                        }
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_GENERAL_ERROR
        }
    };
    std::process::exit(code);
}
