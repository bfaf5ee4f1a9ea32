//! Command implementations
//!
//! Everything here is blocking (the HTTP client is `reqwest::blocking`), so
//! main runs these on a blocking thread.

use crate::errors::{EXIT_CANCELLED, EXIT_MODEL_UNAVAILABLE, EXIT_SUCCESS, EXIT_VALIDATION};
use crate::output::{
    format_catalog, format_summary, format_symptom, progress_message, Style, DISCLAIMER,
};
use anyhow::{Context, Result};
use bdi_common::assessment::validate_input;
use bdi_common::llm_client::model_matches;
use bdi_common::{
    Aggregator, AnalysisError, AnalysisRun, BdiConfig, CancelToken, HttpLlmClient,
    ValidationError, BDI_SYMPTOMS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line overrides for the model section of the config
#[derive(Debug, Clone, Default)]
pub struct ModelOverrides {
    pub url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub parallel: Option<usize>,
}

impl ModelOverrides {
    pub fn apply(&self, config: &mut BdiConfig) {
        if let Some(url) = &self.url {
            config.model.base_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            config.model.timeout_secs = timeout.max(1);
        }
        if let Some(parallel) = self.parallel {
            config.analysis.parallelism = parallel.max(1);
        }
    }
}

/// Where the text to analyze comes from
#[derive(Debug, Clone)]
pub enum InputSource {
    Text(String),
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub consent: bool,
    pub input: InputSource,
    pub json: bool,
    pub style: Style,
}

pub fn read_input(source: &InputSource) -> Result<String> {
    match source {
        InputSource::Text(text) => Ok(text.clone()),
        InputSource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        InputSource::Stdin => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                eprintln!("Enter text to analyze, then press Ctrl-D:");
            }
            let mut text = String::new();
            stdin
                .lock()
                .read_to_string(&mut text)
                .context("Failed to read text from stdin")?;
            Ok(text)
        }
    }
}

pub fn validation_message(error: ValidationError) -> &'static str {
    match error {
        ValidationError::NoConsent => {
            "Consent required: re-run with --consent to agree to the analysis of your text. \
             Your text is not stored or shared."
        }
        ValidationError::EmptyInput => "Please enter some text for analysis.",
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::with_template("[{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

fn print_above(bar: &ProgressBar, text: &str) {
    if bar.is_hidden() {
        println!("{}", text);
    } else {
        bar.println(text);
    }
}

fn run_streaming(
    aggregator: &Aggregator<'_>,
    text: &str,
    options: &AnalyzeOptions,
) -> Result<AnalysisRun, AnalysisError> {
    let mut stream = aggregator.stream(text, options.consent)?;
    let (_, total) = stream.progress();
    let bar = progress_bar(total);

    while let Some(symptom) = stream.upcoming() {
        let (done, total) = stream.progress();
        bar.set_position(done as u64);
        bar.set_message(progress_message(symptom, done, total));

        let Some(result) = stream.next() else {
            break;
        };
        if !options.json {
            print_above(&bar, format_symptom(&result, options.style).trim_end());
        }
    }

    bar.finish_and_clear();
    stream.finish()
}

fn run_parallel(
    aggregator: &Aggregator<'_>,
    text: &str,
    options: &AnalyzeOptions,
    workers: usize,
) -> Result<AnalysisRun, AnalysisError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!(
        "Analyzing {} symptoms with {} workers...",
        aggregator.catalog().len(),
        workers
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let run = aggregator.analyze(text, options.consent);
    spinner.finish_and_clear();

    let run = run?;
    if !options.json {
        for result in &run.results {
            println!("{}", format_symptom(result, options.style).trim_end());
        }
    }
    Ok(run)
}

/// `bdictl analyze`
pub fn analyze(config: &BdiConfig, options: &AnalyzeOptions, cancel: CancelToken) -> Result<i32> {
    // Nothing is read without consent
    let text = if options.consent {
        read_input(&options.input)?
    } else {
        String::new()
    };
    if let Err(e) = validate_input(&text, options.consent) {
        eprintln!("{}", validation_message(e));
        return Ok(EXIT_VALIDATION);
    }

    let client = HttpLlmClient::new(config.model.clone())?;
    let workers = config.analysis.parallelism.max(1);
    let aggregator = Aggregator::new(&client)
        .with_parallelism(workers)
        .with_cancel_token(cancel);

    tracing::debug!(
        url = client.base_url(),
        model = client.model(),
        workers,
        "starting analysis"
    );

    if !options.json {
        println!("Disclaimer: {}", DISCLAIMER);
        println!();
    }

    let outcome = if workers > 1 {
        run_parallel(&aggregator, &text, options, workers)
    } else {
        run_streaming(&aggregator, &text, options)
    };

    match outcome {
        Ok(run) => {
            if options.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&run).context("Failed to serialize results")?
                );
            } else {
                println!();
                print!("{}", format_summary(&run, options.style));
            }
            Ok(EXIT_SUCCESS)
        }
        Err(AnalysisError::Cancelled { completed, total }) => {
            eprintln!(
                "Analysis cancelled after {} of {} symptoms; no score was computed.",
                completed, total
            );
            Ok(EXIT_CANCELLED)
        }
        Err(AnalysisError::Validation(e)) => {
            eprintln!("{}", validation_message(e));
            Ok(EXIT_VALIDATION)
        }
    }
}

/// `bdictl check`
pub fn check(config: &BdiConfig) -> Result<i32> {
    let client = HttpLlmClient::new(config.model.clone())?;
    println!("Endpoint: {}", client.base_url());

    if !client.is_available() {
        println!("Status:   unreachable");
        println!("Start the model server (e.g. `ollama serve`) or point BDI_OLLAMA_URL at it.");
        return Ok(EXIT_MODEL_UNAVAILABLE);
    }
    println!("Status:   reachable");

    match client.list_models() {
        Ok(models) if model_matches(client.model(), &models) => {
            println!("Model:    {} (available)", client.model());
            Ok(EXIT_SUCCESS)
        }
        Ok(models) => {
            println!("Model:    {} (not pulled)", client.model());
            println!("Run `ollama pull {}` first.", client.model());
            if !models.is_empty() {
                println!("Available: {}", models.join(", "));
            }
            Ok(EXIT_MODEL_UNAVAILABLE)
        }
        Err(e) => {
            println!("Model:    unknown ({})", e);
            Ok(EXIT_MODEL_UNAVAILABLE)
        }
    }
}

/// `bdictl symptoms`
pub fn symptoms() -> i32 {
    print!("{}", format_catalog(&BDI_SYMPTOMS));
    EXIT_SUCCESS
}

/// `bdictl config`
pub fn show_config(config: &BdiConfig) -> Result<i32> {
    if let Some(path) = BdiConfig::user_config_path() {
        println!("# user config: {}", path.display());
    }
    println!("# system config: {}", BdiConfig::system_config_path().display());
    println!();
    print!("{}", config.to_toml()?);
    Ok(EXIT_SUCCESS)
}
