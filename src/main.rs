//! Command line front end: reads a patient history and prints the
//! clinical analysis for each task.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use clinical_consult::{consult_with_config, instructions_markdown, ConsultConfig, PatientHistory};
use figment::providers::Serialized;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One section per task
    Markdown,
    /// Object keyed by task
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "clinical-consult")]
#[command(author, version, about = "Clinical analysis of a patient history by an LLM")]
#[command(long_about = r#"
Sends a patient history to a chat completion model, asking in parallel for:
problem representation, most likely diagnosis, expanded differential,
alternative diagnoses, clinical assessment, treatment plan, and monitoring
and follow-up.

The API key is read from OPENAI_API_KEY. Other settings come from
./consult.toml, --config <path>, or CONSULT_* environment variables.

Example:
  clinical-consult history.txt
  pbpaste | clinical-consult -o json
"#)]
struct Cli {
    /// File holding the patient history; stdin when absent or "-"
    file: Option<PathBuf>,

    /// Print the expected history format and exit
    #[arg(long)]
    instructions: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "markdown")]
    output: OutputFormat,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Model to query (e.g. gpt-4, gpt-4o)
    #[arg(short, long, value_name = "MODEL")]
    model: Option<String>,

    /// Do not verify the endpoint's TLS certificate
    #[arg(long)]
    insecure_skip_tls_verify: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_history(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn load_config(cli: &Cli) -> clinical_consult::Result<ConsultConfig> {
    let mut figment = ConsultConfig::figment(cli.config.as_deref())?;
    if let Some(model) = &cli.model {
        figment = figment.merge(Serialized::default("model", model));
    }
    if cli.insecure_skip_tls_verify {
        figment = figment.merge(Serialized::default("accept_invalid_certs", true));
    }
    Ok(ConsultConfig::from_figment(figment)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.instructions {
        print!("{}", instructions_markdown(0)?);
        return Ok(());
    }

    // Input is checked before configuration so a blank submission never
    // needs a credential or a connection.
    let history = PatientHistory::new(read_history(cli.file.as_deref())?)?;
    let config = load_config(&cli)?;
    info!(model = %config.model, endpoint = %config.endpoint, "configuration loaded");

    let results = consult_with_config(&history, &config).await?;

    let failed = results.failures().count();
    if failed > 0 {
        warn!(failed, "some analyses could not be generated");
    }

    let output = match cli.output {
        OutputFormat::Markdown => results.to_markdown(0)?,
        OutputFormat::Json => results.to_json()?,
    };
    println!("{}", output);

    Ok(())
}
