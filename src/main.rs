//! CLI entry point for `mailnorm`.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;

use mailnorm::config::{self, Config};
use mailnorm::error::MailError;
use mailnorm::{InputMode, NormalizedMessage};

#[derive(Parser)]
#[command(
    name = "mailnorm",
    version,
    about = "Normalize raw email into UTF-8 text and a deduplicated URL list"
)]
struct Cli {
    /// EML or MBOX file to read (stdin when omitted)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Input framing: auto, single or mbox
    #[arg(short, long, value_name = "MODE")]
    mode: Option<InputMode>,

    /// Configuration file (overrides $MAILNORM_CONFIG and the default location)
    #[arg(short, long, value_name = "PATH", env = "MAILNORM_CONFIG")]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// JSON document written to stdout.
#[derive(Serialize)]
struct Output<'a> {
    source_file: String,
    mode: InputMode,
    messages: &'a [NormalizedMessage],
    failures: &'a [Failure],
}

/// A message that could not be normalized.
#[derive(Serialize)]
struct Failure {
    index: usize,
    offset: Option<u64>,
    error: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config(),
    };

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let (source_file, input) = read_input(cli.file.as_deref())?;

    let mut options = config.parsing;
    if let Some(mode) = cli.mode {
        options.mode = mode;
    }

    let stream = mailnorm::normalize_stream(&input, &options);
    let mode = stream.mode();

    let mut messages = Vec::new();
    let mut failures = Vec::new();
    for (index, result) in stream.enumerate() {
        match result {
            Ok(message) => messages.push(message),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping message");
                let offset = match &e {
                    MailError::Framing { offset, .. } => Some(*offset),
                    _ => None,
                };
                failures.push(Failure {
                    index,
                    offset,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        source = %source_file,
        %mode,
        normalized = messages.len(),
        failed = failures.len(),
        "Done"
    );

    let output = Output {
        source_file,
        mode,
        messages: &messages,
        failures: &failures,
    };
    let json = if cli.pretty || config.output.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{json}");

    Ok(())
}

/// Read the whole input, from a file or from stdin.
fn read_input(path: Option<&Path>) -> mailnorm::error::Result<(String, Vec<u8>)> {
    match path {
        Some(path) => {
            let data = std::fs::read(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MailError::FileNotFound(path.to_path_buf())
                } else {
                    MailError::io(path, e)
                }
            })?;
            Ok((path.display().to_string(), data))
        }
        None => {
            tracing::info!("No input file given, reading from stdin");
            let mut data = Vec::new();
            std::io::stdin().read_to_end(&mut data)?;
            Ok(("stdin".to_string(), data))
        }
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailnorm.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}
