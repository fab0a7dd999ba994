mod command_classify;
mod command_probe;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::{
    io::{stderr, stdout, Write},
    path::PathBuf,
    process::ExitCode,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use h5err::config::{get_default, get_default_content, Config, FramePolicy};
use h5err::native::{H5Z_filter_t, Session, KNOWN_FILTERS};
use h5err::{Classifier, ErrorKind};

fn version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (hdf5:",
        env!("H5_VERSION"),
        ")"
    )
}

/// Tool for inspecting HDF5 library errors.
///
/// Native failures are classified into major error families using a table of the messages the
/// library registers for each family. A table is built in; see the config subcommand.
#[derive(Parser)]
#[command(version=version(), about, long_about, disable_help_subcommand = true)]
struct Cli {
    /// Logging level filters, e.g., debug, info, warn, etc ...
    #[arg(short, long, default_value = "info")]
    logging: String,

    /// YAML classification table to use rather than the built-in table.
    #[arg(short, long, value_name = "path")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the major error families as JSON.
    Kinds,
    /// Output the built-in classification table.
    Config,
    /// Classify major error messages.
    Classify {
        /// Major error messages, as reported by the library.
        #[arg(value_name = "message", required = true)]
        messages: Vec<String>,
    },
    /// Report which predefined filters the linked library can apply.
    Filters,
    /// Open a file, and optionally read a dataset, reporting any library error as JSON.
    ///
    /// Exits with a non-zero status if the library reports an error.
    Probe {
        #[arg(value_name = "path")]
        input: PathBuf,
        /// Dataset to read, e.g., /group/data
        #[arg(short, long)]
        dataset: Option<String>,
        /// Classify by the innermost error-stack entry rather than the failing API call.
        #[arg(short, long)]
        innermost: bool,
    },
}

#[derive(Serialize)]
struct KindInfo {
    kind: ErrorKind,
    symbol: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct FilterAvail {
    id: H5Z_filter_t,
    name: &'static str,
    available: bool,
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::with_path(&path).with_context(|| format!("loading config {path:?}"))
        }
        None => get_default().context("loading built-in config"),
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(EnvFilter::new(cli.logging))
        .init();

    info!("hdf5 version={}", env!("H5_VERSION"));

    let config = load_config(cli.config)?;

    match cli.commands {
        Commands::Kinds => {
            let kinds: Vec<KindInfo> = ErrorKind::all()
                .iter()
                .map(|kind| KindInfo {
                    kind: *kind,
                    symbol: kind.symbol(),
                    description: kind.description(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&kinds)?);
        }
        Commands::Config => {
            stdout().write_all(get_default_content().as_bytes())?;
        }
        Commands::Classify { messages } => {
            let classifier = Classifier::new(&config);
            crate::command_classify::classify(&classifier, &messages, stdout())?;
        }
        Commands::Filters => {
            let session = Session::new(Classifier::new(&config));
            let mut filters: Vec<FilterAvail> = Vec::default();
            for &(id, name) in KNOWN_FILTERS {
                filters.push(FilterAvail {
                    id,
                    name,
                    available: session.filter_available(id)?,
                });
            }
            println!("{}", serde_json::to_string_pretty(&filters)?);
        }
        Commands::Probe {
            input,
            dataset,
            innermost,
        } => {
            let mut classifier = Classifier::new(&config);
            if innermost {
                classifier = classifier.with_policy(FramePolicy::Innermost);
            }
            let ok = crate::command_probe::probe(Session::new(classifier), input, dataset)?;
            if !ok {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
