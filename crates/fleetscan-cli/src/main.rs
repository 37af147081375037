//! # fleetscan
//!
//! Command-line front end for the extraction gateway. Reads a document from
//! disk, runs it through the gateway and prints the report as JSON.

#![deny(unsafe_code)]

mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fleetscan_core::{ContentClass, ExtractionKind};
use fleetscan_gateway::ExtractionGateway;
use fleetscan_settings::{GatewaySettings, load_settings, load_settings_from_path};

/// Receipt and settlement extraction.
#[derive(Parser, Debug)]
#[command(name = "fleetscan", about = "Defensive document extraction for trucking fleets")]
struct Cli {
    /// Settings file (defaults to `~/.fleetscan/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract fields from a photographed or scanned document.
    Extract {
        /// Document kind.
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Image or PDF to send to the provider.
        #[arg(long)]
        image: PathBuf,
        /// MIME type of the image (inferred from the extension if omitted).
        #[arg(long)]
        content_type: Option<String>,
        /// Text recognized from the same document.
        #[arg(long)]
        text: Option<PathBuf>,
        /// Where the recognized text came from.
        #[arg(long, value_enum, default_value_t = TextClassArg::Ocr)]
        text_class: TextClassArg,
    },
    /// Check text for injection patterns without calling any provider.
    Scan {
        /// Text file to inspect.
        #[arg(long)]
        text: PathBuf,
        /// Where the text came from.
        #[arg(long, value_enum, default_value_t = TextClassArg::Ocr)]
        text_class: TextClassArg,
    },
    /// Show configured providers, their models and circuit state.
    ///
    /// Circuit state lives in process memory, so a fresh `fleetscan` process
    /// always reports zero failures and closed circuits.
    Providers,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Receipt,
    Settlement,
}

impl From<KindArg> for ExtractionKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Receipt => Self::Receipt,
            KindArg::Settlement => Self::Settlement,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TextClassArg {
    Ocr,
    Pdf,
}

impl From<TextClassArg> for ContentClass {
    fn from(arg: TextClassArg) -> Self {
        match arg {
            TextClassArg::Ocr => Self::OcrText,
            TextClassArg::Pdf => Self::PdfText,
        }
    }
}

fn load(path: Option<&Path>) -> Result<GatewaySettings> {
    match path {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => load_settings().context("failed to load settings"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load(cli.settings.as_deref())?;

    if settings.logging.json {
        fleetscan_logging::init_json_subscriber(&settings.logging.level);
    } else {
        fleetscan_logging::init_subscriber(&settings.logging.level);
    }

    match cli.command {
        Command::Extract {
            kind,
            image,
            content_type,
            text,
            text_class,
        } => {
            let input = commands::build_input(
                kind.into(),
                &image,
                content_type.as_deref(),
                text.as_deref(),
                text_class.into(),
            )?;
            let gateway =
                ExtractionGateway::from_settings(&settings).context("failed to build gateway")?;
            let report = gateway.extract(input).await;
            print_json(&report)?;
            if !report.success {
                std::process::exit(1);
            }
        }
        Command::Scan { text, text_class } => {
            let body = std::fs::read_to_string(&text)
                .with_context(|| format!("failed to read {}", text.display()))?;
            print_json(&commands::scan(&body, text_class.into(), &settings.limits))?;
        }
        Command::Providers => {
            let gateway =
                ExtractionGateway::from_settings(&settings).context("failed to build gateway")?;
            print_json(&commands::providers(&gateway))?;
        }
    }

    Ok(())
}
