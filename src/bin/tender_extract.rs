use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tender_extract::config::FetchConfig;
use tender_extract::pipeline;
use tender_extract::services::fetch::DocumentFetcher;
use tender_extract::Extractor;
use tracing_subscriber::EnvFilter;

/// Pull structured fields out of tender documents.
#[derive(Parser)]
#[command(name = "tender-extract", version, about)]
struct Cli {
    /// Print single-line JSON instead of pretty-printed output.
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert and extract one document (file path or http(s) URL).
    Extract {
        input: String,
        /// Treat the document as this type (pdf, docx, html, txt).
        #[arg(long)]
        ext: Option<String>,
    },
    /// Extract several local files.
    Batch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Run the extractor on plain text from a file or stdin.
    Text { file: Option<PathBuf> },
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", out);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("TENDER_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let extractor = Extractor::from_env().context("failed to build extractor")?;
    tracing::debug!(config = ?extractor.config(), "extractor ready");

    match cli.command {
        Command::Extract { input, ext } => {
            let record = if is_url(&input) {
                let fetcher = DocumentFetcher::new(FetchConfig::from_env()?)
                    .context("failed to build HTTP client")?;
                pipeline::process_url(&extractor, &fetcher, &input, ext.as_deref())
            } else if let Some(ext) = ext {
                let bytes = std::fs::read(&input).with_context(|| format!("failed to read {}", input))?;
                pipeline::process_bytes(&extractor, &input, &bytes, &ext)
            } else {
                pipeline::process_path(&extractor, Path::new(&input))
            };
            print_json(&record, cli.compact)
        }
        Command::Batch { paths } => {
            let records = pipeline::process_paths(&extractor, &paths);
            print_json(&records, cli.compact)
        }
        Command::Text { file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };
            if text.trim().is_empty() {
                bail!("no text to extract");
            }
            print_json(&extractor.extract(&text), cli.compact)
        }
    }
}
