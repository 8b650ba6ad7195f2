//! # linesift CLI (`lsift`)
//!
//! The `lsift` binary is a thin host around the library: it opens a file,
//! runs one request through extraction and filtering, prints the matching
//! lines with highlighting, and appends phase timings to the telemetry log.
//!
//! ## Usage
//!
//! ```bash
//! lsift --config ./config/lsift.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lsift filter <file> <term>` | Print lines containing `term`, highlighted |
//! | `lsift extract <file>` | Print every extracted line |
//!
//! ## Examples
//!
//! ```bash
//! # Highlight every "timeout" in a PDF report
//! lsift filter report.pdf timeout
//!
//! # Filter a JSON document (flattened to `/pointer = value` lines)
//! lsift filter events.json error --format json
//!
//! # Treat an extensionless file as plain text
//! lsift filter ./server-log warn --type txt
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use linesift::config::{self, Config};
use linesift::highlight::{AnsiHighlighter, Highlighter, HtmlHighlighter, PlainHighlighter};
use linesift::{extract_with, handle_request, FileType, SourceFile, TelemetryStatus};

/// linesift: extract, filter, and highlight lines from text, JSON, and PDF
/// files.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means defaults.
#[derive(Parser)]
#[command(
    name = "lsift",
    about = "linesift — extract, filter, and highlight lines from text, JSON, and PDF files",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/lsift.toml`. Telemetry, extraction limits, and
    /// output settings are read from this file.
    #[arg(long, global = true, default_value = "./config/lsift.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the lines of a file that contain a term.
    ///
    /// Matching is a literal, case-insensitive substring search. An empty
    /// term prints every line.
    Filter {
        /// File to read.
        file: PathBuf,

        /// Literal filter term.
        term: String,

        /// File type: `txt`, `json`, or `pdf`. Inferred from the extension
        /// when omitted.
        #[arg(long = "type")]
        file_type: Option<FileType>,

        /// Output format: `plain`, `ansi`, `html`, or `json`.
        #[arg(long)]
        format: Option<String>,

        /// Do not append phase timings to the telemetry log.
        #[arg(long)]
        no_telemetry: bool,
    },

    /// Print every extracted line of a file.
    Extract {
        /// File to read.
        file: PathBuf,

        /// File type: `txt`, `json`, or `pdf`. Inferred from the extension
        /// when omitted.
        #[arg(long = "type")]
        file_type: Option<FileType>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Filter {
            file,
            term,
            file_type,
            format,
            no_telemetry,
        } => run_filter(&cfg, &file, &term, file_type, format, no_telemetry),
        Commands::Extract { file, file_type } => run_extract(&cfg, &file, file_type),
    }
}

fn resolve_type(path: &Path, declared: Option<FileType>) -> Result<FileType> {
    declared.or_else(|| FileType::from_path(path)).with_context(|| {
        format!(
            "Cannot infer file type of {}; pass --type txt|json|pdf",
            path.display()
        )
    })
}

fn open_source(path: &Path, file_type: FileType) -> Result<SourceFile<File>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(file, file_type).with_name(name))
}

fn highlighter(format: &str, cfg: &Config) -> Box<dyn Highlighter> {
    match format {
        "ansi" => Box::new(AnsiHighlighter),
        "html" => Box::new(HtmlHighlighter::new(cfg.output.html_tag.clone())),
        _ => Box::new(PlainHighlighter),
    }
}

fn run_filter(
    cfg: &Config,
    path: &Path,
    term: &str,
    file_type: Option<FileType>,
    format: Option<String>,
    no_telemetry: bool,
) -> Result<()> {
    // ANSI on a terminal, plain when piped.
    let format = format
        .or_else(|| cfg.output.format.clone())
        .unwrap_or_else(|| {
            if atty::is(atty::Stream::Stdout) {
                "ansi".to_string()
            } else {
                "plain".to_string()
            }
        });
    if !config::OUTPUT_FORMATS.contains(&format.as_str()) {
        anyhow::bail!(
            "Unknown output format: '{}'. Must be plain, ansi, html, or json.",
            format
        );
    }

    let file_type = resolve_type(path, file_type)?;
    let source = open_source(path, file_type)?;

    let mut options = cfg.request_options();
    if no_telemetry {
        options.recorder = None;
    }

    let renderer = highlighter(&format, cfg);
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut write_err = None;

    let outcome = handle_request(&options, source, term, |line| {
        if write_err.is_some() {
            return;
        }
        let rendered = if format == "json" {
            serde_json::to_string(line).map_err(std::io::Error::from)
        } else {
            Ok(renderer.render(line))
        };
        if let Err(e) = rendered.and_then(|text| writeln!(out, "{}", text)) {
            write_err = Some(e);
        }
    })?;

    if let Some(e) = write_err {
        return Err(e).context("Failed to write output");
    }
    out.flush().context("Failed to write output")?;

    eprintln!(
        "{} of {} lines matched",
        outcome.matches.len(),
        outcome.total_lines
    );
    if let TelemetryStatus::Persisted = outcome.telemetry {
        tracing::info!(path = %cfg.telemetry.log_path.display(), "telemetry appended");
    }
    Ok(())
}

fn run_extract(cfg: &Config, path: &Path, file_type: Option<FileType>) -> Result<()> {
    let file_type = resolve_type(path, file_type)?;
    let source = open_source(path, file_type)?;
    let lines = extract_with(source, &cfg.request_options().extract)?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for line in &lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}
