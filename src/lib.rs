//! # linesift
//!
//! Extract lines from plain-text, JSON, and PDF files, keep the ones that
//! contain a literal filter term, and record how long each step took.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌─────────────┐
//! │ SourceFile │──▶│  extract   │──▶│   filter   │──▶│  renderer   │
//! │ txt/json/  │   │ lines      │   │ spans      │   │ (host)      │
//! │ pdf        │   └────────────┘   └────────────┘   └──────┬──────┘
//! └────────────┘                                           │
//!                         ┌────────────────────────────────┘
//!                         ▼
//!                 ┌──────────────────┐
//!                 │ TelemetryRecorder│──▶ NDJSON log (append-only)
//!                 └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use linesift::{handle_request, FileType, RequestOptions, SourceFile, TelemetryRecorder};
//!
//! let options = RequestOptions {
//!     recorder: Some(TelemetryRecorder::new("noSpoon.log")),
//!     ..Default::default()
//! };
//! let file = std::fs::File::open("app.log")?;
//! let outcome = handle_request(
//!     &options,
//!     SourceFile::new(file, FileType::PlainText),
//!     "error",
//!     |line| println!("{}: {}", line.line_number, line.text),
//! )?;
//! println!("{} of {} lines matched", outcome.matches.len(), outcome.total_lines);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types |
//! | [`extract`] | Plain text, JSON, and PDF line extraction |
//! | [`filter`] | Literal case-insensitive filtering with match spans |
//! | [`highlight`] | Plain, ANSI, and HTML renderers for match spans |
//! | [`telemetry`] | Phase timings and NDJSON log persistence |
//! | [`pipeline`] | One request: extract → filter → render → persist |
//! | [`config`] | TOML configuration parsing |

pub mod config;
pub mod extract;
pub mod filter;
pub mod highlight;
pub mod models;
pub mod pipeline;
pub mod telemetry;

pub use extract::{extract, extract_with, ExtractOptions, ParseError, ParseErrorKind};
pub use filter::{filter, refine, FilterError, LineFilter};
pub use models::{FileType, LineSequence, MatchSpan, MatchedLine, PhaseTiming, SourceFile};
pub use pipeline::{handle_request, RequestError, RequestOptions, RequestOutcome, TelemetryStatus};
pub use telemetry::{TelemetryError, TelemetryRecorder};
