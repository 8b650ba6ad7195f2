//! Core data models used throughout linesift.
//!
//! These types represent the source files, lines, matches, and phase timings
//! that flow through the extraction → filtering → telemetry pipeline.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared format of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[serde(rename = "txt", alias = "text", alias = "plain")]
    PlainText,
    Json,
    Pdf,
}

impl FileType {
    /// Short label used in telemetry messages and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::PlainText => "txt",
            FileType::Json => "json",
            FileType::Pdf => "pdf",
        }
    }

    /// Infer the type from a path's extension, if it is one we accept.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" | "plain" | "log" => Ok(FileType::PlainText),
            "json" => Ok(FileType::Json),
            "pdf" => Ok(FileType::Pdf),
            other => Err(format!(
                "unknown file type '{}'. Must be txt, json, or pdf.",
                other
            )),
        }
    }
}

/// A byte stream plus its declared type. Read once, start to finish.
pub struct SourceFile<R> {
    pub reader: R,
    pub file_type: FileType,
    /// Display name (e.g. the uploaded file name), used only for telemetry.
    pub name: Option<String>,
}

impl<R: Read> SourceFile<R> {
    pub fn new(reader: R, file_type: FileType) -> Self {
        Self {
            reader,
            file_type,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<'a> SourceFile<&'a [u8]> {
    /// Wrap an in-memory buffer.
    pub fn from_bytes(bytes: &'a [u8], file_type: FileType) -> Self {
        Self::new(bytes, file_type)
    }
}

/// Ordered lines of extracted content.
pub type LineSequence = Vec<String>;

/// Half-open `[start, end)` character offsets of one match within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A kept line together with the spans where the filter term occurs.
///
/// Spans are sorted by `start`, never overlap, and lie within the line's
/// character range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedLine {
    /// 1-based position of the line in the extracted sequence.
    pub line_number: usize,
    pub text: String,
    pub spans: Vec<MatchSpan>,
}

impl MatchedLine {
    /// The matched substrings, in order.
    pub fn matched_texts(&self) -> Vec<&str> {
        self.byte_spans()
            .into_iter()
            .map(|(from, to)| &self.text[from..to])
            .collect()
    }

    /// Spans converted to byte ranges of `text` in a single pass over its
    /// characters. Offsets past the end clamp to `text.len()`.
    pub(crate) fn byte_spans(&self) -> Vec<(usize, usize)> {
        let mut boundaries = self
            .text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(self.text.len()))
            .enumerate()
            .peekable();
        let mut byte_at = |n: usize| {
            while let Some(&(char_pos, byte_pos)) = boundaries.peek() {
                if char_pos >= n {
                    return byte_pos;
                }
                boundaries.next();
            }
            self.text.len()
        };

        let mut out = Vec::with_capacity(self.spans.len());
        for span in &self.spans {
            let from = byte_at(span.start);
            let to = byte_at(span.end).max(from);
            out.push((from, to));
        }
        out
    }
}

/// Elapsed time of one named pipeline phase. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTiming {
    phase: String,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    duration: Duration,
}

impl PhaseTiming {
    /// Callers guarantee `ended_at >= started_at`:
    /// [`crate::telemetry::TelemetryRecorder::record`] rejects reversed
    /// timestamps, while [`crate::telemetry::time_phase`] and
    /// [`crate::telemetry::span_phases`] clamp the end to the start.
    pub(crate) fn new(
        phase: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            phase,
            started_at,
            ended_at,
            duration,
        }
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
