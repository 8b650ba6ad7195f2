//! Phase latency telemetry.
//!
//! A [`TelemetryRecorder`] turns start/end timestamps into immutable
//! [`PhaseTiming`]s and appends them to a log file as newline-delimited JSON,
//! one object per line:
//!
//! ```json
//! {"@timestamp":1718000000000,"message":"pdf extraction latency: 0.12 seconds","log.level":"INFO","phase":"extraction","started_at":"...","ended_at":"...","duration_ms":120.4}
//! ```
//!
//! The file is opened in append mode for each [`persist`](TelemetryRecorder::persist)
//! call and closed before it returns. Each record is serialized fully before
//! it is written with a single `write_all`, so a failed write never leaves a
//! half-built record behind a successful one.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{FileType, PhaseTiming};

/// Default telemetry log file name.
pub const DEFAULT_LOG_FILE: &str = "noSpoon.log";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid timing for phase '{phase}': end {ended_at} is before start {started_at}")]
    InvalidTiming {
        phase: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
    #[error("failed to append telemetry to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize telemetry record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Optional labels attached to every persisted record.
#[derive(Debug, Clone, Default)]
pub struct RequestLabels {
    pub file_type: Option<FileType>,
    pub source: Option<String>,
}

/// Records phase timings and appends them to a log file.
///
/// Pass an instance to whatever needs to record; there is no global logger.
#[derive(Debug, Clone)]
pub struct TelemetryRecorder {
    log_path: PathBuf,
    labels: RequestLabels,
}

#[derive(Serialize)]
struct LogRecord<'a> {
    #[serde(rename = "@timestamp")]
    timestamp: i64,
    message: String,
    #[serde(rename = "log.level")]
    level: &'static str,
    phase: &'a str,
    started_at: String,
    ended_at: String,
    duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_type: Option<FileType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

impl TelemetryRecorder {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            labels: RequestLabels::default(),
        }
    }

    /// A copy of this recorder that tags its records with request labels.
    pub fn with_labels(&self, labels: RequestLabels) -> Self {
        Self {
            log_path: self.log_path.clone(),
            labels,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Build a [`PhaseTiming`]. Fails if `ended_at` precedes `started_at`.
    pub fn record(
        &self,
        phase: &str,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<PhaseTiming, TelemetryError> {
        let duration = (ended_at - started_at)
            .to_std()
            .map_err(|_| TelemetryError::InvalidTiming {
                phase: phase.to_string(),
                started_at,
                ended_at,
            })?;
        tracing::debug!(phase, duration_ms = duration.as_secs_f64() * 1000.0, "phase timed");
        Ok(PhaseTiming::new(
            phase.to_string(),
            started_at,
            ended_at,
            duration,
        ))
    }

    /// Append one NDJSON record per entry to the log file.
    pub fn persist(&self, entries: &[PhaseTiming]) -> Result<(), TelemetryError> {
        if entries.is_empty() {
            return Ok(());
        }

        let lines = entries
            .iter()
            .map(|entry| self.serialize(entry))
            .collect::<Result<Vec<_>, _>>()?;

        let io_err = |source| TelemetryError::Io {
            path: self.log_path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(io_err)?;
        for line in &lines {
            file.write_all(line.as_bytes()).map_err(io_err)?;
        }
        file.flush().map_err(io_err)?;
        Ok(())
    }

    fn serialize(&self, entry: &PhaseTiming) -> Result<String, TelemetryError> {
        let seconds = entry.duration().as_secs_f64();
        let message = match self.labels.file_type {
            Some(ft) => format!(
                "{} {} latency: {:.2} seconds",
                ft.as_str().to_uppercase(),
                entry.phase(),
                seconds
            ),
            None => format!("{} latency: {:.2} seconds", entry.phase(), seconds),
        };
        let record = LogRecord {
            timestamp: entry.started_at().timestamp_millis(),
            message,
            level: "INFO",
            phase: entry.phase(),
            started_at: entry.started_at().to_rfc3339(),
            ended_at: entry.ended_at().to_rfc3339(),
            duration_ms: seconds * 1000.0,
            file_type: self.labels.file_type,
            source: self.labels.source.as_deref(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        Ok(line)
    }
}

/// Run `f` and time it as `phase`.
pub fn time_phase<T>(phase: &str, f: impl FnOnce() -> T) -> (T, PhaseTiming) {
    let started_at = Utc::now();
    let out = f();
    // The wall clock can step backwards between the two reads; clamp so a
    // clock adjustment never produces a negative duration.
    let ended_at = Utc::now().max(started_at);
    let duration = (ended_at - started_at).to_std().unwrap_or_default();
    (
        out,
        PhaseTiming::new(phase.to_string(), started_at, ended_at, duration),
    )
}

/// A timing named `phase` that covers `first` through `last`.
pub fn span_phases(phase: &str, first: &PhaseTiming, last: &PhaseTiming) -> PhaseTiming {
    let started_at = first.started_at();
    let ended_at = last.ended_at().max(started_at);
    let duration = (ended_at - started_at).to_std().unwrap_or_default();
    PhaseTiming::new(phase.to_string(), started_at, ended_at, duration)
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FILE)
    }
}
