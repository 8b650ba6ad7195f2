//! One upload-and-filter request, end to end.
//!
//! [`handle_request`] is the entry point a host calls once per user action.
//! It runs extraction, filtering, and the caller's rendering callback, times
//! each phase plus the request as a whole, and persists the timings only
//! after rendering finishes. A request that fails or is abandoned part-way
//! therefore leaves nothing in the telemetry log.

use std::io::Read;

use thiserror::Error;

use crate::extract::{extract_with, ExtractOptions, ParseError};
use crate::filter::{FilterError, LineFilter};
use crate::models::{FileType, MatchedLine, PhaseTiming, SourceFile};
use crate::telemetry::{
    span_phases, time_phase, RequestLabels, TelemetryError, TelemetryRecorder,
};

pub const PHASE_EXTRACTION: &str = "extraction";
pub const PHASE_FILTERING: &str = "filtering";
pub const PHASE_RENDERING: &str = "rendering";
/// Upload through rendering, recorded after the three phases above.
pub const PHASE_REQUEST: &str = "request";

/// Failure of the primary extraction/filter flow.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("could not read {file_type} file{} for term {term:?}: {source}", name_suffix(.name))]
    Extract {
        file_type: FileType,
        name: Option<String>,
        term: String,
        #[source]
        source: ParseError,
    },
    #[error("could not filter {file_type} file by term {term:?}: {source}")]
    Filter {
        file_type: FileType,
        term: String,
        #[source]
        source: FilterError,
    },
}

fn name_suffix(name: &Option<String>) -> String {
    name.as_ref()
        .map(|n| format!(" '{}'", n))
        .unwrap_or_default()
}

/// What telemetry did for a finished request.
#[derive(Debug)]
pub enum TelemetryStatus {
    Persisted,
    Disabled,
    Failed(TelemetryError),
}

/// Result of a successful request. `matches` is always populated, even when
/// telemetry could not be written.
#[derive(Debug)]
pub struct RequestOutcome {
    pub file_type: FileType,
    pub total_lines: usize,
    pub matches: Vec<MatchedLine>,
    pub timings: Vec<PhaseTiming>,
    pub telemetry: TelemetryStatus,
}

/// Per-request settings supplied by the host.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub extract: ExtractOptions,
    /// `None` disables persistence; timings are still returned.
    pub recorder: Option<TelemetryRecorder>,
}

/// Extract, filter, render, then persist phase timings.
///
/// `render` is called once per kept line, in order.
pub fn handle_request<R, F>(
    options: &RequestOptions,
    source: SourceFile<R>,
    term: &str,
    mut render: F,
) -> Result<RequestOutcome, RequestError>
where
    R: Read,
    F: FnMut(&MatchedLine),
{
    let file_type = source.file_type;
    let name = source.name.clone();
    tracing::info!(
        file_type = %file_type,
        source = name.as_deref().unwrap_or("-"),
        "processing file"
    );

    let (lines, extraction) = time_phase(PHASE_EXTRACTION, || {
        extract_with(source, &options.extract)
    });
    let lines = lines.map_err(|source| RequestError::Extract {
        file_type,
        name: name.clone(),
        term: term.to_string(),
        source,
    })?;

    let (matches, filtering) = time_phase(PHASE_FILTERING, || {
        LineFilter::new(term).map(|f| f.apply(&lines))
    });
    let matches = matches.map_err(|source| RequestError::Filter {
        file_type,
        term: term.to_string(),
        source,
    })?;

    let ((), rendering) = time_phase(PHASE_RENDERING, || matches.iter().for_each(&mut render));

    let request = span_phases(PHASE_REQUEST, &extraction, &rendering);
    let timings = vec![extraction, filtering, rendering, request];
    tracing::debug!(
        file_type = %file_type,
        lines = lines.len(),
        matches = matches.len(),
        "request handled"
    );

    let telemetry = match &options.recorder {
        None => TelemetryStatus::Disabled,
        Some(recorder) => {
            let labelled = recorder.with_labels(RequestLabels {
                file_type: Some(file_type),
                source: name,
            });
            match labelled.persist(&timings) {
                Ok(()) => TelemetryStatus::Persisted,
                Err(e) => {
                    tracing::warn!(error = %e, "telemetry not persisted");
                    TelemetryStatus::Failed(e)
                }
            }
        }
    };

    Ok(RequestOutcome {
        file_type,
        total_lines: lines.len(),
        matches,
        timings,
        telemetry,
    })
}
