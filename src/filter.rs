//! Literal, case-insensitive line filtering with match spans.
//!
//! The filter term is always taken literally: it is regex-escaped before
//! compilation, so `a.b*c` only matches the text `a.b*c`. Matches are
//! leftmost-first and never overlap. Spans are reported in character
//! offsets so renderers can slice `char`s without re-scanning.
//!
//! An empty term keeps every line with no spans.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::models::{MatchSpan, MatchedLine};

/// The term could not be compiled (only possible for pathologically long
/// terms that exceed the regex size limit).
#[derive(Debug, Error)]
#[error("cannot filter by term {term:?}: {source}")]
pub struct FilterError {
    pub term: String,
    #[source]
    pub source: regex::Error,
}

/// A compiled filter for one term. Reuse it across sequences to avoid
/// recompiling.
#[derive(Debug, Clone)]
pub struct LineFilter {
    term: String,
    pattern: Option<Regex>,
}

impl LineFilter {
    pub fn new(term: &str) -> Result<Self, FilterError> {
        let pattern = if term.is_empty() {
            None
        } else {
            let compiled = RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
                .map_err(|source| FilterError {
                    term: term.to_string(),
                    source,
                })?;
            Some(compiled)
        };
        Ok(Self {
            term: term.to_string(),
            pattern,
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Spans of every non-overlapping occurrence in `line`, left to right.
    pub fn find_spans(&self, line: &str) -> Vec<MatchSpan> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };

        let mut spans = Vec::new();
        // Byte offsets advance monotonically, so char offsets are counted
        // incrementally instead of from the start of the line each time.
        let mut byte_pos = 0;
        let mut char_pos = 0;
        for m in pattern.find_iter(line) {
            char_pos += line[byte_pos..m.start()].chars().count();
            let start = char_pos;
            char_pos += m.as_str().chars().count();
            byte_pos = m.end();
            spans.push(MatchSpan::new(start, char_pos));
        }
        spans
    }

    /// Match a single line. `None` means the line is dropped.
    pub fn match_line(&self, line_number: usize, line: &str) -> Option<MatchedLine> {
        let spans = self.find_spans(line);
        if self.pattern.is_some() && spans.is_empty() {
            return None;
        }
        Some(MatchedLine {
            line_number,
            text: line.to_string(),
            spans,
        })
    }

    /// Keep matching lines in input order, numbering them from 1.
    pub fn apply<S: AsRef<str>>(&self, lines: &[S]) -> Vec<MatchedLine> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| self.match_line(i + 1, line.as_ref()))
            .collect()
    }

    /// Narrow an earlier result. Kept lines retain their original
    /// `line_number`, so refining by the same term returns `matches` unchanged.
    pub fn refine(&self, matches: &[MatchedLine]) -> Vec<MatchedLine> {
        matches
            .iter()
            .filter_map(|m| self.match_line(m.line_number, &m.text))
            .collect()
    }
}

/// Filter `lines` by `term`. See [`LineFilter`].
pub fn filter<S: AsRef<str>>(lines: &[S], term: &str) -> Result<Vec<MatchedLine>, FilterError> {
    Ok(LineFilter::new(term)?.apply(lines))
}

/// Filter an earlier result by `term`. See [`LineFilter::refine`].
pub fn refine(matches: &[MatchedLine], term: &str) -> Result<Vec<MatchedLine>, FilterError> {
    Ok(LineFilter::new(term)?.refine(matches))
}
