//! Renderers that turn match spans into emphasised output.
//!
//! The filter only reports spans; each renderer decides what emphasis looks
//! like for its medium.

use crate::models::MatchedLine;

/// Split a line into `(text, is_match)` pieces, in order. Empty pieces are
/// skipped.
pub fn segments(line: &MatchedLine) -> Vec<(&str, bool)> {
    let text = line.text.as_str();
    let mut out = Vec::with_capacity(line.spans.len() * 2 + 1);
    let mut cursor = 0;
    for (from, to) in line.byte_spans() {
        if from > cursor {
            out.push((&text[cursor..from], false));
        }
        if to > from {
            out.push((&text[from..to], true));
        }
        cursor = cursor.max(to);
    }
    if cursor < text.len() {
        out.push((&text[cursor..], false));
    }
    out
}

pub trait Highlighter {
    fn render(&self, line: &MatchedLine) -> String;
}

/// Text as-is, no emphasis.
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn render(&self, line: &MatchedLine) -> String {
        line.text.clone()
    }
}

/// Bold reverse-video escape codes around matches.
pub struct AnsiHighlighter;

const ANSI_MATCH: &str = "\x1b[1;7m";
const ANSI_RESET: &str = "\x1b[0m";

impl Highlighter for AnsiHighlighter {
    fn render(&self, line: &MatchedLine) -> String {
        let mut out = String::with_capacity(line.text.len() + line.spans.len() * 12);
        for (text, is_match) in segments(line) {
            if is_match {
                out.push_str(ANSI_MATCH);
                out.push_str(text);
                out.push_str(ANSI_RESET);
            } else {
                out.push_str(text);
            }
        }
        out
    }
}

/// HTML-escaped text with matches wrapped in an element (`<mark>` by default).
pub struct HtmlHighlighter {
    tag: String,
}

impl HtmlHighlighter {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Default for HtmlHighlighter {
    fn default() -> Self {
        Self::new("mark")
    }
}

impl Highlighter for HtmlHighlighter {
    fn render(&self, line: &MatchedLine) -> String {
        let mut out = String::with_capacity(line.text.len());
        for (text, is_match) in segments(line) {
            if is_match {
                out.push_str(&format!("<{}>{}</{}>", self.tag, escape_html(text), self.tag));
            } else {
                out.push_str(&escape_html(text));
            }
        }
        out
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
