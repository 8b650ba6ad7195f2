//! Multi-format line extraction (plain text, JSON, PDF).
//!
//! Extraction turns a [`SourceFile`] into a [`LineSequence`]. The reader is
//! consumed once, start to finish; every decode failure surfaces as a
//! [`ParseError`] tagged with the declared [`FileType`].

use std::io::Read;

use serde_json::Value;

use crate::models::{FileType, LineSequence, SourceFile};

/// Default maximum bytes read from a single source (50 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction failure, tagged with the file type that was being decoded.
#[derive(Debug, thiserror::Error)]
#[error("failed to extract {file_type} content: {kind}")]
pub struct ParseError {
    pub file_type: FileType,
    #[source]
    pub kind: ParseErrorKind,
}

/// Underlying cause of a [`ParseError`].
#[derive(Debug, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("input exceeds size limit ({limit} bytes)")]
    TooLarge { limit: u64 },
    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PDF decode failed: {0}")]
    Pdf(String),
    #[error("PDF is encrypted")]
    Encrypted,
    #[error("PDF has no extractable text layer")]
    NoTextLayer,
}

impl ParseError {
    fn new(file_type: FileType, kind: impl Into<ParseErrorKind>) -> Self {
        Self {
            file_type,
            kind: kind.into(),
        }
    }
}

/// Knobs for [`extract_with`].
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub max_bytes: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Extract lines using [`ExtractOptions::default`].
pub fn extract<R: Read>(source: SourceFile<R>) -> Result<LineSequence, ParseError> {
    extract_with(source, &ExtractOptions::default())
}

/// Read the whole source and convert it to lines according to its type.
pub fn extract_with<R: Read>(
    source: SourceFile<R>,
    options: &ExtractOptions,
) -> Result<LineSequence, ParseError> {
    let file_type = source.file_type;
    let bytes = read_bounded(source.reader, options.max_bytes)
        .map_err(|kind| ParseError::new(file_type, kind))?;

    let lines = match file_type {
        FileType::PlainText => extract_plain(&bytes),
        FileType::Json => extract_json(&bytes),
        FileType::Pdf => extract_pdf(&bytes),
    }
    .map_err(|kind| ParseError::new(file_type, kind))?;

    tracing::debug!(
        file_type = %file_type,
        bytes = bytes.len(),
        lines = lines.len(),
        "extracted source"
    );
    Ok(lines)
}

fn read_bounded<R: Read>(reader: R, max_bytes: u64) -> Result<Vec<u8>, ParseErrorKind> {
    let mut out = Vec::new();
    // One extra byte distinguishes "exactly at the limit" from "over it".
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut out)?;
    if out.len() as u64 > max_bytes {
        return Err(ParseErrorKind::TooLarge { limit: max_bytes });
    }
    Ok(out)
}

/// Split text on `\n` the way a plain line split does. Joining the result
/// with `\n` gives back the input.
pub fn split_lines(text: &str) -> LineSequence {
    text.split('\n').map(str::to_string).collect()
}

fn extract_plain(bytes: &[u8]) -> Result<LineSequence, ParseErrorKind> {
    let text = std::str::from_utf8(bytes)?;
    Ok(split_lines(text))
}

fn extract_json(bytes: &[u8]) -> Result<LineSequence, ParseErrorKind> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(flatten_json(&value))
}

/// Flatten a JSON document into one `<pointer> = <value>` line per leaf.
///
/// Leaves are visited depth-first, object keys in sorted order, array
/// elements by index. Empty objects and arrays count as leaves. A leaf at
/// the document root renders as its bare value.
pub fn flatten_json(value: &Value) -> LineSequence {
    let mut lines = Vec::new();
    flatten_into(value, &mut String::new(), &mut lines);
    lines
}

fn flatten_into(value: &Value, pointer: &mut String, out: &mut LineSequence) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                let mark = pointer.len();
                pointer.push('/');
                pointer.push_str(&escape_pointer_token(key));
                flatten_into(&map[key.as_str()], pointer, out);
                pointer.truncate(mark);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, item) in items.iter().enumerate() {
                let mark = pointer.len();
                pointer.push('/');
                pointer.push_str(&i.to_string());
                flatten_into(item, pointer, out);
                pointer.truncate(mark);
            }
        }
        leaf => {
            if pointer.is_empty() {
                out.push(leaf.to_string());
            } else {
                out.push(format!("{} = {}", pointer, leaf));
            }
        }
    }
}

/// RFC 6901 token escaping.
fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn extract_pdf(bytes: &[u8]) -> Result<LineSequence, ParseErrorKind> {
    // lopdf may fail to load (or silently decrypt) a protected file, so the
    // trailer is checked before handing the bytes over.
    if trailer_declares_encryption(bytes) {
        return Err(ParseErrorKind::Encrypted);
    }
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ParseErrorKind::Pdf(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(ParseErrorKind::Encrypted);
    }
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ParseErrorKind::Pdf(e.to_string()))?;
    lines_from_pages(&pages)
}

/// True when the last classic `trailer` dictionary carries an `/Encrypt`
/// entry. Files using cross-reference streams fall through to lopdf.
fn trailer_declares_encryption(bytes: &[u8]) -> bool {
    let Some(at) = rfind(bytes, b"trailer") else {
        return false;
    };
    let trailer = &bytes[at..];
    let end = find(trailer, b"startxref").unwrap_or(trailer.len());
    find(&trailer[..end], b"/Encrypt").is_some()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Concatenate per-page text in page order and split it into lines.
fn lines_from_pages<S: AsRef<str>>(pages: &[S]) -> Result<LineSequence, ParseErrorKind> {
    let text: String = pages.iter().map(AsRef::as_ref).collect();
    if text.trim().is_empty() {
        return Err(ParseErrorKind::NoTextLayer);
    }
    Ok(split_lines(&text))
}
