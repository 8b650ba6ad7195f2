//! PDF extraction against real, hand-assembled documents.
//!
//! Asserts: multi-page text comes back in page order, filtering works on
//! extracted PDF lines (library and binary), and encrypted documents are
//! refused with `Encrypted`.

use std::fs;
use std::process::Command;

use linesift::{extract, handle_request, FileType, ParseErrorKind, RequestOptions, SourceFile};
use tempfile::TempDir;

/// Minimal PDF with one Helvetica text run per page. The body is written
/// first and the xref offsets are taken from it, so lopdf and pdf-extract
/// both parse the result. `encrypt` adds a Standard security handler to the
/// trailer.
fn pdf_with_pages(pages: &[&str], encrypt: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offsets = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();
    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "2 0 obj << /Type /Pages /Kids [{}] /Count {} >> endobj\n",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );
    offsets.push(out.len());
    out.extend_from_slice(
        b"3 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >> endobj\n",
    );

    for (i, text) in pages.iter().enumerate() {
        let page_id = 4 + 2 * i;
        let content_id = page_id + 1;
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >> endobj\n",
                page_id, content_id
            )
            .as_bytes(),
        );
        let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
                content_id,
                stream.len(),
                stream
            )
            .as_bytes(),
        );
    }

    let mut trailer_extra = String::new();
    if encrypt {
        let id = offsets.len() + 1;
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Filter /Standard /V 1 /R 2 /Length 40 /P -44 /O <{h}> /U <{h}> >> endobj\n",
                id,
                h = "00".repeat(32)
            )
            .as_bytes(),
        );
        trailer_extra = format!(" /Encrypt {} 0 R /ID [<{x}> <{x}>]", id, x = "00".repeat(16));
    }

    let size = offsets.len() + 1;
    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", size).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R{} >>\nstartxref\n{}\n%%EOF\n",
            size, trailer_extra, xref_start
        )
        .as_bytes(),
    );
    out
}

fn non_blank(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect()
}

#[test]
fn two_page_pdf_extracts_pages_in_order() {
    let bytes = pdf_with_pages(&["first page ERROR", "second page"], false);
    let lines = extract(SourceFile::from_bytes(&bytes, FileType::Pdf)).unwrap();

    assert_eq!(non_blank(&lines), vec!["first page ERROR", "second page"]);
    let first = lines.iter().position(|l| l.contains("first page")).unwrap();
    let second = lines.iter().position(|l| l.contains("second page")).unwrap();
    assert!(first < second, "pages out of order: {:?}", lines);
}

#[test]
fn pdf_lines_filter_like_any_other_source() {
    let bytes = pdf_with_pages(&["first page ERROR", "second page"], false);
    let mut rendered = Vec::new();
    let outcome = handle_request(
        &RequestOptions::default(),
        SourceFile::from_bytes(&bytes, FileType::Pdf),
        "error",
        |m| rendered.push(m.text.clone()),
    )
    .unwrap();

    assert_eq!(outcome.file_type, FileType::Pdf);
    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].text.trim(), "first page ERROR");
    assert_eq!(outcome.matches[0].matched_texts(), vec!["ERROR"]);
    assert_eq!(rendered.len(), 1);
}

#[test]
fn encrypted_pdf_is_refused() {
    let bytes = pdf_with_pages(&["secret"], true);
    let err = extract(SourceFile::from_bytes(&bytes, FileType::Pdf)).unwrap_err();
    assert_eq!(err.file_type, FileType::Pdf);
    assert!(
        matches!(err.kind, ParseErrorKind::Encrypted),
        "expected Encrypted, got {:?}",
        err.kind
    );
}

#[test]
fn cli_filters_pdf_file() {
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("report.pdf");
    fs::write(&pdf, pdf_with_pages(&["first page ERROR", "second page"], false)).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lsift"))
        .arg("--config")
        .arg(tmp.path().join("absent.toml"))
        .args(["filter", pdf.to_str().unwrap(), "error"])
        .args(["--format", "plain", "--no-telemetry"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(stdout.contains("first page ERROR"), "stdout: {}", stdout);
    assert!(!stdout.contains("second page"));
}

#[test]
fn cli_reports_encrypted_pdf() {
    let tmp = TempDir::new().unwrap();
    let pdf = tmp.path().join("locked.pdf");
    fs::write(&pdf, pdf_with_pages(&["secret"], true)).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lsift"))
        .arg("--config")
        .arg(tmp.path().join("absent.toml"))
        .args(["filter", pdf.to_str().unwrap(), "secret", "--no-telemetry"])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("encrypted"), "stderr: {}", stderr);
}
