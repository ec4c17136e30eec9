//! Per-file reports in plain text and JSON.
//!
//! Reports are built from a [`FileOutcome`] and rendered to strings; the
//! caller decides where they go.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Diagnostic;
use crate::fix::EditCategory;
use crate::source::LineIndex;
use crate::transform::FileOutcome;

/// One applied insertion, positioned in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditRecord {
    pub category: EditCategory,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub subjects: Vec<String>,
}

/// Summary of one transformed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub name: String,
    pub changed: bool,
    pub failed: bool,
    /// Hex SHA-256 of the input bytes
    pub input_sha256: String,
    /// Hex SHA-256 of the output bytes; equal to the input digest for no-op files
    pub output_sha256: String,
    pub edits: Vec<EditRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut sha = Sha256::new();
    sha.update(bytes);
    format!("{:x}", sha.finalize())
}

impl FileReport {
    /// Build a report from the input bytes and the outcome of transforming them.
    pub fn new(name: impl Into<String>, input: &[u8], outcome: &FileOutcome) -> Self {
        let lines = LineIndex::new(input);
        let edits = outcome
            .edits
            .iter()
            .map(|e| {
                let (line, column) = lines.line_col(e.offset);
                EditRecord {
                    category: e.category,
                    offset: e.offset,
                    line,
                    column,
                    subjects: e.subjects.clone(),
                }
            })
            .collect();
        Self {
            name: name.into(),
            changed: outcome.changed(),
            failed: outcome.failed,
            input_sha256: sha256_hex(input),
            output_sha256: sha256_hex(&outcome.output),
            edits,
            diagnostics: outcome.diagnostics.clone(),
        }
    }
}

/// Render reports as plain text, one block per file.
pub fn render_plain(reports: &[FileReport]) -> String {
    let mut out = String::new();
    for r in reports {
        let status = if r.failed {
            "failed"
        } else if r.changed {
            "fixed"
        } else {
            "unchanged"
        };
        out.push_str(&format!("{}: {} ({} edits)\n", r.name, status, r.edits.len()));
        for e in &r.edits {
            out.push_str(&format!(
                "  {}:{}: {} {}\n",
                e.line,
                e.column,
                e.category,
                e.subjects.join(", ")
            ));
        }
        for d in &r.diagnostics {
            out.push_str(&format!("  {}\n", d));
        }
    }
    out
}

/// Render reports as a pretty-printed JSON object `{ "files": [...] }`.
pub fn render_json(reports: &[FileReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({ "files": reports }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixConfig;
    use crate::transform::transform_or_original;

    fn report(src: &str) -> FileReport {
        let outcome = transform_or_original(src.as_bytes(), &FixConfig::default());
        FileReport::new("a.cpp", src.as_bytes(), &outcome)
    }

    #[test]
    fn test_digests_detect_noop() {
        let r = report("int f(int a) { return a; }");
        assert!(!r.changed);
        assert_eq!(r.input_sha256, r.output_sha256);
        assert_eq!(r.input_sha256.len(), 64);

        let r = report("int f(int a) { return 0; }");
        assert!(r.changed);
        assert_ne!(r.input_sha256, r.output_sha256);
    }

    #[test]
    fn test_plain_rendering() {
        let r = report("int f(int a,\n      int b)\n{\n    return 0;\n}\n");
        let text = render_plain(&[r]);
        assert!(text.starts_with("a.cpp: fixed (1 edits)\n"));
        assert!(text.contains("  3:2: unused-param-discard a, b\n"));
    }

    #[test]
    fn test_json_rendering() {
        let r = report("void g(int b) { /*");
        let json = render_json(&[r]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let file = &value["files"][0];
        assert_eq!(file["failed"], true);
        assert_eq!(file["diagnostics"][0]["code"], "lex_error");
        assert_eq!(file["diagnostics"][0]["severity"], "error");
    }
}
