//! Parallel multi-file driver over in-memory sources.
//!
//! Files share nothing, so each one runs the full pipeline on a rayon
//! worker. Outcomes come back in input order. A file that fails keeps its
//! original bytes and carries its diagnostics; the others are unaffected.

use rayon::prelude::*;

use crate::config::FixConfig;
use crate::logging::{log_event, log_file_outcome};
use crate::transform::{transform_or_original, FileOutcome};

/// One named input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Caller-chosen label, usually a path
    pub name: String,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Transform every file in parallel; `result[i]` belongs to `files[i]`.
pub fn transform_batch(files: &[SourceFile], config: &FixConfig) -> Vec<FileOutcome> {
    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|f| transform_or_original(&f.contents, config))
        .collect();

    for (file, outcome) in files.iter().zip(&outcomes) {
        log_file_outcome(&file.name, outcome);
    }
    let changed = outcomes.iter().filter(|o| o.changed()).count();
    let failed = outcomes.iter().filter(|o| o.failed).count();
    let level = if failed > 0 { "WARN" } else { "INFO" };
    log_event(
        level,
        &format!("batch complete: {} files, {} changed, {} failed", files.len(), changed, failed),
    );
    outcomes
}
