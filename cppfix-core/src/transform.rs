//! Single-file pipeline: bytes in, rewritten bytes (or diagnostics) out.
//!
//! ```text
//! tokenize ─▶ index ─▶ enums ─▶ params ─▶ switches ─▶ plan ─▶ apply
//! ```
//!
//! Nothing survives between calls; every stage is rebuilt from the buffer.
//! Lex, structural and planner errors abort the file. An unresolvable
//! switch type only skips that switch and is reported as a warning.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::FixConfig;
use crate::enums::{extract_enums, EnumRegistry};
use crate::error::{Diagnostic, FixError};
use crate::fix::{apply, plan_edits, Edit};
use crate::lexer::tokenize;
use crate::params::find_unused_params;
use crate::source::LineIndex;
use crate::structure::index_tokens;
use crate::switches::analyze_switches;

/// Successful transform of one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub output: Vec<u8>,
    /// Applied insertions, sorted by offset into the input
    pub edits: Vec<Edit>,
    /// Non-fatal diagnostics, one per skipped switch
    pub warnings: Vec<Diagnostic>,
}

impl Transformed {
    /// True when at least one insertion was made.
    pub fn changed(&self) -> bool {
        !self.edits.is_empty()
    }
}

/// Transform with the default configuration.
pub fn transform(source: &[u8]) -> Result<Transformed, Vec<Diagnostic>> {
    transform_with(source, &FixConfig::default())
}

/// Transform with an explicit configuration.
///
/// On failure the returned diagnostics hold the fatal error last, preceded
/// by any warnings gathered before it.
pub fn transform_with(source: &[u8], config: &FixConfig) -> Result<Transformed, Vec<Diagnostic>> {
    let lines = LineIndex::new(source);
    let mut warnings: Vec<FixError> = Vec::new();

    match run(source, config, &mut warnings) {
        Ok((output, edits)) => {
            info!(
                bytes = source.len(),
                edits = edits.len(),
                warnings = warnings.len(),
                "transform complete"
            );
            Ok(Transformed {
                output,
                edits,
                warnings: warnings.iter().map(|w| w.to_diagnostic(&lines)).collect(),
            })
        }
        Err(err) => {
            error!(code = err.code(), offset = ?err.offset(), "transform aborted: {}", err);
            warnings.push(err);
            Err(warnings.iter().map(|w| w.to_diagnostic(&lines)).collect())
        }
    }
}

fn run(
    source: &[u8],
    config: &FixConfig,
    warnings: &mut Vec<FixError>,
) -> Result<(Vec<u8>, Vec<Edit>), FixError> {
    config.validate()?;

    let tokens = tokenize(source)?;
    debug!(tokens = tokens.len(), "lexed");
    let index = index_tokens(source, tokens)?;

    let registry = EnumRegistry::new(extract_enums(&index));
    debug!(enums = registry.len(), "enums registered");

    let unused = if config.params.enabled {
        find_unused_params(&index)
    } else {
        Vec::new()
    };
    for u in &unused {
        debug!(function = %u.function, params = ?u.names, "unused parameters");
    }

    let fixes = if config.switches.enabled {
        let coverage = analyze_switches(&index, &registry);
        for w in &coverage.warnings {
            warn!(offset = ?w.offset(), "switch skipped: {}", w);
        }
        warnings.extend(coverage.warnings);
        coverage.fixes
    } else {
        Vec::new()
    };

    let edits = plan_edits(&index, &unused, &fixes, config)?;
    let output = apply(source, &edits)?;
    Ok((output, edits))
}

/// Result of a transform that never fails: a failed file keeps its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub output: Vec<u8>,
    pub edits: Vec<Edit>,
    pub diagnostics: Vec<Diagnostic>,
    /// A fatal diagnostic aborted the file
    pub failed: bool,
}

impl FileOutcome {
    pub fn changed(&self) -> bool {
        !self.edits.is_empty()
    }
}

/// Transform, falling back to the unmodified input on a fatal error.
pub fn transform_or_original(source: &[u8], config: &FixConfig) -> FileOutcome {
    match transform_with(source, config) {
        Ok(t) => FileOutcome {
            output: t.output,
            edits: t.edits,
            diagnostics: t.warnings,
            failed: false,
        },
        Err(diagnostics) => FileOutcome {
            output: source.to_vec(),
            edits: Vec::new(),
            diagnostics,
            failed: true,
        },
    }
}
