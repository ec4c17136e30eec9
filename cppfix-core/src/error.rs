//! Typed error handling for cppfix.
//!
//! Every failure the pipeline can produce maps onto one of four taxonomy
//! entries. Lexing and structural failures are fatal for the file; an
//! ambiguous switch type only suppresses the fix for that switch; an
//! overlapping edit is an internal fault that discards every edit for the file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::LineIndex;

/// Main error type for cppfix operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixError {
    /// Unterminated comment or literal.
    #[error("lex error at byte {offset}: {message}")]
    Lex { offset: usize, message: String },

    /// Unbalanced or mismatched delimiter.
    #[error("structural error at byte {offset}: {message}")]
    Structural { offset: usize, message: String },

    /// A switch controlling expression that cannot be tied to one known enum.
    #[error("ambiguous switch type at byte {offset}: {message}")]
    AmbiguousType { offset: usize, message: String },

    /// Planner invariant violation.
    #[error("overlapping edit at byte {offset}: {message}")]
    OverlappingEdit { offset: usize, message: String },

    /// Invalid configuration.
    #[error("config error: {message}")]
    Config { message: String },
}

impl FixError {
    /// Create a lex error.
    pub fn lex(offset: usize, message: impl Into<String>) -> Self {
        Self::Lex {
            offset,
            message: message.into(),
        }
    }

    /// Create a structural error.
    pub fn structural(offset: usize, message: impl Into<String>) -> Self {
        Self::Structural {
            offset,
            message: message.into(),
        }
    }

    /// Create an ambiguous-type error.
    pub fn ambiguous(offset: usize, message: impl Into<String>) -> Self {
        Self::AmbiguousType {
            offset,
            message: message.into(),
        }
    }

    /// Create an overlapping-edit error.
    pub fn overlap(offset: usize, message: impl Into<String>) -> Self {
        Self::OverlappingEdit {
            offset,
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Byte offset the error points at, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Lex { offset, .. }
            | Self::Structural { offset, .. }
            | Self::AmbiguousType { offset, .. }
            | Self::OverlappingEdit { offset, .. } => Some(*offset),
            Self::Config { .. } => None,
        }
    }

    /// Whether the error aborts the whole file.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AmbiguousType { .. })
    }

    /// Severity of the diagnostic this error becomes.
    pub fn severity(&self) -> Severity {
        if self.is_fatal() {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    /// Stable snake-case code for the taxonomy entry.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Lex { .. } => "lex_error",
            Self::Structural { .. } => "structural_error",
            Self::AmbiguousType { .. } => "ambiguous_type",
            Self::OverlappingEdit { .. } => "overlapping_edit",
            Self::Config { .. } => "config_error",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Lex { message, .. }
            | Self::Structural { message, .. }
            | Self::AmbiguousType { message, .. }
            | Self::OverlappingEdit { message, .. }
            | Self::Config { message } => message,
        }
    }

    /// Convert into a positioned diagnostic.
    pub fn to_diagnostic(&self, lines: &LineIndex) -> Diagnostic {
        let offset = self.offset().unwrap_or(0);
        let (line, column) = lines.line_col(offset);
        Diagnostic {
            offset,
            line,
            column,
            severity: self.severity(),
            code: self.code().to_string(),
            message: self.message().to_string(),
        }
    }
}

/// Convenience type alias for cppfix results.
pub type FixResult<T> = Result<T, FixError>;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Aborts the transform for the file.
    Error,
    /// Suppresses one fix; the rest of the file is still rewritten.
    Warning,
}

/// A positioned message reported to the caller of a transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Byte offset into the input
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column, in bytes
    pub column: usize,
    pub severity: Severity,
    /// Taxonomy code, e.g. `ambiguous_type`
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    /// Check if this diagnostic aborted the transform.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{}:{}: {}[{}]: {}",
            self.line, self.column, level, self.code, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(FixError::lex(0, "unterminated comment").is_fatal());
        assert!(FixError::structural(3, "unbalanced").is_fatal());
        assert!(FixError::overlap(9, "same offset").is_fatal());
        assert!(!FixError::ambiguous(4, "no declaration").is_fatal());
    }

    #[test]
    fn test_offset() {
        assert_eq!(FixError::structural(12, "x").offset(), Some(12));
        assert_eq!(FixError::config("bad").offset(), None);
    }

    #[test]
    fn test_to_diagnostic_position() {
        let src = b"int a;\nint b /* oops";
        let lines = LineIndex::new(src);
        let diag = FixError::lex(13, "unterminated block comment").to_diagnostic(&lines);
        assert_eq!(diag.line, 2);
        assert_eq!(diag.column, 7);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code, "lex_error");
        assert!(diag.is_error());
    }

    #[test]
    fn test_display() {
        let lines = LineIndex::new(b"switch (c) {}");
        let diag = FixError::ambiguous(0, "no declaration for `c`").to_diagnostic(&lines);
        assert_eq!(
            diag.to_string(),
            "1:1: warning[ambiguous_type]: no declaration for `c`"
        );
    }
}
