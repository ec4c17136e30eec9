//! cppfix-core: tolerant C++ source rewriter for two warning classes
//!
//! This library fixes unused-parameter warnings and incomplete enum
//! `switch` warnings by inserting text into C++ sources. It never parses
//! C++ fully: a lexer and a brace-region index are enough to find function
//! bodies, switch bodies and enum declarations, and every fix is a pure
//! insertion, so the original bytes always survive unchanged.
//!
//! # Features
//!
//! - **Unused parameters**: named parameters never referenced in the body,
//!   a constructor initializer list or a function-try-block handler get a
//!   `(void) x;` discard right after the opening brace
//! - **Incomplete switches**: a switch over a known enum that misses
//!   enumerators and has no `default:` gets `default: break;` (or the
//!   missing `case` labels) right before its closing brace
//! - **Idempotent**: a second run over the output produces no edits
//! - **Parallel batches**: independent files on rayon workers
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cppfix_core::prelude::*;
//!
//! let fixed = transform(b"int f(int a) { return 0; }")?;
//! assert_eq!(fixed.output, b"int f(int a) { (void) a; return 0; }");
//! ```
//!
//! # Module Organization
//!
//! - [`lexer`]: Tolerant C++ tokenizer
//! - [`structure`]: Delimiter matching and region classification
//! - [`enums`]: Enum declarations and name resolution
//! - [`params`]: Parameter extraction and usage analysis
//! - [`switches`]: Case labels and enum coverage
//! - [`fix`]: Edit planning and application
//! - [`transform`]: The single-file pipeline
//! - [`report`]: Plain and JSON reports
//! - [`error`]: Typed errors and diagnostics
//!
//! # Cargo Features
//!
//! - `batch` (default): Parallel multi-file driver

pub mod config;
pub mod enums;
pub mod error;
pub mod fix;
pub mod lexer;
pub mod logging;
pub mod params;
pub mod prelude;
pub mod report;
pub mod source;
pub mod structure;
pub mod switches;
pub mod transform;

#[cfg(feature = "batch")]
pub mod batch;

// Re-exports for convenience
pub use error::{Diagnostic, FixError, FixResult, Severity};
pub use transform::{transform, transform_or_original, transform_with, FileOutcome, Transformed};
