//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use cppfix_core::prelude::*;
//! ```

// Pipeline
pub use crate::transform::{transform, transform_or_original, transform_with, FileOutcome, Transformed};

// Errors and diagnostics
pub use crate::error::{Diagnostic, FixError, FixResult, Severity};

// Edits
pub use crate::fix::{Edit, EditCategory};

// Configuration
pub use crate::config::{DiscardStyle, FixConfig, SwitchPolicy};

// Reports
pub use crate::report::{render_json, render_plain, FileReport};

#[cfg(feature = "batch")]
pub use crate::batch::{transform_batch, SourceFile};
