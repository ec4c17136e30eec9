//! Unused parameter analysis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │ param_extractor.rs  │────▶│   param_usage.rs    │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  Split parameter    │     │  Walk body regions, │
//! │  lists into decls   │     │  honour shadowing   │
//! └─────────────────────┘     └─────────────────────┘
//! ```

pub mod param_extractor;
pub mod param_usage;

// Re-exports for convenience
pub use param_extractor::{extract_params, ParamDecl};
pub use param_usage::{find_unused_params, referenced_params, UnusedParams};
