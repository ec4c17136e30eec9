//! Incomplete switch analysis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │ switch_extractor.rs │────▶│ switch_coverage.rs  │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  Case labels and    │     │  Operand type, enum │
//! │  `default:` per body│     │  lookup, missing    │
//! └─────────────────────┘     └─────────────────────┘
//! ```

pub mod switch_coverage;
pub mod switch_extractor;

// Re-exports for convenience
pub use switch_coverage::{analyze_switches, CoverageReport, SwitchFix};
pub use switch_extractor::{extract_switches, CaseLabel, SwitchInfo};
