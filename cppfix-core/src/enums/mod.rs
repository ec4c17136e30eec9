//! Enum declarations and type-name resolution.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │ enum_extractor.rs   │────▶│  enum_registry.rs   │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  Enum bodies to     │     │  Resolve a written  │
//! │  ordered variants   │     │  type name by scope │
//! └─────────────────────┘     └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cppfix_core::enums::{extract_enums, EnumRegistry, Resolution};
//!
//! let index = cppfix_core::structure::index(source)?;
//! let registry = EnumRegistry::new(extract_enums(&index));
//!
//! if let Resolution::Found(decl) = registry.resolve("Color", &[]) {
//!     println!("{} has {} enumerators", decl.name, decl.enumerators.len());
//! }
//! ```

pub mod enum_extractor;
pub mod enum_registry;

// Re-exports for convenience
pub use enum_extractor::{extract_enums, EnumDecl};
pub use enum_registry::{EnumRegistry, Resolution};
