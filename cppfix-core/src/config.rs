//! Configuration loading from cppfix.toml text.
//!
//! Every section and key is optional; missing values take the defaults,
//! which insert `(void) x;` discards and `default: break;` labels.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{FixError, FixResult};

/// Main configuration structure for cppfix.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FixConfig {
    /// Unused parameter fixes.
    pub params: ParamsConfig,
    /// Incomplete switch fixes.
    pub switches: SwitchesConfig,
    /// Formatting of inserted text.
    pub format: FormatConfig,
}

/// Spelling of the discard statement for an unused parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DiscardStyle {
    /// `(void) x;`
    #[default]
    VoidCast,
    /// `static_cast<void>(x);`
    StaticCast,
}

impl DiscardStyle {
    /// Discard statement for one parameter name, spelled with its source bytes.
    pub fn statement(self, name: &[u8]) -> Vec<u8> {
        let (open, close): (&[u8], &[u8]) = match self {
            Self::VoidCast => (b"(void) ", b";"),
            Self::StaticCast => (b"static_cast<void>(", b");"),
        };
        [open, name, close].concat()
    }
}

/// What an incomplete switch receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchPolicy {
    /// A single `default: break;`
    #[default]
    Default,
    /// One `case` label per missing enumerator, then `break;`
    MissingCases,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsConfig {
    pub enabled: bool,
    pub style: DiscardStyle,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            style: DiscardStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchesConfig {
    pub enabled: bool,
    pub policy: SwitchPolicy,
    /// Text of a `/* ... */` marker placed after the inserted `break;`.
    pub comment: Option<String>,
}

impl Default for SwitchesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: SwitchPolicy::default(),
            comment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Spaces per indentation level when it cannot be inferred.
    pub indent_width: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

impl FixConfig {
    /// Parse and validate configuration text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text).context("Invalid cppfix.toml")?;
        cfg.validate().context("Invalid cppfix.toml")?;
        Ok(cfg)
    }

    /// Reject values that would produce malformed insertions.
    pub fn validate(&self) -> FixResult<()> {
        if !(1..=16).contains(&self.format.indent_width) {
            return Err(FixError::config(format!(
                "format.indent_width must be between 1 and 16, got {}",
                self.format.indent_width
            )));
        }
        if let Some(comment) = &self.switches.comment {
            if comment.contains("*/") || comment.contains('\n') {
                return Err(FixError::config(
                    "switches.comment must not contain `*/` or a newline",
                ));
            }
        }
        Ok(())
    }

    /// The `/* ... */` marker, with a leading space, or an empty string.
    pub fn comment_marker(&self) -> String {
        match &self.switches.comment {
            Some(c) if !c.is_empty() => format!(" /* {} */", c),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = FixConfig::default();
        assert!(cfg.params.enabled);
        assert!(cfg.switches.enabled);
        assert_eq!(cfg.params.style, DiscardStyle::VoidCast);
        assert_eq!(cfg.switches.policy, SwitchPolicy::Default);
        assert_eq!(cfg.format.indent_width, 4);
        assert_eq!(cfg.comment_marker(), "");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(FixConfig::from_toml("").unwrap(), FixConfig::default());
    }

    #[test]
    fn test_full_toml() {
        let cfg = FixConfig::from_toml(
            r#"
[params]
style = "static-cast"

[switches]
policy = "missing-cases"
comment = "TODO?"

[format]
indent_width = 2
"#,
        )
        .unwrap();
        assert_eq!(cfg.params.style, DiscardStyle::StaticCast);
        assert!(cfg.params.enabled);
        assert_eq!(cfg.switches.policy, SwitchPolicy::MissingCases);
        assert_eq!(cfg.comment_marker(), " /* TODO? */");
        assert_eq!(cfg.format.indent_width, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(FixConfig::from_toml("[switches]\npolicy = \"sometimes\"").is_err());
        assert!(FixConfig::from_toml("[format]\nindent_width = 0").is_err());
        assert!(FixConfig::from_toml("[switches]\ncomment = \"a */ b\"").is_err());
    }

    #[test]
    fn test_discard_statement() {
        assert_eq!(DiscardStyle::VoidCast.statement(b"x"), b"(void) x;");
        assert_eq!(DiscardStyle::StaticCast.statement(b"x"), b"static_cast<void>(x);");
    }
}
