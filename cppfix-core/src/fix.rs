//! Edit planning and application.
//!
//! Every fix is a pure insertion. The planner turns analyzer findings into
//! [`Edit`]s, orders them by offset (ties broken by category) and rejects any
//! plan that would insert twice at one point for one purpose or split a
//! token. The applier copies the source left to right, splicing insertions
//! in; every input byte survives in order.
//!
//! Inserted text follows the surrounding layout:
//! - a switch whose `}` starts a line gets its label aligned with the last
//!   existing label and its `break;` one level deeper
//! - a body whose `{` ends a line gets one discard line per parameter,
//!   indented like the body's first statement
//! - anything else gets single-line text

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{FixConfig, SwitchPolicy};
use crate::error::{FixError, FixResult};
use crate::params::UnusedParams;
use crate::source::{ends_line, line_ending, line_indent, starts_line};
use crate::structure::StructuralIndex;
use crate::switches::SwitchFix;

/// What an edit fixes. Order is the tie-break at equal offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditCategory {
    UnusedParamDiscard,
    MissingCase,
    MissingDefault,
}

impl std::fmt::Display for EditCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::UnusedParamDiscard => "unused-param-discard",
            Self::MissingCase => "missing-case",
            Self::MissingDefault => "missing-default",
        })
    }
}

/// A single insertion into the original buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Byte offset in the original buffer; text goes before the byte there
    pub offset: usize,
    /// Inserted bytes; identifiers are copied from the source verbatim
    pub text: Vec<u8>,
    pub category: EditCategory,
    /// Parameter names or enumerators the edit covers
    pub subjects: Vec<String>,
}

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Layout facts shared by all insertions into one buffer.
struct Layout<'s> {
    source: &'s [u8],
    newline: &'static str,
    indent_width: usize,
}

impl<'s> Layout<'s> {
    fn new(source: &'s [u8], config: &FixConfig) -> Self {
        Self {
            source,
            newline: line_ending(source),
            indent_width: config.format.indent_width,
        }
    }

    /// One indentation step, matching tabs if the reference indent uses them.
    fn unit(&self, reference: &[u8]) -> String {
        if reference.contains(&b'\t') {
            "\t".to_string()
        } else {
            " ".repeat(self.indent_width)
        }
    }

    fn indent(&self, offset: usize) -> String {
        String::from_utf8_lossy(line_indent(self.source, offset)).into_owned()
    }
}

/// Discard statements for one function, inserted right after its `{`.
fn discard_edit(index: &StructuralIndex<'_>, layout: &Layout<'_>, unused: &UnusedParams, config: &FixConfig) -> Edit {
    let region = index.tree.get(unused.region);
    let at = region.body_offset();
    let statements: Vec<Vec<u8>> = unused
        .name_tokens
        .iter()
        .map(|k| config.params.style.statement(index.tokens[*k].text))
        .collect();

    let text: Vec<u8> = if ends_line(layout.source, at) {
        let brace_indent = layout.indent(region.start);
        let first = region.open + 1;
        let indent = if first < region.close {
            layout.indent(index.tokens[first].start)
        } else {
            format!("{}{}", brace_indent, layout.unit(brace_indent.as_bytes()))
        };
        statements
            .iter()
            .flat_map(|s| [layout.newline.as_bytes(), indent.as_bytes(), s.as_slice()].concat())
            .collect()
    } else {
        let mut text = b" ".to_vec();
        text.extend_from_slice(&statements.join(&b' '));
        if layout.source.get(at).is_some_and(|b| !is_blank(*b)) {
            text.push(b' ');
        }
        text
    };

    Edit {
        offset: at,
        text,
        category: EditCategory::UnusedParamDiscard,
        subjects: unused.names.clone(),
    }
}

/// Label text for an incomplete switch, inserted right before its `}`.
fn switch_edit(index: &StructuralIndex<'_>, layout: &Layout<'_>, fix: &SwitchFix, config: &FixConfig) -> Edit {
    let region = index.tree.get(fix.region);
    let at = region.close_offset();
    let (labels, category): (Vec<String>, _) = match config.switches.policy {
        SwitchPolicy::Default => (vec!["default:".to_string()], EditCategory::MissingDefault),
        SwitchPolicy::MissingCases => (
            fix.missing
                .iter()
                .map(|e| format!("case {}:", fix.case_label(e)))
                .collect(),
            EditCategory::MissingCase,
        ),
    };
    let comment = config.comment_marker();

    let text = if starts_line(layout.source, at) {
        let nl = layout.newline;
        let brace_indent = layout.indent(at);
        let case_indent = match fix.last_label {
            Some(k) => layout.indent(index.tokens[k].start),
            None => format!("{}{}", brace_indent, layout.unit(brace_indent.as_bytes())),
        };
        let unit = layout.unit(case_indent.as_bytes());
        let lead = match case_indent.strip_prefix(brace_indent.as_str()) {
            Some(rest) => rest.to_string(),
            None => unit.clone(),
        };
        let mut text = lead;
        text.push_str(&labels.join(&format!("{}{}", nl, case_indent)));
        text.push_str(&format!("{}{}{}break;{}{}{}", nl, case_indent, unit, comment, nl, brace_indent));
        text
    } else {
        let body = format!("{} break;{}", labels.join(" "), comment);
        let prev_blank = at > 0 && is_blank(layout.source[at - 1]);
        if prev_blank {
            format!("{} ", body)
        } else {
            format!(" {}", body)
        }
    };

    Edit {
        offset: at,
        text: text.into_bytes(),
        category,
        subjects: fix.missing.clone(),
    }
}

/// Sort edits and reject plans that overlap or split a token.
pub fn check_edits(index: &StructuralIndex<'_>, edits: &mut [Edit]) -> FixResult<()> {
    edits.sort_by(|a, b| a.offset.cmp(&b.offset).then(a.category.cmp(&b.category)));
    let len = index.source.len();
    for edit in edits.iter() {
        if edit.offset > len {
            return Err(FixError::overlap(
                edit.offset,
                format!("{} edit past end of input ({} bytes)", edit.category, len),
            ));
        }
        if index.splits_token(edit.offset) {
            return Err(FixError::overlap(
                edit.offset,
                format!("{} edit would split a token", edit.category),
            ));
        }
    }
    for pair in edits.windows(2) {
        if pair[0].offset == pair[1].offset && pair[0].category == pair[1].category {
            return Err(FixError::overlap(
                pair[1].offset,
                format!("two {} edits at one offset", pair[1].category),
            ));
        }
    }
    Ok(())
}

/// Plan every fix for one buffer. The result is sorted and validated.
pub fn plan_edits(
    index: &StructuralIndex<'_>,
    unused: &[UnusedParams],
    switches: &[SwitchFix],
    config: &FixConfig,
) -> FixResult<Vec<Edit>> {
    let layout = Layout::new(index.source, config);
    let mut edits: Vec<Edit> = Vec::with_capacity(unused.len() + switches.len());
    if config.params.enabled {
        edits.extend(unused.iter().map(|u| discard_edit(index, &layout, u, config)));
    }
    if config.switches.enabled {
        edits.extend(switches.iter().map(|s| switch_edit(index, &layout, s, config)));
    }
    check_edits(index, &mut edits)?;
    debug!(edits = edits.len(), "planned edits");
    Ok(edits)
}

/// Splice sorted insertions into `source`.
pub fn apply(source: &[u8], edits: &[Edit]) -> FixResult<Vec<u8>> {
    let extra: usize = edits.iter().map(|e| e.text.len()).sum();
    let mut out = Vec::with_capacity(source.len() + extra);
    let mut cursor = 0;
    for edit in edits {
        if edit.offset < cursor || edit.offset > source.len() {
            return Err(FixError::overlap(edit.offset, "edits out of order"));
        }
        out.extend_from_slice(&source[cursor..edit.offset]);
        out.extend_from_slice(&edit.text);
        cursor = edit.offset;
    }
    out.extend_from_slice(&source[cursor..]);
    Ok(out)
}

/// Remove applied insertions from `output`, giving back the original buffer.
pub fn revert(output: &[u8], edits: &[Edit]) -> Option<Vec<u8>> {
    let mut original = Vec::with_capacity(output.len());
    let mut cursor = 0;
    let mut shift = 0;
    for edit in edits {
        let at = edit.offset + shift;
        original.extend_from_slice(output.get(cursor..at)?);
        let end = at + edit.text.len();
        if output.get(at..end)? != edit.text.as_slice() {
            return None;
        }
        cursor = end;
        shift += edit.text.len();
    }
    original.extend_from_slice(output.get(cursor..)?);
    Some(original)
}
