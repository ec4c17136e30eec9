//! Case label extraction from switch bodies.
//!
//! Extracts, per `switch` region:
//! - Named case labels (`case Red:`, `case Color::Red:`), last segment kept
//! - Whether a `default:` label exists
//! - The last label keyword, used to indent inserted text
//!
//! Labels inside nested plain blocks still belong to the switch
//! (`case A: { case B: }` is legal); nested switches are skipped.

use serde::Serialize;

use crate::structure::{BlockKind, RegionId, RegionKind, StructuralIndex, TokenSpan};

/// One `case` label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseLabel {
    /// Enumerator named by the label, `None` for literals and expressions
    pub name: Option<String>,
    /// Code-token index of the `case` keyword
    pub keyword: usize,
    /// Code-token index of the terminating `:`
    pub colon: usize,
}

/// Information about a switch statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchInfo {
    /// Region of the switch body
    pub region: RegionId,
    /// The parenthesized controlling expression
    pub condition: TokenSpan,
    /// Case labels in source order
    pub cases: Vec<CaseLabel>,
    pub has_default: bool,
    /// Code-token index of the last `case` or `default` keyword
    pub last_label: Option<usize>,
}

impl SwitchInfo {
    /// Enumerator names mentioned by case labels.
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().filter_map(|c| c.name.as_deref())
    }
}

/// Index of the `:` ending the case label that starts after `case` at `kw`.
fn label_colon(index: &StructuralIndex<'_>, kw: usize, limit: usize) -> Option<usize> {
    let code = &index.tokens;
    let mut ternary = 0usize;
    let mut i = kw + 1;
    while i < limit {
        let t = &code[i];
        if t.is_punct("(") || t.is_punct("[") || t.is_punct("{") {
            i = index.partner[i]? + 1;
            continue;
        }
        if t.is_punct("?") {
            ternary += 1;
        } else if t.is_punct(":") {
            if ternary == 0 {
                return Some(i);
            }
            ternary -= 1;
        } else if t.is_punct(";") {
            return None;
        }
        i += 1;
    }
    None
}

/// Enumerator name of a label expression: an identifier, optionally qualified.
fn label_name(index: &StructuralIndex<'_>, range: std::ops::Range<usize>) -> Option<String> {
    let code = &index.tokens;
    let mut r = range;
    while r.len() >= 2 && code[r.start].is_punct("(") && index.partner[r.start] == Some(r.end - 1) {
        r = r.start + 1..r.end - 1;
    }
    let toks = &code[r];
    let last = toks.last()?;
    // `Red`, `Color::Red`, `::Red`: identifiers alternating with `::`, read backwards
    let chain = toks.iter().rev().enumerate().all(|(n, t)| {
        if n % 2 == 0 {
            t.is_ident()
        } else {
            t.is_punct("::")
        }
    });
    chain.then(|| last.as_str().into_owned())
}

struct LabelCollector<'i, 'a> {
    index: &'i StructuralIndex<'a>,
    info: SwitchInfo,
}

impl LabelCollector<'_, '_> {
    fn collect(&mut self, id: RegionId) {
        let index = self.index;
        let region = index.tree.get(id);
        let code = &index.tokens;
        let mut children = region.children.iter().peekable();
        let mut i = region.open + 1;
        while i < region.close {
            if let Some(&&child_id) = children.peek() {
                let child = index.tree.get(child_id);
                if child.open == i {
                    children.next();
                    if matches!(child.kind, RegionKind::Block(BlockKind::Plain)) {
                        self.collect(child_id);
                    }
                    i = child.close + 1;
                    continue;
                }
            }
            let t = &code[i];
            if t.is_keyword("case") {
                if let Some(colon) = label_colon(index, i, region.close) {
                    self.info.cases.push(CaseLabel {
                        name: label_name(index, i + 1..colon),
                        keyword: i,
                        colon,
                    });
                    self.info.last_label = Some(i);
                    i = colon + 1;
                    continue;
                }
            } else if t.is_keyword("default") && code.get(i + 1).is_some_and(|n| n.is_punct(":")) {
                self.info.has_default = true;
                self.info.last_label = Some(i);
            }
            i += 1;
        }
    }
}

/// Extract labels of every switch in the file, in source order.
pub fn extract_switches(index: &StructuralIndex<'_>) -> Vec<SwitchInfo> {
    index
        .switches()
        .map(|(region, head)| {
            let mut collector = LabelCollector {
                index,
                info: SwitchInfo {
                    region: region.id,
                    condition: head.condition,
                    cases: Vec::new(),
                    has_default: false,
                    last_label: None,
                },
            };
            collector.collect(region.id);
            collector.info
        })
        .collect()
}
