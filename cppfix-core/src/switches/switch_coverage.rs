//! Switch coverage analysis.
//!
//! For each switch without a `default:` label, the controlling expression's
//! type is traced back to a declaration and resolved against the enum
//! registry. Accepted operand shapes:
//! - a variable or parameter: `switch (c)`, `switch ((c))`
//! - a member through `this`: `switch (this->mode)`
//! - a cast: `switch (static_cast<Color>(v))`, `switch ((Color) v)`
//!
//! Switches over builtin types, and switches whose labels are all literals,
//! are skipped without a diagnostic. Every other switch that cannot be tied
//! to exactly one enum of this file yields an ambiguous-type warning.

use std::collections::HashSet;
use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use super::switch_extractor::{extract_switches, SwitchInfo};
use crate::enums::enum_extractor::flatten_scope;
use crate::enums::{EnumRegistry, Resolution};
use crate::error::FixError;
use crate::params::extract_params;
use crate::structure::declarator::{declaration_at, decl_type, paren_site, spaced_tokens, DeclSite};
use crate::structure::{BlockKind, DeclType, RegionId, RegionKind, StructuralIndex};

/// A switch that misses enumerators and has no `default:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchFix {
    /// Region of the switch body
    pub region: RegionId,
    /// Fully qualified name of the resolved enum
    pub enum_name: String,
    /// The operand's type as written at its declaration
    pub type_written: String,
    pub scoped: bool,
    /// Enumerators without a label, declaration order
    pub missing: Vec<String>,
    /// Code-token index of the last `case`/`default` keyword
    pub last_label: Option<usize>,
}

impl SwitchFix {
    /// Spelling of an enumerator in a `case` label at the switch site.
    pub fn case_label(&self, enumerator: &str) -> String {
        if self.scoped {
            return format!("{}::{}", self.type_written, enumerator);
        }
        match self.type_written.rsplit_once("::") {
            Some((qualifier, _)) => format!("{}::{}", qualifier, enumerator),
            None => enumerator.to_string(),
        }
    }
}

/// Result of analyzing every switch of one file.
#[derive(Debug, Clone, Default)]
pub struct CoverageReport {
    pub fixes: Vec<SwitchFix>,
    /// `FixError::AmbiguousType` entries, one per skipped switch
    pub warnings: Vec<FixError>,
    /// Switches looked at (with or without a fix)
    pub switch_count: usize,
}

/// Innermost-first declaration search from a use site.
struct DeclLookup<'i, 'a> {
    index: &'i StructuralIndex<'a>,
}

impl DeclLookup<'_, '_> {
    /// Nearest statement-level declaration of `name` directly in a region.
    ///
    /// With `limit`, only declarations before that token count and the last
    /// one wins; without it (class bodies) any member declaration counts.
    fn search_direct(&self, id: Option<RegionId>, name: &str, limit: Option<usize>) -> Option<DeclType> {
        let index = self.index;
        let code = &index.tokens;
        let floor = index.floor(id);
        let mut depth = 0i32;
        let mut found = None;
        for range in index.direct_ranges(id) {
            for i in range {
                if limit.is_some_and(|l| i >= l) {
                    return found;
                }
                let t = &code[i];
                if t.is_punct("(") || t.is_punct("[") {
                    depth += 1;
                } else if t.is_punct(")") || t.is_punct("]") {
                    depth -= 1;
                } else if depth == 0 && t.is_ident() && t.is(name) {
                    if let Some(decl) = declaration_at(code, &index.partner, i, floor, DeclSite::Statement) {
                        if limit.is_none() {
                            return Some(decl.ty);
                        }
                        found = Some(decl.ty);
                    }
                }
            }
        }
        found
    }

    /// Declaration of `name` inside the control or parameter parentheses
    /// that open at `open`.
    fn search_parens(&self, open: usize, name: &str) -> Option<DeclType> {
        let code = &self.index.tokens;
        let site = paren_site(code, open)?;
        let close = self.index.partner[open]?;
        (open + 1..close)
            .filter(|&i| code[i].is_ident() && code[i].is(name))
            .find_map(|i| declaration_at(code, &self.index.partner, i, open + 1, site))
            .map(|d| d.ty)
    }

    /// Class bodies with the given name.
    fn classes_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = RegionId> + 's {
        self.index.tree.iter().filter_map(move |r| match &r.kind {
            RegionKind::Block(BlockKind::Class(Some(n))) if n == name => Some(r.id),
            _ => None,
        })
    }

    fn search_members(&self, class_name: &str, name: &str) -> Option<DeclType> {
        self.classes_named(class_name)
            .find_map(|id| self.search_direct(Some(id), name, None))
    }

    /// Type of the variable named by the code token `idx`.
    fn variable(&self, idx: usize) -> Option<DeclType> {
        let index = self.index;
        let code = &index.tokens;
        let name = index.text(idx);
        let mut limit = idx;
        let mut scope = index.scope_at(idx);
        while let Some(id) = scope {
            let region = index.tree.get(id);
            match &region.kind {
                RegionKind::Block(BlockKind::Class(_)) => {
                    if let Some(ty) = self.search_direct(Some(id), &name, None) {
                        return Some(ty);
                    }
                }
                RegionKind::EnumBody(_) => {}
                _ => {
                    if let Some(ty) = self.search_direct(Some(id), &name, Some(limit)) {
                        return Some(ty);
                    }
                }
            }
            if region.open > 0 && code[region.open - 1].is_punct(")") {
                if let Some(ty) = index.partner[region.open - 1].and_then(|o| self.search_parens(o, &name)) {
                    return Some(ty);
                }
            }
            if let RegionKind::FunctionBody(head) = &region.kind {
                let param = extract_params(index, head)
                    .into_iter()
                    .find(|p| p.name.as_deref() == Some(&*name));
                if let Some(p) = param {
                    return Some(p.ty);
                }
                if let Some(class) = head.qualifier().last() {
                    if let Some(ty) = self.search_members(class, &name) {
                        return Some(ty);
                    }
                }
            }
            limit = region.open;
            scope = region.parent;
        }
        self.search_direct(None, &name, Some(limit))
    }

    /// Type of `this->name` at the code token `idx`.
    fn member(&self, idx: usize) -> Option<DeclType> {
        let index = self.index;
        let name = index.text(idx);
        let scope = index.scope_at(idx)?;
        for region in index.tree.ancestors(scope) {
            match &region.kind {
                RegionKind::Block(BlockKind::Class(_)) => {
                    return self.search_direct(Some(region.id), &name, None);
                }
                RegionKind::FunctionBody(head) => {
                    if let Some(class) = head.qualifier().last() {
                        return self.search_members(class, &name);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Strip redundant outer parentheses.
fn strip_parens(index: &StructuralIndex<'_>, mut r: Range<usize>) -> Range<usize> {
    while r.len() >= 2
        && index.tokens[r.start].is_punct("(")
        && index.partner[r.start] == Some(r.end - 1)
    {
        r = r.start + 1..r.end - 1;
    }
    r
}

/// Index of the `>` closing the `<` at `lt`.
fn angle_close(index: &StructuralIndex<'_>, lt: usize, limit: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = lt;
    while i < limit {
        let t = &index.tokens[i];
        if t.is_punct("<") {
            depth += 1;
        } else if t.is_punct(">") {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        } else if t.is_punct("(") {
            i = index.partner[i]?;
        }
        i += 1;
    }
    None
}

fn is_type_token(t: &crate::lexer::Token<'_>) -> bool {
    t.is_ident() || t.is_punct("::") || t.kind == crate::lexer::TokenKind::Keyword
}

/// Type of the switch operand, or a reason why it is unknown.
fn operand_type(lookup: &DeclLookup<'_, '_>, sw: &SwitchInfo) -> Result<DeclType, String> {
    let index = lookup.index;
    let code = &index.tokens;
    let r = strip_parens(index, sw.condition.inner());
    let toks = &code[r.clone()];
    let shown = spaced_tokens(code, r.clone());

    match toks {
        [v] if v.is_ident() => {
            return lookup
                .variable(r.start)
                .ok_or_else(|| format!("no declaration found for `{}`", shown));
        }
        [this, arrow, m] if this.is_keyword("this") && arrow.is_punct("->") && m.is_ident() => {
            return lookup
                .member(r.start + 2)
                .ok_or_else(|| format!("no member declaration found for `{}`", shown));
        }
        _ => {}
    }

    // static_cast<T>(expr)
    if toks.len() >= 5 && toks[0].is_keyword("static_cast") && toks[1].is_punct("<") {
        if let Some(gt) = angle_close(index, r.start + 1, r.end) {
            let call = gt + 1;
            if call < r.end && code[call].is_punct("(") && index.partner[call] == Some(r.end - 1) {
                return Ok(decl_type(code, r.start + 2..gt));
            }
        }
    }

    // (T) expr
    if toks.len() >= 4 && toks[0].is_punct("(") {
        if let Some(close) = index.partner[r.start] {
            let inner = r.start + 1..close;
            if close + 1 < r.end && !inner.is_empty() && code[inner.clone()].iter().all(is_type_token) {
                return Ok(decl_type(code, inner));
            }
        }
    }

    Err(format!("cannot determine the type of `{}`", shown))
}

/// Scope path seen from inside a switch body, out-of-class method qualifiers included.
fn use_scope(index: &StructuralIndex<'_>, region: RegionId) -> Vec<String> {
    let mut scope = flatten_scope(index.tree.scope_path(Some(region)));
    let function = index
        .tree
        .ancestors(region)
        .find_map(|r| match &r.kind {
            RegionKind::FunctionBody(head) => Some((r.parent, head)),
            _ => None,
        });
    if let Some((parent, head)) = function {
        let outer = flatten_scope(index.tree.scope_path(parent)).len();
        let qualifier: Vec<String> = head.qualifier().into_iter().map(str::to_string).collect();
        let at = outer.min(scope.len());
        scope.splice(at..at, qualifier);
    }
    scope
}

/// Find switches that miss enumerators and have no `default:`.
pub fn analyze_switches(index: &StructuralIndex<'_>, registry: &EnumRegistry) -> CoverageReport {
    let lookup = DeclLookup { index };
    let mut report = CoverageReport::default();

    for sw in extract_switches(index) {
        report.switch_count += 1;
        if sw.has_default {
            continue;
        }
        let keyword_offset = index.tokens[sw.condition.open.saturating_sub(1)].start;
        let literal_only = !sw.cases.is_empty() && sw.label_names().next().is_none();
        let warn = |report: &mut CoverageReport, message: String| {
            if !literal_only {
                report.warnings.push(FixError::ambiguous(keyword_offset, message));
            }
        };

        let written = match operand_type(&lookup, &sw) {
            Ok(DeclType::Named(name)) => name,
            Ok(DeclType::Builtin) => continue,
            Ok(DeclType::Auto) => {
                warn(&mut report, "switch operand declared `auto`".to_string());
                continue;
            }
            Ok(_) => {
                warn(&mut report, "switch operand has no nameable enum type".to_string());
                continue;
            }
            Err(message) => {
                warn(&mut report, message);
                continue;
            }
        };

        let decl = match registry.resolve(&written, &use_scope(index, sw.region)) {
            Resolution::Found(decl) => decl,
            Resolution::NotFound => {
                warn(
                    &mut report,
                    format!("type `{}` is not an enum declared in this file", written),
                );
                continue;
            }
            Resolution::Ambiguous(candidates) => {
                warn(
                    &mut report,
                    format!("type `{}` matches several enums: {}", written, candidates.join(", ")),
                );
                continue;
            }
        };

        let labelled: HashSet<&str> = sw.label_names().collect();
        let missing: Vec<String> = decl
            .enumerators
            .iter()
            .filter(|e| !labelled.contains(e.as_str()))
            .cloned()
            .collect();
        debug!(
            enum_name = %decl.qualified_name(),
            missing = missing.len(),
            "switch coverage"
        );
        if missing.is_empty() {
            continue;
        }
        report.fixes.push(SwitchFix {
            region: sw.region,
            enum_name: decl.qualified_name(),
            type_written: written,
            scoped: decl.scoped,
            missing,
            last_label: sw.last_label,
        });
    }
    report
}
