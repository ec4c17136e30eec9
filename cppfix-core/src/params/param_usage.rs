//! Parameter usage analysis.
//!
//! A parameter counts as used when its name appears as an identifier token
//! that refers to it:
//! - anywhere between the parameter list and the body (constructor
//!   initializers, trailing return types, `noexcept(...)` arguments)
//! - in the body or a lambda inside it, unless a local declaration of the
//!   same name is in scope at that point
//! - in a `catch` handler of a function-try-block
//!
//! Identifiers after `.`, `->` or `::` name members, not parameters. Nested
//! function bodies and local class bodies are skipped entirely; a local
//! class cannot odr-use the enclosing function's parameters.

use std::collections::HashSet;

use serde::Serialize;

use super::param_extractor::{extract_params, ParamDecl};
use crate::structure::declarator::{declaration_at, paren_site, DeclSite};
use crate::structure::{BlockKind, FunctionHead, Region, RegionId, RegionKind, StructuralIndex};

/// Unused parameters of one function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedParams {
    /// Declarator name as written
    pub function: String,
    /// Region of the function body
    pub region: RegionId,
    /// Unused parameter names, declaration order
    pub names: Vec<String>,
    /// Code-token index of each name, parallel to `names`
    pub name_tokens: Vec<usize>,
}

/// One open `( ... )` group during the body walk.
struct ParenFrame {
    close: usize,
    open: usize,
    /// Declarations are possible inside (control or parameter-like parens)
    site: Option<DeclSite>,
    declared: Vec<String>,
}

fn is_member_access(index: &StructuralIndex<'_>, idx: usize) -> bool {
    idx > 0 && {
        let prev = &index.tokens[idx - 1];
        prev.is_punct(".") || prev.is_punct("->") || prev.is_punct("::")
    }
}

/// Walks one function and records which of `names` are referenced.
struct UsageWalker<'i, 'a> {
    index: &'i StructuralIndex<'a>,
    names: HashSet<String>,
    used: HashSet<String>,
}

impl<'i, 'a> UsageWalker<'i, 'a> {
    fn new(index: &'i StructuralIndex<'a>, names: HashSet<String>) -> Self {
        Self {
            index,
            names,
            used: HashSet::new(),
        }
    }

    fn all_used(&self) -> bool {
        self.used.len() == self.names.len()
    }

    fn note_reference(&mut self, idx: usize) {
        if !is_member_access(self.index, idx) {
            self.used.insert(self.index.text(idx).into_owned());
        }
    }

    /// Tokens between the parameter list and the body.
    fn scan_trailer(&mut self, head: &FunctionHead, body: &Region) {
        for i in head.params.close + 1..body.open {
            if self.index.tokens[i].is_ident() && self.names.contains(&*self.index.text(i)) {
                self.note_reference(i);
            }
        }
    }

    fn walk(&mut self, id: RegionId, inherited: &HashSet<String>) {
        if self.all_used() {
            return;
        }
        let index = self.index;
        let region = index.tree.get(id);
        let code = &index.tokens;
        let mut shadowed = inherited.clone();
        let mut frames: Vec<ParenFrame> = Vec::new();
        // Names declared in the last declaring `( ... )`. They scope the `{ }`
        // that follows, or a braceless statement up to its `;`.
        let mut pending: Vec<String> = Vec::new();
        let mut children = region.children.iter().peekable();
        let mut i = region.open + 1;

        while i < region.close {
            if let Some(&&child_id) = children.peek() {
                let child = index.tree.get(child_id);
                if child.open == i {
                    children.next();
                    let skip = matches!(
                        child.kind,
                        RegionKind::FunctionBody(_)
                            | RegionKind::EnumBody(_)
                            | RegionKind::Block(BlockKind::Class(_))
                    );
                    if !skip {
                        let mut inner = shadowed.clone();
                        inner.extend(pending.drain(..));
                        for frame in &frames {
                            inner.extend(frame.declared.iter().cloned());
                        }
                        self.walk(child_id, &inner);
                    }
                    pending.clear();
                    i = child.close + 1;
                    continue;
                }
            }

            let t = &code[i];
            if t.is_punct("(") {
                frames.push(ParenFrame {
                    close: index.partner[i].unwrap_or(region.close),
                    open: i,
                    site: paren_site(code, i),
                    declared: Vec::new(),
                });
            } else if t.is_punct(")") {
                if frames.last().is_some_and(|f| f.close == i) {
                    if let Some(frame) = frames.pop() {
                        match (frame.site, frames.last_mut()) {
                            // lambda and handler parameters belong to their body only
                            (Some(DeclSite::ParamLike), _) | (Some(_), None) => {
                                pending = frame.declared;
                            }
                            (_, Some(outer)) => outer.declared.extend(frame.declared),
                            (None, None) => {}
                        }
                    }
                }
            } else if t.is_punct(";") && frames.is_empty() {
                pending.clear();
            } else if t.is_ident() && self.names.contains(&*index.text(i)) {
                let name = index.text(i).into_owned();
                let (site, floor) = match frames.last() {
                    None => (Some(DeclSite::Statement), region.open + 1),
                    Some(f) => (f.site, f.open + 1),
                };
                let decl = site.and_then(|s| declaration_at(code, &index.partner, i, floor, s));
                // `x * y;` is an expression when `x` is a visible parameter
                let decl = decl.filter(|d| {
                    !(d.start..i).any(|k| {
                        code[k].is_ident()
                            && self.names.contains(&*index.text(k))
                            && !shadowed.contains(&*index.text(k))
                    })
                });
                let in_frame_scope = pending.contains(&name)
                    || frames.iter().any(|f| f.declared.contains(&name));
                match (decl, frames.last_mut()) {
                    (Some(_), None) => {
                        shadowed.insert(name);
                    }
                    (Some(_), Some(frame)) => frame.declared.push(name),
                    (None, _) => {
                        if !shadowed.contains(&name) && !in_frame_scope {
                            self.note_reference(i);
                        }
                    }
                }
            }
            i += 1;
        }
    }
}

/// Names of `params` referenced by the function whose body is `body`.
pub fn referenced_params(
    index: &StructuralIndex<'_>,
    body: &Region,
    head: &FunctionHead,
    params: &[ParamDecl],
) -> HashSet<String> {
    let names: HashSet<String> = params.iter().filter_map(|p| p.name.clone()).collect();
    let mut walker = UsageWalker::new(index, names);
    walker.scan_trailer(head, body);
    let none = HashSet::new();
    walker.walk(body.id, &none);
    for handler in index.handlers_of(body.id) {
        walker.walk(handler.id, &none);
    }
    walker.used
}

/// Find the unused, unmarked, named parameters of every function definition.
pub fn find_unused_params(index: &StructuralIndex<'_>) -> Vec<UnusedParams> {
    let mut results = Vec::new();
    for (body, head) in index.functions() {
        let params = extract_params(index, head);
        if !params.iter().any(ParamDecl::is_candidate) {
            continue;
        }
        let used = referenced_params(index, body, head, &params);
        let mut names: Vec<String> = Vec::new();
        let mut name_tokens: Vec<usize> = Vec::new();
        for p in params.iter().filter(|p| p.is_candidate()) {
            if let (Some(name), Some(idx)) = (&p.name, p.name_idx) {
                if !used.contains(name) && !names.contains(name) {
                    names.push(name.clone());
                    name_tokens.push(idx);
                }
            }
        }
        if !names.is_empty() {
            results.push(UnusedParams {
                function: head.name.clone(),
                region: body.id,
                names,
                name_tokens,
            });
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::index;

    fn unused(src: &str) -> Vec<(String, Vec<String>)> {
        let idx = index(src.as_bytes()).unwrap();
        find_unused_params(&idx)
            .into_iter()
            .map(|u| (u.function, u.names))
            .collect()
    }

    fn one(function: &str, names: &[&str]) -> (String, Vec<String>) {
        (
            function.to_string(),
            names.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_simple_unused() {
        let src = "int foo(int, char x, const double * const & s, float y)\n{\n    (void) s;\n    y = 0;\n    return 0;\n}";
        assert_eq!(unused(src), vec![one("foo", &["x"])]);
    }

    #[test]
    fn test_all_used_reports_nothing() {
        assert!(unused("int add(int a, int b) { return a + b; }").is_empty());
    }

    #[test]
    fn test_member_access_is_not_a_use() {
        let src = "int f(S s, int x) { return s.x; }";
        assert_eq!(unused(src), vec![one("f", &["x"])]);
    }

    #[test]
    fn test_local_shadow_hides_use() {
        let src = "int f(int v) { { int v = 2; return v; } }";
        assert_eq!(unused(src), vec![one("f", &["v"])]);
    }

    #[test]
    fn test_use_before_shadow_counts() {
        let src = "int f(int v) { int w = v; int v2 = w; { int v = 1; (void) v; } return v2; }";
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_for_loop_declaration_scopes_body() {
        let src = "void f(int i, int n) { for (int i = 0; i < n; ++i) { g(i); } }";
        assert_eq!(unused(src), vec![one("f", &["i"])]);
    }

    #[test]
    fn test_lambda_capture_and_body_count() {
        let src = "void f(int a, int b) { auto l = [a]() { return b; }; l(); }";
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_lambda_parameter_shadows() {
        let src = "void f(int a) { auto l = [](int a) { return a; }; l(1); }";
        assert_eq!(unused(src), vec![one("f", &["a"])]);
    }

    #[test]
    fn test_lambda_parameter_scoped_to_lambda_body() {
        let src = "void g(int a) { call([](int a) { return a; }, a); }";
        assert!(unused(src).is_empty());
        let src = "void g(int a, int b) { call(b, [](int a) { return a; }); }";
        assert_eq!(unused(src), vec![one("g", &["a"])]);
    }

    #[test]
    fn test_braceless_loop_declaration_scopes_statement() {
        let src = "void f(int x) { for (int x = 0; x < 3; ++x) h(x); }";
        assert_eq!(unused(src), vec![one("f", &["x"])]);
        let src = "void f(int x) { for (int i = 0; i < 3; ++i) h(i); g(x); }";
        assert!(unused(src).is_empty());
        let src = "void f(int x, bool ok) { if (ok) h(x); }";
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_nested_class_method_is_separate() {
        let src = "void outer(int o, double dupe) {\n  (void) o;\n  struct S {\n    double m(int inner, double dupe) { return dupe; }\n  } s;\n}";
        assert_eq!(
            unused(src),
            vec![one("outer", &["dupe"]), one("m", &["inner"])]
        );
    }

    #[test]
    fn test_constructor_initializer_counts() {
        let src = "struct P { int a; P(int x, int y) : a(x) {} };";
        assert_eq!(unused(src), vec![one("P", &["y"])]);
    }

    #[test]
    fn test_try_handler_use_counts() {
        let src = "int f(int c, int d) try { return c; } catch (...) { return d; }";
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_expression_statement_not_declaration() {
        let src = "void f(int x, int y) { x * y; }";
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_templates_and_calls() {
        let src = "template <unsigned sz, typename T>\nint nada(int ret, const T & unusedArg)\n{\n    char dummy[sz] = {};\n    (void) dummy;\n    return ret;\n}\nvoid nested(int i, double d) {\n    nada<0>(i, d);\n}";
        assert_eq!(unused(src), vec![one("nada", &["unusedArg"])]);
    }

    #[test]
    fn test_maybe_unused_never_reported() {
        assert!(unused("void f([[maybe_unused]] int x) {}").is_empty());
    }
}
