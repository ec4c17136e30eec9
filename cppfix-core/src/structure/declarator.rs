//! Token-pattern recognizers for declarations.
//!
//! None of this is a grammar. Each recognizer matches a small, ordered set of
//! shapes over the code-token vector and gives up (returns `None`) on anything
//! else, so a miss degrades into "not a function" or "not a declaration"
//! rather than a misread.

use std::ops::Range;

use serde::Serialize;

use super::region::{FunctionHead, TokenSpan};
use crate::lexer::{Token, TokenKind};

/// Keywords that name (part of) a type.
const TYPE_NAME_KEYWORDS: &[&str] = &[
    "auto", "bool", "char", "char8_t", "char16_t", "char32_t", "decltype", "double", "float",
    "int", "long", "short", "signed", "unsigned", "void", "wchar_t",
];

/// Keywords allowed in the prefix of a local declaration.
const DECL_KEYWORDS: &[&str] = &[
    "auto", "bool", "char", "char8_t", "char16_t", "char32_t", "class", "const", "constexpr",
    "constinit", "double", "enum", "extern", "float", "inline", "int", "long", "mutable",
    "register", "short", "signed", "static", "struct", "thread_local", "typename", "union",
    "unsigned", "void", "volatile", "wchar_t",
];

/// Keywords allowed between a parameter list and a function body.
const TRAILER_KEYWORDS: &[&str] = &["const", "volatile", "noexcept", "mutable", "throw"];

/// Keywords whose parenthesized argument may trail a parameter list.
const TRAILER_CALL_KEYWORDS: &[&str] = &["noexcept", "throw", "alignas", "decltype"];

/// Bound on backward scans so a pathological file stays linear.
const MAX_LOOKBACK: usize = 64;

/// Keyword that names a type.
pub fn is_type_keyword(t: &Token<'_>) -> bool {
    t.kind == TokenKind::Keyword && TYPE_NAME_KEYWORDS.iter().any(|k| t.is(k))
}

fn is_decl_keyword(t: &Token<'_>) -> bool {
    t.kind == TokenKind::Keyword && DECL_KEYWORDS.iter().any(|k| t.is(k))
}

fn is_type_bearing(t: &Token<'_>) -> bool {
    t.is_ident() || is_type_keyword(t) || t.is_punct(">")
}

/// ALL_CAPS identifier, as used for annotation macros.
fn is_macro_like(t: &Token<'_>) -> bool {
    t.is_ident()
        && t.text.len() > 1
        && t.text.iter().any(|b| b.is_ascii_uppercase())
        && !t.text.iter().any(|b| b.is_ascii_lowercase())
}

fn punct_in(t: &Token<'_>, set: &[&str]) -> bool {
    t.kind == TokenKind::Punctuation && set.iter().any(|s| t.is(s))
}

/// Concatenate token texts without separators: `Foo :: bar` gives `Foo::bar`.
pub fn join_tokens(code: &[Token<'_>], range: Range<usize>) -> String {
    code[range].iter().map(|t| t.as_str()).collect()
}

/// Concatenate token texts with single spaces.
pub fn spaced_tokens(code: &[Token<'_>], range: Range<usize>) -> String {
    code[range]
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Index of the `<` matching the `>` at `gt`, scanning backwards.
pub fn angle_open_back(code: &[Token<'_>], gt: usize) -> Option<usize> {
    let mut depth = 0usize;
    let floor = gt.saturating_sub(MAX_LOOKBACK);
    let mut i = gt + 1;
    while i > floor {
        i -= 1;
        let t = &code[i];
        if t.is_punct(">") {
            depth += 1;
        } else if t.is_punct("<") {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        } else if punct_in(t, &[";", "{", "}"]) {
            return None;
        }
    }
    None
}

/// Split `range` at top-level commas.
///
/// Nesting counts `()`, `[]` and `{}`. With `angles`, template brackets are
/// counted too until the first top-level `=` of a piece, so a default
/// argument such as `a < b` does not swallow the next comma.
pub fn split_top_level(code: &[Token<'_>], range: Range<usize>, angles: bool) -> Vec<Range<usize>> {
    let mut parts = Vec::new();
    if range.is_empty() {
        return parts;
    }
    let mut start = range.start;
    let mut depth = 0i32;
    let mut angle = 0i32;
    let mut in_default = false;
    for i in range.clone() {
        let t = &code[i];
        if punct_in(t, &["(", "[", "{"]) {
            depth += 1;
        } else if punct_in(t, &[")", "]", "}"]) {
            depth -= 1;
        } else if depth == 0 && angles && !in_default && t.is_punct("<") {
            angle += 1;
        } else if depth == 0 && angle > 0 && !in_default && t.is_punct(">") {
            angle -= 1;
        } else if depth == 0 && angle == 0 && t.is_punct("=") {
            in_default = true;
        } else if depth == 0 && angle == 0 && t.is_punct(",") {
            parts.push(start..i);
            start = i + 1;
            in_default = false;
        }
    }
    if start < range.end {
        parts.push(start..range.end);
    }
    parts
}

/// What a declaration's type prefix resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeclType {
    /// A user type, qualification as written (`ns::Color`)
    Named(String),
    /// A builtin arithmetic type
    Builtin,
    /// Pointer to something; never a switch operand
    Pointer,
    /// `auto`
    Auto,
    Unknown,
}

/// Resolve the type named by the declaration prefix `range`.
pub fn decl_type(code: &[Token<'_>], range: Range<usize>) -> DeclType {
    let mut angle = 0i32;
    let mut last_type: Option<usize> = None;
    let mut pointer = false;
    for i in range.clone() {
        let t = &code[i];
        if angle > 0 {
            if t.is_punct("<") {
                angle += 1;
            } else if t.is_punct(">") {
                angle -= 1;
            }
            continue;
        }
        if t.is_punct("<") {
            angle += 1;
        } else if t.is_ident() || is_type_keyword(t) {
            last_type = Some(i);
            pointer = false;
        } else if t.is_punct("*") && last_type.is_some() {
            pointer = true;
        }
    }
    let Some(i) = last_type else {
        return DeclType::Unknown;
    };
    if pointer {
        return DeclType::Pointer;
    }
    let t = &code[i];
    if t.kind == TokenKind::Keyword {
        return match t.as_str().as_ref() {
            "auto" => DeclType::Auto,
            "decltype" => DeclType::Unknown,
            _ => DeclType::Builtin,
        };
    }
    let mut start = i;
    while start >= range.start + 2 && code[start - 1].is_punct("::") && code[start - 2].is_ident() {
        start -= 2;
    }
    if start > range.start && code[start - 1].is_punct("::") {
        start -= 1;
    }
    DeclType::Named(join_tokens(code, start..i + 1))
}

/// One parameter of a parameter list, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamParts {
    /// Code-token index of the declared name
    pub name: Option<usize>,
    /// Declaration tokens, default argument excluded
    pub decl: Range<usize>,
    pub ty: DeclType,
    /// `[[maybe_unused]]` or `__attribute__((unused))`
    pub maybe_unused: bool,
}

/// Take apart one comma-separated piece of a parameter list.
pub fn parse_param(code: &[Token<'_>], partner: &[Option<usize>], range: Range<usize>) -> ParamParts {
    let maybe_unused = code[range.clone()].iter().any(|t| t.is("maybe_unused"))
        || (code[range.clone()].iter().any(|t| t.is("__attribute__"))
            && code[range.clone()].iter().any(|t| t.is("unused")));

    let mut a = range.start;
    while a + 1 < range.end && code[a].is_punct("[") && code[a + 1].is_punct("[") {
        match partner[a] {
            Some(close) => a = close + 1,
            None => break,
        }
    }

    let mut end = range.end;
    let mut depth = 0i32;
    for i in a..range.end {
        let t = &code[i];
        if punct_in(t, &["(", "[", "{", "<"]) {
            depth += 1;
        } else if punct_in(t, &[")", "]", "}", ">"]) {
            depth -= 1;
        } else if depth == 0 && t.is_punct("=") {
            end = i;
            break;
        }
    }

    let unnamed = |decl: Range<usize>| ParamParts {
        name: None,
        ty: decl_type(code, decl.clone()),
        decl,
        maybe_unused,
    };
    if a >= end {
        return unnamed(a..a);
    }

    let mut e = end;
    while e > a && code[e - 1].is_punct("]") {
        match partner[e - 1] {
            Some(open) if open > a => e = open,
            _ => break,
        }
    }

    // Function pointer or reference to array: `void (*cb)(int)`, `int (&a)[3]`
    if let Some(g) = (a..e).find(|&i| {
        code[i].is_punct("(") && code.get(i + 1).is_some_and(|n| punct_in(n, &["*", "&", "^"]))
    }) {
        let close = partner[g].unwrap_or(g);
        let name = (g + 1..close)
            .rev()
            .find(|&i| code[i].is_ident() && !code.get(i + 1).is_some_and(|n| n.is_punct("::")));
        return ParamParts {
            name,
            decl: a..end,
            ty: DeclType::Pointer,
            maybe_unused,
        };
    }

    let last = e - 1;
    let named = code[last].is_ident()
        && e - a >= 2
        && !code[last - 1].is_punct("::")
        && code[a..last].iter().any(is_type_bearing);
    if !named {
        return unnamed(a..end);
    }
    ParamParts {
        name: Some(last),
        ty: decl_type(code, a..last),
        decl: a..end,
        maybe_unused,
    }
}

/// Where a candidate declaration sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclSite {
    /// Directly in a block, outside any parentheses
    Statement,
    /// Inside `catch (...)` or a lambda's `(...)`
    ParamLike,
    /// Inside `for`/`if`/`while`/`switch` parentheses
    Control,
}

/// Declaration site inside the `( ... )` opened at `open`, if declarations
/// can appear there at all. Call and grouping parentheses give `None`.
pub fn paren_site(code: &[Token<'_>], open: usize) -> Option<DeclSite> {
    let prev = open.checked_sub(1).map(|p| &code[p])?;
    if ["for", "if", "while", "switch"].iter().any(|k| prev.is_keyword(k)) {
        Some(DeclSite::Control)
    } else if prev.is_keyword("catch") || prev.is_punct("]") {
        Some(DeclSite::ParamLike)
    } else {
        None
    }
}

/// A local variable declaration recognized at a name token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecl {
    /// First token of the type prefix
    pub start: usize,
    pub name_idx: usize,
    pub ty: DeclType,
}

/// Start of the type prefix ending just before `idx`, if the tokens form one.
fn walk_prefix(code: &[Token<'_>], idx: usize, floor: usize) -> Option<usize> {
    let mut k = idx;
    let mut angle = 0i32;
    let limit = idx.saturating_sub(MAX_LOOKBACK).max(floor);
    while k > limit {
        let t = &code[k - 1];
        if angle > 0 {
            if t.is_punct("<") {
                angle -= 1;
            } else if t.is_punct(">") {
                angle += 1;
            } else if punct_in(t, &[";", "{", "}"]) {
                return None;
            }
            k -= 1;
            continue;
        }
        if t.is_punct(">") {
            angle += 1;
        } else if !(t.is_ident()
            || is_decl_keyword(t)
            || punct_in(t, &["::", "*", "&", "..."]))
        {
            break;
        }
        k -= 1;
    }
    if angle != 0 {
        return None;
    }
    Some(k)
}

fn prefix_is_type(code: &[Token<'_>], range: Range<usize>) -> bool {
    !range.is_empty()
        && code[range.clone()].iter().any(is_type_bearing)
        && !code[range.end - 1].is_punct("::")
}

fn boundary_ok(code: &[Token<'_>], k: usize, floor: usize) -> bool {
    k == floor || punct_in(&code[k - 1], &[";", "{", "}", ":", ",", "("])
}

/// Recognize a declaration of the identifier at `idx`.
///
/// `floor` is the first token index of the enclosing scope (just after its
/// opening delimiter); the prefix never extends below it.
pub fn declaration_at(
    code: &[Token<'_>],
    partner: &[Option<usize>],
    idx: usize,
    floor: usize,
    site: DeclSite,
) -> Option<LocalDecl> {
    let name = code.get(idx)?;
    if !name.is_ident() || idx < floor {
        return None;
    }
    if idx > 0 && punct_in(&code[idx - 1], &[".", "->", "::"]) {
        return None;
    }
    let next = code.get(idx + 1)?;
    let allowed: &[&str] = match site {
        DeclSite::Statement => &[";", "=", ",", "(", "{", "[", ":"],
        DeclSite::ParamLike => &[")", ",", "=", "["],
        DeclSite::Control => &["=", ":", ";", "{"],
    };
    if !punct_in(next, allowed) {
        return None;
    }

    let k = walk_prefix(code, idx, floor)?;
    if prefix_is_type(code, k..idx) && boundary_ok(code, k, floor) {
        return Some(LocalDecl {
            start: k,
            name_idx: idx,
            ty: decl_type(code, k..idx),
        });
    }

    // A later declarator of a list: `int a = 1, *b, name;`
    if site != DeclSite::Statement {
        return None;
    }
    let mut p = idx;
    while p > floor && punct_in(&code[p - 1], &["*", "&"]) {
        p -= 1;
    }
    if p == floor || !code[p - 1].is_punct(",") {
        return None;
    }
    let stmt = statement_start(code, partner, p - 1, floor)?;
    let first = (stmt..p - 1).find(|&j| {
        code[j].is_ident()
            && code
                .get(j + 1)
                .is_some_and(|n| punct_in(n, &[";", "=", ",", "(", "{", "["]))
            && walk_prefix(code, j, floor) == Some(stmt)
            && prefix_is_type(code, stmt..j)
    })?;
    let ty = if p < idx {
        DeclType::Pointer
    } else {
        match decl_type(code, stmt..first) {
            // `int *a, b;` declares `b` as int, not a pointer
            DeclType::Pointer => DeclType::Unknown,
            other => other,
        }
    };
    Some(LocalDecl {
        start: stmt,
        name_idx: idx,
        ty,
    })
}

/// First token of the statement containing `idx`, jumping over balanced groups.
fn statement_start(
    code: &[Token<'_>],
    partner: &[Option<usize>],
    idx: usize,
    floor: usize,
) -> Option<usize> {
    let mut k = idx;
    let mut steps = 0;
    while k > floor {
        steps += 1;
        if steps > MAX_LOOKBACK * 4 {
            return None;
        }
        let t = &code[k - 1];
        if punct_in(t, &[";", "{", "}", ":"]) {
            break;
        }
        if punct_in(t, &[")", "]"]) {
            k = partner[k - 1]?;
            continue;
        }
        k -= 1;
    }
    Some(k)
}

/// Locate the head of a function definition whose body opens at `brace`.
///
/// Shapes accepted, tried in this order:
/// - `name ( params ) trailer [try] {` with optional constructor
///   initializer list `: m(a), n{b}` between trailer and body
/// - operator names (`operator==`, `operator()`, `operator bool`)
/// - qualified names (`Foo::bar`, `ns::Foo<T>::bar`, `~Foo`)
///
/// Outside class scope an unqualified name must be preceded by a return
/// type, which keeps bare macro invocations like `TEST(a, b) {` out.
pub fn find_function_head(
    code: &[Token<'_>],
    partner: &[Option<usize>],
    brace: usize,
    class_scope: bool,
) -> Option<FunctionHead> {
    let mut end = brace;
    let mut is_try = false;
    if end > 0 && code[end - 1].is_keyword("try") {
        is_try = true;
        end -= 1;
    }
    let mut attempts = Vec::with_capacity(2);
    if let Some(colon) = skip_ctor_initializers(code, partner, end) {
        attempts.push(colon);
    }
    attempts.push(end);

    for stop in attempts {
        let j = skip_trailer(code, partner, stop);
        if j == 0 || !code[j - 1].is_punct(")") {
            continue;
        }
        let close = j - 1;
        let Some(open) = partner[close] else {
            continue;
        };
        if let Some(name) = declarator_name(code, open, class_scope) {
            return Some(FunctionHead {
                name,
                params: TokenSpan { open, close },
                is_try,
            });
        }
    }
    None
}

/// Walk back over `: a(x), b{y}` ending just before `end`; returns the `:` index.
fn skip_ctor_initializers(code: &[Token<'_>], partner: &[Option<usize>], end: usize) -> Option<usize> {
    let mut k = end;
    loop {
        if k == 0 || !punct_in(&code[k - 1], &[")", "}"]) {
            return None;
        }
        let mut n = partner[k - 1]?;
        if n > 0 && code[n - 1].is_punct(">") {
            n = angle_open_back(code, n - 1)?;
        }
        if n == 0 || !code[n - 1].is_ident() {
            return None;
        }
        n -= 1;
        while n >= 2 && code[n - 1].is_punct("::") && code[n - 2].is_ident() {
            n -= 2;
        }
        if n == 0 {
            return None;
        }
        let sep = &code[n - 1];
        if sep.is_punct(",") {
            k = n - 1;
        } else if sep.is_punct(":") {
            return Some(n - 1);
        } else {
            return None;
        }
    }
}

/// Walk back over qualifiers, attributes and a trailing return type.
fn skip_trailer(code: &[Token<'_>], partner: &[Option<usize>], end: usize) -> usize {
    let mut j = end;

    // `-> type`
    let mut k = j;
    while k > 0 && end - k < MAX_LOOKBACK {
        let t = &code[k - 1];
        if t.is_ident() || is_decl_keyword(t) || punct_in(t, &["::", "<", ">", "*", "&", ","]) {
            k -= 1;
        } else {
            break;
        }
    }
    if k > 0 && k < j && code[k - 1].is_punct("->") {
        j = k - 1;
    }

    while j > 0 {
        let t = &code[j - 1];
        let qualifier = (t.kind == TokenKind::Keyword && TRAILER_KEYWORDS.iter().any(|k| t.is(k)))
            || t.is_punct("&")
            || (t.is_ident() && (t.is("override") || t.is("final")));
        if qualifier {
            j -= 1;
            continue;
        }
        if is_macro_like(t) && j >= 2 && code[j - 2].is_punct(")") {
            j -= 1;
            continue;
        }
        if t.is_punct(")") {
            if let Some(o) = partner[j - 1] {
                if o > 0 {
                    let before = &code[o - 1];
                    let call_kw = before.kind == TokenKind::Keyword
                        && TRAILER_CALL_KEYWORDS.iter().any(|k| before.is(k));
                    let attr = before.is("__attribute__") || before.is("__declspec");
                    let annotation = is_macro_like(before) && o >= 2 && code[o - 2].is_punct(")");
                    if call_kw || attr || annotation {
                        j = o - 1;
                        continue;
                    }
                }
            }
        }
        if t.is_punct("]") {
            if let Some(o) = partner[j - 1] {
                if o > 0 && code[o].is_punct("[") && code.get(o + 1).is_some_and(|n| n.is_punct("[")) {
                    j = o;
                    continue;
                }
            }
        }
        break;
    }
    j
}

/// Name of the declarator whose parameter list opens at `open`.
fn declarator_name(code: &[Token<'_>], open: usize, class_scope: bool) -> Option<String> {
    if open == 0 {
        return None;
    }
    let name_end = open;
    let mut start = None;
    for k in 1..=4.min(open) {
        if code[open - k].is_keyword("operator") {
            start = Some(open - k);
            break;
        }
    }
    let mut start = match start {
        Some(s) => s,
        None => {
            let mut n = open;
            if code[n - 1].is_punct(">") {
                n = angle_open_back(code, n - 1)?;
            }
            if n == 0 || !code[n - 1].is_ident() {
                return None;
            }
            let mut s = n - 1;
            if s > 0 && code[s - 1].is_punct("~") {
                s -= 1;
            }
            s
        }
    };

    let mut qualified = false;
    while start >= 2 && code[start - 1].is_punct("::") {
        let q = start - 2;
        if code[q].is_ident() {
            start = q;
        } else if code[q].is_punct(">") {
            match angle_open_back(code, q) {
                Some(lt) if lt > 0 && code[lt - 1].is_ident() => start = lt - 1,
                _ => break,
            }
        } else {
            break;
        }
        qualified = true;
    }
    if start >= 1 && code[start - 1].is_punct("::") {
        start -= 1;
        qualified = true;
    }

    if !class_scope && !qualified {
        let before = start.checked_sub(1).map(|i| &code[i])?;
        let typed = before.is_ident()
            || (before.kind == TokenKind::Keyword && !before.is("return") && !before.is("else"))
            || punct_in(before, &[">", "*", "&"]);
        if !typed {
            return None;
        }
    }
    Some(join_tokens(code, start..name_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    /// Code tokens plus a delimiter partner table, as the indexer builds them.
    fn prepare(src: &str) -> (Vec<Token<'_>>, Vec<Option<usize>>) {
        let code: Vec<Token<'_>> = tokenize(src.as_bytes())
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_trivia())
            .collect();
        let mut partner = vec![None; code.len()];
        let mut stack = Vec::new();
        for (i, t) in code.iter().enumerate() {
            if punct_in(t, &["(", "[", "{"]) {
                stack.push(i);
            } else if punct_in(t, &[")", "]", "}"]) {
                let o = stack.pop().unwrap();
                partner[o] = Some(i);
                partner[i] = Some(o);
            }
        }
        (code, partner)
    }

    fn last_brace(code: &[Token<'_>]) -> usize {
        code.iter().rposition(|t| t.is_punct("{")).unwrap()
    }

    fn head(src: &str, class_scope: bool) -> Option<String> {
        let (code, partner) = prepare(src);
        let brace = code.iter().position(|t| t.is_punct("{")).unwrap();
        find_function_head(&code, &partner, brace, class_scope).map(|h| h.name)
    }

    #[test]
    fn test_plain_function_head() {
        assert_eq!(head("int foo(int, char x) {}", false).as_deref(), Some("foo"));
        assert_eq!(
            head("double Foo::method2(char a, char b) {}", false).as_deref(),
            Some("Foo::method2")
        );
    }

    #[test]
    fn test_trailing_qualifiers() {
        assert_eq!(
            head("int method1(const char *s) const noexcept {}", true).as_deref(),
            Some("method1")
        );
        assert_eq!(
            head("auto f(int x) -> std::vector<int> {}", false).as_deref(),
            Some("f")
        );
        assert_eq!(
            head("void g() const override {}", true).as_deref(),
            Some("g")
        );
    }

    #[test]
    fn test_function_try_block() {
        let (code, partner) = prepare("bool weirdOne(Foo f, char c) try { return true; }");
        let brace = code.iter().position(|t| t.is_punct("{")).unwrap();
        let h = find_function_head(&code, &partner, brace, false).unwrap();
        assert!(h.is_try);
        assert_eq!(h.name, "weirdOne");
    }

    #[test]
    fn test_constructor_initializer_list() {
        let (code, partner) = prepare("Foo::Foo(int a, int b) : m_a(a), m_b{b} {}");
        let brace = last_brace(&code);
        let h = find_function_head(&code, &partner, brace, false).unwrap();
        assert_eq!(h.name, "Foo::Foo");
        assert_eq!(code[h.params.open - 1].as_str(), "Foo");
    }

    #[test]
    fn test_access_specifier_before_constructor() {
        assert_eq!(head("public: Foo(int a) {}", true).as_deref(), Some("Foo"));
    }

    #[test]
    fn test_operator_names() {
        assert_eq!(
            head("bool operator==(const A& o) const {}", true).as_deref(),
            Some("operator==")
        );
        assert_eq!(
            head("int operator()(int x) {}", true).as_deref(),
            Some("operator()")
        );
    }

    #[test]
    fn test_non_functions() {
        assert_eq!(head("if (x) {}", false), None);
        assert_eq!(head("TEST(Suite, Name) {}", false), None);
        assert_eq!(head("auto l = [](int x) {};", false), None);
        assert_eq!(head("int a[] = {1, 2};", false), None);
        assert_eq!(head("catch (...) {}", false), None);
    }

    #[test]
    fn test_split_top_level_templates() {
        let (code, _) = prepare("(std::map<int, int> m, int x = f(a, b), T y)");
        let parts = split_top_level(&code, 1..code.len() - 1, true);
        assert_eq!(parts.len(), 3);
        assert_eq!(spaced_tokens(&code, parts[0].clone()), "std :: map < int , int > m");
    }

    #[test]
    fn test_parse_param_names() {
        let cases = [
            ("(int)", None),
            ("(char x)", Some("x")),
            ("(const double * const & s)", Some("s")),
            ("(const T & unusedArg)", Some("unusedArg")),
            ("(Foo)", None),
            ("(const Foo)", None),
            ("(int x = 5)", Some("x")),
            ("(int arr[10])", Some("arr")),
            ("(void (*cb)(int))", Some("cb")),
            ("(Ts... args)", Some("args")),
            ("(std::string)", None),
        ];
        for (src, want) in cases {
            let (code, partner) = prepare(src);
            let parts = parse_param(&code, &partner, 1..code.len() - 1);
            let got = parts.name.map(|i| code[i].as_str().into_owned());
            assert_eq!(got.as_deref(), want, "param {}", src);
        }
    }

    #[test]
    fn test_parse_param_maybe_unused() {
        let (code, partner) = prepare("([[maybe_unused]] int x)");
        let parts = parse_param(&code, &partner, 1..code.len() - 1);
        assert!(parts.maybe_unused);
        assert_eq!(code[parts.name.unwrap()].as_str(), "x");
    }

    #[test]
    fn test_decl_type() {
        let (code, _) = prepare("const ns::Color &");
        assert_eq!(decl_type(&code, 0..code.len()), DeclType::Named("ns::Color".into()));
        let (code, _) = prepare("unsigned int");
        assert_eq!(decl_type(&code, 0..code.len()), DeclType::Builtin);
        let (code, _) = prepare("Color *");
        assert_eq!(decl_type(&code, 0..code.len()), DeclType::Pointer);
        let (code, _) = prepare("std::vector<Color>");
        assert_eq!(decl_type(&code, 0..code.len()), DeclType::Named("std::vector".into()));
    }

    fn decl_in_block(src: &str, nth_ident: &str) -> Option<LocalDecl> {
        let (code, partner) = prepare(src);
        let idx = code.iter().rposition(|t| t.is(nth_ident)).unwrap();
        declaration_at(&code, &partner, idx, 1, DeclSite::Statement)
    }

    #[test]
    fn test_declaration_at_statement() {
        let d = decl_in_block("{ Color c = Red; }", "c").unwrap();
        assert_eq!(d.ty, DeclType::Named("Color".into()));
        assert!(decl_in_block("{ double dupe; }", "dupe").is_some());
        assert!(decl_in_block("{ std::vector<int> v; }", "v").is_some());
        assert!(decl_in_block("{ int a = 1, dupe; }", "dupe").is_some());
    }

    #[test]
    fn test_declaration_at_rejects_uses() {
        assert!(decl_in_block("{ x = 5; }", "x").is_none());
        assert!(decl_in_block("{ return x; }", "x").is_none());
        assert!(decl_in_block("{ y = a * x; }", "x").is_none());
        assert!(decl_in_block("{ f(a, x); }", "x").is_none());
        assert!(decl_in_block("{ s.x = 1; }", "x").is_none());
        assert!(decl_in_block("{ b = a > x; }", "x").is_none());
    }

    #[test]
    fn test_declaration_in_parens() {
        let (code, partner) = prepare("for (int i = 0; i < n; ++i)");
        let d = declaration_at(&code, &partner, 3, 2, DeclSite::Control);
        assert!(d.is_some());
        let (code, partner) = prepare("if (a & x)");
        let idx = code.iter().position(|t| t.is("x")).unwrap();
        assert!(declaration_at(&code, &partner, idx, 2, DeclSite::Control).is_none());
        let (code, partner) = prepare("catch (const std::exception& e)");
        let idx = code.iter().position(|t| t.is("e")).unwrap();
        assert!(declaration_at(&code, &partner, idx, 2, DeclSite::ParamLike).is_some());
    }
}
