//! Delimiter matching and region classification.
//!
//! One forward pass over the code tokens pairs every `(`/`[`/`{` with its
//! closer and opens a [`Region`] at each `{`. The region's kind is decided
//! on the spot from the tokens already seen, so classification never needs
//! lookahead past the brace (except for `typedef enum { .. } Name;`, which
//! is named when its `}` closes).

use tracing::debug;

use super::declarator::{find_function_head, join_tokens};
use super::region::{
    BlockKind, EnumHead, Region, RegionId, RegionKind, RegionTree, SwitchHead, TokenSpan,
};
use super::StructuralIndex;
use crate::error::{FixError, FixResult};
use crate::lexer::{tokenize, Token, TokenKind};

/// Keywords that may sit between `enum` and `{` (scoping and underlying types).
const ENUM_HEAD_KEYWORDS: &[&str] = &[
    "class", "struct", "unsigned", "signed", "int", "char", "short", "long", "bool", "wchar_t",
    "char8_t", "char16_t", "char32_t",
];

/// Lex and index a buffer.
pub fn index(source: &[u8]) -> FixResult<StructuralIndex<'_>> {
    let all_tokens = tokenize(source)?;
    index_tokens(source, all_tokens)
}

/// Index an already lexed buffer.
pub fn index_tokens<'a>(source: &'a [u8], all_tokens: Vec<Token<'a>>) -> FixResult<StructuralIndex<'a>> {
    let code: Vec<Token<'a>> = all_tokens.iter().copied().filter(|t| !t.is_trivia()).collect();
    let mut partner: Vec<Option<usize>> = vec![None; code.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut open_regions: Vec<RegionId> = Vec::new();
    let mut tree = RegionTree::default();

    for i in 0..code.len() {
        let t = code[i];
        if t.kind != TokenKind::Punctuation {
            continue;
        }
        match t.text {
            b"(" | b"[" => stack.push(i),
            b"{" => {
                stack.push(i);
                let parent = open_regions.last().copied();
                let kind = classify(&code, &partner, &tree, i, parent);
                let id = tree.regions.len();
                tree.regions.push(Region {
                    id,
                    kind,
                    open: i,
                    close: i,
                    start: t.start,
                    end: t.end,
                    parent,
                    children: Vec::new(),
                });
                match parent {
                    Some(p) => tree.regions[p].children.push(id),
                    None => tree.roots.push(id),
                }
                open_regions.push(id);
            }
            b")" | b"]" | b"}" => {
                let Some(o) = stack.pop() else {
                    return Err(FixError::structural(
                        t.start,
                        format!("unmatched `{}`", t.as_str()),
                    ));
                };
                let expected: &[u8] = match code[o].text {
                    b"(" => b")",
                    b"[" => b"]",
                    _ => b"}",
                };
                if t.text != expected {
                    return Err(FixError::structural(
                        t.start,
                        format!(
                            "`{}` does not match `{}` opened at byte {}",
                            t.as_str(),
                            code[o].as_str(),
                            code[o].start
                        ),
                    ));
                }
                partner[o] = Some(i);
                partner[i] = Some(o);
                if t.text == b"}" {
                    if let Some(id) = open_regions.pop() {
                        tree.regions[id].close = i;
                        tree.regions[id].end = t.end;
                        name_typedef_enum(&code, &mut tree.regions[id]);
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(&o) = stack.last() {
        return Err(FixError::structural(
            code[o].start,
            format!("unclosed `{}`", code[o].as_str()),
        ));
    }

    debug!(
        tokens = all_tokens.len(),
        code_tokens = code.len(),
        regions = tree.len(),
        "indexed source"
    );

    Ok(StructuralIndex {
        source,
        all_tokens,
        tokens: code,
        partner,
        tree,
    })
}

/// Decide the kind of the region opened by the `{` at `brace`.
fn classify(
    code: &[Token<'_>],
    partner: &[Option<usize>],
    tree: &RegionTree,
    brace: usize,
    parent: Option<RegionId>,
) -> RegionKind {
    let paren = (brace > 0 && code[brace - 1].is_punct(")"))
        .then(|| partner[brace - 1])
        .flatten();

    if let Some(open) = paren {
        if open > 0 && code[open - 1].is_keyword("switch") {
            return RegionKind::SwitchBody(SwitchHead {
                condition: TokenSpan {
                    open,
                    close: brace - 1,
                },
            });
        }
    }

    if let Some(head) = enum_head(code, brace) {
        return RegionKind::EnumBody(head);
    }

    let parent_kind = parent.map(|p| &tree.regions[p].kind);
    if parent_kind.map_or(true, RegionKind::admits_definitions) {
        let class_scope = matches!(parent_kind, Some(RegionKind::Block(BlockKind::Class(_))));
        if let Some(head) = find_function_head(code, partner, brace, class_scope) {
            return RegionKind::FunctionBody(head);
        }
    }

    if let Some(open) = paren {
        if open >= 2 && code[open - 1].is_keyword("catch") && code[open - 2].is_punct("}") {
            if let Some(function) = try_owner(partner, tree, open - 2) {
                return RegionKind::Block(BlockKind::TryHandler { function });
            }
        }
    }

    statement_block(code, partner, brace)
}

/// Function owning the `catch` that follows the `}` at `close`.
fn try_owner(partner: &[Option<usize>], tree: &RegionTree, close: usize) -> Option<RegionId> {
    let open = partner[close]?;
    let id = tree
        .regions
        .binary_search_by_key(&open, |r| r.open)
        .ok()?;
    match &tree.regions[id].kind {
        RegionKind::FunctionBody(head) if head.is_try => Some(id),
        RegionKind::Block(BlockKind::TryHandler { function }) => Some(*function),
        _ => None,
    }
}

/// Index of the `enum` keyword heading the brace at `brace`, if any.
pub(crate) fn enum_keyword(code: &[Token<'_>], brace: usize) -> Option<usize> {
    let mut k = brace;
    while k > 0 && brace - k < 16 {
        let t = &code[k - 1];
        if t.is_keyword("enum") {
            return Some(k - 1);
        }
        let allowed = t.is_ident()
            || t.is_punct("::")
            || t.is_punct(":")
            || (t.kind == TokenKind::Keyword && ENUM_HEAD_KEYWORDS.iter().any(|w| t.is(w)));
        if !allowed {
            return None;
        }
        k -= 1;
    }
    None
}

fn enum_head(code: &[Token<'_>], brace: usize) -> Option<EnumHead> {
    let kw = enum_keyword(code, brace)?;
    let mut k = kw + 1;
    let scoped = code[k].is_keyword("class") || code[k].is_keyword("struct");
    if scoped {
        k += 1;
    }
    let name_start = k;
    while k < brace && !code[k].is_punct(":") {
        k += 1;
    }
    let name = &code[name_start..k];
    if name.is_empty() {
        return Some(EnumHead { name: None, scoped });
    }
    // `ident (:: ident)*`, anything else is a variable with a braced initializer
    let chain = name.iter().enumerate().all(|(n, t)| {
        if n % 2 == 0 {
            t.is_ident()
        } else {
            t.is_punct("::")
        }
    }) && name.len() % 2 == 1;
    if !chain {
        return None;
    }
    Some(EnumHead {
        name: Some(join_tokens(code, name_start..k)),
        scoped,
    })
}

/// Give `typedef enum { .. } Name;` its typedef name.
fn name_typedef_enum(code: &[Token<'_>], region: &mut Region) {
    let RegionKind::EnumBody(head) = &mut region.kind else {
        return;
    };
    if head.name.is_some() {
        return;
    }
    let Some(kw) = enum_keyword(code, region.open) else {
        return;
    };
    let typedef = kw > 0 && code[kw - 1].is_keyword("typedef");
    let close = region.close;
    let named = code.get(close + 1).is_some_and(Token::is_ident)
        && code
            .get(close + 2)
            .is_some_and(|t| t.is_punct(";") || t.is_punct(","));
    if typedef && named {
        head.name = Some(code[close + 1].as_str().into_owned());
    }
}

/// Namespace, class, linkage or plain block, from the statement before `brace`.
fn statement_block(code: &[Token<'_>], partner: &[Option<usize>], brace: usize) -> RegionKind {
    let mut s = brace;
    while s > 0 {
        let t = &code[s - 1];
        if t.is_punct(";") || t.is_punct("{") || t.is_punct("}") {
            break;
        }
        if t.is_punct(")") || t.is_punct("]") {
            match partner[s - 1] {
                Some(o) => s = o,
                None => break,
            }
            continue;
        }
        s -= 1;
    }
    let stmt = &code[s..brace];

    let ns_at = match stmt {
        [first, second, ..] if first.is_keyword("inline") && second.is_keyword("namespace") => Some(1),
        [first, ..] if first.is_keyword("namespace") => Some(0),
        _ => None,
    };
    if let Some(n) = ns_at {
        let name = join_tokens(code, s + n + 1..brace);
        return RegionKind::Block(BlockKind::Namespace((!name.is_empty()).then_some(name)));
    }

    if let [first, second] = stmt {
        if first.is_keyword("extern") && second.kind == TokenKind::Literal {
            return RegionKind::Block(BlockKind::Linkage);
        }
    }

    let mut angle = 0i32;
    let mut key = None;
    for (n, t) in stmt.iter().enumerate() {
        if t.is_punct("<") {
            angle += 1;
        } else if t.is_punct(">") {
            angle -= 1;
        } else if angle == 0 && (t.is_punct("=") || t.is_punct("(")) {
            return RegionKind::Block(BlockKind::Plain);
        } else if angle == 0
            && key.is_none()
            && (t.is_keyword("class") || t.is_keyword("struct") || t.is_keyword("union"))
        {
            key = Some(n);
        }
    }
    let Some(key) = key else {
        return RegionKind::Block(BlockKind::Plain);
    };
    RegionKind::Block(BlockKind::Class(class_name(&stmt[key + 1..])))
}

/// Name of a class head: the last identifier before the base clause.
fn class_name(head: &[Token<'_>]) -> Option<String> {
    let mut angle = 0i32;
    let mut name = None;
    for t in head {
        if t.is_punct("<") {
            angle += 1;
        } else if t.is_punct(">") {
            angle -= 1;
        } else if angle == 0 && t.is_punct(":") {
            break;
        } else if angle == 0 && t.is_ident() && !t.is("final") && !is_annotation(t) {
            name = Some(t.as_str().into_owned());
        }
    }
    name
}

/// `DLL_EXPORT`-style macro between a class key and the class name.
fn is_annotation(t: &Token<'_>) -> bool {
    t.text.len() > 1 && !t.text.iter().any(|b| b.is_ascii_lowercase()) && t.text.contains(&b'_')
}
