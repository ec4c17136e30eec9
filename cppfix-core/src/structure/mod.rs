//! Structural index: the region forest of one file.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │   indexer.rs        │────▶│   declarator.rs     │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  Match delimiters,  │     │  Function heads,    │
//! │  classify `{`       │     │  params, locals     │
//! └──────────┬──────────┘     └─────────────────────┘
//!            ▼
//! ┌─────────────────────┐
//! │   region.rs         │
//! │  ─────────────────  │
//! │  Region forest,     │
//! │  scope queries      │
//! └─────────────────────┘
//! ```
//!
//! Every later stage works on code-token indices (comments and directives
//! filtered out) and asks the index for partners, regions and direct tokens.

pub mod declarator;
pub mod indexer;
pub mod region;

use std::borrow::Cow;
use std::ops::Range;

pub use declarator::{DeclSite, DeclType, LocalDecl, ParamParts};
pub use indexer::{index, index_tokens};
pub use region::{
    BlockKind, EnumHead, FunctionHead, Region, RegionId, RegionKind, RegionTree, SwitchHead,
    TokenSpan,
};

use crate::lexer::Token;

/// Tokens, delimiter pairs and regions of one buffer.
#[derive(Debug, Clone)]
pub struct StructuralIndex<'a> {
    pub source: &'a [u8],
    /// Every token, comments and directives included
    pub all_tokens: Vec<Token<'a>>,
    /// Code tokens only; all indices elsewhere refer to this vector
    pub tokens: Vec<Token<'a>>,
    /// Matching delimiter for every `()[]{}` token
    pub partner: Vec<Option<usize>>,
    pub tree: RegionTree,
}

impl<'a> StructuralIndex<'a> {
    /// Text of a code token.
    pub fn text(&self, idx: usize) -> Cow<'a, str> {
        self.tokens[idx].as_str()
    }

    /// Region whose `{` is the code token `open`.
    pub fn region_at_open(&self, open: usize) -> Option<RegionId> {
        self.tree
            .regions
            .binary_search_by_key(&open, |r| r.open)
            .ok()
    }

    /// First code-token index inside a region, or 0 at file scope.
    pub fn floor(&self, id: Option<RegionId>) -> usize {
        id.map_or(0, |id| self.tree.get(id).open + 1)
    }

    /// Code-token ranges directly inside a region, child regions cut out.
    ///
    /// `None` means file scope. A child's braces are cut together with its
    /// contents.
    pub fn direct_ranges(&self, id: Option<RegionId>) -> Vec<Range<usize>> {
        let (mut at, end) = match id {
            Some(id) => {
                let r = self.tree.get(id);
                (r.open + 1, r.close)
            }
            None => (0, self.tokens.len()),
        };
        let mut ranges = Vec::new();
        for child in self.tree.children_of(id) {
            let c = self.tree.get(*child);
            if c.open > at {
                ranges.push(at..c.open);
            }
            at = c.close + 1;
        }
        if end > at {
            ranges.push(at..end);
        }
        ranges
    }

    /// True when a byte offset falls strictly inside any token, comments included.
    pub fn splits_token(&self, offset: usize) -> bool {
        let pos = self.all_tokens.partition_point(|t| t.start < offset);
        pos.checked_sub(1)
            .map(|p| &self.all_tokens[p])
            .is_some_and(|t| t.end > offset)
    }

    /// Innermost region containing a code token.
    pub fn scope_at(&self, idx: usize) -> Option<RegionId> {
        self.tree.innermost_at(idx)
    }

    /// Regions of function bodies, in source order.
    pub fn functions(&self) -> impl Iterator<Item = (&Region, &FunctionHead)> {
        self.tree.iter().filter_map(|r| match &r.kind {
            RegionKind::FunctionBody(head) => Some((r, head)),
            _ => None,
        })
    }

    /// Regions of switch bodies, in source order.
    pub fn switches(&self) -> impl Iterator<Item = (&Region, &SwitchHead)> {
        self.tree.iter().filter_map(|r| match &r.kind {
            RegionKind::SwitchBody(head) => Some((r, head)),
            _ => None,
        })
    }

    /// Try handlers belonging to the function whose body is `function`.
    pub fn handlers_of(&self, function: RegionId) -> impl Iterator<Item = &Region> {
        self.tree.iter().filter(move |r| {
            matches!(r.kind, RegionKind::Block(BlockKind::TryHandler { function: f }) if f == function)
        })
    }

    /// Debug rendering of the region forest.
    pub fn dump(&self) -> String {
        self.tree.dump(self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_ranges_skip_children() {
        let idx = index(b"void f() { int a; { int b; } a = 1; }").unwrap();
        let ranges = idx.direct_ranges(Some(0));
        let texts: Vec<String> = ranges
            .iter()
            .flat_map(|r| r.clone())
            .map(|i| idx.text(i).into_owned())
            .collect();
        assert_eq!(texts, vec!["int", "a", ";", "a", "=", "1", ";"]);
    }

    #[test]
    fn test_file_scope_direct_ranges() {
        let idx = index(b"int x; void f() { }").unwrap();
        let n: usize = idx.direct_ranges(None).iter().map(|r| r.len()).sum();
        // `int x ; void f ( )`
        assert_eq!(n, 7);
    }

    #[test]
    fn test_splits_token() {
        let idx = index(b"int abc; /* c */").unwrap();
        assert!(!idx.splits_token(0));
        assert!(idx.splits_token(5));
        assert!(!idx.splits_token(7));
        assert!(idx.splits_token(11));
        assert!(!idx.splits_token(16));
    }

    #[test]
    fn test_dump_lists_regions() {
        let idx = index(b"namespace a {\nint f() { return 0; }\n}").unwrap();
        let dump = idx.dump();
        assert!(dump.contains("namespace a"));
        assert!(dump.contains("  #1 function-body f"));
        assert!(dump.contains("line 2"));
    }

    #[test]
    fn test_handlers_of() {
        let idx = index(b"int g() try { return 1; } catch (...) { return 0; }").unwrap();
        assert_eq!(idx.handlers_of(0).count(), 1);
        assert_eq!(idx.functions().count(), 1);
    }
}
