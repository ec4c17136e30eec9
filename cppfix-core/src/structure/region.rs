//! Region forest built over the brace structure of one file.
//!
//! Every `{ ... }` pair becomes exactly one [`Region`]. Regions nest strictly
//! (containment, never partial overlap), children are stored in source order,
//! and each region is addressed both by token indices (into the code-token
//! vector of the owning [`StructuralIndex`](super::StructuralIndex)) and by a
//! half-open byte range.

use std::fmt::Write as _;

use serde::Serialize;

/// Index into [`RegionTree::regions`].
pub type RegionId = usize;

/// Inclusive pair of matching delimiter token indices, e.g. a `( ... )` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenSpan {
    pub open: usize,
    pub close: usize,
}

impl TokenSpan {
    /// Indices strictly between the delimiters.
    pub fn inner(&self) -> std::ops::Range<usize> {
        self.open + 1..self.close
    }

    pub fn is_empty(&self) -> bool {
        self.close == self.open + 1
    }
}

/// Head of a function definition whose body is the region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionHead {
    /// Declarator name as written, qualification included (`Foo::method2`)
    pub name: String,
    /// The parameter list paired with the body
    pub params: TokenSpan,
    /// Body is a function-try-block (`) try {`)
    pub is_try: bool,
}

impl FunctionHead {
    /// Qualifier segments of the name: `a::Foo::m` gives `["a", "Foo"]`.
    pub fn qualifier(&self) -> Vec<&str> {
        let mut segs: Vec<&str> = self
            .name
            .split("::")
            .filter(|s| !s.is_empty())
            .map(|s| s.split('<').next().unwrap_or(s))
            .collect();
        segs.pop();
        segs
    }
}

/// Head of a `switch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwitchHead {
    /// The parenthesized controlling expression
    pub condition: TokenSpan,
}

/// Head of an `enum` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumHead {
    /// Declared name; for `typedef enum { .. } Name;` the typedef name
    pub name: Option<String>,
    /// `enum class` / `enum struct`
    pub scoped: bool,
}

/// Flavour of a plain brace region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    /// Statement scope: if/for/while bodies, lambdas, initializers, bare `{}`
    Plain,
    Namespace(Option<String>),
    /// Body of a class, struct or union
    Class(Option<String>),
    /// `extern "C" { ... }`
    Linkage,
    /// `catch (...) { }` handler of a function-try-block
    TryHandler { function: RegionId },
}

/// Classification of a region, decided from the tokens before its `{`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RegionKind {
    FunctionBody(FunctionHead),
    SwitchBody(SwitchHead),
    EnumBody(EnumHead),
    Block(BlockKind),
}

impl RegionKind {
    /// Short tag used in dumps and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::FunctionBody(_) => "function-body",
            Self::SwitchBody(_) => "switch-body",
            Self::EnumBody(_) => "enum-body",
            Self::Block(BlockKind::Plain) => "block",
            Self::Block(BlockKind::Namespace(_)) => "namespace",
            Self::Block(BlockKind::Class(_)) => "class-body",
            Self::Block(BlockKind::Linkage) => "linkage",
            Self::Block(BlockKind::TryHandler { .. }) => "try-handler",
        }
    }

    /// Scopes where a function definition may appear.
    pub fn admits_definitions(&self) -> bool {
        matches!(
            self,
            Self::Block(BlockKind::Namespace(_) | BlockKind::Class(_) | BlockKind::Linkage)
        )
    }
}

/// One `{ ... }` region.
#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub id: RegionId,
    pub kind: RegionKind,
    /// Code-token index of `{`
    pub open: usize,
    /// Code-token index of `}`
    pub close: usize,
    /// Byte offset of `{`
    pub start: usize,
    /// Byte offset one past `}`
    pub end: usize,
    pub parent: Option<RegionId>,
    /// Direct children in source order
    pub children: Vec<RegionId>,
}

impl Region {
    /// Byte offset of the closing `}`.
    pub fn close_offset(&self) -> usize {
        self.end - 1
    }

    /// Byte offset just after the opening `{`.
    pub fn body_offset(&self) -> usize {
        self.start + 1
    }

    pub fn contains_token(&self, idx: usize) -> bool {
        self.open < idx && idx < self.close
    }
}

/// The forest of regions of one file.
#[derive(Debug, Clone, Default)]
pub struct RegionTree {
    pub(crate) regions: Vec<Region>,
    pub(crate) roots: Vec<RegionId>,
}

impl RegionTree {
    pub fn get(&self, id: RegionId) -> &Region {
        &self.regions[id]
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Top-level regions in source order.
    pub fn roots(&self) -> &[RegionId] {
        &self.roots
    }

    /// All regions in order of their opening brace.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Regions whose kind matches the predicate.
    pub fn filter<'t>(
        &'t self,
        pred: impl Fn(&RegionKind) -> bool + 't,
    ) -> impl Iterator<Item = &'t Region> + 't {
        self.regions.iter().filter(move |r| pred(&r.kind))
    }

    /// Direct children of a region, or the roots for `None`.
    pub fn children_of(&self, id: Option<RegionId>) -> &[RegionId] {
        match id {
            Some(id) => &self.regions[id].children,
            None => &self.roots,
        }
    }

    /// The region itself followed by each enclosing region, innermost first.
    pub fn ancestors(&self, id: RegionId) -> impl Iterator<Item = &Region> {
        let mut next = Some(id);
        std::iter::from_fn(move || {
            let region = &self.regions[next?];
            next = region.parent;
            Some(region)
        })
    }

    /// Innermost region strictly containing the code token `idx`.
    pub fn innermost_at(&self, idx: usize) -> Option<RegionId> {
        let mut level = &self.roots;
        let mut found = None;
        loop {
            let pos = level.partition_point(|c| self.regions[*c].open < idx);
            let candidate = pos.checked_sub(1).map(|p| level[p]);
            match candidate {
                Some(c) if self.regions[c].contains_token(idx) => {
                    found = Some(c);
                    level = &self.regions[c].children;
                }
                _ => return found,
            }
        }
    }

    /// Names of the enclosing named namespaces and classes, outermost first.
    pub fn scope_path(&self, id: Option<RegionId>) -> Vec<String> {
        let Some(id) = id else {
            return Vec::new();
        };
        let mut path: Vec<String> = self
            .ancestors(id)
            .filter_map(|r| match &r.kind {
                RegionKind::Block(BlockKind::Namespace(Some(n)))
                | RegionKind::Block(BlockKind::Class(Some(n))) => Some(n.clone()),
                _ => None,
            })
            .collect();
        path.reverse();
        path
    }

    /// Indented one-line-per-region rendering, for debugging.
    pub fn dump(&self, source: &[u8]) -> String {
        let mut out = String::new();
        for root in &self.roots {
            self.dump_region(*root, source, 0, &mut out);
        }
        out
    }

    fn dump_region(&self, id: RegionId, source: &[u8], depth: usize, out: &mut String) {
        let r = &self.regions[id];
        let detail = match &r.kind {
            RegionKind::FunctionBody(f) => format!(" {}{}", f.name, if f.is_try { " try" } else { "" }),
            RegionKind::EnumBody(e) => {
                format!(" {}", e.name.as_deref().unwrap_or("<anonymous>"))
            }
            RegionKind::Block(BlockKind::Namespace(Some(n)))
            | RegionKind::Block(BlockKind::Class(Some(n))) => format!(" {}", n),
            RegionKind::Block(BlockKind::TryHandler { function }) => {
                format!(" of #{}", function)
            }
            _ => String::new(),
        };
        let line = source[..r.start].iter().filter(|b| **b == b'\n').count() + 1;
        let _ = writeln!(
            out,
            "{:indent$}#{} {}{} [{}..{}) line {}",
            "",
            id,
            r.kind.tag(),
            detail,
            r.start,
            r.end,
            line,
            indent = depth * 2
        );
        for child in &r.children {
            self.dump_region(*child, source, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: RegionId, open: usize, close: usize, parent: Option<RegionId>) -> Region {
        Region {
            id,
            kind: RegionKind::Block(BlockKind::Plain),
            open,
            close,
            start: open,
            end: close + 1,
            parent,
            children: Vec::new(),
        }
    }

    fn sample() -> RegionTree {
        // 0: [0..10], 1: [2..5] inside 0, 2: [6..9] inside 0, 3: [12..14]
        let mut regions = vec![
            region(0, 0, 10, None),
            region(1, 2, 5, Some(0)),
            region(2, 6, 9, Some(0)),
            region(3, 12, 14, None),
        ];
        regions[0].children = vec![1, 2];
        regions[0].kind = RegionKind::Block(BlockKind::Namespace(Some("outer".into())));
        regions[2].kind = RegionKind::Block(BlockKind::Class(Some("Inner".into())));
        RegionTree {
            regions,
            roots: vec![0, 3],
        }
    }

    #[test]
    fn test_innermost_at() {
        let tree = sample();
        assert_eq!(tree.innermost_at(1), Some(0));
        assert_eq!(tree.innermost_at(3), Some(1));
        assert_eq!(tree.innermost_at(5), Some(0));
        assert_eq!(tree.innermost_at(7), Some(2));
        assert_eq!(tree.innermost_at(11), None);
        assert_eq!(tree.innermost_at(13), Some(3));
    }

    #[test]
    fn test_ancestors_and_scope_path() {
        let tree = sample();
        let ids: Vec<_> = tree.ancestors(2).map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 0]);
        assert_eq!(tree.scope_path(Some(2)), vec!["outer", "Inner"]);
        assert!(tree.scope_path(None).is_empty());
    }

    #[test]
    fn test_function_qualifier() {
        let head = FunctionHead {
            name: "ns::Foo<T>::method".into(),
            params: TokenSpan { open: 0, close: 1 },
            is_try: false,
        };
        assert_eq!(head.qualifier(), vec!["ns", "Foo"]);
        assert!(head.params.is_empty());
    }
}
