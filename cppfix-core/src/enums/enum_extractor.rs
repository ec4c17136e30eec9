//! Enum declaration extraction from the region forest.
//!
//! Extracts every enum with a body:
//! - Unscoped enums: `enum Color { Red, Green };`
//! - Scoped enums: `enum class Mode : unsigned char { On, Off };`
//! - Typedef'd anonymous enums: `typedef enum { A, B } Letter;`
//!
//! Anonymous enums without a typedef name are skipped; nothing can switch
//! on them by type name.

use serde::{Deserialize, Serialize};

use crate::structure::declarator::split_top_level;
use crate::structure::{RegionId, RegionKind, StructuralIndex};

/// An enum declaration with its enumerators in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    /// Name as declared (`Color`)
    pub name: String,
    /// Enclosing named namespaces and classes, outermost first
    pub scope: Vec<String>,
    /// Enumerator names, first occurrence order, no duplicates
    pub enumerators: Vec<String>,
    /// `enum class` / `enum struct`
    pub scoped: bool,
    /// Region of the enum body
    pub region: RegionId,
}

impl EnumDecl {
    /// Scope segments followed by the name segments.
    pub fn qualified_segments(&self) -> Vec<&str> {
        self.scope
            .iter()
            .map(String::as_str)
            .chain(self.name.split("::"))
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Fully qualified name (`ns::Widget::Color`).
    pub fn qualified_name(&self) -> String {
        self.qualified_segments().join("::")
    }
}

/// Split a scope path into `::` segments (`a::b` namespaces become two).
pub(crate) fn flatten_scope(path: Vec<String>) -> Vec<String> {
    path.iter()
        .flat_map(|p| p.split("::"))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract all named enum declarations of one file.
pub fn extract_enums(index: &StructuralIndex<'_>) -> Vec<EnumDecl> {
    let mut results = Vec::with_capacity(8);
    for region in index.tree.iter() {
        let RegionKind::EnumBody(head) = &region.kind else {
            continue;
        };
        let Some(name) = &head.name else {
            continue;
        };
        let code = &index.tokens;
        let mut enumerators: Vec<String> = Vec::new();
        for piece in split_top_level(code, region.open + 1..region.close, false) {
            let mut k = piece.start;
            while k + 1 < piece.end && code[k].is_punct("[") && code[k + 1].is_punct("[") {
                match index.partner[k] {
                    Some(close) => k = close + 1,
                    None => break,
                }
            }
            if k < piece.end && code[k].is_ident() {
                let enumerator = code[k].as_str().into_owned();
                if !enumerators.contains(&enumerator) {
                    enumerators.push(enumerator);
                }
            }
        }
        results.push(EnumDecl {
            name: name.clone(),
            scope: flatten_scope(index.tree.scope_path(region.parent)),
            enumerators,
            scoped: head.scoped,
            region: region.id,
        });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::index;

    fn extract(src: &str) -> Vec<EnumDecl> {
        let idx = index(src.as_bytes()).unwrap();
        extract_enums(&idx)
    }

    #[test]
    fn test_extract_plain_enum() {
        let result = extract("enum Color { Red, Green, Blue };");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Color");
        assert_eq!(result[0].enumerators, vec!["Red", "Green", "Blue"]);
        assert!(!result[0].scoped);
    }

    #[test]
    fn test_extract_initializers_and_trailing_comma() {
        let result = extract("enum Flags { A = 1 << 0, B = f(1, 2), C = A | B, };");
        assert_eq!(result[0].enumerators, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_extract_scoped_and_nested() {
        let src = "namespace gfx { struct Widget { enum class Mode : int { On, Off }; }; }";
        let result = extract(src);
        assert_eq!(result.len(), 1);
        assert!(result[0].scoped);
        assert_eq!(result[0].scope, vec!["gfx", "Widget"]);
        assert_eq!(result[0].qualified_name(), "gfx::Widget::Mode");
    }

    #[test]
    fn test_extract_typedef_enum() {
        let result = extract("typedef enum { Low, High } Level;");
        assert_eq!(result[0].name, "Level");
        assert_eq!(result[0].enumerators, vec!["Low", "High"]);
    }

    #[test]
    fn test_anonymous_enum_skipped() {
        assert!(extract("enum { Unnamed };").is_empty());
    }

    #[test]
    fn test_enumerator_attributes_and_directives() {
        let src = "enum E {\n  [[deprecated]] Old,\n#ifdef NEW\n  New,\n#endif\n  Last\n};";
        let result = extract(src);
        assert_eq!(result[0].enumerators, vec!["Old", "New", "Last"]);
    }

    #[test]
    fn test_nested_namespace_scope_flattened() {
        let result = extract("namespace a::b { enum E { X }; }");
        assert_eq!(result[0].scope, vec!["a", "b"]);
    }
}
