//! Registry of enum declarations and type-name resolution.
//!
//! Resolution follows C++ lookup loosely: a written name matches every enum
//! whose qualified name ends with the written segments. A single match wins;
//! several matches are narrowed by the scope of the use, innermost first.
//! Anything still ambiguous is reported, never guessed.

use std::collections::HashMap;

use super::enum_extractor::EnumDecl;

/// Outcome of resolving a written type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'r> {
    Found(&'r EnumDecl),
    NotFound,
    /// Qualified names of the competing declarations
    Ambiguous(Vec<String>),
}

/// All enums of one file, indexed by their unqualified name.
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    decls: Vec<EnumDecl>,
    by_name: HashMap<String, Vec<usize>>,
}

impl EnumRegistry {
    pub fn new(decls: Vec<EnumDecl>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::with_capacity(decls.len());
        for (i, decl) in decls.iter().enumerate() {
            let last = decl.name.rsplit("::").next().unwrap_or(&decl.name);
            by_name.entry(last.to_string()).or_default().push(i);
        }
        Self { decls, by_name }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnumDecl> {
        self.decls.iter()
    }

    /// Resolve `written` (e.g. `Color`, `gfx::Mode`, `::Color`) as seen from
    /// `use_scope` (outermost first).
    pub fn resolve(&self, written: &str, use_scope: &[String]) -> Resolution<'_> {
        let rooted = written.starts_with("::");
        let segs: Vec<&str> = written.split("::").filter(|s| !s.is_empty()).collect();
        let Some(last) = segs.last() else {
            return Resolution::NotFound;
        };
        let Some(indices) = self.by_name.get(*last) else {
            return Resolution::NotFound;
        };

        let candidates: Vec<&EnumDecl> = indices
            .iter()
            .map(|i| &self.decls[*i])
            .filter(|d| {
                let q = d.qualified_segments();
                if rooted {
                    q == segs
                } else {
                    q.ends_with(&segs)
                }
            })
            .collect();

        match candidates.as_slice() {
            [] => return Resolution::NotFound,
            [only] => return Resolution::Found(*only),
            _ => {}
        }

        // Innermost enclosing scope first
        for depth in (0..=use_scope.len()).rev() {
            let mut wanted: Vec<&str> = use_scope[..depth].iter().map(String::as_str).collect();
            wanted.extend(segs.iter().copied());
            let hits: Vec<&EnumDecl> = candidates
                .iter()
                .copied()
                .filter(|d| d.qualified_segments() == wanted)
                .collect();
            if let Some(&first) = hits.first() {
                if hits.iter().all(|d| d.enumerators == first.enumerators) {
                    return Resolution::Found(first);
                }
                break;
            }
        }

        // Repeated declarations of one enum (e.g. across #if branches)
        let first = candidates[0];
        let same = candidates.iter().all(|d| {
            d.qualified_segments() == first.qualified_segments() && d.enumerators == first.enumerators
        });
        if same {
            return Resolution::Found(first);
        }

        Resolution::Ambiguous(candidates.iter().map(|d| d.qualified_name()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, scope: &[&str], enumerators: &[&str]) -> EnumDecl {
        EnumDecl {
            name: name.to_string(),
            scope: scope.iter().map(|s| s.to_string()).collect(),
            enumerators: enumerators.iter().map(|s| s.to_string()).collect(),
            scoped: false,
            region: 0,
        }
    }

    fn scope(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_candidate() {
        let reg = EnumRegistry::new(vec![decl("Color", &[], &["Red"])]);
        assert!(matches!(reg.resolve("Color", &[]), Resolution::Found(d) if d.name == "Color"));
        assert_eq!(reg.resolve("Shade", &[]), Resolution::NotFound);
    }

    #[test]
    fn test_qualified_lookup() {
        let reg = EnumRegistry::new(vec![
            decl("Mode", &["a"], &["X"]),
            decl("Mode", &["b"], &["Y"]),
        ]);
        assert!(matches!(reg.resolve("b::Mode", &[]), Resolution::Found(d) if d.enumerators == vec!["Y"]));
        assert_eq!(reg.resolve("c::Mode", &[]), Resolution::NotFound);
    }

    #[test]
    fn test_scope_narrows_candidates() {
        let reg = EnumRegistry::new(vec![
            decl("Mode", &["a"], &["X"]),
            decl("Mode", &["b"], &["Y"]),
        ]);
        let found = reg.resolve("Mode", &scope(&["b"]));
        assert!(matches!(found, Resolution::Found(d) if d.scope == vec!["b"]));
    }

    #[test]
    fn test_ambiguous() {
        let reg = EnumRegistry::new(vec![
            decl("Mode", &["a"], &["X"]),
            decl("Mode", &["b"], &["Y"]),
        ]);
        match reg.resolve("Mode", &[]) {
            Resolution::Ambiguous(names) => assert_eq!(names, vec!["a::Mode", "b::Mode"]),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let reg = EnumRegistry::new(vec![
            decl("Kind", &[], &["Top"]),
            decl("Kind", &["Widget"], &["Inner"]),
        ]);
        let found = reg.resolve("Kind", &scope(&["Widget"]));
        assert!(matches!(found, Resolution::Found(d) if d.enumerators == vec!["Inner"]));
        let found = reg.resolve("Kind", &[]);
        assert!(matches!(found, Resolution::Found(d) if d.enumerators == vec!["Top"]));
    }

    #[test]
    fn test_rooted_name() {
        let reg = EnumRegistry::new(vec![
            decl("Kind", &[], &["Top"]),
            decl("Kind", &["Widget"], &["Inner"]),
        ]);
        let found = reg.resolve("::Kind", &scope(&["Widget"]));
        assert!(matches!(found, Resolution::Found(d) if d.enumerators == vec!["Top"]));
    }

    #[test]
    fn test_identical_redeclarations() {
        let reg = EnumRegistry::new(vec![
            decl("Color", &[], &["Red"]),
            decl("Color", &[], &["Red"]),
        ]);
        assert!(matches!(reg.resolve("Color", &[]), Resolution::Found(_)));
    }
}
