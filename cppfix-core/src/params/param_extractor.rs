//! Parameter extraction for function definitions.
//!
//! Extracts every parameter of a definition's parameter list:
//! - Named parameters: `int x`, `const T & arg`, `void (*cb)(int)`
//! - Unnamed parameters: `int`, `char` (never reported)
//! - Attributed parameters: `[[maybe_unused]] int x` (never reported)

use serde::Serialize;

use crate::structure::declarator::{parse_param, spaced_tokens, split_top_level};
use crate::structure::{DeclType, FunctionHead, StructuralIndex};

/// Information about one declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDecl {
    /// Declared name, `None` for unnamed parameters
    pub name: Option<String>,
    /// Code-token index of the name
    pub name_idx: Option<usize>,
    /// Byte offset of the first token of the parameter
    pub offset: usize,
    /// Type tokens as written, space separated
    pub type_text: String,
    pub ty: DeclType,
    /// Marked `[[maybe_unused]]` or `__attribute__((unused))`
    pub maybe_unused: bool,
}

impl ParamDecl {
    /// Whether an unused-parameter fix may target this parameter.
    pub fn is_candidate(&self) -> bool {
        self.name.is_some() && !self.maybe_unused
    }
}

/// Extract the parameters of a function definition, in declaration order.
pub fn extract_params(index: &StructuralIndex<'_>, head: &FunctionHead) -> Vec<ParamDecl> {
    let code = &index.tokens;
    split_top_level(code, head.params.inner(), true)
        .into_iter()
        .map(|piece| {
            let parts = parse_param(code, &index.partner, piece.clone());
            let type_end = parts.name.unwrap_or(parts.decl.end);
            ParamDecl {
                name: parts.name.map(|i| code[i].as_str().into_owned()),
                name_idx: parts.name,
                offset: code[piece.start].start,
                type_text: spaced_tokens(code, parts.decl.start..type_end.max(parts.decl.start)),
                ty: parts.ty,
                maybe_unused: parts.maybe_unused,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::index;

    fn names(src: &str) -> Vec<Option<String>> {
        let idx = index(src.as_bytes()).unwrap();
        let (_, head) = idx.functions().next().unwrap();
        extract_params(&idx, head).into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_extract_named_and_unnamed() {
        let got = names("int foo(int, char x, const double * const & s, float y) { return 0; }");
        assert_eq!(
            got,
            vec![None, Some("x".into()), Some("s".into()), Some("y".into())]
        );
    }

    #[test]
    fn test_extract_void_and_empty() {
        assert!(names("int f(void) { return 0; }").iter().all(Option::is_none));
        assert!(names("int f() { return 0; }").is_empty());
    }

    #[test]
    fn test_template_parameter_types() {
        let got = names("void f(std::map<int, char> m, const T & unusedArg) {}");
        assert_eq!(got, vec![Some("m".into()), Some("unusedArg".into())]);
    }

    #[test]
    fn test_type_text_and_offset() {
        let src = "void f(const Color &c) {}";
        let idx = index(src.as_bytes()).unwrap();
        let (_, head) = idx.functions().next().unwrap();
        let params = extract_params(&idx, head);
        assert_eq!(params[0].type_text, "const Color &");
        assert_eq!(params[0].ty, DeclType::Named("Color".into()));
        assert_eq!(params[0].offset, 7);
    }

    #[test]
    fn test_maybe_unused_is_not_candidate() {
        let src = "void f([[maybe_unused]] int a, int b __attribute__((unused)), int c) {}";
        let idx = index(src.as_bytes()).unwrap();
        let (_, head) = idx.functions().next().unwrap();
        let candidates: Vec<_> = extract_params(&idx, head)
            .into_iter()
            .filter(ParamDecl::is_candidate)
            .filter_map(|p| p.name)
            .collect();
        assert_eq!(candidates, vec!["c"]);
    }
}
