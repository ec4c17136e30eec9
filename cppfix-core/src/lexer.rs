//! Tolerant C++ lexer.
//!
//! Produces a lazy, fused stream of [`Token`]s with exact byte offsets.
//! Whitespace is dropped; comments, literals and preprocessor directives are
//! kept as opaque tokens so that no later stage ever looks inside them.
//!
//! The lexer works on raw bytes. Every byte that matters syntactically is
//! ASCII, and bytes `>= 0x80` are treated as identifier characters, so
//! non-UTF-8 input (Latin-1 comments, for instance) never breaks offsets.
//!
//! Failures:
//! - unterminated block comment, string, character or raw string literal
//! - a raw newline inside an ordinary string or character literal
//!
//! Both are reported as [`FixError::Lex`] and end the stream.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{FixError, FixResult};

/// Reserved words that never name a variable, parameter or enumerator.
const KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class", "co_await",
    "co_return", "co_yield", "compl", "concept", "const", "consteval", "constexpr", "constinit",
    "const_cast", "continue", "decltype", "default", "delete", "do", "double", "dynamic_cast",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register",
    "reinterpret_cast", "requires", "return", "short", "signed", "sizeof", "static",
    "static_assert", "static_cast", "struct", "switch", "template", "this", "thread_local",
    "throw", "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
    "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
];

/// Encoding prefixes that may precede an ordinary string or character literal.
const LITERAL_PREFIXES: &[&[u8]] = &[b"L", b"u", b"U", b"u8"];

/// Prefixes that open a raw string literal.
const RAW_PREFIXES: &[&[u8]] = &[b"R", b"LR", b"uR", b"UR", b"u8R"];

/// Longest delimiter a raw string may carry.
const MAX_RAW_DELIMITER: usize = 16;

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuation,
    /// Numbers, strings and character literals, prefixes and suffixes included
    Literal,
    Comment,
    /// A whole preprocessor line, continuations included
    Directive,
}

/// A token borrowed from the source buffer. `text == &source[start..end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a [u8],
    pub start: usize,
    pub end: usize,
}

impl<'a> Token<'a> {
    /// Exact text comparison.
    #[inline]
    pub fn is(&self, text: &str) -> bool {
        self.text == text.as_bytes()
    }

    /// Punctuation token with the given spelling.
    #[inline]
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.is(text)
    }

    /// Keyword token with the given spelling.
    #[inline]
    pub fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokenKind::Keyword && self.is(text)
    }

    #[inline]
    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Comments and directives: present in the stream but never code.
    #[inline]
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::Directive)
    }

    /// Text for display and for name comparison.
    ///
    /// Bytes that are not UTF-8 come out as `\xNN`, so distinct spellings
    /// stay distinct. Inserted text copies [`Token::text`] instead.
    pub fn as_str(&self) -> Cow<'a, str> {
        match std::str::from_utf8(self.text) {
            Ok(s) => Cow::Borrowed(s),
            Err(_) => Cow::Owned(escape_invalid(self.text)),
        }
    }
}

fn escape_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 8);
    loop {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                out.push_str(s);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let bad = e.error_len().unwrap_or(rest.len());
                for b in &rest[..bad] {
                    out.push_str(&format!("\\x{:02x}", b));
                }
                bytes = &rest[bad..];
            }
        }
    }
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

#[inline]
fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn is_keyword(text: &[u8]) -> bool {
    KEYWORDS.iter().any(|k| k.as_bytes() == text)
}

/// Lazy token stream over one buffer. Fused after the first error.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    /// Only blanks seen since the last newline
    at_line_start: bool,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            at_line_start: true,
            done: false,
        }
    }

    #[inline]
    fn peek(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token {
            kind,
            text: &self.src[start..self.pos],
            start,
            end: self.pos,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek(0) {
            match b {
                b'\n' => {
                    self.at_line_start = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                // Line splice outside a directive
                b'\\' if self.peek(1) == Some(b'\n') => self.pos += 2,
                b'\\' if self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') => {
                    self.pos += 3
                }
                _ => break,
            }
        }
    }

    /// Index of the next newline that is not escaped by a trailing backslash.
    fn logical_line_end(&self, from: usize) -> usize {
        let mut i = from;
        while i < self.src.len() {
            if self.src[i] == b'\n' {
                let mut j = i;
                if j > 0 && self.src[j - 1] == b'\r' {
                    j -= 1;
                }
                if j > 0 && self.src[j - 1] == b'\\' {
                    i += 1;
                    continue;
                }
                return if j < i { j } else { i };
            }
            i += 1;
        }
        self.src.len()
    }

    fn line_comment(&mut self, start: usize) -> Token<'a> {
        self.pos = self.logical_line_end(start + 2);
        self.token(TokenKind::Comment, start)
    }

    fn block_comment(&mut self, start: usize) -> FixResult<Token<'a>> {
        match find(&self.src[start + 2..], b"*/") {
            Some(i) => {
                self.pos = start + 2 + i + 2;
                Ok(self.token(TokenKind::Comment, start))
            }
            None => Err(FixError::lex(start, "unterminated block comment")),
        }
    }

    /// A whole preprocessor line. Quotes inside a directive are tolerated
    /// unbalanced (`#error don't`), block comments may span lines.
    fn directive(&mut self, start: usize) -> FixResult<Token<'a>> {
        let mut i = start + 1;
        while i < self.src.len() {
            match self.src[i] {
                b'\n' => {
                    let mut j = i;
                    if j > 0 && self.src[j - 1] == b'\r' {
                        j -= 1;
                    }
                    if j > 0 && self.src[j - 1] == b'\\' {
                        i += 1;
                        continue;
                    }
                    self.pos = j;
                    return Ok(self.token(TokenKind::Directive, start));
                }
                b'/' if self.src.get(i + 1) == Some(&b'*') => {
                    match find(&self.src[i + 2..], b"*/") {
                        Some(k) => i = i + 2 + k + 2,
                        None => return Err(FixError::lex(i, "unterminated block comment")),
                    }
                }
                b'/' if self.src.get(i + 1) == Some(&b'/') => {
                    self.pos = self.logical_line_end(i);
                    return Ok(self.token(TokenKind::Directive, start));
                }
                q @ (b'"' | b'\'') => {
                    i += 1;
                    while i < self.src.len() && self.src[i] != q && self.src[i] != b'\n' {
                        i += if self.src[i] == b'\\' { 2 } else { 1 };
                    }
                    if i < self.src.len() && self.src[i] == q {
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }
        self.pos = self.src.len();
        Ok(self.token(TokenKind::Directive, start))
    }

    fn ud_suffix(&mut self) {
        while self.peek(0).is_some_and(is_ident_continue) {
            self.pos += 1;
        }
    }

    /// Ordinary string or character literal; `self.pos` is on the opening quote.
    fn quoted(&mut self, start: usize) -> FixResult<Token<'a>> {
        let quote = self.src[self.pos];
        let what = if quote == b'"' { "string" } else { "character" };
        self.pos += 1;
        loop {
            match self.peek(0) {
                None => {
                    return Err(FixError::lex(
                        start,
                        format!("unterminated {} literal", what),
                    ))
                }
                Some(b'\\') => self.pos += 2,
                Some(b'\n') => {
                    return Err(FixError::lex(
                        start,
                        format!("newline in {} literal", what),
                    ))
                }
                Some(b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.src.len());
        self.ud_suffix();
        Ok(self.token(TokenKind::Literal, start))
    }

    /// Raw string literal; `self.pos` is on the opening quote.
    fn raw_string(&mut self, start: usize) -> FixResult<Token<'a>> {
        let delim_start = self.pos + 1;
        let open = self.src[delim_start..]
            .iter()
            .take(MAX_RAW_DELIMITER + 1)
            .position(|b| *b == b'(')
            .ok_or_else(|| FixError::lex(start, "malformed raw string delimiter"))?;
        let delim = &self.src[delim_start..delim_start + open];
        if delim
            .iter()
            .any(|b| matches!(b, b' ' | b')' | b'\\' | b'\t' | b'\n'))
        {
            return Err(FixError::lex(start, "malformed raw string delimiter"));
        }
        let mut closing = Vec::with_capacity(delim.len() + 2);
        closing.push(b')');
        closing.extend_from_slice(delim);
        closing.push(b'"');
        let body = delim_start + open + 1;
        match find(&self.src[body..], &closing) {
            Some(i) => {
                self.pos = body + i + closing.len();
                self.ud_suffix();
                Ok(self.token(TokenKind::Literal, start))
            }
            None => Err(FixError::lex(start, "unterminated raw string literal")),
        }
    }

    fn number(&mut self, start: usize) -> Token<'a> {
        while let Some(b) = self.peek(0) {
            if matches!(b, b'e' | b'E' | b'p' | b'P') && matches!(self.peek(1), Some(b'+' | b'-'))
            {
                self.pos += 2;
            } else if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
                self.pos += 1;
            } else if b == b'\''
                && self.peek(1).is_some_and(|n| n.is_ascii_alphanumeric())
            {
                // Digit separator: 1'000'000
                self.pos += 2;
            } else {
                break;
            }
        }
        self.token(TokenKind::Literal, start)
    }

    fn identifier(&mut self, start: usize) -> FixResult<Token<'a>> {
        while self.peek(0).is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        let word = &self.src[start..self.pos];
        match self.peek(0) {
            Some(b'"') if RAW_PREFIXES.contains(&word) => return self.raw_string(start),
            Some(b'"' | b'\'') if LITERAL_PREFIXES.contains(&word) => return self.quoted(start),
            _ => {}
        }
        let kind = if is_keyword(word) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Ok(self.token(kind, start))
    }

    fn punctuation(&mut self, start: usize) -> Token<'a> {
        let rest = &self.src[start..];
        let len = if rest.starts_with(b"...") {
            3
        } else if rest.starts_with(b"::") || rest.starts_with(b"->") {
            2
        } else {
            1
        };
        self.pos = start + len;
        self.token(TokenKind::Punctuation, start)
    }

    fn next_token(&mut self) -> Option<FixResult<Token<'a>>> {
        self.skip_whitespace();
        let start = self.pos;
        let b = self.peek(0)?;
        let line_start = std::mem::replace(&mut self.at_line_start, false);
        let result = match b {
            b'#' if line_start => self.directive(start),
            b'/' if self.peek(1) == Some(b'/') => Ok(self.line_comment(start)),
            b'/' if self.peek(1) == Some(b'*') => self.block_comment(start),
            b'"' | b'\'' => self.quoted(start),
            b'0'..=b'9' => Ok(self.number(start)),
            b'.' if self.peek(1).is_some_and(|n| n.is_ascii_digit()) => Ok(self.number(start)),
            b if is_ident_start(b) => self.identifier(start),
            _ => Ok(self.punctuation(start)),
        };
        Some(result)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = FixResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.next_token();
        if matches!(next, None | Some(Err(_))) {
            self.done = true;
        }
        next
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

/// Lex a whole buffer, failing on the first lexical error.
pub fn tokenize(src: &[u8]) -> FixResult<Vec<Token<'_>>> {
    Lexer::new(src).collect()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        tokenize(src.as_bytes())
            .unwrap()
            .iter()
            .map(|t| (t.kind, t.as_str().into_owned()))
            .collect()
    }

    #[test]
    fn test_basic_classification() {
        let toks = kinds("int foo(char x) { return x; }");
        assert_eq!(toks[0], (TokenKind::Keyword, "int".into()));
        assert_eq!(toks[1], (TokenKind::Identifier, "foo".into()));
        assert_eq!(toks[2], (TokenKind::Punctuation, "(".into()));
        assert_eq!(toks.len(), 11);
    }

    #[test]
    fn test_offsets_are_exact() {
        let src = b"a  /*c*/ b";
        let toks = tokenize(src).unwrap();
        for t in &toks {
            assert_eq!(&src[t.start..t.end], t.text);
        }
        assert_eq!(toks[1].kind, TokenKind::Comment);
        assert_eq!((toks[1].start, toks[1].end), (3, 8));
    }

    #[test]
    fn test_comments_are_opaque() {
        let toks = kinds("x // { switch\ny /* } enum */ z");
        let code: Vec<_> = toks
            .iter()
            .filter(|(k, _)| *k != TokenKind::Comment)
            .map(|(_, t)| t.as_str())
            .collect();
        assert_eq!(code, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_line_comment_continuation() {
        let toks = kinds("// one \\\n still comment\nx");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[1].1, "x");
    }

    #[test]
    fn test_escaped_quotes() {
        let toks = kinds(r#"s = "a \" { b"; c = '\''; d"#);
        assert_eq!(toks[2], (TokenKind::Literal, r#""a \" { b""#.into()));
        assert_eq!(toks[6], (TokenKind::Literal, r"'\''".into()));
        assert_eq!(toks.last().unwrap().1, "d");
    }

    #[test]
    fn test_prefixed_and_raw_literals() {
        let toks = kinds(r#"L"wide" u8"utf" R"xy(a)" } )xy" U'c'"#);
        assert_eq!(toks.len(), 4);
        assert!(toks.iter().all(|(k, _)| *k == TokenKind::Literal));
        assert_eq!(toks[2].1, r#"R"xy(a)" } )xy""#);
    }

    #[test]
    fn test_digit_separator_and_suffix() {
        let toks = kinds("x = 1'000'000ull + 0x1p-3 + \"s\"_sv;");
        assert_eq!(toks[2].1, "1'000'000ull");
        assert_eq!(toks[4].1, "0x1p-3");
        assert_eq!(toks[6].1, "\"s\"_sv");
    }

    #[test]
    fn test_multichar_punctuation() {
        let toks = kinds("a::b->c(...) >>");
        let texts: Vec<_> = toks.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["a", "::", "b", "->", "c", "(", "...", ")", ">", ">"]);
    }

    #[test]
    fn test_directive_is_single_token() {
        let toks = kinds("#define OPEN { \\\n  x\n#error don't\nint y;");
        assert_eq!(toks[0].0, TokenKind::Directive);
        assert_eq!(toks[0].1, "#define OPEN { \\\n  x");
        assert_eq!(toks[1], (TokenKind::Directive, "#error don't".into()));
        assert_eq!(toks[2].1, "int");
    }

    #[test]
    fn test_hash_mid_line_is_punctuation() {
        let toks = kinds("a # b");
        assert_eq!(toks[1], (TokenKind::Punctuation, "#".into()));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize(b"int a; /* never closed").unwrap_err();
        assert!(matches!(err, FixError::Lex { offset: 7, .. }));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize(b"char* s = \"abc").unwrap_err();
        assert!(matches!(err, FixError::Lex { offset: 10, .. }));
        let err = tokenize(b"char c = 'x\n;").unwrap_err();
        assert!(matches!(err, FixError::Lex { .. }));
    }

    #[test]
    fn test_unterminated_raw_string() {
        assert!(tokenize(b"R\"d(abc)x\"").is_err());
    }

    #[test]
    fn test_lexer_is_fused_after_error() {
        let mut lexer = Lexer::new(b"a /* b");
        assert!(lexer.next().unwrap().is_ok());
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_non_utf8_bytes() {
        let src = b"// caf\xe9\nint x;";
        let toks = tokenize(src).unwrap();
        assert_eq!(toks.len(), 4);
        assert_eq!(toks[2].as_str(), "x");
    }

    #[test]
    fn test_non_utf8_identifiers_stay_distinct() {
        let toks = tokenize(b"a\xff a\xfe").unwrap();
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].as_str(), "a\\xff");
        assert_ne!(toks[0].as_str(), toks[1].as_str());
    }
}
