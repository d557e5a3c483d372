//! The token catalog: an ordered list of (kind, regex) pairs. Order is significant — it is
//! the tie-break the lexer falls back on when two patterns match the same prefix length
//! (this is how keywords win over `Identifier`).
use once_cell::sync::Lazy;
use regex::Regex;

use super::token::TokenKind;

/// One entry of the catalog. `pattern` is the *full-match* regex body (no anchors); the
/// catalog wraps it in `^(?:...)$` once at build time, mirroring the teacher's own
/// build-once-read-many lexer table.
struct CatalogEntry {
    kind: TokenKind,
    pattern: &'static str,
}

const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry { kind: TokenKind::KeywordLet, pattern: "let" },
    CatalogEntry { kind: TokenKind::KeywordIf, pattern: "if" },
    CatalogEntry { kind: TokenKind::KeywordElse, pattern: "else" },
    CatalogEntry { kind: TokenKind::KeywordWhile, pattern: "while" },
    CatalogEntry { kind: TokenKind::KeywordDo, pattern: "do" },
    CatalogEntry { kind: TokenKind::KeywordFor, pattern: "for" },
    CatalogEntry { kind: TokenKind::KeywordBreak, pattern: "break" },
    CatalogEntry { kind: TokenKind::KeywordContinue, pattern: "continue" },
    CatalogEntry { kind: TokenKind::KeywordFunction, pattern: "function" },
    CatalogEntry { kind: TokenKind::KeywordReturn, pattern: "return" },
    CatalogEntry { kind: TokenKind::KeywordRef, pattern: "ref" },
    CatalogEntry { kind: TokenKind::Null, pattern: "null" },
    CatalogEntry { kind: TokenKind::True, pattern: "true" },
    CatalogEntry { kind: TokenKind::False, pattern: "false" },
    CatalogEntry { kind: TokenKind::Identifier, pattern: "[A-Za-z_]+" },
    CatalogEntry { kind: TokenKind::String, pattern: "\"(?:\\\\.|[^\"])*\"?" },
    CatalogEntry { kind: TokenKind::Number, pattern: r"[0-9]+\.?[0-9]*" },
    CatalogEntry { kind: TokenKind::Assign, pattern: "=" },
    CatalogEntry { kind: TokenKind::Or, pattern: r"\|\|" },
    CatalogEntry { kind: TokenKind::And, pattern: "&&" },
    CatalogEntry { kind: TokenKind::Eq, pattern: "==" },
    CatalogEntry { kind: TokenKind::Neq, pattern: "!=" },
    CatalogEntry { kind: TokenKind::Lt, pattern: "<" },
    CatalogEntry { kind: TokenKind::Leq, pattern: "<=" },
    CatalogEntry { kind: TokenKind::Gt, pattern: ">" },
    CatalogEntry { kind: TokenKind::Geq, pattern: ">=" },
    CatalogEntry { kind: TokenKind::Plus, pattern: r"\+" },
    CatalogEntry { kind: TokenKind::Minus, pattern: "-" },
    CatalogEntry { kind: TokenKind::Star, pattern: r"\*" },
    CatalogEntry { kind: TokenKind::Slash, pattern: "/" },
    CatalogEntry { kind: TokenKind::Increment, pattern: r"\+\+" },
    CatalogEntry { kind: TokenKind::Decrement, pattern: "--" },
    CatalogEntry { kind: TokenKind::Not, pattern: "!" },
    CatalogEntry { kind: TokenKind::Dot, pattern: r"\." },
    CatalogEntry { kind: TokenKind::LParen, pattern: r"\(" },
    CatalogEntry { kind: TokenKind::RParen, pattern: r"\)" },
    CatalogEntry { kind: TokenKind::LBrace, pattern: r"\{" },
    CatalogEntry { kind: TokenKind::RBrace, pattern: r"\}" },
    CatalogEntry { kind: TokenKind::LBracket, pattern: r"\[" },
    CatalogEntry { kind: TokenKind::RBracket, pattern: r"\]" },
    CatalogEntry { kind: TokenKind::Comma, pattern: "," },
    CatalogEntry { kind: TokenKind::Semicolon, pattern: ";" },
    CatalogEntry { kind: TokenKind::CommentSingleLine, pattern: r"//[^\n]*(?:\n)?" },
    CatalogEntry {
        kind: TokenKind::CommentMultiLine,
        pattern: r"/\*(?:[^*]|\*[^/])*\*/",
    },
];

pub struct Catalog {
    entries: Vec<(TokenKind, Regex)>,
}

impl Catalog {
    /// Full-match test of `text` against the pattern at `index`, mirroring the original
    /// evaluator's use of a whole-string regex match (not a search) at every candidate
    /// prefix length.
    pub fn matches(&self, index: usize, text: &str) -> bool {
        self.entries[index].1.is_match(text)
    }

    pub fn kind_of(&self, index: usize) -> TokenKind {
        self.entries[index].0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub static CATALOG: Lazy<Catalog> = Lazy::new(|| {
    let entries = ENTRIES
        .iter()
        .map(|entry| {
            let anchored = format!("^(?:{})$", entry.pattern);
            let regex = Regex::new(&anchored)
                .unwrap_or_else(|err| panic!("invalid token pattern for {:?}: {err}", entry.kind));
            (entry.kind, regex)
        })
        .collect();
    Catalog { entries }
});
