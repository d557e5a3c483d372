//! Scannerless, regex-based lexer.
//!
//! Tokenizes by maximal munch over the fixed, ordered [`catalog::CATALOG`]: at each byte
//! offset it finds the longest prefix that fully matches some pattern, breaking ties
//! between equal-length matches by catalog declaration order (so keywords, which precede
//! `Identifier`, win). Whitespace is skipped before each scan, the same way a hand-written
//! recursive lexer would `eat_whitespace()` before looking for the next token.
mod catalog;
mod token;

pub use token::{Token, TokenKind};

use std::fmt::{self, Display};

use log::debug;

use catalog::CATALOG;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
}

impl Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to lex token at byte offset {}", self.offset)
    }
}

impl std::error::Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

/// Runs the maximal-munch scan described in the lexer component design and returns the
/// ordered, already-filtered (comments and whitespace dropped) token stream.
pub fn lex(source: &str) -> LexResult<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut begin = 0usize;

    while begin < source.len() {
        if source.as_bytes()[begin].is_ascii_whitespace() {
            begin += 1;
            continue;
        }

        let (end, catalog_index) = longest_match(source, begin).ok_or(LexError { offset: begin })?;

        let kind = CATALOG.kind_of(catalog_index);
        let lexeme = &source[begin..end];

        debug!("lexed {kind:?}: {lexeme:?}");

        if !kind.is_useless() {
            tokens.push(Token::new(kind, lexeme));
        }

        begin = end;
    }

    Ok(tokens)
}

/// Finds the longest `end` such that `source[begin..end]` fully matches some catalog
/// pattern, and the smallest catalog index that matches at that length.
fn longest_match(source: &str, begin: usize) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut end = begin + 1;

    loop {
        if source.is_char_boundary(end) {
            let candidate = &source[begin..end];
            if let Some(index) = (0..CATALOG.len()).find(|&i| CATALOG.matches(i, candidate)) {
                best = Some((end, index));
            }
        }

        if end >= source.len() {
            break;
        }
        end += 1;
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_keywords_before_identifiers() {
        let tokens = lex("let x = 1;").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::KeywordLet);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "x");
    }

    #[test]
    fn drops_comments_and_whitespace() {
        let tokens = lex("let x = 1; // trailing\n/* block */ let y = 2;").unwrap();
        assert!(tokens.iter().all(|t| !t.kind.is_useless()));
        assert_eq!(tokens.len(), 10);
    }

    #[test]
    fn lexes_operators_by_longest_match() {
        let tokens = lex("a == b").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Eq);
        assert_eq!(tokens[1].lexeme, "==");
    }

    #[test]
    fn reports_offset_on_invalid_input() {
        let err = lex("let x = 1; $").unwrap_err();
        assert_eq!(err.offset, 11);
    }

    #[test]
    fn lossless_modulo_dropped_whitespace_and_comments() {
        let source = "let x=1; // c\n";
        let tokens = lex(source).unwrap();
        let reconstructed: String = tokens.iter().map(|t| t.lexeme).collect();
        assert_eq!(reconstructed, "letx=1;");
    }
}
