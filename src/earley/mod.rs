//! Earley recognizer: predict / scan / complete over per-position state sets.
//!
//! Deliberately a *recognizer* plus a completed-item trace, not a parser that builds trees
//! itself — [`crate::ast`] walks the recorded state sets afterward to build the AST, per the
//! left-to-right reconstruction in the component design. This split mirrors the original
//! reference implementation's separation between `Rules`/state-set filling and its own
//! subsequent tree pass.
use std::collections::HashSet;
use std::fmt::{self, Display};

use log::debug;

use crate::grammar::{GrammarSymbol, NonTerminal, GRAMMAR};
use crate::lexer::Token;

/// A dotted production bound to an origin state-set index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EarleyItem {
    pub rule: NonTerminal,
    pub alt_index: usize,
    pub origin: usize,
    pub dot: usize,
}

impl EarleyItem {
    fn new(rule: NonTerminal, alt_index: usize, origin: usize) -> Self {
        Self { rule, alt_index, origin, dot: 0 }
    }

    fn symbol_at(&self, dot: usize) -> Option<GrammarSymbol> {
        GRAMMAR.alternatives(self.rule)[self.alt_index].symbols.get(dot).copied()
    }

    fn next_symbol(&self) -> Option<GrammarSymbol> {
        self.symbol_at(self.dot)
    }

    fn is_complete(&self) -> bool {
        self.next_symbol().is_none()
    }

    fn advanced(&self) -> Self {
        Self { dot: self.dot + 1, ..*self }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedEndOfStream,
    InvalidInput { position: usize },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedEndOfStream => write!(f, "unexpected end of stream"),
            ParseError::InvalidInput { position } => write!(f, "input is invalid at token {position}"),
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// One state set per position 0..=tokens.len(), each a de-duplicated, insertion-ordered
/// list of items (insertion order matters later: the AST builder wants completed items in
/// the order they were discovered).
pub struct StateSets {
    pub sets: Vec<Vec<EarleyItem>>,
}

impl StateSets {
    pub fn at(&self, position: usize) -> &[EarleyItem] {
        &self.sets[position]
    }
}

/// Runs the recognizer to completion and returns every state set, or a [`ParseError`] if
/// the token stream is not accepted by [`crate::grammar::START`].
pub fn recognize(tokens: &[Token<'_>]) -> ParseResult<StateSets> {
    let mut sets: Vec<Vec<EarleyItem>> = (0..=tokens.len()).map(|_| Vec::new()).collect();
    let mut seen: Vec<HashSet<EarleyItem>> = (0..=tokens.len()).map(|_| HashSet::new()).collect();

    let mut push = |sets: &mut Vec<Vec<EarleyItem>>, seen: &mut Vec<HashSet<EarleyItem>>, position: usize, item: EarleyItem| {
        if seen[position].insert(item) {
            sets[position].push(item);
        }
    };

    for alt_index in 0..GRAMMAR.alternatives(crate::grammar::START).len() {
        push(&mut sets, &mut seen, 0, EarleyItem::new(crate::grammar::START, alt_index, 0));
    }

    for position in 0..=tokens.len() {
        let mut cursor = 0;
        while cursor < sets[position].len() {
            let item = sets[position][cursor];
            cursor += 1;

            match item.next_symbol() {
                None => {
                    // complete
                    let completed_rule = item.rule;
                    let origin = item.origin;
                    let waiting: Vec<EarleyItem> = sets[origin]
                        .iter()
                        .filter(|waiting_item| {
                            matches!(waiting_item.next_symbol(), Some(GrammarSymbol::NonTerm(n)) if n == completed_rule)
                        })
                        .copied()
                        .collect();
                    for waiting_item in waiting {
                        push(&mut sets, &mut seen, position, waiting_item.advanced());
                    }
                }
                Some(GrammarSymbol::NonTerm(next)) => {
                    // predict
                    for alt_index in 0..GRAMMAR.alternatives(next).len() {
                        push(&mut sets, &mut seen, position, EarleyItem::new(next, alt_index, position));
                    }
                    if GRAMMAR.is_nullable(next) {
                        push(&mut sets, &mut seen, position, item.advanced());
                    }
                }
                Some(GrammarSymbol::Term(kind)) => {
                    // scan
                    if let Some(token) = tokens.get(position) {
                        if token.kind == kind {
                            push(&mut sets, &mut seen, position + 1, item.advanced());
                        }
                    }
                }
            }
        }
        debug!("state set {position}: {} items", sets[position].len());

        if position < tokens.len() && sets[position + 1].is_empty() {
            sets.truncate(position + 1);
            break;
        }
    }

    if sets.len() != tokens.len() + 1 {
        return Err(ParseError::UnexpectedEndOfStream);
    }

    let accepted = sets[tokens.len()].iter().any(|item| {
        item.rule == crate::grammar::START && item.origin == 0 && item.is_complete()
    });

    if !accepted {
        return Err(ParseError::InvalidInput { position: tokens.len() });
    }

    Ok(StateSets { sets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn accepts_minimal_statement() {
        let tokens = lex("let x = 1;").unwrap();
        let result = recognize(&tokens);
        assert!(result.is_ok());
    }

    #[test]
    fn state_set_count_matches_token_count_plus_one() {
        let tokens = lex("let x = 1; println(x);").unwrap();
        let sets = recognize(&tokens).unwrap();
        assert_eq!(sets.sets.len(), tokens.len() + 1);
    }

    #[test]
    fn rejects_truncated_input() {
        let tokens = lex("let x =").unwrap();
        assert!(matches!(recognize(&tokens), Err(ParseError::UnexpectedEndOfStream) | Err(ParseError::InvalidInput { .. })));
    }

    #[test]
    fn rejects_structurally_invalid_input() {
        let tokens = lex("let let let;").unwrap();
        assert!(recognize(&tokens).is_err());
    }
}
