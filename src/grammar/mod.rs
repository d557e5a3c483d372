//! The fixed grammar table: a builder constructs it once, a [`once_cell::sync::Lazy`]
//! freezes it, and the Earley recognizer and AST builder both read it read-only from then
//! on. Translation callbacks are *not* stored on the table itself (see
//! [`crate::bytecode::translators`]) to keep the table a plain, `Sync` data description —
//! the teacher's own grammar tables (pest's generated parser, the lexer's `LEX_MAP`) are
//! likewise pure data, with behavior attached in a separate layer.
mod rules;

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::lexer::TokenKind;

/// Every non-terminal in the grammar. Small and `Copy` so it doubles as the "small integer
/// index" the spec's data model calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonTerminal {
    Program,
    StmtListTop,
    GeneralStmt,
    Stmt,
    FuncDecl,
    ParamList,
    ParamListTail,
    Param,
    Block,
    StmtList,
    Cond,
    VarDecl,
    ForLoop,
    ForInit,
    ForStep,
    DoWhileLoop,
    WhileLoop,
    IfStmt,
    IfElseStmt,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    ExprStmt,
    Assignment,
    LogicalOr,
    LogicalAnd,
    Equality,
    Relational,
    Additive,
    Multiplicative,
    Unary,
    Postfix,
    Primary,
    ArgList,
    ArgListTail,
}

pub const START: NonTerminal = NonTerminal::Program;

/// One grammar symbol: either a terminal token kind, or a reference to another
/// non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarSymbol {
    Term(TokenKind),
    NonTerm(NonTerminal),
}

/// One production right-hand-side. `important` decides whether a completed item for this
/// alternative becomes its own AST node (§4.4) or is elided in favor of its sole child.
pub struct Alternative {
    pub symbols: Vec<GrammarSymbol>,
    pub important: bool,
}

impl Alternative {
    pub fn new(symbols: Vec<GrammarSymbol>) -> Self {
        Self { symbols, important: true }
    }

    pub fn unimportant(symbols: Vec<GrammarSymbol>) -> Self {
        Self { symbols, important: false }
    }
}

pub struct Grammar {
    table: HashMap<NonTerminal, Vec<Alternative>>,
    nullable: HashSet<NonTerminal>,
}

impl Grammar {
    pub fn alternatives(&self, name: NonTerminal) -> &[Alternative] {
        self.table
            .get(&name)
            .map(Vec::as_slice)
            .unwrap_or_else(|| panic!("non-terminal {name:?} has no alternatives registered"))
    }

    pub fn is_nullable(&self, name: NonTerminal) -> bool {
        self.nullable.contains(&name)
    }

    fn compute_nullable(table: &HashMap<NonTerminal, Vec<Alternative>>) -> HashSet<NonTerminal> {
        let mut nullable = HashSet::new();
        loop {
            let mut changed = false;
            for (name, alts) in table {
                if nullable.contains(name) {
                    continue;
                }
                let this_nullable = alts.iter().any(|alt| {
                    alt.symbols.iter().all(|symbol| match symbol {
                        GrammarSymbol::Term(_) => false,
                        GrammarSymbol::NonTerm(other) => nullable.contains(other),
                    })
                });
                if this_nullable {
                    nullable.insert(*name);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        nullable
    }
}

pub static GRAMMAR: Lazy<Grammar> = Lazy::new(|| {
    let table = rules::build();
    let nullable = Grammar::compute_nullable(&table);
    Grammar { table, nullable }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_list_and_stmt_list_are_nullable() {
        assert!(GRAMMAR.is_nullable(NonTerminal::ParamList));
        assert!(GRAMMAR.is_nullable(NonTerminal::StmtList));
        assert!(GRAMMAR.is_nullable(NonTerminal::ArgList));
    }

    #[test]
    fn program_is_not_nullable_fallthrough_but_its_list_is() {
        assert!(GRAMMAR.is_nullable(NonTerminal::StmtListTop));
    }
}
