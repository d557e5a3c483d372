//! The production table itself. Grounded on the distilled grammar description and on the
//! demo `sum`/`product`/`factor` grammar in the original reference implementation's
//! `ParserGrammar.cpp`, which builds its precedence ladder the same left-recursive way
//! (`sum -> sum '+' product | product`) rather than right-recursive, since Earley parsing
//! has no trouble with left recursion the way a hand-written recursive-descent parser would.
//!
//! Alternative order within a non-terminal matters only for readability here (Earley
//! exploration is breadth-first across all alternatives of a state set); it is NOT a
//! precedence signal the way it would be in a PEG. Each alternative's position in its
//! `Vec` is its `alt_index`, which [`crate::bytecode::translators`] uses as half of the key
//! into the translator registry — keep the two files' indices in lockstep when editing.
use std::collections::HashMap;

use super::{Alternative, GrammarSymbol::*, NonTerminal::{self, *}};
use crate::lexer::TokenKind::*;

fn nt(n: NonTerminal) -> super::GrammarSymbol {
    NonTerm(n)
}

pub fn build() -> HashMap<NonTerminal, Vec<Alternative>> {
    let mut table = HashMap::new();

    // Program ::= StmtListTop
    table.insert(
        Program,
        vec![Alternative::unimportant(vec![nt(StmtListTop)])],
    );

    // StmtListTop ::= StmtListTop GeneralStmt | ε
    table.insert(
        StmtListTop,
        vec![
            Alternative::new(vec![nt(StmtListTop), nt(GeneralStmt)]),
            Alternative::new(vec![]),
        ],
    );

    // GeneralStmt ::= Stmt | FuncDecl
    table.insert(
        GeneralStmt,
        vec![
            Alternative::unimportant(vec![nt(Stmt)]),
            Alternative::unimportant(vec![nt(FuncDecl)]),
        ],
    );

    // FuncDecl ::= "function" Identifier "(" ParamList ")" Block
    table.insert(
        FuncDecl,
        vec![Alternative::new(vec![
            Term(KeywordFunction),
            Term(Identifier),
            Term(LParen),
            nt(ParamList),
            Term(RParen),
            nt(Block),
        ])],
    );

    // ParamList ::= Param ParamListTail | ε
    table.insert(
        ParamList,
        vec![
            Alternative::new(vec![nt(Param), nt(ParamListTail)]),
            Alternative::new(vec![]),
        ],
    );

    // ParamListTail ::= "," Param ParamListTail | ε
    table.insert(
        ParamListTail,
        vec![
            Alternative::new(vec![Term(Comma), nt(Param), nt(ParamListTail)]),
            Alternative::new(vec![]),
        ],
    );

    // Param ::= "ref" Identifier | Identifier
    table.insert(
        Param,
        vec![
            Alternative::new(vec![Term(KeywordRef), Term(Identifier)]),
            Alternative::new(vec![Term(Identifier)]),
        ],
    );

    // Block ::= "{" StmtList "}"
    table.insert(
        Block,
        vec![Alternative::new(vec![Term(LBrace), nt(StmtList), Term(RBrace)])],
    );

    // StmtList ::= StmtList GeneralStmt | ε
    table.insert(
        StmtList,
        vec![
            Alternative::new(vec![nt(StmtList), nt(GeneralStmt)]),
            Alternative::new(vec![]),
        ],
    );

    // Cond ::= "(" Assignment ")"
    table.insert(
        Cond,
        vec![Alternative::new(vec![Term(LParen), nt(Assignment), Term(RParen)])],
    );

    // VarDecl ::= "let" "ref" Identifier "=" Assignment
    //           | "let" "ref" Identifier
    //           | "let" Identifier "=" Assignment
    //           | "let" Identifier
    table.insert(
        VarDecl,
        vec![
            Alternative::new(vec![
                Term(KeywordLet),
                Term(KeywordRef),
                Term(Identifier),
                Term(Assign),
                nt(Assignment),
            ]),
            Alternative::new(vec![Term(KeywordLet), Term(KeywordRef), Term(Identifier)]),
            Alternative::new(vec![
                Term(KeywordLet),
                Term(Identifier),
                Term(Assign),
                nt(Assignment),
            ]),
            Alternative::new(vec![Term(KeywordLet), Term(Identifier)]),
        ],
    );

    // ForInit ::= VarDecl | ε
    table.insert(
        ForInit,
        vec![Alternative::unimportant(vec![nt(VarDecl)]), Alternative::new(vec![])],
    );

    // ForStep ::= Assignment | ε
    table.insert(
        ForStep,
        vec![Alternative::unimportant(vec![nt(Assignment)]), Alternative::new(vec![])],
    );

    // ForLoop ::= "for" "(" ForInit ";" Assignment ";" ForStep ")" Block
    table.insert(
        ForLoop,
        vec![Alternative::new(vec![
            Term(KeywordFor),
            Term(LParen),
            nt(ForInit),
            Term(Semicolon),
            nt(Assignment),
            Term(Semicolon),
            nt(ForStep),
            Term(RParen),
            nt(Block),
        ])],
    );

    // DoWhileLoop ::= "do" Block "while" Cond ";"
    table.insert(
        DoWhileLoop,
        vec![Alternative::new(vec![
            Term(KeywordDo),
            nt(Block),
            Term(KeywordWhile),
            nt(Cond),
            Term(Semicolon),
        ])],
    );

    // WhileLoop ::= "while" Cond Block
    table.insert(
        WhileLoop,
        vec![Alternative::new(vec![Term(KeywordWhile), nt(Cond), nt(Block)])],
    );

    // IfStmt ::= "if" Cond Block
    table.insert(
        IfStmt,
        vec![Alternative::new(vec![Term(KeywordIf), nt(Cond), nt(Block)])],
    );

    // IfElseStmt ::= "if" Cond Block "else" Block
    table.insert(
        IfElseStmt,
        vec![Alternative::new(vec![
            Term(KeywordIf),
            nt(Cond),
            nt(Block),
            Term(KeywordElse),
            nt(Block),
        ])],
    );

    // ReturnStmt ::= "return" Assignment ";" | "return" ";"
    table.insert(
        ReturnStmt,
        vec![
            Alternative::new(vec![Term(KeywordReturn), nt(Assignment), Term(Semicolon)]),
            Alternative::new(vec![Term(KeywordReturn), Term(Semicolon)]),
        ],
    );

    // BreakStmt ::= "break" ";"
    table.insert(
        BreakStmt,
        vec![Alternative::new(vec![Term(KeywordBreak), Term(Semicolon)])],
    );

    // ContinueStmt ::= "continue" ";"
    table.insert(
        ContinueStmt,
        vec![Alternative::new(vec![Term(KeywordContinue), Term(Semicolon)])],
    );

    // ExprStmt ::= Assignment ";"
    table.insert(
        ExprStmt,
        vec![Alternative::new(vec![nt(Assignment), Term(Semicolon)])],
    );

    // Stmt ::= ForLoop | DoWhileLoop | WhileLoop | IfElseStmt | IfStmt
    //        | VarDecl ";" | ExprStmt | ReturnStmt | BreakStmt | ContinueStmt
    table.insert(
        Stmt,
        vec![
            Alternative::unimportant(vec![nt(ForLoop)]),
            Alternative::unimportant(vec![nt(DoWhileLoop)]),
            Alternative::unimportant(vec![nt(WhileLoop)]),
            // IfElseStmt must be tried before IfStmt: both are valid parses of an
            // `if (...) { } else { }` input (IfStmt followed by a dangling `else` would
            // never complete, so the ambiguity is only apparent, but listing the longer
            // alternative first keeps state-set growth predictable).
            Alternative::unimportant(vec![nt(IfElseStmt)]),
            Alternative::unimportant(vec![nt(IfStmt)]),
            Alternative::new(vec![nt(VarDecl), Term(Semicolon)]),
            Alternative::unimportant(vec![nt(ExprStmt)]),
            Alternative::unimportant(vec![nt(ReturnStmt)]),
            Alternative::unimportant(vec![nt(BreakStmt)]),
            Alternative::unimportant(vec![nt(ContinueStmt)]),
        ],
    );

    // Assignment ::= Identifier "=" Assignment | LogicalOr
    table.insert(
        Assignment,
        vec![
            Alternative::new(vec![Term(Identifier), Term(Assign), nt(Assignment)]),
            Alternative::unimportant(vec![nt(LogicalOr)]),
        ],
    );

    // LogicalOr ::= LogicalOr "||" LogicalAnd | LogicalAnd
    table.insert(
        LogicalOr,
        vec![
            Alternative::new(vec![nt(LogicalOr), Term(Or), nt(LogicalAnd)]),
            Alternative::unimportant(vec![nt(LogicalAnd)]),
        ],
    );

    // LogicalAnd ::= LogicalAnd "&&" Equality | Equality
    table.insert(
        LogicalAnd,
        vec![
            Alternative::new(vec![nt(LogicalAnd), Term(And), nt(Equality)]),
            Alternative::unimportant(vec![nt(Equality)]),
        ],
    );

    // Equality ::= Equality ("==" | "!=") Relational | Relational
    table.insert(
        Equality,
        vec![
            Alternative::new(vec![nt(Equality), Term(Eq), nt(Relational)]),
            Alternative::new(vec![nt(Equality), Term(Neq), nt(Relational)]),
            Alternative::unimportant(vec![nt(Relational)]),
        ],
    );

    // Relational ::= Relational ("<" | "<=" | ">" | ">=") Additive | Additive
    table.insert(
        Relational,
        vec![
            Alternative::new(vec![nt(Relational), Term(Lt), nt(Additive)]),
            Alternative::new(vec![nt(Relational), Term(Leq), nt(Additive)]),
            Alternative::new(vec![nt(Relational), Term(Gt), nt(Additive)]),
            Alternative::new(vec![nt(Relational), Term(Geq), nt(Additive)]),
            Alternative::unimportant(vec![nt(Additive)]),
        ],
    );

    // Additive ::= Additive ("+" | "-") Multiplicative | Multiplicative
    table.insert(
        Additive,
        vec![
            Alternative::new(vec![nt(Additive), Term(Plus), nt(Multiplicative)]),
            Alternative::new(vec![nt(Additive), Term(Minus), nt(Multiplicative)]),
            Alternative::unimportant(vec![nt(Multiplicative)]),
        ],
    );

    // Multiplicative ::= Multiplicative ("*" | "/") Unary | Unary
    table.insert(
        Multiplicative,
        vec![
            Alternative::new(vec![nt(Multiplicative), Term(Star), nt(Unary)]),
            Alternative::new(vec![nt(Multiplicative), Term(Slash), nt(Unary)]),
            Alternative::unimportant(vec![nt(Unary)]),
        ],
    );

    // Unary ::= "!" Unary | "-" Unary | Postfix
    table.insert(
        Unary,
        vec![
            Alternative::new(vec![Term(Not), nt(Unary)]),
            Alternative::new(vec![Term(Minus), nt(Unary)]),
            Alternative::unimportant(vec![nt(Postfix)]),
        ],
    );

    // Postfix ::= Postfix "." Identifier | Postfix "(" ArgList ")" | Primary
    table.insert(
        Postfix,
        vec![
            Alternative::new(vec![nt(Postfix), Term(Dot), Term(Identifier)]),
            Alternative::new(vec![nt(Postfix), Term(LParen), nt(ArgList), Term(RParen)]),
            Alternative::unimportant(vec![nt(Primary)]),
        ],
    );

    // Primary ::= Identifier | "null" | "true" | "false" | Number | String | "(" Assignment ")"
    table.insert(
        Primary,
        vec![
            Alternative::new(vec![Term(Identifier)]),
            Alternative::new(vec![Term(Null)]),
            Alternative::new(vec![Term(True)]),
            Alternative::new(vec![Term(False)]),
            Alternative::new(vec![Term(Number)]),
            Alternative::new(vec![Term(String)]),
            Alternative::unimportant(vec![Term(LParen), nt(Assignment), Term(RParen)]),
        ],
    );

    // ArgList ::= Assignment ArgListTail | ε
    table.insert(
        ArgList,
        vec![
            Alternative::new(vec![nt(Assignment), nt(ArgListTail)]),
            Alternative::new(vec![]),
        ],
    );

    // ArgListTail ::= "," Assignment ArgListTail | ε
    table.insert(
        ArgListTail,
        vec![
            Alternative::new(vec![Term(Comma), nt(Assignment), nt(ArgListTail)]),
            Alternative::new(vec![]),
        ],
    );

    table
}
