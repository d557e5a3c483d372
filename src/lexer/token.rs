use std::fmt::{self, Display};

/// Every lexical atom the language recognizes, in the catalog order the lexer uses to
/// break maximal-munch ties. Keyword variants must stay ahead of `Identifier` so that
/// e.g. `let` wins over being read as an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    KeywordLet,
    KeywordIf,
    KeywordElse,
    KeywordWhile,
    KeywordDo,
    KeywordFor,
    KeywordBreak,
    KeywordContinue,
    KeywordFunction,
    KeywordReturn,
    KeywordRef,

    Null,
    True,
    False,

    Identifier,
    String,
    Number,

    Assign,
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    Plus,
    Minus,
    Star,
    Slash,
    Increment,
    Decrement,
    Not,

    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,

    CommentSingleLine,
    CommentMultiLine,
}

impl TokenKind {
    /// Tokens that are lexed to keep the maximal-munch scan going but never make it into
    /// the token stream handed to the parser.
    pub fn is_useless(self) -> bool {
        matches!(self, TokenKind::CommentSingleLine | TokenKind::CommentMultiLine)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A single token: its kind plus the exact source slice it was lexed from. The slice
/// borrows from the original source text, so a `Token<'src>` can never outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, lexeme: &'src str) -> Self {
        Self { kind, lexeme }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.lexeme)
    }
}
