//! Bytecode items and the deferred command buffer that resolves them to final addresses.
pub mod command_buffer;
pub mod translators;

use std::fmt::{self, Display};

/// The fixed opcode catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    DeclVar,
    DeclFun,
    Assign,
    AssignRef,
    Deref,
    StructRef,
    Pop,
    Not,
    Unm,
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    If,
    Jmp,
    Call,
    Ret,
    PushArg,
    PopArg,
    DefBlock,
    DelBlock,
}

/// One element of the final, flat bytecode stream. Opcodes consume their operands from
/// items pushed immediately before them on the VM's work/pointer stacks; everything else is
/// itself a pushable operand.
#[derive(Debug, Clone)]
pub enum ByteCodeItem<'src> {
    Op(OpCode),
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(&'src str),
    Address(usize),
}

impl Display for ByteCodeItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteCodeItem::Op(op) => write!(f, "{op:?}"),
            ByteCodeItem::Null => write!(f, "null"),
            ByteCodeItem::Bool(b) => write!(f, "{b}"),
            ByteCodeItem::Number(n) => write!(f, "{n}"),
            ByteCodeItem::Str(s) => write!(f, "{s:?}"),
            ByteCodeItem::Ident(i) => write!(f, "{i}"),
            ByteCodeItem::Address(a) => write!(f, "@{a}"),
        }
    }
}
