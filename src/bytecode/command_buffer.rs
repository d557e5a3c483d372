//! The deferred command buffer: translators append *commands*, not bytecode, and
//! `generate()` resolves the whole thing to a flat bytecode stream in three passes.
//!
//! Modeled as a `Vec<Command>` plus a tracked insertion cursor rather than an intrusive
//! linked list (see DESIGN.md): `Vec::insert` at a cursor gives the same externally
//! observable ordering guarantees — tasks can still insert arbitrarily many commands right
//! after themselves without disturbing anything already emitted — without introducing a
//! hand-rolled list type into an otherwise ordinary-ownership codebase.
use std::collections::HashMap;
use std::fmt::{self, Display};

use super::ByteCodeItem;

type Task<'src> = Box<dyn FnOnce(&mut CommandBuffer<'src>) + 'src>;

enum Command<'src> {
    Task(Task<'src>),
    PositionRequest(usize),
    PositionReply(usize),
    Item(ByteCodeItem<'src>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    UnresolvedPosition(usize),
    BreakOutsideLoop,
    ContinueOutsideLoop,
    MalformedNode(&'static str),
}

impl Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::UnresolvedPosition(ix) => write!(f, "position index {ix} was never replied to"),
            TranslationError::BreakOutsideLoop => write!(f, "`break` used outside of a loop"),
            TranslationError::ContinueOutsideLoop => write!(f, "`continue` used outside of a loop"),
            TranslationError::MalformedNode(what) => write!(f, "malformed syntax tree: {what}"),
        }
    }
}

impl std::error::Error for TranslationError {}

pub type TranslationResult<T> = Result<T, TranslationError>;

struct LoopBounds {
    start: usize,
    end: usize,
    scope_depth: usize,
}

pub struct CommandBuffer<'src> {
    commands: Vec<Command<'src>>,
    cursor: usize,
    next_position_index: usize,
    loop_stack: Vec<LoopBounds>,
    scope_depth: usize,
}

impl<'src> CommandBuffer<'src> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            cursor: 0,
            next_position_index: 0,
            loop_stack: Vec::new(),
            scope_depth: 0,
        }
    }

    fn insert(&mut self, command: Command<'src>) {
        self.commands.insert(self.cursor, command);
        self.cursor += 1;
    }

    pub fn push(&mut self, item: ByteCodeItem<'src>) {
        self.insert(Command::Item(item));
    }

    /// Defers `f` until pass 1 reaches this point in the stream; `f` may itself call any
    /// `CommandBuffer` method, inserting further commands right after itself.
    pub fn task(&mut self, f: impl FnOnce(&mut CommandBuffer<'src>) + 'src) {
        self.insert(Command::Task(Box::new(f)));
    }

    pub fn create_position_index(&mut self) -> usize {
        let index = self.next_position_index;
        self.next_position_index += 1;
        index
    }

    pub fn request_position(&mut self, index: usize) {
        self.insert(Command::PositionRequest(index));
    }

    pub fn reply_position(&mut self, index: usize) {
        self.insert(Command::PositionReply(index));
    }

    pub fn enter_block(&mut self) {
        self.scope_depth += 1;
    }

    pub fn leave_block(&mut self) {
        self.scope_depth = self.scope_depth.saturating_sub(1);
    }

    pub fn scope_depth(&self) -> usize {
        self.scope_depth
    }

    pub fn push_loop_bounds(&mut self, start: usize, end: usize) {
        self.loop_stack.push(LoopBounds { start, end, scope_depth: self.scope_depth });
    }

    pub fn pop_loop_bounds(&mut self) {
        self.loop_stack.pop();
    }

    pub fn loop_start_index(&self) -> TranslationResult<usize> {
        self.loop_stack.last().map(|b| b.start).ok_or(TranslationError::ContinueOutsideLoop)
    }

    pub fn loop_end_index(&self) -> TranslationResult<usize> {
        self.loop_stack.last().map(|b| b.end).ok_or(TranslationError::BreakOutsideLoop)
    }

    /// Scope depth at the moment the innermost loop's bounds were pushed; `break`/
    /// `continue` emit one `DELBLOCK` per block entered since then.
    pub fn loop_scope_depth(&self) -> TranslationResult<usize> {
        self.loop_stack.last().map(|b| b.scope_depth).ok_or(TranslationError::BreakOutsideLoop)
    }

    pub fn in_loop(&self) -> bool {
        !self.loop_stack.is_empty()
    }

    /// Runs all three passes and returns the finished bytecode stream.
    pub fn generate(mut self) -> TranslationResult<Vec<ByteCodeItem<'src>>> {
        self.expand();
        let positions = self.resolve_positions();
        self.materialize(&positions)
    }

    fn expand(&mut self) {
        let mut i = 0;
        while i < self.commands.len() {
            if matches!(self.commands[i], Command::Task(_)) {
                let task = match self.commands.remove(i) {
                    Command::Task(f) => f,
                    _ => unreachable!(),
                };
                self.cursor = i;
                task(self);
                // Do not advance `i`: either newly inserted commands now occupy it, or (if
                // none were inserted) the next original command slid into place.
            } else {
                i += 1;
            }
        }
    }

    fn resolve_positions(&mut self) -> HashMap<usize, usize> {
        let mut positions = HashMap::new();
        let mut offset = 0usize;
        let mut kept = Vec::with_capacity(self.commands.len());

        for command in self.commands.drain(..) {
            match command {
                Command::PositionReply(index) => {
                    positions.insert(index, offset);
                }
                other => {
                    offset += 1;
                    kept.push(other);
                }
            }
        }

        self.commands = kept;
        positions
    }

    fn materialize(self, positions: &HashMap<usize, usize>) -> TranslationResult<Vec<ByteCodeItem<'src>>> {
        let mut out = Vec::with_capacity(self.commands.len());
        for command in self.commands {
            match command {
                Command::Item(item) => out.push(item),
                Command::PositionRequest(index) => {
                    let address = positions
                        .get(&index)
                        .copied()
                        .ok_or(TranslationError::UnresolvedPosition(index))?;
                    out.push(ByteCodeItem::Address(address));
                }
                Command::Task(_) | Command::PositionReply(_) => {
                    unreachable!("expand() and resolve_positions() remove these variants")
                }
            }
        }
        Ok(out)
    }
}

impl Default for CommandBuffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;

    #[test]
    fn position_request_resolves_to_the_replied_offset() {
        let mut buf = CommandBuffer::new();
        let ix = buf.create_position_index();
        buf.push(ByteCodeItem::Op(OpCode::Jmp));
        buf.request_position(ix);
        buf.push(ByteCodeItem::Op(OpCode::Pop));
        buf.reply_position(ix);
        buf.push(ByteCodeItem::Op(OpCode::Ret));

        let code = buf.generate().unwrap();
        match &code[1] {
            ByteCodeItem::Address(addr) => assert_eq!(*addr, 2),
            other => panic!("expected an address, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_position_is_a_translation_error() {
        let mut buf = CommandBuffer::new();
        let ix = buf.create_position_index();
        buf.request_position(ix);
        assert_eq!(buf.generate().unwrap_err(), TranslationError::UnresolvedPosition(ix));
    }

    #[test]
    fn tasks_expand_in_emission_order() {
        let mut buf = CommandBuffer::new();
        buf.task(|b| {
            b.push(ByteCodeItem::Op(OpCode::Pop));
            b.task(|b| b.push(ByteCodeItem::Op(OpCode::Ret)));
        });
        buf.push(ByteCodeItem::Op(OpCode::Not));

        let code = buf.generate().unwrap();
        let ops: Vec<_> = code
            .iter()
            .map(|item| match item {
                ByteCodeItem::Op(op) => *op,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ops, vec![OpCode::Pop, OpCode::Ret, OpCode::Not]);
    }
}
