//! The lexical scope chain: an ordered stack of blocks, innermost last. The bottom block is
//! installed once at evaluator construction and hosts the standard library for the life of
//! the run; it can never be popped.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::RuntimeError;
use crate::value::{Slot, Value};

pub struct ScopeStack<'src> {
    blocks: Vec<HashMap<&'src str, Slot>>,
}

impl<'src> ScopeStack<'src> {
    pub fn new() -> Self {
        Self { blocks: vec![HashMap::new()] }
    }

    pub fn push_block(&mut self) {
        self.blocks.push(HashMap::new());
    }

    pub fn pop_block(&mut self) -> Result<(), RuntimeError> {
        if self.blocks.len() <= 1 {
            return Err(RuntimeError::PoppedHostBlock);
        }
        self.blocks.pop();
        Ok(())
    }

    /// Inserts a fresh `null` lvalue for `name` into the innermost block.
    pub fn declare(&mut self, name: &'src str) -> Result<Slot, RuntimeError> {
        let top = self.blocks.last_mut().expect("scope stack is never empty");
        if top.contains_key(name) {
            return Err(RuntimeError::DuplicateDeclaration(name.to_string()));
        }
        let slot = Rc::new(RefCell::new(Value::Null));
        top.insert(name, slot.clone());
        Ok(slot)
    }

    /// Installs `value` directly for `name` in the innermost block, bypassing the
    /// declare-then-assign sequence (used for `DECLFUN` and host-library setup, where the
    /// binding should never observably pass through `null`).
    pub fn declare_with(&mut self, name: &'src str, value: Value) -> Result<(), RuntimeError> {
        let top = self.blocks.last_mut().expect("scope stack is never empty");
        if top.contains_key(name) {
            return Err(RuntimeError::DuplicateDeclaration(name.to_string()));
        }
        top.insert(name, Rc::new(RefCell::new(value)));
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<Slot> {
        self.blocks.iter().rev().find_map(|block| block.get(name).cloned())
    }

    pub fn depth(&self) -> usize {
        self.blocks.len()
    }
}

impl Default for ScopeStack<'_> {
    fn default() -> Self {
        Self::new()
    }
}
