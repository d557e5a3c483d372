//! The stack-based tree-walking evaluator (the VM).
//!
//! Bytecode is read linearly from a program counter; non-opcode items push themselves onto
//! the work stack (or the pointer stack, for addresses); opcodes pop their operands off
//! those stacks and the argument queue. See the main dispatch loop in [`Evaluator::run`].
pub mod scope;

use std::collections::VecDeque;
use std::fmt::{self, Display};
use std::io::Write;

use log::{debug, trace};

use crate::bytecode::{ByteCodeItem, OpCode};
use crate::stdlib::install_stdlib;
use crate::value::{self, Slot, Symbol, Value};
use scope::ScopeStack;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    LookupNotFound(String),
    DuplicateDeclaration(String),
    PoppedHostBlock,
    ArgumentQueueEmpty,
    WorkStackUnderflow,
    PointerStackUnderflow,
    AssignToRvalue,
    ReferenceToRvalue,
    NotTruthy,
    NotCallable,
    NotAnObject,
    MemberNotFound(String),
    UnsupportedOperation(String),
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::LookupNotFound(name) => write!(f, "identifier `{name}` not found in any visible scope"),
            RuntimeError::DuplicateDeclaration(name) => write!(f, "`{name}` is already declared in this block"),
            RuntimeError::PoppedHostBlock => write!(f, "cannot pop the host scope block"),
            RuntimeError::ArgumentQueueEmpty => write!(f, "POPARG on an empty argument queue"),
            RuntimeError::WorkStackUnderflow => write!(f, "work stack underflow"),
            RuntimeError::PointerStackUnderflow => write!(f, "pointer stack underflow"),
            RuntimeError::AssignToRvalue => write!(f, "cannot assign to an rvalue"),
            RuntimeError::ReferenceToRvalue => write!(f, "cannot create a reference to an rvalue"),
            RuntimeError::NotTruthy => write!(f, "value has no defined truthiness"),
            RuntimeError::NotCallable => write!(f, "value is not callable"),
            RuntimeError::NotAnObject => write!(f, "value is not a core object"),
            RuntimeError::MemberNotFound(name) => write!(f, "member `{name}` not found"),
            RuntimeError::UnsupportedOperation(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<value::OpError> for RuntimeError {
    fn from(err: value::OpError) -> Self {
        RuntimeError::UnsupportedOperation(err.to_string())
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// One entry of the work stack: either an as-yet-unresolved identifier or a value already
/// carrying its lvalue/rvalue category.
#[derive(Clone)]
enum StackItem<'src> {
    Ident(&'src str),
    Sym(Symbol),
}

pub struct Evaluator<'src> {
    bytecode: Vec<ByteCodeItem<'src>>,
    pc: usize,
    work: Vec<StackItem<'src>>,
    pointers: Vec<usize>,
    args: VecDeque<Symbol>,
    scopes: ScopeStack<'src>,
    output: Box<dyn Write + 'src>,
}

impl<'src> Evaluator<'src> {
    pub fn new(bytecode: Vec<ByteCodeItem<'src>>, output: Box<dyn Write + 'src>) -> Self {
        let mut scopes = ScopeStack::new();
        install_stdlib(&mut scopes);
        Self { bytecode, pc: 0, work: Vec::new(), pointers: Vec::new(), args: VecDeque::new(), scopes, output }
    }

    pub fn output(&mut self) -> &mut (dyn Write + 'src) {
        &mut *self.output
    }

    pub fn pop_function_argument(&mut self) -> RuntimeResult<Symbol> {
        self.args.pop_front().ok_or(RuntimeError::ArgumentQueueEmpty)
    }

    pub fn push(&mut self, value: Value) {
        self.work.push(StackItem::Sym(Symbol::Rvalue(value)));
    }

    fn pop_work(&mut self) -> RuntimeResult<StackItem<'src>> {
        self.work.pop().ok_or(RuntimeError::WorkStackUnderflow)
    }

    fn pop_pointer(&mut self) -> RuntimeResult<usize> {
        self.pointers.pop().ok_or(RuntimeError::PointerStackUnderflow)
    }

    fn resolve_symbol(&self, item: StackItem<'src>) -> RuntimeResult<Symbol> {
        match item {
            StackItem::Sym(symbol) => Ok(symbol),
            StackItem::Ident(name) => {
                let slot = self.scopes.find(name).ok_or_else(|| RuntimeError::LookupNotFound(name.to_string()))?;
                Ok(Symbol::from_slot(slot))
            }
        }
    }

    fn pop_symbol(&mut self) -> RuntimeResult<Symbol> {
        let item = self.pop_work()?;
        self.resolve_symbol(item)
    }

    fn pop_value(&mut self) -> RuntimeResult<Value> {
        Ok(self.pop_symbol()?.deref())
    }

    fn pop_lvalue_slot(&mut self) -> RuntimeResult<Slot> {
        self.pop_symbol()?.as_lvalue_slot().ok_or(RuntimeError::AssignToRvalue)
    }

    fn pop_name(&mut self) -> RuntimeResult<&'src str> {
        match self.pop_work()? {
            StackItem::Ident(name) => Ok(name),
            StackItem::Sym(_) => Err(RuntimeError::UnsupportedOperation("expected an identifier on the work stack".into())),
        }
    }

    /// Runs the bytecode to completion (a `RET` with an empty pointer stack ends the
    /// program, matching the convention that the top-level script ends right after its last
    /// statement).
    pub fn run(&mut self) -> RuntimeResult<()> {
        debug!("starting evaluation of {} bytecode items", self.bytecode.len());
        while self.pc < self.bytecode.len() {
            let item = self.bytecode[self.pc].clone();
            trace!("pc={} {item}", self.pc);

            let op = match item {
                ByteCodeItem::Op(op) => op,
                ByteCodeItem::Null => {
                    self.work.push(StackItem::Sym(Symbol::Rvalue(Value::Null)));
                    self.pc += 1;
                    continue;
                }
                ByteCodeItem::Bool(b) => {
                    self.work.push(StackItem::Sym(Symbol::Rvalue(Value::Bool(b))));
                    self.pc += 1;
                    continue;
                }
                ByteCodeItem::Number(n) => {
                    self.work.push(StackItem::Sym(Symbol::Rvalue(Value::Number(n))));
                    self.pc += 1;
                    continue;
                }
                ByteCodeItem::Str(s) => {
                    self.work.push(StackItem::Sym(Symbol::Rvalue(Value::Str(s))));
                    self.pc += 1;
                    continue;
                }
                ByteCodeItem::Ident(name) => {
                    self.work.push(StackItem::Ident(name));
                    self.pc += 1;
                    continue;
                }
                ByteCodeItem::Address(addr) => {
                    self.pointers.push(addr);
                    self.pc += 1;
                    continue;
                }
            };

            if self.dispatch(op)? {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Returns `Ok(true)` when the program should stop (a top-level `RET` with nothing left
    /// to return to).
    fn dispatch(&mut self, op: OpCode) -> RuntimeResult<bool> {
        match op {
            OpCode::DeclVar => {
                let name = self.pop_name()?;
                self.scopes.declare(name)?;
                self.pc += 1;
            }
            OpCode::DeclFun => {
                let name = self.pop_name()?;
                let address = self.pop_pointer()?;
                self.scopes.declare_with(name, Value::ScriptFunction(address))?;
                self.pc += 1;
            }
            OpCode::Assign => {
                let value = self.pop_value()?;
                let target = self.pop_lvalue_slot()?;
                *target.borrow_mut() = value;
                self.pc += 1;
            }
            OpCode::AssignRef => {
                let value_slot = self.pop_symbol()?.as_lvalue_slot().ok_or(RuntimeError::ReferenceToRvalue)?;
                let target = self.pop_lvalue_slot()?;
                *target.borrow_mut() = Value::make_reference(value_slot);
                self.pc += 1;
            }
            OpCode::Deref => {
                let value = self.pop_value()?;
                self.work.push(StackItem::Sym(Symbol::Rvalue(value)));
                self.pc += 1;
            }
            OpCode::StructRef => {
                let member_name = self.pop_name()?;
                let object = self.pop_value()?;
                let Value::CoreObject(object) = object else {
                    return Err(RuntimeError::NotAnObject);
                };
                let slot = object.get_member(member_name).ok_or_else(|| RuntimeError::MemberNotFound(member_name.to_string()))?;
                self.work.push(StackItem::Sym(Symbol::from_slot(slot)));
                self.pc += 1;
            }
            OpCode::Pop => {
                self.work.pop();
                self.pc += 1;
            }
            OpCode::Not => {
                let v = self.pop_value()?;
                self.work.push(StackItem::Sym(Symbol::Rvalue(value::not(&v)?)));
                self.pc += 1;
            }
            OpCode::Unm => {
                let v = self.pop_value()?;
                self.work.push(StackItem::Sym(Symbol::Rvalue(value::unm(&v)?)));
                self.pc += 1;
            }
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::And | OpCode::Or | OpCode::Eq
            | OpCode::Neq | OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge => {
                // Right-to-left popping: the top of stack is the right operand.
                let rhs = self.pop_value()?;
                let lhs = self.pop_value()?;
                let result = match op {
                    OpCode::Add => value::add(&lhs, &rhs)?,
                    OpCode::Sub => value::sub(&lhs, &rhs)?,
                    OpCode::Mul => value::mul(&lhs, &rhs)?,
                    OpCode::Div => value::div(&lhs, &rhs)?,
                    OpCode::And => value::and(&lhs, &rhs)?,
                    OpCode::Or => value::or(&lhs, &rhs)?,
                    OpCode::Eq => value::eq(&lhs, &rhs)?,
                    OpCode::Neq => value::neq(&lhs, &rhs)?,
                    OpCode::Lt => value::lt(&lhs, &rhs)?,
                    OpCode::Le => value::le(&lhs, &rhs)?,
                    OpCode::Gt => value::gt(&lhs, &rhs)?,
                    OpCode::Ge => value::ge(&lhs, &rhs)?,
                    _ => unreachable!(),
                };
                self.work.push(StackItem::Sym(Symbol::Rvalue(result)));
                self.pc += 1;
            }
            OpCode::If => {
                let value = self.pop_value()?;
                let false_addr = self.pop_pointer()?;
                let true_addr = self.pop_pointer()?;
                let truthy = value.is_truthy().ok_or(RuntimeError::NotTruthy)?;
                self.pc = if truthy { true_addr } else { false_addr };
            }
            OpCode::Jmp => {
                self.pc = self.pop_pointer()?;
            }
            OpCode::Call => {
                let callee = self.pop_value()?;
                match callee {
                    Value::ScriptFunction(address) => {
                        self.pointers.push(self.pc + 1);
                        self.pc = address;
                    }
                    Value::CoreFunction(function) => {
                        function.call(self)?;
                        self.args.clear();
                        self.pc += 1;
                    }
                    _ => return Err(RuntimeError::NotCallable),
                }
            }
            OpCode::Ret => {
                self.args.clear();
                match self.pointers.pop() {
                    Some(address) => self.pc = address,
                    None => return Ok(true),
                }
            }
            OpCode::PushArg => {
                let item = self.pop_work()?;
                let arg = match item {
                    StackItem::Ident(name) => {
                        let slot = self.scopes.find(name).ok_or_else(|| RuntimeError::LookupNotFound(name.to_string()))?;
                        Symbol::from_slot(slot)
                    }
                    StackItem::Sym(symbol @ Symbol::Lvalue(_)) => symbol,
                    StackItem::Sym(rvalue) => rvalue,
                };
                self.args.push_back(arg);
                self.pc += 1;
            }
            OpCode::PopArg => {
                let arg = self.pop_function_argument()?;
                self.work.push(StackItem::Sym(arg));
                self.pc += 1;
            }
            OpCode::DefBlock => {
                self.scopes.push_block();
                self.pc += 1;
            }
            OpCode::DelBlock => {
                self.scopes.pop_block()?;
                self.pc += 1;
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::bytecode::translators::translate_program;
    use crate::earley::recognize;
    use crate::lexer::lex;

    fn run_source(source: &str) -> String {
        let tokens = lex(source).unwrap();
        let sets = recognize(&tokens).unwrap();
        let ast = build(&tokens, &sets).unwrap();
        let bytecode = translate_program(&ast).unwrap();
        let mut output = Vec::new();
        {
            let mut evaluator = Evaluator::new(bytecode, Box::new(&mut output));
            evaluator.run().unwrap();
        }
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run_source("let x = 2 + 3 * 4; println(x);"), "14\n");
    }

    #[test]
    fn while_loop_counts_down() {
        assert_eq!(run_source("let x = 10; while (x > 0) { x = x - 1; } println(x);"), "0\n");
    }

    #[test]
    fn function_call_returns_a_value() {
        assert_eq!(
            run_source("function add(a, b) { return a + b; } println(add(2, 40));"),
            "42\n"
        );
    }

    #[test]
    fn ref_parameters_mutate_the_caller_variables() {
        let out = run_source(
            "function swap(ref a, ref b) { let t = a; a = b; b = t; } \
             let x = 1; let y = 2; swap(x, y); println(x); println(y);",
        );
        assert_eq!(out, "2\n1\n");
    }

    #[test]
    fn null_equals_null_in_a_condition() {
        assert_eq!(
            run_source(r#"if (null == null) { println("yes"); } else { println("no"); }"#),
            "yes\n"
        );
    }

    #[test]
    fn number_concatenated_onto_a_string_uses_six_fractional_digits() {
        assert_eq!(run_source(r#"let s = "n=" + 7; println(s);"#), "n=7.000000\n");
    }
}
