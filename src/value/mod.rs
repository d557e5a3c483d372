//! The runtime value model: tagged values, lvalue/rvalue categories, and the unary/binary/
//! compare operator tables.
//!
//! References point to heap-stable storage realized as `Rc<RefCell<Value>>`, the accepted
//! resolution (recorded in DESIGN.md) of the spec's more abstract "arena of indices"
//! phrasing: `Rc` already gives stable storage across scope push/pop with ordinary
//! ownership, so there is no need for a hand-rolled arena/generation scheme here.
use std::cell::RefCell;
use std::fmt::{self, Display};
use std::rc::Rc;

use crate::stdlib::{CoreFunction, CoreObject};

pub type Slot = Rc<RefCell<Value>>;

/// The tagged payload. `Reference` points at another slot; chains are collapsed to a
/// single hop at construction time (see [`Value::make_reference`]), so a reference's
/// pointee is never itself a `Reference`.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Bytecode address of a user-declared function.
    ScriptFunction(usize),
    CoreObject(Rc<dyn CoreObject>),
    CoreFunction(Rc<dyn CoreFunction>),
    Reference(Slot),
}

impl Value {
    pub fn make_reference(slot: Slot) -> Value {
        let collapsed = {
            let borrowed = slot.borrow();
            if let Value::Reference(inner) = &*borrowed {
                Some(inner.clone())
            } else {
                None
            }
        };
        Value::Reference(collapsed.unwrap_or(slot))
    }

    pub fn is_truthy(&self) -> Option<bool> {
        match self {
            Value::Null => Some(false),
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Stringifies per the §4.8 rule used when a number is concatenated onto a string with
    /// `+`: null -> "Null", bool -> "True"/"False", number -> six fractional digits,
    /// string -> itself. Every other kind has no defined stringification and returns
    /// `None`. This is deliberately not what `println`/`print` use — see
    /// [`Value::format_for_output`].
    pub fn stringify(&self) -> Option<String> {
        Some(match self {
            Value::Null => "Null".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Number(n) => format!("{n:.6}"),
            Value::Str(s) => s.clone(),
            _ => return None,
        })
    }

    /// Renders a value the way `println`/`print` display it: same as [`Value::stringify`]
    /// except a number prints in its natural, shortest-decimal form — whole numbers with no
    /// fractional part at all (`14`, not `14.000000`), following `original_source`'s
    /// `FunctionPrint`/`Symbol::print()` rather than the fixed `%f`-style debug dump
    /// `ByteCode.cpp` uses for opcode tracing.
    pub fn format_for_output(&self) -> Option<String> {
        Some(match self {
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 => format!("{n:.0}"),
            Value::Number(n) => n.to_string(),
            other => return other.stringify(),
        })
    }
}

/// A symbol on the VM's work stack: either a value in hand, or a reference to a stored
/// slot, distinguished by category. Only an `Lvalue` can be the target of `ASSIGN`.
#[derive(Clone)]
pub enum Symbol {
    Rvalue(Value),
    Lvalue(Slot),
}

impl Symbol {
    pub fn from_slot(slot: Slot) -> Self {
        Symbol::Lvalue(slot)
    }

    pub fn category(&self) -> ValueCategory {
        match self {
            Symbol::Rvalue(_) => ValueCategory::Rvalue,
            Symbol::Lvalue(_) => ValueCategory::Lvalue,
        }
    }

    /// Dereferences through any `Value::Reference` chain (already collapsed to depth 1,
    /// but following it out of an lvalue slot needs one more hop) and returns a fresh
    /// rvalue copy.
    pub fn deref(&self) -> Value {
        match self {
            Symbol::Rvalue(v) => deref_value(v),
            Symbol::Lvalue(slot) => deref_value(&slot.borrow()),
        }
    }

    pub fn as_lvalue_slot(&self) -> Option<Slot> {
        match self {
            Symbol::Lvalue(slot) => {
                if let Value::Reference(inner) = &*slot.borrow() {
                    return Some(inner.clone());
                }
                Some(slot.clone())
            }
            Symbol::Rvalue(Value::Reference(inner)) => Some(inner.clone()),
            Symbol::Rvalue(_) => None,
        }
    }
}

fn deref_value(value: &Value) -> Value {
    match value {
        Value::Reference(slot) => deref_value(&slot.borrow()),
        other => other.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    Lvalue,
    Rvalue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    UnsupportedUnary,
    UnsupportedBinary,
    UnsupportedCompare,
}

impl Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            OpError::UnsupportedUnary => "unary operator not defined for this value's type",
            OpError::UnsupportedBinary => "binary operator not defined for this combination of types",
            OpError::UnsupportedCompare => "comparison not defined for this combination of types",
        };
        write!(f, "{msg}")
    }
}

impl std::error::Error for OpError {}

pub fn not(v: &Value) -> Result<Value, OpError> {
    match v {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        Value::Number(n) => Ok(Value::Bool(*n == 0.0)),
        _ => Err(OpError::UnsupportedUnary),
    }
}

pub fn unm(v: &Value) -> Result<Value, OpError> {
    v.as_number().map(|n| Value::Number(-n)).ok_or(OpError::UnsupportedUnary)
}

pub fn add(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    if matches!(lhs, Value::Str(_)) || matches!(rhs, Value::Str(_)) {
        let left = lhs.stringify().ok_or(OpError::UnsupportedBinary)?;
        let right = rhs.stringify().ok_or(OpError::UnsupportedBinary)?;
        return Ok(Value::Str(left + &right));
    }
    numeric_binary(lhs, rhs, |a, b| a + b)
}

pub fn sub(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    numeric_binary(lhs, rhs, |a, b| a - b)
}

pub fn mul(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    numeric_binary(lhs, rhs, |a, b| a * b)
}

pub fn div(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    numeric_binary(lhs, rhs, |a, b| a / b)
}

fn numeric_binary(lhs: &Value, rhs: &Value, op: impl Fn(f64, f64) -> f64) -> Result<Value, OpError> {
    let a = lhs.as_number().ok_or(OpError::UnsupportedBinary)?;
    let b = rhs.as_number().ok_or(OpError::UnsupportedBinary)?;
    Ok(Value::Number(op(a, b)))
}

pub fn and(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    let a = lhs.as_number().ok_or(OpError::UnsupportedBinary)?;
    let b = rhs.as_number().ok_or(OpError::UnsupportedBinary)?;
    Ok(Value::Bool(a != 0.0 && b != 0.0))
}

pub fn or(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    let a = lhs.as_number().ok_or(OpError::UnsupportedBinary)?;
    let b = rhs.as_number().ok_or(OpError::UnsupportedBinary)?;
    Ok(Value::Bool(a != 0.0 || b != 0.0))
}

pub fn eq(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    compare(lhs, rhs, Cmp::Eq)
}

pub fn neq(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    compare(lhs, rhs, Cmp::Neq)
}

pub fn lt(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    compare(lhs, rhs, Cmp::Lt)
}

pub fn le(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    compare(lhs, rhs, Cmp::Le)
}

pub fn gt(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    compare(lhs, rhs, Cmp::Gt)
}

pub fn ge(lhs: &Value, rhs: &Value) -> Result<Value, OpError> {
    compare(lhs, rhs, Cmp::Ge)
}

enum Cmp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

fn compare(lhs: &Value, rhs: &Value, cmp: Cmp) -> Result<Value, OpError> {
    use Cmp::*;

    if matches!(lhs, Value::Null) && matches!(rhs, Value::Null) {
        return Ok(Value::Bool(matches!(cmp, Eq | Le | Ge)));
    }
    if matches!(lhs, Value::Null) ^ matches!(rhs, Value::Null) {
        return match cmp {
            Eq => Ok(Value::Bool(false)),
            Neq => Ok(Value::Bool(true)),
            Lt | Le | Gt | Ge => Err(OpError::UnsupportedCompare),
        };
    }

    if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
        return Ok(Value::Bool(match cmp {
            Eq => a == b,
            Neq => a != b,
            Lt => a < b,
            Le => a <= b,
            Gt => a > b,
            Ge => a >= b,
        }));
    }

    if let (Value::Bool(a), Value::Bool(b)) = (lhs, rhs) {
        if matches!(cmp, Eq | Neq) {
            return Ok(Value::Bool(if matches!(cmp, Eq) { a == b } else { a != b }));
        }
    }

    let a = lhs.as_number().ok_or(OpError::UnsupportedCompare)?;
    let b = rhs.as_number().ok_or(OpError::UnsupportedCompare)?;
    Ok(Value::Bool(match cmp {
        Eq => a == b,
        Neq => a != b,
        Lt => a < b,
        Le => a <= b,
        Gt => a > b,
        Ge => a >= b,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_chains_collapse_to_one_hop() {
        let head = Rc::new(RefCell::new(Value::Number(1.0)));
        let r1 = Value::make_reference(head.clone());
        let r1_slot = Rc::new(RefCell::new(r1));
        let r2 = Value::make_reference(r1_slot);
        match r2 {
            Value::Reference(slot) => assert!(Rc::ptr_eq(&slot, &head)),
            _ => panic!("expected a reference"),
        }
    }

    #[test]
    fn numeric_stringification_uses_six_fractional_digits() {
        assert_eq!(Value::Number(7.0).stringify().unwrap(), "7.000000");
    }

    #[test]
    fn println_formatting_drops_the_fractional_part_for_whole_numbers() {
        assert_eq!(Value::Number(14.0).format_for_output().unwrap(), "14");
        assert_eq!(Value::Number(0.0).format_for_output().unwrap(), "0");
        assert_eq!(Value::Number(2.5).format_for_output().unwrap(), "2.5");
    }

    #[test]
    fn null_equals_null_but_not_less_than() {
        assert!(matches!(eq(&Value::Null, &Value::Null), Ok(Value::Bool(true))));
        assert!(matches!(lt(&Value::Null, &Value::Null), Ok(Value::Bool(false))));
    }

    #[test]
    fn comparing_null_against_a_number_is_a_type_error_except_for_eq_and_neq() {
        assert!(matches!(eq(&Value::Null, &Value::Number(0.0)), Ok(Value::Bool(false))));
        assert!(matches!(neq(&Value::Null, &Value::Number(0.0)), Ok(Value::Bool(true))));
        assert!(matches!(lt(&Value::Null, &Value::Number(0.0)), Err(OpError::UnsupportedCompare)));
        assert!(matches!(le(&Value::Null, &Value::Number(0.0)), Err(OpError::UnsupportedCompare)));
        assert!(matches!(gt(&Value::Number(0.0), &Value::Null), Err(OpError::UnsupportedCompare)));
        assert!(matches!(ge(&Value::Number(0.0), &Value::Null), Err(OpError::UnsupportedCompare)));
    }

    #[test]
    fn add_with_a_string_operand_concatenates_stringified_operands() {
        let result = add(&Value::Str("n=".to_string()), &Value::Number(7.0)).unwrap();
        match result {
            Value::Str(s) => assert_eq!(s, "n=7.000000"),
            _ => panic!("expected a string"),
        }
    }

    #[test]
    fn division_by_zero_follows_ieee754() {
        let result = div(&Value::Number(1.0), &Value::Number(0.0)).unwrap();
        match result {
            Value::Number(n) => assert!(n.is_infinite()),
            _ => panic!("expected a number"),
        }
    }
}
