//! The host standard library: `CoreObject`/`CoreFunction` protocols plus the minimal
//! catalog (`println`, `print`, `len`) needed to run the end-to-end scenarios. Installed as
//! lvalues in the bottom scope block so ordinary identifier lookup finds them with no
//! special-casing in the evaluator.
use std::rc::Rc;

use crate::eval::scope::ScopeStack;
use crate::eval::{Evaluator, RuntimeError, RuntimeResult};
use crate::value::{Slot, Value};

/// A host-provided object exposing named members as lvalue references.
pub trait CoreObject {
    fn get_member(&self, name: &str) -> Option<Slot>;
}

/// A host-provided function. Arguments are drained from the evaluator's argument queue via
/// `pop_function_argument`; a result (if any) is published with `push`.
pub trait CoreFunction {
    fn call(&self, vm: &mut Evaluator<'_>) -> RuntimeResult<()>;
}

struct Println;

impl CoreFunction for Println {
    fn call(&self, vm: &mut Evaluator<'_>) -> RuntimeResult<()> {
        let arg = vm.pop_function_argument()?.deref();
        let text = arg.format_for_output().ok_or(RuntimeError::UnsupportedOperation(
            "println's argument has no defined stringification".into(),
        ))?;
        writeln!(vm.output(), "{text}").map_err(|e| RuntimeError::UnsupportedOperation(e.to_string()))?;
        vm.push(Value::Null);
        Ok(())
    }
}

struct Print;

impl CoreFunction for Print {
    fn call(&self, vm: &mut Evaluator<'_>) -> RuntimeResult<()> {
        let arg = vm.pop_function_argument()?.deref();
        let text = arg.format_for_output().ok_or(RuntimeError::UnsupportedOperation(
            "print's argument has no defined stringification".into(),
        ))?;
        write!(vm.output(), "{text}").map_err(|e| RuntimeError::UnsupportedOperation(e.to_string()))?;
        vm.push(Value::Null);
        Ok(())
    }
}

struct Len;

impl CoreFunction for Len {
    fn call(&self, vm: &mut Evaluator<'_>) -> RuntimeResult<()> {
        let arg = vm.pop_function_argument()?.deref();
        match arg {
            Value::Str(s) => {
                vm.push(Value::Number(s.len() as f64));
                Ok(())
            }
            _ => Err(RuntimeError::UnsupportedOperation("len is only defined for strings".into())),
        }
    }
}

/// Installs the host catalog into the bottom block, before any user bytecode runs.
pub fn install_stdlib(scopes: &mut ScopeStack<'_>) {
    let install = |scopes: &mut ScopeStack<'_>, name: &'static str, function: Rc<dyn CoreFunction>| {
        scopes
            .declare_with(name, Value::CoreFunction(function))
            .expect("host library names never collide with each other");
    };

    install(scopes, "println", Rc::new(Println));
    install(scopes, "print", Rc::new(Print));
    install(scopes, "len", Rc::new(Len));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::translators::translate_program;
    use crate::earley::recognize;
    use crate::lexer::lex;

    #[test]
    fn len_counts_utf8_bytes_of_a_string() {
        let tokens = lex(r#"println(len("hi"));"#).unwrap();
        let sets = recognize(&tokens).unwrap();
        let ast = crate::ast::build(&tokens, &sets).unwrap();
        let bytecode = translate_program(&ast).unwrap();
        let mut output = Vec::new();
        {
            let mut evaluator = Evaluator::new(bytecode, Box::new(&mut output));
            evaluator.run().unwrap();
        }
        assert_eq!(String::from_utf8(output).unwrap(), "2\n");
    }
}
