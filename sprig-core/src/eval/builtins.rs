use std::cell::RefCell;
use std::rc::Rc;

use crate::environment::prelude::{Environment, Value};
use crate::utils::prelude::SrcSpan;

use super::error::{RuntimeErrorType, Unwind};
use super::Interpreter;

/// Everything pre-bound in the root environment. Operator spellings are
/// ordinary names here; infix syntax resolves to them like any identifier.
pub const BUILTINS: &[&str] = &[
    "+", "-", "*", "/",
    "==", "!=",
    "<", "<=", ">", ">=",
    "and", "or",
    "print",
    "cons", "at", "setAt", "count",
];

/// The root environment with the builtin table declared into it, as `let`
/// bindings so accidental shadowing at least warns.
pub fn global_environment() -> Rc<RefCell<Environment>> {
    let mut env = Environment::new();

    for name in BUILTINS {
        env.declare(name, Value::Builtin(name), true);
    }

    Rc::new(RefCell::new(env))
}

pub fn apply(
    interpreter: &mut Interpreter,
    name: &str,
    arguments: &[Value],
    location: SrcSpan,
) -> Result<Value, Unwind> {
    match name {
        "+" => {
            let (a, b) = two_ints(interpreter, name, arguments, location)?;
            Ok(Value::Int(a.wrapping_add(b)))
        },
        "-" => {
            let (a, b) = two_ints(interpreter, name, arguments, location)?;
            Ok(Value::Int(a.wrapping_sub(b)))
        },
        "*" => {
            let (a, b) = two_ints(interpreter, name, arguments, location)?;
            Ok(Value::Int(a.wrapping_mul(b)))
        },
        "/" => {
            let (a, b) = two_ints(interpreter, name, arguments, location)?;

            if b == 0 {
                return Err(interpreter.fault(RuntimeErrorType::DivisionByZero, location));
            }

            Ok(Value::Int(a.wrapping_div(b)))
        },

        "==" | "!=" => {
            let [a, b] = arguments else {
                return Err(mismatch(interpreter, name, "(any, any)", arguments, location));
            };

            let equal = a.structural_eq(b);
            Ok(Value::Bool(if name == "==" { equal } else { !equal }))
        },

        "<" => {
            let (a, b) = two_ints(interpreter, name, arguments, location)?;
            Ok(Value::Bool(a < b))
        },
        "<=" => {
            let (a, b) = two_ints(interpreter, name, arguments, location)?;
            Ok(Value::Bool(a <= b))
        },
        ">" => {
            let (a, b) = two_ints(interpreter, name, arguments, location)?;
            Ok(Value::Bool(a > b))
        },
        ">=" => {
            let (a, b) = two_ints(interpreter, name, arguments, location)?;
            Ok(Value::Bool(a >= b))
        },

        "and" => {
            let (a, b) = two_bools(interpreter, name, arguments, location)?;
            Ok(Value::Bool(a && b))
        },
        "or" => {
            let (a, b) = two_bools(interpreter, name, arguments, location)?;
            Ok(Value::Bool(a || b))
        },

        "print" => {
            let [value] = arguments else {
                return Err(mismatch(interpreter, name, "(any)", arguments, location));
            };

            interpreter.write_output(&format!("{value}\n"));
            Ok(Value::Void)
        },

        "cons" => {
            let [value, Value::Array(elements)] = arguments else {
                return Err(mismatch(interpreter, name, "(any, array)", arguments, location));
            };

            let mut extended = Vec::with_capacity(elements.borrow().len() + 1);
            extended.push(value.clone());
            extended.extend(elements.borrow().iter().cloned());

            Ok(Value::array(extended))
        },
        "at" => {
            let [Value::Array(elements), Value::Int(index)] = arguments else {
                return Err(mismatch(interpreter, name, "(array, int)", arguments, location));
            };

            let elements = elements.borrow();

            match usize::try_from(*index).ok().and_then(|i| elements.get(i)) {
                Some(value) => Ok(value.clone()),
                None => Err(interpreter.fault(
                    RuntimeErrorType::IndexOutOfBounds { index: *index, count: elements.len() },
                    location
                )),
            }
        },
        "setAt" => {
            let [Value::Array(elements), Value::Int(index), value] = arguments else {
                return Err(mismatch(interpreter, name, "(array, int, any)", arguments, location));
            };

            let mut elements = elements.borrow_mut();
            let count = elements.len();

            match usize::try_from(*index).ok().and_then(|i| elements.get_mut(i)) {
                Some(slot) => {
                    *slot = value.clone();
                    Ok(Value::Void)
                },
                None => Err(interpreter.fault(
                    RuntimeErrorType::IndexOutOfBounds { index: *index, count },
                    location
                )),
            }
        },
        "count" => {
            let [Value::Array(elements)] = arguments else {
                return Err(mismatch(interpreter, name, "(array)", arguments, location));
            };

            Ok(Value::Int(elements.borrow().len() as i64))
        },

        other => Err(interpreter.fault(
            RuntimeErrorType::NotDeclared { name: other.to_string() },
            location
        )),
    }
}

fn two_ints(
    interpreter: &Interpreter,
    name: &str,
    arguments: &[Value],
    location: SrcSpan,
) -> Result<(i64, i64), Unwind> {
    match arguments {
        [Value::Int(a), Value::Int(b)] => Ok((*a, *b)),
        _ => Err(mismatch(interpreter, name, "(int, int)", arguments, location)),
    }
}

fn two_bools(
    interpreter: &Interpreter,
    name: &str,
    arguments: &[Value],
    location: SrcSpan,
) -> Result<(bool, bool), Unwind> {
    match arguments {
        [Value::Bool(a), Value::Bool(b)] => Ok((*a, *b)),
        _ => Err(mismatch(interpreter, name, "(bool, bool)", arguments, location)),
    }
}

fn mismatch(
    interpreter: &Interpreter,
    name: &str,
    expected: &'static str,
    arguments: &[Value],
    location: SrcSpan,
) -> Unwind {
    let got = arguments.iter()
        .map(|argument| argument.kind().as_str().to_string())
        .collect::<Vec<String>>()
        .join(", ");

    interpreter.fault(
        RuntimeErrorType::BuiltinMismatch {
            name: name.to_string(),
            expected,
            got: format!("({got})"),
        },
        location
    )
}
