use std::cell::RefCell;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use crate::parser::prelude::{ClassBody, Identifier, Sequence};

use super::environment::Environment;

pub const TRUE: Value = Value::Bool(true);
pub const FALSE: Value = Value::Bool(false);

#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Int(i64),
    Bool(bool),
    Char(char),
    /// Texts are arrays of characters; an all-char array prints as text.
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<FunctionValue>),
    Object(Rc<ObjectValue>),
    Builtin(&'static str),
}

/// A closure: the function template cloned at evaluation time, paired with
/// the environment that was live where the `fn` expression ran. The capture
/// is by reference; every closure over the same scope sees the same
/// bindings.
pub struct FunctionValue {
    pub name: Option<String>,
    pub parameters: Vec<Identifier>,
    pub body: Sequence,
    pub captured: Rc<RefCell<Environment>>,
}

impl Debug for FunctionValue {
    // the captured environment can point back at this closure
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// An object: the class body it was built from (kept for member order in
/// printing) plus the environment its bindings were evaluated into.
pub struct ObjectValue {
    pub template: ClassBody,
    pub env: Rc<RefCell<Environment>>,
}

impl Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = self.template.bindings.iter()
            .map(|binding| binding.name.name.clone())
            .collect::<Vec<String>>();

        f.debug_struct("ObjectValue")
            .field("members", &members)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Void,
    Int,
    Bool,
    Char,
    Array,
    Function,
    Object,
    Builtin,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Void => "void",
            ValueKind::Int => "an int",
            ValueKind::Bool => "a bool",
            ValueKind::Char => "a char",
            ValueKind::Array => "an array",
            ValueKind::Function => "a function",
            ValueKind::Object => "an object",
            ValueKind::Builtin => "a builtin",
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Void => ValueKind::Void,
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::Char(_) => ValueKind::Char,
            Value::Array(_) => ValueKind::Array,
            Value::Function(_) => ValueKind::Function,
            Value::Object(_) => ValueKind::Object,
            Value::Builtin(_) => ValueKind::Builtin,
        }
    }

    pub fn text(value: &str) -> Value {
        Value::Array(Rc::new(RefCell::new(
            value.chars().map(Value::Char).collect()
        )))
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    /// Equality is structural: two values are equal when their canonical
    /// printed forms are.
    pub fn structural_eq(&self, other: &Value) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Char(value) => write!(f, "{value}"),
            Value::Array(elements) => {
                let elements = elements.borrow();

                let as_text = !elements.is_empty() && elements.iter()
                    .all(|element| matches!(element, Value::Char(_)));

                if as_text {
                    for element in elements.iter() {
                        write!(f, "{element}")?;
                    }
                    return Ok(());
                }

                let rendered = elements.iter()
                    .map(|element| format!("{element}"))
                    .collect::<Vec<String>>();

                write!(f, "[{}]", rendered.join(", "))
            },
            Value::Function(function) => {
                let name = function.name.as_deref().unwrap_or("anonymous");
                let parameters = function.parameters.iter()
                    .map(|parameter| parameter.name.clone())
                    .collect::<Vec<String>>();

                write!(f, "fn {name}({})", parameters.join(", "))
            },
            Value::Object(object) => {
                let members = object.template.bindings.iter()
                    .map(|binding| {
                        let name = &binding.name.name;
                        match object.env.borrow().get_local(name) {
                            Some(value) => format!("{name}: {value}"),
                            None => format!("{name}: void"),
                        }
                    })
                    .collect::<Vec<String>>();

                write!(f, "{{{}}}", members.join(", "))
            },
            Value::Builtin(name) => write!(f, "builtin {name}"),
        }
    }
}
