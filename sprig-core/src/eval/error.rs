use crate::environment::prelude::Value;
use crate::utils::prelude::SrcSpan;

/// One entry of the call stack: the name the applied function goes by and
/// the call site. Frames without a location are synthetic (no real user
/// code behind them) and are filtered from printed traces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub name: String,
    pub location: Option<SrcSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorType {
    NotDeclared { name: String },
    AlreadyDeclared { name: String },
    ObjectRequired { got: &'static str },
    FunctionRequired { got: &'static str },
    ConditionRequiresBool { got: &'static str },
    /// A bare statement produced a value nothing consumes. Bare
    /// applications only warn; everything else is a fault.
    UnconsumedValue { got: &'static str },
    BuiltinMismatch { name: String, expected: &'static str, got: String },
    IndexOutOfBounds { index: i64, count: usize },
    DivisionByZero,
    Uncaught { value: String },
    ImportFailed { path: String, reason: String },
}

impl RuntimeErrorType {
    pub fn message(&self) -> String {
        match self {
            RuntimeErrorType::NotDeclared { name } => {
                format!("`{name}` is not declared")
            },
            RuntimeErrorType::AlreadyDeclared { name } => {
                format!("`{name}` is already declared in this scope")
            },
            RuntimeErrorType::ObjectRequired { got } => {
                format!("An object is required here, but this is {got}")
            },
            RuntimeErrorType::FunctionRequired { got } => {
                format!("Only functions can be applied, but this is {got}")
            },
            RuntimeErrorType::ConditionRequiresBool { got } => {
                format!("The condition must be a bool, but this is {got}")
            },
            RuntimeErrorType::UnconsumedValue { got } => {
                format!("This statement produces {got} that nothing consumes")
            },
            RuntimeErrorType::BuiltinMismatch { name, expected, got } => {
                format!("The builtin `{name}` expects {expected}, but got {got}")
            },
            RuntimeErrorType::IndexOutOfBounds { index, count } => {
                format!("Index {index} is out of bounds for an array of {count}")
            },
            RuntimeErrorType::DivisionByZero => {
                "Division by zero".to_string()
            },
            RuntimeErrorType::Uncaught { value } => {
                format!("Uncaught exception: {value}")
            },
            RuntimeErrorType::ImportFailed { path, reason } => {
                format!("Import of \"{path}\" failed: {reason}")
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub error: RuntimeErrorType,
    pub location: SrcSpan,
    /// Snapshot of the call stack at the moment the fault was raised,
    /// outermost first.
    pub frames: Vec<CallFrame>,
}

/// What unwinds through the evaluator: an engine fault, or a value the
/// program threw. Thrown values can be caught by `try`; faults cannot.
#[derive(Debug, Clone)]
pub enum Unwind {
    Fault(RuntimeError),
    Thrown {
        value: Value,
        location: SrcSpan,
        frames: Vec<CallFrame>,
    },
}

impl Unwind {
    pub fn into_runtime_error(self) -> RuntimeError {
        match self {
            Unwind::Fault(error) => error,
            Unwind::Thrown { value, location, frames } => RuntimeError {
                error: RuntimeErrorType::Uncaught { value: value.to_string() },
                location,
                frames,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeWarning {
    LetReassignment {
        location: SrcSpan,
        name: String,
    },
    ValueKindDrift {
        location: SrcSpan,
        name: String,
        from: &'static str,
        to: &'static str,
    },
    DiscardedValue {
        location: SrcSpan,
    },
}
