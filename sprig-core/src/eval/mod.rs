pub mod builtins;
pub mod error;

#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::{
    environment::prelude::{Environment, FunctionValue, ObjectValue, Value},
    parser::prelude::{
        parse_module, ClassBody, DeclarationKind, Expression, Identifier, Module,
    },
    utils::prelude::{RuntimeWarningEmitter, SrcSpan},
};

use error::{CallFrame, RuntimeError, RuntimeErrorType, RuntimeWarning, Unwind};

/// Outcome of one evaluation step. Early exits travel here instead of in
/// hidden interpreter state: sequences and loops short-circuit on anything
/// that is not `Value`, and the frame that understands the signal consumes
/// it.
#[derive(Debug, Clone)]
pub enum Control {
    Value(Value),
    Returning(Value),
    Breaking,
    Continuing,
}

type EvalResult = Result<Control, Unwind>;

/// Pulls a plain value out of a step, propagating any early-exit signal to
/// the caller unchanged.
macro_rules! value_of {
    ($control:expr) => {
        match $control {
            Control::Value(value) => value,
            other => return Ok(other),
        }
    };
}

/// Resolves `import` paths to source text. The console front end supplies a
/// filesystem loader; embedders can refuse imports entirely.
pub trait ImportLoader {
    fn load(&self, path: &str) -> Result<String, String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullImportLoader;

impl ImportLoader for NullImportLoader {
    fn load(&self, _path: &str) -> Result<String, String> {
        Err("imports are not available in this context".to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FsImportLoader {
    pub root: PathBuf,
}

impl ImportLoader for FsImportLoader {
    fn load(&self, path: &str) -> Result<String, String> {
        std::fs::read_to_string(self.root.join(path)).map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Evaluated {
    pub value: Value,
    /// Everything `print` wrote, in order.
    pub output: String,
}

pub struct Interpreter<'a> {
    warnings: &'a RuntimeWarningEmitter,
    loader: &'a dyn ImportLoader,
    frames: Vec<CallFrame>,
    output: String,
}

/// Evaluate a parsed module against an environment, usually the one from
/// `builtins::global_environment()`. This is the single boundary that turns
/// an unwinding fault into a reportable `RuntimeError`.
pub fn eval_module(
    module: &Module,
    env: &Rc<RefCell<Environment>>,
    warnings: &RuntimeWarningEmitter,
    loader: &dyn ImportLoader,
) -> Result<Evaluated, RuntimeError> {
    let mut interpreter = Interpreter {
        warnings,
        loader,
        frames: vec![],
        output: String::new(),
    };

    match interpreter.run_program(&module.program.statements, env) {
        Ok(value) => Ok(Evaluated { value, output: interpreter.output }),
        Err(unwind) => Err(unwind.into_runtime_error()),
    }
}

impl<'a> Interpreter<'a> {
    /// The host consumes the final statement's value as the program result;
    /// every earlier statement falls under the unconsumed-value rule.
    fn run_program(
        &mut self,
        statements: &[Expression],
        env: &Rc<RefCell<Environment>>,
    ) -> Result<Value, Unwind> {
        let mut result = Value::Void;

        for (index, statement) in statements.iter().enumerate() {
            match self.eval(statement, env)? {
                Control::Value(value) => {
                    if index + 1 == statements.len() {
                        result = value;
                    } else {
                        self.discard(statement, value)?;
                    }
                },
                Control::Returning(value) => {
                    result = value;
                    break;
                },
                Control::Breaking | Control::Continuing => break,
            }
        }

        Ok(result)
    }

    fn eval(&mut self, expression: &Expression, env: &Rc<RefCell<Environment>>) -> EvalResult {
        match expression {
            Expression::Int { value, .. } => Ok(Control::Value(Value::Int(*value))),
            Expression::Bool { value, .. } => Ok(Control::Value(Value::Bool(*value))),
            Expression::CharLit { value, .. } => Ok(Control::Value(Value::Char(*value))),
            Expression::TextLit { value, .. } => Ok(Control::Value(Value::text(value))),

            Expression::Identifier(identifier) => {
                match env.borrow().get(&identifier.name) {
                    Some(value) => Ok(Control::Value(value)),
                    None => Err(self.fault(
                        RuntimeErrorType::NotDeclared { name: identifier.name.clone() },
                        identifier.location
                    )),
                }
            },

            Expression::Array(array) => {
                let mut elements = Vec::with_capacity(array.elements.len());

                for element in &array.elements {
                    elements.push(value_of!(self.eval(element, env)?));
                }

                Ok(Control::Value(Value::array(elements)))
            },

            // The template is cloned and paired with the live environment,
            // exactly once, here.
            Expression::Function(function) => {
                Ok(Control::Value(Value::Function(Rc::new(FunctionValue {
                    name: function.name.clone(),
                    parameters: function.parameters.clone(),
                    body: function.body.clone(),
                    captured: Rc::clone(env),
                }))))
            },

            Expression::Declaration(declaration) => {
                let value = value_of!(self.eval(&declaration.value, env)?);
                let immutable = declaration.kind == DeclarationKind::Let;

                if !env.borrow_mut().declare(&declaration.name.name, value, immutable) {
                    return Err(self.fault(
                        RuntimeErrorType::AlreadyDeclared { name: declaration.name.name.clone() },
                        declaration.name.location
                    ));
                }

                Ok(Control::Value(Value::Void))
            },

            Expression::Assignment(assignment) => {
                let value = value_of!(self.eval(&assignment.value, env)?);

                match &assignment.target {
                    Expression::Identifier(identifier) => {
                        self.assign_in(env, identifier, value)?;
                    },
                    Expression::MemberAccess(access) => {
                        let container = value_of!(self.eval(&access.container, env)?);

                        let Value::Object(object) = container else {
                            return Err(self.fault(
                                RuntimeErrorType::ObjectRequired { got: container.kind().as_str() },
                                access.container.location()
                            ));
                        };

                        self.assign_in(&object.env, &access.member, value)?;
                    },
                    // the parser rejects these, but the fault is part of the
                    // evaluator's contract
                    other => {
                        return Err(self.fault(
                            RuntimeErrorType::ObjectRequired { got: "not an assignable target" },
                            other.location()
                        ));
                    }
                }

                Ok(Control::Value(Value::Void))
            },

            Expression::Conditional(conditional) => {
                let condition = value_of!(self.eval(&conditional.condition, env)?);

                let Value::Bool(condition) = condition else {
                    return Err(self.fault(
                        RuntimeErrorType::ConditionRequiresBool { got: condition.kind().as_str() },
                        conditional.condition.location()
                    ));
                };

                let scope = Environment::with_parent(Rc::clone(env));

                if condition {
                    self.eval(&conditional.consequence, &scope)
                } else {
                    match &conditional.alternative {
                        Some(alternative) => self.eval(alternative, &scope),
                        None => Ok(Control::Value(Value::Void)),
                    }
                }
            },

            // One persistent scope for the whole loop; iterations see each
            // other's bindings.
            Expression::Loop(loop_) => {
                let scope = Environment::with_parent(Rc::clone(env));

                'iteration: loop {
                    for statement in &loop_.body.statements {
                        match self.eval(statement, &scope)? {
                            Control::Value(value) => self.discard(statement, value)?,
                            Control::Breaking => break 'iteration,
                            Control::Continuing => continue 'iteration,
                            returning @ Control::Returning(_) => return Ok(returning),
                        }
                    }
                }

                Ok(Control::Value(Value::Void))
            },

            Expression::Break { .. } => Ok(Control::Breaking),
            Expression::Continue { .. } => Ok(Control::Continuing),

            Expression::Return(return_) => {
                let value = match &return_.value {
                    Some(expression) => value_of!(self.eval(expression, env)?),
                    None => Value::Void,
                };

                Ok(Control::Returning(value))
            },

            Expression::Apply(apply) => self.eval_apply(apply, env),

            Expression::MemberAccess(access) => {
                let container = value_of!(self.eval(&access.container, env)?);

                let Value::Object(object) = container else {
                    return Err(self.fault(
                        RuntimeErrorType::ObjectRequired { got: container.kind().as_str() },
                        access.container.location()
                    ));
                };

                let member = object.env.borrow().get(&access.member.name);

                match member {
                    Some(value) => Ok(Control::Value(value)),
                    None => Err(self.fault(
                        RuntimeErrorType::NotDeclared { name: access.member.name.clone() },
                        access.member.location
                    )),
                }
            },

            // Bindings evaluate in order into one fresh scope and see each
            // other as they go.
            Expression::New(new) => {
                let scope = Environment::with_parent(Rc::clone(env));

                for binding in &new.body.bindings {
                    let value = value_of!(self.eval(&binding.value, &scope)?);
                    let immutable = binding.kind == DeclarationKind::Let;

                    scope.borrow_mut().declare_or_replace(&binding.name.name, value, immutable);
                }

                Ok(Control::Value(Value::Object(Rc::new(ObjectValue {
                    template: new.body.clone(),
                    env: scope,
                }))))
            },

            // A module evaluates like a class body over its own fresh scope
            // and is used as an object.
            Expression::Import(import) => {
                let source = match self.loader.load(&import.path) {
                    Ok(source) => source,
                    Err(reason) => {
                        return Err(self.fault(
                            RuntimeErrorType::ImportFailed { path: import.path.clone(), reason },
                            import.location
                        ));
                    }
                };

                let parsed = match parse_module(&source) {
                    Ok(parsed) => parsed,
                    Err(parse_err) => {
                        return Err(self.fault(
                            RuntimeErrorType::ImportFailed {
                                path: import.path.clone(),
                                reason: parse_err.details().0.to_string(),
                            },
                            import.location
                        ));
                    }
                };

                let scope = Environment::with_parent(Rc::clone(env));
                let mut bindings = vec![];

                for statement in &parsed.module.program.statements {
                    match self.eval(statement, &scope)? {
                        Control::Value(value) => self.discard(statement, value)?,
                        _ => break,
                    }

                    if let Expression::Declaration(declaration) = statement {
                        bindings.push((**declaration).clone());
                    }
                }

                let template = ClassBody { bindings, location: import.location };

                Ok(Control::Value(Value::Object(Rc::new(ObjectValue {
                    template,
                    env: scope,
                }))))
            },

            Expression::Throw(throw) => {
                let value = value_of!(self.eval(&throw.value, env)?);

                Err(Unwind::Thrown {
                    value,
                    location: throw.location,
                    frames: self.frames.clone(),
                })
            },

            Expression::Try(try_) => {
                let mut outcome = match self.eval(&try_.body, env) {
                    Err(Unwind::Thrown { value, location, frames }) => match &try_.catch {
                        Some(catch) => {
                            let scope = Environment::with_parent(Rc::clone(env));
                            scope.borrow_mut().declare(&catch.binding.name, value, false);

                            self.eval(&catch.handler, &scope)
                        },
                        None => Err(Unwind::Thrown { value, location, frames }),
                    },
                    other => other,
                };

                if let Some(finally) = &try_.finally {
                    // a signal out of the finalizer wins over the body's
                    match self.eval(finally, env)? {
                        Control::Value(_) => {},
                        other => outcome = Ok(other),
                    }
                }

                outcome
            },

            Expression::Sequence(sequence) => {
                let scope = Environment::with_parent(Rc::clone(env));

                self.eval_statements(&sequence.statements, &scope)
            },

            Expression::Grouped { expression, .. } => self.eval(expression, env),
        }
    }

    /// Statement-by-statement evaluation with the early-exit rule: the
    /// first non-`Value` outcome stops the walk and travels upward. The
    /// sequence itself always yields void.
    fn eval_statements(
        &mut self,
        statements: &[Expression],
        env: &Rc<RefCell<Environment>>,
    ) -> EvalResult {
        for statement in statements {
            match self.eval(statement, env)? {
                Control::Value(value) => self.discard(statement, value)?,
                other => return Ok(other),
            }
        }

        Ok(Control::Value(Value::Void))
    }

    fn eval_apply(&mut self, apply: &crate::parser::prelude::Apply, env: &Rc<RefCell<Environment>>) -> EvalResult {
        let callee = value_of!(self.eval(&apply.function, env)?);

        let mut arguments = Vec::with_capacity(apply.arguments.len());
        for argument in &apply.arguments {
            arguments.push(value_of!(self.eval(argument, env)?));
        }

        match callee {
            Value::Builtin(name) => {
                self.frames.push(CallFrame {
                    name: name.to_string(),
                    location: Some(apply.location),
                });

                let result = builtins::apply(self, name, &arguments, apply.location);

                self.frames.pop();
                Ok(Control::Value(result?))
            },
            Value::Function(function) => {
                // parameters get their own scope under the captured one,
                // and the body another under that
                let parameters = Environment::with_parent(Rc::clone(&function.captured));

                for (index, parameter) in function.parameters.iter().enumerate() {
                    // permissive arity: missing arguments bind void, extra
                    // arguments are dropped
                    let value = arguments.get(index).cloned().unwrap_or(Value::Void);

                    if !parameters.borrow_mut().declare(&parameter.name, value, false) {
                        return Err(self.fault(
                            RuntimeErrorType::AlreadyDeclared { name: parameter.name.clone() },
                            parameter.location
                        ));
                    }
                }

                let body_env = Environment::with_parent(parameters);

                self.frames.push(CallFrame {
                    name: function.name.clone().unwrap_or_else(|| "anonymous".to_string()),
                    location: Some(apply.location),
                });

                let result = self.eval_statements(&function.body.statements, &body_env);

                self.frames.pop();

                match result? {
                    Control::Returning(value) => Ok(Control::Value(value)),
                    _ => Ok(Control::Value(Value::Void)),
                }
            },
            other => Err(self.fault(
                RuntimeErrorType::FunctionRequired { got: other.kind().as_str() },
                apply.function.location()
            )),
        }
    }

    fn assign_in(
        &mut self,
        env: &Rc<RefCell<Environment>>,
        identifier: &Identifier,
        value: Value,
    ) -> Result<(), Unwind> {
        let new_kind = value.kind();

        match Environment::assign(env, &identifier.name, value) {
            Some(outcome) => {
                if outcome.reassigned_let {
                    self.warnings.emit(RuntimeWarning::LetReassignment {
                        location: identifier.location,
                        name: identifier.name.clone(),
                    });
                }

                if outcome.previous_kind != new_kind {
                    self.warnings.emit(RuntimeWarning::ValueKindDrift {
                        location: identifier.location,
                        name: identifier.name.clone(),
                        from: outcome.previous_kind.as_str(),
                        to: new_kind.as_str(),
                    });
                }

                Ok(())
            },
            None => Err(self.fault(
                RuntimeErrorType::NotDeclared { name: identifier.name.clone() },
                identifier.location
            )),
        }
    }

    /// Bare statement values: void passes, a discarded call result warns,
    /// anything else is a fault.
    fn discard(&mut self, statement: &Expression, value: Value) -> Result<(), Unwind> {
        match value {
            Value::Void => Ok(()),
            value => match statement {
                Expression::Apply(_) => {
                    self.warnings.emit(RuntimeWarning::DiscardedValue {
                        location: statement.location(),
                    });

                    Ok(())
                },
                _ => Err(self.fault(
                    RuntimeErrorType::UnconsumedValue { got: value.kind().as_str() },
                    statement.location()
                )),
            }
        }
    }

    pub(crate) fn fault(&self, error: RuntimeErrorType, location: SrcSpan) -> Unwind {
        Unwind::Fault(RuntimeError {
            error,
            location,
            frames: self.frames.clone(),
        })
    }

    pub(crate) fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }
}
