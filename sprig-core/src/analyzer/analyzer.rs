use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{
    eval::builtins::BUILTINS,
    parser::prelude::{Expression, Module},
    utils::prelude::{SrcSpan, TypeWarningEmitter},
};
use super::error::{InferError, Problems, Warning};
use super::spec::{self, SpecRef, TypeSpec};

pub enum Outcome<T, E> {
    Ok(T),
    PartialFailure(T, E)
}

/// Environment of specs instead of values, walked in the same shape the
/// interpreter walks its scope chain.
pub struct SpecEnvironment {
    store: HashMap<String, (SpecRef, SrcSpan)>,
    parent: Option<Rc<RefCell<SpecEnvironment>>>,
}

impl SpecEnvironment {
    pub fn global() -> Rc<RefCell<Self>> {
        let mut env = Self {
            store: HashMap::new(),
            parent: None,
        };

        for name in BUILTINS {
            env.store.insert(
                name.to_string(),
                (builtin_spec(name).cell(), SrcSpan::default())
            );
        }

        Rc::new(RefCell::new(env))
    }

    pub fn with_parent(parent: Rc<RefCell<SpecEnvironment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            parent: Some(parent),
        }))
    }

    fn get(&self, name: &str) -> Option<SpecRef> {
        match self.store.get(name) {
            Some((spec, _)) => Some(Rc::clone(spec)),
            None => self.parent.as_ref().and_then(|parent| parent.borrow().get(name)),
        }
    }

    /// `Err` carries the span of the existing same-scope declaration.
    fn declare(&mut self, name: &str, spec: SpecRef, location: SrcSpan) -> Result<(), SrcSpan> {
        if let Some((_, existing)) = self.store.get(name) {
            return Err(*existing);
        }

        self.store.insert(name.to_string(), (spec, location));
        Ok(())
    }

    fn declare_or_replace(&mut self, name: &str, spec: SpecRef, location: SrcSpan) {
        self.store.insert(name.to_string(), (spec, location));
    }
}

/// Best-effort structural inference over a parsed module. Warnings flow to
/// the emitter; only same-scope redeclarations come back as errors.
pub struct ModuleInferencer {
    problems: Problems,
    /// Return spec of each function body being walked, innermost last.
    returns: Vec<SpecRef>,
}

impl ModuleInferencer {
    pub fn infer(
        module: Module,
        warnings: &TypeWarningEmitter
    ) -> Outcome<Module, Vec<InferError>> {
        let mut inferencer = ModuleInferencer {
            problems: Default::default(),
            returns: vec![],
        };

        let env = SpecEnvironment::global();

        for statement in &module.program.statements {
            inferencer.infer_expression(statement, &env);
        }

        inferencer.problems.sort();

        for warning in inferencer.problems.take_warnings() {
            warnings.emit(warning);
        }

        let errors = inferencer.problems.take_errors();

        if errors.is_empty() {
            Outcome::Ok(module)
        } else {
            Outcome::PartialFailure(module, errors)
        }
    }

    fn infer_expression(
        &mut self,
        expression: &Expression,
        env: &Rc<RefCell<SpecEnvironment>>
    ) -> SpecRef {
        match expression {
            Expression::Int { .. } => TypeSpec::Int.cell(),
            Expression::Bool { .. } => TypeSpec::Bool.cell(),
            Expression::CharLit { .. } => TypeSpec::Char.cell(),
            Expression::TextLit { .. } => TypeSpec::Text.cell(),

            Expression::Identifier(identifier) => {
                match env.borrow().get(&identifier.name) {
                    Some(spec) => spec,
                    None => {
                        self.problems.warning(Warning::NotYetDeclared {
                            location: identifier.location,
                            name: identifier.name.clone(),
                        });

                        TypeSpec::Unknown.cell()
                    }
                }
            },

            Expression::Array(array) => {
                let element = TypeSpec::Unknown.cell();

                for item in &array.elements {
                    let observed = self.infer_expression(item, env).borrow().clone();

                    if let Err(conflict) = spec::refine(&element, &observed) {
                        self.problems.warning(Warning::TypeConflict {
                            location: item.location(),
                            expected: conflict.expected,
                            got: conflict.got,
                        });
                    }
                }

                TypeSpec::Array(element).cell()
            },

            Expression::Function(function) => {
                let scope = SpecEnvironment::with_parent(Rc::clone(env));
                let mut parameters = vec![];

                for parameter in &function.parameters {
                    let cell = TypeSpec::Unknown.cell();

                    if let Err(location_a) = scope.borrow_mut()
                        .declare(&parameter.name, Rc::clone(&cell), parameter.location)
                    {
                        self.problems.error(InferError::Redeclaration {
                            location_a,
                            location_b: parameter.location,
                            name: parameter.name.clone(),
                        });
                    }

                    parameters.push(cell);
                }

                let returns = TypeSpec::Unknown.cell();
                self.returns.push(Rc::clone(&returns));

                let body_scope = SpecEnvironment::with_parent(scope);
                for statement in &function.body.statements {
                    self.infer_expression(statement, &body_scope);
                }

                self.returns.pop();

                TypeSpec::Function { parameters, returns }.cell()
            },

            Expression::Declaration(declaration) => {
                let value = self.infer_expression(&declaration.value, env);

                if let Err(location_a) = env.borrow_mut()
                    .declare(&declaration.name.name, value, declaration.name.location)
                {
                    self.problems.error(InferError::Redeclaration {
                        location_a,
                        location_b: declaration.name.location,
                        name: declaration.name.name.clone(),
                    });
                }

                TypeSpec::Void.cell()
            },

            Expression::Assignment(assignment) => {
                let observed = self.infer_expression(&assignment.value, env).borrow().clone();

                match &assignment.target {
                    Expression::Identifier(identifier) => {
                        let cell = env.borrow().get(&identifier.name);

                        match cell {
                            Some(cell) => {
                                if let Err(conflict) = spec::refine(&cell, &observed) {
                                    self.problems.warning(Warning::TypeConflict {
                                        location: assignment.value.location(),
                                        expected: conflict.expected,
                                        got: conflict.got,
                                    });
                                }
                            },
                            None => {
                                self.problems.warning(Warning::NotYetDeclared {
                                    location: identifier.location,
                                    name: identifier.name.clone(),
                                });
                            }
                        }
                    },
                    Expression::MemberAccess(access) => {
                        let container = self.infer_expression(&access.container, env);

                        match spec::member(&container, &access.member.name) {
                            Ok(cell) => {
                                if let Err(conflict) = spec::refine(&cell, &observed) {
                                    self.problems.warning(Warning::TypeConflict {
                                        location: assignment.value.location(),
                                        expected: conflict.expected,
                                        got: conflict.got,
                                    });
                                }
                            },
                            Err(conflict) => {
                                self.problems.warning(Warning::TypeConflict {
                                    location: access.container.location(),
                                    expected: conflict.expected,
                                    got: conflict.got,
                                });
                            }
                        }
                    },
                    _ => {}
                }

                TypeSpec::Void.cell()
            },

            Expression::Conditional(conditional) => {
                let condition = self.infer_expression(&conditional.condition, env);

                if let Err(conflict) = spec::refine(&condition, &TypeSpec::Bool) {
                    self.problems.warning(Warning::TypeConflict {
                        location: conditional.condition.location(),
                        expected: conflict.expected,
                        got: conflict.got,
                    });
                }

                let result = TypeSpec::Unknown.cell();

                let scope = SpecEnvironment::with_parent(Rc::clone(env));
                let consequence = self.infer_expression(&conditional.consequence, &scope)
                    .borrow()
                    .clone();
                let _ = spec::refine(&result, &consequence);

                if let Some(alternative) = &conditional.alternative {
                    let scope = SpecEnvironment::with_parent(Rc::clone(env));
                    let observed = self.infer_expression(alternative, &scope).borrow().clone();

                    if let Err(conflict) = spec::refine(&result, &observed) {
                        self.problems.warning(Warning::TypeConflict {
                            location: alternative.location(),
                            expected: conflict.expected,
                            got: conflict.got,
                        });
                    }
                }

                result
            },

            Expression::Loop(loop_) => {
                let scope = SpecEnvironment::with_parent(Rc::clone(env));

                for statement in &loop_.body.statements {
                    self.infer_expression(statement, &scope);
                }

                TypeSpec::Void.cell()
            },

            Expression::Break { .. } | Expression::Continue { .. } => TypeSpec::Void.cell(),

            Expression::Return(return_) => {
                let observed = match &return_.value {
                    Some(expression) => self.infer_expression(expression, env).borrow().clone(),
                    None => TypeSpec::Void,
                };

                if let Some(returns) = self.returns.last() {
                    let returns = Rc::clone(returns);

                    if let Err(conflict) = spec::refine(&returns, &observed) {
                        self.problems.warning(Warning::TypeConflict {
                            location: return_.location,
                            expected: conflict.expected,
                            got: conflict.got,
                        });
                    }
                }

                TypeSpec::Void.cell()
            },

            Expression::Apply(apply) => {
                let callee = self.infer_expression(&apply.function, env);

                let mut arguments = Vec::with_capacity(apply.arguments.len());
                for argument in &apply.arguments {
                    arguments.push(self.infer_expression(argument, env));
                }

                let current = callee.borrow().clone();

                match current {
                    // first call site fixes the spec: parameters from the
                    // arguments, return not yet known
                    TypeSpec::Unknown => {
                        let parameters = arguments.iter()
                            .map(|argument| argument.borrow().clone().cell())
                            .collect();
                        let returns = TypeSpec::Unknown.cell();

                        *callee.borrow_mut() = TypeSpec::Function {
                            parameters,
                            returns: Rc::clone(&returns),
                        };

                        returns
                    },
                    TypeSpec::Any => TypeSpec::Unknown.cell(),
                    TypeSpec::Function { parameters, returns } => {
                        if parameters.len() != arguments.len() {
                            self.problems.warning(Warning::ArityMismatch {
                                location: apply.location,
                                expected: parameters.len(),
                                got: arguments.len(),
                            });
                        }

                        for (index, (parameter, argument)) in
                            parameters.iter().zip(&arguments).enumerate()
                        {
                            let observed = argument.borrow().clone();

                            if let Err(conflict) = spec::refine(parameter, &observed) {
                                self.problems.warning(Warning::ParameterMismatch {
                                    location: apply.arguments[index].location(),
                                    index,
                                    expected: conflict.expected,
                                    got: conflict.got,
                                });
                            }
                        }

                        returns
                    },
                    other => {
                        self.problems.warning(Warning::TypeConflict {
                            location: apply.function.location(),
                            expected: "a function".to_string(),
                            got: other.to_string(),
                        });

                        TypeSpec::Unknown.cell()
                    }
                }
            },

            Expression::MemberAccess(access) => {
                let container = self.infer_expression(&access.container, env);

                match spec::member(&container, &access.member.name) {
                    Ok(cell) => cell,
                    Err(conflict) => {
                        self.problems.warning(Warning::TypeConflict {
                            location: access.container.location(),
                            expected: conflict.expected,
                            got: conflict.got,
                        });

                        TypeSpec::Unknown.cell()
                    }
                }
            },

            Expression::New(new) => {
                let scope = SpecEnvironment::with_parent(Rc::clone(env));
                let mut members: Vec<(String, SpecRef)> = vec![];

                for binding in &new.body.bindings {
                    let value = self.infer_expression(&binding.value, &scope);

                    scope.borrow_mut().declare_or_replace(
                        &binding.name.name,
                        Rc::clone(&value),
                        binding.name.location
                    );

                    match members.iter_mut().find(|(name, _)| name == &binding.name.name) {
                        Some(member) => member.1 = value,
                        None => members.push((binding.name.name.clone(), value)),
                    }
                }

                TypeSpec::Object { members }.cell()
            },

            // nothing is known statically about an imported module
            Expression::Import(_) => TypeSpec::Any.cell(),

            Expression::Throw(throw) => {
                self.infer_expression(&throw.value, env);

                TypeSpec::Void.cell()
            },

            Expression::Try(try_) => {
                let result = TypeSpec::Unknown.cell();

                let observed = self.infer_expression(&try_.body, env).borrow().clone();
                let _ = spec::refine(&result, &observed);

                if let Some(catch) = &try_.catch {
                    let scope = SpecEnvironment::with_parent(Rc::clone(env));
                    let _ = scope.borrow_mut().declare(
                        &catch.binding.name,
                        TypeSpec::Any.cell(),
                        catch.binding.location
                    );

                    let observed = self.infer_expression(&catch.handler, &scope).borrow().clone();
                    let _ = spec::refine(&result, &observed);
                }

                if let Some(finally) = &try_.finally {
                    self.infer_expression(finally, env);
                }

                result
            },

            Expression::Sequence(sequence) => {
                let scope = SpecEnvironment::with_parent(Rc::clone(env));

                for statement in &sequence.statements {
                    self.infer_expression(statement, &scope);
                }

                TypeSpec::Void.cell()
            },

            Expression::Grouped { expression, .. } => self.infer_expression(expression, env),
        }
    }
}

fn builtin_spec(name: &str) -> TypeSpec {
    use TypeSpec::{Any, Array, Bool, Int, Void};

    match name {
        "+" | "-" | "*" | "/" => function_spec(vec![Int, Int], Int),
        "==" | "!=" => function_spec(vec![Any, Any], Bool),
        "<" | "<=" | ">" | ">=" => function_spec(vec![Int, Int], Bool),
        "and" | "or" => function_spec(vec![Bool, Bool], Bool),
        "print" => function_spec(vec![Any], Void),
        "cons" => function_spec(vec![Any, Array(Any.cell())], Array(Any.cell())),
        "at" => function_spec(vec![Array(Any.cell()), Int], Any),
        "setAt" => function_spec(vec![Array(Any.cell()), Int, Any], Void),
        "count" => function_spec(vec![Array(Any.cell())], Int),
        _ => Any,
    }
}

fn function_spec(parameters: Vec<TypeSpec>, returns: TypeSpec) -> TypeSpec {
    TypeSpec::Function {
        parameters: parameters.into_iter().map(TypeSpec::cell).collect(),
        returns: returns.cell(),
    }
}
