//! Node addressing for external tree browsers: nodes are addressed by the
//! child-index path from the program root, so the AST itself carries no
//! parent back-references.

use super::ast::{Expression, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Remove,
}

/// Child expressions in navigation order. Statement bodies (sequences, loop
/// and function bodies) contribute their statements directly.
pub fn children(expression: &Expression) -> Vec<&Expression> {
    match expression {
        Expression::Identifier(_)
        | Expression::Int { .. }
        | Expression::Bool { .. }
        | Expression::CharLit { .. }
        | Expression::TextLit { .. }
        | Expression::Break { .. }
        | Expression::Continue { .. }
        | Expression::Import(_) => vec![],
        Expression::Array(array) => array.elements.iter().collect(),
        Expression::Function(function) => function.body.statements.iter().collect(),
        Expression::Declaration(declaration) => vec![&declaration.value],
        Expression::Assignment(assignment) => vec![&assignment.target, &assignment.value],
        Expression::Conditional(conditional) => {
            let mut nodes = vec![&conditional.condition, &conditional.consequence];
            nodes.extend(conditional.alternative.as_ref());
            nodes
        },
        Expression::Loop(loop_) => loop_.body.statements.iter().collect(),
        Expression::Return(return_) => return_.value.iter().collect(),
        Expression::Apply(apply) => {
            std::iter::once(&apply.function).chain(apply.arguments.iter()).collect()
        },
        Expression::MemberAccess(access) => vec![&access.container],
        Expression::New(new) => new.body.bindings.iter().map(|binding| &binding.value).collect(),
        Expression::Throw(throw) => vec![&throw.value],
        Expression::Try(try_) => {
            let mut nodes = vec![&try_.body];
            nodes.extend(try_.catch.as_ref().map(|catch| &catch.handler));
            nodes.extend(try_.finally.as_ref());
            nodes
        },
        Expression::Sequence(sequence) => sequence.statements.iter().collect(),
        Expression::Grouped { expression, .. } => vec![expression],
    }
}

fn children_mut(expression: &mut Expression) -> Vec<&mut Expression> {
    match expression {
        Expression::Identifier(_)
        | Expression::Int { .. }
        | Expression::Bool { .. }
        | Expression::CharLit { .. }
        | Expression::TextLit { .. }
        | Expression::Break { .. }
        | Expression::Continue { .. }
        | Expression::Import(_) => vec![],
        Expression::Array(array) => array.elements.iter_mut().collect(),
        Expression::Function(function) => function.body.statements.iter_mut().collect(),
        Expression::Declaration(declaration) => vec![&mut declaration.value],
        Expression::Assignment(assignment) => vec![&mut assignment.target, &mut assignment.value],
        Expression::Conditional(conditional) => {
            let mut nodes = vec![&mut conditional.condition, &mut conditional.consequence];
            nodes.extend(conditional.alternative.as_mut());
            nodes
        },
        Expression::Loop(loop_) => loop_.body.statements.iter_mut().collect(),
        Expression::Return(return_) => return_.value.iter_mut().collect(),
        Expression::Apply(apply) => {
            std::iter::once(&mut apply.function).chain(apply.arguments.iter_mut()).collect()
        },
        Expression::MemberAccess(access) => vec![&mut access.container],
        Expression::New(new) => {
            new.body.bindings.iter_mut().map(|binding| &mut binding.value).collect()
        },
        Expression::Throw(throw) => vec![&mut throw.value],
        Expression::Try(try_) => {
            let mut nodes = vec![&mut try_.body];
            nodes.extend(try_.catch.as_mut().map(|catch| &mut catch.handler));
            nodes.extend(try_.finally.as_mut());
            nodes
        },
        Expression::Sequence(sequence) => sequence.statements.iter_mut().collect(),
        Expression::Grouped { expression, .. } => vec![expression],
    }
}

pub fn node_at<'a>(program: &'a Program, path: &[usize]) -> Option<&'a Expression> {
    let (&first, rest) = path.split_first()?;
    let mut node = program.statements.get(first)?;

    for &index in rest {
        node = children(node).into_iter().nth(index)?;
    }

    Some(node)
}

fn node_at_mut<'a>(program: &'a mut Program, path: &[usize]) -> Option<&'a mut Expression> {
    let (&first, rest) = path.split_first()?;
    let mut node = program.statements.get_mut(first)?;

    for &index in rest {
        node = children_mut(node).into_iter().nth(index)?;
    }

    Some(node)
}

/// A node can be removed exactly when its parent slot is a statement
/// sequence: the program itself, a `{ .. }` block, or a loop or function
/// body.
pub fn available_actions(program: &Program, path: &[usize]) -> Vec<NodeAction> {
    if node_at(program, path).is_none() {
        return vec![];
    }

    let Some((_, parent_path)) = path.split_last() else {
        return vec![];
    };

    if parent_path.is_empty() {
        return vec![NodeAction::Remove];
    }

    match node_at(program, parent_path) {
        Some(Expression::Sequence(_))
        | Some(Expression::Loop(_))
        | Some(Expression::Function(_)) => vec![NodeAction::Remove],
        _ => vec![]
    }
}

pub fn remove_node(program: &mut Program, path: &[usize]) -> bool {
    let Some((&index, parent_path)) = path.split_last() else {
        return false;
    };

    if parent_path.is_empty() {
        if index < program.statements.len() {
            program.statements.remove(index);
            return true;
        }
        return false;
    }

    let Some(parent) = node_at_mut(program, parent_path) else {
        return false;
    };

    let statements = match parent {
        Expression::Sequence(sequence) => &mut sequence.statements,
        Expression::Loop(loop_) => &mut loop_.body.statements,
        Expression::Function(function) => &mut function.body.statements,
        _ => return false
    };

    if index < statements.len() {
        statements.remove(index);
        true
    } else {
        false
    }
}
