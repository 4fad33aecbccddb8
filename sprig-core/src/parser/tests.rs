use super::prelude::{
    available_actions, parse_module, remove_node, Expression, IdentifierKind, NodeAction,
    ParseError, ParseErrorType,
};

fn parse_statements(input: &str) -> Vec<Expression> {
    parse_module(input)
        .expect("program should parse")
        .module
        .program
        .statements
}

fn parse_expression(input: &str) -> Expression {
    let mut statements = parse_statements(input);
    assert_eq!(statements.len(), 1, "expected a single expression");
    statements.remove(0)
}

fn parse_err(input: &str) -> ParseError {
    parse_module(input).expect_err("program should not parse")
}

fn infix_parts(expr: &Expression) -> (String, &Expression, &Expression) {
    match expr {
        Expression::Apply(apply) => {
            let (op, left, right) = apply.as_infix().expect("expected an infix application");
            (op.name.clone(), left, right)
        },
        other => panic!("expected an application, got {other:?}")
    }
}

#[test]
fn test_declarations() {
    let input = r#"
        var a = 1
        let b = a + 2
    "#;

    let statements = parse_statements(input);
    assert_eq!(statements.len(), 2);

    assert!(matches!(&statements[0], Expression::Declaration(decl) if decl.name.name == "a"));
    assert!(matches!(&statements[1], Expression::Declaration(decl) if decl.name.name == "b"));
}

#[test]
fn test_operator_becomes_application() {
    let expr = parse_expression("1 + 2");

    let (op, left, right) = infix_parts(&expr);
    assert_eq!(op, "+");
    assert!(matches!(left, Expression::Int { value: 1, .. }));
    assert!(matches!(right, Expression::Int { value: 2, .. }));

    if let Expression::Apply(apply) = &expr {
        if let Expression::Identifier(ident) = &apply.function {
            assert_eq!(ident.kind, IdentifierKind::Operator);
        }
    }
}

#[test]
fn test_precedence_product_binds_tighter() {
    // 1 + 2 * 3 parses as 1 + (2 * 3)
    let expr = parse_expression("1 + 2 * 3");

    let (op, _, right) = infix_parts(&expr);
    assert_eq!(op, "+");

    let (inner, _, _) = infix_parts(right);
    assert_eq!(inner, "*");
}

#[test]
fn test_precedence_left_associative() {
    // 1 - 2 - 3 parses as (1 - 2) - 3
    let expr = parse_expression("1 - 2 - 3");

    let (op, left, right) = infix_parts(&expr);
    assert_eq!(op, "-");
    assert!(matches!(right, Expression::Int { value: 3, .. }));

    let (inner, _, _) = infix_parts(left);
    assert_eq!(inner, "-");
}

#[test]
fn test_grouping_suppresses_precedence() {
    // (1 + 2) * 10 keeps the sum grouped on the left
    let expr = parse_expression("(1 + 2) * 10");

    let (op, left, _) = infix_parts(&expr);
    assert_eq!(op, "*");
    assert!(matches!(left, Expression::Grouped { .. }));
}

#[test]
fn test_relational_and_logic_tiers() {
    // a < b and c < d or e parses as ((a < b) and (c < d)) or e
    let expr = parse_expression("a < b and c < d or e");

    let (op, left, _) = infix_parts(&expr);
    assert_eq!(op, "or");

    let (op, left, right) = infix_parts(left);
    assert_eq!(op, "and");

    let (lop, _, _) = infix_parts(left);
    let (rop, _, _) = infix_parts(right);
    assert_eq!(lop, "<");
    assert_eq!(rop, "<");
}

#[test]
fn test_assignment_is_lowest_and_structural() {
    let expr = parse_expression("a = 1 + 2");

    match &expr {
        Expression::Assignment(assignment) => {
            assert!(matches!(&assignment.target, Expression::Identifier(_)));
            let (op, _, _) = infix_parts(&assignment.value);
            assert_eq!(op, "+");
        },
        other => panic!("expected assignment, got {other:?}")
    }
}

#[test]
fn test_member_assignment_target() {
    let expr = parse_expression("obj.field = 1");

    match &expr {
        Expression::Assignment(assignment) => {
            assert!(matches!(&assignment.target, Expression::MemberAccess(_)));
        },
        other => panic!("expected assignment, got {other:?}")
    }
}

#[test]
fn test_invalid_assignment_target() {
    let err = parse_err("1 + 2 = 3");

    assert_eq!(err.error, ParseErrorType::InvalidAssignmentTarget);
}

#[test]
fn test_member_access_chain() {
    let expr = parse_expression("a.b.c");

    match &expr {
        Expression::MemberAccess(outer) => {
            assert_eq!(outer.member.name, "c");
            assert!(matches!(&outer.container, Expression::MemberAccess(_)));
        },
        other => panic!("expected member access, got {other:?}")
    }
}

#[test]
fn test_call_and_curried_call() {
    let expr = parse_expression("adder(10)(1)");

    match &expr {
        Expression::Apply(outer) => {
            assert_eq!(outer.arguments.len(), 1);
            assert!(matches!(&outer.function, Expression::Apply(_)));
        },
        other => panic!("expected application, got {other:?}")
    }
}

#[test]
fn test_missing_then_is_fatal() {
    let err = parse_err("if a b else c");

    assert_eq!(err.error, ParseErrorType::ExpectedThen);
}

#[test]
fn test_conditional_with_sequences() {
    let expr = parse_expression("if a then { b } else { c }");

    match &expr {
        Expression::Conditional(conditional) => {
            assert!(matches!(&conditional.consequence, Expression::Sequence(_)));
            assert!(matches!(&conditional.alternative, Some(Expression::Sequence(_))));
        },
        other => panic!("expected conditional, got {other:?}")
    }
}

#[test]
fn test_return_operand_ends_at_newline() {
    let expr = parse_expression("{ return\n1 }");

    match &expr {
        Expression::Sequence(sequence) => {
            assert_eq!(sequence.statements.len(), 2);
            assert!(matches!(
                &sequence.statements[0],
                Expression::Return(return_) if return_.value.is_none()
            ));
            assert!(matches!(&sequence.statements[1], Expression::Int { value: 1, .. }));
        },
        other => panic!("expected sequence, got {other:?}")
    }
}

#[test]
fn test_return_with_operand() {
    let expr = parse_expression("{ return 1 + 2 }");

    match &expr {
        Expression::Sequence(sequence) => {
            assert!(matches!(
                &sequence.statements[0],
                Expression::Return(return_) if return_.value.is_some()
            ));
        },
        other => panic!("expected sequence, got {other:?}")
    }
}

#[test]
fn test_function_literal_takes_binding_name() {
    let expr = parse_expression("var double = fn a { return a * 2 }");

    match &expr {
        Expression::Declaration(declaration) => match &declaration.value {
            Expression::Function(function) => {
                assert_eq!(function.name.as_deref(), Some("double"));
                assert_eq!(function.parameters.len(), 1);
            },
            other => panic!("expected function, got {other:?}")
        },
        other => panic!("expected declaration, got {other:?}")
    }
}

#[test]
fn test_new_requires_bindings() {
    let err = parse_err("new { 1 + 2 }");

    assert_eq!(err.error, ParseErrorType::ExpectedBinding);
}

#[test]
fn test_new_with_bindings() {
    let expr = parse_expression("new { var x = 1\nvar y = 2 }");

    match &expr {
        Expression::New(new) => assert_eq!(new.body.bindings.len(), 2),
        other => panic!("expected new, got {other:?}")
    }
}

#[test]
fn test_try_requires_catch_or_finally() {
    let err = parse_err("try { 1 }");

    assert_eq!(err.error, ParseErrorType::ExpectedCatchOrFinally);
}

#[test]
fn test_invalid_token_is_fatal() {
    let err = parse_err("var a = $");

    assert!(matches!(err.error, ParseErrorType::InvalidToken { .. }));
}

#[test]
fn test_unclosed_sequence_is_fatal() {
    let err = parse_err("{ var a = 1");

    assert_eq!(err.error, ParseErrorType::UnexpectedEof);
}

// Printing a parsed program and parsing it again must reach a fixed point.
#[test]
fn test_printer_round_trip() {
    let inputs = [
        "var a = 1\na = a + 2\nprint(a)",
        "var f = fn a b {\nreturn a * b + 1\n}",
        "if a < 10 then { print(a) } else { print(10) }",
        "loop {\nif done then break\ncontinue\n}",
        "var obj = new {\nvar x = 1\nlet y = \"two\"\n}\nobj.x = obj.y",
        "try { throw 'x' } catch e { print(e) } finally { print(1) }",
        "var xs = [1, 2, [3, 4]]\nsetAt(xs, 0, (1 + 2) * 3)",
        "import \"lib/util\"",
    ];

    for input in inputs {
        let first = parse_module(input).expect("first parse").module.program;
        let printed = format!("{first}");
        let second = parse_module(&printed)
            .unwrap_or_else(|err| panic!("reprint of {input:?} failed to parse: {err:?}"))
            .module
            .program;
        let reprinted = format!("{second}");

        assert_eq!(printed, reprinted, "printer not idempotent for {input:?}");
    }
}

#[test]
fn test_node_actions_and_removal() {
    let mut program = parse_module("{ var a = 1\nvar b = 2 }\nvar c = 3")
        .expect("program should parse")
        .module
        .program;

    // statements inside the block sequence are removable
    assert_eq!(available_actions(&program, &[0, 1]), vec![NodeAction::Remove]);
    // top-level statements are removable too
    assert_eq!(available_actions(&program, &[1]), vec![NodeAction::Remove]);
    // a declaration initializer is not in a sequence slot
    assert_eq!(available_actions(&program, &[1, 0]), vec![]);

    assert!(remove_node(&mut program, &[0, 1]));

    match &program.statements[0] {
        Expression::Sequence(sequence) => assert_eq!(sequence.statements.len(), 1),
        other => panic!("expected sequence, got {other:?}")
    }

    // out-of-range paths do nothing
    assert!(!remove_node(&mut program, &[5]));
}
