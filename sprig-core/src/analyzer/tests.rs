use std::path::PathBuf;
use std::rc::Rc;

use crate::{
    parser::prelude::parse_module,
    utils::prelude::{TypeWarningEmitter, VectorWarningEmitterIO, Warning as Emitted, WarningEmitter},
};

use super::error::{InferError, Warning};
use super::prelude::{ModuleInferencer, Outcome};

fn infer(input: &str) -> (Vec<InferError>, Vec<Warning>) {
    let parsed = parse_module(input).expect("program should parse");

    let vector = Rc::new(VectorWarningEmitterIO::new());
    let emitter = TypeWarningEmitter::new(
        PathBuf::new(),
        input.to_string(),
        WarningEmitter::new(vector.clone())
    );

    let errors = match ModuleInferencer::infer(parsed.module, &emitter) {
        Outcome::Ok(_) => vec![],
        Outcome::PartialFailure(_, errors) => errors,
    };

    let warnings = vector.take().into_iter()
        .map(|warning| match warning {
            Emitted::Type { warning, .. } => warning,
            Emitted::Runtime { .. } => panic!("runtime warning from the inference pass"),
        })
        .collect();

    (errors, warnings)
}

fn infer_warnings(input: &str) -> Vec<Warning> {
    let (errors, warnings) = infer(input);
    assert_eq!(errors, vec![], "expected no fatal inference errors");
    warnings
}

#[test]
fn test_clean_module() {
    let input = r#"
var a = 1
var b = a + 2
if a < b then print(a) else print(b)
"#;

    assert_eq!(infer_warnings(input), vec![]);
}

#[test]
fn test_redeclaration_is_fatal() {
    let (errors, _) = infer("var a = 1\nvar a = 2");

    assert!(matches!(
        errors.as_slice(),
        [InferError::Redeclaration { name, .. }] if name == "a"
    ));
}

#[test]
fn test_shadowing_is_not_redeclaration() {
    let (errors, warnings) = infer("var a = 1\n{ var a = 2 }");

    assert_eq!(errors, vec![]);
    assert_eq!(warnings, vec![]);
}

#[test]
fn test_assignment_conflict_warns() {
    let warnings = infer_warnings("var a = 1\na = true");

    assert!(matches!(
        warnings.as_slice(),
        [Warning::TypeConflict { expected, got, .. }]
            if expected == "int" && got == "bool"
    ));
}

#[test]
fn test_condition_must_be_bool() {
    let warnings = infer_warnings("var a = 1\nif a then print(1)");

    assert!(matches!(
        warnings.as_slice(),
        [Warning::TypeConflict { expected, got, .. }]
            if expected == "int" && got == "bool"
    ));
}

#[test]
fn test_use_before_declaration_warns() {
    let warnings = infer_warnings("print(missing)");

    assert!(matches!(
        warnings.as_slice(),
        [Warning::NotYetDeclared { name, .. }] if name == "missing"
    ));
}

#[test]
fn test_builtin_operand_conflict() {
    let warnings = infer_warnings("var a = 1 + true");

    assert!(matches!(
        warnings.as_slice(),
        [Warning::ParameterMismatch { index: 1, .. }]
    ));
}

#[test]
fn test_function_spec_inferred_from_body_and_calls() {
    // the first call refines the parameter to int, the next call conflicts
    let input = r#"
var f = fn a { return a + 0 }
var x = f(1)
var y = f(true)
"#;

    let warnings = infer_warnings(input);

    assert!(warnings.iter().any(|warning| matches!(
        warning,
        Warning::ParameterMismatch { index: 0, expected, got, .. }
            if expected == "int" && got == "bool"
    )), "warnings were: {warnings:?}");
}

#[test]
fn test_arity_mismatch_warns() {
    let input = r#"
var f = fn a b { return a }
var x = f(1)
"#;

    let warnings = infer_warnings(input);

    assert!(matches!(
        warnings.as_slice(),
        [Warning::ArityMismatch { expected: 2, got: 1, .. }]
    ));
}

#[test]
fn test_spec_inferred_at_first_call_site_checks_later_ones() {
    // `g` is only known through its uses: the first call shapes the spec,
    // the second disagrees on arity
    let input = r#"
var apply = fn g {
    var a = g(1)
    var b = g(1, 2)
    return a
}
"#;

    let warnings = infer_warnings(input);

    assert!(matches!(
        warnings.as_slice(),
        [Warning::ArityMismatch { expected: 1, got: 2, .. }]
    ));
}

#[test]
fn test_object_spec_grows_from_usage() {
    // o.x on a not-yet-known parameter synthesizes an object spec; a
    // structurally matching object passes without complaint
    let input = r#"
var get_x = fn o { return o.x }
var point = new {
    var x = 1
    var y = 2
}
var x = get_x(point)
"#;

    assert_eq!(infer_warnings(input), vec![]);
}

#[test]
fn test_member_access_on_concrete_non_object() {
    let warnings = infer_warnings("var a = 1\nvar b = a.x");

    assert!(matches!(
        warnings.as_slice(),
        [Warning::TypeConflict { expected, got, .. }]
            if expected == "an object" && got == "int"
    ));
}

#[test]
fn test_return_refines_the_function_spec() {
    // f's return becomes int; using the result as a condition conflicts
    let input = r#"
var f = fn { return 1 }
if f() then print(1)
"#;

    let warnings = infer_warnings(input);

    assert!(matches!(
        warnings.as_slice(),
        [Warning::TypeConflict { expected, got, .. }]
            if expected == "int" && got == "bool"
    ));
}

#[test]
fn test_inference_is_best_effort() {
    // conflicts never stop the pass; later statements are still checked
    let input = r#"
var a = 1
a = true
var b = missing
"#;

    let warnings = infer_warnings(input);

    assert_eq!(warnings.len(), 2);
}
