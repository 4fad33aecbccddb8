use std::path::PathBuf;
use std::rc::Rc;

use crate::{
    environment::prelude::Value,
    eval::{builtins, eval_module, Evaluated, ImportLoader, NullImportLoader},
    parser::prelude::parse_module,
    run_source,
    utils::prelude::{
        Error, NullWarningEmitterIO, RuntimeWarningEmitter, VectorWarningEmitterIO, Warning,
    },
};

use super::error::{RuntimeError, RuntimeErrorType, RuntimeWarning};

fn eval_direct(input: &str) -> Result<Evaluated, RuntimeError> {
    let parsed = parse_module(input).expect("program should parse");
    let env = builtins::global_environment();
    let warnings = RuntimeWarningEmitter::null();

    eval_module(&parsed.module, &env, &warnings, &NullImportLoader)
}

fn run_ok(input: &str) -> Value {
    run_source(
        PathBuf::from("test.sg"),
        input,
        Rc::new(NullWarningEmitterIO),
        &NullImportLoader,
    )
    .expect("program should run")
    .value
}

fn run_value(input: &str) -> String {
    run_ok(input).to_string()
}

fn run_output(input: &str) -> String {
    run_source(
        PathBuf::from("test.sg"),
        input,
        Rc::new(NullWarningEmitterIO),
        &NullImportLoader,
    )
    .expect("program should run")
    .output
}

fn eval_err(input: &str) -> RuntimeErrorType {
    eval_direct(input).expect_err("program should fault").error
}

fn runtime_warnings(input: &str) -> Vec<RuntimeWarning> {
    let vector = Rc::new(VectorWarningEmitterIO::new());

    run_source(
        PathBuf::from("test.sg"),
        input,
        vector.clone(),
        &NullImportLoader,
    )
    .expect("program should run");

    vector.take().into_iter()
        .filter_map(|warning| match warning {
            Warning::Runtime { warning, .. } => Some(warning),
            Warning::Type { .. } => None,
        })
        .collect()
}

#[test]
fn test_arithmetic_and_precedence() {
    assert_eq!(run_value("1 + 2"), "3");
    assert_eq!(run_value("(1 + 2) * 10"), "30");
    assert_eq!(run_value("10 * (1 + 2)"), "30");
    assert_eq!(run_value("(10 * 1) + 2"), "12");
    assert_eq!(run_value("1 + 2 * 10"), "21");
    assert_eq!(run_value("10 - 2 - 3"), "5");
    assert_eq!(run_value("9 / 2"), "4");
}

#[test]
fn test_comparisons_and_logic() {
    assert_eq!(run_value("1 < 2"), "true");
    assert_eq!(run_value("2 <= 1"), "false");
    assert_eq!(run_value("1 < 2 and 3 < 4"), "true");
    assert_eq!(run_value("1 < 2 and 4 < 3"), "false");
    assert_eq!(run_value("1 == 2 or 2 == 2"), "true");
}

#[test]
fn test_structural_equality() {
    assert_eq!(run_value("[1, 2] == [1, 2]"), "true");
    assert_eq!(run_value("[1, 2] == [2, 1]"), "false");
    // a text is an array of characters
    assert_eq!(run_value("\"abc\" == ['a', 'b', 'c']"), "true");
    assert_eq!(run_value("1 == true"), "false");
}

#[test]
fn test_shadowing_does_not_leak() {
    let input = "var a = 1\n{ var a = 2 }\nreturn a";

    assert_eq!(run_value(input), "1");
}

#[test]
fn test_assignment_mutates_outer_scope() {
    let input = "var a = 1\n{ a = 2 }\nreturn a";

    assert_eq!(run_value(input), "2");
}

#[test]
fn test_conditionals() {
    assert_eq!(run_value("if true then 1 else 2"), "1");
    assert_eq!(run_value("if false then 1 else 2"), "2");
    assert_eq!(run_value("if false then 1"), "void");
}

#[test]
fn test_loop_break_and_mutation() {
    assert_eq!(run_value("loop { break }\nreturn 1"), "1");

    let input = r#"
var a = 0
loop {
    a = a + 1
    if a == 3 then break
}
return a
"#;

    assert_eq!(run_value(input), "3");
}

#[test]
fn test_loop_continue() {
    let input = r#"
var a = 0
var b = 0
loop {
    a = a + 1
    if a == 5 then break
    if a == 2 then continue
    b = b + 1
}
return b
"#;

    assert_eq!(run_value(input), "3");
}

#[test]
fn test_closures_share_their_environment() {
    let input = r#"
var adder = fn a {
    var state = a
    return fn {
        state = state + 1
        return state
    }
}
var bump = adder(10)
bump()
return bump()
"#;

    // repeated calls on one closure accumulate
    assert_eq!(run_value(input), "12");
}

#[test]
fn test_closures_are_independent_per_call() {
    let input = r#"
var adder = fn a {
    var state = a
    return fn {
        state = state + 1
        return state
    }
}
var small = adder(10)
var big = adder(100)
small()
return [small(), big()]
"#;

    assert_eq!(run_value(input), "[12, 101]");
}

#[test]
fn test_function_runs_to_completion_without_return() {
    let input = "var f = fn { var a = 1 }\nreturn f()";

    assert_eq!(run_value(input), "void");
}

#[test]
fn test_permissive_arity() {
    let input = "var f = fn a b { return a }\nreturn f(1)";
    assert_eq!(run_value(input), "1");

    let input = "var f = fn a { return a }\nreturn f(1, 2, 3)";
    assert_eq!(run_value(input), "1");
}

#[test]
fn test_arrays() {
    assert_eq!(run_value("count([1, 2, 3])"), "3");
    assert_eq!(run_value("at([10, 20, 30], 1)"), "20");
    assert_eq!(run_value("cons(0, [1, 2])"), "[0, 1, 2]");

    let input = "var xs = [1, 2, 3]\nsetAt(xs, 0, 9)\nreturn xs";
    assert_eq!(run_value(input), "[9, 2, 3]");

    // cons copies; the original array is untouched
    let input = "var xs = [1, 2]\nvar ys = cons(0, xs)\nreturn xs";
    assert_eq!(run_value(input), "[1, 2]");
}

#[test]
fn test_text_is_a_char_array() {
    assert_eq!(run_value("count(\"abc\")"), "3");
    assert_eq!(run_value("at(\"abc\", 0)"), "a");
    assert_eq!(run_value("\"hello\""), "hello");
}

#[test]
fn test_print_appends_to_the_output_sink() {
    let input = "print(1)\nprint(\"hi\")\nprint([1, 2])";

    assert_eq!(run_output(input), "1\nhi\n[1, 2]\n");
}

#[test]
fn test_objects() {
    let input = r#"
var point = new {
    var x = 1
    var y = 2
}
point.x = point.y + 10
return point.x
"#;

    assert_eq!(run_value(input), "12");
}

#[test]
fn test_object_bindings_see_each_other() {
    let input = r#"
var obj = new {
    var x = 2
    var y = x * 10
}
return obj.y
"#;

    assert_eq!(run_value(input), "20");
}

#[test]
fn test_object_prints_in_declaration_order() {
    let input = "new { var x = 1\nvar y = \"two\" }";

    assert_eq!(run_value(input), "{x: 1, y: two}");
}

#[test]
fn test_undeclared_variable_faults() {
    assert!(matches!(
        eval_err("boom"),
        RuntimeErrorType::NotDeclared { name } if name == "boom"
    ));
}

#[test]
fn test_redeclaration_faults() {
    assert!(matches!(
        eval_err("var a = 1\nvar a = 2"),
        RuntimeErrorType::AlreadyDeclared { name } if name == "a"
    ));
}

#[test]
fn test_member_access_requires_object() {
    assert!(matches!(
        eval_err("var a = 1\nreturn a.x"),
        RuntimeErrorType::ObjectRequired { .. }
    ));
}

#[test]
fn test_apply_requires_function() {
    assert!(matches!(
        eval_err("var a = 1\nreturn a(2)"),
        RuntimeErrorType::FunctionRequired { .. }
    ));
}

#[test]
fn test_condition_requires_bool() {
    assert!(matches!(
        eval_err("if 1 then 2 else 3"),
        RuntimeErrorType::ConditionRequiresBool { .. }
    ));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(
        eval_err("1 / 0"),
        RuntimeErrorType::DivisionByZero
    ));
}

#[test]
fn test_index_out_of_bounds() {
    assert!(matches!(
        eval_err("at([1], 5)"),
        RuntimeErrorType::IndexOutOfBounds { index: 5, count: 1 }
    ));
}

#[test]
fn test_builtin_operand_mismatch() {
    assert!(matches!(
        eval_err("1 + true"),
        RuntimeErrorType::BuiltinMismatch { name, .. } if name == "+"
    ));
}

#[test]
fn test_bare_value_statement_is_a_fault() {
    assert!(matches!(
        eval_err("5\nreturn 1"),
        RuntimeErrorType::UnconsumedValue { .. }
    ));
}

#[test]
fn test_discarded_call_result_only_warns() {
    let input = "var f = fn { return 1 }\nf()\nreturn 2";

    assert_eq!(run_value(input), "2");
    assert!(matches!(
        runtime_warnings(input).as_slice(),
        [RuntimeWarning::DiscardedValue { .. }]
    ));
}

#[test]
fn test_let_reassignment_warns_but_happens() {
    let input = "let a = 1\na = 2\nreturn a";

    assert_eq!(run_value(input), "2");

    let warnings = runtime_warnings(input);
    assert!(warnings.iter().any(|warning| matches!(
        warning,
        RuntimeWarning::LetReassignment { name, .. } if name == "a"
    )));
}

#[test]
fn test_kind_drift_warns() {
    let input = "var a = 1\na = true\nreturn a";

    let warnings = eval_direct_warnings(input);
    assert!(warnings.iter().any(|warning| matches!(
        warning,
        RuntimeWarning::ValueKindDrift { name, .. } if name == "a"
    )));
}

fn eval_direct_warnings(input: &str) -> Vec<RuntimeWarning> {
    use crate::utils::prelude::WarningEmitter;

    let parsed = parse_module(input).expect("program should parse");
    let env = builtins::global_environment();
    let vector = Rc::new(VectorWarningEmitterIO::new());
    let warnings = RuntimeWarningEmitter::new(
        PathBuf::from("test.sg"),
        input.to_string(),
        WarningEmitter::new(vector.clone()),
    );

    eval_module(&parsed.module, &env, &warnings, &NullImportLoader)
        .expect("program should run");

    vector.take().into_iter()
        .filter_map(|warning| match warning {
            Warning::Runtime { warning, .. } => Some(warning),
            Warning::Type { .. } => None,
        })
        .collect()
}

#[test]
fn test_throw_and_catch() {
    let input = "try { throw \"bang\" } catch e { print(e) } finally { print(\"done\") }\nreturn 0";

    assert_eq!(run_output(input), "bang\ndone\n");
}

#[test]
fn test_finally_runs_without_a_throw() {
    let input = "try { print(\"body\") } finally { print(\"done\") }\nreturn 0";

    assert_eq!(run_output(input), "body\ndone\n");
}

#[test]
fn test_uncaught_throw_is_an_interpreted_exception() {
    assert!(matches!(
        eval_err("throw 42"),
        RuntimeErrorType::Uncaught { value } if value == "42"
    ));
}

#[test]
fn test_catch_binds_the_thrown_value() {
    let input = "var r = 0\ntry { throw 41 } catch e { r = e + 1 }\nreturn r";

    assert_eq!(run_value(input), "42");
}

#[test]
fn test_fault_carries_the_call_stack() {
    let input = r#"
var inner = fn { return boom }
var outer = fn { return inner() }
return outer()
"#;

    let error = eval_direct(input).expect_err("program should fault");

    assert!(matches!(&error.error, RuntimeErrorType::NotDeclared { name } if name == "boom"));

    let names = error.frames.iter()
        .map(|frame| frame.name.as_str())
        .collect::<Vec<&str>>();

    assert_eq!(names, vec!["outer", "inner"]);
    assert!(error.frames.iter().all(|frame| frame.location.is_some()));
}

#[test]
fn test_runtime_error_report_has_frame_lines() {
    let input = "var f = fn { return boom }\nreturn f()";

    let error = run_source(
        PathBuf::from("test.sg"),
        input,
        Rc::new(NullWarningEmitterIO),
        &NullImportLoader,
    )
    .expect_err("program should fault");

    let Error::Runtime { .. } = &error else {
        panic!("expected a runtime error, got {error:?}");
    };

    let report = error.compact_lines().join("\n");
    assert!(report.contains("`boom` is not declared"), "report was: {report}");
    assert!(report.contains("in f"), "report was: {report}");
    assert!(report.contains("test.sg:2,"), "report was: {report}");
}

struct MapLoader;

impl ImportLoader for MapLoader {
    fn load(&self, path: &str) -> Result<String, String> {
        match path {
            "lib" => Ok("var x = 42\nvar double = fn n { return n * 2 }".to_string()),
            _ => Err("no such module".to_string()),
        }
    }
}

#[test]
fn test_import_yields_a_module_object() {
    let input = "var m = import \"lib\"\nreturn m.double(m.x)";

    let evaluated = run_source(
        PathBuf::from("test.sg"),
        input,
        Rc::new(NullWarningEmitterIO),
        &MapLoader,
    )
    .expect("program should run");

    assert_eq!(evaluated.value.to_string(), "84");
}

#[test]
fn test_missing_import_faults() {
    let input = "import \"nope\"";

    let parsed = parse_module(input).expect("program should parse");
    let env = builtins::global_environment();
    let warnings = RuntimeWarningEmitter::null();

    let error = eval_module(&parsed.module, &env, &warnings, &MapLoader)
        .expect_err("import should fail");

    assert!(matches!(error.error, RuntimeErrorType::ImportFailed { .. }));
}
