mod common;

use common::run_demo;

#[test]
fn a_user_defined_function_returns_its_computed_value() {
    assert_eq!(run_demo("functions.usl"), "42\n");
}

#[test]
fn ref_parameters_mutate_the_caller_binding() {
    assert_eq!(run_demo("references.usl"), "2\n");
}
