mod common;

use common::run_demo;

#[test]
fn precedence_matches_standard_operator_precedence() {
    assert_eq!(run_demo("arithmetic.usl"), "14\n");
}
