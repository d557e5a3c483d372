mod common;

use common::run_demo;

#[test]
fn while_loop_counts_down_to_zero() {
    assert_eq!(run_demo("while_loop.usl"), "3\n2\n1\n");
}

#[test]
fn for_loop_break_stops_before_the_marked_index() {
    assert_eq!(run_demo("for_loop_break.usl"), "0\n1\n2\n");
}
