#[test]
fn a_byte_outside_the_token_catalog_is_a_lex_error() {
    let err = usl::run("let x = @;", Box::new(std::io::sink())).unwrap_err();
    assert!(matches!(err, usl::PipelineError::Lex(_)));
}

#[test]
fn a_dangling_operator_is_a_parse_error() {
    let err = usl::run("let x = 1 +;", Box::new(std::io::sink())).unwrap_err();
    assert!(matches!(err, usl::PipelineError::Parse(_)));
}

#[test]
fn looking_up_an_undeclared_name_is_a_runtime_error() {
    let err = usl::run("println(never_declared);", Box::new(std::io::sink())).unwrap_err();
    assert!(matches!(err, usl::PipelineError::Runtime(_)));
}
