use stolyar_parser::{Parser, Tree};

use super::*;

fn parse(language: &Language, text: &str) -> Tree {
    Parser::new(language.clone())
        .parse(text, None)
        .tree()
        .expect("parse completes")
}

#[test]
fn resolves_by_name_and_alias() {
    assert_eq!(from_name("arithmetic").unwrap().name(), "arithmetic");
    assert_eq!(from_name("ARITH").unwrap().name(), "arithmetic");
    assert_eq!(from_name("json").unwrap().name(), "json_mini");
    assert!(from_name("unknown").is_none());
}

#[test]
fn resolves_by_extension() {
    assert_eq!(from_ext("arith").unwrap().name(), "arithmetic");
    assert_eq!(from_ext("JSON").unwrap().name(), "json_mini");
    assert!(from_ext("xml").is_none());
}

#[test]
fn all_lists_every_builtin() {
    let names: Vec<_> = all().iter().map(|l| l.name().to_string()).collect();
    assert_eq!(names, ["arithmetic", "json_mini"]);
}

#[test]
fn languages_are_compiled_once() {
    assert!(Language::same(&arithmetic(), &arithmetic()));
    assert!(!Language::same(&arithmetic(), &json_mini()));
}

#[test]
fn arithmetic_parses_with_precedence() {
    let language = arithmetic();
    let tree = parse(&language, "1 + 2 * x");
    insta::assert_snapshot!(
        tree.root_node().to_sexp(),
        @"(program (binary_expression left: (number) right: (binary_expression left: (number) right: (identifier))))"
    );
}

#[test]
fn arithmetic_keeps_comments_as_extras() {
    let language = arithmetic();
    let tree = parse(&language, "x # trailing note");
    insta::assert_snapshot!(
        tree.root_node().to_sexp(),
        @"(program (identifier) (comment))"
    );
}

#[test]
fn json_mini_parses_nested_values() {
    let language = json_mini();
    let tree = parse(&language, r#"{"a": [1, true, null], "b": -2.5}"#);
    insta::assert_snapshot!(
        tree.root_node().to_sexp(),
        @"(document (object (pair key: (string) value: (array (number) (true) (null))) (pair key: (string) value: (number))))"
    );
}

#[test]
fn json_mini_flags_garbage_as_errors() {
    let language = json_mini();
    let tree = parse(&language, "[1, %]");
    assert!(tree.root_node().has_error());
}
