use indoc::indoc;
use stolyar_core::{GrammarBuilder, Language, Production};

use crate::error::{QueryError, QueryErrorKind};
use crate::pattern::{QueryPredicate, QueryPredicateStep};
use crate::query::Query;

fn arith() -> Language {
    GrammarBuilder::new("arith")
        .token("number", "[0-9]+")
        .token("identifier", "[a-z]+")
        .literal("+")
        .literal("*")
        .extra_anon("whitespace", "[ \\t\\n]+")
        .production(Production::new("program").sym("_expression"))
        .production(
            Production::new("binary_expression")
                .field("left", "_expression")
                .sym("+")
                .field("right", "_expression")
                .prec_left(1),
        )
        .production(
            Production::new("binary_expression")
                .field("left", "_expression")
                .sym("*")
                .field("right", "_expression")
                .prec_left(2),
        )
        .production(Production::new("_expression").sym("binary_expression"))
        .production(Production::new("_expression").sym("number"))
        .production(Production::new("_expression").sym("identifier"))
        .build()
        .expect("grammar compiles")
}

#[test]
fn compiles_a_field_pattern() {
    let language = arith();
    let query = Query::compile(
        &language,
        "(binary_expression left: (_) @l right: (_) @r)",
    )
    .unwrap();
    assert_eq!(query.pattern_count(), 1);
    assert_eq!(query.capture_names().collect::<Vec<_>>(), ["l", "r"]);
    assert_eq!(query.capture_name(0), Some("l"));
    assert_eq!(query.capture_index_for_name("r"), Some(1));
    assert_eq!(query.capture_index_for_name("missing"), None);
}

#[test]
fn multiple_patterns_share_one_capture_table() {
    let language = arith();
    let query = Query::compile(
        &language,
        indoc! {r#"
            ; operands of additions
            (binary_expression left: (number) @lhs)
            (identifier) @name
        "#},
    )
    .unwrap();
    assert_eq!(query.pattern_count(), 2);
    insta::assert_debug_snapshot!(query.capture_names().collect::<Vec<_>>(), @r#"
    [
        "lhs",
        "name",
    ]
    "#);
}

#[test]
fn predicates_are_parsed_but_not_interpreted() {
    let language = arith();
    let query = Query::compile(&language, r#"((number) @n (#eq? @n "1"))"#).unwrap();
    assert_eq!(query.pattern_count(), 1);
    assert_eq!(query.capture_names().collect::<Vec<_>>(), ["n"]);
    assert_eq!(
        query.predicates(0),
        [QueryPredicate {
            operator: "eq?".to_string(),
            args: vec![
                QueryPredicateStep::Capture(0),
                QueryPredicateStep::Literal("1".to_string()),
            ],
        }]
    );
}

#[test]
fn bare_identifier_predicate_args_are_literals() {
    let language = arith();
    let query = Query::compile(&language, "((identifier) @id (#set! kind local))").unwrap();
    assert_eq!(
        query.predicates(0),
        [QueryPredicate {
            operator: "set!".to_string(),
            args: vec![
                QueryPredicateStep::Literal("kind".to_string()),
                QueryPredicateStep::Literal("local".to_string()),
            ],
        }]
    );
}

#[test]
fn negated_fields_and_anchors_compile() {
    let language = arith();
    assert!(Query::compile(&language, "(binary_expression !left)").is_ok());
    assert!(Query::compile(&language, "(binary_expression . (number))").is_ok());
    assert!(Query::compile(&language, "(binary_expression (number) .)").is_ok());
}

#[test]
fn unknown_node_kind_is_rejected_with_its_offset() {
    let language = arith();
    assert_eq!(
        Query::compile(&language, "(frobnicate)").unwrap_err(),
        QueryError {
            kind: QueryErrorKind::NodeType,
            offset: 1,
        }
    );
}

#[test]
fn unknown_anonymous_token_is_rejected() {
    let language = arith();
    assert_eq!(
        Query::compile(&language, r#""-" @op"#).unwrap_err(),
        QueryError {
            kind: QueryErrorKind::NodeType,
            offset: 0,
        }
    );
}

#[test]
fn unknown_field_is_rejected_with_its_offset() {
    let language = arith();
    assert_eq!(
        Query::compile(&language, "(binary_expression bogus: (number))").unwrap_err(),
        QueryError {
            kind: QueryErrorKind::Field,
            offset: 19,
        }
    );
}

#[test]
fn predicates_may_only_name_bound_captures() {
    let language = arith();
    assert_eq!(
        Query::compile(&language, r#"((number) @n (#eq? @m "1"))"#).unwrap_err(),
        QueryError {
            kind: QueryErrorKind::Capture,
            offset: 19,
        }
    );
}

#[test]
fn an_empty_node_is_malformed() {
    let language = arith();
    assert_eq!(
        Query::compile(&language, "()").unwrap_err(),
        QueryError {
            kind: QueryErrorKind::Structure,
            offset: 1,
        }
    );
}

#[test]
fn a_top_level_predicate_is_malformed() {
    let language = arith();
    assert_eq!(
        Query::compile(&language, r#"(#eq? @x "1")"#).unwrap_err(),
        QueryError {
            kind: QueryErrorKind::Structure,
            offset: 0,
        }
    );
}

#[test]
fn a_sibling_group_is_malformed() {
    let language = arith();
    let err = Query::compile(&language, "((number) (identifier))").unwrap_err();
    assert_eq!(err.kind, QueryErrorKind::Structure);
}

#[test]
fn unbalanced_parentheses_are_a_syntax_error() {
    let language = arith();
    assert_eq!(
        Query::compile(&language, "(number").unwrap_err(),
        QueryError {
            kind: QueryErrorKind::Syntax,
            offset: 7,
        }
    );
}

#[test]
fn an_unrecognized_byte_is_a_syntax_error() {
    let language = arith();
    assert_eq!(
        Query::compile(&language, "%").unwrap_err(),
        QueryError {
            kind: QueryErrorKind::Syntax,
            offset: 0,
        }
    );
}

#[test]
fn comments_and_whitespace_are_ignored() {
    let language = arith();
    let query = Query::compile(
        &language,
        "; leading comment\n  (number) @n ; trailing comment",
    )
    .unwrap();
    assert_eq!(query.pattern_count(), 1);
}
