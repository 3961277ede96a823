use stolyar_core::{GrammarBuilder, Language, Point, Production};
use stolyar_parser::{Parser, Tree};

use crate::error::{QueryError, QueryErrorKind};
use crate::exec::QueryCursor;
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

fn parse(language: &Language, text: &str) -> Tree {
    Parser::new(language.clone())
        .parse(text, None)
        .tree()
        .expect("parse completes")
}

#[test]
fn a_field_pattern_matches_once_with_both_captures() {
    let language = arith();
    let tree = parse(&language, "1+2");
    let query = Query::compile(
        &language,
        "(binary_expression left: (_) @l right: (_) @r)",
    )
    .unwrap();

    let mut cursor = QueryCursor::new();
    let matches: Vec<_> = cursor.matches(&query, tree.root_node()).unwrap().collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].pattern_index, 0);

    let captures = &matches[0].captures;
    assert_eq!(captures.len(), 2);
    assert_eq!(query.capture_name(captures[0].index), Some("l"));
    assert_eq!(captures[0].node.text("1+2"), "1");
    assert_eq!(query.capture_name(captures[1].index), Some("r"));
    assert_eq!(captures[1].node.text("1+2"), "2");
}

#[test]
fn anonymous_tokens_match_when_quoted() {
    let language = arith();
    let tree = parse(&language, "1+2");
    let query = Query::compile(&language, r#""+" @op"#).unwrap();

    let mut cursor = QueryCursor::new();
    let matches: Vec<_> = cursor.matches(&query, tree.root_node()).unwrap().collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].captures[0].node.text("1+2"), "+");
}

#[test]
fn the_named_wildcard_walks_in_preorder() {
    let language = arith();
    let tree = parse(&language, "1+2");
    let query = Query::compile(&language, "(_) @n").unwrap();

    let mut cursor = QueryCursor::new();
    let kinds: Vec<&str> = cursor
        .matches(&query, tree.root_node())
        .unwrap()
        .map(|m| m.captures[0].node.kind())
        .collect();
    assert_eq!(
        kinds,
        ["program", "binary_expression", "number", "number"]
    );
}

#[test]
fn overlapping_matches_all_surface() {
    let language = arith();
    let tree = parse(&language, "1+2*3");
    let query = Query::compile(&language, "(binary_expression) @b").unwrap();

    let mut cursor = QueryCursor::new();
    let spans: Vec<_> = cursor
        .matches(&query, tree.root_node())
        .unwrap()
        .map(|m| m.captures[0].node.byte_range())
        .collect();
    assert_eq!(spans, [0..5, 2..5]);
}

#[test]
fn a_field_mismatch_yields_no_match() {
    let language = arith();
    let tree = parse(&language, "1+2");
    let query = Query::compile(&language, "(binary_expression left: (identifier))").unwrap();

    let mut cursor = QueryCursor::new();
    assert_eq!(cursor.matches(&query, tree.root_node()).unwrap().count(), 0);
}

#[test]
fn negated_fields_reject_nodes_that_have_them() {
    let language = arith();
    let tree = parse(&language, "1+2");

    let mut cursor = QueryCursor::new();
    let with_left = Query::compile(&language, "(binary_expression !left) @b").unwrap();
    assert_eq!(
        cursor.matches(&with_left, tree.root_node()).unwrap().count(),
        0
    );

    // Leaves have no children at all, so any negated field holds.
    let leaves = Query::compile(&language, "(number !left) @n").unwrap();
    assert_eq!(cursor.matches(&leaves, tree.root_node()).unwrap().count(), 2);
}

#[test]
fn anchors_require_adjacency_over_named_siblings() {
    let language = arith();
    let tree = parse(&language, "1+2*3");
    // Adjacent number siblings exist only in the inner product: the outer
    // sum has a binary_expression between its numbers.
    let query = Query::compile(&language, "(binary_expression (number) . (number)) @b").unwrap();

    let mut cursor = QueryCursor::new();
    let matches: Vec<_> = cursor.matches(&query, tree.root_node()).unwrap().collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].captures[0].node.byte_range(), 2..5);
}

#[test]
fn unanchored_children_may_skip_named_siblings() {
    let language = arith();
    let tree = parse(&language, "1+2*3");
    let query = Query::compile(&language, "(binary_expression (number) (number)) @b").unwrap();

    let mut cursor = QueryCursor::new();
    // Without the anchor the outer sum does not match either: its only
    // direct number child is the left operand.
    let matches: Vec<_> = cursor.matches(&query, tree.root_node()).unwrap().collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].captures[0].node.byte_range(), 2..5);
}

#[test]
fn the_match_limit_cuts_the_run_and_sets_the_flag() {
    let language = arith();
    let tree = parse(&language, "1+2+3+4");
    let query = Query::compile(&language, "(number) @n").unwrap();

    let mut cursor = QueryCursor::new();
    cursor.set_match_limit(2);
    let matches: Vec<_> = cursor.matches(&query, tree.root_node()).unwrap().collect();
    assert_eq!(matches.len(), 2);
    assert!(cursor.did_exceed_match_limit());

    // A limit the run never reaches leaves the flag clear.
    cursor.set_match_limit(10);
    let matches: Vec<_> = cursor.matches(&query, tree.root_node()).unwrap().collect();
    assert_eq!(matches.len(), 4);
    assert!(!cursor.did_exceed_match_limit());
}

#[test]
fn byte_windows_prune_matches_outside() {
    let language = arith();
    let tree = parse(&language, "1+2*3");
    let query = Query::compile(&language, "(number) @n").unwrap();

    let mut cursor = QueryCursor::new();
    cursor.set_byte_range(2..5);
    let texts: Vec<&str> = cursor
        .matches(&query, tree.root_node())
        .unwrap()
        .map(|m| m.captures[0].node.text("1+2*3"))
        .collect();
    assert_eq!(texts, ["2", "3"]);
}

#[test]
fn point_windows_prune_matches_outside() {
    let language = arith();
    let text = "1 +\n2";
    let tree = parse(&language, text);
    let query = Query::compile(&language, "(number) @n").unwrap();

    let mut cursor = QueryCursor::new();
    cursor.set_point_range(Point::new(1, 0), Point::new(2, 0));
    let texts: Vec<&str> = cursor
        .matches(&query, tree.root_node())
        .unwrap()
        .map(|m| m.captures[0].node.text(text))
        .collect();
    assert_eq!(texts, ["2"]);
}

#[test]
fn max_start_depth_limits_where_matches_begin() {
    let language = arith();
    let tree = parse(&language, "1+2*3");
    let query = Query::compile(&language, "(binary_expression) @b").unwrap();

    let mut cursor = QueryCursor::new();
    cursor.set_max_start_depth(Some(1));
    // The outer sum sits at depth 1; the inner product at depth 2 is
    // never visited.
    assert_eq!(cursor.matches(&query, tree.root_node()).unwrap().count(), 1);

    cursor.set_max_start_depth(Some(0));
    assert_eq!(cursor.matches(&query, tree.root_node()).unwrap().count(), 0);

    cursor.set_max_start_depth(None);
    assert_eq!(cursor.matches(&query, tree.root_node()).unwrap().count(), 2);
}

#[test]
fn captures_flatten_one_item_per_capture() {
    let language = arith();
    let tree = parse(&language, "1+2");
    let query = Query::compile(
        &language,
        "(binary_expression left: (_) @l right: (_) @r)",
    )
    .unwrap();

    let mut cursor = QueryCursor::new();
    let names: Vec<&str> = cursor
        .captures(&query, tree.root_node())
        .unwrap()
        .map(|(m, i)| query.capture_name(m.captures[i].index).unwrap())
        .collect();
    assert_eq!(names, ["l", "r"]);
}

#[test]
fn nodes_for_capture_index_filters_one_binding() {
    let language = arith();
    let tree = parse(&language, "1+2");
    let query = Query::compile(
        &language,
        "(binary_expression left: (_) @l right: (_) @r)",
    )
    .unwrap();

    let mut cursor = QueryCursor::new();
    let m = cursor
        .matches(&query, tree.root_node())
        .unwrap()
        .next()
        .unwrap();
    let nodes: Vec<_> = m.nodes_for_capture_index(1).collect();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].text("1+2"), "2");
}

#[test]
fn running_against_another_languages_tree_is_an_error() {
    let language = arith();
    let other = arith();
    let tree = parse(&other, "1+2");
    let query = Query::compile(&language, "(number) @n").unwrap();

    let mut cursor = QueryCursor::new();
    let err = match cursor.matches(&query, tree.root_node()) {
        Err(err) => err,
        Ok(_) => panic!("expected a language mismatch"),
    };
    assert_eq!(
        err,
        QueryError {
            kind: QueryErrorKind::LanguageMismatch,
            offset: 0,
        }
    );
}
