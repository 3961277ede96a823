use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use stolyar_core::{GrammarBuilder, Language, Point, Production, Range};

use crate::{ExternalScanner, ExternalToken, LookaheadIterator, ParseOutcome, Parser};

fn arith() -> Language {
    GrammarBuilder::new("arith")
        .token("number", "[0-9]+")
        .token("identifier", "[A-Za-z_][A-Za-z0-9_]*")
        .literal("+")
        .literal("*")
        .literal("(")
        .literal(")")
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
        .production(
            Production::new("paren_expression")
                .sym("(")
                .sym("_expression")
                .sym(")"),
        )
        .production(Production::new("_expression").sym("binary_expression"))
        .production(Production::new("_expression").sym("paren_expression"))
        .production(Production::new("_expression").sym("number"))
        .production(Production::new("_expression").sym("identifier"))
        .build()
        .expect("arith grammar compiles")
}

fn parse(language: Language, text: &str) -> crate::Tree {
    Parser::new(language)
        .parse(text, None)
        .tree()
        .expect("parse runs to completion")
}

#[test]
fn parses_a_simple_expression() {
    let tree = parse(arith(), "1+2");
    let root = tree.root_node();
    assert_eq!(root.kind(), "program");
    assert!(!root.has_error());
    assert_eq!(root.start_byte(), 0);
    assert_eq!(root.end_byte(), 3);
    insta::assert_snapshot!(
        root.to_sexp(),
        @"(program (binary_expression left: (number) right: (number)))"
    );
}

#[test]
fn precedence_nests_the_tighter_operator() {
    let tree = parse(arith(), "1+2*3");
    insta::assert_snapshot!(
        tree.root_node().to_sexp(),
        @"(program (binary_expression left: (number) right: (binary_expression left: (number) right: (number))))"
    );
}

#[test]
fn equal_precedence_associates_left() {
    let tree = parse(arith(), "1+2+3");
    insta::assert_snapshot!(
        tree.root_node().to_sexp(),
        @"(program (binary_expression left: (binary_expression left: (number) right: (number)) right: (number)))"
    );
}

#[test]
fn parentheses_override_precedence() {
    let tree = parse(arith(), "(1+2)*3");
    insta::assert_snapshot!(
        tree.root_node().to_sexp(),
        @"(program (binary_expression left: (paren_expression (binary_expression left: (number) right: (number))) right: (number)))"
    );
}

#[test]
fn extras_are_kept_and_the_root_spans_them() {
    let tree = parse(arith(), " 1 + 2 ");
    let root = tree.root_node();
    assert!(!root.has_error());
    assert_eq!(root.start_byte(), 0);
    assert_eq!(root.end_byte(), 7);
    // Whitespace is anonymous, so the named structure is unchanged.
    insta::assert_snapshot!(
        root.to_sexp(),
        @"(program (binary_expression left: (number) right: (number)))"
    );
    let binary = root.named_child(0).expect("program has one named child");
    assert_eq!(binary.start_byte(), 1);
    assert_eq!(binary.end_byte(), 6);
}

#[test]
fn a_missing_token_is_inserted_at_end_of_input() {
    let tree = parse(arith(), "1+");
    let root = tree.root_node();
    assert!(root.has_error());
    assert_eq!(root.end_byte(), 2);
    insta::assert_snapshot!(
        root.to_sexp(),
        @"(program (binary_expression left: (number) right: (MISSING number)))"
    );
}

#[test]
fn empty_input_yields_a_zero_width_root() {
    let tree = parse(arith(), "");
    let root = tree.root_node();
    assert_eq!(root.kind(), "program");
    assert!(root.has_error());
    assert_eq!(root.start_byte(), 0);
    assert_eq!(root.end_byte(), 0);
    insta::assert_snapshot!(root.to_sexp(), @"(program (MISSING number))");
}

#[test]
fn an_unrepairable_token_is_skipped_into_an_error_node() {
    let tree = parse(arith(), "1+2 )");
    let root = tree.root_node();
    assert!(root.has_error());
    assert_eq!(root.end_byte(), 5);
    insta::assert_snapshot!(
        root.to_sexp(),
        @"(program (binary_expression left: (number) right: (number)) (ERROR))"
    );
}

#[test]
fn unlexable_bytes_coalesce_into_one_error() {
    let tree = parse(arith(), "1+2 ###");
    let root = tree.root_node();
    assert!(root.has_error());
    assert_eq!(root.end_byte(), 7);
    insta::assert_snapshot!(
        root.to_sexp(),
        @"(program (binary_expression left: (number) right: (number)) (ERROR))"
    );
}

#[test]
fn skipped_tokens_in_the_middle_stay_in_document_order() {
    let tree = parse(arith(), "1+) 2");
    let root = tree.root_node();
    assert!(root.has_error());
    assert_eq!(root.end_byte(), 5);
    insta::assert_snapshot!(
        root.to_sexp(),
        @"(program (binary_expression left: (number) (ERROR) right: (number)))"
    );
}

#[test]
fn undeclared_ambiguity_forks_and_still_parses() {
    let language = GrammarBuilder::new("flat")
        .token("number", "[0-9]+")
        .literal("+")
        .production(Production::new("program").sym("expression"))
        .production(
            Production::new("expression")
                .sym("expression")
                .sym("+")
                .sym("expression"),
        )
        .production(Production::new("expression").sym("number"))
        .build()
        .expect("flat grammar compiles");
    let tree = parse(language, "1+2+3");
    let root = tree.root_node();
    assert!(!root.has_error());
    assert_eq!(root.end_byte(), 5);
    assert_eq!(root.named_child(0).map(|n| n.kind()), Some("expression"));
}

#[test]
fn dynamic_precedence_picks_among_ambiguous_forks() {
    let language = GrammarBuilder::new("ambig")
        .token("identifier", "[a-z]+")
        .literal("*")
        .extra_anon("whitespace", "[ ]+")
        .production(Production::new("program").sym("_statement"))
        .production(Production::new("_statement").sym("multiplication"))
        .production(Production::new("_statement").sym("declaration"))
        .production(
            Production::new("multiplication")
                .sym("identifier")
                .sym("*")
                .sym("identifier"),
        )
        .production(
            Production::new("declaration")
                .sym("identifier")
                .sym("*")
                .sym("identifier")
                .dynamic_prec(1),
        )
        .build()
        .expect("ambig grammar compiles");
    let tree = parse(language, "a * b");
    let root = tree.root_node();
    assert!(!root.has_error());
    assert_eq!(root.named_child(0).map(|n| n.kind()), Some("declaration"));
}

#[test]
fn cancellation_suspends_and_a_later_call_resumes() {
    let text: String = std::iter::once("1")
        .chain(std::iter::repeat("+1").take(200))
        .collect();
    let mut parser = Parser::new(arith());
    let flag = Arc::new(AtomicUsize::new(1));
    parser.set_cancellation_flag(Some(Arc::clone(&flag)));

    assert!(matches!(parser.parse(&text, None), ParseOutcome::Cancelled));

    flag.store(0, Ordering::Relaxed);
    let tree = parser.parse(&text, None).tree().expect("resumed parse finishes");
    let root = tree.root_node();
    assert!(!root.has_error());
    assert_eq!(root.end_byte() as usize, text.len());
}

#[test]
fn timeout_suspends_and_clearing_it_resumes() {
    let text: String = std::iter::once("1")
        .chain(std::iter::repeat("+1").take(20_000))
        .collect();
    let mut parser = Parser::new(arith());
    parser.set_timeout_micros(1);

    assert!(matches!(parser.parse(&text, None), ParseOutcome::TimedOut));

    parser.set_timeout_micros(0);
    let tree = parser.parse(&text, None).tree().expect("resumed parse finishes");
    assert!(!tree.root_node().has_error());
    assert_eq!(tree.root_node().end_byte() as usize, text.len());
}

#[test]
fn deep_trees_drop_without_overflowing_the_stack() {
    let text: String = std::iter::once("1")
        .chain(std::iter::repeat("+1").take(20_000))
        .collect();
    let tree = parse(arith(), &text);
    assert_eq!(tree.root_node().end_byte() as usize, text.len());
    drop(tree);
}

#[test]
fn reset_discards_a_suspended_parse() {
    let mut parser = Parser::new(arith());
    let flag = Arc::new(AtomicUsize::new(1));
    parser.set_cancellation_flag(Some(Arc::clone(&flag)));
    assert!(matches!(parser.parse("1+1+1".repeat(100).as_str(), None), ParseOutcome::Cancelled));

    parser.reset();
    flag.store(0, Ordering::Relaxed);
    let tree = parser.parse("1+2", None).tree().expect("fresh parse finishes");
    assert!(!tree.root_node().has_error());
}

struct DoubleAt;

impl ExternalScanner for DoubleAt {
    fn scan(&mut self, text: &str, start: usize, valid: &[bool]) -> Option<ExternalToken> {
        if valid[0] && text[start..].starts_with("@@") {
            Some(ExternalToken { index: 0, len: 2 })
        } else {
            None
        }
    }
}

#[test]
fn external_scanner_tokens_take_priority() {
    let language = GrammarBuilder::new("ext")
        .token("number", "[0-9]+")
        .external("marker")
        .production(Production::new("program").sym("marker").sym("number"))
        .build()
        .expect("ext grammar compiles");
    let mut parser = Parser::new(language);
    parser.set_external_scanner(Box::new(DoubleAt));
    let tree = parser.parse("@@42", None).tree().expect("parse finishes");
    let root = tree.root_node();
    assert!(!root.has_error());
    assert_eq!(root.end_byte(), 4);
    insta::assert_snapshot!(root.to_sexp(), @"(program (marker) (number))");
}

#[test]
fn included_ranges_confine_the_parse() {
    let mut parser = Parser::new(arith());
    parser
        .set_included_ranges(vec![Range::new(1, 4, Point::new(0, 1), Point::new(0, 4))])
        .expect("ranges are valid");
    let tree = parser.parse("<1+2>", None).tree().expect("parse finishes");
    let root = tree.root_node();
    assert!(!root.has_error());
    assert_eq!(root.start_byte(), 1);
    assert_eq!(root.end_byte(), 4);
    insta::assert_snapshot!(
        root.to_sexp(),
        @"(program (binary_expression left: (number) right: (number)))"
    );
    let number = root
        .descendant_for_byte_range(1, 2)
        .expect("a node covers the range");
    assert_eq!(number.kind(), "number");
}

#[test]
fn invalid_included_ranges_are_rejected() {
    let mut parser = Parser::new(arith());
    let backwards = Range::new(3, 2, Point::new(0, 3), Point::new(0, 2));
    assert!(parser.set_included_ranges(vec![backwards]).is_err());

    let a = Range::new(0, 3, Point::ZERO, Point::new(0, 3));
    let b = Range::new(2, 5, Point::new(0, 2), Point::new(0, 5));
    assert!(parser.set_included_ranges(vec![a, b]).is_err());
}

#[test]
fn utf16_input_is_transcoded() {
    let utf16: Vec<u16> = "1+2".encode_utf16().collect();
    let mut parser = Parser::new(arith());
    let tree = parser.parse_utf16(&utf16, None).tree().expect("parse finishes");
    insta::assert_snapshot!(
        tree.root_node().to_sexp(),
        @"(program (binary_expression left: (number) right: (number)))"
    );
}

#[test]
fn lookahead_iterator_lists_expected_terminals() {
    let language = arith();
    let start = language.parse_table().start_state();
    let names = LookaheadIterator::new(language.clone(), start)
        .expect("start state is in range")
        .names();
    assert!(names.contains(&"number".to_string()));
    assert!(names.contains(&"identifier".to_string()));
    assert!(names.contains(&"(".to_string()));
    assert!(!names.contains(&"+".to_string()));

    let out_of_range = language.parse_table().state_count() as u32;
    assert!(LookaheadIterator::new(language, out_of_range).is_none());
}
