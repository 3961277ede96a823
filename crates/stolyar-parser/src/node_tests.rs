use indoc::indoc;
use stolyar_core::{GrammarBuilder, Language, Point, Production};

use crate::{Parser, Tree};

fn arith() -> Language {
    GrammarBuilder::new("arith")
        .token("number", "[0-9]+")
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
        .build()
        .expect("arith grammar compiles")
}

fn parse(text: &str) -> Tree {
    Parser::new(arith())
        .parse(text, None)
        .tree()
        .expect("parse runs to completion")
}

#[test]
fn kinds_fields_and_text() {
    let text = "1+2*3";
    let tree = parse(text);
    let root = tree.root_node();
    let binary = root.child(0).expect("program has a child");
    assert_eq!(binary.kind(), "binary_expression");
    assert!(binary.is_named());

    let left = binary.child_by_field_name("left").expect("left is set");
    assert_eq!(left.kind(), "number");
    assert_eq!(left.text(text), "1");

    let right = binary.child_by_field_name("right").expect("right is set");
    assert_eq!(right.kind(), "binary_expression");
    assert_eq!(right.text(text), "2*3");
    assert_eq!(right.field_name(), Some("right"));
}

#[test]
fn named_children_exclude_operators() {
    let tree = parse("1+2");
    let binary = tree.root_node().child(0).expect("program has a child");
    assert_eq!(binary.child_count(), 3);
    assert_eq!(binary.named_child_count(), 2);

    let plus = binary.child(1).expect("operator child");
    assert_eq!(plus.kind(), "+");
    assert!(!plus.is_named());
    assert_eq!(plus.field_name(), None);
}

#[test]
fn parent_and_siblings() {
    let tree = parse("1+2");
    let binary = tree.root_node().child(0).expect("program has a child");
    let plus = binary.child(1).expect("operator child");

    assert_eq!(plus.parent(), Some(binary));
    assert_eq!(binary.parent(), Some(tree.root_node()));
    assert_eq!(tree.root_node().parent(), None);

    let prev = plus.prev_sibling().expect("left operand");
    let next = plus.next_sibling().expect("right operand");
    assert_eq!(prev.kind(), "number");
    assert_eq!(next.kind(), "number");
    assert_eq!(prev.byte_range(), 0..1);
    assert_eq!(next.byte_range(), 2..3);
    assert_eq!(prev.prev_sibling(), None);
    assert_eq!(next.next_sibling(), None);
}

#[test]
fn points_track_newlines() {
    let text = indoc! {"
        1 +
        22 *
        3
    "};
    let tree = parse(text);
    let root = tree.root_node();
    assert_eq!(root.start_position(), Point::new(0, 0));
    assert_eq!(root.end_position(), Point::new(3, 0));

    let binary = root.child(0).expect("program has a child");
    let right = binary.child_by_field_name("right").expect("right is set");
    assert_eq!(right.start_position(), Point::new(1, 0));
    assert_eq!(right.text(text), "22 *\n3");

    let last = right.child_by_field_name("right").expect("inner right");
    assert_eq!(last.start_position(), Point::new(2, 0));
    assert_eq!(last.end_position(), Point::new(2, 1));
}

#[test]
fn descendant_for_byte_range_finds_the_smallest_cover() {
    let tree = parse("1+2*3");
    let root = tree.root_node();

    let leaf = root.descendant_for_byte_range(4, 5).expect("covered");
    assert_eq!(leaf.kind(), "number");
    assert_eq!(leaf.byte_range(), 4..5);

    let inner = root.descendant_for_byte_range(2, 5).expect("covered");
    assert_eq!(inner.kind(), "binary_expression");
    assert_eq!(inner.byte_range(), 2..5);

    let whole = root.descendant_for_byte_range(0, 5).expect("covered");
    assert_eq!(whole.kind(), "binary_expression");
    assert_eq!(whole.byte_range(), 0..5);

    assert!(root.descendant_for_byte_range(0, 9).is_none());
}

#[test]
fn nodes_compare_by_identity_and_position() {
    let tree = parse("1+2");
    let a = tree.root_node().child(0).expect("child");
    let b = tree.root_node().child(0).expect("child");
    assert_eq!(a, b);
    assert_eq!(a.id(), b.id());

    let left = a.child(0).expect("left operand");
    assert_ne!(a, left);
}

#[test]
fn children_iterator_is_exact_size() {
    let tree = parse("1+2");
    let binary = tree.root_node().child(0).expect("child");
    let children = binary.children();
    assert_eq!(children.len(), 3);
    let kinds: Vec<&str> = children.map(|c| c.kind()).collect();
    assert_eq!(kinds, ["number", "+", "number"]);
}
