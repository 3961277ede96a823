use crate::grammar::Assoc;
use crate::symbol::{EOF_SYMBOL, SymbolId};
use crate::tables::{Action, ParseTable, ProdRule, build_parse_table};

const NUM: SymbolId = 1;
const PLUS: SymbolId = 2;
const EXPR: SymbolId = 3;
const TERM: SymbolId = 4;

fn rule(lhs: SymbolId, rhs: &[SymbolId], prec: Option<i32>, assoc: Assoc) -> ProdRule {
    ProdRule {
        lhs,
        rhs: rhs.iter().map(|&s| (s, None)).collect(),
        prec,
        assoc,
        dynamic_prec: 0,
    }
}

/// expr -> expr "+" term | term ; term -> num
fn unambiguous_table() -> ParseTable {
    build_parse_table(
        vec![
            rule(EXPR, &[EXPR, PLUS, TERM], None, Assoc::None),
            rule(EXPR, &[TERM], None, Assoc::None),
            rule(TERM, &[NUM], None, Assoc::None),
        ],
        EXPR,
    )
}

/// Deterministic single-action LR driver over the table.
fn drive(table: &ParseTable, input: &[SymbolId]) -> bool {
    let mut stack = vec![table.start_state()];
    let mut pos = 0;
    loop {
        let lookahead = input.get(pos).copied().unwrap_or(EOF_SYMBOL);
        let state = *stack.last().unwrap();
        let actions = table.state(state).actions(lookahead);
        match actions.first() {
            Some(Action::Shift(next)) => {
                stack.push(*next);
                pos += 1;
            }
            Some(Action::Reduce(prod)) => {
                let p = table.prod(*prod);
                for _ in 0..p.rhs.len() {
                    stack.pop();
                }
                let top = *stack.last().unwrap();
                let next = table.state(top).goto(p.lhs).expect("goto after reduce");
                stack.push(next);
            }
            Some(Action::Accept) => return true,
            None => return false,
        }
    }
}

#[test]
fn accepts_valid_input() {
    let table = unambiguous_table();
    assert!(drive(&table, &[NUM]));
    assert!(drive(&table, &[NUM, PLUS, NUM]));
    assert!(drive(&table, &[NUM, PLUS, NUM, PLUS, NUM]));
}

#[test]
fn rejects_invalid_input() {
    let table = unambiguous_table();
    assert!(!drive(&table, &[PLUS]));
    assert!(!drive(&table, &[NUM, PLUS]));
    assert!(!drive(&table, &[NUM, NUM]));
}

#[test]
fn unambiguous_grammar_has_single_actions() {
    let table = unambiguous_table();
    for s in 0..table.state_count() {
        let state = table.state(s as u32);
        for t in state.expected_terminals() {
            assert!(
                state.actions(t).len() == 1,
                "state {s} terminal {t} has {} actions",
                state.actions(t).len()
            );
        }
    }
}

/// expr -> expr "+" expr | num, no precedence: the classic shift/reduce
/// conflict must survive into the table for GLR forking.
#[test]
fn undeclared_ambiguity_is_kept() {
    let table = build_parse_table(
        vec![
            rule(EXPR, &[EXPR, PLUS, EXPR], None, Assoc::None),
            rule(EXPR, &[NUM], None, Assoc::None),
        ],
        EXPR,
    );
    let conflicted = (0..table.state_count()).any(|s| {
        let state = table.state(s as u32);
        state.expected_terminals().any(|t| state.actions(t).len() > 1)
    });
    assert!(conflicted, "expected an unresolved shift/reduce conflict");
}

/// The same grammar with prec_left resolves every conflict at build time.
#[test]
fn left_associativity_resolves_conflict() {
    let table = build_parse_table(
        vec![
            rule(EXPR, &[EXPR, PLUS, EXPR], Some(1), Assoc::Left),
            rule(EXPR, &[NUM], None, Assoc::None),
        ],
        EXPR,
    );
    for s in 0..table.state_count() {
        let state = table.state(s as u32);
        for t in state.expected_terminals() {
            assert_eq!(state.actions(t).len(), 1, "state {s} terminal {t}");
        }
    }
    assert!(drive(&table, &[NUM, PLUS, NUM, PLUS, NUM]));
}

/// Higher-precedence reduction wins over a lower-precedence shift.
#[test]
fn precedence_orders_operators() {
    const STAR: SymbolId = 5;
    let table = build_parse_table(
        vec![
            rule(EXPR, &[EXPR, PLUS, EXPR], Some(1), Assoc::Left),
            rule(EXPR, &[EXPR, STAR, EXPR], Some(2), Assoc::Left),
            rule(EXPR, &[NUM], None, Assoc::None),
        ],
        EXPR,
    );
    for s in 0..table.state_count() {
        let state = table.state(s as u32);
        for t in state.expected_terminals() {
            assert_eq!(state.actions(t).len(), 1, "state {s} terminal {t}");
        }
    }
    assert!(drive(&table, &[NUM, STAR, NUM, PLUS, NUM, STAR, NUM]));
}

#[test]
fn epsilon_production_reduces() {
    // list -> item list | ε ; item -> num
    const LIST: SymbolId = 6;
    const ITEM: SymbolId = 7;
    let table = build_parse_table(
        vec![
            rule(LIST, &[ITEM, LIST], None, Assoc::None),
            rule(LIST, &[], None, Assoc::None),
            rule(ITEM, &[NUM], None, Assoc::None),
        ],
        LIST,
    );
    assert!(drive(&table, &[]));
    assert!(drive(&table, &[NUM, NUM, NUM]));
}
