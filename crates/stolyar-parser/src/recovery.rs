//! Error recovery: missing-token insertion and token skipping.
//!
//! Recovery runs only when no live stack can act on the lookahead. It first
//! tries to insert a single zero-width "missing" terminal; if that does not
//! make the lookahead shiftable, the parser skips the token into a pending
//! ERROR node and retries with the next one.

use stolyar_core::{EOF_SYMBOL, Language, SymbolId};

use crate::glr::{self, ParseStack};
use crate::subtree::{ChildSlot, Subtree, SubtreeData};

pub(crate) const MISSING_TOKEN_COST: u32 = 110;
pub(crate) const SKIPPED_TOKEN_COST: u32 = 100;
/// Consecutive tokens recovery may skip before abandoning resynchronization.
pub(crate) const MAX_SKIPPED_TOKENS: usize = 32;

/// Repair `stacks` by inserting one zero-width missing terminal so that
/// `lookahead` becomes shiftable.
///
/// Candidates are the terminals the stack's state expects, tried in table
/// order; an insertion is kept only when the reductions it enables leave the
/// real lookahead shiftable. At most one repaired stack is produced per
/// input stack, so recovery never multiplies ambiguity.
pub(crate) fn insert_missing(
    stacks: &[ParseStack],
    lookahead: SymbolId,
    language: &Language,
    next_serial: &mut u64,
) -> Vec<ParseStack> {
    let table = language.parse_table();
    let mut repaired = Vec::new();

    for stack in stacks {
        let expected: Vec<SymbolId> = table
            .state(stack.top_state())
            .expected_terminals()
            .filter(|&t| t != EOF_SYMBOL && t != language.error_symbol())
            .collect();

        'candidates: for candidate in expected {
            let mut probe = stack.clone();
            *next_serial += 1;
            probe.serial = *next_serial;
            probe.error_cost += MISSING_TOKEN_COST;

            // Reductions the candidate enables must run before it can shift.
            let outcome = glr::reduce_for_lookahead(vec![probe], candidate, language, next_serial);
            for mut ready in outcome.ready {
                let Some(next) = ready.shift_action(language, candidate) else {
                    continue;
                };
                ready.push(SubtreeData::missing_leaf(candidate), next);

                // Validate with one token of real lookahead before keeping
                // the insertion.
                let check =
                    glr::reduce_for_lookahead(vec![ready.clone()], lookahead, language, next_serial);
                if check.ready.iter().any(|s| s.can_advance(language, lookahead)) {
                    tracing::debug!(
                        missing = language.symbol_name(candidate),
                        "inserted missing token"
                    );
                    repaired.push(ready);
                    break 'candidates;
                }
            }
        }
    }
    repaired
}

/// Wrap skipped tokens into a single ERROR node.
pub(crate) fn wrap_skipped(language: &Language, skipped: Vec<Subtree>) -> Subtree {
    let children = skipped
        .into_iter()
        .map(|subtree| ChildSlot {
            field: None,
            subtree,
        })
        .collect();
    SubtreeData::error_node(language.error_symbol(), children)
}
