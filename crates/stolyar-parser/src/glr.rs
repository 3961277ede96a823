//! Parallel parse stacks.
//!
//! Conflicted table entries fork the stack; stacks that reach the same state
//! sequence are merged back, keeping the cheapest. The set of live stacks is
//! bounded, so pathological ambiguity degrades to a beam search instead of
//! exponential blowup.

use stolyar_core::{Action, Language, ProdId, StateId, SymbolId, SymbolKind};

use crate::subtree::{ChildSlot, Subtree, SubtreeData};

/// Reductions applied per token before a stack is considered divergent.
/// Guards against reduction cycles through empty rules.
const MAX_REDUCTIONS_PER_TOKEN: usize = 1024;

#[derive(Debug, Clone)]
pub(crate) struct StackEntry {
    pub state: StateId,
    /// `None` only for the bottom-of-stack entry.
    pub subtree: Option<Subtree>,
    /// Extras and flushed ERROR nodes sit on the stack without consuming a
    /// grammar symbol; reductions carry them into whichever node pops them.
    pub is_extra: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ParseStack {
    pub entries: Vec<StackEntry>,
    /// Accumulated error-recovery cost. Lower is better.
    pub error_cost: u32,
    /// Accumulated dynamic precedence of every reduction on this stack.
    pub dynamic_prec: i64,
    /// Creation order, for deterministic pruning among equals.
    pub serial: u64,
}

impl ParseStack {
    pub fn start(state: StateId) -> ParseStack {
        ParseStack {
            entries: vec![StackEntry {
                state,
                subtree: None,
                is_extra: false,
            }],
            error_cost: 0,
            dynamic_prec: 0,
            serial: 0,
        }
    }

    pub fn top_state(&self) -> StateId {
        self.entries.last().expect("stack always has a bottom entry").state
    }

    pub fn push(&mut self, subtree: Subtree, state: StateId) {
        self.entries.push(StackEntry {
            state,
            subtree: Some(subtree),
            is_extra: false,
        });
    }

    /// Push a node that does not consume a grammar symbol (extras, flushed
    /// ERROR nodes). The parse state is unchanged.
    pub fn push_extra(&mut self, subtree: Subtree) {
        let state = self.top_state();
        self.entries.push(StackEntry {
            state,
            subtree: Some(subtree),
            is_extra: true,
        });
    }

    /// Apply one reduction. Returns false when the goto table has no entry,
    /// which kills this stack.
    pub fn reduce(&mut self, prod_id: ProdId, language: &Language) -> bool {
        let table = language.parse_table();
        let prod = table.prod(prod_id);
        let arity = prod.rhs.len();

        // Extras interleaved between the children are popped with them, but
        // extras above the last child stay on the stack: they follow the
        // node, not belong to it.
        let mut trailing: Vec<StackEntry> = Vec::new();
        while arity > 0 && self.entries.last().is_some_and(|e| e.is_extra) {
            trailing.push(self.entries.pop().expect("just checked"));
        }
        let mut popped: Vec<StackEntry> = Vec::with_capacity(arity);
        let mut grammar_seen = 0;
        while grammar_seen < arity {
            let entry = self.entries.pop().expect("reduction arity exceeds stack");
            if !entry.is_extra {
                grammar_seen += 1;
            }
            popped.push(entry);
        }
        popped.reverse();

        let mut children: Vec<ChildSlot> = Vec::with_capacity(popped.len());
        let mut slot = 0;
        for entry in popped {
            let subtree = entry.subtree.expect("bottom entry is never reduced");
            let field = if entry.is_extra {
                None
            } else {
                let f = prod.rhs[slot].1;
                slot += 1;
                f
            };
            // Hidden rule nodes dissolve into their parent; a field on the
            // hidden node carries over to spliced children without one.
            if subtree.hidden && !subtree.is_error {
                children.extend(subtree.children.iter().map(|slot| ChildSlot {
                    field: slot.field.or(field),
                    subtree: slot.subtree.clone(),
                }));
            } else {
                children.push(ChildSlot { field, subtree });
            }
        }

        let info = language.symbol(prod.lhs);
        let node = SubtreeData::internal(
            prod.lhs,
            children,
            info.is_named(),
            info.kind == SymbolKind::Auxiliary,
        );
        let Some(next) = table.state(self.top_state()).goto(prod.lhs) else {
            return false;
        };
        self.push(node, next);
        for entry in trailing.into_iter().rev() {
            self.push_extra(entry.subtree.expect("extras always carry a subtree"));
        }
        self.dynamic_prec += i64::from(prod.dynamic_prec);
        true
    }

    /// The state sequence, used to merge stacks that converged.
    pub fn signature(&self) -> Vec<StateId> {
        self.entries.iter().map(|e| e.state).collect()
    }

    pub fn shift_action(&self, language: &Language, lookahead: SymbolId) -> Option<StateId> {
        let table = language.parse_table();
        table
            .state(self.top_state())
            .actions(lookahead)
            .iter()
            .find_map(|a| match a {
                Action::Shift(next) => Some(*next),
                _ => None,
            })
    }

    pub fn can_accept(&self, language: &Language, lookahead: SymbolId) -> bool {
        language
            .parse_table()
            .state(self.top_state())
            .actions(lookahead)
            .contains(&Action::Accept)
    }

    /// Whether shifting or accepting `lookahead` is possible right now.
    pub fn can_advance(&self, language: &Language, lookahead: SymbolId) -> bool {
        language
            .parse_table()
            .state(self.top_state())
            .actions(lookahead)
            .iter()
            .any(|a| matches!(a, Action::Shift(_) | Action::Accept))
    }
}

pub(crate) struct ReduceOutcome {
    /// Stacks that can now shift or accept the lookahead.
    pub ready: Vec<ParseStack>,
    /// Stacks with no action on the lookahead; candidates for recovery.
    pub stuck: Vec<ParseStack>,
}

/// Run every reduction available for `lookahead` on every stack, forking on
/// conflicts, until each surviving stack is ready to advance or stuck.
pub(crate) fn reduce_for_lookahead(
    stacks: Vec<ParseStack>,
    lookahead: SymbolId,
    language: &Language,
    next_serial: &mut u64,
) -> ReduceOutcome {
    let table = language.parse_table();
    let mut ready = Vec::new();
    let mut stuck = Vec::new();
    let mut worklist = stacks;
    let mut fuel = MAX_REDUCTIONS_PER_TOKEN;

    while let Some(stack) = worklist.pop() {
        let actions = table.state(stack.top_state()).actions(lookahead);
        let can_advance = actions
            .iter()
            .any(|a| matches!(a, Action::Shift(_) | Action::Accept));
        let reduces: Vec<ProdId> = actions
            .iter()
            .filter_map(|a| match a {
                Action::Reduce(p) => Some(*p),
                _ => None,
            })
            .collect();

        if reduces.is_empty() {
            if can_advance {
                ready.push(stack);
            } else {
                stuck.push(stack);
            }
            continue;
        }
        if fuel < reduces.len() {
            tracing::debug!(serial = stack.serial, "reduction fuel exhausted, dropping stack");
            stuck.push(stack);
            continue;
        }
        fuel -= reduces.len();

        // A shift/reduce conflict keeps the pre-reduction stack alive too.
        if can_advance {
            ready.push(stack.clone());
        }
        for (i, prod) in reduces.into_iter().enumerate() {
            let mut fork = stack.clone();
            if i > 0 || can_advance {
                *next_serial += 1;
                fork.serial = *next_serial;
            }
            if fork.reduce(prod, language) {
                worklist.push(fork);
            }
        }
    }

    ReduceOutcome { ready, stuck }
}

/// Merge stacks that converged to the same state sequence and cap the total.
/// Keeps the cheapest by error cost, then the highest dynamic precedence,
/// then the earliest created.
pub(crate) fn dedupe_and_prune(stacks: &mut Vec<ParseStack>, max_forks: usize) {
    stacks.sort_by(|a, b| {
        a.error_cost
            .cmp(&b.error_cost)
            .then(b.dynamic_prec.cmp(&a.dynamic_prec))
            .then(a.serial.cmp(&b.serial))
    });
    let mut seen: Vec<Vec<StateId>> = Vec::new();
    stacks.retain(|s| {
        let sig = s.signature();
        if seen.contains(&sig) {
            false
        } else {
            seen.push(sig);
            true
        }
    });
    if stacks.len() > max_forks {
        tracing::debug!(dropped = stacks.len() - max_forks, "pruning parse stacks");
        stacks.truncate(max_forks);
    }
}
