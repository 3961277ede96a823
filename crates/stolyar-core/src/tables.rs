//! SLR(1) action/goto table construction.
//!
//! Conflicts that survive declared precedence/associativity are *kept*: the
//! GLR runtime forks one stack per action. Table entries are sorted by symbol
//! and binary searched.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::grammar::Assoc;
use crate::symbol::{EOF_SYMBOL, FieldId, SymbolId};

pub type StateId = u32;
pub type ProdId = u32;

/// Sentinel left-hand side for the internal augmented production.
const AUGMENTED: SymbolId = SymbolId::MAX;

/// A symbol-resolved production.
#[derive(Debug, Clone)]
pub struct ProdRule {
    pub lhs: SymbolId,
    pub rhs: Vec<(SymbolId, Option<FieldId>)>,
    pub prec: Option<i32>,
    pub assoc: Assoc,
    pub dynamic_prec: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Reduce(ProdId),
    Accept,
}

/// One row of the parse table.
#[derive(Debug, Clone, Default)]
pub struct ParseState {
    /// Sorted by terminal symbol; each entry may hold several actions (GLR).
    actions: Vec<(SymbolId, Vec<Action>)>,
    /// Sorted by nonterminal symbol.
    gotos: Vec<(SymbolId, StateId)>,
}

impl ParseState {
    /// Actions for a terminal, empty if the terminal is unexpected here.
    pub fn actions(&self, symbol: SymbolId) -> &[Action] {
        self.actions
            .binary_search_by_key(&symbol, |(s, _)| *s)
            .map(|idx| self.actions[idx].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn goto(&self, symbol: SymbolId) -> Option<StateId> {
        self.gotos
            .binary_search_by_key(&symbol, |(s, _)| *s)
            .ok()
            .map(|idx| self.gotos[idx].1)
    }

    pub fn has_actions(&self, symbol: SymbolId) -> bool {
        !self.actions(symbol).is_empty()
    }

    /// Terminals with at least one action in this state.
    pub fn expected_terminals(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.actions.iter().map(|(s, _)| *s)
    }
}

/// Compiled action/goto tables plus the productions they reference.
#[derive(Debug, Clone)]
pub struct ParseTable {
    states: Vec<ParseState>,
    prods: Vec<ProdRule>,
    start_state: StateId,
}

impl ParseTable {
    pub fn state(&self, id: StateId) -> &ParseState {
        &self.states[id as usize]
    }

    pub fn prod(&self, id: ProdId) -> &ProdRule {
        &self.prods[id as usize]
    }

    pub fn start_state(&self) -> StateId {
        self.start_state
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

/// An LR(0) item: position of the dot inside a production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Item {
    prod: ProdId,
    dot: u32,
}

struct Builder {
    prods: Vec<ProdRule>,
    /// Productions grouped by left-hand side.
    by_lhs: HashMap<SymbolId, Vec<ProdId>>,
    nonterminals: HashSet<SymbolId>,
    first: HashMap<SymbolId, HashSet<SymbolId>>,
    follow: HashMap<SymbolId, HashSet<SymbolId>>,
    nullable: HashSet<SymbolId>,
}

/// Build the SLR(1) table for `prods` with `root` as the start symbol.
pub(crate) fn build_parse_table(mut prods: Vec<ProdRule>, root: SymbolId) -> ParseTable {
    prods.push(ProdRule {
        lhs: AUGMENTED,
        rhs: vec![(root, None)],
        prec: None,
        assoc: Assoc::None,
        dynamic_prec: 0,
    });
    let augmented: ProdId = (prods.len() - 1) as ProdId;

    let mut by_lhs: HashMap<SymbolId, Vec<ProdId>> = HashMap::new();
    let mut nonterminals = HashSet::new();
    for (i, p) in prods.iter().enumerate() {
        by_lhs.entry(p.lhs).or_default().push(i as ProdId);
        nonterminals.insert(p.lhs);
    }

    let mut builder = Builder {
        prods,
        by_lhs,
        nonterminals,
        first: HashMap::new(),
        follow: HashMap::new(),
        nullable: HashSet::new(),
    };
    builder.compute_nullable();
    builder.compute_first();
    builder.compute_follow(augmented);
    builder.build_states(augmented)
}

impl Builder {
    fn is_terminal(&self, sym: SymbolId) -> bool {
        !self.nonterminals.contains(&sym)
    }

    fn compute_nullable(&mut self) {
        loop {
            let mut changed = false;
            for p in &self.prods {
                if !self.nullable.contains(&p.lhs)
                    && p.rhs.iter().all(|(s, _)| self.nullable.contains(s))
                {
                    self.nullable.insert(p.lhs);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn compute_first(&mut self) {
        for &nt in &self.nonterminals {
            self.first.insert(nt, HashSet::new());
        }
        loop {
            let mut changed = false;
            for p in &self.prods {
                let mut addition: Vec<SymbolId> = Vec::new();
                for (sym, _) in &p.rhs {
                    if self.is_terminal(*sym) {
                        addition.push(*sym);
                        break;
                    }
                    addition.extend(self.first[sym].iter().copied());
                    if !self.nullable.contains(sym) {
                        break;
                    }
                }
                let set = self.first.get_mut(&p.lhs).expect("lhs is a nonterminal");
                for s in addition {
                    changed |= set.insert(s);
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn first_of_seq(&self, seq: &[(SymbolId, Option<FieldId>)]) -> (HashSet<SymbolId>, bool) {
        let mut out = HashSet::new();
        for (sym, _) in seq {
            if self.is_terminal(*sym) {
                out.insert(*sym);
                return (out, false);
            }
            out.extend(self.first[sym].iter().copied());
            if !self.nullable.contains(sym) {
                return (out, false);
            }
        }
        (out, true)
    }

    fn compute_follow(&mut self, augmented: ProdId) {
        for &nt in &self.nonterminals {
            self.follow.insert(nt, HashSet::new());
        }
        let aug_lhs = self.prods[augmented as usize].lhs;
        self.follow
            .get_mut(&aug_lhs)
            .expect("augmented lhs registered")
            .insert(EOF_SYMBOL);

        loop {
            let mut changed = false;
            for p in &self.prods {
                for (i, (sym, _)) in p.rhs.iter().enumerate() {
                    if self.is_terminal(*sym) {
                        continue;
                    }
                    let (first_rest, rest_nullable) = self.first_of_seq(&p.rhs[i + 1..]);
                    let mut addition: Vec<SymbolId> = first_rest.into_iter().collect();
                    if rest_nullable {
                        addition.extend(self.follow[&p.lhs].iter().copied());
                    }
                    let set = self.follow.get_mut(sym).expect("nonterminal registered");
                    for s in addition {
                        changed |= set.insert(s);
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn closure(&self, kernel: &BTreeSet<Item>) -> BTreeSet<Item> {
        let mut items = kernel.clone();
        let mut work: Vec<Item> = items.iter().copied().collect();
        while let Some(item) = work.pop() {
            let p = &self.prods[item.prod as usize];
            let Some((sym, _)) = p.rhs.get(item.dot as usize) else {
                continue;
            };
            if self.is_terminal(*sym) {
                continue;
            }
            for &prod in self.by_lhs.get(sym).map(Vec::as_slice).unwrap_or(&[]) {
                let new = Item { prod, dot: 0 };
                if items.insert(new) {
                    work.push(new);
                }
            }
        }
        items
    }

    fn build_states(self, augmented: ProdId) -> ParseTable {
        let start_kernel: BTreeSet<Item> = [Item {
            prod: augmented,
            dot: 0,
        }]
        .into();

        let mut kernels: Vec<BTreeSet<Item>> = vec![start_kernel.clone()];
        let mut ids: HashMap<BTreeSet<Item>, StateId> = HashMap::new();
        ids.insert(start_kernel, 0);

        // (state, symbol) -> successor, filled during exploration
        let mut transitions: HashMap<(StateId, SymbolId), StateId> = HashMap::new();

        let mut next = 0usize;
        while next < kernels.len() {
            let state = next as StateId;
            let items = self.closure(&kernels[next]);
            next += 1;

            // Group advanceable items by the symbol after the dot.
            let mut by_sym: HashMap<SymbolId, BTreeSet<Item>> = HashMap::new();
            for item in &items {
                let p = &self.prods[item.prod as usize];
                if let Some((sym, _)) = p.rhs.get(item.dot as usize) {
                    by_sym.entry(*sym).or_default().insert(Item {
                        prod: item.prod,
                        dot: item.dot + 1,
                    });
                }
            }

            let mut symbols: Vec<SymbolId> = by_sym.keys().copied().collect();
            symbols.sort_unstable();
            for sym in symbols {
                let kernel = by_sym.remove(&sym).expect("grouped above");
                let target = *ids.entry(kernel.clone()).or_insert_with(|| {
                    kernels.push(kernel);
                    (kernels.len() - 1) as StateId
                });
                transitions.insert((state, sym), target);
            }
        }

        let mut states = Vec::with_capacity(kernels.len());
        for (idx, kernel) in kernels.iter().enumerate() {
            let state = idx as StateId;
            let items = self.closure(kernel);

            let mut actions: HashMap<SymbolId, Vec<Action>> = HashMap::new();
            let mut gotos: Vec<(SymbolId, StateId)> = Vec::new();

            for item in &items {
                let p = &self.prods[item.prod as usize];
                match p.rhs.get(item.dot as usize) {
                    Some((sym, _)) => {
                        let target = transitions[&(state, *sym)];
                        if self.is_terminal(*sym) {
                            let entry = actions.entry(*sym).or_default();
                            if !entry.contains(&Action::Shift(target)) {
                                entry.push(Action::Shift(target));
                            }
                        } else if !gotos.iter().any(|(s, _)| s == sym) {
                            gotos.push((*sym, target));
                        }
                    }
                    None if item.prod == augmented => {
                        actions.entry(EOF_SYMBOL).or_default().push(Action::Accept);
                    }
                    None => {
                        for &t in &self.follow[&p.lhs] {
                            let entry = actions.entry(t).or_default();
                            if !entry.contains(&Action::Reduce(item.prod)) {
                                entry.push(Action::Reduce(item.prod));
                            }
                        }
                    }
                }
            }

            let mut resolved: Vec<(SymbolId, Vec<Action>)> = actions
                .into_iter()
                .map(|(sym, acts)| {
                    let acts = self.resolve_conflicts(&items, sym, acts);
                    (sym, acts)
                })
                .collect();
            resolved.sort_unstable_by_key(|(s, _)| *s);
            gotos.sort_unstable_by_key(|(s, _)| *s);

            states.push(ParseState {
                actions: resolved,
                gotos,
            });
        }

        ParseTable {
            states,
            prods: self.prods,
            start_state: 0,
        }
    }

    /// Apply declared precedence/associativity to a conflicting action set.
    ///
    /// Anything left unresolved stays in the table and forks at runtime.
    fn resolve_conflicts(
        &self,
        items: &BTreeSet<Item>,
        symbol: SymbolId,
        mut actions: Vec<Action>,
    ) -> Vec<Action> {
        // Deterministic order: shifts, then reduces by production index.
        actions.sort_unstable_by_key(|a| match a {
            Action::Accept => (0, 0),
            Action::Shift(_) => (1, 0),
            Action::Reduce(p) => (2, *p),
        });

        if actions.len() < 2 {
            return actions;
        }

        // Precedence of the in-progress productions that shift `symbol`:
        // usable only when every such production agrees.
        let shift_prec = {
            let mut precs = items
                .iter()
                .filter(|item| {
                    let p = &self.prods[item.prod as usize];
                    p.rhs.get(item.dot as usize).map(|(s, _)| *s) == Some(symbol)
                })
                .map(|item| self.prods[item.prod as usize].prec);
            match precs.next() {
                Some(first) if precs.all(|p| p == first) => first,
                _ => None,
            }
        };

        let mut drop_shift = false;
        let mut kept: Vec<Action> = Vec::with_capacity(actions.len());
        let mut reduces: Vec<ProdId> = actions
            .iter()
            .filter_map(|a| match a {
                Action::Reduce(p) => Some(*p),
                _ => None,
            })
            .collect();

        // Reduce/reduce: a declared higher precedence eliminates the lower.
        let beaten: Vec<ProdId> = reduces
            .iter()
            .copied()
            .filter(|&r| {
                let rp = self.prods[r as usize].prec;
                reduces.iter().any(|&other| {
                    other != r
                        && matches!(
                            (self.prods[other as usize].prec, rp),
                            (Some(a), Some(b)) if a > b
                        )
                })
            })
            .collect();
        reduces.retain(|r| !beaten.contains(r));

        let has_shift = actions.iter().any(|a| matches!(a, Action::Shift(_)));
        if has_shift {
            reduces.retain(|&r| {
                let reduce_prod = &self.prods[r as usize];
                match (reduce_prod.prec, shift_prec) {
                    (Some(rp), Some(sp)) if rp > sp => {
                        drop_shift = true;
                        true
                    }
                    (Some(rp), Some(sp)) if rp < sp => false,
                    (Some(_), Some(_)) => match reduce_prod.assoc {
                        Assoc::Left => {
                            drop_shift = true;
                            true
                        }
                        Assoc::Right => false,
                        Assoc::None => true,
                    },
                    _ => true,
                }
            });
        }

        for action in actions {
            match action {
                Action::Shift(_) if drop_shift => {}
                Action::Reduce(p) if !reduces.contains(&p) => {}
                other => kept.push(other),
            }
        }
        kept
    }
}
