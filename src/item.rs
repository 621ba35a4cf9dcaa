//! Component C (part 2): LR(1) item sets, closure and the canonical
//! automaton, plus the "modified LALR" core-merge.
//!
//! Grounded on `src/table.rs`'s `LRState`/`LRItem`/`closure` (the teacher's
//! prototype breaks off mid-`closure` with a `todo!()`; completed here)
//! and on `calculate_lr_tables`'s state worklist / per-symbol grouping.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;

use crate::grammar::{Grammar, AUGMENTED_PROD};
use crate::index::{ProdIndex, StateIndex, StateVec, SymbolIndex, TermIndex};
use crate::sets::{firsts_of_sequence, FirstSets};

/// The core of an item: a production and a dot position. Two items with the
/// same core but different lookaheads belong to the same LALR group.
pub type ItemCore = (ProdIndex, usize);

/// A closed item set: core -> lookahead terminals.
pub type ItemSet = BTreeMap<ItemCore, BTreeSet<TermIndex>>;

fn symbol_at_dot(grammar: &Grammar, core: ItemCore) -> Option<SymbolIndex> {
    let (prod, dot) = core;
    grammar.production_rhs_symbols(prod).get(dot).copied()
}

fn advance(core: ItemCore) -> ItemCore {
    (core.0, core.1 + 1)
}

/// Closes an item set: starting from kernel items, repeatedly adds
/// `[B -> .g, b]` for every `[A -> a.Bb, a]` already present, with lookahead
/// `b in FIRST(b a)`.
pub fn closure(mut items: ItemSet, grammar: &Grammar, first_sets: &FirstSets) -> ItemSet {
    loop {
        let mut additions: Vec<(ItemCore, TermIndex)> = vec![];

        for (&core, lookaheads) in items.iter() {
            let Some(symbol) = symbol_at_dot(grammar, core) else {
                continue;
            };
            if grammar.is_term(symbol) {
                continue;
            }
            let nonterm = grammar.symbol_to_nonterm(symbol);
            let (prod, dot) = core;
            let rest = &grammar.production_rhs_symbols(prod)[dot + 1..];

            let rest_firsts = firsts_of_sequence(grammar, first_sets, rest);
            let nullable_rest = rest_firsts.contains(&grammar.empty_index());

            for &next_prod in grammar.iterate_productions_of(nonterm) {
                let new_core = (next_prod, 0);
                for &first in &rest_firsts {
                    if first != grammar.empty_index() {
                        additions.push((new_core, grammar.symbol_to_term(first)));
                    }
                }
                if nullable_rest {
                    for &la in lookaheads {
                        additions.push((new_core, la));
                    }
                }
            }
        }

        let mut changed = false;
        for (core, la) in additions {
            let set = items.entry(core).or_default();
            if set.insert(la) {
                changed = true;
            }
        }
        if !changed {
            return items;
        }
    }
}

pub struct CanonicalState {
    pub index: StateIndex,
    pub items: ItemSet,
    pub transitions: BTreeMap<SymbolIndex, StateIndex>,
}

pub struct CanonicalAutomaton {
    pub states: StateVec<CanonicalState>,
}

/// Builds the canonical LR(1) automaton: one state per distinct closed item
/// set, connected by GOTO transitions. Grounded on `calculate_lr_tables`'s
/// state worklist (`state_queue`/`states`) and per-next-symbol grouping.
pub fn build_canonical_automaton(grammar: &Grammar, first_sets: &FirstSets) -> CanonicalAutomaton {
    let mut kernel0 = ItemSet::new();
    kernel0.insert((AUGMENTED_PROD, 0), BTreeSet::from([grammar.symbol_to_term(grammar.stop_index())]));
    let items0 = closure(kernel0, grammar, first_sets);

    let mut states: StateVec<CanonicalState> = StateVec::new();
    // Maps an exact closed item set to the state that already represents it.
    let mut index_by_items: IndexMap<ItemSet, StateIndex> = IndexMap::new();

    let first = states.push(CanonicalState {
        index: StateIndex(0),
        items: items0.clone(),
        transitions: BTreeMap::new(),
    });
    index_by_items.insert(items0, first);

    let mut worklist = vec![first];
    while let Some(state_idx) = worklist.pop() {
        // Group kernel advances by the symbol that follows the dot.
        let mut per_symbol: BTreeMap<SymbolIndex, ItemSet> = BTreeMap::new();
        for (&core, lookaheads) in states[state_idx].items.iter() {
            if let Some(symbol) = symbol_at_dot(grammar, core) {
                per_symbol
                    .entry(symbol)
                    .or_default()
                    .entry(advance(core))
                    .or_default()
                    .extend(lookaheads.iter().copied());
            }
        }

        for (symbol, kernel) in per_symbol {
            let closed = closure(kernel, grammar, first_sets);
            let target = if let Some(&existing) = index_by_items.get(&closed) {
                existing
            } else {
                let idx = states.push(CanonicalState {
                    index: StateIndex(states.len()),
                    items: closed.clone(),
                    transitions: BTreeMap::new(),
                });
                index_by_items.insert(closed, idx);
                worklist.push(idx);
                idx
            };
            states[state_idx].transitions.insert(symbol, target);
        }
    }

    CanonicalAutomaton { states }
}

/// The core (lookahead-free) item set of a state, used to group canonical
/// states for LALR merging.
pub fn state_core(state: &CanonicalState) -> BTreeSet<ItemCore> {
    state.items.keys().copied().collect()
}
