//! Component D: the table builder and conflict-resolution policy.
//!
//! Grounded on `src/table.rs::calculate_lr_tables` (state worklist,
//! `LRState.actions: TermVec<Action>` / `gotos: NonTermVec<Option<StateIndex>>`,
//! per-symbol max-priority grouping) for the table shape, and on
//! `rustemo/src/glr/parser.rs`'s use of `Action::{Shift, Reduce, Accept,
//! Error}` for the action enum the drivers actually consume.

use std::collections::BTreeSet;

use crate::error::{ConflictKind, Error, Result, TableConflictError};
use crate::grammar::{Assoc, Grammar, AUGMENTED_PROD};
use crate::index::{NonTermIndex, NonTermVec, ProdIndex, StateIndex, StateVec, SymbolIndex, TermIndex, TermVec};
use crate::item::{build_canonical_automaton, state_core, CanonicalAutomaton, ItemSet};
use crate::sets::first_sets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(StateIndex),
    Reduce(ProdIndex),
    Accept,
    Error,
}

/// Which table-construction method to use (`Settings::tables`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Slr,
    Lalr,
}

/// Whether the table is being built for the deterministic LR driver (where
/// unresolved conflicts are fatal) or the GLR driver (where they are kept).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverMode {
    Lr,
    Glr,
}

/// Consulted when a `dynamic`-tagged production is involved in an otherwise
/// unresolved conflict (`spec.md` §9 open question).
pub trait DynamicResolver {
    fn resolve(&self, state: StateIndex, term: TermIndex, candidates: &[Action]) -> Option<Action>;
}

pub struct TableOptions<'a> {
    pub kind: TableKind,
    pub mode: DriverMode,
    pub prefer_shifts: bool,
    pub dynamic_resolver: Option<&'a dyn DynamicResolver>,
}

impl Default for TableOptions<'_> {
    fn default() -> Self {
        Self {
            kind: TableKind::Lalr,
            mode: DriverMode::Glr,
            prefer_shifts: false,
            dynamic_resolver: None,
        }
    }
}

pub struct LrTable {
    /// The (merged) state a fresh parse starts in. The canonical automaton's
    /// start state is always index 0, but merging may have folded it into a
    /// different final index.
    pub start_state: StateIndex,
    actions: StateVec<TermVec<Vec<Action>>>,
    gotos: StateVec<NonTermVec<Option<StateIndex>>>,
    pub conflicts: Vec<TableConflictError>,
}

impl LrTable {
    pub fn state_count(&self) -> usize {
        self.actions.len()
    }

    /// All actions registered for `(state, term)`. Empty means `Error`.
    /// In LR mode this is guaranteed to have at most one entry.
    pub fn actions(&self, state: StateIndex, term: TermIndex) -> &[Action] {
        &self.actions[state][term]
    }

    pub fn goto(&self, state: StateIndex, nonterm: NonTermIndex) -> Option<StateIndex> {
        self.gotos[state][nonterm]
    }

    /// Builds the ACTION/GOTO tables for `grammar`.
    pub fn build(grammar: &Grammar, options: &TableOptions<'_>) -> Result<Self> {
        let first = first_sets(grammar);
        let canonical = build_canonical_automaton(grammar, &first);

        // `Slr` currently shares the LALR core-merge; see DESIGN.md for why a
        // separate FOLLOW-set-based reduce lookahead was not worth the
        // duplication here.
        let (merged_states, transition_map) = match options.kind {
            TableKind::Lalr | TableKind::Slr => merge_lalr(&canonical, grammar),
        };

        let state_count = merged_states.len();
        let mut actions: StateVec<TermVec<Vec<Action>>> = StateVec::new();
        let mut gotos: StateVec<NonTermVec<Option<StateIndex>>> = StateVec::new();
        for _ in 0..state_count {
            actions.push(grammar.new_termvec(Vec::new()));
            gotos.push(grammar.new_nontermvec(None));
        }

        let mut conflicts = vec![];

        for (state_idx, state) in merged_states.iter().enumerate() {
            let state_idx = StateIndex(state_idx);

            for (&symbol, &target) in state.transitions.iter() {
                if grammar.is_nonterm(symbol) {
                    gotos[state_idx][grammar.symbol_to_nonterm(symbol)] = Some(target);
                }
            }

            // Gather, per lookahead terminal, every candidate action.
            let mut per_term: TermVec<Vec<ProposedAction>> = grammar.new_termvec(Vec::new());

            for (&(prod, dot), lookaheads) in state.items.iter() {
                let rhs = grammar.production_rhs_symbols(prod);
                if dot < rhs.len() {
                    let symbol = rhs[dot];
                    if grammar.is_term(symbol) {
                        let term = grammar.symbol_to_term(symbol);
                        if let Some(&target) = state.transitions.get(&symbol) {
                            per_term[term].push(ProposedAction::Shift(target));
                        }
                    }
                } else if prod == AUGMENTED_PROD {
                    for &la in lookaheads {
                        per_term[la].push(ProposedAction::Accept);
                    }
                } else {
                    for &la in lookaheads {
                        per_term[la].push(ProposedAction::Reduce(prod));
                    }
                }
            }

            for (term_idx, candidates) in per_term.0.into_iter().enumerate() {
                let term = TermIndex(term_idx);
                if candidates.is_empty() {
                    continue;
                }
                let (resolved, conflict) = resolve_cell(grammar, state_idx, term, candidates, options);
                actions[state_idx][term] = resolved;
                if let Some(conflict) = conflict {
                    if options.mode == DriverMode::Lr {
                        return Err(Error::TableConflict(conflict));
                    }
                    conflicts.push(conflict);
                }
            }
        }

        let start_state = transition_map[0];
        Ok(LrTable { start_state, actions, gotos, conflicts })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProposedAction {
    Shift(StateIndex),
    Reduce(ProdIndex),
    Accept,
}

fn resolve_cell(
    grammar: &Grammar,
    state: StateIndex,
    term: TermIndex,
    candidates: Vec<ProposedAction>,
    options: &TableOptions<'_>,
) -> (Vec<Action>, Option<TableConflictError>) {
    let accept = candidates.iter().any(|c| matches!(c, ProposedAction::Accept));
    let shift = candidates.iter().find_map(|c| match c {
        ProposedAction::Shift(s) => Some(*s),
        _ => None,
    });
    let mut reduces: Vec<ProdIndex> = candidates
        .iter()
        .filter_map(|c| match c {
            ProposedAction::Reduce(p) => Some(*p),
            _ => None,
        })
        .collect();

    if accept && shift.is_none() && reduces.is_empty() {
        return (vec![Action::Accept], None);
    }

    let mut unresolved_rr = false;
    if reduces.len() > 1 {
        let max_priority = reduces.iter().map(|p| grammar.production(*p).priority).max().unwrap();
        let top: Vec<ProdIndex> = reduces.iter().copied().filter(|p| grammar.production(*p).priority == max_priority).collect();
        if top.len() == 1 {
            reduces = top;
        } else {
            let preferred: Vec<ProdIndex> = top.iter().copied().filter(|p| grammar.production(*p).preferred).collect();
            if preferred.len() == 1 {
                reduces = preferred;
            } else {
                reduces = top;
                unresolved_rr = true;
            }
        }
    }

    if shift.is_none() && reduces.len() == 1 && !unresolved_rr {
        return (vec![Action::Reduce(reduces[0])], None);
    }
    if shift.is_some() && reduces.is_empty() {
        return (vec![Action::Shift(shift.unwrap())], None);
    }

    // Shift/reduce, reduce/reduce, or both at once.
    if let (Some(target), false) = (shift, unresolved_rr) {
        if reduces.len() == 1 {
            let prod = reduces[0];
            let reduce_priority = grammar.production(prod).priority;
            let term_priority = grammar.terminal(term).priority;
            if term_priority > reduce_priority {
                return (vec![Action::Shift(target)], None);
            } else if reduce_priority > term_priority {
                return (vec![Action::Reduce(prod)], None);
            } else {
                match grammar.production(prod).assoc {
                    Assoc::Left => return (vec![Action::Reduce(prod)], None),
                    Assoc::Right => return (vec![Action::Shift(target)], None),
                    Assoc::NonAssoc => {
                        if let Some(action) = try_dynamic(grammar, options, state, term, &[Action::Shift(target), Action::Reduce(prod)], prod) {
                            return (vec![action], None);
                        }
                        if options.prefer_shifts && options.mode == DriverMode::Lr {
                            return (vec![Action::Shift(target)], None);
                        }
                    }
                }
            }
        }
    }

    // Still unresolved: build the residual set of actions and a diagnostic.
    let mut all = Vec::new();
    if let Some(s) = shift {
        all.push(Action::Shift(s));
    }
    for p in &reduces {
        all.push(Action::Reduce(*p));
    }
    if accept {
        all.push(Action::Accept);
    }

    let kind = if shift.is_some() { ConflictKind::ShiftReduce } else { ConflictKind::ReduceReduce };
    let conflict = TableConflictError {
        kind,
        state,
        lookahead: term,
        productions: reduces.clone(),
        items: format!(
            "state {:?}, lookahead `{}`: {} candidate action(s)",
            state,
            grammar.terminal(term).name,
            all.len()
        ),
    };
    (all, Some(conflict))
}

fn try_dynamic(
    grammar: &Grammar,
    options: &TableOptions<'_>,
    state: StateIndex,
    term: TermIndex,
    candidates: &[Action],
    prod: ProdIndex,
) -> Option<Action> {
    if grammar.production(prod).dynamic.is_none() {
        return None;
    }
    options.dynamic_resolver?.resolve(state, term, candidates)
}

/// Groups canonical-automaton states with identical cores and merges each
/// group's lookaheads, unless doing so would introduce a reduce/reduce
/// conflict absent from the unmerged LR(1) automaton — in which case the
/// group is left split (`spec.md` §4.C, "modified LALR").
fn merge_lalr(canonical: &CanonicalAutomaton, grammar: &Grammar) -> (StateVec<MergedState>, Vec<StateIndex>) {
    let mut groups: Vec<Vec<StateIndex>> = Vec::new();
    let mut group_of: Vec<usize> = vec![usize::MAX; canonical.states.len()];

    for state in canonical.states.iter() {
        if group_of[state.index.0] != usize::MAX {
            continue;
        }
        let core = state_core(state);
        let mut members = vec![state.index];
        for other in canonical.states.iter() {
            if other.index == state.index || group_of[other.index.0] != usize::MAX {
                continue;
            }
            if state_core(other) == core {
                members.push(other.index);
            }
        }
        let group_idx = groups.len();
        for &m in &members {
            group_of[m.0] = group_idx;
        }
        groups.push(members);
    }

    // Decide, per group, whether merging is safe.
    let mut should_merge = vec![true; groups.len()];
    for (gi, members) in groups.iter().enumerate() {
        if members.len() == 1 {
            continue;
        }
        let per_state_conflicts: Vec<BTreeSet<(ProdIndex, ProdIndex, TermIndex)>> =
            members.iter().map(|&s| reduce_reduce_pairs(&canonical.states[s].items, grammar)).collect();
        let union_before: BTreeSet<_> = per_state_conflicts.iter().flatten().copied().collect();

        let merged_items = merge_items(members.iter().map(|&s| &canonical.states[s].items));
        let union_after = reduce_reduce_pairs(&merged_items, grammar);

        if union_after.iter().any(|c| !union_before.contains(c)) {
            should_merge[gi] = false;
        }
    }

    // Assign final state indices: one per merged group, or one per member of
    // a group that failed the safety check.
    let mut final_states: StateVec<MergedState> = StateVec::new();
    let mut old_to_new: Vec<StateIndex> = vec![StateIndex(0); canonical.states.len()];

    // First pass: allocate indices.
    let mut group_final_start: Vec<Vec<StateIndex>> = Vec::with_capacity(groups.len());
    for (gi, members) in groups.iter().enumerate() {
        if should_merge[gi] {
            let idx = StateIndex(final_states.len());
            final_states.push(MergedState { items: ItemSet::new(), transitions: Default::default() });
            for &m in members {
                old_to_new[m.0] = idx;
            }
            group_final_start.push(vec![idx]);
        } else {
            let mut idxs = vec![];
            for &m in members {
                let idx = StateIndex(final_states.len());
                final_states.push(MergedState { items: ItemSet::new(), transitions: Default::default() });
                old_to_new[m.0] = idx;
                idxs.push(idx);
            }
            group_final_start.push(idxs);
        }
    }

    // Second pass: populate merged item sets and translate transitions.
    for (gi, members) in groups.iter().enumerate() {
        if should_merge[gi] {
            let merged_items = merge_items(members.iter().map(|&s| &canonical.states[s].items));
            let mut transitions = std::collections::BTreeMap::new();
            // All members share identical cores, hence identical outgoing
            // symbols; take transitions from the first member.
            for (&symbol, &target) in canonical.states[members[0]].transitions.iter() {
                transitions.insert(symbol, old_to_new[target.0]);
            }
            let idx = group_final_start[gi][0];
            final_states[idx] = MergedState { items: merged_items, transitions };
        } else {
            for (&old, &new) in members.iter().zip(group_final_start[gi].iter()) {
                let mut transitions = std::collections::BTreeMap::new();
                for (&symbol, &target) in canonical.states[old].transitions.iter() {
                    transitions.insert(symbol, old_to_new[target.0]);
                }
                final_states[new] = MergedState { items: canonical.states[old].items.clone(), transitions };
            }
        }
    }

    (final_states, old_to_new)
}

struct MergedState {
    items: ItemSet,
    transitions: std::collections::BTreeMap<SymbolIndex, StateIndex>,
}

fn merge_items<'a>(sets: impl Iterator<Item = &'a ItemSet>) -> ItemSet {
    let mut merged = ItemSet::new();
    for set in sets {
        for (&core, las) in set.iter() {
            merged.entry(core).or_default().extend(las.iter().copied());
        }
    }
    merged
}

fn reduce_reduce_pairs(items: &ItemSet, grammar: &Grammar) -> BTreeSet<(ProdIndex, ProdIndex, TermIndex)> {
    let completed: Vec<(ProdIndex, &BTreeSet<TermIndex>)> = items
        .iter()
        .filter_map(|(&(prod, dot), la)| {
            let len = grammar.production_rhs_symbols(prod).len();
            (dot == len).then_some((prod, la))
        })
        .collect();

    let mut pairs = BTreeSet::new();
    for i in 0..completed.len() {
        for j in (i + 1)..completed.len() {
            let (p1, la1) = completed[i];
            let (p2, la2) = completed[j];
            if p1 == p2 {
                continue;
            }
            let (a, b) = if p1.0 < p2.0 { (p1, p2) } else { (p2, p1) };
            for t in la1.intersection(la2) {
                pairs.insert((a, b, *t));
            }
        }
    }
    pairs
}
