//! Component F: the GLR driver.
//!
//! Grounded on `rustemo/src/glr/parser.rs`'s top-level loop (`initial_process_
//! frontier`, the reduce-then-shift frontier step, `find_reduction_paths`,
//! `create_forest`'s local ambiguity packing) and its citation of Scott &
//! Johnstone, "Right Nulled GLR Parsing" (2006) for epsilon handling. Unlike
//! the teacher, epsilon reductions here pop zero GSS edges directly (the
//! production's ancestor is the node itself) rather than installing the
//! paper's self-loop node; see `DESIGN.md` for why that simplification is
//! semantically equivalent for this driver.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use colored::Colorize;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::context::{CancellationToken, Span};
use crate::error::{Error, Result};
use crate::forest::Forest;
use crate::glr::gss::{Gss, GssEdge, GssNode};
use crate::grammar::Grammar;
use crate::index::{ForestNodeIndex, ProdIndex, StateIndex, TermIndex};
use crate::log;
use crate::recognizer::{select_token, Layout, TokenSelection};
use crate::table::{Action, LrTable};

pub struct GlrParser<'g> {
    grammar: &'g Grammar,
    table: &'g LrTable,
    layout: Layout,
}

impl<'g> GlrParser<'g> {
    pub fn new(grammar: &'g Grammar, table: &'g LrTable, layout: Layout) -> Self {
        Self { grammar, table, layout }
    }

    /// Parses all of `input`, returning a forest whose root may have more
    /// than one alternative if the grammar is genuinely ambiguous for this
    /// input (`spec.md` §4.F, §8: the classic arithmetic-expression grammar
    /// yields 5 = Catalan(3) trees under GLR).
    pub fn parse(&self, input: &str, cancel: &CancellationToken) -> Result<Forest> {
        let mut gss = Gss::new();
        let mut forest = Forest::new();
        let root = gss.add_node(GssNode { state: self.table.start_state });

        let mut pending: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        pending.insert(0, vec![root]);

        let mut accepted: Vec<ForestNodeIndex> = vec![];
        let mut last_expected: BTreeSet<TermIndex> = BTreeSet::new();
        let mut last_position = 0usize;

        while let Some((&position, _)) = pending.iter().next() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let heads = pending.remove(&position).unwrap();
            let effective_pos = self.layout.skip(input, position);
            last_position = effective_pos;
            log!("\n{}", format!("Frontier at byte {effective_pos}, {} head(s)", heads.len()).red().bold());

            let union_candidates: BTreeSet<TermIndex> = heads
                .iter()
                .flat_map(|&h| {
                    let state = gss[h].state;
                    (0..self.grammar.term_count()).map(TermIndex).filter(move |&t| !self.table.actions(state, t).is_empty())
                })
                .collect();
            last_expected = union_candidates.clone();

            let chosen: Vec<(TermIndex, usize)> = match select_token(self.grammar, union_candidates.iter().copied(), input, effective_pos) {
                TokenSelection::None => vec![],
                TokenSelection::One(t, len) => vec![(t, len)],
                TokenSelection::Ambiguous(ts, len) => ts.into_iter().map(|t| (t, len)).collect(),
            };

            // --- Reduction phase: fixpoint over reduce actions at this
            // position, keyed by the chosen lookahead terminal(s). ---
            let mut shift_eligible: Vec<NodeIndex> = heads.clone();
            let mut goto_cache: std::collections::HashMap<StateIndex, NodeIndex> = std::collections::HashMap::new();

            let mut worklist: VecDeque<(NodeIndex, TermIndex, ProdIndex)> = VecDeque::new();
            for &h in &heads {
                for &(t, _) in &chosen {
                    for action in self.table.actions(gss[h].state, t) {
                        if let Action::Reduce(prod) = action {
                            worklist.push_back((h, t, *prod));
                        }
                    }
                }
            }

            let mut done: HashSet<(NodeIndex, TermIndex, ProdIndex)> = HashSet::new();
            while let Some((node, t, prod)) = worklist.pop_front() {
                if !done.insert((node, t, prod)) {
                    continue;
                }
                let rhs_len = self.grammar.production_rhs_symbols(prod).len();
                for (ancestor, children) in reduction_paths(&gss, node, rhs_len) {
                    let lhs = self.grammar.production(prod).lhs;
                    let Some(goto_state) = self.table.goto(gss[ancestor].state, lhs) else {
                        continue;
                    };

                    let is_new_target = !goto_cache.contains_key(&goto_state);
                    let target = *goto_cache.entry(goto_state).or_insert_with(|| {
                        let n = gss.add_node(GssNode { state: goto_state });
                        n
                    });
                    if is_new_target {
                        shift_eligible.push(target);
                    }

                    let span = span_of_children(&forest, effective_pos, &children);
                    let existing = gss
                        .edges_connecting(ancestor, target)
                        .find(|e| matches_symbol_span(&forest, e.weight().forest, lhs, span));

                    let new_reduces_to_enqueue = match existing {
                        Some(e) => {
                            log!("  {} production {prod:?}, packing into existing node", "Reducing".green());
                            forest.pack(e.weight().forest, prod, children);
                            false
                        }
                        None => {
                            log!("  {} production {prod:?}, new node {target:?}", "Reducing".green());
                            let fnode = forest.add_nonterminal(lhs, prod, span, children);
                            gss.add_edge(ancestor, target, GssEdge { forest: fnode });
                            true
                        }
                    };

                    if new_reduces_to_enqueue {
                        for &(t2, _) in &chosen {
                            for action in self.table.actions(goto_state, t2) {
                                if let Action::Reduce(p2) = action {
                                    worklist.push_back((target, t2, *p2));
                                }
                            }
                        }
                    }
                }
            }

            // --- Shift (and accept) phase. ---
            for &(t, len) in &chosen {
                let future_pos = effective_pos + len;
                let mut local_cache: std::collections::HashMap<StateIndex, NodeIndex> = std::collections::HashMap::new();
                let mut enqueued: HashSet<NodeIndex> = HashSet::new();
                for &node in &shift_eligible {
                    for action in self.table.actions(gss[node].state, t) {
                        match action {
                            Action::Shift(target_state) => {
                                let span = Span::new(effective_pos, future_pos);
                                let leaf = forest.add_terminal(t, span);
                                let target = *local_cache.entry(*target_state).or_insert_with(|| gss.add_node(GssNode { state: *target_state }));
                                gss.add_edge(node, target, GssEdge { forest: leaf });
                                log!("{} terminal {t:?} into state {target_state:?}", "Shifting".red());
                                if enqueued.insert(target) {
                                    pending.entry(future_pos).or_default().push(target);
                                }
                            }
                            Action::Accept => {
                                log!("{}", "Accepting".green().bold());
                                for edge in gss.edges_directed(node, Direction::Incoming) {
                                    let ancestor = edge.source();
                                    for root_edge in gss.edges_directed(ancestor, Direction::Incoming) {
                                        accepted.push(root_edge.weight().forest);
                                    }
                                }
                            }
                            Action::Reduce(_) | Action::Error => {}
                        }
                    }
                }
            }
        }

        match accepted.as_slice() {
            [] => {
                let (line, column) = line_column(input, last_position);
                Err(Error::Parse {
                    position: last_position,
                    line,
                    column,
                    expected: last_expected.into_iter().collect(),
                    context: input.get(last_position..).unwrap_or("").chars().take(16).collect(),
                })
            }
            [only] => {
                forest.root = Some(*only);
                Ok(forest)
            }
            many => {
                // Every accept should resolve to the same GSS-merged node
                // (there is only one augmented production, so GOTO(start, S)
                // is deterministic); pack any remaining duplicates as
                // alternatives of one root.
                let root = many[0];
                for &other in &many[1..] {
                    if other != root {
                        let alts = forest.alternatives(other).to_vec();
                        for alt in alts {
                            forest.pack(root, alt.production, alt.children);
                        }
                    }
                }
                forest.root = Some(root);
                Ok(forest)
            }
        }
    }
}

/// Every way to walk `rhs_len` edges backward from `node`, returning the
/// ancestor reached and the forest nodes collected along the way, in
/// left-to-right (production rhs) order. `rhs_len == 0` (an epsilon
/// production) returns `node` itself with no children, consuming nothing.
fn reduction_paths(gss: &Gss, node: NodeIndex, rhs_len: usize) -> Vec<(NodeIndex, Vec<ForestNodeIndex>)> {
    if rhs_len == 0 {
        return vec![(node, vec![])];
    }
    let mut results = vec![];
    for edge in gss.edges_directed(node, Direction::Incoming) {
        let source = edge.source();
        let forest_node = edge.weight().forest;
        for (ancestor, mut children) in reduction_paths(gss, source, rhs_len - 1) {
            children.push(forest_node);
            results.push((ancestor, children));
        }
    }
    results
}

fn span_of_children(forest: &Forest, at: usize, children: &[ForestNodeIndex]) -> Span {
    children
        .iter()
        .map(|&c| forest.span(c))
        .reduce(|a, b| a.merge(b))
        .unwrap_or_else(|| Span::new(at, at))
}

fn matches_symbol_span(forest: &Forest, existing: ForestNodeIndex, lhs: crate::index::NonTermIndex, span: Span) -> bool {
    use crate::forest::ForestNode;
    match forest.node(existing) {
        ForestNode::NonTerminal { nonterm, span: existing_span, .. } => *nonterm == lhs && *existing_span == span,
        ForestNode::Terminal { .. } => false,
    }
}

fn line_column(input: &str, position: usize) -> (usize, usize) {
    let before = &input[..position.min(input.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map(|i| position - i).unwrap_or(position + 1);
    (line, column)
}
