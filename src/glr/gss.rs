//! The graph-structured stack (GSS): the data structure that lets the GLR
//! driver maintain many parallel parse stacks that share common prefixes and
//! suffixes. Grounded on `rustemo/src/glr/parser.rs`'s `GssHead`/frontier
//! bookkeeping, reimplemented on top of `petgraph` (as the spec's design
//! notes ask for "arena-allocated GSS... with integer handles", which is
//! exactly what `petgraph::graph::NodeIndex`/`EdgeIndex` already are) rather
//! than the teacher's hand-rolled adjacency vectors.

use petgraph::graph::DiGraph;

use crate::index::{ForestNodeIndex, StateIndex};

/// A GSS node represents one parser state reachable at a given input
/// position; two different parse paths that reach the same (state,
/// position) are always merged onto the same node (`spec.md` §4.F.1).
#[derive(Debug, Clone, Copy)]
pub struct GssNode {
    pub state: StateIndex,
}

/// A GSS edge is a stack link: it was created either by a shift (the label
/// is a terminal leaf) or by a GOTO following a reduce (the label is a
/// non-terminal node, possibly itself ambiguous via forest packing).
#[derive(Debug, Clone, Copy)]
pub struct GssEdge {
    pub forest: ForestNodeIndex,
}

pub type Gss = DiGraph<GssNode, GssEdge>;
