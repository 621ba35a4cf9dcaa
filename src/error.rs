//! Error kinds for grammar construction, table building and parsing.
//!
//! Grounded on the `thiserror`-based error enums used by the other
//! grammar/parsing crates in this corpus (`kbnf`, `auto_canonical_lr1`); the
//! teacher's own error module was not present in the retrieved sources.

use crate::index::{ProdIndex, StateIndex, TermIndex};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("table conflict: {0}")]
    TableConflict(#[from] TableConflictError),

    #[error("parse error at position {position} (line {line}, column {column}): expected one of {expected:?}, found: {context:?}")]
    Parse {
        position: usize,
        line: usize,
        column: usize,
        expected: Vec<TermIndex>,
        context: String,
    },

    #[error("lexical ambiguity at position {position}: {candidates:?} all match with equal length and preference")]
    Disambiguation {
        position: usize,
        candidates: Vec<TermIndex>,
    },

    #[error("parse cancelled")]
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("undefined symbol `{0}` referenced in a production right-hand side")]
    UndefinedSymbol(String),

    #[error("duplicate terminal name `{0}`")]
    DuplicateTerminal(String),

    #[error("duplicate non-terminal name `{0}`")]
    DuplicateNonTerminal(String),

    #[error("no start symbol set")]
    NoStartSymbol,

    #[error("augmented start production (production 0) may only be `S' -> S $`")]
    InvalidAugmentedProduction,

    #[error("production for `{nonterminal}` has an empty right-hand side but is not marked `is_empty`")]
    UnmarkedEmptyProduction { nonterminal: String },

    #[error("FIRST set for symbol `{0}` is empty: the grammar has an unproductive or infinitely recursive symbol")]
    UnproductiveSymbol(String),
}

#[derive(Debug, thiserror::Error)]
#[error("unresolved {kind} conflict in state {state:?} on lookahead {lookahead:?}: {items}")]
pub struct TableConflictError {
    pub kind: ConflictKind,
    pub state: StateIndex,
    pub lookahead: TermIndex,
    pub productions: Vec<ProdIndex>,
    pub items: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::ShiftReduce => write!(f, "shift/reduce"),
            ConflictKind::ReduceReduce => write!(f, "reduce/reduce"),
        }
    }
}
