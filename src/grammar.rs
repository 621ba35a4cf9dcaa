//! Component A: the grammar intermediate representation.
//!
//! Grounded on the old `table.rs` prototype's usage of `Grammar`
//! (`grammar.productions`, `grammar.terminals`, `grammar.nonterminals`,
//! `grammar.new_termvec`/`new_nontermvec`, `grammar.empty_index`,
//! `grammar.start_index`) and on `rustemort/src/index.rs`'s indexed
//! collections. Unlike the teacher, there is no surface-grammar text parser
//! feeding this IR (out of scope per `spec.md` §1) — callers build it
//! directly through `GrammarBuilder`.

use std::collections::HashMap;

use crate::error::{GrammarError, Result};
use crate::index::{NonTermIndex, NonTermVec, ProdIndex, ProdVec, SymbolIndex, TermIndex, TermVec};
use crate::recognizer::Recognizer;

/// Reserved index of the augmented start non-terminal `S'`.
pub const AUGMENTED_NONTERM: NonTermIndex = NonTermIndex(0);
/// Reserved index of the end-of-input terminal `$`.
pub const STOP_TERM: TermIndex = TermIndex(0);
/// Reserved index of the `EMPTY` pseudo-terminal; doubles as the FIRST-set
/// epsilon sentinel used by `sets.rs`.
pub const EMPTY_TERM: TermIndex = TermIndex(1);
/// The augmented production `S' -> S $`, always production 0 after freeze.
pub const AUGMENTED_PROD: ProdIndex = ProdIndex(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Terminal(TermIndex),
    NonTerminal(NonTermIndex),
}

#[derive(Debug, Clone)]
pub struct Terminal {
    pub name: String,
    pub recognizer: Recognizer,
    /// Priority used both for shift/reduce resolution (4.D.1) and as the
    /// default contribution to a production's priority.
    pub priority: i32,
    /// The lexical-selection `prefer` flag (4.B.1), distinct from a
    /// production's `preferred` flag (4.D.3).
    pub prefer: bool,
}

#[derive(Debug, Clone)]
pub struct NonTerminalDef {
    pub name: String,
    pub productions: Vec<ProdIndex>,
}

#[derive(Debug, Clone)]
pub struct Production {
    pub id: ProdIndex,
    pub lhs: NonTermIndex,
    pub rhs: Vec<SymbolIndex>,
    pub priority: i32,
    pub assoc: Assoc,
    pub preferred: bool,
    pub is_empty: bool,
    pub dynamic: Option<DynamicId>,
}

impl Production {
    pub fn rhs_len(&self) -> usize {
        self.rhs.len()
    }
}

/// Identifies a `dynamic` disambiguation hook attached to a production
/// (`spec.md` §9 open question: a callback consulted at parse time when the
/// table builder would otherwise leave the conflict unresolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DynamicId(pub usize);

/// Metadata for a production, supplied to `add_production`.
#[derive(Debug, Clone, Default)]
pub struct ProductionMeta {
    pub priority: Option<i32>,
    pub assoc: Option<Assoc>,
    pub preferred: bool,
    pub dynamic: Option<DynamicId>,
}

struct PendingProduction {
    lhs: NonTermIndex,
    rhs: Vec<Symbol>,
    meta: ProductionMeta,
}

pub struct GrammarBuilder {
    terminals: TermVec<Terminal>,
    nonterminals: NonTermVec<NonTerminalDef>,
    pending_productions: Vec<PendingProduction>,
    names: HashMap<String, SymbolIndex>,
    start: Option<NonTermIndex>,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarBuilder {
    pub fn new() -> Self {
        let mut terminals = TermVec::new();
        let mut names = HashMap::new();

        let stop = terminals.push(Terminal {
            name: "STOP".to_string(),
            recognizer: Recognizer::end_of_input(),
            priority: 0,
            prefer: false,
        });
        debug_assert_eq!(stop, STOP_TERM);
        names.insert("STOP".to_string(), SymbolIndex(stop.0));

        let empty = terminals.push(Terminal {
            name: "EMPTY".to_string(),
            recognizer: Recognizer::empty(),
            priority: 0,
            prefer: false,
        });
        debug_assert_eq!(empty, EMPTY_TERM);
        names.insert("EMPTY".to_string(), SymbolIndex(empty.0));

        let mut nonterminals = NonTermVec::new();
        let augmented = nonterminals.push(NonTerminalDef {
            name: "S'".to_string(),
            productions: vec![],
        });
        debug_assert_eq!(augmented, AUGMENTED_NONTERM);

        Self {
            terminals,
            nonterminals,
            pending_productions: vec![],
            names,
            start: None,
        }
    }

    pub fn add_terminal(
        &mut self,
        name: &str,
        recognizer: Recognizer,
    ) -> Result<TermIndex> {
        self.add_terminal_with(name, recognizer, 0, false)
    }

    pub fn add_terminal_with(
        &mut self,
        name: &str,
        recognizer: Recognizer,
        priority: i32,
        prefer: bool,
    ) -> Result<TermIndex> {
        if self.names.contains_key(name) {
            return Err(GrammarError::DuplicateTerminal(name.to_string()).into());
        }
        let idx = self.terminals.push(Terminal {
            name: name.to_string(),
            recognizer,
            priority,
            prefer,
        });
        self.names.insert(name.to_string(), SymbolIndex(idx.0));
        Ok(idx)
    }

    pub fn add_nonterminal(&mut self, name: &str) -> Result<NonTermIndex> {
        if self.names.contains_key(name) {
            return Err(GrammarError::DuplicateNonTerminal(name.to_string()).into());
        }
        let idx = self.nonterminals.push(NonTerminalDef {
            name: name.to_string(),
            productions: vec![],
        });
        // Symbol index is only stable once terminal count is frozen; record
        // a placeholder offset by nonterminal index only, resolved in freeze().
        self.names.insert(name.to_string(), SymbolIndex(usize::MAX - idx.0));
        Ok(idx)
    }

    pub fn add_production(
        &mut self,
        lhs: NonTermIndex,
        rhs: Vec<Symbol>,
        meta: ProductionMeta,
    ) -> Result<ProdIndex> {
        if lhs == AUGMENTED_NONTERM {
            return Err(GrammarError::InvalidAugmentedProduction.into());
        }
        // id is assigned at freeze() time (production 0 is reserved for the
        // augmented start production); here we just remember the pending
        // registration and hand back a placeholder the caller never needs to
        // dereference before freeze.
        let placeholder = ProdIndex(self.pending_productions.len() + 1);
        self.pending_productions.push(PendingProduction { lhs, rhs, meta });
        Ok(placeholder)
    }

    pub fn set_start(&mut self, nt: NonTermIndex) {
        self.start = Some(nt);
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<SymbolIndex> {
        let sym = *self.names.get(name)?;
        // A nonterminal placeholder (see add_nonterminal) is only meaningful
        // after freeze(); callers should use the frozen Grammar for lookups
        // once the grammar is built. Before freeze we can still answer for
        // terminals, whose symbol index never changes.
        Some(sym)
    }

    /// Validates the grammar and produces the immutable, parser-ready IR.
    pub fn freeze(mut self) -> Result<Grammar> {
        let start = self.start.ok_or(GrammarError::NoStartSymbol)?;

        let term_count = self.terminals.len();
        let resolve = |term_count: usize, sym: Symbol| -> Result<SymbolIndex> {
            match sym {
                Symbol::Terminal(t) => {
                    if t.0 >= term_count {
                        return Err(GrammarError::UndefinedSymbol(format!("<terminal #{}>", t.0)).into());
                    }
                    Ok(t.to_symbol_index())
                }
                Symbol::NonTerminal(n) => {
                    if n.0 >= self.nonterminals.len() {
                        return Err(GrammarError::UndefinedSymbol(format!("<non-terminal #{}>", n.0)).into());
                    }
                    Ok(n.to_symbol_index(term_count))
                }
            }
        };

        // Resolve nonterminal symbol indices now that term_count is final.
        for (name, sym) in self.names.iter_mut() {
            if sym.0 >= usize::MAX - self.nonterminals.len() {
                let nt_idx = usize::MAX - sym.0;
                *sym = NonTermIndex(nt_idx).to_symbol_index(term_count);
            }
            let _ = name;
        }

        let mut productions: ProdVec<Production> = ProdVec::new();
        // Production 0: the augmented S' -> S $.
        let start_symbol = start.to_symbol_index(term_count);
        let augmented_prod = productions.push(Production {
            id: AUGMENTED_PROD,
            lhs: AUGMENTED_NONTERM,
            rhs: vec![start_symbol, STOP_TERM.to_symbol_index()],
            priority: 0,
            assoc: Assoc::NonAssoc,
            preferred: false,
            is_empty: false,
            dynamic: None,
        });
        debug_assert_eq!(augmented_prod, AUGMENTED_PROD);
        self.nonterminals[AUGMENTED_NONTERM].productions.push(AUGMENTED_PROD);

        for pending in self.pending_productions {
            let mut rhs_symbols = Vec::with_capacity(pending.rhs.len());
            for sym in pending.rhs {
                rhs_symbols.push(resolve(term_count, sym)?);
            }
            let is_empty = rhs_symbols.is_empty();

            let default_priority = rhs_symbols
                .iter()
                .filter(|s| s.0 < term_count)
                .map(|s| self.terminals[TermIndex(s.0)].priority)
                .max()
                .unwrap_or(0);

            let id = productions.push(Production {
                id: ProdIndex(0), // patched below
                lhs: pending.lhs,
                rhs: rhs_symbols,
                priority: pending.meta.priority.unwrap_or(default_priority),
                assoc: pending.meta.assoc.unwrap_or(Assoc::NonAssoc),
                preferred: pending.meta.preferred,
                is_empty,
                dynamic: pending.meta.dynamic,
            });
            productions[id].id = id;
            self.nonterminals[pending.lhs].productions.push(id);
        }

        for prod in productions.iter() {
            if prod.id == AUGMENTED_PROD {
                continue;
            }
            if prod.rhs.is_empty() != prod.is_empty {
                return Err(GrammarError::UnmarkedEmptyProduction {
                    nonterminal: self.nonterminals[prod.lhs].name.clone(),
                }
                .into());
            }
        }

        Ok(Grammar {
            term_count,
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions,
            names: self.names,
            start_symbol,
            augmented_symbol: AUGMENTED_NONTERM.to_symbol_index(term_count),
            empty_index: EMPTY_TERM.to_symbol_index(),
        })
    }
}

/// The frozen, immutable grammar IR. Read-only after construction and
/// shareable across parser instances (`spec.md` §5).
pub struct Grammar {
    term_count: usize,
    terminals: TermVec<Terminal>,
    nonterminals: NonTermVec<NonTerminalDef>,
    productions: ProdVec<Production>,
    names: HashMap<String, SymbolIndex>,
    start_symbol: SymbolIndex,
    augmented_symbol: SymbolIndex,
    empty_index: SymbolIndex,
}

impl Grammar {
    pub fn term_count(&self) -> usize {
        self.term_count
    }

    pub fn nonterm_count(&self) -> usize {
        self.nonterminals.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.term_count + self.nonterminals.len()
    }

    pub fn start_index(&self) -> SymbolIndex {
        self.start_symbol
    }

    pub fn augmented_index(&self) -> SymbolIndex {
        self.augmented_symbol
    }

    pub fn empty_index(&self) -> SymbolIndex {
        self.empty_index
    }

    pub fn stop_index(&self) -> SymbolIndex {
        STOP_TERM.to_symbol_index()
    }

    pub fn is_term(&self, sym: SymbolIndex) -> bool {
        sym.0 < self.term_count
    }

    pub fn is_nonterm(&self, sym: SymbolIndex) -> bool {
        !self.is_term(sym)
    }

    pub fn symbol_to_term(&self, sym: SymbolIndex) -> TermIndex {
        debug_assert!(self.is_term(sym));
        TermIndex(sym.0)
    }

    pub fn symbol_to_nonterm(&self, sym: SymbolIndex) -> NonTermIndex {
        debug_assert!(self.is_nonterm(sym));
        NonTermIndex(sym.0 - self.term_count)
    }

    pub fn nonterm_to_symbol(&self, nt: NonTermIndex) -> SymbolIndex {
        nt.to_symbol_index(self.term_count)
    }

    pub fn terminal(&self, t: TermIndex) -> &Terminal {
        &self.terminals[t]
    }

    pub fn terminals(&self) -> impl Iterator<Item = (TermIndex, &Terminal)> {
        self.terminals.indices().zip(self.terminals.iter())
    }

    pub fn nonterminal(&self, nt: NonTermIndex) -> &NonTerminalDef {
        &self.nonterminals[nt]
    }

    pub fn production(&self, p: ProdIndex) -> &Production {
        &self.productions[p]
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.productions.iter()
    }

    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    pub fn iterate_productions_of(&self, nt: NonTermIndex) -> &[ProdIndex] {
        &self.nonterminals[nt].productions
    }

    pub fn production_rhs_symbols(&self, p: ProdIndex) -> &[SymbolIndex] {
        &self.productions[p].rhs
    }

    pub fn symbol_name(&self, sym: SymbolIndex) -> &str {
        if self.is_term(sym) {
            &self.terminals[self.symbol_to_term(sym)].name
        } else {
            &self.nonterminals[self.symbol_to_nonterm(sym)].name
        }
    }

    pub fn symbol_index(&self, name: &str) -> SymbolIndex {
        *self.names.get(name).unwrap_or_else(|| panic!("no such symbol: {name}"))
    }

    pub fn try_symbol_index(&self, name: &str) -> Option<SymbolIndex> {
        self.names.get(name).copied()
    }

    pub fn symbol_indexes(&self, names: &[&str]) -> Vec<SymbolIndex> {
        names.iter().map(|n| self.symbol_index(n)).collect()
    }

    pub fn symbol_names(&self, symbols: impl IntoIterator<Item = SymbolIndex>) -> Vec<String> {
        symbols.into_iter().map(|s| self.symbol_name(s).to_string()).collect()
    }

    pub fn new_termvec<T: Clone>(&self, default: T) -> TermVec<T> {
        TermVec(vec![default; self.term_count])
    }

    pub fn new_nontermvec<T: Clone>(&self, default: T) -> NonTermVec<T> {
        NonTermVec(vec![default; self.nonterminals.len()])
    }
}
