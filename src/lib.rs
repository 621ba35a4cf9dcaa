//! A scannerless LR(1)/LALR parser generator and GLR runtime.
//!
//! Callers build a [`Grammar`] through [`GrammarBuilder`], configure a
//! [`Settings`], and get back a [`Parser`] that drives either the
//! deterministic LR automaton ([`lr::LrParser`]) or the generalized (GSS-
//! based) driver ([`glr::GlrParser`]) over a shared parse [`Forest`].
//!
//! There is deliberately no surface grammar syntax or code generation step
//! here (unlike the teacher crate this one grew out of): grammars are
//! declared directly against the IR, since turning grammar text into that IR
//! is a separate concern from building and running the automaton.

pub mod context;
pub mod debug;
pub mod error;
pub mod forest;
pub mod glr;
pub mod grammar;
pub mod index;
pub mod item;
pub mod lr;
pub mod recognizer;
pub mod sets;
pub mod table;

pub use context::{skip_char, CancellationToken, Dispatcher, ErrorRecovery, NoRecovery, RecoveryAction, SkipChar, Span};
pub use error::{ConflictKind, Error, GrammarError, Result, TableConflictError};
pub use forest::{Alternative, Forest, ForestNode, Tree};
pub use grammar::{Assoc, DynamicId, Grammar, GrammarBuilder, Production, ProductionMeta, Symbol};
pub use recognizer::Recognizer;
pub use table::{Action, DriverMode, DynamicResolver, TableKind};

use std::path::Path;

use index::TermIndex;
use recognizer::Layout;
use table::TableOptions;

/// Configuration for building a [`Parser`] from a frozen [`Grammar`].
///
/// Grounded on the generated `calculator.rs`'s `Settings`-shaped argument
/// bundle passed to its `Parser::new` (`build_tree`, `ws` there are literal
/// fields of the generated config); `driver` and `dynamic_resolver` are
/// additions this crate needs since it builds one grammar two different ways
/// (component E vs F) instead of generating a single fixed driver.
pub struct Settings<'a> {
    /// If set, must name the same non-terminal the grammar was frozen with
    /// ([`GrammarBuilder::set_start`]); checked eagerly by [`Parser::new`].
    /// This crate's IR only supports one start symbol per frozen grammar, so
    /// this field exists purely as a cross-check, not a second source of
    /// truth.
    pub start_symbol: Option<String>,
    /// Whitespace character class skipped between tokens (default `" \t\n\r"`).
    /// Superseded by `layout` when both are set.
    pub ws: Option<String>,
    /// A regular expression describing layout (whitespace and/or comments),
    /// skipped repeatedly so alternating comment/whitespace runs are all
    /// consumed in one step.
    pub layout: Option<String>,
    /// Whether `Parser::parse` retains the built forest. When `false` the
    /// parse still has to build it internally (shift/reduce need somewhere
    /// to attach children), but it is dropped before returning.
    pub build_tree: bool,
    pub tables: TableKind,
    /// Which component drives the parse: the deterministic automaton
    /// ([`DriverMode::Lr`], fails to build on any unresolved conflict) or the
    /// GSS-based one ([`DriverMode::Glr`], keeps every action).
    pub driver: DriverMode,
    /// Whether an unresolved shift/reduce conflict prefers the shift, when
    /// `driver` is `Lr` (`spec.md` §9 open question: this has no effect
    /// under `Glr`, where both actions are always kept).
    pub prefer_shifts: bool,
    /// Consulted by the driver when a `dynamic`-tagged production sits in an
    /// otherwise unresolved conflict.
    pub dynamic_resolver: Option<&'a dyn DynamicResolver>,
    /// A pluggable error-recovery hook (`spec.md` §6), consulted by
    /// [`Parser::parse`]/[`Parser::parse_file`]. Given as a plain `fn` rather
    /// than a `dyn ErrorRecovery` so it can live in a `Settings` value that is
    /// `Copy`-free but otherwise ordinary data; implement [`ErrorRecovery`]
    /// directly and call [`Parser::parse_with`] instead if the hook needs to
    /// carry state across recoveries. Defaults to [`context::skip_char`]; set
    /// to `None` to abort at the first error instead.
    pub error_recovery: Option<fn(usize, &[TermIndex], &str) -> RecoveryAction>,
    pub debug: bool,
}

impl Default for Settings<'_> {
    fn default() -> Self {
        Self {
            start_symbol: None,
            ws: Some(" \t\n\r".to_string()),
            layout: None,
            build_tree: true,
            tables: TableKind::Lalr,
            driver: DriverMode::Glr,
            prefer_shifts: false,
            dynamic_resolver: None,
            error_recovery: Some(context::skip_char),
            debug: false,
        }
    }
}

struct FnRecovery(Option<fn(usize, &[TermIndex], &str) -> RecoveryAction>);

impl ErrorRecovery for FnRecovery {
    fn recover(&mut self, position: usize, expected: &[TermIndex], input: &str) -> RecoveryAction {
        match self.0 {
            Some(f) => f(position, expected, input),
            None => RecoveryAction::Abort,
        }
    }
}

/// A grammar together with its built ACTION/GOTO tables, ready to parse.
/// Immutable and shareable across threads once constructed (`spec.md` §5);
/// parsing itself is single-threaded per call.
pub struct Parser {
    grammar: Grammar,
    table: table::LrTable,
    layout: Layout,
    driver: DriverMode,
    build_tree: bool,
    error_recovery: Option<fn(usize, &[TermIndex], &str) -> RecoveryAction>,
}

impl Parser {
    pub fn new(grammar: Grammar, settings: &Settings<'_>) -> Result<Self> {
        if let Some(name) = &settings.start_symbol {
            let requested = grammar
                .try_symbol_index(name)
                .ok_or_else(|| GrammarError::UndefinedSymbol(name.clone()))?;
            if requested != grammar.start_index() {
                return Err(GrammarError::UndefinedSymbol(format!(
                    "`{name}` is not the start symbol this grammar was frozen with"
                ))
                .into());
            }
        }

        let options = TableOptions {
            kind: settings.tables,
            mode: settings.driver,
            prefer_shifts: settings.prefer_shifts,
            dynamic_resolver: settings.dynamic_resolver,
        };
        let table = table::LrTable::build(&grammar, &options)?;

        let layout = match &settings.layout {
            Some(pattern) => {
                let re = regex::Regex::new(pattern).map_err(|e| GrammarError::UndefinedSymbol(format!("invalid layout pattern: {e}")))?;
                Layout::Pattern(re)
            }
            None => match &settings.ws {
                Some(chars) => Layout::Chars(chars.clone()),
                None => Layout::None,
            },
        };

        if settings.debug {
            debug::set_enabled(true);
        }

        Ok(Self {
            grammar,
            table,
            layout,
            driver: settings.driver,
            build_tree: settings.build_tree,
            error_recovery: settings.error_recovery,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn table(&self) -> &table::LrTable {
        &self.table
    }

    /// Parses `input` with a fresh, never-cancelled token, using whatever
    /// `Settings::error_recovery` hook the parser was built with (the
    /// builtin [`context::skip_char`] policy, unless overridden or disabled).
    /// Equivalent to `parse_with` with that hook wrapped in an
    /// [`ErrorRecovery`] impl.
    pub fn parse(&self, input: &str) -> Result<Forest> {
        let cancel = CancellationToken::new();
        self.parse_with(input, &cancel, &mut FnRecovery(self.error_recovery))
    }

    pub fn parse_with(&self, input: &str, cancel: &CancellationToken, recovery: &mut dyn ErrorRecovery) -> Result<Forest> {
        let mut forest = match self.driver {
            DriverMode::Lr => lr::LrParser::new(&self.grammar, &self.table, self.layout.clone()).parse(input, cancel, recovery)?,
            DriverMode::Glr => glr::GlrParser::new(&self.grammar, &self.table, self.layout.clone()).parse(input, cancel)?,
        };
        if !self.build_tree {
            forest.root = None;
        }
        Ok(forest)
    }

    /// Reads `path` and parses its contents. The closed `Error` set has no
    /// I/O variant, so a read failure is reported as a `ParseError` at
    /// position 0 with the OS error text carried in `context`.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Forest> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Parse {
            position: 0,
            line: 1,
            column: 1,
            expected: vec![],
            context: format!("could not read {}: {e}", path.as_ref().display()),
        })?;
        self.parse(&content)
    }
}
