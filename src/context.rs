//! Shared parse-time context: byte spans, the opaque action dispatcher, the
//! cooperative cancellation flag, and the error-recovery hook contract.
//!
//! Grounded on the teacher's generated `Builder`/`LRBuilder` traits
//! (`docs/src/tutorials/calculator/calculator1/src/calculator.rs`), which
//! dispatch `shift_action`/`reduce_action` over a `res_stack: Vec<Symbol>`;
//! here the dispatcher is written once against the runtime grammar IR instead
//! of being re-generated per grammar.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::index::{ProdIndex, TermIndex};

/// A byte-offset range into the original input, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }
}

/// Invoked once per terminal shift / production reduce while walking a
/// disambiguated parse tree (`forest::invoke_actions`). `T` is whatever the
/// caller's semantic actions produce (an AST node, a computed value, ...).
/// Grounded on the `Builder` trait's `shift_action`/`get_action` dispatch.
pub trait Dispatcher<T> {
    fn shift(&mut self, term: TermIndex, span: Span, matched_text: &str) -> T;
    fn reduce(&mut self, production: ProdIndex, span: Span, children: Vec<T>) -> T;
}

/// A cooperative cancellation flag threaded through the LR/GLR drivers
/// (`spec.md` §5, single-threaded concurrency model). Checked at the top of
/// every frontier/reduction/shift step; parsing stops with `Error::Cancelled`
/// as soon as it is observed set, it is never polled by a background thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What an error-recovery hook asks the driver to do after a parse error.
pub enum RecoveryAction {
    /// Skip forward to `position` and retry.
    SkipTo(usize),
    /// Act as though `term` had been recognized with the given text, then
    /// retry the shift.
    InsertToken(TermIndex, String),
    /// Give up; the driver returns the original `ParseError`.
    Abort,
}

/// Consulted by the LR driver (and, per head, the GLR driver) when no action
/// applies for the current state and lookahead (`spec.md` §6, error recovery
/// hook contract). Receiving `expected` lets the hook report or pick among
/// the terminals that would have been accepted.
pub trait ErrorRecovery {
    fn recover(&mut self, position: usize, expected: &[TermIndex], input: &str) -> RecoveryAction;
}

/// A policy that never recovers; useful when a caller wants parsing to stop
/// at the first error regardless of `Settings::error_recovery`.
pub struct NoRecovery;

impl ErrorRecovery for NoRecovery {
    fn recover(&mut self, _position: usize, _expected: &[TermIndex], _input: &str) -> RecoveryAction {
        RecoveryAction::Abort
    }
}

/// The builtin default policy (`spec.md` §6): advance past one code point
/// and reattempt the parse from there. Aborts instead once the input is
/// exhausted, since there is nothing left to skip.
pub fn skip_char(position: usize, _expected: &[TermIndex], input: &str) -> RecoveryAction {
    match input[position..].chars().next() {
        Some(c) => RecoveryAction::SkipTo(position + c.len_utf8()),
        None => RecoveryAction::Abort,
    }
}

/// An [`ErrorRecovery`] wrapper around [`skip_char`], for callers driving
/// [`crate::Parser::parse_with`] directly instead of through `Settings`.
pub struct SkipChar;

impl ErrorRecovery for SkipChar {
    fn recover(&mut self, position: usize, expected: &[TermIndex], input: &str) -> RecoveryAction {
        skip_char(position, expected, input)
    }
}
