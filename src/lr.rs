//! Component E: the deterministic LR driver.
//!
//! Grounded on `src/parser.rs`'s `Parser`/`Context` trait shapes and on the
//! generated `calculator.rs`'s shift/reduce/goto loop (`LRBuilder`), adapted
//! to run directly off a runtime `LrTable` instead of a codegen'd match
//! statement, and to recognize tokens scannerlessly per state rather than
//! pulling them from a separate lexer.

use crate::context::{CancellationToken, ErrorRecovery, RecoveryAction, Span};
use crate::error::{Error, Result};
use crate::forest::Forest;
use crate::grammar::Grammar;
use crate::index::{ForestNodeIndex, StateIndex, TermIndex};
use crate::recognizer::{select_token, Layout, TokenSelection};
use crate::table::{Action, LrTable};

pub struct LrParser<'g> {
    grammar: &'g Grammar,
    table: &'g LrTable,
    layout: Layout,
}

impl<'g> LrParser<'g> {
    pub fn new(grammar: &'g Grammar, table: &'g LrTable, layout: Layout) -> Self {
        Self { grammar, table, layout }
    }

    /// Parses all of `input`, returning the forest rooted at the accepted
    /// augmented production (`spec.md` §4.E). Every non-terminal node in the
    /// resulting forest has exactly one alternative, since the LR driver
    /// never forks.
    pub fn parse(&self, input: &str, cancel: &CancellationToken, recovery: &mut dyn ErrorRecovery) -> Result<Forest> {
        let mut forest = Forest::new();
        let mut stack: Vec<(StateIndex, Option<ForestNodeIndex>)> = vec![(self.table.start_state, None)];
        let mut position = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let state = stack.last().unwrap().0;
            let effective_pos = self.layout.skip(input, position);

            let candidates: Vec<TermIndex> = (0..self.grammar.term_count())
                .map(TermIndex)
                .filter(|&t| !self.table.actions(state, t).is_empty())
                .collect();

            match select_token(self.grammar, candidates.iter().copied(), input, effective_pos) {
                TokenSelection::None => {
                    match recovery.recover(effective_pos, &candidates, input) {
                        RecoveryAction::SkipTo(p) => {
                            position = p;
                            continue;
                        }
                        RecoveryAction::InsertToken(term, text) => {
                            let span = Span::new(effective_pos, effective_pos + text.len());
                            let node = forest.add_terminal(term, span);
                            let Action::Shift(target) = single_action(self.table, state, term) else {
                                return Err(parse_error(input, effective_pos, &candidates));
                            };
                            stack.push((target, Some(node)));
                            position = effective_pos;
                            continue;
                        }
                        RecoveryAction::Abort => return Err(parse_error(input, effective_pos, &candidates)),
                    }
                }
                TokenSelection::Ambiguous(cands, _) => {
                    return Err(Error::Disambiguation { position: effective_pos, candidates: cands });
                }
                TokenSelection::One(term, len) => {
                    let action = single_action(self.table, state, term);
                    match action {
                        Action::Shift(target) => {
                            let span = Span::new(effective_pos, effective_pos + len);
                            let node = forest.add_terminal(term, span);
                            stack.push((target, Some(node)));
                            position = effective_pos + len;
                        }
                        Action::Reduce(prod) => {
                            let rhs_len = self.grammar.production_rhs_symbols(prod).len();
                            let mut children = Vec::with_capacity(rhs_len);
                            let mut span = Span::new(effective_pos, effective_pos);
                            for _ in 0..rhs_len {
                                let (_, node) = stack.pop().expect("stack underflow during reduce");
                                if let Some(node) = node {
                                    span = forest.span(node).merge(span);
                                    children.push(node);
                                }
                            }
                            children.reverse();
                            let lhs = self.grammar.production(prod).lhs;
                            let goto_state = self
                                .table
                                .goto(stack.last().unwrap().0, lhs)
                                .expect("GOTO undefined for a production just reduced");
                            let node = forest.add_nonterminal(lhs, prod, span, children);
                            stack.push((goto_state, Some(node)));
                        }
                        Action::Accept => {
                            // Top of stack is the `$` leaf just shifted to
                            // complete `S' -> S $ .`; the forest root is the
                            // start symbol's node one level below it.
                            stack.pop().expect("accept with empty stack");
                            let (_, root) = stack.pop().expect("accept with only the `$` leaf on the stack");
                            forest.root = root;
                            return Ok(forest);
                        }
                        Action::Error => return Err(parse_error(input, effective_pos, &candidates)),
                    }
                }
            }
        }
    }
}

fn single_action(table: &LrTable, state: StateIndex, term: TermIndex) -> Action {
    let actions = table.actions(state, term);
    debug_assert!(actions.len() <= 1, "LR table must be conflict-free; GLR tables should use glr::GlrParser");
    actions.first().copied().unwrap_or(Action::Error)
}

fn parse_error(input: &str, position: usize, expected: &[TermIndex]) -> Error {
    let (line, column) = line_column(input, position);
    let context = input.get(position..).unwrap_or("").chars().take(16).collect::<String>();
    Error::Parse { position, line, column, expected: expected.to_vec(), context }
}

fn line_column(input: &str, position: usize) -> (usize, usize) {
    let before = &input[..position.min(input.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map(|i| position - i).unwrap_or(position + 1);
    (line, column)
}

