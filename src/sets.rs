//! Component C (part 1): nullable / FIRST / FOLLOW fixed-point computation.
//!
//! Grounded on the teacher's `src/table.rs` `first_sets`/`firsts`/`follow_sets`
//! (Dragon book references preserved), completed for the full grammar (the
//! teacher's prototype stopped at `closure`, mid-development, with a
//! `todo!()`).

use std::collections::HashSet;

use crate::grammar::Grammar;
use crate::index::{SymbolIndex, SymbolVec};

pub type Firsts = HashSet<SymbolIndex>;
pub type FirstSets = SymbolVec<Firsts>;
pub type Follow = HashSet<SymbolIndex>;
pub type FollowSets = SymbolVec<Follow>;

/// Calculates the sets of terminals (plus the `EMPTY` sentinel) that can
/// start the sentence derived from each grammar symbol. Dragon book p.221.
pub fn first_sets(grammar: &Grammar) -> FirstSets {
    let mut sets: FirstSets = SymbolVec::new();
    for _ in 0..grammar.symbol_count() {
        sets.push(Firsts::new());
    }

    for (t, _) in grammar.terminals() {
        sets[t.to_symbol_index()].insert(t.to_symbol_index());
    }
    // EMPTY derives EMPTY: the sentinel is its own first set.
    sets[grammar.empty_index()].insert(grammar.empty_index());

    let mut changed = true;
    while changed {
        changed = false;
        for production in grammar.productions() {
            let lhs_symbol = grammar.nonterm_to_symbol(production.lhs);
            let before = sets[lhs_symbol].len();
            let rhs_firsts = firsts_of_sequence(grammar, &sets, &production.rhs);
            sets[lhs_symbol].extend(rhs_firsts);
            if sets[lhs_symbol].len() > before {
                changed = true;
            }
        }
    }
    sets
}

/// FIRST of a symbol sequence: the set of terminals that can start it, plus
/// the `EMPTY` sentinel iff every symbol in the sequence is nullable.
pub fn firsts_of_sequence(grammar: &Grammar, first_sets: &FirstSets, symbols: &[SymbolIndex]) -> Firsts {
    let mut result = Firsts::new();
    let mut all_nullable = true;
    for &symbol in symbols {
        let mut symbol_is_nullable = false;
        for &first in &first_sets[symbol] {
            if first == grammar.empty_index() {
                symbol_is_nullable = true;
            } else {
                result.insert(first);
            }
        }
        if !symbol_is_nullable {
            all_nullable = false;
            break;
        }
    }
    if all_nullable {
        result.insert(grammar.empty_index());
    }
    result
}

pub fn is_nullable(grammar: &Grammar, first_sets: &FirstSets, symbol: SymbolIndex) -> bool {
    first_sets[symbol].contains(&grammar.empty_index())
}

/// Calculates the sets of terminals that can follow each non-terminal.
/// Dragon book p.221.
pub fn follow_sets(grammar: &Grammar, first_sets: &FirstSets) -> FollowSets {
    let mut sets: FollowSets = SymbolVec::new();
    for _ in 0..grammar.symbol_count() {
        sets.push(Follow::new());
    }

    // Rule 1: $ (STOP) is in FOLLOW(start).
    sets[grammar.start_index()].insert(grammar.stop_index());
    sets[grammar.augmented_index()].insert(grammar.stop_index());

    let mut changed = true;
    while changed {
        changed = false;
        for production in grammar.productions() {
            let lhs_symbol = grammar.nonterm_to_symbol(production.lhs);
            for idx in 0..production.rhs.len() {
                let rhs_symbol = production.rhs[idx];
                let before = sets[rhs_symbol].len();

                let rest = &production.rhs[idx + 1..];
                let rest_firsts = firsts_of_sequence(grammar, first_sets, rest);
                sets[rhs_symbol].extend(rest_firsts.iter().filter(|&&s| s != grammar.empty_index()));

                if rest_firsts.contains(&grammar.empty_index()) {
                    // Rule 3: everything that can follow the LHS can follow
                    // this RHS symbol too, since the rest of the production
                    // can vanish.
                    let lhs_follow: Vec<_> = sets[lhs_symbol].iter().copied().collect();
                    sets[rhs_symbol].extend(lhs_follow);
                }

                if sets[rhs_symbol].len() > before {
                    changed = true;
                }
            }
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::grammar::{Assoc, GrammarBuilder, ProductionMeta, Symbol};
    use crate::recognizer::Recognizer;

    /// `E: T Ep; Ep: "+" T Ep | EMPTY; T: F Tp; Tp: "*" F Tp | EMPTY; F: "(" E ")" | "id";`
    fn arith_grammar() -> Grammar {
        let mut b = GrammarBuilder::new();
        let plus = b.add_terminal("+", Recognizer::literal("+")).unwrap();
        let star = b.add_terminal("*", Recognizer::literal("*")).unwrap();
        let lparen = b.add_terminal("(", Recognizer::literal("(")).unwrap();
        let rparen = b.add_terminal(")", Recognizer::literal(")")).unwrap();
        let id = b.add_terminal("id", Recognizer::literal("id")).unwrap();

        let e = b.add_nonterminal("E").unwrap();
        let ep = b.add_nonterminal("Ep").unwrap();
        let t = b.add_nonterminal("T").unwrap();
        let tp = b.add_nonterminal("Tp").unwrap();
        let f = b.add_nonterminal("F").unwrap();
        b.set_start(e);

        b.add_production(e, vec![Symbol::NonTerminal(t), Symbol::NonTerminal(ep)], ProductionMeta::default()).unwrap();
        b.add_production(
            ep,
            vec![Symbol::Terminal(plus), Symbol::NonTerminal(t), Symbol::NonTerminal(ep)],
            ProductionMeta::default(),
        )
        .unwrap();
        b.add_production(ep, vec![], ProductionMeta::default()).unwrap();
        b.add_production(t, vec![Symbol::NonTerminal(f), Symbol::NonTerminal(tp)], ProductionMeta::default()).unwrap();
        b.add_production(
            tp,
            vec![Symbol::Terminal(star), Symbol::NonTerminal(f), Symbol::NonTerminal(tp)],
            ProductionMeta::default(),
        )
        .unwrap();
        b.add_production(tp, vec![], ProductionMeta::default()).unwrap();
        b.add_production(
            f,
            vec![Symbol::Terminal(lparen), Symbol::NonTerminal(e), Symbol::Terminal(rparen)],
            ProductionMeta::default(),
        )
        .unwrap();
        b.add_production(f, vec![Symbol::Terminal(id)], ProductionMeta::default()).unwrap();
        let _ = Assoc::Left; // keep Assoc import exercised across the test module
        b.freeze().unwrap()
    }

    #[test]
    fn first_sets_of_arith_grammar() {
        let grammar = arith_grammar();
        let first = first_sets(&grammar);

        assert_eq!(
            first[grammar.symbol_index("id")],
            HashSet::from_iter(grammar.symbol_indexes(&["id"]))
        );
        assert_eq!(
            first[grammar.symbol_index("F")],
            HashSet::from_iter(grammar.symbol_indexes(&["(", "id"]))
        );
        assert_eq!(
            first[grammar.symbol_index("T")],
            HashSet::from_iter(grammar.symbol_indexes(&["(", "id"]))
        );
        assert_eq!(
            first[grammar.symbol_index("E")],
            HashSet::from_iter(grammar.symbol_indexes(&["(", "id"]))
        );
        assert_eq!(
            first[grammar.symbol_index("Ep")],
            HashSet::from_iter(grammar.symbol_indexes(&["+", "EMPTY"]))
        );
        assert_eq!(
            first[grammar.symbol_index("Tp")],
            HashSet::from_iter(grammar.symbol_indexes(&["*", "EMPTY"]))
        );
    }

    #[test]
    fn follow_sets_of_arith_grammar() {
        let grammar = arith_grammar();
        let follow = follow_sets(&grammar, &first_sets(&grammar));

        assert_eq!(
            follow[grammar.symbol_index("E")],
            HashSet::from_iter(grammar.symbol_indexes(&[")", "STOP"]))
        );
        assert_eq!(
            follow[grammar.symbol_index("Ep")],
            HashSet::from_iter(grammar.symbol_indexes(&[")", "STOP"]))
        );
        assert_eq!(
            follow[grammar.symbol_index("T")],
            HashSet::from_iter(grammar.symbol_indexes(&["+", ")", "STOP"]))
        );
        assert_eq!(
            follow[grammar.symbol_index("Tp")],
            HashSet::from_iter(grammar.symbol_indexes(&["+", ")", "STOP"]))
        );
    }
}
