//! Grammars shared across the arithmetic-expression integration tests.

use glrparse::{Assoc, Grammar, GrammarBuilder, ProductionMeta, Recognizer, Symbol};

/// `E -> E + E | E * E | id`, with `*` binding tighter than `+` and both
/// left-associative, so `id+id*id` has exactly one parse.
pub fn expr_with_precedence() -> Grammar {
    let mut b = GrammarBuilder::new();
    let plus = b.add_terminal_with("PLUS", Recognizer::literal("+"), 1, false).unwrap();
    let star = b.add_terminal_with("STAR", Recognizer::literal("*"), 2, false).unwrap();
    let id = b.add_terminal("ID", Recognizer::regex("[a-z][a-z0-9]*").unwrap()).unwrap();
    let e = b.add_nonterminal("E").unwrap();
    b.set_start(e);

    b.add_production(
        e,
        vec![Symbol::NonTerminal(e), Symbol::Terminal(plus), Symbol::NonTerminal(e)],
        ProductionMeta { priority: Some(1), assoc: Some(Assoc::Left), ..Default::default() },
    )
    .unwrap();
    b.add_production(
        e,
        vec![Symbol::NonTerminal(e), Symbol::Terminal(star), Symbol::NonTerminal(e)],
        ProductionMeta { priority: Some(2), assoc: Some(Assoc::Left), ..Default::default() },
    )
    .unwrap();
    b.add_production(e, vec![Symbol::Terminal(id)], Default::default()).unwrap();

    b.freeze().unwrap()
}

/// The same shape of grammar but with no precedence or associativity
/// declared on either operator production, so every chain of `+`s is
/// genuinely ambiguous under GLR.
pub fn expr_ambiguous() -> Grammar {
    let mut b = GrammarBuilder::new();
    let plus = b.add_terminal("PLUS", Recognizer::literal("+")).unwrap();
    let id = b.add_terminal("ID", Recognizer::regex("[a-z][a-z0-9]*").unwrap()).unwrap();
    let e = b.add_nonterminal("E").unwrap();
    b.set_start(e);

    b.add_production(e, vec![Symbol::NonTerminal(e), Symbol::Terminal(plus), Symbol::NonTerminal(e)], Default::default()).unwrap();
    b.add_production(e, vec![Symbol::Terminal(id)], Default::default()).unwrap();

    b.freeze().unwrap()
}
