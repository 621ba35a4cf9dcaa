//! The classic dangling-else ambiguity: `if c then if c then other else other`
//! can attach the `else` to either `if`. Under GLR both derivations survive
//! as packed alternatives; under LR with `prefer_shifts` the shift/reduce
//! conflict defaults to shifting, which binds `else` to the nearest `if`.

use glrparse::{DriverMode, Grammar, GrammarBuilder, Parser, Recognizer, Settings, Symbol};

fn dangling_else_grammar() -> Grammar {
    let mut b = GrammarBuilder::new();
    let kw_if = b.add_terminal("IF", Recognizer::literal("if")).unwrap();
    let kw_then = b.add_terminal("THEN", Recognizer::literal("then")).unwrap();
    let kw_else = b.add_terminal("ELSE", Recognizer::literal("else")).unwrap();
    let cond = b.add_terminal("COND", Recognizer::literal("c")).unwrap();
    let other = b.add_terminal("OTHER", Recognizer::literal("other")).unwrap();

    let stmt = b.add_nonterminal("Stmt").unwrap();
    b.set_start(stmt);

    b.add_production(
        stmt,
        vec![
            Symbol::Terminal(kw_if),
            Symbol::Terminal(cond),
            Symbol::Terminal(kw_then),
            Symbol::NonTerminal(stmt),
            Symbol::Terminal(kw_else),
            Symbol::NonTerminal(stmt),
        ],
        Default::default(),
    )
    .unwrap();
    b.add_production(
        stmt,
        vec![Symbol::Terminal(kw_if), Symbol::Terminal(cond), Symbol::Terminal(kw_then), Symbol::NonTerminal(stmt)],
        Default::default(),
    )
    .unwrap();
    b.add_production(stmt, vec![Symbol::Terminal(other)], Default::default()).unwrap();

    b.freeze().unwrap()
}

const INPUT: &str = "if c then if c then other else other";

#[test]
fn glr_keeps_both_attachments() {
    let settings = Settings { driver: DriverMode::Glr, ..Default::default() };
    let parser = Parser::new(dangling_else_grammar(), &settings).unwrap();
    assert!(!parser.table().conflicts.is_empty());

    let forest = parser.parse(INPUT).unwrap();
    let root = forest.root.unwrap();
    assert!(forest.is_ambiguous(root));
    assert_eq!(forest.enumerate_trees(root).len(), 2);
}

#[test]
fn lr_with_prefer_shifts_picks_the_nearest_if() {
    let settings = Settings { driver: DriverMode::Lr, prefer_shifts: true, ..Default::default() };
    let parser = Parser::new(dangling_else_grammar(), &settings).expect("prefer_shifts resolves the conflict, table must build");

    let forest = parser.parse(INPUT).unwrap();
    let root = forest.root.unwrap();
    assert!(!forest.is_ambiguous(root));
    assert_eq!(forest.enumerate_trees(root).len(), 1);
}

#[test]
fn lr_without_prefer_shifts_fails_to_build() {
    let settings = Settings { driver: DriverMode::Lr, prefer_shifts: false, ..Default::default() };
    assert!(Parser::new(dangling_else_grammar(), &settings).is_err());
}
