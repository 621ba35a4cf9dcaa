use glrparse::{DriverMode, Grammar, GrammarBuilder, Parser, Recognizer, Settings, Symbol, Tree};

/// `S -> A`, `A -> | 'x' A` (right recursion through a nullable tail), so an
/// empty `A` reduces through `EMPTY` and any run of `x`s parses
/// deterministically.
fn list_of_x_grammar() -> Grammar {
    let mut b = GrammarBuilder::new();
    let x = b.add_terminal("X", Recognizer::literal("x")).unwrap();
    let s = b.add_nonterminal("S").unwrap();
    let a = b.add_nonterminal("A").unwrap();
    b.set_start(s);
    b.add_production(s, vec![Symbol::NonTerminal(a)], Default::default()).unwrap();
    b.add_production(a, vec![], Default::default()).unwrap();
    b.add_production(a, vec![Symbol::Terminal(x), Symbol::NonTerminal(a)], Default::default()).unwrap();
    b.freeze().unwrap()
}

/// Counts the `x`s under the `S` root by walking down through its single
/// `A` child, which is either the empty production (no children) or `x A`.
fn count_xs(root: &Tree) -> usize {
    fn count_in_a(a: &Tree) -> usize {
        match a {
            Tree::NonTerminal { children, .. } if children.is_empty() => 0,
            Tree::NonTerminal { children, .. } => 1 + count_in_a(&children[1]),
            Tree::Terminal { .. } => unreachable!("A never itself is a terminal node"),
        }
    }
    let Tree::NonTerminal { children, .. } = root else { panic!("root is S") };
    count_in_a(&children[0])
}

#[test]
fn empty_input_reduces_through_the_empty_production() {
    let settings = Settings { driver: DriverMode::Lr, ..Default::default() };
    let parser = Parser::new(list_of_x_grammar(), &settings).unwrap();
    let forest = parser.parse("").unwrap();
    let trees = forest.enumerate_trees(forest.root.unwrap());
    assert_eq!(trees.len(), 1);
    assert_eq!(count_xs(&trees[0]), 0);
}

#[test]
fn nonempty_input_counts_every_repetition() {
    let settings = Settings { driver: DriverMode::Lr, ..Default::default() };
    let parser = Parser::new(list_of_x_grammar(), &settings).unwrap();
    let forest = parser.parse("xxxxx").unwrap();
    let trees = forest.enumerate_trees(forest.root.unwrap());
    assert_eq!(trees.len(), 1);
    assert_eq!(count_xs(&trees[0]), 5);
}

#[test]
fn empty_production_also_works_under_glr() {
    let settings = Settings { driver: DriverMode::Glr, ..Default::default() };
    let parser = Parser::new(list_of_x_grammar(), &settings).unwrap();
    let forest = parser.parse("xx").unwrap();
    let trees = forest.enumerate_trees(forest.root.unwrap());
    assert_eq!(trees.len(), 1);
    assert_eq!(count_xs(&trees[0]), 2);
}
