mod common;

use glrparse::{DriverMode, Parser, Settings, Tree};

#[test]
fn precedence_and_associativity_give_a_single_tree() {
    let grammar = common::expr_with_precedence();
    let settings = Settings { driver: DriverMode::Lr, ..Default::default() };
    let parser = Parser::new(grammar, &settings).expect("LR table must build without conflicts");

    let forest = parser.parse("id+id*id").expect("valid input");
    assert!(!forest.is_ambiguous(forest.root.unwrap()));

    let trees = forest.enumerate_trees(forest.root.unwrap());
    assert_eq!(trees.len(), 1);

    // id + (id * id): the top-level split is at the `+`, with the `*`
    // sub-expression as its right child.
    let Tree::NonTerminal { children, .. } = &trees[0] else { panic!("root is E") };
    assert_eq!(children.len(), 3);
    let Tree::NonTerminal { children: rhs_children, .. } = &children[2] else {
        panic!("rightmost child of the top split must be the `*` sub-expression")
    };
    assert_eq!(rhs_children.len(), 3);
}

#[test]
fn left_associativity_nests_on_the_left() {
    let grammar = common::expr_with_precedence();
    let settings = Settings { driver: DriverMode::Lr, ..Default::default() };
    let parser = Parser::new(grammar, &settings).unwrap();

    let forest = parser.parse("id+id+id").unwrap();
    let trees = forest.enumerate_trees(forest.root.unwrap());
    assert_eq!(trees.len(), 1);

    let Tree::NonTerminal { children, .. } = &trees[0] else { panic!("root is E") };
    let Tree::NonTerminal { children: lhs_children, .. } = &children[0] else {
        panic!("leftmost child of a left-associative chain must itself be a split")
    };
    assert_eq!(lhs_children.len(), 3);
}
