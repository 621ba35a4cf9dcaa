mod common;

use glrparse::{DriverMode, Parser, Settings};

#[test]
fn four_operands_yield_catalan_three_trees() {
    let grammar = common::expr_ambiguous();
    let settings = Settings { driver: DriverMode::Glr, ..Default::default() };
    let parser = Parser::new(grammar, &settings).expect("GLR tables build even with unresolved conflicts");

    assert!(!parser.table().conflicts.is_empty(), "ambiguous `+` must leave an unresolved shift/reduce conflict");

    let forest = parser.parse("id+id+id+id").unwrap();
    let root = forest.root.unwrap();
    assert!(forest.is_ambiguous(root));

    let trees = forest.enumerate_trees(root);
    assert_eq!(trees.len(), 5, "4 operands joined by ambiguous `+` must fully parenthesize Catalan(3) = 5 ways");
}

#[test]
fn unambiguous_single_operand_has_one_tree() {
    let grammar = common::expr_ambiguous();
    let settings = Settings { driver: DriverMode::Glr, ..Default::default() };
    let parser = Parser::new(grammar, &settings).unwrap();

    let forest = parser.parse("id").unwrap();
    let root = forest.root.unwrap();
    assert!(!forest.is_ambiguous(root));
    assert_eq!(forest.enumerate_trees(root).len(), 1);
}
