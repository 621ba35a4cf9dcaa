//! A header-then-repeated-objects grammar, built directly through the IR
//! builder the way a structured document format (e.g. a model-interchange
//! file with a preamble block followed by a list of object records) would
//! be declared without a surface grammar text parser.

use glrparse::{DriverMode, Grammar, GrammarBuilder, Parser, Recognizer, Settings, Symbol, Tree};

/// `Document -> Header Objects`
/// `Header -> 'BEGIN' NAME 'END'`
/// `Objects -> Objects Object | EMPTY` (left recursion, zero or more)
/// `Object -> 'OBJ' NAME`
fn header_objects_grammar() -> Grammar {
    let mut b = GrammarBuilder::new();
    let begin = b.add_terminal("BEGIN", Recognizer::literal("BEGIN")).unwrap();
    let end = b.add_terminal("END", Recognizer::literal("END")).unwrap();
    let obj_kw = b.add_terminal_with("OBJ", Recognizer::literal("OBJ"), 1, true).unwrap();
    let name = b.add_terminal("NAME", Recognizer::regex("[A-Za-z_][A-Za-z0-9_]*").unwrap()).unwrap();

    let document = b.add_nonterminal("Document").unwrap();
    let header = b.add_nonterminal("Header").unwrap();
    let objects = b.add_nonterminal("Objects").unwrap();
    let object = b.add_nonterminal("Object").unwrap();
    b.set_start(document);

    b.add_production(document, vec![Symbol::NonTerminal(header), Symbol::NonTerminal(objects)], Default::default()).unwrap();
    b.add_production(
        header,
        vec![Symbol::Terminal(begin), Symbol::Terminal(name), Symbol::Terminal(end)],
        Default::default(),
    )
    .unwrap();
    b.add_production(objects, vec![], Default::default()).unwrap();
    b.add_production(objects, vec![Symbol::NonTerminal(objects), Symbol::NonTerminal(object)], Default::default()).unwrap();
    b.add_production(object, vec![Symbol::Terminal(obj_kw), Symbol::Terminal(name)], Default::default()).unwrap();

    b.freeze().unwrap()
}

fn count_objects(document: &Tree) -> usize {
    fn count_in_objects(objects: &Tree) -> usize {
        match objects {
            Tree::NonTerminal { children, .. } if children.is_empty() => 0,
            Tree::NonTerminal { children, .. } => count_in_objects(&children[0]) + 1,
            Tree::Terminal { .. } => unreachable!(),
        }
    }
    let Tree::NonTerminal { children, .. } = document else { panic!("root is Document") };
    count_in_objects(&children[1])
}

#[test]
fn header_with_no_objects() {
    let settings = Settings { driver: DriverMode::Lr, ws: Some(" \t\n\r".to_string()), ..Default::default() };
    let parser = Parser::new(header_objects_grammar(), &settings).unwrap();
    let forest = parser.parse("BEGIN Config END").unwrap();
    let trees = forest.enumerate_trees(forest.root.unwrap());
    assert_eq!(trees.len(), 1);
    assert_eq!(count_objects(&trees[0]), 0);
}

#[test]
fn header_with_several_objects() {
    let settings = Settings { driver: DriverMode::Lr, ..Default::default() };
    let parser = Parser::new(header_objects_grammar(), &settings).unwrap();
    let forest = parser.parse("BEGIN Config END OBJ Foo OBJ Bar OBJ Baz").unwrap();
    let trees = forest.enumerate_trees(forest.root.unwrap());
    assert_eq!(trees.len(), 1);
    assert_eq!(count_objects(&trees[0]), 3);
}
