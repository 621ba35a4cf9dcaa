//! Component B: the recognizer registry.
//!
//! A recognizer is a pure, position-indexed function `(input, position) ->
//! match_length | none`. It never consumes beyond the returned length. This
//! mirrors the teacher's generated `TokenRecognizer`/`Recognizer` enum
//! (`docs/src/tutorials/calculator/calculator1/src/calculator.rs`), adapted
//! from a generated per-grammar enum to a runtime value stored per terminal,
//! since terminals are declared through the IR builder rather than codegen.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::grammar::Grammar;
use crate::index::TermIndex;

/// What a recognizer matched, beyond the plain `&str` slice of the input.
/// Most recognizers have no extra payload; kept as a hook for future
/// structured token values without changing the trait surface.
pub type RecognizedValue = ();

#[derive(Clone)]
pub enum Recognizer {
    /// Exact byte/codepoint match of a fixed string.
    Literal(String),
    /// Longest match of a regular expression anchored at `position`.
    Regex(RegexRecognizer),
    /// Matches length 0 iff `position == input.len()`.
    EndOfInput,
    /// Matches length 0 unconditionally. Used for `EMPTY` productions.
    Empty,
}

#[derive(Clone)]
pub struct RegexRecognizer {
    anchored: Regex,
}

impl RegexRecognizer {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        // Anchor at the start the way the teacher's generated recognizers do
        // (`Regex::new(concat!("^", pattern))`), so a "longest match" search
        // over the whole remaining input is also a match "at position".
        let anchored = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Self { anchored })
    }
}

impl Recognizer {
    pub fn literal(s: impl Into<String>) -> Self {
        Recognizer::Literal(s.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Recognizer::Regex(RegexRecognizer::new(pattern)?))
    }

    pub fn end_of_input() -> Self {
        Recognizer::EndOfInput
    }

    pub fn empty() -> Self {
        Recognizer::Empty
    }

    /// Whether this recognizer is a string literal (used by the "keywords
    /// over identifiers" tie-break in the selection policy).
    pub fn is_literal(&self) -> bool {
        matches!(self, Recognizer::Literal(_))
    }

    /// Attempts a match at `input[position..]`. Returns the match length, or
    /// `None`. Never inspects input past `position + match_length`.
    pub fn recognize(&self, input: &str, position: usize) -> Option<usize> {
        match self {
            Recognizer::Literal(lit) => {
                input.get(position..)?.starts_with(lit.as_str()).then(|| lit.len())
            }
            Recognizer::Regex(r) => {
                let rest = input.get(position..)?;
                r.anchored.find(rest).map(|m| m.end())
            }
            Recognizer::EndOfInput => (position == input.len()).then_some(0),
            Recognizer::Empty => Some(0),
        }
    }
}

/// Default whitespace class used when the grammar declares no `LAYOUT`
/// non-terminal (`spec.md` §4.B): spaces, tabs and newlines.
static DEFAULT_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t\n\r]+").unwrap());

/// How layout (whitespace, comments) is skipped between tokens, chosen from
/// `Settings::ws`/`Settings::layout`.
#[derive(Clone)]
pub enum Layout {
    /// A plain character class, skipped once per step (`Settings::ws`).
    Chars(String),
    /// An arbitrary regex (e.g. whitespace-or-comment), skipped repeatedly
    /// so alternating runs of whitespace and comments are all consumed
    /// (`Settings::layout`).
    Pattern(Regex),
    /// No layout skipping; every character is significant.
    None,
}

impl Layout {
    pub fn skip(&self, input: &str, position: usize) -> usize {
        match self {
            Layout::None => position,
            Layout::Chars(chars) => skip_default_layout(input, position, Some(chars)),
            Layout::Pattern(re) => {
                let mut pos = position;
                while let Some(m) = re.find(&input[pos..]) {
                    if m.start() != 0 || m.end() == 0 {
                        break;
                    }
                    pos += m.end();
                }
                pos
            }
        }
    }
}

/// Skips the configured whitespace class at `position`, returning the new
/// position. `ws` is the configured character class (`Settings::ws`); `None`
/// disables layout skipping entirely.
pub fn skip_default_layout(input: &str, position: usize, ws: Option<&str>) -> usize {
    match ws {
        None => position,
        Some(chars) => {
            let rest = &input[position..];
            if chars == "\t\n " || chars == " \t\n" {
                // Fast path: the documented default character class.
                match DEFAULT_WS.find(rest) {
                    Some(m) => position + m.end(),
                    None => position,
                }
            } else {
                let consumed = rest
                    .chars()
                    .take_while(|c| chars.contains(*c))
                    .map(|c| c.len_utf8())
                    .sum::<usize>();
                position + consumed
            }
        }
    }
}

/// Outcome of running the selection policy (`spec.md` §4.B.2) over every
/// terminal the current automaton state accepts.
pub enum TokenSelection {
    /// Exactly one terminal won, matching `length` bytes.
    One(TermIndex, usize),
    /// Two or more terminals are still tied after all four steps. The LR
    /// driver turns this into a `DisambiguationError`; the GLR driver forks.
    Ambiguous(Vec<TermIndex>, usize),
    /// No candidate terminal matched at this position.
    None,
}

/// Runs every candidate terminal's recognizer at `position` and applies the
/// selection policy: longest match first, then `prefer` flag among the
/// longest, then literal-over-regex, leaving anything still tied for the
/// caller to resolve.
pub fn select_token(
    grammar: &Grammar,
    candidates: impl IntoIterator<Item = TermIndex>,
    input: &str,
    position: usize,
) -> TokenSelection {
    let matches: Vec<(TermIndex, usize)> = candidates
        .into_iter()
        .filter_map(|t| grammar.terminal(t).recognizer.recognize(input, position).map(|len| (t, len)))
        .collect();
    if matches.is_empty() {
        return TokenSelection::None;
    }

    let max_len = matches.iter().map(|(_, l)| *l).max().unwrap();
    let longest: Vec<(TermIndex, usize)> = matches.into_iter().filter(|(_, l)| *l == max_len).collect();
    if longest.len() == 1 {
        return TokenSelection::One(longest[0].0, longest[0].1);
    }

    let preferred: Vec<(TermIndex, usize)> = longest.iter().copied().filter(|(t, _)| grammar.terminal(*t).prefer).collect();
    let pool = if preferred.len() == 1 {
        return TokenSelection::One(preferred[0].0, preferred[0].1);
    } else if preferred.is_empty() {
        longest
    } else {
        preferred
    };

    let literal: Vec<(TermIndex, usize)> = pool.iter().copied().filter(|(t, _)| grammar.terminal(*t).recognizer.is_literal()).collect();
    let tied = if literal.len() == 1 {
        return TokenSelection::One(literal[0].0, literal[0].1);
    } else if literal.is_empty() {
        pool
    } else {
        literal
    };

    TokenSelection::Ambiguous(tied.into_iter().map(|(t, _)| t).collect(), max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_matches_exact_prefix() {
        let r = Recognizer::literal("if");
        assert_eq!(r.recognize("if x", 0), Some(2));
        assert_eq!(r.recognize("ifx", 0), Some(2));
        assert_eq!(r.recognize("x if", 0), None);
    }

    #[test]
    fn regex_matches_longest_at_position() {
        let r = Recognizer::regex("[a-z]+").unwrap();
        assert_eq!(r.recognize("ifx rest", 0), Some(3));
        assert_eq!(r.recognize("123", 0), None);
    }

    #[test]
    fn end_of_input_only_at_len() {
        let r = Recognizer::end_of_input();
        assert_eq!(r.recognize("ab", 2), Some(0));
        assert_eq!(r.recognize("ab", 1), None);
    }

    #[test]
    fn empty_always_matches() {
        let r = Recognizer::empty();
        assert_eq!(r.recognize("anything", 3), Some(0));
    }

    #[test]
    fn default_layout_skips_tabs_newlines_spaces() {
        assert_eq!(skip_default_layout("  \t\nx", 0, Some("\t\n ")), 4);
        assert_eq!(skip_default_layout("x", 0, Some("\t\n ")), 0);
        assert_eq!(skip_default_layout("   x", 0, None), 0);
    }

    fn keyword_vs_identifier_grammar() -> (Grammar, TermIndex, TermIndex) {
        use crate::grammar::GrammarBuilder;

        let mut b = GrammarBuilder::new();
        let kw = b.add_terminal_with("IF", Recognizer::literal("if"), 0, true).unwrap();
        let id = b.add_terminal("ID", Recognizer::regex("[a-z][a-z0-9]*").unwrap()).unwrap();
        let s = b.add_nonterminal("S").unwrap();
        b.set_start(s);
        b.add_production(s, vec![crate::grammar::Symbol::Terminal(kw)], Default::default()).unwrap();
        b.add_production(s, vec![crate::grammar::Symbol::Terminal(id)], Default::default()).unwrap();
        let grammar = b.freeze().unwrap();
        (grammar, kw, id)
    }

    #[test]
    fn prefer_flag_wins_keyword_over_identifier() {
        let (grammar, kw, id) = keyword_vs_identifier_grammar();
        match select_token(&grammar, [kw, id], "if", 0) {
            TokenSelection::One(t, len) => {
                assert_eq!(t, kw);
                assert_eq!(len, 2);
            }
            _ => panic!("expected a single winner"),
        }
    }

    #[test]
    fn longer_identifier_beats_keyword_prefix() {
        // `ifx` is not an exact `if` match since the regex ID is the only
        // recognizer to match the full three characters; IF only matches the
        // first two, so there is only one candidate to begin with.
        let (grammar, kw, id) = keyword_vs_identifier_grammar();
        match select_token(&grammar, [kw, id], "ifx", 0) {
            TokenSelection::One(t, len) => {
                assert_eq!(t, id);
                assert_eq!(len, 3);
            }
            _ => panic!("expected ID to win on length for `ifx`"),
        }
    }
}
