//! Lexer (tokenizer) for C struct declarations
//!
//! [`Lexer`] is a small rule engine: each rule pairs a regular expression with
//! a callback, and all rules are compiled into one alternation the first time
//! [`Lexer::lex`] is called. Earlier rules win when several match at the same
//! position. Callbacks that return `None` consume their text without yielding
//! anything, which is how whitespace and unrecognized characters are skipped.
//!
//! [`new_lexer`] builds the rule set for the struct subset of C: comments,
//! integer literals, primitive type keywords (multi-word forms are one
//! lexeme), identifiers and the `{ } [ ] ; ,` operators.

use super::ast::{Position, Range};
use log::trace;
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Configuration errors. These are integration bugs, never bad input.
#[derive(Debug, Error)]
pub enum LexError {
    #[error("Unable to add rules during lexing")]
    RulesLocked,

    #[error("Cannot lex without rules")]
    NoRules,

    #[error("Invalid lexer rule `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Callback invoked with the matched text and its range.
pub type Callback<'a, T> = Box<dyn FnMut(&str, Range) -> Option<T> + 'a>;

struct Rule<'a, T> {
    pattern: String,
    callback: Callback<'a, T>,
}

enum State {
    Configuring,
    Lexing(Regex),
    Finished,
}

/// Pull-based lexer over a borrowed source string.
pub struct Lexer<'a, T> {
    source: &'a str,
    rules: Vec<Rule<'a, T>>,
    state: State,
    offset: usize,
    position: Position,
}

impl<'a, T> Lexer<'a, T> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            rules: Vec::new(),
            state: State::Configuring,
            offset: 0,
            position: Position::default(),
        }
    }

    /// Register a rule. Rules are tried in registration order.
    pub fn add_rule(
        &mut self,
        pattern: &str,
        callback: impl FnMut(&str, Range) -> Option<T> + 'a,
    ) -> Result<(), LexError> {
        if !matches!(self.state, State::Configuring) {
            return Err(LexError::RulesLocked);
        }

        Regex::new(pattern).map_err(|source| LexError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        self.rules.push(Rule {
            pattern: pattern.to_string(),
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Compile the rules and lock the rule set. Called implicitly by `lex`.
    pub fn start(&mut self) -> Result<(), LexError> {
        if !matches!(self.state, State::Configuring) {
            return Ok(());
        }
        if self.rules.is_empty() {
            return Err(LexError::NoRules);
        }

        let alternation = self
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| format!("(?P<{}>{})", group_name(index), rule.pattern))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&alternation).map_err(|source| LexError::InvalidPattern {
            pattern: alternation.clone(),
            source,
        })?;

        self.state = State::Lexing(pattern);
        Ok(())
    }

    /// Produce the next callback result, or `None` once the source is
    /// exhausted (and on every call after that).
    pub fn lex(&mut self) -> Result<Option<T>, LexError> {
        self.start()?;
        let source = self.source;

        loop {
            let captures = match &self.state {
                State::Lexing(pattern) => pattern.captures_at(source, self.offset),
                _ => return Ok(None),
            };
            let Some(captures) = captures else {
                self.finish();
                return Ok(None);
            };
            let Some(whole) = captures.get(0) else {
                self.finish();
                return Ok(None);
            };

            // Text no rule claimed still moves the position along.
            if whole.start() > self.offset {
                self.advance_position(&source[self.offset..whole.start()]);
                self.offset = whole.start();
            }

            if whole.as_str().is_empty() {
                // An empty match would never make progress: step over one character.
                match source[self.offset..].chars().next() {
                    Some(ch) => {
                        let end = self.offset + ch.len_utf8();
                        self.advance_position(&source[self.offset..end]);
                        self.offset = end;
                        continue;
                    }
                    None => {
                        self.finish();
                        return Ok(None);
                    }
                }
            }

            let Some(index) =
                (0..self.rules.len()).find(|index| captures.name(&group_name(*index)).is_some())
            else {
                self.finish();
                return Ok(None);
            };

            let text = whole.as_str();
            let start = self.position;
            self.advance_position(text);
            self.offset = whole.end();
            let range = Range::new(start, self.position);

            if let Some(result) = (self.rules[index].callback)(text, range) {
                return Ok(Some(result));
            }
        }
    }

    /// Position just past the last consumed character.
    pub fn position(&self) -> Position {
        self.position
    }

    fn finish(&mut self) {
        self.offset = self.source.len();
        self.state = State::Finished;
    }

    fn advance_position(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.position.line += 1;
                self.position.character = 0;
            } else {
                self.position.character += 1;
            }
        }
    }
}

fn group_name(index: usize) -> String {
    format!("rule{index}")
}

/// Lexeme categories produced by [`new_lexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexemeKind {
    Comment,
    Number,
    Type,
    Name,
    Operator,
}

impl fmt::Display for LexemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LexemeKind::Comment => "comment",
            LexemeKind::Number => "number",
            LexemeKind::Type => "type",
            LexemeKind::Name => "name",
            LexemeKind::Operator => "operator",
        };
        f.write_str(name)
    }
}

/// A classified piece of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub text: String,
    pub range: Range,
}

impl Lexeme {
    pub fn new(kind: LexemeKind, text: &str, range: Range) -> Self {
        Self {
            kind,
            text: text.to_string(),
            range,
        }
    }
}

const BLOCK_COMMENT: &str = r"/\*(?s:.*?)\*/";
const LINE_COMMENTS: &str = r"//.*(?:\n\s*//.*)*";
const NUMBER: &str = r"[0-9]+";
// Longer spellings come first so `unsigned long long` is one lexeme.
const TYPES: &str = r"\b(?:char|signed char|unsigned char|bool|short|unsigned short|int|unsigned int|long long|unsigned long long|long|unsigned long|float|double)\b";
const NAME: &str = r"[A-Za-z_][A-Za-z0-9_]*";
const OPERATOR: &str = r"[\[\]{};,]";
const WHITESPACE: &str = r"\s+";
const ANY: &str = r".";

fn emit(kind: LexemeKind) -> impl FnMut(&str, Range) -> Option<Lexeme> {
    move |text, range| {
        trace!("{kind} {text:?} at {}", range.start);
        Some(Lexeme::new(kind, text, range))
    }
}

fn skip(_text: &str, _range: Range) -> Option<Lexeme> {
    None
}

/// Build a lexer for C struct declarations.
pub fn new_lexer(source: &str) -> Result<Lexer<'_, Lexeme>, LexError> {
    let mut lexer = Lexer::new(source);

    lexer.add_rule(BLOCK_COMMENT, emit(LexemeKind::Comment))?;
    lexer.add_rule(LINE_COMMENTS, emit(LexemeKind::Comment))?;
    lexer.add_rule(NUMBER, emit(LexemeKind::Number))?;
    lexer.add_rule(TYPES, emit(LexemeKind::Type))?;
    lexer.add_rule(NAME, emit(LexemeKind::Name))?;
    lexer.add_rule(OPERATOR, emit(LexemeKind::Operator))?;
    lexer.add_rule(WHITESPACE, skip)?;
    // Anything else is dropped, one character at a time.
    lexer.add_rule(ANY, skip)?;

    Ok(lexer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use test_log::test;

    fn lex_all(source: &str) -> Vec<Lexeme> {
        let mut lexer = new_lexer(source).expect("lexer rules should compile");
        let mut lexemes = Vec::new();
        while let Some(lexeme) = lexer.lex().expect("lexing failed") {
            lexemes.push(lexeme);
        }
        lexemes
    }

    #[test]
    fn test_basic_rules() {
        let a_matches = Cell::new(0);
        let mut lexer = Lexer::new("aba");
        lexer
            .add_rule("a", |m, _| {
                a_matches.set(a_matches.get() + 1);
                Some(m.to_string())
            })
            .unwrap();
        lexer.add_rule("b", |m, _| Some(m.to_string())).unwrap();

        assert_eq!(a_matches.get(), 0);
        assert_eq!(lexer.lex().unwrap().as_deref(), Some("a"));
        assert_eq!(a_matches.get(), 1);
        assert_eq!(lexer.lex().unwrap().as_deref(), Some("b"));
        assert_eq!(a_matches.get(), 1);
        assert_eq!(lexer.lex().unwrap().as_deref(), Some("a"));
        assert_eq!(a_matches.get(), 2);
        assert_eq!(lexer.lex().unwrap(), None);
        assert_eq!(lexer.lex().unwrap(), None);
        assert_eq!(a_matches.get(), 2);
    }

    #[test]
    fn test_add_rule_after_lex() {
        let mut lexer = Lexer::new("abbaa");
        lexer.add_rule("a", |m, _| Some(m.to_string())).unwrap();
        lexer.lex().unwrap();

        let result = lexer.add_rule("b", |m, _| Some(m.to_string()));
        assert!(matches!(result, Err(LexError::RulesLocked)));
    }

    #[test]
    fn test_lex_without_rules() {
        let mut lexer: Lexer<'_, String> = Lexer::new("aabb");
        assert!(matches!(lexer.lex(), Err(LexError::NoRules)));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut lexer: Lexer<'_, String> = Lexer::new("x");
        let result = lexer.add_rule("(unclosed", |m, _| Some(m.to_string()));
        assert!(matches!(result, Err(LexError::InvalidPattern { .. })));
    }

    #[test]
    fn test_empty_match_makes_progress() {
        let mut lexer = Lexer::new("xyz");
        lexer.add_rule("a*", |m, _| Some(m.to_string())).unwrap();
        assert_eq!(lexer.lex().unwrap(), None);
        assert_eq!(lexer.position(), Position::new(0, 3));
    }

    #[test]
    fn test_single_line_comment() {
        let lexemes = lex_all("// Single line comment.");

        assert_eq!(lexemes.len(), 1);
        assert_eq!(lexemes[0].kind, LexemeKind::Comment);
        assert_eq!(lexemes[0].text, "// Single line comment.");
        assert_eq!(lexemes[0].range, Range::from(((0, 0), (0, 23))));
    }

    #[test]
    fn test_multi_line_comment() {
        let source = "/*\n * Multi-line comment\n */";
        let lexemes = lex_all(source);

        assert_eq!(lexemes.len(), 1);
        assert_eq!(lexemes[0].kind, LexemeKind::Comment);
        assert_eq!(lexemes[0].text, source);
        assert_eq!(lexemes[0].range, Range::from(((0, 0), (2, 3))));
    }

    #[test]
    fn test_line_comment_run() {
        let lexemes = lex_all("// first\n    // second\nint");

        assert_eq!(lexemes.len(), 2);
        assert_eq!(lexemes[0].kind, LexemeKind::Comment);
        assert_eq!(lexemes[0].text, "// first\n    // second");
        assert_eq!(lexemes[0].range, Range::from(((0, 0), (1, 13))));
        assert_eq!(lexemes[1].kind, LexemeKind::Type);
    }

    #[test]
    fn test_line_comment_run_spans_blank_lines() {
        let lexemes = lex_all("// first\n\n// second\nint");

        assert_eq!(lexemes.len(), 2);
        assert_eq!(lexemes[0].text, "// first\n\n// second");
        assert_eq!(lexemes[0].range, Range::from(((0, 0), (2, 9))));
    }

    #[test]
    fn test_numbers() {
        let lexemes = lex_all("0 12345");

        assert_eq!(lexemes.len(), 2);
        assert!(lexemes.iter().all(|l| l.kind == LexemeKind::Number));
        assert_eq!(lexemes[0].text, "0");
        assert_eq!(lexemes[1].text, "12345");
    }

    #[test]
    fn test_types() {
        let source = "char signed char unsigned char bool short unsigned short int unsigned int \
                      long unsigned long float long long unsigned long long double";
        let expected = [
            "char",
            "signed char",
            "unsigned char",
            "bool",
            "short",
            "unsigned short",
            "int",
            "unsigned int",
            "long",
            "unsigned long",
            "float",
            "long long",
            "unsigned long long",
            "double",
        ];
        let lexemes = lex_all(source);

        assert_eq!(lexemes.len(), expected.len());
        for (lexeme, spelling) in lexemes.iter().zip(expected) {
            assert_eq!(lexeme.kind, LexemeKind::Type);
            assert_eq!(lexeme.text, spelling);
        }
    }

    #[test]
    fn test_keyword_prefix_is_a_name() {
        let lexemes = lex_all("integer chars");

        assert_eq!(lexemes.len(), 2);
        assert!(lexemes.iter().all(|l| l.kind == LexemeKind::Name));
    }

    #[test]
    fn test_whitespace_skip() {
        let lexemes = lex_all(" 1\n2\n");

        assert_eq!(lexemes[0].text, "1");
        assert_eq!(lexemes[0].range, Range::from(((0, 1), (0, 2))));
        assert_eq!(lexemes[1].text, "2");
        assert_eq!(lexemes[1].range, Range::from(((1, 0), (1, 1))));
    }

    #[test]
    fn test_names() {
        let lexemes = lex_all("int flag");

        assert_eq!(lexemes[0].text, "int");
        assert_eq!(lexemes[1].kind, LexemeKind::Name);
        assert_eq!(lexemes[1].text, "flag");
    }

    #[test]
    fn test_operators() {
        let lexemes = lex_all("{ } [ ] ; ,");
        let spellings: Vec<_> = lexemes.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(spellings, ["{", "}", "[", "]", ";", ","]);
        assert!(lexemes.iter().all(|l| l.kind == LexemeKind::Operator));
    }

    #[test]
    fn test_unrecognized_characters_keep_positions() {
        let lexemes = lex_all("int x = 5;");
        let spellings: Vec<_> = lexemes.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(spellings, ["int", "x", "5", ";"]);
        assert_eq!(lexemes[2].range, Range::from(((0, 8), (0, 9))));
    }

    #[test]
    fn test_struct() {
        let lexemes = lex_all("\nstruct foo {\n    int x;\n};\n");
        let spellings: Vec<_> = lexemes.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(spellings, ["struct", "foo", "{", "int", "x", ";", "}", ";"]);
        assert_eq!(lexemes[4].range, Range::from(((2, 8), (2, 9))));
    }
}
