//! Line-oriented tokenizer for TALES scripts.
//!
//! Each non-blank, non-comment line is turned into a flat token list. The line
//! shape is decided by its first non-whitespace character (`@`, `>` or `*`);
//! everything after the marker is split on `:`, `{`, `}` and `->` with the text
//! runs between them trimmed and classified as number, boolean, comparator or
//! plain text.

use crate::error::{LexError, LexErrorKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("number pattern compiles"));

const COMPARATORS: [&str; 6] = ["==", "!=", "<=", ">=", "<", ">"];

/// Token categories produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Scene,
    If,
    Else,
    EndIf,
    Dialogue,
    /// A run of `*`; `level` is the run length.
    Choice {
        level: usize,
    },
    Separator,
    Transition,
    OpenBracket,
    CloseBracket,
    Text,
    Number,
    Boolean,
    Comparator,
}

impl TokenKind {
    /// Short uppercase label used by the token dump.
    pub fn label(self) -> &'static str {
        match self {
            TokenKind::Scene => "SCENE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::EndIf => "ENDIF",
            TokenKind::Dialogue => "DIALOGUE",
            TokenKind::Choice { .. } => "CHOICE",
            TokenKind::Separator => "SEPARATOR",
            TokenKind::Transition => "TRANSITION",
            TokenKind::OpenBracket => "OPEN_BRACKET",
            TokenKind::CloseBracket => "CLOSE_BRACKET",
            TokenKind::Text => "TEXT",
            TokenKind::Number => "NUMBER",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::Comparator => "COMPARATOR",
        }
    }
}

/// A single lexeme with the text it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }

    /// True for tokens that can stand in a word position (names, speech, destinations).
    pub fn is_word(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Text | TokenKind::Number | TokenKind::Boolean | TokenKind::Comparator
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind.label(), self.text)
    }
}

/// Tokens keyed by 1-based source line. Lines with no tokens are omitted.
pub type TokenLines = BTreeMap<usize, Vec<Token>>;

/// Tokenize a whole script.
///
/// Blank lines and lines whose first non-whitespace characters are `//` are
/// skipped. The first offending line aborts lexing.
///
/// # Errors
/// Returns a [`LexError`] carrying the line number and verbatim line text.
pub fn tokenize(source: &str) -> Result<TokenLines, LexError> {
    let mut lines = TokenLines::new();
    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let tokens = tokenize_line(raw).map_err(|kind| LexError {
            line: line_no,
            text: raw.to_string(),
            kind,
        })?;
        if !tokens.is_empty() {
            lines.insert(line_no, tokens);
        }
    }
    Ok(lines)
}

/// Tokenize a single line. Blank and comment lines yield an empty list.
///
/// # Errors
/// Returns the [`LexErrorKind`] describing why the line is malformed.
pub fn tokenize_line(line: &str) -> Result<Vec<Token>, LexErrorKind> {
    LineLexer::new(line).run()
}

/// Classify a trimmed text run.
fn classify(text: &str) -> TokenKind {
    if NUMBER_PATTERN.is_match(text) {
        TokenKind::Number
    } else if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
        TokenKind::Boolean
    } else if COMPARATORS.contains(&text) {
        TokenKind::Comparator
    } else {
        TokenKind::Text
    }
}

struct LineLexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
    pending: String,
}

impl LineLexer {
    fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
            pending: String::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_comment(&self) -> bool {
        self.peek() == Some('/') && self.peek_at(1) == Some('/')
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Markers must be followed by whitespace or the end of the line.
    fn require_break(&self, marker: &str, column: usize) -> Result<(), LexErrorKind> {
        match self.peek() {
            None => Ok(()),
            Some(c) if c.is_whitespace() => Ok(()),
            Some(_) => Err(LexErrorKind::MissingWhitespace {
                marker: marker.to_string(),
                column,
            }),
        }
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>) {
        self.tokens.push(Token::new(kind, text));
    }

    fn flush_text(&mut self) {
        let trimmed = self.pending.trim();
        if !trimmed.is_empty() {
            let kind = classify(trimmed);
            let text = if kind == TokenKind::Boolean {
                trimmed.to_ascii_lowercase()
            } else {
                trimmed.to_string()
            };
            self.tokens.push(Token::new(kind, text));
        }
        self.pending.clear();
    }

    fn run(mut self) -> Result<Vec<Token>, LexErrorKind> {
        self.skip_whitespace();
        if self.peek().is_none() || self.at_comment() {
            return Ok(Vec::new());
        }
        self.lex_marker()?;
        self.lex_body()?;
        Ok(self.tokens)
    }

    fn lex_marker(&mut self) -> Result<(), LexErrorKind> {
        let column = self.pos;
        match self.peek() {
            Some('@') => self.lex_directive(),
            Some('>') => {
                self.pos += 1;
                if self.peek().is_none_or(|c| !c.is_whitespace()) {
                    return Err(LexErrorKind::MissingWhitespace {
                        marker: ">".into(),
                        column,
                    });
                }
                self.push(TokenKind::Dialogue, ">");
                self.skip_whitespace();
                Ok(())
            },
            Some('*') => {
                let mut level = 0;
                while self.peek() == Some('*') {
                    level += 1;
                    self.pos += 1;
                }
                let marker = "*".repeat(level);
                self.require_break(&marker, column)?;
                self.push(TokenKind::Choice { level }, marker);
                self.skip_whitespace();
                Ok(())
            },
            Some(found) => Err(LexErrorKind::UnknownLineShape { found, column }),
            None => Ok(()),
        }
    }

    fn lex_directive(&mut self) -> Result<(), LexErrorKind> {
        let column = self.pos;
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if name.is_empty() {
            return Err(LexErrorKind::InvalidDirective { column });
        }
        let kind = match name.as_str() {
            "scene" => TokenKind::Scene,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "endif" => TokenKind::EndIf,
            _ => return Err(LexErrorKind::UnknownDirective { name, column }),
        };
        self.require_break(&format!("@{name}"), column)?;
        self.push(kind, format!("@{name}"));
        self.skip_whitespace();
        Ok(())
    }

    fn lex_body(&mut self) -> Result<(), LexErrorKind> {
        while let Some(c) = self.peek() {
            if self.at_comment() {
                break;
            }
            match c {
                ':' => {
                    self.flush_text();
                    self.push(TokenKind::Separator, ":");
                    self.pos += 1;
                    self.skip_whitespace();
                },
                '{' => {
                    self.flush_text();
                    self.push(TokenKind::OpenBracket, "{");
                    self.pos += 1;
                    self.skip_whitespace();
                },
                '}' => {
                    self.flush_text();
                    self.push(TokenKind::CloseBracket, "}");
                    self.pos += 1;
                    self.skip_whitespace();
                },
                '-' if self.peek_at(1) == Some('>') => {
                    let column = self.pos;
                    self.flush_text();
                    self.pos += 2;
                    if self.peek().is_none_or(|c| !c.is_whitespace()) {
                        return Err(LexErrorKind::MissingWhitespace {
                            marker: "->".into(),
                            column,
                        });
                    }
                    self.push(TokenKind::Transition, "->");
                    self.skip_whitespace();
                },
                _ => {
                    self.pending.push(c);
                    self.pos += 1;
                },
            }
        }
        self.flush_text();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<TokenKind> {
        tokenize_line(line).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn texts(line: &str) -> Vec<String> {
        tokenize_line(line).unwrap().into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn blank_and_comment_lines_produce_nothing() {
        assert!(tokenize_line("").unwrap().is_empty());
        assert!(tokenize_line("    \t").unwrap().is_empty());
        assert!(tokenize_line("   // a note").unwrap().is_empty());
    }

    #[test]
    fn scene_header_tokens() {
        assert_eq!(kinds("@scene start"), vec![TokenKind::Scene, TokenKind::Text]);
        assert_eq!(texts("  @scene   the start  "), vec!["@scene", "the start"]);
    }

    #[test]
    fn dialogue_with_effect() {
        let tokens = tokenize_line("> Narrator: You found gold! {add_item:Gold:10}").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Dialogue,
                TokenKind::Text,
                TokenKind::Separator,
                TokenKind::Text,
                TokenKind::OpenBracket,
                TokenKind::Text,
                TokenKind::Separator,
                TokenKind::Text,
                TokenKind::Separator,
                TokenKind::Number,
                TokenKind::CloseBracket,
            ]
        );
        assert_eq!(tokens[3].text, "You found gold!");
        assert_eq!(tokens[9].text, "10");
    }

    #[test]
    fn choice_level_counts_stars() {
        let tokens = tokenize_line("*** Deep choice").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Choice { level: 3 });
        assert_eq!(tokens[0].text, "***");
        assert_eq!(tokens[1].text, "Deep choice");
    }

    #[test]
    fn transition_requires_whitespace() {
        assert_eq!(
            kinds("* Go -> camp"),
            vec![TokenKind::Choice { level: 1 }, TokenKind::Text, TokenKind::Transition, TokenKind::Text]
        );
        let err = tokenize_line("* Go ->camp").unwrap_err();
        assert!(matches!(err, LexErrorKind::MissingWhitespace { ref marker, column: 5 } if marker == "->"));
    }

    #[test]
    fn lone_dash_stays_in_text() {
        assert_eq!(texts("> Bob: a - b"), vec![">", "Bob", ":", "a - b"]);
    }

    #[test]
    fn classification_of_text_runs() {
        let tokens = tokenize_line("@if check_stat:hp:>=:-3.5").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::If,
                TokenKind::Text,
                TokenKind::Separator,
                TokenKind::Text,
                TokenKind::Separator,
                TokenKind::Comparator,
                TokenKind::Separator,
                TokenKind::Number,
            ]
        );
        let booleans = tokenize_line("@if check_var:open:TRUE").unwrap();
        assert_eq!(booleans[5].kind, TokenKind::Boolean);
        assert_eq!(booleans[5].text, "true");
    }

    #[test]
    fn inline_comment_ends_the_line() {
        assert_eq!(texts("> Bob: hi // ignored"), vec![">", "Bob", ":", "hi"]);
    }

    #[test]
    fn unknown_directive_is_rejected() {
        let err = tokenize_line("@loop forever").unwrap_err();
        assert_eq!(
            err,
            LexErrorKind::UnknownDirective {
                name: "loop".into(),
                column: 0
            }
        );
    }

    #[test]
    fn directive_glued_to_text_is_rejected() {
        assert!(matches!(
            tokenize_line("@if{x}").unwrap_err(),
            LexErrorKind::MissingWhitespace { .. }
        ));
        assert!(matches!(
            tokenize_line("@ scene").unwrap_err(),
            LexErrorKind::InvalidDirective { column: 0 }
        ));
    }

    #[test]
    fn markers_need_whitespace() {
        assert!(tokenize_line(">Bob: hi").is_err());
        assert!(tokenize_line("**Choice").is_err());
        assert_eq!(kinds("@endif"), vec![TokenKind::EndIf]);
    }

    #[test]
    fn unexpected_line_start() {
        let err = tokenize_line("  hello").unwrap_err();
        assert_eq!(err, LexErrorKind::UnknownLineShape { found: 'h', column: 2 });
    }

    #[test]
    fn tokenize_reports_line_numbers() {
        let source = "@scene a\n\n> Bob: hi\n?? nope\n";
        let err = tokenize(source).unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.text, "?? nope");

        let lines = tokenize("@scene a\n// note\n> Bob: hi\n").unwrap();
        assert_eq!(lines.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    }
}
