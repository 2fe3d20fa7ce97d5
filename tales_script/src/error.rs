//! Error types for the script front end.
//!
//! Lexing and parsing both reject the whole script on the first problem they
//! find. Every error carries the 1-based source line it was raised on.

use thiserror::Error;

/// Reasons a single line can fail to tokenize.
///
/// Columns are 0-based character offsets into the raw line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unexpected '{found}' at start of line (column {column}); expected '@', '>' or '*'")]
    UnknownLineShape { found: char, column: usize },
    #[error("unknown directive '@{name}' at column {column}")]
    UnknownDirective { name: String, column: usize },
    #[error("malformed directive at column {column}")]
    InvalidDirective { column: usize },
    #[error("'{marker}' at column {column} must be followed by whitespace")]
    MissingWhitespace { marker: String, column: usize },
}

/// A line that could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lex error on line {line}: {kind}\n-> {text}")]
pub struct LexError {
    /// 1-based source line.
    pub line: usize,
    /// The offending line, verbatim.
    pub text: String,
    pub kind: LexErrorKind,
}

/// Structural problems found while building the AST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected '@scene <name>' but found '{found}'")]
    ExpectedScene { found: String },
    #[error("missing scene name after '@scene'")]
    MissingSceneName,
    #[error("unexpected '{found}' after scene name '{scene}'")]
    TrailingAfterSceneName { scene: String, found: String },
    #[error("scene '{name}' is already defined on line {first}")]
    DuplicateScene { name: String, first: usize },
    #[error("invalid dialogue line; expected '> Speaker: text'")]
    MalformedDialogue,
    #[error("unexpected '{found}' after dialogue text")]
    TrailingAfterDialogue { found: String },
    #[error("missing text after choice marker '{marker}'")]
    MissingChoiceText { marker: String },
    #[error("missing destination scene after '->'")]
    MissingDestination,
    #[error("a choice may only have one '->' transition")]
    DuplicateTransition,
    #[error("unexpected '{found}' in choice")]
    UnexpectedInChoice { found: String },
    #[error("unbalanced brackets; missing closing '}}'")]
    UnbalancedBrackets,
    #[error("missing condition after '@if'")]
    MissingCondition,
    #[error("unterminated '@if' block opened on line {opened}")]
    UnterminatedIf { opened: usize },
    #[error("'@scene' cannot appear inside an '@if' block")]
    SceneInsideIf,
    #[error("'{directive}' outside of an '@if' block")]
    StrayDirective { directive: String },
    #[error("only one '@else' is allowed per '@if' block")]
    DuplicateElse,
    #[error("unexpected '{found}' after '{directive}'")]
    TrailingAfterDirective { directive: String, found: String },
}

/// A structural violation, tagged with the line it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error on line {line}: {kind}")]
pub struct ParseError {
    /// 1-based source line.
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Any failure while turning script text into a [`Program`](crate::Program).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ScriptError {
    /// Line the failure was reported on.
    pub fn line(&self) -> usize {
        match self {
            ScriptError::Lex(err) => err.line,
            ScriptError::Parse(err) => err.line,
        }
    }
}
