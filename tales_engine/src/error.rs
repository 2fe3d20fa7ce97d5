//! Engine error types.

use std::path::PathBuf;
use tales_script::ElementId;
use thiserror::Error;

/// A condition or effect string that could not be resolved.
///
/// These are reported and skipped by the interpreter; they never abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("empty {what} expression")]
    Empty { what: &'static str },
    #[error("unknown {what} '{kind}'")]
    UnknownKind { what: &'static str, kind: String },
    #[error("'{kind}' needs at least {expected} field(s), found {found}")]
    MissingField { kind: String, expected: usize, found: usize },
    #[error("'{kind}' takes at most {max} field(s), found {found}")]
    TooManyFields { kind: String, max: usize, found: usize },
    #[error("'{kind}' is missing a name")]
    EmptyName { kind: String },
    #[error("'{value}' is not a valid quantity")]
    InvalidQuantity { value: String },
    #[error("'{value}' is not a number")]
    InvalidNumber { value: String },
    #[error("unknown comparator '{found}'")]
    UnknownComparator { found: String },
    #[error("unbalanced braces in '{expr}'")]
    UnbalancedBraces { expr: String },
    #[error("expected a braced sub-expression, found '{found}'")]
    ExpectedBraced { found: String },
}

/// Problems moving the story position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("scene '{0}' does not exist")]
    UnknownScene(String),
    #[error("scene '{0}' has no content")]
    EmptyScene(String),
    #[error("element {0} does not exist in this script")]
    DanglingElement(ElementId),
    #[error("script has no scenes")]
    NoScenes,
}

/// Save/load failures. The live story is left untouched when one is returned.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed save file '{path}': {message}")]
    Format { path: PathBuf, message: String },
    #[error("unable to serialize save data: {0}")]
    Serialize(String),
    #[error("invalid save data: {0}")]
    Invalid(String),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}
