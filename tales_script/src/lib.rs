//! tales_script: lexer and parser for the TALES narrative scripting language.
//!
//! A script is a list of scenes. Each line starts with a marker:
//! - `@scene <name>` opens a scene
//! - `> Speaker: text {effect}...` is a line of dialogue
//! - `* text {condition} {effect}... -> scene` is a choice (`**`, `***` for deeper levels)
//! - `@if <condition>` / `@else` / `@endif` gate a block of lines
//! - `//` starts a comment
//!
//! [`parse_script`] runs the whole front end and produces a [`Program`], an
//! arena of elements addressed by stable [`ElementId`]s. Condition and effect
//! expressions are kept as raw text here; the engine gives them meaning.

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate, clippy::module_name_repetitions)]

pub mod ast;
mod error;
pub mod lexer;
pub mod outline;
mod parser;

pub use ast::{Branch, Choice, Dialogue, Element, ElementId, IfBlock, ParentLink, Program, Scene};
pub use error::{LexError, LexErrorKind, ParseError, ParseErrorKind, ScriptError};
pub use lexer::{Token, TokenKind, TokenLines, tokenize, tokenize_line};
pub use outline::render_outline;
pub use parser::parse_tokens;

/// Lex and parse a complete script.
pub fn parse_script(source: &str) -> Result<Program, ScriptError> {
    let lines = tokenize(source)?;
    Ok(parse_tokens(&lines)?)
}
