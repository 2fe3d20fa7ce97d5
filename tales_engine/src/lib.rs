#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! tales_engine: runs stories written in the TALES scripting language.
//!
//! The [`Interpreter`] walks a parsed [`Program`](tales_script::Program),
//! evaluating conditions and applying effects against a [`GameState`], and
//! talks to the player only through a [`Presenter`].

pub const TALES_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod dsl;
pub mod error;
pub mod game_state;
pub mod history;
pub mod input;
pub mod interpreter;
pub mod presentation;
pub mod save_files;
pub mod style;
pub mod terminal;
pub mod value;

pub use config::{EngineConfig, load_config};
pub use dsl::{Condition, Effect, EffectOutcome};
pub use error::{ExpressionError, NavigationError, PersistenceError};
pub use game_state::{GameState, StateSnapshot};
pub use history::{History, HistoryEntry};
pub use interpreter::{Interpreter, RunOutcome, Step};
pub use presentation::{ChoiceOption, MetaCommand, NoticeLevel, Presenter, Response, ScriptedPresenter, Selection};
pub use terminal::TerminalPresenter;
pub use value::{Comparator, Value};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tales_script::{Program, parse_script};

/// Read and parse a script file.
pub fn load_program(path: &Path) -> Result<Program> {
    let source = fs::read_to_string(path).with_context(|| format!("reading script '{}'", path.display()))?;
    parse_script(&source).with_context(|| format!("parsing script '{}'", path.display()))
}

/// Story name derived from a script path: its file stem.
pub fn script_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("story")
        .to_string()
}
