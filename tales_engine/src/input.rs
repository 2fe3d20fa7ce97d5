//! Terminal input for the story player.
//!
//! Wraps rustyline (history, completion of meta commands) with a plain stdin
//! fallback, and parses what the player typed into a [`ReplyInput`].

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};

use crate::presentation::MetaCommand;

/// Outcome of reading a line.
pub enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

/// What the player typed at a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyInput {
    /// An empty line.
    Continue,
    /// A 1-based option number.
    Number(usize),
    Meta(MetaCommand),
    Unknown(String),
}

const META_WORDS: &[&str] = &["continue", "load", "next", "quit", "save", "undo"];

/// Interpret a line typed at a dialogue or choice prompt.
pub fn parse_reply(line: &str) -> ReplyInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplyInput::Continue;
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed
            .parse()
            .map_or_else(|_| ReplyInput::Unknown(trimmed.to_string()), ReplyInput::Number);
    }
    match trimmed.to_lowercase().as_str() {
        "s" | "save" => ReplyInput::Meta(MetaCommand::Save),
        "l" | "load" => ReplyInput::Meta(MetaCommand::Load),
        "u" | "undo" => ReplyInput::Meta(MetaCommand::Undo),
        "q" | "quit" => ReplyInput::Meta(MetaCommand::Quit),
        "c" | "continue" | "next" => ReplyInput::Meta(MetaCommand::Continue),
        _ => ReplyInput::Unknown(trimmed.to_string()),
    }
}

type StoryEditor = rustyline::Editor<StoryHelper, DefaultHistory>;

#[derive(Default)]
struct StoryHelper;

impl Helper for StoryHelper {}

impl Completer for StoryHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let (start, prefix) = current_prefix(line, pos);
        Ok((start, meta_completions(&prefix)))
    }
}

impl Hinter for StoryHelper {
    type Hint = String;
}

impl Highlighter for StoryHelper {}

impl Validator for StoryHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let _ = ctx;
        Ok(ValidationResult::Valid(None))
    }
}

fn current_prefix(line: &str, pos: usize) -> (usize, String) {
    let slice = &line[..pos];
    let trimmed = slice.trim_start_matches(char::is_whitespace);
    let start = pos - trimmed.len();
    (start, trimmed.to_string())
}

fn meta_completions(prefix: &str) -> Vec<Pair> {
    if prefix.is_empty() {
        return Vec::new();
    }
    let lower = prefix.to_lowercase();
    META_WORDS
        .iter()
        .filter(|word| word.starts_with(&lower))
        .map(|word| Pair {
            display: (*word).to_string(),
            replacement: (*word).to_string(),
        })
        .collect()
}

/// Reads player input, preferring rustyline on a terminal and falling back to
/// plain stdin otherwise.
pub struct InputManager {
    backend: Backend,
}

impl InputManager {
    pub fn new() -> Self {
        let backend = if io::stdin().is_terminal() {
            match RustylineInput::new() {
                Ok(editor) => {
                    info!("using rustyline-backed input");
                    Backend::Rustyline(editor)
                },
                Err(err) => {
                    warn!("failed to initialize rustyline ({err}), falling back to basic stdin");
                    Backend::plain()
                },
            }
        } else {
            info!("stdin is not a TTY; using basic input mode");
            Backend::plain()
        };

        Self { backend }
    }

    /// Read a line. If rustyline fails, switch to plain stdin and retry once.
    ///
    /// # Errors
    /// Propagates I/O errors from the plain backend.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self.backend.read_line(prompt) {
            Ok(event) => Ok(event),
            Err(err) => {
                if self.backend.is_rustyline() {
                    warn!("rustyline input failed: {err} -- switching to basic stdin");
                    self.backend = Backend::plain();
                    self.backend.read_line(prompt)
                } else {
                    Err(err)
                }
            },
        }
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

enum Backend {
    Rustyline(Box<RustylineInput>),
    Plain(StdinInput),
}

impl Backend {
    fn plain() -> Self {
        Backend::Plain(StdinInput::default())
    }

    fn is_rustyline(&self) -> bool {
        matches!(self, Backend::Rustyline(_))
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self {
            Backend::Rustyline(editor) => editor.read_line(prompt),
            Backend::Plain(stdin) => stdin.read_line(prompt),
        }
    }
}

struct RustylineInput {
    editor: StoryEditor,
    history_path: Option<PathBuf>,
}

impl RustylineInput {
    fn new() -> io::Result<Box<Self>> {
        let mut editor = rustyline::Editor::<StoryHelper, _>::new().map_err(map_io_err)?;
        editor.set_helper(Some(StoryHelper));
        let history_path = history_file_path();

        if let Some(path) = history_path.as_ref() {
            if let Some(dir) = path.parent() {
                if let Err(err) = fs::create_dir_all(dir) {
                    warn!("failed to create history directory {}: {err}", dir.display());
                }
            }

            if let Err(err) = editor.load_history(path) {
                match err {
                    ReadlineError::Io(ref io_err) if io_err.kind() == io::ErrorKind::NotFound => {
                        info!("no prior history found at {}, starting fresh", path.display());
                    },
                    other => {
                        warn!("failed to load history from {}: {other}", path.display());
                    },
                }
            }
        }

        Ok(Box::new(Self { editor, history_path }))
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(err) = self.editor.add_history_entry(line.as_str()) {
                        warn!("failed to append to history: {err}");
                    }
                    if let Some(path) = self.history_path.as_ref() {
                        if let Err(err) = self.editor.save_history(path) {
                            warn!("failed to persist history to {}: {err}", path.display());
                        }
                    }
                }
                Ok(InputEvent::Line(line))
            },
            Err(err) => convert_readline_error(err),
        }
    }
}

#[derive(Default)]
struct StdinInput {
    buffer: String,
}

impl StdinInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        print!("{prompt}");
        io::stdout().flush()?;

        self.buffer.clear();
        let bytes = io::stdin().read_line(&mut self.buffer)?;
        if bytes == 0 {
            return Ok(InputEvent::Eof);
        }

        if self.buffer.ends_with('\n') {
            self.buffer.pop();
            if self.buffer.ends_with('\r') {
                self.buffer.pop();
            }
        }

        Ok(InputEvent::Line(self.buffer.clone()))
    }
}

fn convert_readline_error(err: ReadlineError) -> io::Result<InputEvent> {
    match err {
        ReadlineError::Interrupted => Ok(InputEvent::Interrupted),
        ReadlineError::Eof => Ok(InputEvent::Eof),
        ReadlineError::Io(io_err) => Err(io_err),
        other => Err(io::Error::other(other)),
    }
}

fn map_io_err(err: ReadlineError) -> io::Error {
    match err {
        ReadlineError::Io(io_err) => io_err,
        other => io::Error::other(other),
    }
}

fn history_file_path() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(dirs::data_local_dir)
        .map(|base| build_history_path(&base))
}

fn build_history_path(base: &Path) -> PathBuf {
    base.join("tales_engine").join("history.txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_readline_ctrl_c_to_interrupt() {
        let result = convert_readline_error(ReadlineError::Interrupted).unwrap();
        assert!(matches!(result, InputEvent::Interrupted));
        let result = convert_readline_error(ReadlineError::Eof).unwrap();
        assert!(matches!(result, InputEvent::Eof));
    }

    #[test]
    fn history_path_appends_components() {
        let path = build_history_path(Path::new("/tmp/tales-test"));
        assert!(path.ends_with(Path::new("tales_engine/history.txt")));
    }

    #[test]
    fn replies_cover_numbers_and_meta_words() {
        assert_eq!(parse_reply("   "), ReplyInput::Continue);
        assert_eq!(parse_reply(" 2 "), ReplyInput::Number(2));
        assert_eq!(parse_reply("S"), ReplyInput::Meta(MetaCommand::Save));
        assert_eq!(parse_reply("load"), ReplyInput::Meta(MetaCommand::Load));
        assert_eq!(parse_reply("u"), ReplyInput::Meta(MetaCommand::Undo));
        assert_eq!(parse_reply("Quit"), ReplyInput::Meta(MetaCommand::Quit));
        assert_eq!(parse_reply("next"), ReplyInput::Meta(MetaCommand::Continue));
        assert_eq!(parse_reply("dance"), ReplyInput::Unknown("dance".into()));
        assert_eq!(parse_reply("-1"), ReplyInput::Unknown("-1".into()));
    }

    #[test]
    fn completion_matches_meta_prefixes() {
        let words: Vec<String> = meta_completions("Sa").into_iter().map(|p| p.replacement).collect();
        assert_eq!(words, vec!["save"]);
        assert!(meta_completions("").is_empty());
        assert!(meta_completions("x").is_empty());
    }
}
