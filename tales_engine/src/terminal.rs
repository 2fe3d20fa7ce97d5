//! Terminal front end: a [`Presenter`] that prints with color and reads
//! replies through [`InputManager`].

use crate::config::EngineConfig;
use crate::input::{InputEvent, InputManager, ReplyInput, parse_reply};
use crate::presentation::{ChoiceOption, MetaCommand, NoticeLevel, Presenter, Response, Selection};
use crate::style::StoryStyle;
use log::warn;
use tales_script::ElementId;
use textwrap::{Options, fill, termwidth};

const META_HINT: &str = "(enter to continue; s=save l=load u=undo q=quit)";

pub struct TerminalPresenter {
    input: InputManager,
    wrap_width: Option<usize>,
    show_unavailable: bool,
}

impl TerminalPresenter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            input: InputManager::new(),
            wrap_width: config.wrap_width,
            show_unavailable: config.show_unavailable,
        }
    }

    /// Print the story banner.
    pub fn show_title(&self, title: &str) {
        println!("{}\n", title.banner_style());
    }

    fn width(&self) -> usize {
        self.wrap_width.unwrap_or_else(termwidth).max(20)
    }

    fn block(&self, indent: &'static str) -> Options<'static> {
        Options::new(self.width()).initial_indent(indent).subsequent_indent(indent)
    }

    /// Read one line; `None` on end of input, interrupt, or a read failure.
    fn read(&mut self, prompt: &str) -> Option<String> {
        match self.input.read_line(prompt) {
            Ok(InputEvent::Line(line)) => Some(line),
            Ok(InputEvent::Eof | InputEvent::Interrupted) => None,
            Err(err) => {
                warn!("reading input failed: {err}");
                None
            },
        }
    }
}

impl Presenter for TerminalPresenter {
    fn show_dialogue(&mut self, speaker: &str, text: &str, is_end: bool) -> Response {
        println!("{}", speaker.speaker_style());
        println!("{}", fill(text, self.block("    ")).dialogue_style());
        let prompt = if is_end { "> " } else { "" };
        loop {
            let Some(line) = self.read(prompt) else {
                return Response::Command(MetaCommand::Quit);
            };
            match parse_reply(&line) {
                ReplyInput::Continue => return Response::Continue,
                ReplyInput::Meta(command) => return Response::Command(command),
                ReplyInput::Number(_) | ReplyInput::Unknown(_) => println!("{}", META_HINT.prompt_style()),
            }
        }
    }

    fn prompt_choice(&mut self, title: &str, options: &[ChoiceOption]) -> Selection {
        if !title.is_empty() {
            println!("\n{}", title.scene_title_style());
        }
        let mut numbered: Vec<ElementId> = Vec::new();
        for option in options {
            if option.available {
                numbered.push(option.id);
                let number = numbered.len().to_string();
                println!("  {} {}", number.choice_number_style(), option.text.choice_style());
            } else if self.show_unavailable {
                println!("  {} {}", "-".prompt_style(), option.text.unavailable_style());
            }
        }
        if numbered.is_empty() {
            println!("{}", "No choices are available here. Type c to continue.".prompt_style());
        }
        loop {
            let Some(line) = self.read("choose> ") else {
                return Selection::Command(MetaCommand::Quit);
            };
            match parse_reply(&line) {
                ReplyInput::Number(n) => match n.checked_sub(1).and_then(|idx| numbered.get(idx)) {
                    Some(id) => return Selection::Choice(*id),
                    None => println!("{}", format!("Pick a number from 1 to {}.", numbered.len()).warning_style()),
                },
                ReplyInput::Meta(command) => return Selection::Command(command),
                ReplyInput::Continue | ReplyInput::Unknown(_) => println!("{}", META_HINT.prompt_style()),
            }
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        let text = fill(message, self.block(""));
        let styled = match level {
            NoticeLevel::Info => text.info_style(),
            NoticeLevel::Warning => text.warning_style(),
            NoticeLevel::Error => text.error_style(),
            NoticeLevel::Success => text.success_style(),
        };
        println!("{styled}");
    }

    fn confirm(&mut self, question: &str) -> bool {
        let prompt = format!("{question} [y/N] ");
        match self.read(&prompt) {
            Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            None => true,
        }
    }

    fn ask_save_name(&mut self) -> Option<String> {
        let name = self.read("save name> ")?;
        let name = name.trim();
        if name.is_empty() { None } else { Some(name.to_string()) }
    }

    fn pick_save(&mut self, saves: &[String]) -> Option<String> {
        for (idx, save) in saves.iter().enumerate() {
            println!("  {} {}", (idx + 1).to_string().choice_number_style(), save.choice_style());
        }
        let line = self.read("load which (number or name)> ")?;
        match parse_reply(&line) {
            ReplyInput::Number(n) => n.checked_sub(1).and_then(|idx| saves.get(idx)).cloned(),
            ReplyInput::Unknown(name) => Some(name),
            ReplyInput::Continue | ReplyInput::Meta(_) => None,
        }
    }
}
