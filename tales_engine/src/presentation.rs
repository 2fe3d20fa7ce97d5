//! The boundary between the interpreter and whatever shows the story.
//!
//! The interpreter never formats output or reads keystrokes itself. It asks a
//! [`Presenter`] to show a line, offer a set of choices, report a notice or
//! collect a yes/no answer or a save name, and acts on the reply.

use std::collections::VecDeque;
use tales_script::ElementId;
use variantly::Variantly;

/// Commands a player can issue instead of answering a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Variantly)]
pub enum MetaCommand {
    Save,
    Load,
    Undo,
    Quit,
    Continue,
}

/// Reply to a dialogue line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Variantly)]
pub enum Response {
    Continue,
    Command(MetaCommand),
}

/// Reply to a choice prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Variantly)]
pub enum Selection {
    Choice(ElementId),
    Command(MetaCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Variantly)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// One entry of a choice prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub id: ElementId,
    pub text: String,
    pub available: bool,
}

pub trait Presenter {
    /// Show a line of dialogue. `is_end` is set when the next element is not dialogue.
    fn show_dialogue(&mut self, speaker: &str, text: &str, is_end: bool) -> Response;
    /// Offer a group of choices and return the pick or a meta command.
    fn prompt_choice(&mut self, title: &str, options: &[ChoiceOption]) -> Selection;
    fn notify(&mut self, level: NoticeLevel, message: &str);
    fn confirm(&mut self, question: &str) -> bool;
    /// Ask for a save name; `None` cancels.
    fn ask_save_name(&mut self) -> Option<String>;
    /// Pick one of `saves`; `None` cancels.
    fn pick_save(&mut self, saves: &[String]) -> Option<String>;
}

/// A request received by [`ScriptedPresenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Dialogue { speaker: String, text: String, is_end: bool },
    Choice { title: String, options: Vec<ChoiceOption> },
    Notice { level: NoticeLevel, message: String },
    Confirm { question: String },
    SaveName,
    PickSave { saves: Vec<String> },
}

/// A queued answer for [`ScriptedPresenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledge a dialogue line.
    Continue,
    /// Pick the n-th listed option (1-based).
    Pick(usize),
    Command(MetaCommand),
    Yes,
    No,
    Name(String),
    Cancel,
}

/// Presenter that replays queued replies and records every request.
///
/// When the queue runs dry, dialogue is acknowledged, choice prompts answer
/// `quit`, confirmations answer yes and name prompts cancel. A run therefore
/// always ends.
#[derive(Debug, Default)]
pub struct ScriptedPresenter {
    replies: VecDeque<Reply>,
    requests: Vec<Request>,
}

impl ScriptedPresenter {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    pub fn push_reply(&mut self, reply: Reply) {
        self.replies.push_back(reply);
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Texts of every dialogue line shown, in order.
    pub fn dialogue_texts(&self) -> Vec<&str> {
        self.requests
            .iter()
            .filter_map(|req| match req {
                Request::Dialogue { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every choice prompt shown, as its option texts.
    pub fn choice_prompts(&self) -> Vec<Vec<&str>> {
        self.requests
            .iter()
            .filter_map(|req| match req {
                Request::Choice { options, .. } => Some(options.iter().map(|o| o.text.as_str()).collect()),
                _ => None,
            })
            .collect()
    }

    /// Messages of every notice at `level`.
    pub fn notices(&self, level: NoticeLevel) -> Vec<&str> {
        self.requests
            .iter()
            .filter_map(|req| match req {
                Request::Notice { level: l, message } if *l == level => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.len()
    }
}

impl Presenter for ScriptedPresenter {
    fn show_dialogue(&mut self, speaker: &str, text: &str, is_end: bool) -> Response {
        self.requests.push(Request::Dialogue {
            speaker: speaker.to_string(),
            text: text.to_string(),
            is_end,
        });
        match self.replies.pop_front() {
            Some(Reply::Command(command)) => Response::Command(command),
            _ => Response::Continue,
        }
    }

    fn prompt_choice(&mut self, title: &str, options: &[ChoiceOption]) -> Selection {
        self.requests.push(Request::Choice {
            title: title.to_string(),
            options: options.to_vec(),
        });
        match self.replies.pop_front() {
            Some(Reply::Pick(n)) => {
                let id = n
                    .checked_sub(1)
                    .and_then(|idx| options.get(idx))
                    .map_or(ElementId::new(u32::MAX), |opt| opt.id);
                Selection::Choice(id)
            },
            Some(Reply::Command(command)) => Selection::Command(command),
            Some(Reply::Continue) => Selection::Command(MetaCommand::Continue),
            _ => Selection::Command(MetaCommand::Quit),
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.requests.push(Request::Notice {
            level,
            message: message.to_string(),
        });
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.requests.push(Request::Confirm {
            question: question.to_string(),
        });
        !matches!(self.replies.pop_front(), Some(Reply::No | Reply::Cancel))
    }

    fn ask_save_name(&mut self) -> Option<String> {
        self.requests.push(Request::SaveName);
        match self.replies.pop_front() {
            Some(Reply::Name(name)) => Some(name),
            _ => None,
        }
    }

    fn pick_save(&mut self, saves: &[String]) -> Option<String> {
        self.requests.push(Request::PickSave { saves: saves.to_vec() });
        match self.replies.pop_front() {
            Some(Reply::Name(name)) => Some(name),
            Some(Reply::Pick(n)) => n.checked_sub(1).and_then(|idx| saves.get(idx)).cloned(),
            _ => None,
        }
    }
}
