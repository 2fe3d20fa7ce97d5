//! Styling helpers for terminal output.
//!
//! [`StoryStyle`] applies ANSI styling via the `colored` crate. It is
//! implemented for `&str` and `String` so literals can be styled directly.

use colored::{ColoredString, Colorize};

pub trait StoryStyle {
    fn speaker_style(&self) -> ColoredString;
    fn dialogue_style(&self) -> ColoredString;
    fn scene_title_style(&self) -> ColoredString;
    fn banner_style(&self) -> ColoredString;
    fn choice_style(&self) -> ColoredString;
    fn choice_number_style(&self) -> ColoredString;
    fn unavailable_style(&self) -> ColoredString;
    fn prompt_style(&self) -> ColoredString;
    fn info_style(&self) -> ColoredString;
    fn warning_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
    fn success_style(&self) -> ColoredString;
}

impl StoryStyle for &str {
    fn speaker_style(&self) -> ColoredString {
        self.bold().truecolor(13, 130, 60)
    }
    fn dialogue_style(&self) -> ColoredString {
        self.italic().truecolor(102, 208, 250)
    }
    fn scene_title_style(&self) -> ColoredString {
        self.truecolor(223, 77, 10).underline()
    }
    fn banner_style(&self) -> ColoredString {
        self.to_uppercase().bold().truecolor(223, 77, 10).underline()
    }
    fn choice_style(&self) -> ColoredString {
        self.truecolor(220, 180, 40)
    }
    fn choice_number_style(&self) -> ColoredString {
        let bracketed = format!("[{self}]");
        bracketed.bold().truecolor(220, 180, 40)
    }
    fn unavailable_style(&self) -> ColoredString {
        self.dimmed().strikethrough()
    }
    fn prompt_style(&self) -> ColoredString {
        self.truecolor(75, 80, 75)
    }
    fn info_style(&self) -> ColoredString {
        self.truecolor(75, 180, 255)
    }
    fn warning_style(&self) -> ColoredString {
        self.italic().truecolor(230, 230, 30)
    }
    fn error_style(&self) -> ColoredString {
        self.bold().truecolor(230, 30, 30)
    }
    fn success_style(&self) -> ColoredString {
        self.truecolor(110, 220, 110)
    }
}

impl StoryStyle for String {
    fn speaker_style(&self) -> ColoredString {
        self.as_str().speaker_style()
    }
    fn dialogue_style(&self) -> ColoredString {
        self.as_str().dialogue_style()
    }
    fn scene_title_style(&self) -> ColoredString {
        self.as_str().scene_title_style()
    }
    fn banner_style(&self) -> ColoredString {
        self.as_str().banner_style()
    }
    fn choice_style(&self) -> ColoredString {
        self.as_str().choice_style()
    }
    fn choice_number_style(&self) -> ColoredString {
        self.as_str().choice_number_style()
    }
    fn unavailable_style(&self) -> ColoredString {
        self.as_str().unavailable_style()
    }
    fn prompt_style(&self) -> ColoredString {
        self.as_str().prompt_style()
    }
    fn info_style(&self) -> ColoredString {
        self.as_str().info_style()
    }
    fn warning_style(&self) -> ColoredString {
        self.as_str().warning_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
    fn success_style(&self) -> ColoredString {
        self.as_str().success_style()
    }
}
