//! Story execution.
//!
//! The interpreter is a state machine over element ids. Each [`step`] runs the
//! element at the current id and moves to the next one: the structural
//! successor, the first element of a branch, or the first element of another
//! scene. Meta commands (save, load, undo, quit) are answered in place.
//!
//! [`step`]: Interpreter::step

use crate::TALES_VERSION;
use crate::dsl::{Condition, Effect, EffectOutcome};
use crate::error::{ExpressionError, NavigationError, PersistenceError};
use crate::game_state::GameState;
use crate::history::History;
use crate::presentation::{ChoiceOption, MetaCommand, NoticeLevel, Presenter, Response, Selection};
use crate::save_files::{
    SAVE_DIR, SaveData, SaveFileEntry, SaveFileStatus, build_save_entries, read_save, sanitize_slug,
    save_dir_for_script, write_save,
};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tales_script::{Branch, Choice, Dialogue, Element, ElementId, IfBlock, Program};

/// How a [`Interpreter::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The story ran out of elements.
    Finished,
    /// The player quit and confirmed it.
    Quit,
    /// An unrecoverable position error stopped the story.
    Halted,
}

/// Result of a single [`Interpreter::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Advanced,
    Finished,
    Quit,
    Halted,
}

/// What a meta command did to the story position.
enum MetaResult {
    Stay,
    Moved,
    Quit,
}

pub struct Interpreter {
    program: Rc<Program>,
    script: String,
    state: GameState,
    history: History,
    current: Option<ElementId>,
    entry: ElementId,
    conditions: HashMap<ElementId, Condition>,
    effects: HashMap<(ElementId, usize), Effect>,
    save_dir: PathBuf,
}

impl Interpreter {
    /// Prepare a story for play.
    ///
    /// Play starts at the first element of `start_scene`, or of the first
    /// scene when none is given.
    ///
    /// # Errors
    /// Fails if the script has no scenes or the start scene is unknown or empty.
    pub fn new(program: Program, script: &str, start_scene: Option<&str>) -> Result<Self, NavigationError> {
        let entry = match start_scene {
            Some(name) => scene_entry(&program, name)?,
            None => {
                let (_, first) = program.scenes().next().ok_or(NavigationError::NoScenes)?;
                scene_entry(&program, &first.name)?
            },
        };
        let script = sanitize_slug(script, "story");
        let state = GameState::new();
        info!("story '{script}' ready at {entry} ({} elements)", program.len());
        Ok(Self {
            history: History::new(state.snapshot()),
            save_dir: save_dir_for_script(Path::new(SAVE_DIR), &script),
            program: Rc::new(program),
            script,
            state,
            current: Some(entry),
            entry,
            conditions: HashMap::new(),
            effects: HashMap::new(),
        })
    }

    /// Keep saves for this story under `root` instead of the default directory.
    #[must_use]
    pub fn with_save_root(mut self, root: &Path) -> Self {
        self.save_dir = save_dir_for_script(root, &self.script);
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current(&self) -> Option<ElementId> {
        self.current
    }

    pub fn entry(&self) -> ElementId {
        self.entry
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Use `condition` for an element instead of resolving its text.
    pub fn set_condition(&mut self, id: ElementId, condition: Condition) {
        self.conditions.insert(id, condition);
    }

    /// Use `effect` for an element's `index`-th effect instead of resolving its text.
    pub fn set_effect(&mut self, id: ElementId, index: usize, effect: Effect) {
        self.effects.insert((id, index), effect);
    }

    /// Run until the story ends, the player quits, or the story halts.
    pub fn run(&mut self, presenter: &mut dyn Presenter) -> RunOutcome {
        info!("running story '{}'", self.script);
        loop {
            match self.step(presenter) {
                Step::Advanced => {},
                Step::Finished => {
                    info!("story '{}' finished", self.script);
                    presenter.notify(NoticeLevel::Success, "Story concluded.");
                    return RunOutcome::Finished;
                },
                Step::Quit => {
                    info!("player quit story '{}'", self.script);
                    return RunOutcome::Quit;
                },
                Step::Halted => return RunOutcome::Halted,
            }
        }
    }

    /// Execute the element at the current position.
    pub fn step(&mut self, presenter: &mut dyn Presenter) -> Step {
        let Some(id) = self.current else {
            return Step::Finished;
        };
        let program = Rc::clone(&self.program);
        let Some(element) = program.get(id) else {
            let err = NavigationError::DanglingElement(id);
            error!("halting: {err}");
            presenter.notify(NoticeLevel::Error, &format!("The story cannot continue: {err}."));
            self.current = None;
            return Step::Halted;
        };
        debug!("step {id}: {} on line {}", element.kind_name(), element.line());
        match element {
            Element::Dialogue(dialogue) => self.run_dialogue(id, dialogue, presenter),
            Element::Choice(_) => self.run_choices(id, presenter),
            Element::If(block) => {
                self.run_if(id, block, presenter);
                Step::Advanced
            },
            Element::Scene(scene) => {
                self.current = scene.content.first().copied();
                Step::Advanced
            },
        }
    }

    /// Next element after `id` once it has finished, climbing out of `@if`
    /// branches as needed. `None` at the end of a scene.
    pub fn successor(&self, id: ElementId) -> Option<ElementId> {
        let mut current = id;
        loop {
            let link = self.program.parent(current)?;
            let list = self.program.list(link.owner, link.branch)?;
            if let Some(next) = list.get(link.index + 1) {
                return Some(*next);
            }
            match link.branch {
                Branch::Content => return None,
                Branch::Then | Branch::Else => current = link.owner,
            }
        }
    }

    /// `id` and the choices directly following it in the same list.
    pub fn choice_group(&self, id: ElementId) -> Vec<ElementId> {
        let Some((list, idx)) = self.program.owning_list(id) else {
            return vec![id];
        };
        list[idx..]
            .iter()
            .copied()
            .take_while(|member| self.program.get(*member).is_some_and(Element::is_choice))
            .collect()
    }

    fn run_dialogue(&mut self, id: ElementId, dialogue: &Dialogue, presenter: &mut dyn Presenter) -> Step {
        let is_end = !self
            .successor(id)
            .and_then(|next| self.program.get(next))
            .is_some_and(Element::is_dialogue);
        loop {
            match presenter.show_dialogue(&dialogue.speaker, &dialogue.text, is_end) {
                Response::Continue | Response::Command(MetaCommand::Continue) => break,
                Response::Command(command) => match self.handle_meta(command, presenter) {
                    MetaResult::Stay => {},
                    MetaResult::Moved => return Step::Advanced,
                    MetaResult::Quit => return Step::Quit,
                },
            }
        }

        let effects = self.resolve_effects(id, &dialogue.effects, presenter);
        if !effects.is_empty() {
            self.history.push(self.state.snapshot(), Some(id));
            self.apply_effects(&effects, presenter);
        }
        self.current = self.successor(id);
        Step::Advanced
    }

    fn run_choices(&mut self, id: ElementId, presenter: &mut dyn Presenter) -> Step {
        let program = Rc::clone(&self.program);
        let group = self.choice_group(id);
        let last = group.last().copied().unwrap_or(id);

        let mut options = Vec::with_capacity(group.len());
        let mut pending: HashMap<ElementId, (&Choice, Vec<Effect>)> = HashMap::new();
        for member in &group {
            let Some(choice) = program.get(*member).and_then(Element::as_choice) else {
                continue;
            };
            let available = match &choice.condition {
                None => true,
                Some(raw) => self
                    .resolve_condition(*member, raw, presenter)
                    .is_some_and(|condition| condition.is_met(&self.state)),
            };
            if available {
                let effects = self.resolve_effects(*member, &choice.effects, presenter);
                pending.insert(*member, (choice, effects));
            }
            options.push(ChoiceOption {
                id: *member,
                text: choice.text.clone(),
                available,
            });
        }
        let title = program.scene_of(id).map(|scene| scene.name.clone()).unwrap_or_default();

        loop {
            match presenter.prompt_choice(&title, &options) {
                Selection::Choice(selected) => {
                    let Some((choice, effects)) = pending.remove(&selected) else {
                        warn!("selection {selected} is not an available choice at {id}");
                        presenter.notify(NoticeLevel::Warning, "That choice is not available.");
                        continue;
                    };
                    debug!("chose {selected}: '{}'", choice.text);
                    self.history.push(self.state.snapshot(), Some(id));
                    self.apply_effects(&effects, presenter);
                    self.current = match &choice.transition {
                        Some(scene) => match scene_entry(&program, scene) {
                            Ok(first) => Some(first),
                            Err(err) => {
                                error!("transition from {selected} failed: {err}");
                                presenter.notify(NoticeLevel::Error, &format!("Cannot go to '{scene}': {err}."));
                                self.successor(last)
                            },
                        },
                        None => self.successor(last),
                    };
                    return Step::Advanced;
                },
                Selection::Command(MetaCommand::Continue) => {
                    self.current = self.successor(last);
                    return Step::Advanced;
                },
                Selection::Command(command) => match self.handle_meta(command, presenter) {
                    MetaResult::Stay => {},
                    MetaResult::Moved => return Step::Advanced,
                    MetaResult::Quit => return Step::Quit,
                },
            }
        }
    }

    fn run_if(&mut self, id: ElementId, block: &IfBlock, presenter: &mut dyn Presenter) {
        let branch = match self.resolve_condition(id, &block.condition, presenter) {
            Some(condition) if condition.is_met(&self.state) => Some(&block.then_branch),
            Some(_) => block.else_branch.as_ref(),
            None => None,
        };
        self.current = branch
            .and_then(|list| list.first().copied())
            .or_else(|| self.successor(id));
    }

    fn resolve_condition(&mut self, id: ElementId, raw: &str, presenter: &mut dyn Presenter) -> Option<Condition> {
        if let Some(condition) = self.conditions.get(&id) {
            return Some(condition.clone());
        }
        match Condition::parse(raw) {
            Ok(condition) => {
                self.conditions.insert(id, condition.clone());
                Some(condition)
            },
            Err(err) => {
                self.report_expression(id, "condition", raw, &err, presenter);
                None
            },
        }
    }

    /// Resolve every effect of an element, skipping the ones that fail.
    fn resolve_effects(&mut self, id: ElementId, raws: &[String], presenter: &mut dyn Presenter) -> Vec<Effect> {
        let mut resolved = Vec::with_capacity(raws.len());
        for (index, raw) in raws.iter().enumerate() {
            if let Some(effect) = self.effects.get(&(id, index)) {
                resolved.push(effect.clone());
                continue;
            }
            match Effect::parse(raw) {
                Ok(effect) => {
                    self.effects.insert((id, index), effect.clone());
                    resolved.push(effect);
                },
                Err(err) => self.report_expression(id, "effect", raw, &err, presenter),
            }
        }
        resolved
    }

    fn apply_effects(&mut self, effects: &[Effect], presenter: &mut dyn Presenter) {
        for effect in effects {
            match effect.apply(&mut self.state) {
                EffectOutcome::Applied => debug!("applied {effect}"),
                EffectOutcome::NotApplied if matches!(effect, Effect::AddStat { .. }) => {
                    warn!("'{effect}' not applied: stat is not numeric");
                    presenter.notify(
                        NoticeLevel::Warning,
                        &format!("Skipped '{effect}': that stat is not a number."),
                    );
                },
                EffectOutcome::NotApplied => debug!("'{effect}' had nothing to act on"),
            }
        }
    }

    fn report_expression(
        &self,
        id: ElementId,
        what: &str,
        raw: &str,
        err: &ExpressionError,
        presenter: &mut dyn Presenter,
    ) {
        let line = self.program.get(id).map_or(0, Element::line);
        warn!("line {line}: skipping {what} '{raw}': {err}");
        presenter.notify(
            NoticeLevel::Warning,
            &format!("Skipping {what} '{raw}' on line {line}: {err}"),
        );
    }

    fn handle_meta(&mut self, command: MetaCommand, presenter: &mut dyn Presenter) -> MetaResult {
        match command {
            MetaCommand::Save => {
                self.save_interactive(presenter);
                MetaResult::Stay
            },
            MetaCommand::Load => {
                if self.load_interactive(presenter) {
                    MetaResult::Moved
                } else {
                    MetaResult::Stay
                }
            },
            MetaCommand::Undo => {
                if self.undo(presenter) {
                    MetaResult::Moved
                } else {
                    MetaResult::Stay
                }
            },
            MetaCommand::Quit => {
                if presenter.confirm("Quit the story?") {
                    MetaResult::Quit
                } else {
                    MetaResult::Stay
                }
            },
            MetaCommand::Continue => MetaResult::Stay,
        }
    }

    /// Drop the newest history entry and return to the one below it.
    ///
    /// Restores that entry's state and resumes at its element, or at the
    /// story's entry point for the initial snapshot. Returns `false` when
    /// there is nothing to undo.
    pub fn undo(&mut self, presenter: &mut dyn Presenter) -> bool {
        let Some(top) = self.history.undo() else {
            presenter.notify(NoticeLevel::Info, "Nothing to undo.");
            return false;
        };
        self.state.restore(&top.state);
        self.current = Some(top.element.unwrap_or(self.entry));
        debug!("undo: resuming at {:?} ({} history entries)", self.current, self.history.len());
        presenter.notify(NoticeLevel::Info, "Undone.");
        true
    }

    /// Everything needed to resume later.
    pub fn save_data(&self) -> SaveData {
        SaveData {
            engine_version: TALES_VERSION.to_string(),
            script: self.script.clone(),
            current: self.current,
            state: self.state.snapshot(),
            history: self.history.entries().to_vec(),
        }
    }

    /// Write the story to a named slot.
    ///
    /// # Errors
    /// Fails if the save file cannot be written.
    pub fn save_to(&self, slot: &str) -> Result<PathBuf, PersistenceError> {
        write_save(&self.save_dir, slot, &self.save_data())
    }

    /// Replace the live story with a saved one.
    ///
    /// Nothing changes if the data is structurally invalid. A position that
    /// does not exist in this script is accepted and returned as a warning;
    /// the next step will halt on it.
    ///
    /// # Errors
    /// Fails if the save has no history.
    pub fn restore(&mut self, data: SaveData) -> Result<Option<NavigationError>, PersistenceError> {
        data.validate()?;
        if data.script != self.script {
            warn!("save was made for '{}', loading into '{}'", data.script, self.script);
        }
        let warning = data
            .current
            .filter(|id| !self.program.contains(*id))
            .map(NavigationError::DanglingElement);
        self.state = GameState::from_snapshot(&data.state);
        self.history = History::from_entries(data.history);
        self.current = data.current;
        info!("restored story at {:?} with {} history entries", self.current, self.history.len());
        Ok(warning)
    }

    /// Read a save file and restore it.
    ///
    /// # Errors
    /// Fails on I/O or format errors; the live story is untouched then.
    pub fn load_from(&mut self, path: &Path) -> Result<Option<NavigationError>, PersistenceError> {
        let data = read_save(path)?;
        self.restore(data)
    }

    fn save_interactive(&mut self, presenter: &mut dyn Presenter) {
        let Some(name) = presenter.ask_save_name() else {
            presenter.notify(NoticeLevel::Info, "Save cancelled.");
            return;
        };
        match self.save_to(&name) {
            Ok(_) => presenter.notify(NoticeLevel::Success, &format!("Saved '{name}'.")),
            Err(err) => {
                warn!("save '{name}' failed: {err}");
                presenter.notify(NoticeLevel::Error, &format!("Save failed: {err}"));
            },
        }
    }

    fn load_interactive(&mut self, presenter: &mut dyn Presenter) -> bool {
        let entries = match build_save_entries(&self.save_dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("listing saves failed: {err}");
                presenter.notify(NoticeLevel::Error, &format!("Cannot list saves: {err}"));
                return false;
            },
        };
        let loadable: Vec<SaveFileEntry> = entries.into_iter().filter(SaveFileEntry::is_loadable).collect();
        if loadable.is_empty() {
            presenter.notify(NoticeLevel::Info, "No saved games found.");
            return false;
        }
        let labels: Vec<String> = loadable.iter().map(SaveFileEntry::label).collect();
        let Some(picked) = presenter.pick_save(&labels) else {
            presenter.notify(NoticeLevel::Info, "Load cancelled.");
            return false;
        };
        let Some((entry, _)) = loadable
            .iter()
            .zip(&labels)
            .find(|(entry, label)| **label == picked || entry.answers_to(&picked))
        else {
            presenter.notify(NoticeLevel::Warning, &format!("No save named '{picked}'."));
            return false;
        };
        if let SaveFileStatus::VersionMismatch {
            save_version,
            current_version,
        } = &entry.status
        {
            presenter.notify(
                NoticeLevel::Warning,
                &format!("'{}' was saved by version {save_version}; this is {current_version}.", entry.slot),
            );
        }
        match self.load_from(&entry.path) {
            Ok(warning) => {
                if let Some(problem) = warning {
                    presenter.notify(NoticeLevel::Warning, &format!("Loaded save points nowhere: {problem}."));
                }
                presenter.notify(NoticeLevel::Success, &format!("Loaded '{}'.", entry.slot));
                true
            },
            Err(err) => {
                warn!("load '{}' failed: {err}", entry.slot);
                presenter.notify(NoticeLevel::Error, &format!("Load failed: {err}"));
                false
            },
        }
    }
}

/// First element of a named scene.
fn scene_entry(program: &Program, name: &str) -> Result<ElementId, NavigationError> {
    let (_, scene) = program
        .scene(name)
        .ok_or_else(|| NavigationError::UnknownScene(name.to_string()))?;
    scene
        .content
        .first()
        .copied()
        .ok_or_else(|| NavigationError::EmptyScene(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{Reply, ScriptedPresenter};
    use tales_script::parse_script;

    fn interpreter(source: &str) -> Interpreter {
        Interpreter::new(parse_script(source).unwrap(), "test", None).unwrap()
    }

    #[test]
    fn successor_climbs_out_of_branches() {
        let interp = interpreter("@scene s\n@if true\n@if true\n> A: deep\n@endif\n@endif\n> A: after\n");
        let program = interp.program();
        let (_, scene) = program.scene("s").unwrap();
        let outer = scene.content[0];
        let inner = program.get(outer).and_then(Element::as_if).unwrap().then_branch[0];
        let deep = program.get(inner).and_then(Element::as_if).unwrap().then_branch[0];
        assert_eq!(interp.successor(deep), Some(scene.content[1]));
        assert_eq!(interp.successor(scene.content[1]), None);
    }

    #[test]
    fn choice_group_stops_at_non_choice() {
        let interp = interpreter("@scene s\n* a\n* b\n* c\n> A: after\n* d\n");
        let (_, scene) = interp.program().scene("s").unwrap();
        assert_eq!(interp.choice_group(scene.content[0]), scene.content[0..3].to_vec());
        assert_eq!(interp.choice_group(scene.content[1]), scene.content[1..3].to_vec());
        assert_eq!(interp.choice_group(scene.content[4]), vec![scene.content[4]]);
    }

    #[test]
    fn start_scene_must_exist_and_have_content() {
        let program = parse_script("@scene a\n> A: hi\n@scene empty\n").unwrap();
        assert!(matches!(
            Interpreter::new(program.clone(), "t", Some("missing")),
            Err(NavigationError::UnknownScene(_))
        ));
        assert!(matches!(
            Interpreter::new(program.clone(), "t", Some("empty")),
            Err(NavigationError::EmptyScene(_))
        ));
        assert!(Interpreter::new(program, "t", Some("a")).is_ok());
        assert!(matches!(
            Interpreter::new(Program::default(), "t", None),
            Err(NavigationError::NoScenes)
        ));
    }

    #[test]
    fn dialogue_end_flag() {
        let mut interp = interpreter("@scene s\n> A: one\n> A: two\n* pick\n");
        let mut presenter = ScriptedPresenter::default();
        interp.run(&mut presenter);
        let flags: Vec<bool> = presenter
            .requests()
            .iter()
            .filter_map(|req| match req {
                crate::presentation::Request::Dialogue { is_end, .. } => Some(*is_end),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn failed_expressions_are_reported_and_skipped() {
        let mut interp = interpreter("@scene s\n> A: hi {add_item:Key} {fly:away} {add_stat:gold:5}\n");
        let mut presenter = ScriptedPresenter::default();
        assert_eq!(interp.run(&mut presenter), RunOutcome::Finished);
        assert_eq!(interp.state().item_count("Key"), 1);
        assert_eq!(interp.state().stat("gold"), Some(&crate::value::Value::Int(5)));
        let warnings = presenter.notices(NoticeLevel::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("fly:away"));
        assert!(warnings[0].contains("line 2"));
        assert_eq!(presenter.notices(NoticeLevel::Success), vec!["Story concluded."]);
    }

    #[test]
    fn dialogue_without_effects_leaves_history_alone() {
        let mut interp = interpreter("@scene s\n> A: hi\n> A: bye {}\n");
        let mut presenter = ScriptedPresenter::default();
        interp.run(&mut presenter);
        assert_eq!(interp.history().len(), 1);
    }

    #[test]
    fn custom_conditions_override_script_text() {
        let mut interp = interpreter("@scene s\n@if has_item:Crown\n> A: king\n@else\n> A: peasant\n@endif\n");
        let block = interp.entry();
        interp.set_condition(block, Condition::custom("always", |_: &GameState| true));
        let mut presenter = ScriptedPresenter::default();
        interp.run(&mut presenter);
        assert_eq!(presenter.dialogue_texts(), vec!["king"]);
    }

    #[test]
    fn unconfirmed_quit_resumes() {
        let mut interp = interpreter("@scene s\n> A: hi\n> A: bye\n");
        let mut presenter = ScriptedPresenter::new([Reply::Command(MetaCommand::Quit), Reply::No]);
        assert_eq!(interp.run(&mut presenter), RunOutcome::Finished);
        assert_eq!(presenter.dialogue_texts(), vec!["hi", "hi", "bye"]);
    }

    #[test]
    fn dangling_position_halts() {
        let mut interp = interpreter("@scene s\n> A: hi\n");
        let mut data = interp.save_data();
        data.current = Some(ElementId::new(99));
        let warning = interp.restore(data).unwrap();
        assert_eq!(warning, Some(NavigationError::DanglingElement(ElementId::new(99))));
        let mut presenter = ScriptedPresenter::default();
        assert_eq!(interp.run(&mut presenter), RunOutcome::Halted);
        assert_eq!(presenter.notices(NoticeLevel::Error).len(), 1);
    }

    #[test]
    fn invalid_restore_changes_nothing() {
        let mut interp = interpreter("@scene s\n> A: hi {add_item:Key}\n");
        let mut presenter = ScriptedPresenter::default();
        interp.step(&mut presenter);
        let before = interp.save_data();
        let mut broken = before.clone();
        broken.history.clear();
        broken.current = None;
        assert!(matches!(interp.restore(broken), Err(PersistenceError::Invalid(_))));
        assert_eq!(interp.save_data(), before);
    }
}
