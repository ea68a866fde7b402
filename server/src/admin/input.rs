use crate::admin::{AdminError, AdminResult, AdminTask};
use crate::app::AppState;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::error;

pub type TaskEditor = Editor<TaskCompleter, DefaultHistory>;

/// An admin task body. Reads its fields from `input` and performs the task once.
pub type Task = fn(&AppState, &mut dyn LineReader) -> AdminResult<()>;

#[derive(Debug, Error)]
pub enum CancelType {
    #[error("Task was cancelled")]
    Stop,
    #[error("Admin mode was exited")]
    Exit,
}

impl CancelType {
    fn from_keyword(line: &str) -> Option<Self> {
        match line {
            "done" => Some(Self::Stop),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Source of lines typed by the administrator.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> rustyline::Result<String>;

    fn clear_screen(&mut self) {}
}

impl LineReader for TaskEditor {
    fn read_line(&mut self, prompt: &str) -> rustyline::Result<String> {
        let line = self.readline(prompt)?;
        self.add_history_entry(line.trim())?;
        Ok(line)
    }

    fn clear_screen(&mut self) {
        if let Err(err) = Editor::clear_screen(self) {
            error!("Could not clear screen: {err}");
        }
    }
}

/// Tab completion of task names.
pub struct TaskCompleter;

impl Completer for TaskCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let candidates = AdminTask::iter()
            .map(<&'static str>::from)
            .filter(|name| name.starts_with(prefix))
            .map(|name| Pair {
                display: name.to_owned(),
                replacement: name.to_owned(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for TaskCompleter {
    type Hint = String;
}
impl Highlighter for TaskCompleter {}
impl Validator for TaskCompleter {}
impl Helper for TaskCompleter {}

pub fn create_editor() -> Result<TaskEditor, ReadlineError> {
    let editor_config = Config::builder().completion_type(CompletionType::List).build();
    let mut editor = Editor::with_config(editor_config)?;
    editor.set_helper(Some(TaskCompleter));
    Ok(editor)
}

/// Prompts with `prompt` until a line other than "help" or "clear" is entered and
/// returns it trimmed. The keywords "done" and "exit" cancel instead.
pub fn read(prompt: &str, input: &mut dyn LineReader) -> Result<String, CancelType> {
    loop {
        let line = match input.read_line(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Err(CancelType::Exit),
            Err(err) => {
                error!("Could not read input: {err}");
                continue;
            }
        };

        match line.trim() {
            "help" => super::print_help(),
            "clear" => input.clear_screen(),
            trimmed => {
                return match CancelType::from_keyword(trimmed) {
                    Some(cancel) => Err(cancel),
                    None => Ok(trimmed.to_owned()),
                };
            }
        }
    }
}

/// Repeats `task` until the administrator enters "done". Failed attempts are reported
/// and retried. Returns [`CancelType::Exit`] if admin mode should end.
pub fn user_input_loop(state: &AppState, input: &mut dyn LineReader, task: Task) -> Result<(), CancelType> {
    loop {
        match task(state, input) {
            Ok(()) => (),
            Err(AdminError::Cancel(CancelType::Stop)) => return Ok(()),
            Err(AdminError::Cancel(CancelType::Exit)) => return Err(CancelType::Exit),
            Err(err) => error!("{err}\n"),
        }
    }
}

/// Feeds a fixed sequence of lines, then behaves like a closed terminal.
#[cfg(test)]
pub struct ScriptedInput(std::collections::VecDeque<&'static str>);

#[cfg(test)]
impl ScriptedInput {
    pub fn new(lines: &[&'static str]) -> Self {
        Self(lines.iter().copied().collect())
    }
}

#[cfg(test)]
impl LineReader for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> rustyline::Result<String> {
        self.0.pop_front().map(String::from).ok_or(ReadlineError::Eof)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keywords() {
        let mut input = ScriptedInput::new(&["help", "  clear ", " cats ", "done", "exit"]);
        assert_eq!(read("Slug: ", &mut input).unwrap(), "cats");
        assert!(matches!(read("Slug: ", &mut input), Err(CancelType::Stop)));
        assert!(matches!(read("Slug: ", &mut input), Err(CancelType::Exit)));
        assert!(matches!(read("Slug: ", &mut input), Err(CancelType::Exit)));
    }

    #[test]
    fn completion() {
        let history = DefaultHistory::new();
        let context = Context::new(&history);
        let (start, candidates) = TaskCompleter.complete("create_", 7, &context).unwrap();
        assert_eq!(start, 0);
        let names: Vec<&str> = candidates.iter().map(|pair| pair.replacement.as_str()).collect();
        assert_eq!(names, ["create_group", "create_user"]);

        let (_, candidates) = TaskCompleter.complete("reset", 5, &context).unwrap();
        assert_eq!(candidates.len(), 1);
    }
}
