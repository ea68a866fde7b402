mod group;
mod input;
mod user;

use crate::admin::input::{CancelType, LineReader, TaskEditor};
use crate::app::AppState;
use crate::form::FormErrors;
use diesel::r2d2::PoolError;
use rustyline::error::ReadlineError;
use std::str::FromStr;
use strum::{EnumIter, EnumMessage, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Cancel(#[from] CancelType),
    #[error("Could not connect to the database. Details:\n{0}")]
    FailedConnection(#[from] PoolError),
    #[error("Database query failed. Details:\n{0}")]
    FailedQuery(#[from] diesel::result::Error),
    #[error("Invalid input:\n{0}")]
    InvalidInput(FormErrors),
    #[error("No group with slug \"{0}\" exists")]
    MissingGroup(String),
    #[error("No user named \"{0}\" exists")]
    MissingUser(String),
    #[error("Could not hash password. Details:\n{0}")]
    Password(#[from] argon2::password_hash::Error),
}

pub type AdminResult<T> = Result<T, AdminError>;

#[derive(Clone, Copy, EnumString, EnumIter, EnumMessage, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AdminTask {
    #[strum(message = "Create a group that posts can be published in")]
    CreateGroup,
    #[strum(message = "Delete a group. Its posts are kept without a group")]
    DeleteGroup,
    #[strum(message = "List all groups")]
    ListGroups,
    #[strum(message = "Create a user account")]
    CreateUser,
    #[strum(message = "Reset the password of a user")]
    ResetPassword,
}

/// Returns if the server was started in admin mode.
pub fn enabled() -> bool {
    std::env::args().any(|arg| arg == "--admin")
}

/// Runs the interactive admin prompt until the user exits.
pub fn command_line_mode(state: &AppState) -> Result<(), ReadlineError> {
    let mut editor: TaskEditor = input::create_editor()?;
    println!("Running Yatube admin command line interface. Enter \"help\" for a list of commands.\n");
    print_help();

    loop {
        let line = match input::read("Please select a task: ", &mut editor) {
            Ok(line) => line,
            Err(CancelType::Stop) => continue,
            Err(CancelType::Exit) => return Ok(()),
        };
        if line.is_empty() {
            continue;
        }

        let result = match AdminTask::from_str(&line) {
            Ok(task) => run_task(state, &mut editor, task),
            Err(_) => {
                let possible_arguments: Vec<&'static str> = AdminTask::iter().map(AdminTask::into).collect();
                eprintln!("ERROR: Task should be one of {possible_arguments:?}\n");
                Ok(())
            }
        };
        if let Err(CancelType::Exit) = result {
            return Ok(());
        }
    }
}

fn run_task(state: &AppState, reader: &mut dyn LineReader, task: AdminTask) -> Result<(), CancelType> {
    match task {
        AdminTask::CreateGroup => input::user_input_loop(state, reader, group::create_group),
        AdminTask::DeleteGroup => input::user_input_loop(state, reader, group::delete_group),
        AdminTask::ListGroups => {
            if let Err(err) = group::list_groups(state) {
                eprintln!("ERROR: {err}\n");
            }
            Ok(())
        }
        AdminTask::CreateUser => input::user_input_loop(state, reader, user::create_user),
        AdminTask::ResetPassword => input::user_input_loop(state, reader, user::reset_password),
    }
}

fn print_help() {
    println!("Commands:");
    for (keyword, description) in [
        ("help", "Show this help message"),
        ("clear", "Clear the screen"),
        ("done", "Finish the current task"),
        ("exit", "Exit admin mode"),
    ] {
        println!("  {keyword:16} {description}");
    }
    println!("\nTasks:");
    for task in AdminTask::iter() {
        let name: &'static str = task.into();
        println!("  {name:16} {}", task.get_message().unwrap_or_default());
    }
    println!();
}
