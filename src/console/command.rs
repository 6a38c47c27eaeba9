//! Typed console commands.
//!
//! A line is parsed against the current view state because a few words mean
//! different things depending on what is open: `save` submits whichever form
//! is showing, and `y`/`n` answer a pending delete confirmation.

use crate::net::types::RecordField;
use crate::state::records::{ActiveForm, Event, ViewState};

pub const HELP: &str = "\
Commands:
  reload                 fetch the full record list again
  add                    open the add form
  edit <id>              open the edit form for a record
  set <field> <value>    fill a form field (name, age, email, phone, address)
  save                   submit the open form
  cancel                 close the open form without saving
  delete <id>            delete a record (asks for confirmation)
  y | n                  answer a delete confirmation
  dismiss                clear the error banner
  help                   show this text
  quit                   exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Dispatch(Event),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("`{command}` needs {argument}")]
    MissingArgument { command: &'static str, argument: &'static str },
    #[error("unknown field '{0}' (expected name, age, email, phone, or address)")]
    UnknownField(String),
    #[error("no form is open")]
    NoOpenForm,
    #[error("no delete is waiting for confirmation")]
    NothingToConfirm,
}

/// Parse one input line.
///
/// # Errors
///
/// Returns a [`ParseError`] describing why the line is not a usable command.
pub fn parse_command(line: &str, state: &ViewState) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let event = match word.to_ascii_lowercase().as_str() {
        "" => return Err(ParseError::Empty),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        "reload" | "refresh" => Event::Reload,
        "add" | "new" => Event::OpenAddForm,
        "edit" => Event::BeginEdit(required(rest, "edit", "a record id")?),
        "delete" | "rm" => Event::RequestDelete(required(rest, "delete", "a record id")?),
        "set" => parse_set(rest, state)?,
        "save" | "submit" => match state.active_form {
            ActiveForm::Add(_) => Event::SubmitAdd,
            ActiveForm::Edit(_) => Event::SubmitEdit,
            ActiveForm::None => return Err(ParseError::NoOpenForm),
        },
        "cancel" => {
            if state.active_form == ActiveForm::None {
                return Err(ParseError::NoOpenForm);
            }
            Event::CancelForm
        }
        "y" | "yes" => confirm(state, Event::ConfirmDelete)?,
        "n" | "no" => confirm(state, Event::CancelDelete)?,
        "dismiss" => Event::DismissError,
        other => return Err(ParseError::Unknown(other.to_owned())),
    };
    Ok(Command::Dispatch(event))
}

fn required(rest: &str, command: &'static str, argument: &'static str) -> Result<String, ParseError> {
    match rest.split_whitespace().next() {
        Some(value) => Ok(value.to_owned()),
        None => Err(ParseError::MissingArgument { command, argument }),
    }
}

fn parse_set(rest: &str, state: &ViewState) -> Result<Event, ParseError> {
    if state.active_form == ActiveForm::None {
        return Err(ParseError::NoOpenForm);
    }
    let (name, value) = match rest.split_once(char::is_whitespace) {
        Some((name, value)) => (name, value.trim()),
        None => (rest, ""),
    };
    if name.is_empty() {
        return Err(ParseError::MissingArgument { command: "set", argument: "a field name" });
    }
    let field = RecordField::from_name(name).ok_or_else(|| ParseError::UnknownField(name.to_owned()))?;
    Ok(Event::SetField { field, value: value.to_owned() })
}

fn confirm(state: &ViewState, event: Event) -> Result<Event, ParseError> {
    if state.pending_delete.is_none() {
        return Err(ParseError::NothingToConfirm);
    }
    Ok(event)
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
