//! Line-oriented front end: parses commands from the input stream, drives the
//! list controller and re-renders after every change.

use anyhow::{anyhow, bail, Result};
use client_core::{ListController, TodoApi};
use shared::domain::TodoId;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::render::render;

pub const HELP: &str = "\
commands:
  list                          show the list again
  add [title [:: description]]  create a todo (bare `add` resubmits the drafts)
  edit <n>                      start editing todo n
  title <text> / desc <text>    change the edit drafts
  save | cancel | esc           finish or abandon the edit
  toggle <n>                    flip completion of todo n
  rm <n>                        delete todo n
  open <n>                      expand or collapse todo n
  dismiss                       clear the error message
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add {
        title: Option<String>,
        description: Option<String>,
    },
    Edit(usize),
    Title(String),
    Desc(String),
    Save,
    Cancel,
    Toggle(usize),
    Remove(usize),
    Open(usize),
    Dismiss,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "" | "list" | "ls" => Command::List,
        "add" if rest.is_empty() => Command::Add {
            title: None,
            description: None,
        },
        "add" => {
            let (title, description) = match rest.split_once("::") {
                Some((title, description)) => (title, Some(description.to_string())),
                None => (rest, None),
            };
            Command::Add {
                title: Some(title.to_string()),
                description,
            }
        }
        "edit" => Command::Edit(position(rest)?),
        "title" => Command::Title(rest.to_string()),
        "desc" => Command::Desc(rest.to_string()),
        "save" => Command::Save,
        "cancel" | "esc" => Command::Cancel,
        "toggle" | "done" => Command::Toggle(position(rest)?),
        "rm" | "delete" => Command::Remove(position(rest)?),
        "open" => Command::Open(position(rest)?),
        "dismiss" => Command::Dismiss,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command '{other}' (type `help`)"),
    };
    Ok(command)
}

fn position(raw: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(anyhow!("expected a todo number, got '{raw}'")),
    }
}

fn id_at<A: TodoApi + ?Sized>(controller: &ListController<A>, n: usize) -> Result<TodoId> {
    controller
        .state()
        .rows()
        .get(n - 1)
        .map(|row| row.item().id.clone())
        .ok_or_else(|| anyhow!("no todo number {n}"))
}

/// Applies one command. Returns a note for the user when the command was
/// refused.
pub fn apply_command<A: TodoApi + ?Sized>(
    controller: &mut ListController<A>,
    command: Command,
) -> Result<Option<&'static str>> {
    let note = match command {
        Command::List | Command::Quit => None,
        Command::Help => Some(HELP),
        // Drafts stay untouched while a create is in flight; its success
        // clears them.
        Command::Add { .. } if controller.state().is_adding() => {
            Some("still adding the previous todo; try again once it lands")
        }
        Command::Add { title, description } => {
            if let Some(title) = title {
                controller.set_title(title);
                controller.set_description(description.unwrap_or_default());
            }
            (!controller.submit_create()).then_some("a todo needs a title")
        }
        Command::Edit(n) => {
            let id = id_at(controller, n)?;
            controller.begin_edit(&id);
            None
        }
        Command::Title(text) => {
            (!controller.set_edit_title(text)).then_some("no todo is being edited")
        }
        Command::Desc(text) => {
            (!controller.set_edit_description(text)).then_some("no todo is being edited")
        }
        Command::Save => {
            if controller.save_edit() {
                None
            } else if controller.state().editing().is_some() {
                Some("a todo needs a title")
            } else {
                Some("no todo is being edited")
            }
        }
        Command::Cancel => {
            controller.cancel_edit();
            None
        }
        Command::Toggle(n) => {
            let id = id_at(controller, n)?;
            controller.toggle_completion(&id);
            None
        }
        Command::Remove(n) => {
            let id = id_at(controller, n)?;
            controller.delete(&id);
            None
        }
        Command::Open(n) => {
            let id = id_at(controller, n)?;
            (!controller.toggle_expanded(&id)).then_some("finish editing before expanding")
        }
        Command::Dismiss => {
            controller.dismiss_error();
            None
        }
    };
    Ok(note)
}

pub async fn run<A, R, W>(
    mut controller: ListController<A>,
    input: R,
    mut output: W,
) -> Result<()>
where
    A: TodoApi + ?Sized + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    controller.mount();
    let mut lines = BufReader::new(input).lines();
    write_view(&mut output, &mut controller, None).await?;

    loop {
        let in_flight = controller.in_flight();
        // Completed requests are merged before the next command is read.
        tokio::select! {
            biased;
            true = controller.next_completion(), if in_flight > 0 => {
                write_view(&mut output, &mut controller, None).await?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let note = match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        debug!(?command, "applying command");
                        match apply_command(&mut controller, command) {
                            Ok(note) => note.map(str::to_string),
                            Err(err) => Some(err.to_string()),
                        }
                    }
                    Err(err) => Some(err.to_string()),
                };
                write_view(&mut output, &mut controller, note.as_deref()).await?;
            }
        }
    }

    if controller.in_flight() > 0 {
        controller.settle().await;
        write_view(&mut output, &mut controller, None).await?;
    }
    output.flush().await?;
    Ok(())
}

async fn write_view<A, W>(
    output: &mut W,
    controller: &mut ListController<A>,
    note: Option<&str>,
) -> Result<()>
where
    A: TodoApi + ?Sized + 'static,
    W: AsyncWrite + Unpin,
{
    let mut text = render(controller.state());
    if controller.take_focus_request() {
        text.push_str("  (added; ready for the next title)\n");
    }
    if let Some(note) = note {
        text.push_str(note);
        text.push('\n');
    }
    text.push_str("> ");
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
