use std::fmt;

use client_core::{RowMode, ViewState};

/// Text view of the list, as printed between commands.
pub struct ListView<'a>(pub &'a ViewState);

impl fmt::Display for ListView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        writeln!(f, "NYMToDo  ({} open)", state.remaining())?;

        let composer = state.composer();
        if state.is_adding() {
            writeln!(f, "  Adding…")?;
        } else if !composer.title.is_empty() || !composer.description.is_empty() {
            writeln!(f, "  new: {:?} :: {:?}", composer.title, composer.description)?;
        }

        if let Some(error) = state.error() {
            writeln!(f, "  ! {error}  (type `dismiss` to clear)")?;
        }

        if state.is_loading() {
            return writeln!(f, "  Loading…");
        }
        if state.is_empty() {
            return writeln!(f, "  No todos yet. Add your first one!");
        }

        for (index, row) in state.rows().iter().enumerate() {
            let item = row.item();
            let check = if item.completed { "[x]" } else { "[ ]" };
            match row.mode() {
                RowMode::Editing(draft) => {
                    writeln!(f, "{:>3}. {check} ✎ {}", index + 1, draft.title)?;
                    writeln!(f, "          {}", draft.description)?;
                }
                RowMode::Expanded => {
                    writeln!(f, "{:>3}. {check} ▾ {}", index + 1, item.title)?;
                    if item.description.trim().is_empty() {
                        writeln!(f, "          No description")?;
                    } else {
                        for line in item.description.lines() {
                            writeln!(f, "          {line}")?;
                        }
                    }
                }
                RowMode::Viewing => {
                    writeln!(f, "{:>3}. {check} ▸ {}", index + 1, item.title)?;
                }
            }
        }
        Ok(())
    }
}

pub fn render(state: &ViewState) -> String {
    ListView(state).to_string()
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
