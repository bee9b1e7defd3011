//! In-memory list state and the transitions user actions drive through it.
//!
//! Every transition that needs the server returns a [`Request`] instead of
//! performing I/O; the caller executes it and feeds the [`Outcome`] back through
//! [`ViewState::apply`]. Nothing changes an item locally before the server has
//! confirmed it.

use shared::domain::{Todo, TodoId, TodoPatch};
use tracing::{info, warn};

use crate::error::ClientError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDraft {
    pub title: String,
    pub description: String,
}

/// Interaction mode of a single row. At most one row is `Editing` and at most
/// one row is `Expanded` at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RowMode {
    #[default]
    Viewing,
    Editing(EditDraft),
    Expanded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    item: Todo,
    mode: RowMode,
    /// Bumped on every dispatched update.
    generation: u64,
    /// Generation of the newest confirmed update shown in `item`. A confirmed
    /// response only replaces the item when it was issued after this one.
    applied: u64,
}

impl Row {
    fn new(item: Todo) -> Self {
        Self {
            item,
            mode: RowMode::Viewing,
            generation: 0,
            applied: 0,
        }
    }

    pub fn item(&self) -> &Todo {
        &self.item
    }

    pub fn mode(&self) -> &RowMode {
        &self.mode
    }

    pub fn is_expanded(&self) -> bool {
        self.mode == RowMode::Expanded
    }

    pub fn edit_draft(&self) -> Option<&EditDraft> {
        match &self.mode {
            RowMode::Editing(draft) => Some(draft),
            _ => None,
        }
    }
}

/// Input drafts for the "new todo" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    pub title: String,
    pub description: String,
    focus_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Create,
    SaveEdit,
    Toggle,
    Delete,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Create => "create",
            Self::SaveEdit => "save_edit",
            Self::Toggle => "toggle",
            Self::Delete => "delete",
        }
    }

    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::Load => "Failed to load todos",
            Self::Create => "Failed to add todo",
            Self::SaveEdit => "Failed to update todo",
            Self::Toggle => "Failed to toggle todo",
            Self::Delete => "Failed to delete todo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    FetchAll,
    Create {
        title: String,
        description: String,
    },
    Update {
        id: TodoId,
        patch: TodoPatch,
        generation: u64,
        operation: Operation,
    },
    Remove {
        id: TodoId,
    },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Self::FetchAll => Operation::Load,
            Self::Create { .. } => Operation::Create,
            Self::Update { operation, .. } => *operation,
            Self::Remove { .. } => Operation::Delete,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Loaded(Result<Vec<Todo>, ClientError>),
    Created(Result<Todo, ClientError>),
    Updated {
        id: TodoId,
        generation: u64,
        operation: Operation,
        result: Result<Todo, ClientError>,
    },
    Removed {
        id: TodoId,
        result: Result<(), ClientError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    rows: Vec<Row>,
    loading: bool,
    adding: bool,
    error: Option<String>,
    composer: Composer,
    load_started: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    /// A fresh session: nothing fetched yet, so the list reports loading.
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            loading: true,
            adding: false,
            error: None,
            composer: Composer::default(),
            load_started: false,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn items(&self) -> impl Iterator<Item = &Todo> + '_ {
        self.rows.iter().map(Row::item)
    }

    pub fn row(&self, id: &TodoId) -> Option<&Row> {
        self.rows.iter().find(|row| &row.item.id == id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_adding(&self) -> bool {
        self.adding
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn remaining(&self) -> usize {
        self.rows.iter().filter(|row| !row.item.completed).count()
    }

    pub fn editing(&self) -> Option<(&Todo, &EditDraft)> {
        self.rows
            .iter()
            .find_map(|row| row.edit_draft().map(|draft| (&row.item, draft)))
    }

    pub fn expanded(&self) -> Option<&Todo> {
        self.rows
            .iter()
            .find(|row| row.is_expanded())
            .map(Row::item)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.composer.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.composer.description = description.into();
    }

    /// Whether the composer would accept a submit right now.
    pub fn can_submit(&self) -> bool {
        !self.adding && !self.composer.title.trim().is_empty()
    }

    /// Returns true once after a successful create asked for input focus.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.composer.focus_requested)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn begin_load(&mut self) -> Option<Request> {
        if self.load_started {
            return None;
        }
        self.load_started = true;
        self.loading = true;
        Some(Request::FetchAll)
    }

    pub fn submit_create(&mut self) -> Option<Request> {
        if !self.can_submit() {
            return None;
        }
        self.adding = true;
        Some(Request::Create {
            title: self.composer.title.trim().to_string(),
            description: self.composer.description.trim().to_string(),
        })
    }

    pub fn begin_edit(&mut self, id: &TodoId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        for row in &mut self.rows {
            if matches!(row.mode, RowMode::Editing(_)) {
                row.mode = RowMode::Viewing;
            }
        }
        let row = &mut self.rows[index];
        row.mode = RowMode::Editing(EditDraft {
            title: row.item.title.clone(),
            description: row.item.description.clone(),
        });
        true
    }

    pub fn set_edit_title(&mut self, title: impl Into<String>) -> bool {
        match self.editing_draft_mut() {
            Some(draft) => {
                draft.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn set_edit_description(&mut self, description: impl Into<String>) -> bool {
        match self.editing_draft_mut() {
            Some(draft) => {
                draft.description = description.into();
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) -> bool {
        match self
            .rows
            .iter_mut()
            .find(|row| matches!(row.mode, RowMode::Editing(_)))
        {
            Some(row) => {
                row.mode = RowMode::Viewing;
                true
            }
            None => false,
        }
    }

    /// Saving a blank title is refused and the edit session stays open.
    pub fn save_edit(&mut self) -> Option<Request> {
        let row = self
            .rows
            .iter_mut()
            .find(|row| matches!(row.mode, RowMode::Editing(_)))?;
        let RowMode::Editing(draft) = &row.mode else {
            return None;
        };
        let title = draft.title.trim();
        if title.is_empty() {
            return None;
        }
        let patch = TodoPatch {
            title: title.to_string(),
            description: draft.description.trim().to_string(),
            completed: row.item.completed,
        };
        row.generation += 1;
        Some(Request::Update {
            id: row.item.id.clone(),
            patch,
            generation: row.generation,
            operation: Operation::SaveEdit,
        })
    }

    pub fn toggle_completion(&mut self, id: &TodoId) -> Option<Request> {
        let index = self.index_of(id)?;
        let row = &mut self.rows[index];
        let mut patch = TodoPatch::from_todo(&row.item);
        patch.completed = !patch.completed;
        row.generation += 1;
        Some(Request::Update {
            id: row.item.id.clone(),
            patch,
            generation: row.generation,
            operation: Operation::Toggle,
        })
    }

    pub fn delete(&mut self, id: &TodoId) -> Option<Request> {
        self.index_of(id)?;
        Some(Request::Remove { id: id.clone() })
    }

    /// Expands a viewing row (collapsing any other) or collapses an expanded
    /// one. Rows being edited are left alone.
    pub fn toggle_expanded(&mut self, id: &TodoId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        match self.rows[index].mode {
            RowMode::Expanded => {
                self.rows[index].mode = RowMode::Viewing;
                true
            }
            RowMode::Viewing => {
                for row in &mut self.rows {
                    if row.mode == RowMode::Expanded {
                        row.mode = RowMode::Viewing;
                    }
                }
                self.rows[index].mode = RowMode::Expanded;
                true
            }
            RowMode::Editing(_) => false,
        }
    }

    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Loaded(result) => {
                self.loading = false;
                match result {
                    Ok(items) => self.replace_collection(items),
                    Err(err) => self.fail(Operation::Load, &err),
                }
            }
            Outcome::Created(result) => {
                self.adding = false;
                match result {
                    Ok(item) => {
                        self.rows.retain(|row| row.item.id != item.id);
                        self.rows.insert(0, Row::new(item));
                        self.composer.title.clear();
                        self.composer.description.clear();
                        self.composer.focus_requested = true;
                    }
                    Err(err) => self.fail(Operation::Create, &err),
                }
            }
            Outcome::Updated {
                id,
                generation,
                operation,
                result,
            } => match result {
                Ok(item) => self.confirm_update(&id, generation, operation, item),
                Err(err) => self.fail(operation, &err),
            },
            Outcome::Removed { id, result } => match result {
                Ok(()) => {
                    let before = self.rows.len();
                    self.rows.retain(|row| row.item.id != id);
                    if self.rows.len() == before {
                        info!(todo_id = %id, "delete confirmed for todo no longer in the list");
                    }
                }
                Err(err) => self.fail(Operation::Delete, &err),
            },
        }
    }

    fn confirm_update(&mut self, id: &TodoId, generation: u64, operation: Operation, item: Todo) {
        let Some(index) = self.index_of(id) else {
            info!(todo_id = %id, operation = operation.name(), "dropping update for removed todo");
            return;
        };
        let row = &mut self.rows[index];
        if operation == Operation::SaveEdit && matches!(row.mode, RowMode::Editing(_)) {
            row.mode = RowMode::Viewing;
        }
        if generation <= row.applied {
            info!(
                todo_id = %id,
                operation = operation.name(),
                issued = generation,
                applied = row.applied,
                "discarding stale update response"
            );
            return;
        }
        row.applied = generation;
        row.item = item;
    }

    /// Loaded items replace the collection. Rows created while the load was in
    /// flight are not in the server snapshot and stay at the head.
    fn replace_collection(&mut self, items: Vec<Todo>) {
        let mut rows: Vec<Row> = Vec::with_capacity(items.len());
        for item in items {
            if rows.iter().any(|row| row.item.id == item.id) {
                continue;
            }
            rows.push(Row::new(item));
        }
        let mut merged: Vec<Row> = self
            .rows
            .drain(..)
            .filter(|local| !rows.iter().any(|row| row.item.id == local.item.id))
            .collect();
        merged.extend(rows);
        self.rows = merged;
    }

    fn fail(&mut self, operation: Operation, err: &ClientError) {
        warn!(operation = operation.name(), error = %err, "todo request failed");
        self.error = Some(
            err.user_message()
                .unwrap_or_else(|| operation.fallback_message().to_string()),
        );
    }

    fn index_of(&self, id: &TodoId) -> Option<usize> {
        self.rows.iter().position(|row| &row.item.id == id)
    }

    fn editing_draft_mut(&mut self) -> Option<&mut EditDraft> {
        self.rows.iter_mut().find_map(|row| match &mut row.mode {
            RowMode::Editing(draft) => Some(draft),
            _ => None,
        })
    }
}

#[cfg(test)]
#[path = "tests/view_state_tests.rs"]
mod tests;
