//! Wire representation of todos as exchanged with the HTTP API.

use serde::{Deserialize, Serialize};

use crate::domain::{Todo, TodoId, TodoPatch};

pub fn todos_route() -> &'static str {
    "todos"
}

/// A todo as the server encodes it. The capitalised aliases cover servers that
/// serialize their records without field tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoRecord {
    #[serde(alias = "ID")]
    pub id: TodoId,
    #[serde(default, alias = "Title")]
    pub title: String,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "IsCompleted")]
    pub is_completed: bool,
}

impl From<TodoRecord> for Todo {
    fn from(value: TodoRecord) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description.unwrap_or_default(),
            completed: value.is_completed,
        }
    }
}

impl From<Todo> for TodoRecord {
    fn from(value: Todo) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: Some(value.description),
            is_completed: value.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: String,
    pub description: String,
    pub is_completed: bool,
}

impl From<&TodoPatch> for UpdateTodoRequest {
    fn from(value: &TodoPatch) -> Self {
        Self {
            title: value.title.clone(),
            description: value.description.clone(),
            is_completed: value.completed,
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
