//! Client side of the todo list: the HTTP adapter for the todo API and the
//! list state that user actions are reconciled into.

pub mod api;
pub mod controller;
pub mod error;
pub mod view_state;

pub use api::{HttpTodoClient, TodoApi};
pub use controller::ListController;
pub use error::ClientError;
pub use view_state::{Composer, EditDraft, Operation, Outcome, Request, Row, RowMode, ViewState};
