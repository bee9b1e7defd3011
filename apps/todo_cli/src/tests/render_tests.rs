use super::*;
use client_core::{Outcome, ViewState};
use shared::domain::{Todo, TodoId};

fn todo(id: &str, title: &str, description: &str, completed: bool) -> Todo {
    Todo {
        id: TodoId::new(id),
        title: title.to_string(),
        description: description.to_string(),
        completed,
    }
}

fn loaded(items: Vec<Todo>) -> ViewState {
    let mut state = ViewState::new();
    state.begin_load();
    state.apply(Outcome::Loaded(Ok(items)));
    state
}

#[test]
fn shows_loading_before_first_fetch() {
    let text = render(&ViewState::new());
    assert!(text.contains("(0 open)"));
    assert!(text.contains("Loading…"));
}

#[test]
fn shows_placeholder_for_empty_list() {
    let text = render(&loaded(Vec::new()));
    assert!(text.contains("No todos yet. Add your first one!"));
}

#[test]
fn expanded_row_shows_description_or_placeholder() {
    let mut state = loaded(vec![
        todo("1", "Milk", "", false),
        todo("2", "Walk", "around the block", true),
    ]);
    state.toggle_expanded(&TodoId::new("1"));
    let text = render(&state);
    assert!(text.contains("  1. [ ] ▾ Milk"));
    assert!(text.contains("No description"));
    assert!(text.contains("  2. [x] ▸ Walk"));
    assert!(!text.contains("around the block"));
    assert!(text.contains("(1 open)"));

    state.toggle_expanded(&TodoId::new("2"));
    let text = render(&state);
    assert!(text.contains("around the block"));
    assert!(!text.contains("No description"));
}

#[test]
fn editing_row_shows_drafts() {
    let mut state = loaded(vec![todo("1", "Milk", "2 litres", false)]);
    state.begin_edit(&TodoId::new("1"));
    state.set_edit_title("Oat milk");
    let text = render(&state);
    assert!(text.contains("✎ Oat milk"));
    assert!(text.contains("2 litres"));
}

#[test]
fn list_view_prints_rows_in_order_with_markers() {
    let state = loaded(vec![todo("1", "Milk", "", false), todo("2", "Walk", "", true)]);

    assert_eq!(
        format!("{}", ListView(&state)),
        "NYMToDo  (1 open)\n  1. [ ] ▸ Milk\n  2. [x] ▸ Walk\n"
    );
    assert_eq!(render(&state), ListView(&state).to_string());
}
