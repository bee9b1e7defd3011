use super::*;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use shared::domain::{Todo, TodoPatch};
use tokio::sync::{oneshot, Mutex};

use crate::{error::ClientError, view_state::RowMode};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    FetchAll,
    Create { title: String, description: String },
    Update { id: TodoId, patch: TodoPatch },
    Remove { id: TodoId },
}

struct TestTodoApi {
    initial: Vec<Todo>,
    fail_with: Option<(u16, String)>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u32>,
    /// Updates whose patch title matches a key wait for the paired sender.
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    /// Updates whose patch title is listed here fail with a 500.
    failing_updates: Mutex<HashSet<String>>,
}

impl TestTodoApi {
    fn ok(initial: Vec<Todo>) -> Self {
        Self {
            initial,
            fail_with: None,
            calls: Mutex::new(Vec::new()),
            next_id: Mutex::new(100),
            gates: Mutex::new(HashMap::new()),
            failing_updates: Mutex::new(HashSet::new()),
        }
    }

    fn failing(status: u16, body: impl Into<String>) -> Self {
        let mut api = Self::ok(Vec::new());
        api.fail_with = Some((status, body.into()));
        api
    }

    async fn gate_update(&self, title: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(title.to_string(), rx);
        tx
    }

    async fn fail_update(&self, title: &str) {
        self.failing_updates.lock().await.insert(title.to_string());
    }

    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    fn failure(&self) -> Option<ClientError> {
        self.fail_with.as_ref().map(|(status, body)| ClientError::Status {
            status: *status,
            status_text: "Internal Server Error".to_string(),
            body: body.clone(),
        })
    }
}

#[async_trait]
impl TodoApi for TestTodoApi {
    async fn fetch_all(&self) -> Result<Vec<Todo>, ClientError> {
        self.calls.lock().await.push(Call::FetchAll);
        match self.failure() {
            Some(err) => Err(err),
            None => Ok(self.initial.clone()),
        }
    }

    async fn create(&self, title: &str, description: &str) -> Result<Todo, ClientError> {
        self.calls.lock().await.push(Call::Create {
            title: title.to_string(),
            description: description.to_string(),
        });
        if let Some(err) = self.failure() {
            return Err(err);
        }
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        Ok(Todo {
            id: TodoId::new(format!("srv-{next_id}")),
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
        })
    }

    async fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Todo, ClientError> {
        self.calls.lock().await.push(Call::Update {
            id: id.clone(),
            patch: patch.clone(),
        });
        let gate = self.gates.lock().await.remove(&patch.title);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(err) = self.failure() {
            return Err(err);
        }
        if self.failing_updates.lock().await.contains(&patch.title) {
            return Err(ClientError::Status {
                status: 500,
                status_text: "Internal Server Error".to_string(),
                body: "toggle rejected".to_string(),
            });
        }
        Ok(Todo {
            id: id.clone(),
            title: patch.title.clone(),
            description: patch.description.clone(),
            completed: patch.completed,
        })
    }

    async fn remove(&self, id: &TodoId) -> Result<(), ClientError> {
        self.calls.lock().await.push(Call::Remove { id: id.clone() });
        match self.failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn todo(id: &str, title: &str, completed: bool) -> Todo {
    Todo {
        id: TodoId::new(id),
        title: title.to_string(),
        description: String::new(),
        completed,
    }
}

async fn mounted(initial: Vec<Todo>) -> (ListController<TestTodoApi>, Arc<TestTodoApi>) {
    let api = Arc::new(TestTodoApi::ok(initial));
    let mut controller = ListController::new(Arc::clone(&api));
    assert!(controller.mount());
    controller.settle().await;
    (controller, api)
}

#[tokio::test]
async fn mount_fetches_exactly_once() {
    let (mut controller, api) = mounted(vec![todo("1", "A", false)]).await;

    assert!(!controller.mount());
    controller.settle().await;

    assert_eq!(api.calls().await, vec![Call::FetchAll]);
    assert!(!controller.state().is_loading());
    assert_eq!(controller.state().len(), 1);
}

#[tokio::test]
async fn failed_mount_leaves_empty_list_with_error() {
    let api = Arc::new(TestTodoApi::failing(500, "boom"));
    let mut controller = ListController::new(Arc::clone(&api));

    controller.mount();
    assert!(controller.state().is_loading());
    controller.settle().await;

    assert!(!controller.state().is_loading());
    assert!(controller.state().is_empty());
    assert_eq!(
        controller.state().error(),
        Some("500 Internal Server Error - boom")
    );
}

#[tokio::test]
async fn create_round_trip_prepends_server_item() {
    let (mut controller, api) = mounted(vec![todo("1", "A", false)]).await;
    controller.set_title("  Milk ");
    controller.set_description(" 2 litres");

    assert!(controller.submit_create());
    assert!(controller.state().is_adding());
    controller.settle().await;

    assert_eq!(
        api.calls().await.last(),
        Some(&Call::Create {
            title: "Milk".into(),
            description: "2 litres".into(),
        })
    );
    let first = controller.state().items().next().expect("first").clone();
    assert_eq!(first.id.as_str(), "srv-101");
    assert_eq!(first.title, "Milk");
    assert!(controller.state().composer().title.is_empty());
    assert!(controller.state().composer().description.is_empty());
    assert!(controller.take_focus_request());
    assert!(!controller.state().is_adding());
}

#[tokio::test]
async fn blank_create_never_reaches_the_server() {
    let (mut controller, api) = mounted(vec![todo("1", "A", false)]).await;
    controller.set_title("  ");
    controller.set_description("x");

    assert!(!controller.submit_create());
    assert_eq!(controller.in_flight(), 0);
    assert_eq!(api.calls().await, vec![Call::FetchAll]);
    assert_eq!(controller.state().len(), 1);
}

#[tokio::test]
async fn toggle_sends_inverted_flag_and_applies_confirmation() {
    let (mut controller, api) = mounted(vec![todo("1", "A", false)]).await;

    assert!(controller.toggle_completion(&TodoId::new("1")));
    assert_eq!(controller.state().remaining(), 1);
    controller.settle().await;

    assert_eq!(
        api.calls().await.last(),
        Some(&Call::Update {
            id: TodoId::new("1"),
            patch: TodoPatch {
                title: "A".into(),
                description: String::new(),
                completed: true,
            },
        })
    );
    assert!(controller.state().items().all(|item| item.completed));
    assert_eq!(controller.state().remaining(), 0);
}

#[tokio::test]
async fn blank_edit_save_keeps_session_without_request() {
    let (mut controller, api) = mounted(vec![todo("1", "A", false)]).await;
    controller.begin_edit(&TodoId::new("1"));
    controller.set_edit_title(" ");

    assert!(!controller.save_edit());
    assert!(controller.state().editing().is_some());
    assert_eq!(api.calls().await, vec![Call::FetchAll]);
}

#[tokio::test]
async fn edit_save_replaces_item_and_closes_session() {
    let (mut controller, _api) = mounted(vec![todo("1", "A", true)]).await;
    controller.begin_edit(&TodoId::new("1"));
    controller.set_edit_title("Renamed");
    controller.set_edit_description("now with details");

    assert!(controller.save_edit());
    controller.settle().await;

    assert!(controller.state().editing().is_none());
    let item = controller
        .state()
        .row(&TodoId::new("1"))
        .expect("row")
        .item()
        .clone();
    assert_eq!(item.title, "Renamed");
    assert_eq!(item.description, "now with details");
    assert!(item.completed);
}

#[tokio::test]
async fn delete_of_expanded_item_clears_expansion() {
    let (mut controller, api) =
        mounted(vec![todo("1", "A", false), todo("2", "B", false)]).await;
    controller.toggle_expanded(&TodoId::new("1"));

    assert!(controller.delete(&TodoId::new("1")));
    controller.settle().await;

    assert_eq!(
        api.calls().await.last(),
        Some(&Call::Remove {
            id: TodoId::new("1")
        })
    );
    assert_eq!(controller.state().len(), 1);
    assert!(controller.state().expanded().is_none());
}

#[tokio::test]
async fn operations_on_unknown_items_issue_no_request() {
    let (mut controller, api) = mounted(vec![todo("1", "A", false)]).await;

    assert!(!controller.toggle_completion(&TodoId::new("9")));
    assert!(!controller.delete(&TodoId::new("9")));
    assert!(!controller.save_edit());
    assert_eq!(api.calls().await, vec![Call::FetchAll]);
}

#[tokio::test]
async fn late_save_response_does_not_override_newer_toggle() {
    let (mut controller, api) = mounted(vec![todo("1", "A", false)]).await;
    let release_save = api.gate_update("Edited").await;

    controller.begin_edit(&TodoId::new("1"));
    controller.set_edit_title("Edited");
    assert!(controller.save_edit());
    assert!(controller.toggle_completion(&TodoId::new("1")));
    assert_eq!(controller.in_flight(), 2);

    assert!(controller.next_completion().await);
    let item = controller
        .state()
        .row(&TodoId::new("1"))
        .expect("row")
        .item()
        .clone();
    assert_eq!(item.title, "A");
    assert!(item.completed);

    release_save.send(()).expect("release");
    assert!(controller.next_completion().await);

    let row = controller.state().row(&TodoId::new("1")).expect("row");
    assert_eq!(row.item().title, "A");
    assert!(row.item().completed);
    assert_eq!(row.mode(), &RowMode::Viewing);
    assert!(!controller.next_completion().await);
}

#[tokio::test]
async fn confirmed_save_is_kept_when_newer_toggle_fails() {
    let (mut controller, api) = mounted(vec![todo("1", "A", false)]).await;
    let release_save = api.gate_update("Edited").await;
    api.fail_update("A").await;

    controller.begin_edit(&TodoId::new("1"));
    controller.set_edit_title("Edited");
    assert!(controller.save_edit());
    assert!(controller.toggle_completion(&TodoId::new("1")));

    assert!(controller.next_completion().await);
    assert_eq!(
        controller.state().error(),
        Some("500 Internal Server Error - toggle rejected")
    );

    release_save.send(()).expect("release");
    controller.settle().await;

    let row = controller.state().row(&TodoId::new("1")).expect("row");
    assert_eq!(row.item().title, "Edited");
    assert!(!row.item().completed);
    assert_eq!(row.mode(), &RowMode::Viewing);
}

#[tokio::test]
async fn failures_surface_until_dismissed() {
    let api = Arc::new(TestTodoApi::failing(502, "bad gateway"));
    let mut controller = ListController::new(Arc::clone(&api));
    controller.mount();
    controller.settle().await;
    controller.dismiss_error();

    controller.set_title("Milk");
    controller.submit_create();
    controller.settle().await;

    assert_eq!(
        controller.state().error(),
        Some("502 Internal Server Error - bad gateway")
    );
    assert_eq!(controller.state().composer().title, "Milk");
    assert!(!controller.state().is_adding());

    controller.dismiss_error();
    assert_eq!(controller.state().error(), None);
}

#[tokio::test]
async fn works_through_a_trait_object() {
    let api: Arc<dyn TodoApi> = Arc::new(TestTodoApi::ok(vec![todo("1", "A", false)]));
    let mut controller = ListController::new(api);
    controller.mount();
    controller.settle().await;
    assert_eq!(controller.state().remaining(), 1);
}
