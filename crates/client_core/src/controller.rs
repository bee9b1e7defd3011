//! Drives a [`ViewState`] against a [`TodoApi`]: requests produced by the
//! transitions run concurrently and their outcomes are merged in completion
//! order.

use std::sync::Arc;

use futures::{future::BoxFuture, stream::FuturesUnordered, FutureExt, StreamExt};
use shared::domain::TodoId;
use tracing::debug;

use crate::{
    api::TodoApi,
    view_state::{Outcome, Request, ViewState},
};

pub struct ListController<A: TodoApi + ?Sized + 'static> {
    api: Arc<A>,
    state: ViewState,
    in_flight: FuturesUnordered<BoxFuture<'static, Outcome>>,
}

impl<A: TodoApi + ?Sized + 'static> ListController<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: ViewState::new(),
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Starts the initial fetch. Only the first call in a session does anything.
    pub fn mount(&mut self) -> bool {
        let request = self.state.begin_load();
        self.dispatch(request)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.state.set_title(title);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.state.set_description(description);
    }

    pub fn submit_create(&mut self) -> bool {
        let request = self.state.submit_create();
        self.dispatch(request)
    }

    pub fn begin_edit(&mut self, id: &TodoId) -> bool {
        self.state.begin_edit(id)
    }

    pub fn set_edit_title(&mut self, title: impl Into<String>) -> bool {
        self.state.set_edit_title(title)
    }

    pub fn set_edit_description(&mut self, description: impl Into<String>) -> bool {
        self.state.set_edit_description(description)
    }

    pub fn save_edit(&mut self) -> bool {
        let request = self.state.save_edit();
        self.dispatch(request)
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.state.cancel_edit()
    }

    pub fn toggle_completion(&mut self, id: &TodoId) -> bool {
        let request = self.state.toggle_completion(id);
        self.dispatch(request)
    }

    pub fn delete(&mut self, id: &TodoId) -> bool {
        let request = self.state.delete(id);
        self.dispatch(request)
    }

    pub fn toggle_expanded(&mut self, id: &TodoId) -> bool {
        self.state.toggle_expanded(id)
    }

    pub fn dismiss_error(&mut self) {
        self.state.dismiss_error();
    }

    pub fn take_focus_request(&mut self) -> bool {
        self.state.take_focus_request()
    }

    /// Waits for the next in-flight request to finish and merges its outcome.
    /// Returns `false` when nothing was in flight.
    pub async fn next_completion(&mut self) -> bool {
        match self.in_flight.next().await {
            Some(outcome) => {
                self.state.apply(outcome);
                true
            }
            None => false,
        }
    }

    /// Merges every in-flight request.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    fn dispatch(&mut self, request: Option<Request>) -> bool {
        let Some(request) = request else {
            return false;
        };
        debug!(
            operation = request.operation().name(),
            in_flight = self.in_flight.len(),
            "dispatching todo request"
        );
        let api = Arc::clone(&self.api);
        self.in_flight.push(execute(api, request).boxed());
        true
    }
}

/// Performs the single round trip a [`Request`] describes.
pub async fn execute<A: TodoApi + ?Sized>(api: Arc<A>, request: Request) -> Outcome {
    match request {
        Request::FetchAll => Outcome::Loaded(api.fetch_all().await),
        Request::Create { title, description } => {
            Outcome::Created(api.create(&title, &description).await)
        }
        Request::Update {
            id,
            patch,
            generation,
            operation,
        } => {
            let result = api.update(&id, &patch).await;
            Outcome::Updated {
                id,
                generation,
                operation,
                result,
            }
        }
        Request::Remove { id } => {
            let result = api.remove(&id).await;
            Outcome::Removed { id, result }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
