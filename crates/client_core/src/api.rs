//! HTTP adapter for the todo API: request plumbing and translation between the
//! server's record shape and [`Todo`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::Serialize;
use serde_json::Value;
use shared::{
    domain::{Todo, TodoId, TodoPatch},
    protocol::{todos_route, CreateTodoRequest, TodoRecord, UpdateTodoRequest},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;

#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Todo>, ClientError>;
    async fn create(&self, title: &str, description: &str) -> Result<Todo, ClientError>;
    async fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Todo, ClientError>;
    async fn remove(&self, id: &TodoId) -> Result<(), ClientError>;
}

pub struct HttpTodoClient {
    http: Client,
    base_url: Url,
}

impl HttpTodoClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url.trim()).map_err(|err| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/todos` or `{base}/todos/{id}`, with `id` encoded as one path segment.
    fn endpoint(&self, id: Option<&TodoId>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(todos_route());
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        url
    }

    async fn request<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Option<Value>, ClientError>
    where
        B: Serialize + ?Sized + Sync,
    {
        debug!(method = %method, path = url.path(), "sending todo api request");

        let mut builder = self
            .http
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let text = match response.text().await {
            Ok(text) => text,
            Err(_) if !status.is_success() => String::new(),
            Err(err) => return Err(err.into()),
        };

        if !status.is_success() {
            return Err(ClientError::from_status(status, text));
        }
        decode_body(&content_type, text)
    }
}

#[async_trait]
impl TodoApi for HttpTodoClient {
    async fn fetch_all(&self) -> Result<Vec<Todo>, ClientError> {
        let body = self
            .request::<()>(Method::GET, self.endpoint(None), None)
            .await?;
        match body {
            Some(Value::Array(entries)) => Ok(entries
                .into_iter()
                .filter_map(|entry| match decode_todo(entry) {
                    Ok(todo) => Some(todo),
                    Err(err) => {
                        warn!(error = %err, "skipping unreadable todo in list response");
                        None
                    }
                })
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn create(&self, title: &str, description: &str) -> Result<Todo, ClientError> {
        let payload = CreateTodoRequest {
            title: title.to_string(),
            description: description.to_string(),
        };
        let body = self
            .request(Method::POST, self.endpoint(None), Some(&payload))
            .await?;
        expect_todo(body, "create")
    }

    async fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Todo, ClientError> {
        let payload = UpdateTodoRequest::from(patch);
        let body = self
            .request(Method::PATCH, self.endpoint(Some(id)), Some(&payload))
            .await?;
        expect_todo(body, "update")
    }

    async fn remove(&self, id: &TodoId) -> Result<(), ClientError> {
        self.request::<()>(Method::DELETE, self.endpoint(Some(id)), None)
            .await?;
        Ok(())
    }
}

/// Empty bodies are an absent value; JSON bodies are parsed; anything else is
/// handed back as raw text.
fn decode_body(content_type: &str, text: String) -> Result<Option<Value>, ClientError> {
    if text.is_empty() {
        return Ok(None);
    }
    if content_type.contains("application/json") {
        return serde_json::from_str(&text)
            .map(Some)
            .map_err(|err| ClientError::MalformedResponse(err.to_string()));
    }
    Ok(Some(Value::String(text)))
}

fn decode_todo(value: Value) -> Result<Todo, ClientError> {
    serde_json::from_value::<TodoRecord>(value)
        .map(Todo::from)
        .map_err(|err| ClientError::MalformedResponse(format!("invalid todo record: {err}")))
}

fn expect_todo(body: Option<Value>, operation: &str) -> Result<Todo, ClientError> {
    match body {
        Some(value @ Value::Object(_)) => decode_todo(value),
        _ => Err(ClientError::MalformedResponse(format!(
            "{operation} response did not contain a todo object"
        ))),
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
