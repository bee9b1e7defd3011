use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status other than 404.
    #[error("{status} {status_text}{}", body_suffix(.body))]
    Status {
        status: u16,
        status_text: String,
        body: String,
    },
    #[error("404 {status_text}{}", body_suffix(.body))]
    NotFound { status_text: String, body: String },
    /// Connection, timeout or body read failure before a status was usable.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ClientError {
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        if status == reqwest::StatusCode::NOT_FOUND {
            Self::NotFound { status_text, body }
        } else {
            Self::Status {
                status: status.as_u16(),
                status_text,
                body,
            }
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Network(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Short text for the inline error message, when the failure carries any.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::MalformedResponse(detail) if detail.trim().is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Network(err) => err.status().map(|status| status.as_u16()),
            Self::MalformedResponse(_) | Self::InvalidBaseUrl { .. } => None,
        }
    }
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {body}")
    }
}
