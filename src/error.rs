use http::StatusCode;
use thiserror::Error;

/// The client's error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The transport failed before a response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote API answered with a non-success status.
    #[error("{message}")]
    Remote {
        status: u16,
        message: String,
        kind: RemoteErrorKind,
    },

    /// A form precondition failed locally. Never sent to the network.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// An authenticated call was attempted without a session token.
    #[error("Authentication required. Please log in.")]
    AuthRequired,

    /// The current user does not own the resource it tried to mutate.
    #[error("You are not allowed to modify blog {resource_id}")]
    NotOwner { resource_id: String },

    /// The persisted session slots could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// What a remote failure means to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The bearer token is invalid, expired, or names a deleted user.
    InvalidToken,
    /// Registration collided with an existing account.
    DuplicateEmail,
    NotFound,
    Forbidden,
    Other,
}

/// A `Result` type that uses `ClientError` as the error type.
pub type Result<T> = std::result::Result<T, ClientError>;

impl RemoteErrorKind {
    /// Classifies a remote failure.
    ///
    /// A structured `code` from the response body wins, then the status code.
    /// Message matching is only a fallback for servers that send neither.
    pub fn classify(status: StatusCode, code: Option<&str>, message: &str) -> Self {
        if let Some(code) = code {
            match code.to_ascii_uppercase().as_str() {
                "INVALID_TOKEN" | "TOKEN_EXPIRED" | "UNAUTHENTICATED" => {
                    return RemoteErrorKind::InvalidToken;
                }
                "DUPLICATE_EMAIL" | "EMAIL_EXISTS" => return RemoteErrorKind::DuplicateEmail,
                "NOT_FOUND" => return RemoteErrorKind::NotFound,
                "FORBIDDEN" => return RemoteErrorKind::Forbidden,
                _ => {}
            }
        }

        match status {
            StatusCode::UNAUTHORIZED => return RemoteErrorKind::InvalidToken,
            StatusCode::CONFLICT => return RemoteErrorKind::DuplicateEmail,
            _ => {}
        }

        let lowered = message.to_lowercase();
        if lowered.contains("token") || lowered.contains("user not found") {
            return RemoteErrorKind::InvalidToken;
        }
        if lowered.contains("already exists") {
            return RemoteErrorKind::DuplicateEmail;
        }

        match status {
            StatusCode::NOT_FOUND => RemoteErrorKind::NotFound,
            StatusCode::FORBIDDEN => RemoteErrorKind::Forbidden,
            _ => RemoteErrorKind::Other,
        }
    }
}

impl ClientError {
    /// Builds a remote error, classifying it from the response.
    pub fn remote(status: StatusCode, code: Option<&str>, message: String) -> Self {
        let kind = RemoteErrorKind::classify(status, code, &message);
        ClientError::Remote {
            status: status.as_u16(),
            message,
            kind,
        }
    }

    /// Builds a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the remote rejected the session token.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Remote {
                kind: RemoteErrorKind::InvalidToken,
                ..
            }
        )
    }

    /// Whether the front-end should send the user to the login view.
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::AuthRequired) || self.is_auth_failure()
    }

    /// Whether the front-end should leave a view it is not allowed to act on.
    pub fn requires_redirect(&self) -> bool {
        match self {
            ClientError::NotOwner { .. } | ClientError::AuthRequired => true,
            ClientError::Remote { kind, .. } => matches!(
                kind,
                RemoteErrorKind::InvalidToken | RemoteErrorKind::Forbidden | RemoteErrorKind::NotFound
            ),
            _ => false,
        }
    }

    /// Network and remote failures get a retry affordance; nothing else does.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Remote { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        tracing::debug!("Transport error: {}", e);
        ClientError::Network(e.to_string())
    }
}

impl From<sonic_rs::Error> for ClientError {
    fn from(e: sonic_rs::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Storage(e.to_string())
    }
}

impl From<garde::Report> for ClientError {
    fn from(report: garde::Report) -> Self {
        match report.iter().next() {
            Some((path, error)) => {
                let field = path.to_string();
                let field = if field.is_empty() { "form".to_string() } else { field };
                ClientError::validation(field, error.message().to_string())
            }
            None => ClientError::validation("form", "Invalid input"),
        }
    }
}
