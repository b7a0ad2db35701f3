use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            ClientErrorKind::Transport | ClientErrorKind::Timeout | ClientErrorKind::Decode => true,
            ClientErrorKind::HttpStatus(code) => code >= 500,
            ClientErrorKind::Rejected(_) | ClientErrorKind::InvalidUrl => false,
        }
    }

    /// The backend refused the parameters (4xx).
    pub fn is_rejection(&self) -> bool {
        matches!(self.kind, ClientErrorKind::Rejected(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Connection could not be established or broke mid-request.
    Transport,
    Timeout,
    /// 4xx: the backend rejected the request.
    Rejected(u16),
    /// Any other non-success status.
    HttpStatus(u16),
    /// The body was not the JSON we expected.
    Decode,
    InvalidUrl,
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientErrorKind::Transport => write!(f, "transport error"),
            ClientErrorKind::Timeout => write!(f, "timeout"),
            ClientErrorKind::Rejected(code) => write!(f, "rejected with status {code}"),
            ClientErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ClientErrorKind::Decode => write!(f, "invalid response body"),
            ClientErrorKind::InvalidUrl => write!(f, "invalid url"),
        }
    }
}
