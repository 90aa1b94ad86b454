use std::fmt;

/// Why a request to the remote service did not produce a usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Network,
    Timeout,
    HttpStatus(u16),
    MalformedResponse,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service could not be reached or answered with garbage.
    Transport(TransportFailure),
    /// Credentials or token rejected, or no session to act with.
    Auth,
    /// The service rejected the request payload.
    Validation,
    /// The user may not act on the target (e.g. deleting someone else's story).
    Authorization,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(failure: TransportFailure, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport(failure), message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    pub fn not_logged_in() -> Self {
        Self::auth("no authenticated session")
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Auth
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::Network => write!(f, "network error"),
            TransportFailure::Timeout => write!(f, "timeout"),
            TransportFailure::HttpStatus(code) => write!(f, "http status {code}"),
            TransportFailure::MalformedResponse => write!(f, "malformed response"),
            TransportFailure::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport(failure) => write!(f, "transport error ({failure})"),
            ErrorKind::Auth => write!(f, "authentication failed"),
            ErrorKind::Validation => write!(f, "request rejected"),
            ErrorKind::Authorization => write!(f, "not authorized"),
        }
    }
}
