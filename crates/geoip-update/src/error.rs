/// Convenient result alias for update operations.
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Coarse classification of an [`UpdateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be sent or the response body could not be read.
    Transport,
    /// The service answered, but not in a way the protocol allows.
    Protocol,
    /// Local filesystem failure while publishing.
    Io,
}

/// Errors that can occur while updating a database file.
#[derive(thiserror::Error, Debug)]
pub enum UpdateError {
    /// Network request to the update service failed.
    #[error("request to update service failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a status outside the success band.
    #[error("status {status} received from {path}")]
    Status {
        /// Endpoint path that was requested.
        path: String,
        /// Status line text, e.g. `404 Not Found`.
        status: String,
    },
    /// The poll reply was neither the no-update marker nor a gzip stream.
    #[error("unexpected payload format")]
    UnexpectedPayload,
    /// The service kept sending payloads past the round limit.
    #[error("too many rounds: service sent more than {limit} payloads")]
    TooManyRounds {
        /// Maximum number of accepted payload rounds.
        limit: u32,
    },
    /// A gzip payload could not be decompressed.
    #[error("corrupt gzip payload: {0}")]
    Decompress(#[source] std::io::Error),
    /// The service returned a filename with no usable base name.
    #[error("invalid remote filename: {0:?}")]
    InvalidFilename(String),
    /// A session was driven after it had already terminated.
    #[error("invalid session state: {0}")]
    InvalidState(&'static str),
    /// Failed to perform an I/O operation.
    #[error("filesystem operation failed: {0}")]
    Io(#[from] std::io::Error),
    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl UpdateError {
    /// Helper for wrapping validation failures.
    pub fn validation(msg: impl Into<String>) -> Self {
        UpdateError::Other(msg.into())
    }

    /// Classify the error into transport, protocol or filesystem failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpdateError::Transport(_) => ErrorKind::Transport,
            UpdateError::Io(_) => ErrorKind::Io,
            UpdateError::Status { .. }
            | UpdateError::UnexpectedPayload
            | UpdateError::TooManyRounds { .. }
            | UpdateError::Decompress(_)
            | UpdateError::InvalidFilename(_)
            | UpdateError::InvalidState(_)
            | UpdateError::Other(_) => ErrorKind::Protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_are_classified() {
        let err = UpdateError::TooManyRounds { limit: 5 };
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("too many rounds"));

        let err = UpdateError::Status {
            path: "/app/update_secure".into(),
            status: "403 Forbidden".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(
            err.to_string(),
            "status 403 Forbidden received from /app/update_secure"
        );
    }

    #[test]
    fn io_errors_are_classified() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = UpdateError::from(io);
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
