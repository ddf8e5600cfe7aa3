use std::fmt;

/// Failures raised while reading behavioral events from a source.
#[derive(Debug, thiserror::Error)]
pub enum EventSourceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode event on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid event row {row}: {message}")]
    InvalidRow { row: i64, message: String },
}

/// Errors delivered through the generation completion channel.
#[derive(Debug, thiserror::Error)]
pub enum JudgmentError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Configuration(String),

    #[error("event source failed: {0}")]
    Source(#[from] EventSourceError),

    #[error("judgment generation cancelled")]
    Cancelled,

    #[error("judgment generation failed: {0}")]
    Internal(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidInput,
    Configuration,
    SourceFailure,
    Cancelled,
    Internal,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusClass {
    ClientError,
    ServerError,
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientError => f.write_str("client_error"),
            Self::ServerError => f.write_str("server_error"),
        }
    }
}

impl JudgmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Source(_) => ErrorKind::SourceFailure,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusClass {
        match self.kind() {
            ErrorKind::InvalidInput | ErrorKind::Configuration | ErrorKind::Cancelled => {
                StatusClass::ClientError
            }
            ErrorKind::SourceFailure | ErrorKind::Internal => StatusClass::ServerError,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidInput | ErrorKind::Configuration => 400,
            ErrorKind::Cancelled => 499,
            ErrorKind::SourceFailure | ErrorKind::Internal => 500,
        }
    }
}
