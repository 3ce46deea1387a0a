//! Error representations
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GeneralError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GeneralError {
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(..))
    }

    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        if let Self::Protocol(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(..))
    }

    pub fn as_io(&self) -> Option<&std::io::Error> {
        if let Self::Io(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

/// Error for protocol violations on a single connection.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("invalid content length: '{0}'")]
    InvalidContentLength(String),

    #[error("connection already closed")]
    ConnectionClosed,
}
