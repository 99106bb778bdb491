//! Error taxonomy for the CouchDB HTTP API.
//!
//! Every non-2xx status the server answers with maps onto exactly one
//! variant. The mapping lives in [`Error::from_status`] and is shared by
//! all client operations; no operation translates statuses on its own.

use std::error::Error as StdError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 400: malformed JSON payload or illegal resource name.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// 401: missing or incorrect credentials.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// 404: the database, document, attachment or index does not exist.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// 409: revision mismatch on a concurrent update.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// 412: the resource already exists.
    #[error("duplicate: {message}")]
    Duplicate { message: String },

    /// 417: the server rejected part of a bulk request.
    #[error("rejected: {message}")]
    Rejected { message: String },

    /// Any other non-2xx status, including 5xx.
    #[error("server error: {status} - {message}")]
    Runtime { status: u16, message: String },

    /// Transport failure before an HTTP response was obtained.
    #[error("connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The operation is deliberately unsupported.
    #[error("operation is not implemented")]
    NotImplemented,

    /// A payload could not be decoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Maps an HTTP status code to its variant, keeping the server message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Error::InvalidArgument { message },
            401 => Error::Unauthorized { message },
            404 => Error::NotFound { message },
            409 => Error::Conflict { message },
            412 => Error::Duplicate { message },
            417 => Error::Rejected { message },
            status => Error::Runtime { status, message },
        }
    }

    /// Wraps a transport-level failure (DNS, refused connection, timeout
    /// before any response), preserving it as the error source.
    pub fn connection<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::Connection {
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    /// HTTP status this error was mapped from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::InvalidArgument { .. } => Some(400),
            Error::Unauthorized { .. } => Some(401),
            Error::NotFound { .. } => Some(404),
            Error::Conflict { .. } => Some(409),
            Error::Duplicate { .. } => Some(412),
            Error::Rejected { .. } => Some(417),
            Error::Runtime { status, .. } => Some(*status),
            Error::Connection { .. } | Error::NotImplemented | Error::Serialization(_) => None,
        }
    }
}
