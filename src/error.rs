//! Error types for the client layer.

use thiserror::Error;

/// Which extent an index was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// Failures reported by the engine or the transport carrying queries to it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// No handle has been established yet
    #[error("not connected to the engine")]
    NotConnected,

    /// The connector could not open a handle
    #[error("connection to {host}:{port} failed: {reason}")]
    ConnectionFailed {
        host: String,
        port: u16,
        reason: String,
    },

    /// The transport broke while carrying a query
    #[error("transport error: {0}")]
    Transport(String),

    /// The engine evaluated the query and answered with an error payload
    #[error("engine rejected query: {0}")]
    Remote(String),

    /// The engine answered with a shape the caller cannot use
    #[error("unexpected result for `{query}`: expected {expected}")]
    UnexpectedResult {
        query: String,
        expected: &'static str,
    },
}

/// Errors surfaced by every public operation of the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed predicate, empty inputs, bad identifiers, invalid join spec
    #[error("validation error: {0}")]
    Validation(String),

    /// Index outside the table's current extent
    #[error("{axis} index {index} out of bounds (extent {extent})")]
    Bounds {
        axis: Axis,
        index: usize,
        extent: usize,
    },

    /// Unknown type code, storage mismatch or invalid explicit type
    #[error("type error: {0}")]
    Type(String),

    /// Transport or engine failure
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A temporary engine-side artifact could not be created
    #[error("could not create temporary artifact `{artifact}`: {source}")]
    Resource {
        artifact: String,
        #[source]
        source: EngineError,
    },

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Error::Type(msg.into())
    }

    /// True for errors raised before any engine round-trip could have happened.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Bounds { .. } | Error::Type(_) | Error::Config(_)
        )
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for transport-level operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;
