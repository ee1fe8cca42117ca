use std::time::Duration;

use crate::position::PositionError;

/// Errors that can occur when driving a UCI engine.
///
/// Errors are organized by category:
/// - Configuration errors: detected at `build()` time
/// - Process errors: failed to start the engine or talk to it
/// - Validation errors: rejected before any engine I/O
/// - Protocol errors: the engine answered with an error marker or too little output
/// - Runtime errors: the engine did not answer in time
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // -------------------------------------------------------------------------
    // Configuration errors (detected at build() time)
    // -------------------------------------------------------------------------
    /// Invalid configuration provided to builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Environment variable required for configuration is not set.
    #[error("environment variable {var} not set")]
    EnvVarNotFound { var: &'static str },

    // -------------------------------------------------------------------------
    // Process errors
    // -------------------------------------------------------------------------
    /// Engine executable not found.
    #[error("engine executable not found: {path}")]
    EngineNotFound { path: String },

    /// Failed to spawn the engine subprocess.
    #[error("failed to spawn engine process: {0}")]
    ProcessSpawn(#[source] std::io::Error),

    /// IO error communicating with the engine subprocess.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    /// The session was closed (or never had streams attached).
    #[error("engine session is closed")]
    SessionClosed,

    // -------------------------------------------------------------------------
    // Validation errors
    // -------------------------------------------------------------------------
    /// The position string failed validation and was never sent to the engine.
    #[error("malformed position {position:?}: {reason}")]
    MalformedPosition {
        position: String,
        #[source]
        reason: PositionError,
    },

    // -------------------------------------------------------------------------
    // Protocol errors
    // -------------------------------------------------------------------------
    /// The engine emitted an error marker line.
    #[error("engine rejected command: {line}")]
    Protocol { line: String },

    /// The response ended without the line a transform needs.
    #[error("response to `{command}` has no line starting with {expected:?}")]
    IncompleteResponse {
        command: String,
        expected: &'static str,
    },

    /// The engine answered a search with a null move (no legal moves).
    #[error("engine reported no move: {line}")]
    NoMove { line: String },

    // -------------------------------------------------------------------------
    // Runtime errors
    // -------------------------------------------------------------------------
    /// The exchange did not complete within its budget.
    #[error("engine timed out after {0:?}")]
    Timeout(Duration),
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error.
    pub fn io(source: std::io::Error) -> Self {
        Self::Io(source)
    }

    /// Create a malformed-position error.
    pub fn malformed(position: impl Into<String>, reason: PositionError) -> Self {
        Self::MalformedPosition {
            position: position.into(),
            reason,
        }
    }

    /// Check if this error came from the subprocess or its streams.
    pub fn is_process_error(&self) -> bool {
        matches!(
            self,
            Error::EngineNotFound { .. }
                | Error::ProcessSpawn(_)
                | Error::Io(_)
                | Error::SessionClosed
        )
    }

    /// Check if the engine itself answered with something unusable.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Error::Protocol { .. } | Error::IncompleteResponse { .. } | Error::NoMove { .. }
        )
    }

    /// Check if this error is retryable.
    ///
    /// A retry should go through a fresh or resynchronized session.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::Io(_))
    }

    /// Short machine-friendly name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) | Error::EnvVarNotFound { .. } => "config",
            Error::EngineNotFound { .. }
            | Error::ProcessSpawn(_)
            | Error::Io(_)
            | Error::SessionClosed => "process",
            Error::MalformedPosition { .. } => "malformed_position",
            Error::Protocol { .. } | Error::IncompleteResponse { .. } | Error::NoMove { .. } => {
                "protocol"
            }
            Error::Timeout(_) => "timeout",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
