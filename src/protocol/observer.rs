//! Protocol observer trait and implementations.

/// Observer for the raw engine transcript.
///
/// Implementations receive every line written to the engine and every line
/// read back from it, in order.
///
/// # Implementation Notes
///
/// - Implementations must be lightweight; blocking delays the exchange and
///   counts against its timeout.
/// - Methods have default empty implementations for selective observation.
///
/// # Example
///
/// ```ignore
/// use libuci::ProtocolObserver;
///
/// struct Transcript(std::sync::Mutex<Vec<String>>);
///
/// impl ProtocolObserver for Transcript {
///     fn on_line(&self, line: &str) {
///         self.0.lock().unwrap().push(line.to_string());
///     }
/// }
/// ```
pub trait ProtocolObserver: Send + Sync {
    /// Called for each line written to the engine.
    fn on_send(&self, line: &str) {
        let _ = line;
    }

    /// Called for each non-empty line read from the engine.
    fn on_line(&self, line: &str) {
        let _ = line;
    }
}

/// Observer that logs the transcript using tracing.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use libuci::{EngineConfig, LogLevel, LoggingObserver};
///
/// let config = EngineConfig::builder()
///     .engine_path("stockfish")
///     .observer(Arc::new(LoggingObserver::with_level(LogLevel::Info)))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver {
    level: LogLevel,
}

/// Log level for LoggingObserver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at trace level.
    Trace,
    /// Log at debug level (default).
    #[default]
    Debug,
    /// Log at info level.
    Info,
}

impl LoggingObserver {
    /// Create a new logging observer with debug level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging observer with a specific level.
    pub fn with_level(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl ProtocolObserver for LoggingObserver {
    fn on_send(&self, line: &str) {
        match self.level {
            LogLevel::Trace => tracing::trace!(direction = ">>", %line, "uci"),
            LogLevel::Debug => tracing::debug!(direction = ">>", %line, "uci"),
            LogLevel::Info => tracing::info!(direction = ">>", %line, "uci"),
        }
    }

    fn on_line(&self, line: &str) {
        match self.level {
            LogLevel::Trace => tracing::trace!(direction = "<<", %line, "uci"),
            LogLevel::Debug => tracing::debug!(direction = "<<", %line, "uci"),
            LogLevel::Info => tracing::info!(direction = "<<", %line, "uci"),
        }
    }
}
