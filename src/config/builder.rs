//! Engine configuration and builder.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use libuci::config::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .engine_path("./stockfish/stockfish")
//!     .init_timeout(Duration::from_secs(2))
//!     .analysis_timeout(Duration::from_secs(5))
//!     .build()?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::options::ENV_ENGINE_PATH;
use crate::protocol::ProtocolObserver;
use crate::{Error, Result};

/// Budget for `uci`, `position`, resync and ping exchanges.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(2);
/// Budget for `d` and `go` exchanges.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(5);
/// Search time used by [`best_move_default`](crate::EngineSession::best_move_default).
pub const DEFAULT_MOVETIME_MS: u64 = 3000;

/// Configuration for an engine session.
///
/// Use [`EngineConfig::builder()`] to create a new configuration.
#[derive(Clone)]
pub struct EngineConfig {
    // Process options
    pub(crate) engine_path: PathBuf,
    pub(crate) args: Vec<String>,
    pub(crate) working_directory: Option<PathBuf>,
    pub(crate) env_vars: HashMap<String, String>,
    pub(crate) inherit_env: bool,

    // Timing
    pub(crate) init_timeout: Duration,
    pub(crate) analysis_timeout: Duration,
    pub(crate) default_movetime: u64,

    pub(crate) observer: Option<Arc<dyn ProtocolObserver>>,
}

impl EngineConfig {
    /// Create a new builder for EngineConfig.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    pub fn engine_path(&self) -> &PathBuf {
        &self.engine_path
    }

    pub fn init_timeout(&self) -> Duration {
        self.init_timeout
    }

    pub fn analysis_timeout(&self) -> Duration {
        self.analysis_timeout
    }

    /// Default search time in milliseconds.
    pub fn default_movetime(&self) -> u64 {
        self.default_movetime
    }

    pub fn working_directory(&self) -> Option<&PathBuf> {
        self.working_directory.as_ref()
    }

    pub fn observer(&self) -> Option<&Arc<dyn ProtocolObserver>> {
        self.observer.as_ref()
    }

    /// The engine path as passed to the OS, for error messages.
    pub(crate) fn engine_command(&self) -> String {
        self.engine_path.display().to_string()
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("engine_path", &self.engine_path)
            .field("args", &self.args)
            .field("working_directory", &self.working_directory)
            .field("env_vars", &self.env_vars.keys().collect::<Vec<_>>())
            .field("inherit_env", &self.inherit_env)
            .field("init_timeout", &self.init_timeout)
            .field("analysis_timeout", &self.analysis_timeout)
            .field("default_movetime", &self.default_movetime)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Builder for [`EngineConfig`].
///
/// Values are checked when [`build()`](EngineConfigBuilder::build) is called.
#[derive(Clone)]
pub struct EngineConfigBuilder {
    engine_path: Option<PathBuf>,
    engine_path_from_env: bool,
    args: Vec<String>,
    working_directory: Option<PathBuf>,
    env_vars: HashMap<String, String>,
    inherit_env: bool,
    init_timeout: Duration,
    analysis_timeout: Duration,
    default_movetime: u64,
    observer: Option<Arc<dyn ProtocolObserver>>,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self {
            engine_path: None,
            engine_path_from_env: false,
            args: Vec::new(),
            working_directory: None,
            env_vars: HashMap::new(),
            inherit_env: true,
            init_timeout: DEFAULT_INIT_TIMEOUT,
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
            default_movetime: DEFAULT_MOVETIME_MS,
            observer: None,
        }
    }
}

impl EngineConfigBuilder {
    // -------------------------------------------------------------------------
    // Process options
    // -------------------------------------------------------------------------

    /// Path to the engine executable.
    pub fn engine_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_path = Some(path.into());
        self.engine_path_from_env = false;
        self
    }

    /// Read the engine path from `UCI_ENGINE_PATH` at build time.
    pub fn engine_path_from_env(mut self) -> Self {
        self.engine_path = None;
        self.engine_path_from_env = true;
        self
    }

    /// Extra command-line arguments for the engine.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Working directory for the engine process.
    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    /// Add/override environment variable for subprocess.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Don't inherit parent environment (default: inherit).
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    // -------------------------------------------------------------------------
    // Timing
    // -------------------------------------------------------------------------

    /// Budget for handshake and position commands.
    pub fn init_timeout(mut self, duration: Duration) -> Self {
        self.init_timeout = duration;
        self
    }

    /// Budget for display and search commands.
    pub fn analysis_timeout(mut self, duration: Duration) -> Self {
        self.analysis_timeout = duration;
        self
    }

    /// Default search time in milliseconds.
    pub fn default_movetime(mut self, millis: u64) -> Self {
        self.default_movetime = millis;
        self
    }

    /// Observe every line written to and read from the engine.
    pub fn observer(mut self, observer: Arc<dyn ProtocolObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    // -------------------------------------------------------------------------
    // Build
    // -------------------------------------------------------------------------

    /// Build the configuration.
    ///
    /// This validates:
    /// - An engine path is set (directly or through the environment)
    /// - Timeouts are non-zero
    /// - The default search time fits inside the analysis budget
    /// - The working directory exists if set
    ///
    /// Note: the executable itself is checked lazily at spawn time.
    pub fn build(self) -> Result<EngineConfig> {
        let engine_path = match (self.engine_path, self.engine_path_from_env) {
            (Some(path), _) => path,
            (None, true) => std::env::var_os(ENV_ENGINE_PATH)
                .map(PathBuf::from)
                .ok_or(Error::EnvVarNotFound {
                    var: ENV_ENGINE_PATH,
                })?,
            (None, false) => {
                return Err(Error::InvalidConfig("engine_path is required".into()));
            }
        };

        if engine_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("engine_path must not be empty".into()));
        }

        if self.init_timeout.is_zero() || self.analysis_timeout.is_zero() {
            return Err(Error::InvalidConfig("timeouts must be non-zero".into()));
        }

        if Duration::from_millis(self.default_movetime) >= self.analysis_timeout {
            return Err(Error::InvalidConfig(format!(
                "default_movetime {}ms does not fit in analysis_timeout {:?}",
                self.default_movetime, self.analysis_timeout
            )));
        }

        if let Some(ref dir) = self.working_directory {
            if !dir.exists() {
                return Err(Error::InvalidConfig(format!(
                    "working directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        Ok(EngineConfig {
            engine_path,
            args: self.args,
            working_directory: self.working_directory,
            env_vars: self.env_vars,
            inherit_env: self.inherit_env,
            init_timeout: self.init_timeout,
            analysis_timeout: self.analysis_timeout,
            default_movetime: self.default_movetime,
            observer: self.observer,
        })
    }
}
