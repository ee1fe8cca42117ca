//! Configuration for engine sessions.
//!
//! This module provides:
//!
//! - [`EngineConfig`] and [`EngineConfigBuilder`] for configuring the engine process
//! - [`StrengthLevel`] presets passed to
//!   [`EngineSession::initialize`](crate::EngineSession::initialize)
//!
//! # Example
//!
//! ```ignore
//! use libuci::config::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .engine_path("./stockfish/stockfish")
//!     .default_movetime(1500)
//!     .build()?;
//! ```
//!
//! The engine path can also come from the environment:
//!
//! ```ignore
//! // Reads UCI_ENGINE_PATH when build() runs
//! let config = EngineConfig::builder().engine_path_from_env().build()?;
//! ```

pub mod builder;
pub mod options;

pub use builder::{
    EngineConfig, EngineConfigBuilder, DEFAULT_ANALYSIS_TIMEOUT, DEFAULT_INIT_TIMEOUT,
    DEFAULT_MOVETIME_MS,
};
pub use options::{StrengthLevel, ENV_ENGINE_PATH};
