//! # libuci
//!
//! Async Rust driver for UCI chess engines.
//!
//! This library turns the engine's line-oriented text protocol into typed
//! operations:
//! - Position validation without touching the engine
//! - Move legality, best move and position queries with bounded latency
//! - Guaranteed engine teardown
//! - Optional pooling of warm sessions
//!
//! ## Quick Start
//!
//! ```ignore
//! use libuci::{EngineConfig, EngineSession, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = EngineConfig::builder()
//!         .engine_path("./stockfish/stockfish")
//!         .build()?;
//!
//!     let mut session = EngineSession::open(&config)?;
//!     session.initialize(None).await;
//!     session.set_position("startpos").await;
//!     println!("{:?}", session.best_move_default().await);
//!     session.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Distinguishing failures
//!
//! The plain operations answer `false` / `None` for every engine fault.
//! Their `try_` siblings return the [`Error`]:
//!
//! ```ignore
//! match session.try_best_move(500).await {
//!     Ok(mv) => println!("{mv}"),
//!     Err(e) if e.is_retryable() => { /* timed out or stream broke */ }
//!     Err(e) => return Err(e),
//! }
//! ```
//!
//! ## Validation only
//!
//! ```
//! use libuci::position::{is_valid, side_to_move, Side};
//!
//! assert!(is_valid("startpos"));
//! assert!(!is_valid("8/8/8/8/8/8/8/8 w - - 0 1"));
//! assert_eq!(side_to_move("startpos"), Some(Side::White));
//! ```

pub mod config;
mod error;
pub mod executor;
mod pool;
pub mod position;
pub mod process;
pub mod protocol;
mod session;

pub use error::{Error, Result};

// Re-export the main session types at crate root
pub use pool::{EnginePool, PooledSession};
pub use session::EngineSession;

// Re-export commonly used config types at crate root
pub use config::{EngineConfig, EngineConfigBuilder, StrengthLevel};

// Re-export commonly used position types at crate root
pub use position::{Position, PositionError, Side};

// Re-export commonly used protocol types at crate root
pub use protocol::{LogLevel, LoggingObserver, ProtocolObserver};

pub use executor::CommandExecutor;
pub use process::EngineProcess;
