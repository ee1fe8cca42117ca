//! Process management for the engine subprocess.
//!
//! This module spawns the engine and exposes its standard streams as line
//! primitives. Nothing here knows about chess or UCI.
//!
//! # Architecture
//!
//! ```text
//! libuci                             engine
//! ┌──────────────┐                  ┌─────────────┐
//! │ LineWriter   │───stdin (cmds)──▶│             │
//! │ LineReader   │◀──stdout (text)──│             │
//! └──────────────┘                  └─────────────┘
//! ```
//!
//! [`EngineProcess`] owns the child; dropping or closing it kills the engine.

mod io;
mod spawn;

pub use io::{LineReader, LineWriter};
pub use spawn::EngineProcess;
