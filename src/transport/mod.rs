//! The engine boundary.
//!
//! Everything the crate sends to the engine is query text, and everything it
//! gets back is a [WireValue]. Socket handling and the binary protocol live
//! behind these two traits:
//!
//! - [Connector] opens a handle to `host:port`
//! - [Transport] carries one query at a time over that handle
//!
//! [ScriptedEngine] implements both in-process, answering from registered
//! rules, for tests and demos.

mod scripted;

pub use scripted::{ScriptedConnector, ScriptedEngine};

use crate::error::EngineResult;
use crate::wire::WireValue;

/// A live handle to the engine.
///
/// Engine-side errors are returned as `Ok(WireValue::Error(..))`; `Err` is
/// reserved for failures of the transport itself.
pub trait Transport: Send {
    /// Submits one query and waits for its result.
    fn submit(&mut self, query: &str) -> EngineResult<WireValue>;

    /// Releases the handle. Called at most once.
    fn close(&mut self) {}
}

/// Opens [Transport]s.
pub trait Connector: Send + Sync {
    fn connect(&self, host: &str, port: u16) -> EngineResult<Box<dyn Transport>>;
}
