//! The shared connection to the engine.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{EngineError, EngineResult};
use crate::transport::{Connector, Transport};
use crate::wire::WireValue;

/// Query used to probe a freshly opened handle.
const PROBE: &str = ".z.P";

/// Owns the one transport handle every operation submits through.
///
/// Submission is serialized by a mutex around the handle, so a manager can
/// be shared across threads behind an `Arc`.
pub struct ConnectionManager {
    config: ClientConfig,
    connector: Box<dyn Connector>,
    handle: Mutex<Option<Box<dyn Transport>>>,
    tokens: AtomicU64,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("address", &self.config.address())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl ConnectionManager {
    pub fn new(config: ClientConfig, connector: impl Connector + 'static) -> Self {
        Self {
            config,
            connector: Box::new(connector),
            handle: Mutex::new(None),
            tokens: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens the handle unless one is already open.
    ///
    /// The first successful call wins; later calls return `Ok` without
    /// reconnecting.
    ///
    /// # Errors
    /// Returns the connector's error, or the probe's when the fresh handle
    /// does not answer.
    pub fn connect(&self) -> EngineResult<()> {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            debug!("already connected");
            return Ok(());
        }

        let mut transport = self.connector.connect(&self.config.host, self.config.port)?;
        match transport.submit(PROBE).and_then(remote_error) {
            Ok(_) => {
                info!(address = %self.config.address(), "connected to engine");
                *handle = Some(transport);
                Ok(())
            }
            Err(e) => {
                warn!(address = %self.config.address(), error = %e, "connection probe failed");
                transport.close();
                Err(e)
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Closes the handle, if any.
    pub fn disconnect(&self) {
        if let Some(mut transport) = self.handle.lock().take() {
            transport.close();
            info!(address = %self.config.address(), "disconnected from engine");
        }
    }

    /// Submits one query and returns its raw result.
    ///
    /// # Errors
    /// [EngineError::NotConnected] before [Self::connect];
    /// [EngineError::Remote] when the engine answers with an error payload.
    pub fn submit(&self, query: &str) -> EngineResult<WireValue> {
        let mut handle = self.handle.lock();
        let transport = handle.as_mut().ok_or(EngineError::NotConnected)?;
        debug!(query, "submit");
        transport.submit(query).and_then(remote_error)
    }

    /// A token no other call on this manager has received.
    pub fn next_token(&self) -> u64 {
        self.tokens.fetch_add(1, Ordering::Relaxed)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(mut transport) = self.handle.get_mut().take() {
            transport.close();
        }
    }
}

fn remote_error(value: WireValue) -> EngineResult<WireValue> {
    match value {
        WireValue::Error(msg) => Err(EngineError::Remote(msg)),
        other => Ok(other),
    }
}
