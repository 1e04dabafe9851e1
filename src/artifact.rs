//! Engine-side temporaries that live for one call.

use tracing::{debug, warn};

use crate::connection::ConnectionManager;
use crate::error::{Error, Result};
use crate::query::QueryBuilder;

/// A global assigned on the engine for the duration of one operation.
///
/// The global is deleted when the guard drops, whether the operation
/// succeeded or not. Deletion failures are logged and swallowed.
#[derive(Debug)]
pub struct TemporaryArtifact<'a> {
    connection: &'a ConnectionManager,
    name: String,
}

impl<'a> TemporaryArtifact<'a> {
    /// Assigns `expr` to `name` on the engine.
    ///
    /// # Errors
    /// Returns [Error::Resource] if the engine refuses the assignment.
    pub fn create(connection: &'a ConnectionManager, name: String, expr: &str) -> Result<Self> {
        let query = QueryBuilder::default().assign(&name, expr);
        match connection.submit(&query) {
            Ok(_) => {
                debug!(artifact = %name, "created temporary");
                Ok(Self { connection, name })
            }
            Err(source) => Err(Error::Resource {
                artifact: name,
                source,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TemporaryArtifact<'_> {
    fn drop(&mut self) {
        let query = QueryBuilder::default().delete(&self.name);
        match self.connection.submit(&query) {
            Ok(_) => debug!(artifact = %self.name, "deleted temporary"),
            Err(e) => warn!(artifact = %self.name, error = %e, "failed to delete temporary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::EngineError;
    use crate::transport::ScriptedEngine;

    fn connected(engine: &ScriptedEngine) -> ConnectionManager {
        let manager = ConnectionManager::new(ClientConfig::default(), engine.connector());
        manager.connect().unwrap();
        manager
    }

    #[test]
    fn test_guard_deletes_on_drop() {
        let engine = ScriptedEngine::new();
        let manager = connected(&engine);
        {
            let guard = TemporaryArtifact::create(&manager, "t_unkeyed".into(), "0!(t)").unwrap();
            assert_eq!(guard.name(), "t_unkeyed");
        }
        assert_eq!(
            engine.submitted(),
            vec![".z.P", "t_unkeyed: 0!(t)", "delete t_unkeyed from `."]
        );
    }

    #[test]
    fn test_failed_creation_is_resource_error() {
        let engine = ScriptedEngine::new();
        engine.reject_containing("0!(missing)", "missing");
        let manager = connected(&engine);
        let err = TemporaryArtifact::create(&manager, "m_unkeyed".into(), "0!(missing)").unwrap_err();
        match err {
            Error::Resource { artifact, source } => {
                assert_eq!(artifact, "m_unkeyed");
                assert_eq!(source, EngineError::Remote("missing".into()));
            }
            other => panic!("unexpected error {other}"),
        }
        // nothing was created, so nothing is deleted
        assert!(engine.submitted_containing("delete").is_empty());
    }

    #[test]
    fn test_delete_failure_is_swallowed() {
        let engine = ScriptedEngine::new();
        engine.break_on("delete");
        let manager = connected(&engine);
        let guard = TemporaryArtifact::create(&manager, "x".into(), "1").unwrap();
        drop(guard);
        assert_eq!(engine.submitted_containing("delete").len(), 1);
    }
}
