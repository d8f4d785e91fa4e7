//! Replication Engine Port
//!
//! Contract for the continuous bidirectional replication transport. The
//! transport itself lives outside this crate; the host application injects
//! an implementation at startup. The engine pushes status reports onto a
//! channel instead of invoking callbacks, so a listener can never re-enter
//! the controller while it is tearing that same handle down.

use crate::replication::config::ReplicatorConfig;
use crate::replication::types::StatusEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// The transport rejected a connection setup (malformed URL, unusable
/// collection set, handshake refusal). Fails fast; the next failure/probe
/// cycle is the only retry path.
#[derive(Debug, Clone, thiserror::Error)]
#[error("replication transport rejected configuration: {0}")]
pub struct TransportInitError(pub String);

/// Factory for replication connections.
#[async_trait]
pub trait ReplicationEngine: Send + Sync {
    /// Set up a connection for the given configuration. May fail fast; the
    /// returned handle is not yet started.
    async fn connect(
        &self,
        config: ReplicatorConfig,
    ) -> Result<Box<dyn ReplicationHandle>, TransportInitError>;
}

/// One live replication process. Created fresh per connection attempt and
/// never reused across endpoints.
#[async_trait]
pub trait ReplicationHandle: Send {
    /// Begin continuous replication.
    fn start(&mut self);

    /// Stop replication and release the underlying connection.
    async fn stop(&mut self);

    /// Take the status event channel. Yields `Some` exactly once; the
    /// transport pushes zero or more events until the handle stops.
    fn take_status_events(&mut self) -> Option<mpsc::Receiver<StatusEvent>>;
}
