//! Replication Session
//!
//! Wraps one live replication handle: creation, status forwarding, and
//! ordered teardown. Sessions are created fresh per connection attempt;
//! the generation tag lets the controller discard status events from a
//! handle it has already replaced.

use crate::replication::config::ReplicatorConfig;
use crate::replication::controller::ControllerEvent;
use crate::replication::engine::{ReplicationEngine, TransportInitError};
use crate::replication::types::EndpointRole;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One active replication process against one endpoint.
pub struct ReplicationSession {
    role: EndpointRole,
    generation: u64,
    handle: Box<dyn crate::replication::engine::ReplicationHandle>,
    forwarder: Option<JoinHandle<()>>,
}

impl ReplicationSession {
    /// Create and start a session, forwarding its status events tagged with
    /// this session's generation.
    pub(crate) async fn establish(
        engine: &dyn ReplicationEngine,
        config: ReplicatorConfig,
        role: EndpointRole,
        generation: u64,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Result<Self, TransportInitError> {
        let endpoint = config.endpoint.clone();
        let mut handle = engine.connect(config).await?;

        let forwarder = handle.take_status_events().map(|mut rx| {
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    if events
                        .send(ControllerEvent::Status { generation, event })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            })
        });

        handle.start();
        tracing::info!("replication started endpoint={} role={}", endpoint, role);

        Ok(Self {
            role,
            generation,
            handle,
            forwarder,
        })
    }

    pub fn role(&self) -> EndpointRole {
        self.role
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Tear the session down: the status forwarder is detached first, so a
    /// late event from the dying handle can never reach the controller,
    /// then the handle itself is stopped and awaited.
    pub(crate) async fn stop(mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        self.handle.stop().await;
        tracing::debug!("replication session stopped role={}", self.role);
    }
}
