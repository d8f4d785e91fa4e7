//! Failover Controller
//!
//! Owns which sync endpoint is currently active. Reacts to status reports
//! from the live replication session, fails over to the secondary endpoint
//! on sustained primary loss, probes the primary while on the secondary,
//! and fails back when the probe sees it again.
//!
//! Core invariant: at most one live replication handle exists system-wide.
//! Every connect tears the previous session down and awaits that teardown
//! before creating the next handle, all under one state lock.

use crate::replication::config::{ConfigError, ReplicatorConfig, SyncSettings};
use crate::replication::engine::{ReplicationEngine, TransportInitError};
use crate::replication::prober::HealthProber;
use crate::replication::session::ReplicationSession;
use crate::replication::types::{Activity, ConnectionState, EndpointRole, StatusEvent};
use crate::store::{CollectionSpec, DocumentStore};
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Errors a connection attempt can surface. Logged and returned to the
/// caller; the controller never retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportInitError),
}

/// Internal events consumed by the controller's event loop.
#[derive(Debug)]
pub(crate) enum ControllerEvent {
    /// Status report forwarded from a replication session
    Status { generation: u64, event: StatusEvent },
    /// The health prober reached the primary endpoint
    ProbeSucceeded,
    /// Terminate the event loop
    Shutdown,
}

struct Inner {
    state: ConnectionState,
    /// Monotonic session counter; status events from older generations are
    /// stale and dropped
    generation: u64,
    session: Option<ReplicationSession>,
    prober: Option<HealthProber>,
    last_status: Option<StatusEvent>,
}

/// Primary/secondary endpoint selector for the replication engine.
pub struct FailoverController {
    engine: Arc<dyn ReplicationEngine>,
    settings: SyncSettings,
    /// Resolved once at spawn and reused for every connection attempt
    collections: Vec<CollectionSpec>,
    probe_url: Url,
    probe_client: reqwest::Client,
    events_tx: mpsc::Sender<ControllerEvent>,
    inner: Mutex<Inner>,
}

impl FailoverController {
    /// Validate settings, resolve the replicated collection set from the
    /// shared database handle, and spawn the event loop.
    pub fn spawn(
        engine: Arc<dyn ReplicationEngine>,
        store: &DocumentStore,
        settings: SyncSettings,
    ) -> Result<Arc<Self>, ConfigError> {
        settings.validate()?;
        let probe_url = settings.probe_url()?;
        let collections = store.replicated_collections();

        let (events_tx, events_rx) = mpsc::channel(64);
        let controller = Arc::new(Self {
            engine,
            settings,
            collections,
            probe_url,
            probe_client: reqwest::Client::new(),
            events_tx,
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                generation: 0,
                session: None,
                prober: None,
                last_status: None,
            }),
        });

        tokio::spawn(Self::event_loop(controller.clone(), events_rx));
        Ok(controller)
    }

    /// Connect to the primary endpoint, tearing down whatever is active.
    pub async fn connect_to_primary(&self) -> Result<(), ConnectError> {
        self.connect(EndpointRole::Primary).await
    }

    /// Connect to the secondary endpoint. Normally invoked by the event
    /// loop as a reaction to a primary failure, not by external callers.
    pub async fn connect_to_secondary(&self) -> Result<(), ConnectError> {
        self.connect(EndpointRole::Secondary).await
    }

    /// Tear down the active session and prober. Safe no-op when nothing is
    /// active.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        Self::teardown(&mut inner).await;
    }

    /// Tear everything down and terminate the event loop.
    pub async fn shutdown(&self) {
        self.disconnect().await;
        let _ = self.events_tx.send(ControllerEvent::Shutdown).await;
    }

    /// Current controller state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.lock().await.state
    }

    /// Last status the active session reported, for the host UI.
    pub async fn last_status(&self) -> Option<StatusEvent> {
        self.inner.lock().await.last_status.clone()
    }

    /// Whether the primary reachability probe is currently scheduled.
    pub async fn is_probing(&self) -> bool {
        self.inner.lock().await.prober.is_some()
    }

    async fn connect(&self, role: EndpointRole) -> Result<(), ConnectError> {
        // The lock is held across the whole teardown-then-create sequence:
        // this is what makes the two-live-handles race impossible.
        let mut inner = self.inner.lock().await;
        self.connect_locked(&mut inner, role).await
    }

    async fn connect_locked(
        &self,
        inner: &mut Inner,
        role: EndpointRole,
    ) -> Result<(), ConnectError> {
        Self::teardown(inner).await;
        inner.state = ConnectionState::Connecting(role);

        match self.establish(inner, role).await {
            Ok(()) => {
                inner.state = ConnectionState::Connected(role);
                tracing::info!("connected role={} state={}", role, inner.state);
                Ok(())
            }
            Err(e) => {
                inner.state = ConnectionState::Disconnected;
                tracing::error!("connect to {} failed: {}", role, e);
                Err(e)
            }
        }
    }

    async fn establish(&self, inner: &mut Inner, role: EndpointRole) -> Result<(), ConnectError> {
        let endpoint = match role {
            EndpointRole::Primary => &self.settings.primary_url,
            EndpointRole::Secondary => &self.settings.secondary_url,
        };
        let config = ReplicatorConfig::new(
            endpoint,
            self.settings.credentials.clone(),
            self.collections.clone(),
        )?;

        inner.generation += 1;
        let session = ReplicationSession::establish(
            self.engine.as_ref(),
            config,
            role,
            inner.generation,
            self.events_tx.clone(),
        )
        .await?;
        inner.session = Some(session);
        Ok(())
    }

    /// Cancel the prober, detach and stop the session, clear state. Always
    /// awaited to completion before any new handle is created.
    async fn teardown(inner: &mut Inner) {
        if let Some(mut prober) = inner.prober.take() {
            prober.stop();
        }
        if let Some(session) = inner.session.take() {
            session.stop().await;
        }
        inner.state = ConnectionState::Disconnected;
    }

    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn event_loop(self: Arc<Self>, mut events_rx: mpsc::Receiver<ControllerEvent>) {
        while let Some(event) = events_rx.recv().await {
            if matches!(event, ControllerEvent::Shutdown) {
                break;
            }
            self.handle_event(event).await;
        }
        tracing::debug!("failover controller event loop terminated");
    }

    async fn handle_event(&self, event: ControllerEvent) {
        match event {
            ControllerEvent::Status { generation, event } => {
                self.handle_status(generation, event).await;
            }
            ControllerEvent::ProbeSucceeded => {
                self.handle_probe_success().await;
            }
            ControllerEvent::Shutdown => {}
        }
    }

    async fn handle_status(&self, generation: u64, event: StatusEvent) {
        // The lock is held through the reaction: a host disconnect() cannot
        // slip between the decision and the reconnect.
        let mut inner = self.inner.lock().await;
        if generation != inner.generation || inner.session.is_none() {
            tracing::debug!(
                "dropping status from superseded replicator generation={} activity={}",
                generation,
                event.activity
            );
            return;
        }
        inner.last_status = Some(event.clone());

        if let Some(error) = &event.error {
            tracing::warn!("replicator reported error activity={}: {}", event.activity, error);
        }

        match inner.state {
            ConnectionState::Connected(EndpointRole::Primary)
                if event.activity.is_connection_lost() =>
            {
                tracing::warn!(
                    "primary connection lost activity={}, failing over",
                    event.activity
                );
                if let Err(e) = self.connect_locked(&mut inner, EndpointRole::Secondary).await {
                    tracing::error!("failover to secondary failed: {}", e);
                }
            }
            ConnectionState::Connected(EndpointRole::Secondary)
                if event.activity.is_established() =>
            {
                self.start_prober(&mut inner);
            }
            ConnectionState::Connected(EndpointRole::Secondary)
                if event.activity.is_connection_lost() =>
            {
                // No tertiary endpoint exists. Degraded until the
                // transport or the host intervenes.
                tracing::error!(
                    "secondary connection lost activity={}, no fallback remains",
                    event.activity
                );
            }
            state => {
                tracing::debug!("replicator status state={} activity={}", state, event.activity);
            }
        }
    }

    async fn handle_probe_success(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.state.is_connected_to(EndpointRole::Secondary) {
            return;
        }
        // Stop the prober first, explicitly: a failed primary reconnect must
        // not leave a second prober behind when the next one starts.
        if let Some(mut prober) = inner.prober.take() {
            prober.stop();
        }

        tracing::info!("primary endpoint reachable again, failing back");
        if let Err(e) = self.connect_locked(&mut inner, EndpointRole::Primary).await {
            tracing::error!("failback to primary failed: {}", e);
        }
    }

    fn start_prober(&self, inner: &mut Inner) {
        if inner.prober.is_some() {
            // single-timer invariant
            return;
        }

        tracing::info!(
            "secondary established, probing primary url={} every {:?}",
            self.probe_url,
            self.settings.probe_interval
        );
        inner.prober = Some(HealthProber::start(
            self.probe_client.clone(),
            self.probe_url.clone(),
            self.settings.probe_interval,
            self.events_tx.clone(),
        ));
    }
}
