//! Shared test doubles for the failover integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use fieldsync::replication::{
    ReplicationEngine, ReplicationHandle, ReplicatorConfig, StatusEvent, TransportInitError,
};
use fieldsync::DocumentStore;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// In-memory replication engine that tracks live handles and lets tests
/// push status events into whichever handle is currently active.
pub struct MockEngine {
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
    endpoints: Mutex<Vec<String>>,
    status_feeds: Mutex<Vec<mpsc::Sender<StatusEvent>>>,
    fail_next: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            live: Arc::new(AtomicUsize::new(0)),
            max_live: Arc::new(AtomicUsize::new(0)),
            endpoints: Mutex::new(Vec::new()),
            status_feeds: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        })
    }

    /// Make the next connect attempt fail with a transport error.
    pub fn fail_next_connect(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Endpoint URLs in connection order.
    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().unwrap().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.endpoints.lock().unwrap().len()
    }

    /// Currently live handles. Must never exceed one.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// High-water mark of simultaneously live handles.
    pub fn max_live_handles(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    /// Push a status event through the most recently created handle, as the
    /// transport would.
    pub async fn push_status(&self, event: StatusEvent) {
        let feed = self
            .status_feeds
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no handle created yet");
        // The receiving forwarder may already be detached; that is fine.
        let _ = feed.send(event).await;
    }
}

#[async_trait]
impl ReplicationEngine for MockEngine {
    async fn connect(
        &self,
        config: ReplicatorConfig,
    ) -> Result<Box<dyn ReplicationHandle>, TransportInitError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(TransportInitError("connection refused".to_string()));
        }

        self.endpoints.lock().unwrap().push(config.endpoint);
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(16);
        self.status_feeds.lock().unwrap().push(tx);

        Ok(Box::new(MockHandle {
            live: self.live.clone(),
            started: false,
            stopped: false,
            events: Some(rx),
        }))
    }
}

struct MockHandle {
    live: Arc<AtomicUsize>,
    started: bool,
    stopped: bool,
    events: Option<mpsc::Receiver<StatusEvent>>,
}

#[async_trait]
impl ReplicationHandle for MockHandle {
    fn start(&mut self) {
        self.started = true;
    }

    async fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn take_status_events(&mut self) -> Option<mpsc::Receiver<StatusEvent>> {
        self.events.take()
    }
}

/// In-memory store with the synced logistics collection registered.
pub fn synced_store() -> DocumentStore {
    let store = DocumentStore::open_in_memory().unwrap();
    store.create_collection("logistics", "scp").unwrap();
    store
}

/// Poll `condition` until it holds or the timeout expires.
pub async fn wait_for<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
