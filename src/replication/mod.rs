//! Replication Failover
//!
//! Keeps exactly one continuous replication session alive against a primary
//! or secondary sync endpoint: the controller reacts to status reports from
//! the transport, fails over on sustained primary loss, and fails back once
//! an out-of-band health probe sees the primary again.

pub mod config;
pub mod controller;
pub mod engine;
pub mod prober;
pub mod session;
pub mod types;

pub use config::{BasicCredentials, ConfigError, ReplicatorConfig, SyncSettings};
pub use controller::{ConnectError, FailoverController};
pub use engine::{ReplicationEngine, ReplicationHandle, TransportInitError};
pub use prober::HealthProber;
pub use session::ReplicationSession;
pub use types::{Activity, ConnectionState, EndpointRole, StatusEvent};
