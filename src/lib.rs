//! fieldsync - Offline-first logistics sync core
//!
//! Embedded document store for field-logistics records, an async data-access
//! facade over it, and a replication failover controller that keeps one
//! continuous sync session alive against a primary or secondary cloud
//! endpoint. The replication transport is a port: the host application
//! injects an implementation at startup and acts as the composition root.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod facade;
pub mod model;
pub mod replication;
pub mod store;

// Re-export commonly used types
pub use config::{load_config, Config};
pub use facade::{LogisticsService, SearchFilter};
pub use model::{LogisticsField, LogisticsRecord};
pub use replication::{
    Activity, ConnectionState, EndpointRole, FailoverController, ReplicationEngine,
    ReplicationHandle, StatusEvent, SyncSettings,
};
pub use store::{CollectionSpec, DocumentStore, StoreError};
