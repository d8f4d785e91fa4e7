//! Replication Types
//!
//! Core types shared by the failover controller, session, and prober.

/// Which sync endpoint a connection targets. The primary is preferred; the
/// secondary is a standby used only after a primary failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Primary,
    Secondary,
}

impl std::fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointRole::Primary => write!(f, "primary"),
            EndpointRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// The replication engine's self-reported connection activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Stopped,
    Offline,
    Connecting,
    Idle,
    Busy,
}

impl Activity {
    /// Activity levels that mean the connection to the endpoint is gone.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Activity::Stopped | Activity::Offline)
    }

    /// Activity levels that mean a working connection is established.
    pub fn is_established(&self) -> bool {
        matches!(self, Activity::Idle | Activity::Busy)
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activity::Stopped => write!(f, "stopped"),
            Activity::Offline => write!(f, "offline"),
            Activity::Connecting => write!(f, "connecting"),
            Activity::Idle => write!(f, "idle"),
            Activity::Busy => write!(f, "busy"),
        }
    }
}

/// One status report pushed by the replication transport. Delivered zero or
/// more times over a handle's life; never polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub activity: Activity,
    pub error: Option<String>,
}

impl StatusEvent {
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            error: None,
        }
    }

    pub fn with_error(activity: Activity, error: impl Into<String>) -> Self {
        Self {
            activity,
            error: Some(error.into()),
        }
    }
}

/// Failover controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No replication session exists
    Disconnected,
    /// A session is being torn down / built for the given endpoint
    Connecting(EndpointRole),
    /// A session against the given endpoint is live
    Connected(EndpointRole),
}

impl ConnectionState {
    pub fn is_connected_to(&self, role: EndpointRole) -> bool {
        matches!(self, ConnectionState::Connected(r) if *r == role)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting(role) => write!(f, "connecting-{}", role),
            ConnectionState::Connected(role) => write!(f, "connected-{}", role),
        }
    }
}
