//! Connection Config Factory
//!
//! Pure construction of replication configurations, plus the sync endpoint
//! settings the failover controller runs with.

use crate::store::CollectionSpec;
use reqwest::Url;
use std::time::Duration;

/// Username/password pair presented to the sync endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Immutable configuration bundle for one replication connection attempt.
///
/// Replication is always continuous, and only verified certificates are
/// accepted; neither is configurable.
#[derive(Debug, Clone)]
pub struct ReplicatorConfig {
    pub endpoint: String,
    pub credentials: BasicCredentials,
    pub collections: Vec<CollectionSpec>,
    pub continuous: bool,
    pub accept_invalid_certs: bool,
}

impl ReplicatorConfig {
    /// Build a configuration for one endpoint. No side effects, no I/O.
    pub fn new(
        endpoint: impl Into<String>,
        credentials: BasicCredentials,
        collections: Vec<CollectionSpec>,
    ) -> Result<Self, ConfigError> {
        if collections.is_empty() {
            return Err(ConfigError::NoCollections);
        }
        Ok(Self {
            endpoint: endpoint.into(),
            credentials,
            collections,
            continuous: true,
            accept_invalid_certs: false,
        })
    }
}

/// Settings for the failover controller.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Preferred sync endpoint
    pub primary_url: String,
    /// Standby sync endpoint used after a primary failure
    pub secondary_url: String,
    /// Credentials presented to both endpoints
    pub credentials: BasicCredentials,
    /// Interval between primary reachability probes (default: 30s)
    pub probe_interval: Duration,
}

impl SyncSettings {
    pub fn new(primary_url: impl Into<String>, secondary_url: impl Into<String>) -> Self {
        Self {
            primary_url: primary_url.into(),
            secondary_url: secondary_url.into(),
            credentials: BasicCredentials::new("", ""),
            probe_interval: Duration::from_secs(30),
        }
    }

    /// Set the credential pair.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = BasicCredentials::new(username, password);
        self
    }

    /// Set the probe interval.
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_url.is_empty() {
            return Err(ConfigError::MissingPrimaryUrl);
        }
        if self.secondary_url.is_empty() {
            return Err(ConfigError::MissingSecondaryUrl);
        }
        self.probe_url()?;
        Ok(())
    }

    /// Reachability URL derived from the primary endpoint: same host and
    /// port, root path, plain HTTP(S) instead of the replication protocol.
    pub fn probe_url(&self) -> Result<Url, ConfigError> {
        let parsed = Url::parse(&self.primary_url)
            .map_err(|_| ConfigError::InvalidEndpoint(self.primary_url.clone()))?;

        let scheme = match parsed.scheme() {
            "wss" | "https" => "https",
            "ws" | "http" => "http",
            _ => return Err(ConfigError::InvalidEndpoint(self.primary_url.clone())),
        };
        let host = parsed
            .host_str()
            .ok_or_else(|| ConfigError::InvalidEndpoint(self.primary_url.clone()))?;

        let probe = match parsed.port() {
            Some(port) => format!("{}://{}:{}/", scheme, host, port),
            None => format!("{}://{}/", scheme, host),
        };
        Url::parse(&probe).map_err(|_| ConfigError::InvalidEndpoint(self.primary_url.clone()))
    }
}

/// Configuration errors. Fatal to the connection attempt; never retried
/// automatically.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("no collections resolved to replicate")]
    NoCollections,
    #[error("primary endpoint URL is required")]
    MissingPrimaryUrl,
    #[error("secondary endpoint URL is required")]
    MissingSecondaryUrl,
    #[error("endpoint URL is not usable: {0}")]
    InvalidEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logistics_collections() -> Vec<CollectionSpec> {
        vec![CollectionSpec {
            scope: "scp".to_string(),
            name: "logistics".to_string(),
        }]
    }

    #[test]
    fn test_replicator_config_defaults() {
        let config = ReplicatorConfig::new(
            "wss://sync.example.com:4984/logistics",
            BasicCredentials::new("user", "pass"),
            logistics_collections(),
        )
        .unwrap();

        assert!(config.continuous);
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.collections.len(), 1);
    }

    #[test]
    fn test_replicator_config_rejects_empty_collections() {
        let result = ReplicatorConfig::new(
            "wss://sync.example.com:4984/logistics",
            BasicCredentials::new("user", "pass"),
            Vec::new(),
        );
        assert!(matches!(result, Err(ConfigError::NoCollections)));
    }

    #[test]
    fn test_settings_builder() {
        let settings = SyncSettings::new("wss://a:4984/db", "wss://b:4984/db")
            .credentials("courier", "s3cret")
            .probe_interval(Duration::from_secs(10));

        assert_eq!(settings.credentials.username, "courier");
        assert_eq!(settings.probe_interval, Duration::from_secs(10));
        assert_eq!(settings.primary_url, "wss://a:4984/db");
    }

    #[test]
    fn test_settings_default_probe_interval() {
        let settings = SyncSettings::new("wss://a:4984/db", "wss://b:4984/db");
        assert_eq!(settings.probe_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_validate_missing_urls() {
        let result = SyncSettings::new("", "wss://b:4984/db").validate();
        assert!(matches!(result, Err(ConfigError::MissingPrimaryUrl)));

        let result = SyncSettings::new("wss://a:4984/db", "").validate();
        assert!(matches!(result, Err(ConfigError::MissingSecondaryUrl)));
    }

    #[test]
    fn test_probe_url_from_wss() {
        let settings = SyncSettings::new("wss://sync.example.com:4984/logistics", "wss://b/db");
        let url = settings.probe_url().unwrap();
        assert_eq!(url.as_str(), "https://sync.example.com:4984/");
    }

    #[test]
    fn test_probe_url_from_ws_without_port() {
        let settings = SyncSettings::new("ws://sync.example.com/logistics", "wss://b/db");
        let url = settings.probe_url().unwrap();
        assert_eq!(url.as_str(), "http://sync.example.com/");
    }

    #[test]
    fn test_probe_url_rejects_garbage() {
        let settings = SyncSettings::new("not a url", "wss://b/db");
        assert!(matches!(
            settings.probe_url(),
            Err(ConfigError::InvalidEndpoint(_))
        ));

        let settings = SyncSettings::new("ftp://sync.example.com/db", "wss://b/db");
        assert!(matches!(
            settings.probe_url(),
            Err(ConfigError::InvalidEndpoint(_))
        ));
    }
}
