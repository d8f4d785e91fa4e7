use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Local store settings
    pub db_path: String,
    pub debug: bool,

    // Sync endpoint settings
    pub primary_url: String,
    pub secondary_url: String,
    pub sync_username: String,
    pub sync_password: String,
    pub probe_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "logistics.db".to_string(),
            debug: false,
            primary_url: "wss://sync.example.com:4984/logistics".to_string(),
            secondary_url: "wss://standby.example.com:4984/logistics".to_string(),
            sync_username: String::new(),
            sync_password: String::new(),
            probe_interval_secs: 30,
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    let db_path = std::env::var("FIELDSYNC_DB_PATH")
        .unwrap_or_else(|_| "logistics.db".to_string());

    let debug = std::env::var("DEBUG").is_ok();

    let primary_url = std::env::var("FIELDSYNC_PRIMARY_URL")
        .unwrap_or_else(|_| "wss://sync.example.com:4984/logistics".to_string());

    let secondary_url = std::env::var("FIELDSYNC_SECONDARY_URL")
        .unwrap_or_else(|_| "wss://standby.example.com:4984/logistics".to_string());

    // Credentials are never hardcoded; empty means unauthenticated sync.
    let sync_username = std::env::var("FIELDSYNC_USERNAME").unwrap_or_default();
    let sync_password = std::env::var("FIELDSYNC_PASSWORD").unwrap_or_default();

    let probe_interval_secs = std::env::var("FIELDSYNC_PROBE_INTERVAL_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .unwrap_or(30);

    Ok(Config {
        db_path,
        debug,
        primary_url,
        secondary_url,
        sync_username,
        sync_password,
        probe_interval_secs,
    })
}
