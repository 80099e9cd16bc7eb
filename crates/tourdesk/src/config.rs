/// Server configuration loaded from the environment
use std::env;

/// Runtime configuration for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Path to the SQLite database file
    pub db_path: String,
}

impl ServerConfig {
    /// Loads the configuration from `TOURDESK_BIND` and `TOURDESK_DB`,
    /// falling back to local defaults.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("TOURDESK_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            db_path: env::var("TOURDESK_DB").unwrap_or_else(|_| "tourdesk.db".to_string()),
        }
    }
}
