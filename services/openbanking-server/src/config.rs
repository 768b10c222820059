//! Server Configuration
//!
//! Layered from config files, `OPENBANKING__` environment variables and
//! CLI arguments, in that order of precedence (lowest first).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use openbanking_client::GatewayConfig;
use openbanking_core::OpenBankingConfig;
use openbanking_db::DatabaseConfig;

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server binding configuration
    pub server: ServerSettings,

    /// Which credential store backs linkage records
    pub store: StoreKind,

    /// PostgreSQL settings, used when `store = "postgres"`
    pub database: DatabaseConfig,

    /// Remote open banking API
    pub gateway: GatewayConfig,

    /// Profile, client credentials and settlement account
    pub open_banking: OpenBankingConfig,

    /// API configuration
    pub api: ApiSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Credential store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Postgres,
    Memory,
}

/// Server binding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Grace period for in-flight requests on shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            shutdown_timeout_secs: 10,
        }
    }
}

impl ServerSettings {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Get the shutdown timeout duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Enable CORS
    pub enable_cors: bool,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    /// Enable request tracing
    pub enable_tracing: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            enable_tracing: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl ServerConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = ::config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(::config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(::config::File::with_name("config/default").required(false))
            .add_source(::config::File::with_name("config/local").required(false))
            .add_source(
                ::config::Environment::with_prefix("OPENBANKING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let server_config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(server_config)
    }

    /// In-memory store and debug logging, for local runs
    pub fn development() -> Self {
        Self {
            store: StoreKind::Memory,
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openbanking_core::ServiceProfile;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.store, StoreKind::Postgres);
        assert_eq!(config.open_banking.profile, ServiceProfile::External);
        assert_eq!(config.open_banking.client.grant_type, "authorization_code");
    }

    #[test]
    fn test_development_uses_memory_store() {
        let config = ServerConfig::development();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: ServerConfig = ::config::Config::builder()
            .add_source(::config::File::from_str(
                r#"
                store = "memory"

                [open_banking]
                profile = "disabled"

                [gateway]
                base_url = "http://localhost:9000"
                "#,
                ::config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.open_banking.profile, ServiceProfile::Disabled);
        assert_eq!(config.open_banking.exchange_lease_secs, 60);
        assert_eq!(config.gateway.base_url, "http://localhost:9000");
        assert_eq!(config.gateway.token_path, "/oauth/2.0/token");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_socket_addr() {
        let settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(settings.socket_addr().unwrap().port(), 8080);
    }
}
