//! Configuration management for CloudAtlas services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Hosting environment variables (`NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`)
//! 2. Environment variables (`CLOUDATLAS__` prefix, `__` separated)
//! 3. Config file (`cloudatlas.toml`)
//! 4. Defaults

use serde::Deserialize;

use crate::error::CloudAtlasError;

/// Hosting-environment variable names mapped onto config keys.
const HOSTING_ENV: &[(&str, &str)] = &[
    ("NEO4J_URI", "neo4j.uri"),
    ("NEO4J_USERNAME", "neo4j.user"),
    ("NEO4J_PASSWORD", "neo4j.password"),
];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

/// Connection settings for the graph database.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Rows pulled per round trip.
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

/// Boundary HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address to bind (default: 127.0.0.1:3001).
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Maximum accepted request body in bytes.
    #[serde(default = "default_body_limit")]
    pub max_body_bytes: usize,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_bind() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_body_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `<file_prefix>.{toml,yaml,json}`, the process
    /// environment, and defaults.
    pub fn load(file_prefix: &str) -> Result<Self, CloudAtlasError> {
        Self::load_with(file_prefix, |key| std::env::var(key).ok())
    }

    /// Load configuration, reading hosting-environment variables through `env`.
    pub fn load_with(
        file_prefix: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CloudAtlasError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("CLOUDATLAS")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in HOSTING_ENV {
            builder = builder.set_override_option(*key, env(var).filter(|v| !v.is_empty()))?;
        }

        let app: AppConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(uri = %app.neo4j.uri, bind = %app.server.bind, "Loaded configuration");
        Ok(app)
    }
}
