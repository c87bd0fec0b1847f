//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Media storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Account registration settings.
    #[serde(default)]
    pub registration: RegistrationConfig,
    /// Administrator account created at startup when missing.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this site, used when a request carries no `Host` header.
    pub url: String,
    /// Honour `X-Forwarded-Proto` from a TLS-terminating proxy.
    #[serde(default = "default_true")]
    pub trust_forwarded_proto: bool,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Where uploaded images and videos are stored.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Local {
        /// Base path for stored files.
        #[serde(default = "default_base_path")]
        base_path: PathBuf,
        /// Base URL for serving files.
        #[serde(default = "default_base_url")]
        base_url: String,
    },
    /// Cloudinary media host.
    Cloudinary {
        /// Cloud name (account identifier).
        cloud_name: String,
        /// API key.
        api_key: String,
        /// API secret used to sign uploads.
        api_secret: String,
        /// Folder prefix prepended to every upload.
        #[serde(default)]
        folder_prefix: Option<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local {
            base_path: default_base_path(),
            base_url: default_base_url(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Account registration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// Whether the register endpoint accepts new accounts.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether a registering caller may pick their own role.
    #[serde(default)]
    pub allow_role_choice: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_role_choice: false,
        }
    }
}

/// Credentials of the administrator created at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    /// Username.
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Plain-text password; hashed before storage.
    pub password: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./media")
}

fn default_base_url() -> String {
    "/media".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `JARDIN_ENV`)
    /// 3. Environment variables with `JARDIN__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("JARDIN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("JARDIN")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("JARDIN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(config::Config::try_deserialize)
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
            [server]
            url = "http://localhost:8000"

            [database]
            url = "postgres://localhost/jardin"
            "#,
        );

        assert_eq!(config.server.port, 8000);
        assert!(config.server.trust_forwarded_proto);
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
        assert!(config.registration.enabled);
        assert!(!config.registration.allow_role_choice);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_cloudinary_storage_section() {
        let config = parse(
            r#"
            [server]
            url = "https://jardin.example"

            [database]
            url = "postgres://localhost/jardin"

            [storage]
            backend = "cloudinary"
            cloud_name = "demo"
            api_key = "key"
            api_secret = "secret"
            "#,
        );

        match config.storage {
            StorageConfig::Cloudinary {
                cloud_name,
                folder_prefix,
                ..
            } => {
                assert_eq!(cloud_name, "demo");
                assert!(folder_prefix.is_none());
            }
            StorageConfig::Local { .. } => panic!("expected cloudinary storage"),
        }
    }
}
