//! Service configuration.

use serde::Deserialize;
use std::path::Path;

use fakepay_core::DEFAULT_VPA_DOMAIN;

/// Which `Store` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Durable `RocksDB` store under `data_dir`.
    Rocks,
    /// Volatile in-process store.
    Memory,
}

impl StorageBackend {
    fn from_env_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("memory") {
            Self::Memory
        } else {
            Self::Rocks
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/fakepay").
    pub data_dir: String,

    /// Storage backend (default: rocks).
    pub storage_backend: StorageBackend,

    /// API key required to create payment intents.
    pub service_api_key: Option<String>,

    /// The fixed domain every VPA must use (default: "fakepay").
    pub vpa_domain: String,

    /// Secret mixed into enrolled PIN hashes. PIN enrollment is disabled without it.
    pub pin_pepper: Option<String>,

    /// Reject confirmations from users with no enrolled PIN.
    pub require_enrolled_pin: bool,

    /// Rejected credentials after which a transaction is failed (default: 3).
    pub max_credential_attempts: u32,

    /// Retries of a transfer commit that lost an optimistic version race (default: 3).
    pub ledger_max_retries: u32,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Secrets file structure.
#[derive(Debug, Deserialize)]
struct FakePaySecrets {
    #[serde(default)]
    service_api_key: Option<String>,
    #[serde(default)]
    pin_pepper: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and the secrets file.
    #[must_use]
    pub fn from_env() -> Self {
        let (service_api_key, pin_pepper) = load_secrets();
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            storage_backend: std::env::var("STORAGE_BACKEND")
                .map(|v| StorageBackend::from_env_value(&v))
                .unwrap_or(defaults.storage_backend),
            service_api_key,
            vpa_domain: std::env::var("VPA_DOMAIN").unwrap_or(defaults.vpa_domain),
            pin_pepper,
            require_enrolled_pin: env_parse("REQUIRE_ENROLLED_PIN")
                .unwrap_or(defaults.require_enrolled_pin),
            max_credential_attempts: env_parse("MAX_CREDENTIAL_ATTEMPTS")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_credential_attempts),
            ledger_max_retries: env_parse("LEDGER_MAX_RETRIES")
                .unwrap_or(defaults.ledger_max_retries),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Load secrets from file, then fall back to the environment per field.
fn load_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/fakepay.json",
        "fakepay/.secrets/fakepay.json",
        "../.secrets/fakepay.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<FakePaySecrets>(path) {
            tracing::info!(path = %path, "Loaded FakePay secrets from file");
            return (
                secrets
                    .service_api_key
                    .or_else(|| std::env::var("SERVICE_API_KEY").ok()),
                secrets
                    .pin_pepper
                    .or_else(|| std::env::var("PIN_PEPPER").ok()),
            );
        }
    }

    tracing::debug!("Secrets file not found, using environment variables");
    (
        std::env::var("SERVICE_API_KEY").ok(),
        std::env::var("PIN_PEPPER").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/fakepay".into(),
            storage_backend: StorageBackend::Rocks,
            service_api_key: None,
            vpa_domain: DEFAULT_VPA_DOMAIN.into(),
            pin_pepper: None,
            require_enrolled_pin: false,
            max_credential_attempts: 3,
            ledger_max_retries: 3,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parsing() {
        assert_eq!(StorageBackend::from_env_value("memory"), StorageBackend::Memory);
        assert_eq!(StorageBackend::from_env_value("MEMORY"), StorageBackend::Memory);
        assert_eq!(StorageBackend::from_env_value("rocks"), StorageBackend::Rocks);
        assert_eq!(StorageBackend::from_env_value("anything"), StorageBackend::Rocks);
    }

    #[test]
    fn secrets_file_fields_are_optional() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fakepay.json");
        std::fs::write(&path, r#"{"pin_pepper":"pepper"}"#).unwrap();

        let secrets: FakePaySecrets = load_secrets_file(path.to_str().unwrap()).unwrap();
        assert_eq!(secrets.pin_pepper.as_deref(), Some("pepper"));
        assert!(secrets.service_api_key.is_none());
    }

    #[test]
    fn missing_secrets_file_is_not_found() {
        let err = load_secrets_file::<FakePaySecrets>("/nonexistent/fakepay.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
