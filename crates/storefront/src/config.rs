//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for the session
//!   store (falls back to `DATABASE_URL`; sessions stay in memory when neither is set)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `BACKEND_URL` - Order backend base URL (in-memory backend when unset)
//! - `BACKEND_API_KEY` - Bearer key for the order backend
//! - `BACKEND_TIMEOUT_SECS` - Per-request timeout for backend calls (default: 10)
//! - `ADMIN_GATE_POLICY` - `role`, `panel`, `either` or `both` (default: both)
//! - `BOOTSTRAP_ADMIN_PRINCIPAL` - Principal allowed to claim the first admin role
//! - `ADMIN_PANEL_USERNAME` - Admin panel username (in-memory backend only, default: admin)
//! - `ADMIN_PANEL_PASSWORD` - Admin panel password (in-memory backend only)
//! - `QUERY_CACHE_TTL_SECS` - Server-side query cache lifetime (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (defaults: 1.0 / 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use cardshop_core::Principal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// How the admin role check and the admin panel session combine.
///
/// The backend role and the panel login are independent mechanisms; the
/// policy decides which of them must pass before admin pages render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminGatePolicy {
    /// Backend admin role only.
    Role,
    /// Admin panel session only.
    Panel,
    /// Either mechanism is sufficient.
    Either,
    /// Both mechanisms must pass.
    #[default]
    Both,
}

impl FromStr for AdminGatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "role" => Ok(Self::Role),
            "panel" => Ok(Self::Panel),
            "either" => Ok(Self::Either),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "expected one of role, panel, either, both (got '{other}')"
            )),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` URL for the session store (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Order backend connection
    pub backend: BackendConfig,
    /// Admin access configuration
    pub admin: AdminConfig,
    /// Lifetime of cached backend reads
    pub query_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Order backend connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone, Default)]
pub struct BackendConfig {
    /// Base URL of the remote backend; `None` selects the in-memory backend
    pub url: Option<String>,
    /// Bearer key sent with every backend request
    pub api_key: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Admin access settings.
///
/// Implements `Debug` manually to redact the panel password.
#[derive(Clone, Default)]
pub struct AdminConfig {
    /// How role and panel checks combine
    pub gate_policy: AdminGatePolicy,
    /// Principal that may claim the first admin role
    pub bootstrap_principal: Option<Principal>,
    /// Admin panel username (in-memory backend)
    pub panel_username: String,
    /// Admin panel password (in-memory backend)
    pub panel_password: Option<SecretString>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("gate_policy", &self.gate_policy)
            .field("bootstrap_principal", &self.bootstrap_principal)
            .field("panel_username", &self.panel_username)
            .field(
                "panel_password",
                &self.panel_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL");
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;
        let static_dir = get_env_or_default("STOREFRONT_STATIC_DIR", "crates/storefront/static");

        let backend = BackendConfig::from_env()?;
        let admin = AdminConfig::from_env()?;
        let query_cache_ttl = Duration::from_secs(parse_env("QUERY_CACHE_TTL_SECS", "30")?);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            static_dir,
            backend,
            admin,
            query_cache_ttl,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Configuration suitable for tests and local development: in-memory
    /// backend and sessions, no Sentry.
    #[must_use]
    pub fn for_development() -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("dev-only-7f3Kq9!xZ2@mL5#pR8$wT1^vB4&nC6*"),
            static_dir: "crates/storefront/static".to_string(),
            backend: BackendConfig {
                url: None,
                api_key: None,
                timeout: Duration::from_secs(10),
            },
            admin: AdminConfig {
                gate_policy: AdminGatePolicy::Both,
                bootstrap_principal: None,
                panel_username: "admin".to_string(),
                panel_password: None,
            },
            query_cache_ttl: Duration::from_secs(30),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = get_optional_env("BACKEND_URL").map(|u| u.trim_end_matches('/').to_string());
        if let Some(raw) = &url {
            url::Url::parse(raw).map_err(|e| {
                ConfigError::InvalidEnvVar("BACKEND_URL".to_string(), e.to_string())
            })?;
        }

        let api_key = match get_optional_env("BACKEND_API_KEY") {
            Some(key) => {
                validate_secret_strength(&key, "BACKEND_API_KEY")?;
                Some(SecretString::from(key))
            }
            None => None,
        };

        Ok(Self {
            url,
            api_key,
            timeout: Duration::from_secs(parse_env("BACKEND_TIMEOUT_SECS", "10")?),
        })
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let gate_policy = parse_env("ADMIN_GATE_POLICY", "both")?;

        let bootstrap_principal = get_optional_env("BOOTSTRAP_ADMIN_PRINCIPAL")
            .map(|text| {
                Principal::parse(&text).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "BOOTSTRAP_ADMIN_PRINCIPAL".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        let panel_password = match get_optional_env("ADMIN_PANEL_PASSWORD") {
            Some(password) => {
                validate_secret_strength(&password, "ADMIN_PANEL_PASSWORD")?;
                Some(SecretString::from(password))
            }
            None => None,
        };

        Ok(Self {
            gate_policy,
            bootstrap_principal,
            panel_username: get_env_or_default("ADMIN_PANEL_USERNAME", "admin"),
            panel_password,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-api-key-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err = validate_secret_strength(&"a".repeat(33), "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "TEST").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "TEST").is_ok());
    }

    #[test]
    fn test_admin_gate_policy_parse() {
        assert_eq!("role".parse::<AdminGatePolicy>(), Ok(AdminGatePolicy::Role));
        assert_eq!(" Panel ".parse::<AdminGatePolicy>(), Ok(AdminGatePolicy::Panel));
        assert_eq!("EITHER".parse::<AdminGatePolicy>(), Ok(AdminGatePolicy::Either));
        assert_eq!("both".parse::<AdminGatePolicy>(), Ok(AdminGatePolicy::Both));
        assert!("all".parse::<AdminGatePolicy>().is_err());
        assert_eq!(AdminGatePolicy::default(), AdminGatePolicy::Both);
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig::for_development();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_development_session_secret_passes_validation() {
        let config = StorefrontConfig::for_development();
        let secret = config.session_secret.expose_secret();
        assert!(validate_session_secret(&config.session_secret, "TEST").is_ok());
        // "dev-only" keeps it clear of the placeholder blocklist
        assert!(validate_secret_strength(secret, "TEST").is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let backend = BackendConfig {
            url: Some("https://orders.internal".to_string()),
            api_key: Some(SecretString::from("super_secret_backend_key")),
            timeout: Duration::from_secs(5),
        };
        let admin = AdminConfig {
            gate_policy: AdminGatePolicy::Both,
            bootstrap_principal: Some(Principal::anonymous()),
            panel_username: "ops".to_string(),
            panel_password: Some(SecretString::from("super_secret_panel_password")),
        };

        let debug_output = format!("{backend:?} {admin:?}");
        assert!(debug_output.contains("orders.internal"));
        assert!(debug_output.contains("ops"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_backend_key"));
        assert!(!debug_output.contains("super_secret_panel_password"));
    }
}
