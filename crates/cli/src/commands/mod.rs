//! CLI command implementations.

pub mod bans;
pub mod identity;
pub mod migrate;
pub mod roles;

use std::time::Duration;

use cardshop_core::{Principal, PrincipalError, UnknownStatus};
use cardshop_storefront::backend::{BackendError, RemoteBackend};
use cardshop_storefront::models::{Identity, IdentityError};
use secrecy::SecretString;
use thiserror::Error;

/// Backend request timeout for CLI calls.
const BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Order backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The backend health check failed.
    #[error("Backend at {0} is not reachable")]
    BackendUnreachable(String),

    /// Recovery key could not be decoded.
    #[error("Invalid recovery key: {0}")]
    Identity(#[from] IdentityError),

    /// Principal text could not be parsed.
    #[error("Invalid principal: {0}")]
    Principal(#[from] PrincipalError),

    /// Role name is not known.
    #[error("{0}. Valid roles: admin, user, guest")]
    Role(#[from] UnknownStatus),
}

/// Remote backend plus the identity calls are made as.
pub struct AdminClient {
    pub backend: RemoteBackend,
    pub caller: Principal,
}

impl AdminClient {
    /// Connect to `BACKEND_URL` as the identity behind `recovery_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid, `BACKEND_URL` is unset or the
    /// backend health check fails.
    pub async fn connect(recovery_key: &str) -> Result<Self, CliError> {
        dotenvy::dotenv().ok();

        let caller = Identity::from_recovery_key(recovery_key)?.principal;
        let url =
            std::env::var("BACKEND_URL").map_err(|_| CliError::MissingEnvVar("BACKEND_URL"))?;
        let api_key = std::env::var("BACKEND_API_KEY").ok().map(SecretString::from);

        let backend = RemoteBackend::new(url, api_key, BACKEND_TIMEOUT)?;
        if !backend.probe().await {
            return Err(CliError::BackendUnreachable(backend.base_url().to_string()));
        }

        tracing::info!(caller = %caller, "Connected to {}", backend.base_url());
        Ok(Self { backend, caller })
    }
}
