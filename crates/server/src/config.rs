//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CLEMENTINE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `CLEMENTINE_BASE_URL` - Public URL for the service
//! - `CLEMENTINE_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `CLERK_SECRET_KEY` - Identity provider API key (server-side only)
//! - `IMAGEKIT_PRIVATE_KEY` - Image storage API key
//! - `IMAGEKIT_URL_ENDPOINT` - Image delivery URL endpoint (e.g., <https://ik.imagekit.io/clementine>)
//!
//! ## Optional
//! - `CLEMENTINE_HOST` - Bind address (default: 127.0.0.1)
//! - `CLEMENTINE_PORT` - Listen port (default: 3000)
//! - `CLERK_API_URL` - Identity provider API base (default: <https://api.clerk.com/v1>)
//! - `CLERK_WEBHOOK_SECRET` - Webhook signing secret; the webhook endpoint fails
//!   closed with a 500 when this is unset
//! - `ADMIN_SYNC_TOKEN` - Static bearer token accepted by the bulk sync endpoint
//! - `QUICK_SYNC_SECRET` - Query-param secret accepted by the quick sync endpoint
//! - `ADMIN_EMAILS` - Comma-separated allow-list for the admin-email fallback auth
//! - `IMAGEKIT_UPLOAD_URL` - Image upload API (default: <https://upload.imagekit.io/api/v1/files/upload>)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
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

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the service
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Identity provider configuration
    pub clerk: ClerkConfig,
    /// Image storage configuration
    pub imagekit: ImageKitConfig,
    /// Admin endpoint access configuration
    pub admin: AdminAccessConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Identity provider (Clerk) API configuration.
#[derive(Clone)]
pub struct ClerkConfig {
    /// API base URL
    pub api_url: String,
    /// Backend API key
    pub secret_key: SecretString,
    /// Webhook signing secret (`whsec_...`); the webhook endpoint rejects all
    /// deliveries when unset
    pub webhook_secret: Option<SecretString>,
}

impl std::fmt::Debug for ClerkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkConfig")
            .field("api_url", &self.api_url)
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Image storage (ImageKit) configuration.
#[derive(Clone)]
pub struct ImageKitConfig {
    /// Upload API URL
    pub upload_url: String,
    /// Delivery URL endpoint
    pub url_endpoint: String,
    /// Private API key
    pub private_key: SecretString,
}

impl std::fmt::Debug for ImageKitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageKitConfig")
            .field("upload_url", &self.upload_url)
            .field("url_endpoint", &self.url_endpoint)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Authorization material for the admin sync endpoints.
///
/// Each field gates one fallback path; all of them are optional and an unset
/// value simply disables that path.
#[derive(Clone, Default)]
pub struct AdminAccessConfig {
    /// Static bearer token for `POST /api/admin/sync-clerk-users`
    pub sync_token: Option<SecretString>,
    /// Query-param secret for `GET /api/admin/quick-sync-users`
    pub quick_sync_secret: Option<SecretString>,
    /// Lower-cased email allow-list for the signed-in admin fallback
    pub admin_emails: Vec<String>,
}

impl AdminAccessConfig {
    /// Whether the given email is on the admin allow-list.
    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        let lower = email.to_lowercase();
        self.admin_emails.iter().any(|e| *e == lower)
    }
}

impl std::fmt::Debug for AdminAccessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAccessConfig")
            .field("sync_token", &self.sync_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "quick_sync_secret",
                &self.quick_sync_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("admin_emails", &self.admin_emails)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the session secret fails validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CLEMENTINE_DATABASE_URL")?;
        let host = get_env_or_default("CLEMENTINE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CLEMENTINE_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("CLEMENTINE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CLEMENTINE_PORT".to_owned(), e.to_string()))?;
        let base_url = get_required_env("CLEMENTINE_BASE_URL")?;
        let session_secret = get_session_secret("CLEMENTINE_SESSION_SECRET")?;

        let clerk = ClerkConfig::from_env()?;
        let imagekit = ImageKitConfig::from_env()?;
        let admin = AdminAccessConfig::from_env();
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            clerk,
            imagekit,
            admin,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ClerkConfig {
    /// Default identity provider API base URL.
    pub const DEFAULT_API_URL: &'static str = "https://api.clerk.com/v1";

    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_env_or_default("CLERK_API_URL", Self::DEFAULT_API_URL),
            secret_key: get_required_secret("CLERK_SECRET_KEY")?,
            webhook_secret: get_optional_env("CLERK_WEBHOOK_SECRET").map(SecretString::from),
        })
    }
}

impl ImageKitConfig {
    /// Default upload API URL.
    pub const DEFAULT_UPLOAD_URL: &'static str = "https://upload.imagekit.io/api/v1/files/upload";

    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            upload_url: get_env_or_default("IMAGEKIT_UPLOAD_URL", Self::DEFAULT_UPLOAD_URL),
            url_endpoint: get_required_env("IMAGEKIT_URL_ENDPOINT")?,
            private_key: get_required_secret("IMAGEKIT_PRIVATE_KEY")?,
        })
    }
}

impl AdminAccessConfig {
    fn from_env() -> Self {
        let admin_emails = get_optional_env("ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            sync_token: get_optional_env("ADMIN_SYNC_TOKEN").map(SecretString::from),
            quick_sync_secret: get_optional_env("QUICK_SYNC_SECRET").map(SecretString::from),
            admin_emails,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Load the session secret, rejecting short, placeholder, or low-entropy values.
fn get_session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;

    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            key.to_owned(),
            format!(
                "must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {})",
                value.len()
            ),
        ));
    }

    validate_secret_strength(&value, key)?;

    Ok(SecretString::from(value))
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real secrets (random API keys) have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
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
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}
