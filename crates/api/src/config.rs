//! Application configuration loaded from environment variables.

use std::time::Duration;

use checkout::CheckoutConfig;

/// Signing key used when `JWT_SECRET` is unset. Only fit for local runs.
pub const DEV_JWT_SECRET: &str = "dev-only-jwt-secret-change-me";

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL URL; unset runs on the in-memory store
/// - `JWT_SECRET` — HS256 signing key (default: [`DEV_JWT_SECRET`])
/// - `TOKEN_TTL_HOURS` — token lifetime (default: `24`)
/// - `PAYMENT_API_KEY` — gateway secret key; unset uses the in-memory gateway
/// - `PAYMENT_API_BASE` — gateway base URL (default: `"https://api.stripe.com"`)
/// - `PAYMENT_CURRENCY` — currency of every intent (default: `"usd"`)
/// - `PAYMENT_TIMEOUT_SECS` — gateway call limit (default: `10`)
/// - `ADMIN_USERNAME` / `ADMIN_PASSWORD` — admin account seeded at startup
///   when both are set
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub payment_api_key: Option<String>,
    pub payment_api_base: String,
    pub payment_currency: String,
    pub payment_timeout_secs: u64,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: get("DATABASE_URL"),
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_ttl_hours: get("TOKEN_TTL_HOURS")
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.token_ttl_hours),
            payment_api_key: get("PAYMENT_API_KEY"),
            payment_api_base: get("PAYMENT_API_BASE").unwrap_or(defaults.payment_api_base),
            payment_currency: get("PAYMENT_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or(defaults.payment_currency),
            payment_timeout_secs: get("PAYMENT_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.payment_timeout_secs),
            admin_username: get("ADMIN_USERNAME"),
            admin_password: get("ADMIN_PASSWORD"),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(60 * 60))
    }

    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment_timeout_secs)
    }

    pub fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig {
            currency: self.payment_currency.clone(),
            payment_timeout: self.payment_timeout(),
        }
    }

    /// Returns the admin credentials when both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    pub fn uses_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            payment_api_key: None,
            payment_api_base: "https://api.stripe.com".to_string(),
            payment_currency: "usd".to_string(),
            payment_timeout_secs: 10,
            admin_username: None,
            admin_password: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");

        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("database_url", &redact(&self.database_url))
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("payment_api_key", &redact(&self.payment_api_key))
            .field("payment_api_base", &self.payment_api_base)
            .field("payment_currency", &self.payment_currency)
            .field("payment_timeout_secs", &self.payment_timeout_secs)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &redact(&self.admin_password))
            .finish()
    }
}
