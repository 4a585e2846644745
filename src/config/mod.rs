use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/eventdesk";
const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_MAIL_FROM: &str = "Eventdesk <no-reply@localhost>";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_ENVIRONMENT: &str = "development";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    /// Comma separated browser origins allowed by CORS.
    pub cors_allowed_origins: String,
    /// `RUST_ENV`; `production` turns on HSTS.
    pub environment: String,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    /// `None` selects the log-only mailer.
    pub api_key: Option<String>,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", 5),
            port: try_load("PORT", 3001),
            cors_allowed_origins: try_load(
                "CORS_ALLOWED_ORIGINS",
                DEFAULT_ALLOWED_ORIGINS.to_string(),
            ),
            environment: try_load("RUST_ENV", DEFAULT_ENVIRONMENT.to_string()),
            mail: MailConfig {
                api_url: env::var("MAIL_API_URL")
                    .unwrap_or_else(|_| DEFAULT_MAIL_API_URL.to_string()),
                api_key: env::var("MAIL_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                from: env::var("MAIL_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string()),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Parses `key` from the environment, falling back to `default` when unset or invalid.
fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
