//! # CourseHub Config
//!
//! Environment-driven configuration, loaded once at startup and carried in
//! the application state:
//!
//! - [`jwt`]: token signing secret and lifetime
//! - [`cors`]: allowed browser origins
//! - [`email`]: SMTP delivery for one-time codes
//! - [`storage`]: upload backend and size cap
//! - [`payment`]: checkout gateway credentials and redirect URLs
//! - [`server`]: listen address
//!
//! Every `from_env()` falls back to a development default when a variable is
//! unset or unparsable.

pub mod cors;
pub mod email;
pub mod jwt;
pub mod payment;
pub mod server;
pub mod storage;

pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use payment::PaymentConfig;
pub use server::ServerConfig;
pub use storage::{StorageBackend, StorageConfig};

pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}
