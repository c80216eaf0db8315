use crate::{env_flag, env_or, env_parse};

#[derive(Clone, Debug)]
pub struct EmailConfig {
    /// When false, messages are logged instead of sent.
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env_flag("SMTP_ENABLED", false),
            smtp_host: env_or("SMTP_HOST", "localhost"),
            smtp_port: env_parse("SMTP_PORT", 1025),
            smtp_username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env_or("FROM_EMAIL", "noreply@coursehub.dev"),
            from_name: env_or("FROM_NAME", "CourseHub"),
        }
    }
}
