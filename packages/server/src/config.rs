use std::net::IpAddr;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeployEnv {
    Development,
    Production,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: DeployEnv,
    pub cors: CorsConfig,
    /// Peers whose `X-Forwarded-For` is honoured. Empty means the socket
    /// peer is always the client.
    pub trusted_proxies: Vec<IpAddr>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    /// Set the `Secure` attribute on the session cookie.
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OtpConfig {
    pub ttl_minutes: i64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventConfig {
    /// Fee per team used for revenue figures.
    pub registration_fee: i64,
    /// Days after registration before a presentation counts as late.
    pub submission_window_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_presentation_bytes: u64,
    pub max_screenshot_bytes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub base_path: String,
    /// Prefix joined with the object key to build the file URL stored on records.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    Log,
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub provider: MailProvider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub from_name: String,
    pub from_address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaptchaConfig {
    pub enabled: bool,
    pub secret: Option<String>,
    pub verify_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminBootstrapConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub login_max_attempts: u32,
    pub login_window_secs: u64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub otp: OtpConfig,
    pub event: EventConfig,
    pub upload: UploadConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub captcha: CaptchaConfig,
    pub admin: AdminBootstrapConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Self::defaults()?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., PORTAL__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("PORTAL")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .with_list_parse_key("server.trusted_proxies")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.environment", "development")?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("server.trusted_proxies", Vec::<String>::new())?
            .set_default("auth.session_ttl_hours", 24)?
            .set_default("auth.cookie_secure", false)?
            .set_default("otp.ttl_minutes", 10)?
            .set_default("otp.cleanup_interval_secs", 60)?
            .set_default("event.registration_fee", 600)?
            .set_default("event.submission_window_days", 7)?
            .set_default("upload.max_presentation_bytes", 10 * 1024 * 1024)?
            .set_default("upload.max_screenshot_bytes", 10 * 1024 * 1024)?
            .set_default("storage.base_path", "./data/uploads")?
            .set_default("storage.public_base_url", "/uploads")?
            .set_default("mail.provider", "log")?
            .set_default("mail.from_name", "Hackathon Team")?
            .set_default("mail.from_address", "no-reply@hackathon.local")?
            .set_default("captcha.enabled", false)?
            .set_default(
                "captcha.verify_url",
                "https://www.google.com/recaptcha/api/siteverify",
            )?
            .set_default("admin.name", "Super Admin")?
            .set_default("rate_limit.login_max_attempts", 5)?
            .set_default("rate_limit.login_window_secs", 15 * 60)?
            .set_default("rate_limit.cleanup_interval_secs", 60)
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == DeployEnv::Production
    }
}
