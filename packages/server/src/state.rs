use std::sync::Arc;

use common::storage::{ObjectKey, ObjectStore};
use sea_orm::DatabaseConnection;

use crate::captcha::CaptchaVerifier;
use crate::config::AppConfig;
use crate::mail::Mailer;
use crate::utils::rate_limit::LoginRateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ObjectStore>,
    pub mailer: Arc<dyn Mailer>,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AppState {
    /// URL recorded for a stored object.
    pub fn object_url(&self, key: &ObjectKey) -> String {
        format!(
            "{}/{}",
            self.config.storage.public_base_url.trim_end_matches('/'),
            key.as_str()
        )
    }

    pub fn otp_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.config.otp.ttl_minutes)
    }
}
