use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::CaptchaConfig;

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("captcha transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("captcha secret is not configured")]
    NotConfigured,
}

/// Checks a client-supplied CAPTCHA response token.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Whether a token must be supplied at all.
    fn required(&self) -> bool;

    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, CaptchaError>;
}

/// Accepts everything. Used when CAPTCHA checks are switched off.
pub struct DisabledCaptcha;

#[async_trait]
impl CaptchaVerifier for DisabledCaptcha {
    fn required(&self) -> bool {
        false
    }

    async fn verify(&self, _token: &str, _remote_ip: Option<&str>) -> Result<bool, CaptchaError> {
        Ok(true)
    }
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// reCAPTCHA `siteverify` client.
pub struct RecaptchaVerifier {
    http: reqwest::Client,
    verify_url: String,
    secret: String,
}

impl RecaptchaVerifier {
    pub fn from_config(config: &CaptchaConfig) -> Result<Self, CaptchaError> {
        let secret = config.secret.clone().ok_or(CaptchaError::NotConfigured)?;
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()?,
            verify_url: config.verify_url.clone(),
            secret,
        })
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    fn required(&self) -> bool {
        true
    }

    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, CaptchaError> {
        let mut form = vec![("secret", self.secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response: SiteVerifyResponse = self
            .http
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.success {
            debug!(error_codes = ?response.error_codes, "CAPTCHA token rejected");
        }
        Ok(response.success)
    }
}

pub fn build_verifier(
    config: &CaptchaConfig,
) -> Result<std::sync::Arc<dyn CaptchaVerifier>, CaptchaError> {
    if config.enabled {
        Ok(std::sync::Arc::new(RecaptchaVerifier::from_config(config)?))
    } else {
        Ok(std::sync::Arc::new(DisabledCaptcha))
    }
}
