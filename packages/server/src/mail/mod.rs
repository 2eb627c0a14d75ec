mod http;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{MailConfig, MailProvider};

pub use http::HttpMailer;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider rejected message with status {status}")]
    Rejected { status: u16 },
    #[error("mail provider not configured: {0}")]
    NotConfigured(&'static str),
}

/// Outbound email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Returns once the provider has accepted the message.
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Writes messages to the log instead of sending them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(to = %message.to, subject = %message.subject, "Mail delivery disabled, logging message");
        debug!(body = %message.text);
        Ok(())
    }
}

pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.provider {
        MailProvider::Log => Ok(Arc::new(LogMailer)),
        MailProvider::Http => Ok(Arc::new(HttpMailer::from_config(config)?)),
    }
}
