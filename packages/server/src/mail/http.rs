use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use super::{MailError, MailMessage, Mailer};
use crate::config::MailConfig;

#[derive(Debug, Serialize)]
struct Sender<'a> {
    name: &'a str,
    address: &'a str,
}

/// Request body accepted by the transactional mail API.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: Sender<'a>,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Delivers mail through a JSON-over-HTTP transactional mail API
/// authenticated with a bearer key.
#[derive(Debug)]
pub struct HttpMailer {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    from_name: String,
    from_address: String,
}

impl HttpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or(MailError::NotConfigured("mail.endpoint"))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or(MailError::NotConfigured("mail.api_key"))?;

        debug!(%endpoint, "HTTP mailer initialized");

        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()?,
            endpoint,
            api_key,
            from_name: config.from_name.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let body = SendRequest {
            from: Sender {
                name: &self.from_name,
                address: &self.from_address,
            },
            to: &message.to,
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %detail, to = %message.to, "Mail provider rejected message");
            return Err(MailError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(to = %message.to, "Mail accepted by provider");
        Ok(())
    }
}
