use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::{
    config::{Mailbox, RelayConfig},
    error::{RelayError, RelayResult},
    submission::ContactEnquiry,
};

/// Message body accepted by the transactional email API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEmail {
    pub sender: Mailbox,
    pub to: Vec<Mailbox>,
    pub reply_to: Mailbox,
    pub subject: String,
    pub html_content: String,
}

impl OutboundEmail {
    /// Addresses the enquiry to the fixed recipient with the visitor as reply-to.
    pub fn compose(config: &RelayConfig, enquiry: &ContactEnquiry) -> Self {
        Self {
            sender: config.sender.clone(),
            to: vec![config.recipient.clone()],
            reply_to: Mailbox {
                email: enquiry.email.clone(),
                name: enquiry.name.clone(),
            },
            subject: config.subject.clone(),
            html_content: enquiry.html_body(),
        }
    }
}

/// Delivers one email, at most once.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> RelayResult<()>;
}

/// HTTP transport for the Brevo SMTP API.
#[derive(Debug, Clone)]
pub struct BrevoTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl BrevoTransport {
    pub fn new(config: &RelayConfig) -> RelayResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("telaura-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::UnexpectedException(format!("http client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl EmailTransport for BrevoTransport {
    async fn send(&self, email: &OutboundEmail) -> RelayResult<()> {
        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(email)
            .send()
            .await
            .map_err(|e| RelayError::UnexpectedException(format!("email request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::UpstreamRejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "email provider accepted message");
        Ok(())
    }
}
