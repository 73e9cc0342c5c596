use std::{fmt, net::SocketAddr};

use serde::Serialize;

pub const DEFAULT_API_URL: &str = "https://api.brevo.com/v3/smtp/email";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_SUBJECT: &str = "New Contact Enquiry – Telaura";
pub const RECIPIENT_NAME: &str = "Admin";

/// Name and address pair as the email provider expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    pub email: String,
    pub name: String,
}

/// Fixed sender and recipient settings for the relay.
#[derive(Clone)]
pub struct RelayConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender: Mailbox,
    pub recipient: Mailbox,
    pub subject: String,
    pub bind: SocketAddr,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid bind address `{value}`: {source}")]
    InvalidBind {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error(transparent)]
    Dotenv(#[from] dotenvy::Error),
}

impl RelayConfig {
    /// Reads the relay settings from the process environment, loading `.env` first
    /// when one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().map(|_| ()).or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(()),
            _ => Err(err),
        })?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| optional(key).ok_or(ConfigError::Missing(key));

        let bind_value = optional("TELAURA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_value
            .parse()
            .map_err(|source| ConfigError::InvalidBind {
                value: bind_value.clone(),
                source,
            })?;

        Ok(Self {
            api_url: optional("BREVO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: required("BREVO_API_KEY")?,
            sender: Mailbox {
                email: required("BREVO_SENDER_EMAIL")?,
                name: required("BREVO_SENDER_NAME")?,
            },
            recipient: Mailbox {
                email: required("BREVO_TO_EMAIL")?,
                name: RECIPIENT_NAME.to_string(),
            },
            subject: DEFAULT_SUBJECT.to_string(),
            bind,
        })
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("subject", &self.subject)
            .field("bind", &self.bind)
            .finish()
    }
}
