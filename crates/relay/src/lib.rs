//! Contact-form relay for the Telaura storefront.
//!
//! Accepts enquiries on `POST /api/contact`, validates them and forwards them
//! as transactional email through the Brevo API.

pub mod config;
pub mod error;
pub mod routes;
pub mod submission;
pub mod transport;

use std::{path::PathBuf, sync::Arc};

use tracing::info;

pub use config::{ConfigError, Mailbox, RelayConfig};
pub use error::{RelayError, RelayResult, ServeError};
pub use routes::{router, RelayState};
pub use submission::{ContactEnquiry, ContactSubmission};
pub use transport::{BrevoTransport, EmailTransport, OutboundEmail};

/// Binds the configured address and serves the relay until the process exits.
pub async fn serve(config: RelayConfig, static_dir: Option<PathBuf>) -> Result<(), ServeError> {
    let transport = BrevoTransport::new(&config).map_err(ServeError::Transport)?;
    let bind = config.bind;
    let app = router(RelayState::new(config, Arc::new(transport)), static_dir);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "contact relay listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serve_reports_an_occupied_address() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = RelayConfig::from_lookup(|key| match key {
            "BREVO_API_KEY" => Some("key".to_string()),
            "BREVO_SENDER_EMAIL" => Some("site@telaura.test".to_string()),
            "BREVO_SENDER_NAME" => Some("Telaura Website".to_string()),
            "BREVO_TO_EMAIL" => Some("owner@telaura.test".to_string()),
            _ => None,
        })
        .unwrap();
        config.bind = taken.local_addr().unwrap();

        let err = serve(config, None).await.unwrap_err();
        assert!(matches!(err, ServeError::Io(_)), "unexpected error: {err}");
    }
}
