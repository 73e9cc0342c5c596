use std::{path::PathBuf, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::{
    config::RelayConfig,
    error::{RelayError, RelayResult},
    submission::ContactSubmission,
    transport::{EmailTransport, OutboundEmail},
};

pub const CONTACT_PATH: &str = "/api/contact";

#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<RelayConfig>,
    pub transport: Arc<dyn EmailTransport>,
}

impl RelayState {
    pub fn new(config: RelayConfig, transport: Arc<dyn EmailTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }
}

/// Builds the relay router. When `static_dir` is set, unmatched paths are
/// served from it so the storefront and the relay can share one origin.
pub fn router(state: RelayState, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route(CONTACT_PATH, post(submit_contact))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn submit_contact(
    State(state): State<RelayState>,
    body: Bytes,
) -> RelayResult<impl IntoResponse> {
    let submission: ContactSubmission = serde_json::from_slice(&body)
        .map_err(|e| RelayError::UnexpectedException(format!("malformed request body: {e}")))?;
    let enquiry = submission.validate()?;

    let email = OutboundEmail::compose(&state.config, &enquiry);
    state.transport.send(&email).await?;

    info!(reply_to = %enquiry.email, "contact enquiry relayed");
    Ok(Json(json!({
        "success": true,
        "message": "Email sent successfully",
    })))
}
