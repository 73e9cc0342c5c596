use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

pub type RelayResult<T> = Result<T, RelayError>;

/// Ways a contact submission can fail. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("email provider rejected the message with status {status}")]
    UpstreamRejected { status: u16, body: String },
    #[error("unexpected failure: {0}")]
    UnexpectedException(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingField(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamRejected { .. } | RelayError::UnexpectedException(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the browser. Details stay in the server log.
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::MissingField(_) => "Missing required fields",
            RelayError::UpstreamRejected { .. } => "Failed to send email",
            RelayError::UnexpectedException(_) => "Server error",
        }
    }
}

/// Failures that stop the relay from starting or keep it from serving.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("building email transport: {0}")]
    Transport(#[source] RelayError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::MissingField(field) => warn!(field, "contact submission rejected"),
            RelayError::UpstreamRejected { status, body } => {
                warn!(status, %body, "email provider rejected contact enquiry")
            }
            RelayError::UnexpectedException(detail) => error!(%detail, "contact relay failed"),
        }

        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}
