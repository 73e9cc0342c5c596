/// Result alias that carries the custom [`GalleryError`] type.
pub type Result<T> = std::result::Result<T, GalleryError>;

/// Common error type for the carousel engine.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// Free-form failure raised by a host or fetcher implementation.
    #[error("{0}")]
    Message(String),
    /// A configuration value or caller argument is out of range.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The caption font could not be loaded or parsed.
    #[error("caption font: {0}")]
    Font(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// An image could not be decoded or encoded.
    #[error("{0}")]
    Image(#[from] image::ImageError),
    /// A JSON config or manifest could not be parsed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl GalleryError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for GalleryError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for GalleryError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
