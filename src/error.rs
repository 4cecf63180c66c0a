//! Vedrfolnir error types

/// Vedrfolnir error types
#[derive(Debug, thiserror::Error)]
pub enum VedrfolnirError {
    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("upstream API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("city not found: {0}")]
    CityNotFound(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl VedrfolnirError {
    /// Whether this error means the requested city does not exist upstream.
    ///
    /// Transport layers use this to distinguish a 404 from a 502-class
    /// upstream failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VedrfolnirError::CityNotFound(_))
    }
}

/// Result type alias for Vedrfolnir operations
pub type Result<T> = std::result::Result<T, VedrfolnirError>;
