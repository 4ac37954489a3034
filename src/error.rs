use thiserror::Error;

/// Every failure a fetch or send can end in. The message is what the user sees.
#[derive(Debug, Error)]
pub enum GlanceError {
    #[error("{key} is missing. Please add it to your environment or .env file.")]
    Configuration { key: &'static str },

    #[error("{0}")]
    NotFound(String),

    #[error("Error fetching {what}: {detail}")]
    Upstream { what: &'static str, detail: String },

    #[error("Error parsing {what} data.")]
    Parse { what: &'static str, detail: String },

    #[error("{0}")]
    Input(String),

    #[error("Failed to send email: {0}")]
    Delivery(String),
}

impl GlanceError {
    pub fn input(msg: impl Into<String>) -> Self {
        GlanceError::Input(msg.into())
    }

    pub fn delivery(cause: impl std::fmt::Display) -> Self {
        GlanceError::Delivery(cause.to_string())
    }
}
