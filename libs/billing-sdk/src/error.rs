use billing_types::ErrorCode;
use thiserror::Error;

/// SDK-specific errors.
#[derive(Debug, Error)]
pub enum BillingSdkError {
    /// Transport failure: DNS, connect, timeout, malformed body
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API answered with a non-2xx status
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
