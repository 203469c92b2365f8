use thiserror::Error;

/// Errors surfaced by the remote platform gateway.
///
/// `Transport` covers network faults and timeouts, `Auth` covers rejected
/// credentials (HTTP 401/403). Both are non-fatal to process state and
/// retryable by the user.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse API response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Parse(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}
