use thiserror::Error;

/// Failure talking to the aqms api.
///
/// One type covers every transport failure: unreachable host, non-2xx
/// status, or a body that does not fit the requested type. Callers that
/// need to branch use `status` / `code`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
}

pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const DECODE_ERROR: &str = "DECODE_ERROR";

impl ApiError {
    pub fn http(message: impl Into<String>, status: u16, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            code: Some(code.into()),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: Some(NETWORK_ERROR.to_string()),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            message: format!("unexpected response: {}", message.into()),
            status: None,
            code: Some(DECODE_ERROR.to_string()),
        }
    }

    /// true when the server was never reached
    pub fn is_network(&self) -> bool {
        self.code.as_deref() == Some(NETWORK_ERROR)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::network(e.to_string())
    }
}
