use reqwest::StatusCode;
use thiserror::Error;

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Why a gateway call could not complete at the transport level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    RateLimit,
    Auth,
    InvalidRequest,
    ServerError,
    Other,
}

impl TransportKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            429 => Self::RateLimit,
            401 | 403 => Self::Auth,
            400 | 404 | 422 => Self::InvalidRequest,
            500..=599 => Self::ServerError,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway transport error ({kind:?}): {message}")]
    Transport { kind: TransportKind, message: String },

    #[error("gateway response did not match the expected shape: {0}")]
    MalformedResponse(String),

    #[error("gateway response contained no image data")]
    MissingImageData,
}

impl GatewayError {
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else if let Some(status) = err.status() {
            TransportKind::from_status(status)
        } else if err.is_decode() {
            return Self::MalformedResponse(err.to_string());
        } else {
            TransportKind::Other
        };
        Self::Transport {
            kind,
            message: err.to_string(),
        }
    }
}
