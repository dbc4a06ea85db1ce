use thiserror::Error;

use crate::domain::envelope::ApiError;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// No response was received (connection refused, DNS, timeout).
    #[error("{service}: network error: {reason}")]
    Network {
        service: String,
        reason: String,
        timed_out: bool,
    },

    #[error("{service}: HTTP {status}: {reason}")]
    Http {
        service: String,
        status: u16,
        reason: String,
    },

    #[error("{service}: malformed response: {reason}")]
    MalformedResponse { service: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream rejected a booking. The upstream error is kept verbatim.
    #[error("Booking failed: {}", .0.message)]
    BookingFailure(ApiError),

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn malformed(service: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service: service.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Status code reported in the envelope for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Network {
                timed_out: true, ..
            } => 504,
            Self::Network { .. } => 503,
            Self::Http { status, .. } => *status,
            Self::MalformedResponse { .. } | Self::Json(_) => 502,
            Self::BookingFailure(api) => api.status,
            Self::InvalidRequest { .. } => 400,
            Self::Configuration(_) | Self::Io(_) | Self::Yaml(_) | Self::Url(_) => 500,
        }
    }

    /// Whether a read operation may hand this error to the fallback generator.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::BookingFailure(_))
    }

    pub fn to_api_error(&self, service: &str) -> ApiError {
        match self {
            Self::BookingFailure(api) => api.clone(),
            Self::Network { service: s, .. }
            | Self::Http { service: s, .. }
            | Self::MalformedResponse { service: s, .. } => {
                ApiError::new(s.clone(), self.to_string(), self.status())
            }
            _ => ApiError::new(service, self.to_string(), self.status()),
        }
    }

    /// Reclassify a failed booking attempt; the envelope must surface it.
    #[must_use]
    pub fn into_booking_failure(self, service: &str) -> Self {
        match self {
            Self::BookingFailure(_) | Self::InvalidRequest { .. } => self,
            other => Self::BookingFailure(other.to_api_error(service)),
        }
    }
}
