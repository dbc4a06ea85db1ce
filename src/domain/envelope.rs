use serde::{Deserialize, Serialize};

/// Error payload carried by a failed [`Envelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub service: String,
    pub message: String,
    pub status: u16,
}

impl ApiError {
    pub fn new(service: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            service: service.into(),
            message: message.into(),
            status,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.service, self.status, self.message)
    }
}

/// Uniform result wrapper returned by every gateway operation.
///
/// Callers branch on `success` only. `error` is set exactly when `success`
/// is false, and `data` exactly when it is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ApiError>,
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self::with_status(data, 200)
    }

    pub fn created(data: T) -> Self {
        Self::with_status(data, 201)
    }

    pub fn with_status(data: T, status: u16) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status,
            message: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            status: error.status,
            message: Some(error.message.clone()),
            error: Some(error),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            status: self.status,
            message: self.message,
        }
    }

    /// Collapse into a `Result`, treating a malformed success (no data) as an error.
    pub fn into_result(self, service: &str) -> Result<T, ApiError> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (_, _, Some(error)) => Err(error),
            (true, None, None) => Err(ApiError::new(
                service,
                "envelope reported success without data",
                502,
            )),
            (false, _, None) => Err(ApiError::new(
                service,
                self.message
                    .unwrap_or_else(|| "envelope reported failure without error".into()),
                self.status,
            )),
        }
    }
}
