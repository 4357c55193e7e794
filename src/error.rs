use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Error, Debug)]
pub enum MoodreelError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("Detection error: {0}")]
    DetectionError(String),

    #[error("Classifier error: {0}")]
    ClassifierError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

/// What the analysis pipeline does when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Drop the current face and keep capturing.
    SkipSample,
    /// Carry on with an empty result for this step.
    DegradeToEmpty,
    /// Abort the whole analysis.
    FailRequest,
}

impl MoodreelError {
    pub fn failure_mode(&self) -> FailureMode {
        match self {
            MoodreelError::ClassifierError(_) => FailureMode::SkipSample,
            MoodreelError::NetworkError(_) => FailureMode::DegradeToEmpty,
            MoodreelError::ParseError(_) => FailureMode::DegradeToEmpty,
            MoodreelError::CaptureError(_) => FailureMode::FailRequest,
            MoodreelError::DetectionError(_) => FailureMode::FailRequest,
            MoodreelError::ConfigError(_) => FailureMode::FailRequest,
            MoodreelError::ServerError(_) => FailureMode::FailRequest,
        }
    }

    /// Looks through a boxed error for a `MoodreelError` and reports its
    /// failure mode; foreign errors fail the request.
    pub fn failure_mode_of(err: &(dyn std::error::Error + Send + Sync + 'static)) -> FailureMode {
        err.downcast_ref::<MoodreelError>()
            .map(MoodreelError::failure_mode)
            .unwrap_or(FailureMode::FailRequest)
    }
}

// Conversion implementations for common error types
impl From<std::io::Error> for MoodreelError {
    fn from(err: std::io::Error) -> Self {
        MoodreelError::CaptureError(err.to_string())
    }
}

impl From<serde_json::Error> for MoodreelError {
    fn from(err: serde_json::Error) -> Self {
        MoodreelError::ParseError(err.to_string())
    }
}

impl From<toml::de::Error> for MoodreelError {
    fn from(err: toml::de::Error) -> Self {
        MoodreelError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for MoodreelError {
    fn from(err: reqwest::Error) -> Self {
        MoodreelError::NetworkError(err.to_string())
    }
}

impl From<image::ImageError> for MoodreelError {
    fn from(err: image::ImageError) -> Self {
        MoodreelError::CaptureError(err.to_string())
    }
}
