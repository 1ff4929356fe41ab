use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SquatError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV report error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Detector error: {0}")]
    DetectorError(#[from] DetectorError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Recording error: {message}")]
    RecordingError { message: String },

    #[error("Frame error: {message}")]
    FrameError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Detector,
    Output,
}

impl SquatError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SquatError::ConfigError { .. }
            | SquatError::ConfigValidationError { .. }
            | SquatError::InvalidConfigValueError { .. }
            | SquatError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SquatError::ImageError(_)
            | SquatError::SerializationError(_)
            | SquatError::RecordingError { .. } => ErrorCategory::Input,
            SquatError::DetectorError(_) => ErrorCategory::Detector,
            SquatError::IoError(_) | SquatError::CsvError(_) | SquatError::FrameError { .. } => {
                ErrorCategory::Output
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SquatError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is not valid: {}", field, reason)
            }
            SquatError::MissingConfigError { field } => {
                format!("Setting '{}' is required", field)
            }
            SquatError::RecordingError { message } => {
                format!("Landmark recording could not be used: {}", message)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML file and command line flags against the documented ranges"
            }
            ErrorCategory::Input => {
                "Make sure frame images are readable and the landmark recording is valid JSON"
            }
            ErrorCategory::Detector => "Check detector settings or switch to --mode static",
            ErrorCategory::Output => "Check that output directories exist and are writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, SquatError>;

/// 取出 panic payload 中的訊息文字
pub fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// 偵測器 adapter 回報的錯誤
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("detector initialization failed: {message}")]
    Initialization { message: String },

    #[error("inference failed: {message}")]
    Inference { message: String },

    #[error("detector panicked: {message}")]
    Panicked { message: String },

    #[error("detector unavailable: {message}")]
    Unavailable { message: String },

    #[error("landmark recording exhausted at frame {index}")]
    RecordingExhausted { index: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("frame buffer of {bytes} bytes cannot hold a {width}x{height} image")]
    BufferMismatch { width: u32, height: u32, bytes: usize },
}

/// Per-frame rejection. The display text is the feedback entry returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum AnalysisError {
    #[error("Invalid or empty frame received")]
    InvalidFrame,

    #[error("Pose landmarks not detected")]
    NoLandmarksDetected,

    #[error("Incomplete landmark data received")]
    IncompleteLandmarks { expected: usize, received: usize },

    #[error("Ensure full body is visible in frame")]
    InsufficientVisibility,

    #[error("Analysis failed: {0}")]
    DetectorFault(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// 已知的判定失敗 (畫面、偵測、可見度)
    Anticipated,
    Unanticipated,
}

impl AnalysisError {
    pub fn category(&self) -> FailureCategory {
        match self {
            AnalysisError::DetectorFault(_) => FailureCategory::Unanticipated,
            _ => FailureCategory::Anticipated,
        }
    }
}

impl From<DetectorError> for AnalysisError {
    fn from(err: DetectorError) -> Self {
        AnalysisError::DetectorFault(err.to_string())
    }
}

impl From<RenderError> for AnalysisError {
    fn from(err: RenderError) -> Self {
        AnalysisError::DetectorFault(err.to_string())
    }
}
