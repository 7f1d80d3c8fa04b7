//! Error types for the JSON log target

pub type Result<T> = std::result::Result<T, TargetError>;

#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Mask path that cannot be parsed
    #[error("Invalid mask path '{path}': {message}")]
    InvalidMaskPath { path: String, message: String },

    /// File exporter error with path
    #[error("File exporter error for '{path}': {message}")]
    FileExporterError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// File lock error
    #[error("Failed to acquire file lock on '{path}'")]
    FileLockError { path: String },

    /// Exporter error (generic)
    #[error("Exporter '{exporter}' failed: {message}")]
    ExporterError { exporter: String, message: String },

    /// Ambient state lookup failed (session, user, request)
    #[error("Ambient service '{service}' unavailable: {message}")]
    ServiceUnavailable { service: String, message: String },

    /// Channel send error
    #[error("Failed to hand batch to background exporter")]
    ChannelSendError,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl TargetError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        TargetError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        TargetError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an invalid mask path error
    pub fn mask_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        TargetError::InvalidMaskPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file exporter error
    pub fn file_exporter(path: impl Into<String>, message: impl Into<String>) -> Self {
        TargetError::FileExporterError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        TargetError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file lock error
    pub fn file_lock(path: impl Into<String>) -> Self {
        TargetError::FileLockError { path: path.into() }
    }

    /// Create an exporter error
    pub fn exporter(exporter: impl Into<String>, message: impl Into<String>) -> Self {
        TargetError::ExporterError {
            exporter: exporter.into(),
            message: message.into(),
        }
    }

    /// Create an ambient service error
    pub fn service_unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        TargetError::ServiceUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TargetError::Other(msg.into())
    }
}
