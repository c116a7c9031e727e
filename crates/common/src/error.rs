//! Error types shared across Zoomreel crates.

use std::path::PathBuf;

/// Top-level error type for Zoomreel operations.
#[derive(Debug, thiserror::Error)]
pub enum ZoomreelError {
    /// A source frame could not be read or decoded. Fatal for that frame only.
    #[error("Source frame at {timestamp_secs:.3}s unreadable: {message}")]
    SourceFrame { timestamp_secs: f64, message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ZoomreelError.
pub type ZoomreelResult<T> = Result<T, ZoomreelError>;

impl ZoomreelError {
    pub fn source_frame(timestamp_secs: f64, msg: impl Into<String>) -> Self {
        Self::SourceFrame {
            timestamp_secs,
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error only affects the frame being rendered.
    pub fn is_frame_local(&self) -> bool {
        matches!(self, Self::SourceFrame { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_frame_message_includes_timestamp() {
        let err = ZoomreelError::source_frame(1.5, "truncated png");
        assert_eq!(
            err.to_string(),
            "Source frame at 1.500s unreadable: truncated png"
        );
        assert!(err.is_frame_local());
        assert!(!ZoomreelError::render("boom").is_frame_local());
    }
}
