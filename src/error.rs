// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose extraction pipeline.

use std::fmt;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PoseError>;

/// Main error type for the pose extraction pipeline.
///
/// All variants are fatal at the level they occur: a `VideoOpen` or
/// `ModelLoad` error aborts the run before any frame is processed, and
/// `Io`/`Serialize` errors abort the final document write. Per-frame
/// detection failures are absorbed by the detector and never surface here.
#[derive(Debug)]
pub enum PoseError {
    /// Error loading the ONNX pose model.
    ModelLoad(String),
    /// Error during model inference.
    Inference(String),
    /// The input video could not be opened or decoded at all.
    VideoOpen(String),
    /// Error processing image data.
    Image(String),
    /// Invalid configuration provided.
    Config(String),
    /// IO error with context (file not found, permission denied, etc.).
    IoMsg(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
    /// Error serializing or deserializing a pose document.
    Serialize(String),
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoad(msg) => write!(f, "Model load error: {msg}"),
            Self::Inference(msg) => write!(f, "Inference error: {msg}"),
            Self::VideoOpen(msg) => write!(f, "Video open error: {msg}"),
            Self::Image(msg) => write!(f, "Image error: {msg}"),
            Self::Config(msg) => write!(f, "Config error: {msg}"),
            Self::IoMsg(msg) => write!(f, "IO error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::Serialize(msg) => write!(f, "Serialize error: {msg}"),
        }
    }
}

impl std::error::Error for PoseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for PoseError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

impl From<serde_json::Error> for PoseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoseError::ModelLoad("test".to_string());
        assert_eq!(err.to_string(), "Model load error: test");

        let err = PoseError::VideoOpen("test".to_string());
        assert_eq!(err.to_string(), "Video open error: test");
    }

    #[test]
    fn test_io_error_source() {
        let err = PoseError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
