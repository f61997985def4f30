//! Error types for Framescope

use thiserror::Error;

/// Main error type for Framescope operations
#[derive(Debug, Error)]
pub enum FramescopeError {
    /// Page loading errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    /// Parsing/serialization errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    /// JavaScript engine errors (not user evaluation failures)
    #[error("JavaScript error: {0}")]
    JavaScript(#[from] JsError),
    /// Message bridge errors
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
    /// Cross-context access errors
    #[error("Access error: {0}")]
    Access(#[from] AccessError),
    /// An action the embedded document does not permit
    #[error("Capability denied: {0}")]
    CapabilityDenied(String),
    /// Address could not be turned into a loadable URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Settings could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Page loading errors
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Request could not be completed
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    /// Server answered with a non-success status
    #[error("HTTP {0} for {1}")]
    Http(u16, String),
    /// No loader knows about this address
    #[error("no page registered for {0}")]
    NotFound(String),
}

/// Rendering-specific errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// HTML parsing error
    #[error("HTML parse error: {0}")]
    HtmlParse(String),
    /// Referenced node does not exist in the document
    #[error("node {0} not found")]
    NodeNotFound(u64),
}

/// JavaScript engine errors
#[derive(Debug, Error)]
pub enum JsError {
    /// Script execution error
    #[error("execution failed: {0}")]
    Execution(String),
    /// A global could not be installed
    #[error("failed to register {0}")]
    Registration(String),
}

/// Message bridge errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Message could not be serialized
    #[error("failed to encode message: {0}")]
    Encode(String),
    /// Envelope is malformed or carries an unknown type tag
    #[error("failed to decode message: {0}")]
    Decode(String),
    /// The receiving context is gone
    #[error("message channel closed")]
    Closed,
}

/// Cross-context access errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// No document is loaded in the frame
    #[error("frame is not loaded")]
    FrameNotLoaded,
    /// Host may not touch the frame's document directly
    #[error("blocked a frame with origin {frame} from being accessed by {host}")]
    CrossOrigin { host: String, frame: String },
    /// No agent is listening inside the frame
    #[error("no active session in frame")]
    NoSession,
}

/// Convenience Result type for Framescope operations
pub type Result<T> = std::result::Result<T, FramescopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_error_display() {
        let err: FramescopeError = AccessError::CrossOrigin {
            host: "https://tools.local".into(),
            frame: "https://example.com".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Access error: blocked a frame with origin https://example.com from being accessed by https://tools.local"
        );
    }

    #[test]
    fn test_bridge_error_from() {
        let err: FramescopeError = BridgeError::Closed.into();
        assert!(matches!(err, FramescopeError::Bridge(BridgeError::Closed)));
    }
}
