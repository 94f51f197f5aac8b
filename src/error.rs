//! Error types for orrery.
//!
//! This module provides error types for body graph edits, parameter
//! persistence, capture sessions, and snapshot export.

use std::fmt;

/// Errors that can occur when editing the body graph.
#[derive(Debug)]
pub enum BodyError {
    /// A body was asked to orbit itself.
    SelfParent {
        /// Index of the offending body.
        index: usize,
    },
    /// An index does not name an existing body.
    OutOfRange {
        /// The requested index.
        index: usize,
        /// Current number of bodies.
        len: usize,
    },
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyError::SelfParent { index } => {
                write!(f, "Body {} cannot be its own parent", index)
            }
            BodyError::OutOfRange { index, len } => {
                write!(f, "Body index {} is out of range ({} bodies exist)", index, len)
            }
        }
    }
}

impl std::error::Error for BodyError {}

/// Errors that can occur while saving or loading parameter files.
#[derive(Debug)]
pub enum PersistError {
    /// Failed to read or write the file.
    Io(std::io::Error),
    /// The JSON was malformed or did not match the parameter schema.
    Json(serde_json::Error),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "Failed to access parameter file: {}", e),
            PersistError::Json(e) => write!(f, "Failed to parse parameters: {}", e),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(e) => Some(e),
            PersistError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Io(e)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Json(e)
    }
}

/// Error reported by a [`CaptureSink`](crate::capture::CaptureSink)
/// implementation.
///
/// Sinks wrap whatever goes wrong on their side (encoder failures, disk
/// errors) in a message; the engine treats every sink error as recoverable.
#[derive(Debug)]
pub struct SinkError {
    message: String,
}

impl SinkError {
    /// Create a sink error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capture sink failed: {}", self.message)
    }
}

impl std::error::Error for SinkError {}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        SinkError::new(e.to_string())
    }
}

impl From<image::ImageError> for SinkError {
    fn from(e: image::ImageError) -> Self {
        SinkError::new(e.to_string())
    }
}

/// Errors that can occur when starting a capture session.
#[derive(Debug)]
pub enum CaptureError {
    /// A capture session is already running.
    AlreadyActive,
    /// The sink refused to start; no session was created.
    Sink(SinkError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::AlreadyActive => {
                write!(f, "A capture session is already in progress")
            }
            CaptureError::Sink(e) => write!(f, "Capture could not start: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Sink(e) => Some(e),
            CaptureError::AlreadyActive => None,
        }
    }
}

impl From<SinkError> for CaptureError {
    fn from(e: SinkError) -> Self {
        CaptureError::Sink(e)
    }
}

/// Errors that can occur when exporting a still image.
#[derive(Debug)]
pub enum SnapshotError {
    /// Another long-running operation holds the scene.
    Busy(&'static str),
    /// The render pipeline does not expose rendered frames.
    FrameUnavailable,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Busy(op) => {
                write!(f, "Cannot save an image while {} is in progress", op)
            }
            SnapshotError::FrameUnavailable => {
                write!(f, "The render pipeline did not return a frame. Use a pipeline that implements capture_frame().")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Error produced when a color string does not parse.
#[derive(Debug, Clone)]
pub struct ParseColorError {
    input: String,
}

impl ParseColorError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid color '{}', expected '#rrggbb'", self.input)
    }
}

impl std::error::Error for ParseColorError {}
