//! Error types for nesting, path optimization and program generation.

use std::path::PathBuf;
use thiserror::Error;

/// Error codes reported to callers that only understand numeric status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// File not found (-1)
    FileNotFound = -1,
    /// Empty file (-2)
    EmptyFile = -2,
    /// Job file could not be decoded (-3)
    ParseError = -3,
    /// Nothing scheduled for nesting (-11)
    EmptySchedule = -11,
    /// No stock sheet available (-12)
    NoStock = -12,
    /// Schedule references a part that does not exist (E100)
    UnknownPart = 100,
    /// A strike lies outside machine travel (E101)
    OutOfTravel = 101,
    /// Settings are inconsistent (E200)
    InvalidSettings = 200,
}

/// Main error type for the CAM pipeline.
#[derive(Debug, Error)]
pub enum CamError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Empty file: {path}")]
    EmptyFile { path: PathBuf },

    #[error("Invalid job file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No parts scheduled for nesting")]
    EmptySchedule,

    #[error("No stock sheets available")]
    NoStock,

    #[error("Part reference not found: {part_id}")]
    UnknownPart { part_id: String },

    #[error("Strike at ({x}, {y}) is outside machine travel ({x_min}..{x_max}, {y_min}..{y_max})")]
    OutOfTravel {
        x: f64,
        y: f64,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },

    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CamError {
    /// Get the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CamError::FileNotFound { .. } => ErrorCode::FileNotFound,
            CamError::EmptyFile { .. } => ErrorCode::EmptyFile,
            CamError::Json(_) => ErrorCode::ParseError,
            CamError::EmptySchedule => ErrorCode::EmptySchedule,
            CamError::NoStock => ErrorCode::NoStock,
            CamError::UnknownPart { .. } => ErrorCode::UnknownPart,
            CamError::OutOfTravel { .. } => ErrorCode::OutOfTravel,
            CamError::InvalidSettings { .. } => ErrorCode::InvalidSettings,
            CamError::Io(_) => ErrorCode::FileNotFound,
        }
    }

    /// Get the numeric error code value.
    pub fn code_value(&self) -> i32 {
        self.code() as i32
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, CamError>;
