//! Unified error types for the command-line surface
//!
//! Engine errors are mapped to stable, serializable error codes so that
//! callers of the tool get a machine-readable failure document.

use crate::eip712::Eip712Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for tool operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidSettings,

    // Typed data errors
    UnknownType,
    InvalidType,
    InvalidPrimaryType,
    MissingField,
    IntegerOutOfRange,
    ArrayLengthMismatch,
    CyclicTypeReference,
    InvalidPrimitiveEncoding,
    InvalidValue,

    // Crypto errors
    InvalidSignature,
    SigningFailed,

    // Parse and I/O errors
    JsonError,
    Io,
}

/// Result type alias for tool operations
pub type ToolResult<T> = Result<T, ToolError>;

impl From<Eip712Error> for ToolError {
    fn from(e: Eip712Error) -> Self {
        let code = match &e {
            Eip712Error::InvalidJson(_) => ErrorCode::JsonError,
            Eip712Error::UnknownType(_) => ErrorCode::UnknownType,
            Eip712Error::InvalidType(_) => ErrorCode::InvalidType,
            Eip712Error::InvalidPrimaryType(_) => ErrorCode::InvalidPrimaryType,
            Eip712Error::MissingField(_) => ErrorCode::MissingField,
            Eip712Error::IntegerOutOfRange { .. } => ErrorCode::IntegerOutOfRange,
            Eip712Error::ArrayLengthMismatch { .. } => ErrorCode::ArrayLengthMismatch,
            Eip712Error::CyclicTypeReference { .. } => ErrorCode::CyclicTypeReference,
            Eip712Error::InvalidPrimitiveEncoding { .. } => ErrorCode::InvalidPrimitiveEncoding,
            Eip712Error::InvalidValue { .. } => ErrorCode::InvalidValue,
            Eip712Error::InvalidSignature(_) => ErrorCode::InvalidSignature,
            Eip712Error::SigningError(_) => ErrorCode::SigningFailed,
            Eip712Error::InvalidSettings(_) => ErrorCode::InvalidSettings,
        };
        ToolError::new(code, e.to_string())
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::new(ErrorCode::Io, e.to_string())
    }
}
