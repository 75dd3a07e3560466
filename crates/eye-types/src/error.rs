//! Validation error type for untrusted plan input.

use thiserror::Error;

/// A plan failed strict decoding or structural validation.
///
/// `path` points at the offending location in the submitted document
/// (`"$"` for decode-level failures, `"steps[2].emit"` style for
/// structural ones); `reason` says what was wrong there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema error at {path}: {reason}")]
pub struct SchemaError {
    /// Location of the violation in the submitted document.
    pub path: String,
    /// Human-readable description of the violation.
    pub reason: String,
}

impl SchemaError {
    /// Convenience constructor.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
