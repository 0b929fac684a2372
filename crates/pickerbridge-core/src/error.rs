// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pickerbridge.

use thiserror::Error;

/// Top-level error type for every operation that crosses the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Dispatch errors --
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    #[error("operation `{operation}` takes {expected} argument(s), got {actual}")]
    ArityMismatch {
        operation: String,
        expected: usize,
        actual: usize,
    },

    // -- Marshaling errors --
    #[error("type mismatch at `{path}`: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("unsupported value at `{path}`: {found} cannot cross the bridge")]
    UnsupportedType { path: String, found: String },

    // -- Listener bookkeeping --
    #[error("cannot remove {requested} listener(s): only {live} registered")]
    Underflow { requested: u64, live: u64 },

    // -- Lifecycle --
    #[error("bridge has been torn down")]
    BridgeClosed,

    // -- Handler / platform --
    #[error("invalid picker options: {0}")]
    InvalidOptions(String),

    #[error("date picker presenter failed: {0}")]
    Presenter(String),

    #[error("native date picker not available on this platform")]
    PlatformUnavailable,

    // -- Configuration --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Coarse classification of a `BridgeError`, used by hosts to decide how loudly
/// to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The two sides disagree about the module's shape (stale binding).
    Binding,
    /// The caller passed bad arguments and can retry with corrected ones.
    Argument,
    /// Listener add/remove calls are unbalanced on the scripting side.
    Bookkeeping,
    /// Call arrived after the bridge was torn down.
    Lifecycle,
    /// The native side could not do the work.
    Platform,
}

impl ErrorClass {
    /// Whether the caller can succeed by correcting its own input.
    pub fn is_recoverable(self) -> bool {
        matches!(self, ErrorClass::Argument)
    }
}

/// Classify a `BridgeError` into an `ErrorClass`.
pub fn classify_error(err: &BridgeError) -> ErrorClass {
    match err {
        BridgeError::UnknownOperation(_) => ErrorClass::Binding,

        BridgeError::ArityMismatch { .. }
        | BridgeError::TypeMismatch { .. }
        | BridgeError::UnsupportedType { .. }
        | BridgeError::InvalidOptions(_) => ErrorClass::Argument,

        BridgeError::Underflow { .. } => ErrorClass::Bookkeeping,

        BridgeError::BridgeClosed => ErrorClass::Lifecycle,

        BridgeError::Presenter(_)
        | BridgeError::PlatformUnavailable
        | BridgeError::Io(_)
        | BridgeError::Serialization(_) => ErrorClass::Platform,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marshaling_errors_are_recoverable() {
        let err = BridgeError::TypeMismatch {
            path: "count".into(),
            expected: "integer".into(),
            found: "string".into(),
        };
        assert_eq!(classify_error(&err), ErrorClass::Argument);
        assert!(classify_error(&err).is_recoverable());
    }

    #[test]
    fn unknown_operation_is_a_binding_error() {
        let err = BridgeError::UnknownOperation("closePicker".into());
        assert_eq!(classify_error(&err), ErrorClass::Binding);
        assert!(!classify_error(&err).is_recoverable());
    }

    #[test]
    fn underflow_and_closed_are_not_recoverable() {
        let underflow = BridgeError::Underflow {
            requested: 3,
            live: 1,
        };
        assert_eq!(classify_error(&underflow), ErrorClass::Bookkeeping);
        assert!(!classify_error(&underflow).is_recoverable());
        assert_eq!(classify_error(&BridgeError::BridgeClosed), ErrorClass::Lifecycle);
    }

    #[test]
    fn messages_name_the_field_path() {
        let err = BridgeError::UnsupportedType {
            path: "props.onConfirm".into(),
            found: "function".into(),
        };
        assert!(err.to_string().contains("props.onConfirm"));
    }
}
