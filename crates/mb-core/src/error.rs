//! Unified error type for mediabridge.
//!
//! All crates funnel their failures into [`Error`], which carries enough
//! context for a bridge layer to derive a stable, machine-readable code via
//! [`Error::code`].

use std::fmt;

use crate::ids::Handle;

/// Boxed error produced by caller-supplied sinks (upload functions, chunk
/// callbacks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type covering all failure modes in mediabridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The referenced resource could not be opened.
    #[error("Open error [{uri}]: {reason}")]
    Open {
        /// The URI that was passed to `open`.
        uri: String,
        /// Human-readable reason (missing file, permission, scheme, ...).
        reason: String,
    },

    /// The handle is not a currently open registry entry.
    #[error("Invalid handle: {0}")]
    InvalidHandle(Handle),

    /// The underlying I/O failed mid-read.
    #[error("Read error on handle {handle}: {source}")]
    Read {
        /// Handle being read.
        handle: Handle,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A chunk could not be delivered after exhausting all retry attempts.
    #[error("Upload error at offset {offset} after {attempts} attempt(s): {source}")]
    Upload {
        /// Offset of the chunk that failed.
        offset: u64,
        /// Number of attempts made for that chunk.
        attempts: u32,
        /// The last underlying cause.
        #[source]
        source: BoxError,
    },

    /// A caller-supplied chunk callback failed.
    #[error("Sink error at offset {offset}: {message}")]
    Sink {
        /// Offset of the chunk being delivered.
        offset: u64,
        /// Human-readable error description.
        message: String,
    },

    /// A selection flow is already outstanding on this selector.
    #[error("A media selection is already in progress")]
    SelectionInProgress,

    /// The platform picker backend failed.
    #[error("Picker error: {0}")]
    Picker(String),

    /// A base64 payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Request data or configuration failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation outside a handle read failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable error code surfaced to bridge callers.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Open { .. } => "E_OPEN",
            Error::InvalidHandle(_) => "E_INVALID_HANDLE",
            Error::Read { .. } => "E_READ",
            Error::Upload { .. } => "E_UPLOAD",
            Error::Sink { .. } => "E_SINK",
            Error::SelectionInProgress => "E_SELECTION_IN_PROGRESS",
            Error::Picker(_) => "E_PICKER",
            Error::Decode(_) => "E_DECODE",
            Error::Validation(_) => "E_VALIDATION",
            Error::Io { .. } => "E_IO",
            Error::Internal(_) => "E_INTERNAL",
        }
    }

    /// Convenience constructor for [`Error::Open`].
    pub fn open(uri: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Open {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Read`].
    pub fn read(handle: Handle, source: std::io::Error) -> Self {
        Error::Read { handle, source }
    }

    /// Convenience constructor for [`Error::Upload`].
    pub fn upload(offset: u64, attempts: u32, source: impl Into<BoxError>) -> Self {
        Error::Upload {
            offset,
            attempts,
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Sink`].
    pub fn sink(offset: u64, message: impl fmt::Display) -> Self {
        Error::Sink {
            offset,
            message: message.to_string(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn open_display() {
        let err = Error::open("file:///missing.mp4", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "Open error [file:///missing.mp4]: No such file or directory"
        );
        assert_eq!(err.code(), "E_OPEN");
    }

    #[test]
    fn invalid_handle_display() {
        let err = Error::InvalidHandle(Handle::from_raw(7));
        assert_eq!(err.to_string(), "Invalid handle: 7");
        assert_eq!(err.code(), "E_INVALID_HANDLE");
    }

    #[test]
    fn read_display() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "device gone");
        let err = Error::read(Handle::from_raw(3), io);
        assert!(err.to_string().contains("handle 3"));
        assert!(err.to_string().contains("device gone"));
        assert_eq!(err.code(), "E_READ");
    }

    #[test]
    fn upload_keeps_last_cause() {
        let err = Error::upload(4096, 3, "503 from sink");
        assert_eq!(
            err.to_string(),
            "Upload error at offset 4096 after 3 attempt(s): 503 from sink"
        );
        let cause = err.source().expect("source attached");
        assert_eq!(cause.to_string(), "503 from sink");
        assert_eq!(err.code(), "E_UPLOAD");
    }

    #[test]
    fn sink_display() {
        let err = Error::sink(0, "disk full");
        assert_eq!(err.to_string(), "Sink error at offset 0: disk full");
        assert_eq!(err.code(), "E_SINK");
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.code(), "E_IO");
    }

    #[test]
    fn selection_in_progress_display() {
        let err = Error::SelectionInProgress;
        assert_eq!(err.to_string(), "A media selection is already in progress");
        assert_eq!(err.code(), "E_SELECTION_IN_PROGRESS");
    }
}
