//! Error types for PF_KEY operations.

use std::io;

/// Result type for PF_KEY operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding, decoding or exchanging PF_KEY
/// messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Buffer exhausted mid-read during parsing.
    #[error("short buffer: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes the record needs.
        expected: usize,
        /// Bytes remaining in the buffer.
        actual: usize,
    },

    /// The base header declares more bytes than the read delivered.
    #[error("truncated message: header declares {declared} bytes, buffer holds {actual}")]
    TruncatedMessage {
        /// Byte length claimed by the base header.
        declared: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// An extension's declared length runs past the end of the message.
    #[error("truncated extension (type {ext_type})")]
    TruncatedExtension {
        /// The extension type whose record was cut short.
        ext_type: u16,
    },

    /// An extension type outside the RFC 2367 set this codec knows.
    #[error("unknown extension type {ext_type}")]
    UnknownExtension {
        /// The unrecognized type code.
        ext_type: u16,
    },

    /// Structurally invalid extension: zero word length, bad sockaddr
    /// family, and similar.
    #[error("malformed extension: {0}")]
    MalformedExtension(String),

    /// The kernel replied with a nonzero errno that is not the DUMP
    /// terminator.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value carried in the reply's base header.
        errno: i32,
        /// Human-readable description of the errno.
        message: String,
    },

    /// Serialization was requested for an extension this codec does not
    /// emit (PROPOSAL, X_POLICY, SUPPORTED tables).
    #[error("serialization of extension type {ext_type} is not implemented")]
    NotImplemented {
        /// The extension type that cannot be written.
        ext_type: u16,
    },

    /// Invalid message structure (wrong version, nonsense length field).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl Error {
    /// Create a kernel error from the errno byte of a reply header.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(errno).to_string();
        Self::Kernel { errno, message }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Check if this is a "not found" kernel error (ENOENT).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Kernel { errno, .. } if *errno == libc::ENOENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        let err = Error::from_errno(libc::ENOENT);
        assert!(err.is_not_found());
        assert_eq!(err.errno(), Some(2));
        assert!(err.to_string().contains("errno 2"));
    }

    #[test]
    fn test_errno_only_on_kernel_errors() {
        let err = Error::UnknownExtension { ext_type: 42 };
        assert_eq!(err.errno(), None);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::Truncated {
            expected: 16,
            actual: 6,
        };
        assert_eq!(err.to_string(), "short buffer: expected 16 bytes, got 6");

        let err = Error::NotImplemented { ext_type: 13 };
        assert_eq!(
            err.to_string(),
            "serialization of extension type 13 is not implemented"
        );
    }
}
