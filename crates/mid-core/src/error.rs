//! # Error Types
//!
//! Errors shared by every crate in the workspace. Domain crates wrap these
//! in their own `thiserror` enums rather than re-declaring them.
//!
//! ## Design
//!
//! - Canonicalization errors carry the offending value.
//! - Digest errors are what a malformed proof field turns into. Verification
//!   code maps them to "invalid"; construction code propagates them.
//! - Storage errors keep the underlying `io::Error` or `serde_json::Error`.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Attribute values must be strings, integers, booleans, or null.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A hex-encoded digest or salt could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The input contained non-hex characters or had odd length.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// The decoded value had the wrong number of bytes.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required byte length.
        expected: usize,
        /// Decoded byte length.
        actual: usize,
    },

    /// A proof path carried a different number of elements and sides.
    #[error("path has {elements} elements but {sides} sides")]
    PathLengthMismatch {
        /// Number of sibling digests.
        elements: usize,
        /// Number of side markers.
        sides: usize,
    },

    /// A proof path side marker was not recognised.
    #[error("unknown path side: {0}")]
    UnknownSide(String),
}

/// An identifier failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// Identifier was empty.
    #[error("identifier must not be empty")]
    Empty,

    /// Identifier exceeded the maximum length.
    #[error("identifier too long: {0} chars (max {max})", max = crate::identity::MAX_ID_LEN)]
    TooLong(usize),

    /// Identifier contained a character outside `[A-Za-z0-9_.-]` or began with `.`.
    #[error("identifier {0:?} must match [A-Za-z0-9_.-] and must not start with '.'")]
    InvalidCharacter(String),
}

/// A timestamp string was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The string used an offset other than `Z`.
    #[error("timestamp must use Z suffix (UTC only), got: {0:?}")]
    NotUtc(String),

    /// The string was not RFC 3339.
    #[error("invalid RFC 3339 timestamp {input:?}: {reason}")]
    Invalid {
        /// The rejected input.
        input: String,
        /// Parser message.
        reason: String,
    },
}

/// Persistence failure.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
