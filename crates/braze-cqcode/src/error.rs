//! Error types for the CQ-code codec.
//!
//! Every condition here is local and recoverable: the bulk message-level
//! conversions downgrade per-element failures to skips, and the top-level
//! "decode anything" entry points never fail at all.

use thiserror::Error;

/// Errors produced by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input is not a bracketed CQ marker and the requested target is
    /// not a text variant.
    #[error("invalid cq code")]
    InvalidCode,

    /// A segment was decoded into a media variant whose kind tag does not
    /// match. Name-matching fields have still been applied to the target.
    #[error("wrong media type: expected {expected}, got {actual}")]
    WrongMediaType {
        /// Kind tag of the requested target variant.
        expected: &'static str,
        /// Kind tag carried by the segment.
        actual: String,
    },

    /// A face name or id outside the bundled table.
    #[error("unknown face")]
    UnknownFace,
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
