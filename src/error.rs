//! Error types for symbol sampling and scanning

use thiserror::Error;

/// Result type alias using the crate's [`DecodeError`]
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Failure of a single decode attempt.
///
/// Every variant is terminal for the attempt that produced it. Callers that
/// try several symbologies against the same detection inspect [`DecodeError::kind`]
/// to decide whether another variant is worth trying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Malformed input: out-of-range access, undersized matrix, degenerate points
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Well-formed input that does not match the declared symbol layout
    #[error("Format error: {0}")]
    Format(String),

    /// Row scanning could not settle on a consistent symbol structure
    #[error("Detection error: {0}")]
    Detection(String),

    /// Row metadata codewords disagree beyond tolerance
    #[error("Checksum error: {0}")]
    Checksum(String),
}

/// Coarse classification of a [`DecodeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    /// See [`DecodeError::Geometry`]
    Geometry,
    /// See [`DecodeError::Format`]
    Format,
    /// See [`DecodeError::Detection`]
    Detection,
    /// See [`DecodeError::Checksum`]
    Checksum,
}

impl DecodeError {
    /// Classification of this error
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::Geometry(_) => DecodeErrorKind::Geometry,
            DecodeError::Format(_) => DecodeErrorKind::Format,
            DecodeError::Detection(_) => DecodeErrorKind::Detection,
            DecodeError::Checksum(_) => DecodeErrorKind::Checksum,
        }
    }

    pub(crate) fn geometry(msg: impl Into<String>) -> Self {
        DecodeError::Geometry(msg.into())
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        DecodeError::Format(msg.into())
    }

    pub(crate) fn detection(msg: impl Into<String>) -> Self {
        DecodeError::Detection(msg.into())
    }

    pub(crate) fn checksum(msg: impl Into<String>) -> Self {
        DecodeError::Checksum(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            DecodeError::geometry("a"),
            DecodeError::format("b"),
            DecodeError::detection("c"),
            DecodeError::checksum("d"),
        ];
        for (i, a) in errors.iter().enumerate() {
            for (j, b) in errors.iter().enumerate() {
                assert_eq!(i == j, a.kind() == b.kind());
            }
        }
    }

    #[test]
    fn test_display_includes_message() {
        let err = DecodeError::format("region 1 clock track broken");
        assert_eq!(err.to_string(), "Format error: region 1 clock track broken");
    }
}
