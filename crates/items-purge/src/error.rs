//! Error types for parsing, consistency checking and rewriting save files.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Identifier;

/// Error classes, each mapped to a distinct process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Malformed save syntax
    Parse,
    /// E002: Inconsistent item records
    Consistency,
    /// E003: File system failure
    Io,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::Parse => "E001",
            ErrorCode::Consistency => "E002",
            ErrorCode::Io => "E003",
        }
    }

    /// Returns the process exit code for this class.
    ///
    /// 0 is success and 2 is left to command-line usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::Parse => 3,
            ErrorCode::Consistency => 4,
            ErrorCode::Io => 5,
        }
    }
}

/// Error while tokenizing or parsing a save file.
///
/// Every variant carries the byte offset where the problem was detected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("[E001] unmatched '}}' at offset {offset}")]
    UnbalancedClose { offset: usize },

    #[error("[E001] block opened at offset {offset} is never closed")]
    UnclosedBlock { offset: usize },

    #[error("[E001] field {key:?} at offset {offset} has no value")]
    MissingValue { key: String, offset: usize },

    #[error("[E001] unexpected {found:?} at offset {offset}")]
    UnexpectedToken { found: char, offset: usize },

    #[error("[E001] string starting at offset {offset} is not terminated")]
    UnterminatedString { offset: usize },

    #[error("[E001] block at offset {offset} nested deeper than {max} levels")]
    NestingTooDeep { offset: usize, max: usize },

    #[error("[E001] block {block:?} at offset {offset} has a pile field but no identifier")]
    MissingIdentifier { block: String, offset: usize },

    #[error("[E001] identifier at offset {offset} is empty")]
    InvalidIdentifier { offset: usize },

    #[error("[E001] field {key:?} repeated at offset {offset}")]
    DuplicateField { key: String, offset: usize },

    #[error("[E001] invalid UTF-8 in {field} at offset {offset}")]
    InvalidUtf8 { field: &'static str, offset: usize },

    #[error("[E001] input length {len} exceeds maximum {max}")]
    InputTooLarge { len: usize, max: usize },
}

/// Error raised when item records contradict each other.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("[E002] identifier {id} declared at offsets {first} and {second}")]
    DuplicateIdentifier {
        id: Identifier,
        first: usize,
        second: usize,
    },
}

/// Any failure of a cleaning run.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("[E003] failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CleanError {
    /// Wraps an I/O error with the operation and path it occurred on.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CleanError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns the error class for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CleanError::Parse(_) => ErrorCode::Parse,
            CleanError::Consistency(_) => ErrorCode::Consistency,
            CleanError::Io { .. } => ErrorCode::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [ErrorCode::Parse, ErrorCode::Consistency, ErrorCode::Io];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(a.exit_code(), 0);
            assert_ne!(a.exit_code(), 2);
            for b in &codes[i + 1..] {
                assert_ne!(a.exit_code(), b.exit_code());
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_clean_error_classification() {
        let err: CleanError = ParseError::UnbalancedClose { offset: 4 }.into();
        assert_eq!(err.code(), ErrorCode::Parse);

        let err = CleanError::io(
            "read",
            "items.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), ErrorCode::Io);
        assert!(err.to_string().contains("items.txt"));
    }
}
