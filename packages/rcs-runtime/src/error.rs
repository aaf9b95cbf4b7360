//! Runtime error types.

use thiserror::Error;

/// Errors raised while building or reading resource blobs.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A read would run past the end of the byte span
    #[error("Read of {len} bytes at offset {offset} exceeds span of {span} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        span: usize,
    },

    /// A self-relative reference resolves outside the byte span
    #[error("Reference at offset {field} with value {value} points outside span of {span} bytes")]
    DanglingReference { field: usize, value: i32, span: usize },

    /// A reference slot that was never assigned
    #[error("Reference at offset {field} is not set")]
    NullReference { field: usize },

    /// Array byte length is not a whole number of elements
    #[error("Array at offset {offset} has byte length {byte_len}, not a multiple of element width {width}")]
    MisalignedArray {
        offset: usize,
        byte_len: usize,
        width: usize,
    },

    /// Resource payload is smaller than its fixed field slots
    #[error("Resource at offset {offset} holds {size} bytes, expected at least {expected}")]
    TooSmall {
        offset: usize,
        size: usize,
        expected: usize,
    },

    /// String data is not valid UTF-8
    #[error("String at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    /// String data does not end with a NUL terminator
    #[error("String at offset {offset} has no terminator")]
    MissingTerminator { offset: usize },

    /// Offset or length no longer fits the 32-bit wire format
    #[error("Capacity overflow during {operation}")]
    CapacityOverflow { operation: &'static str },

    /// I/O error while loading or writing a blob
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
