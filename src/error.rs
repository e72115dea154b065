// Crate-wide error type.
//
// Every failure is fatal for the buffer being processed: the codec never
// retries or returns partial documents, so batch callers can tally
// per-file outcomes.

use thiserror::Error;

/// Result alias used throughout xnbkit.
pub type Result<T> = std::result::Result<T, XnbError>;

#[derive(Debug, Error)]
pub enum XnbError {
    /// The first three bytes are not `XNB`.
    #[error("invalid file magic: expected \"XNB\", found {found:?}")]
    InvalidMagic { found: [u8; 3] },

    /// Declared total file size differs from the actual input length.
    #[error("file has been truncated: header declares {declared} bytes, input has {actual}")]
    TruncatedFile { declared: u32, actual: usize },

    /// Chunk framing or LZX/LZ4 bitstream is invalid.
    #[error("corrupt compressed data: {0}")]
    CorruptCompressedData(String),

    /// Structurally invalid uncompressed content (bad varuint, bad UTF-8).
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// A format feature this codec does not implement (shared resources, ...).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A type name that cannot be resolved to a reader.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A dispatch index of zero or beyond the reader table.
    #[error("invalid reader index {index} (reader table has {count} entries)")]
    InvalidReaderIndex { index: u32, count: usize },

    /// A cursor movement or read past either end of the buffer.
    #[error("buffer access out of bounds: offset {offset}, length {len}")]
    OutOfBounds { offset: i64, len: usize },

    /// An export placeholder is missing required fields or has the wrong kind.
    #[error("invalid export: {0}")]
    InvalidExport(String),

    /// A value handed to a writer does not match the reader's type.
    #[error("value mismatch: expected {expected}, found {found}")]
    ValueMismatch { expected: String, found: String },

    /// The JSON representation of a document is malformed.
    #[error("invalid JSON document: {0}")]
    Json(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XnbError {
    pub(crate) fn mismatch(expected: impl ToString, found: impl ToString) -> Self {
        Self::ValueMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
