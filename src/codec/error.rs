use thiserror::Error;

/// Errors produced while encoding or decoding token records.
///
/// None of these are transient: they indicate a caller bug or a buffer
/// that does not match the metadata it is decoded with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The record handed to the encoder violates a data-model invariant
    #[error("invalid token record: {0}")]
    InvalidRecord(String),

    /// The decoder ran past the end of the buffer
    #[error("input exhausted at bit {bit_offset}")]
    ExhaustedInput { bit_offset: usize },

    /// The record-kind header bit names a kind this codec cannot handle
    #[error("unsupported record kind")]
    UnsupportedRecordKind,

    /// A value cannot be represented by the varint coder or the record's integer width
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),
}

impl CodecError {
    pub(crate) fn invalid_record(message: impl Into<String>) -> Self {
        CodecError::InvalidRecord(message.into())
    }

    pub(crate) fn out_of_range(message: impl Into<String>) -> Self {
        CodecError::ValueOutOfRange(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
