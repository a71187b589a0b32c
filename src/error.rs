//! Error types for CIM-XML decoding, encoding and HTTP framing.

use std::io;

use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised by the codec.
///
/// A protocol-level CIM error (status code + description returned by the
/// agent) is *not* a codec failure; it is carried inside a successfully
/// parsed envelope as [`crate::model::CimError`].
#[derive(Error, Debug)]
pub enum CodecError {
    /// Tokenizer-level failure: unbalanced tags, bad references, content outside the root
    #[error("malformed document at line {line}, column {column}: {message}")]
    MalformedDocument {
        message: String,
        line: u64,
        column: u64,
    },

    /// A literal could not be converted to its declared type
    #[error("malformed {type_name} value {literal:?}: {reason}")]
    MalformedValue {
        type_name: String,
        literal: String,
        reason: String,
    },

    /// A folding rule found the object stack in a shape it cannot handle
    #[error("inconsistent structure at <{element}>: {message}")]
    InconsistentStructure { element: String, message: String },

    /// End of document reached with the object stack not exactly one deep
    #[error("incomplete document: {depth} objects left on the build stack")]
    IncompleteDocument { depth: usize },

    /// Chunk-size or content-length violation
    #[error("framing error: {message}")]
    Framing { message: String },

    /// The object cannot be written as CIM-XML
    #[error("serialize error: {message}")]
    Serialize { message: String },

    /// I/O error from the underlying transport
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl CodecError {
    /// Create a malformed document error at a position
    pub fn malformed_document(message: impl Into<String>, line: u64, column: u64) -> Self {
        Self::MalformedDocument {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a malformed value error
    pub fn malformed_value(
        type_name: impl Into<String>,
        literal: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedValue {
            type_name: type_name.into(),
            literal: literal.into(),
            reason: reason.into(),
        }
    }

    /// Create an inconsistent structure error
    pub fn inconsistent(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InconsistentStructure {
            element: element.into(),
            message: message.into(),
        }
    }

    /// Create a framing error
    pub fn framing(message: impl Into<String>) -> Self {
        Self::Framing {
            message: message.into(),
        }
    }

    /// Create a serialize error
    pub fn serialize(message: impl Into<String>) -> Self {
        Self::Serialize {
            message: message.into(),
        }
    }

    /// Wrap a framing failure in an `io::Error` so stream adapters stay `Read`
    pub(crate) fn framing_io(message: impl Into<String>) -> io::Error {
        Self::framing(message).into_io()
    }

    /// Carry this error through an `io::Error`; `From<io::Error>` takes it back out
    pub(crate) fn into_io(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }

    /// True for tokenizer, builder and type-codec failures (as opposed to transport failures)
    pub fn is_codec_failure(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        // Framing errors travel through io::Error; unwrap them back out.
        if err.kind() == io::ErrorKind::InvalidData
            && err
                .get_ref()
                .map_or(false, |inner| inner.is::<CodecError>())
        {
            if let Some(inner) = err.into_inner() {
                if let Ok(codec) = inner.downcast::<CodecError>() {
                    return *codec;
                }
            }
            return Self::framing("invalid data");
        }
        Self::Io(err)
    }
}
