//! Error types for record encoding and decoding.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding records.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Record bytes ended before a complete value could be read.
    #[error("unexpected end of record data at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where the data ran out.
        offset: usize,
    },

    /// The wire kind code is not one this build understands.
    ///
    /// Unknown *tags* are skipped; an unknown *kind code* cannot be
    /// skipped because its payload length is undefined.
    #[error("unknown value kind code: {code:#04x}")]
    UnknownKindCode {
        /// The unrecognized kind code.
        code: u8,
    },

    /// A text field contained invalid UTF-8.
    #[error("invalid UTF-8 in text field (tag {tag})")]
    InvalidUtf8 {
        /// Tag of the offending field.
        tag: u16,
    },

    /// No schema is registered under this type identifier.
    #[error("unknown record type: {type_id}")]
    UnknownTypeId {
        /// The unregistered type identifier.
        type_id: u16,
    },

    /// Two schemas were registered under the same type identifier.
    #[error("duplicate record type registration: {type_id} ({existing} vs {incoming})")]
    DuplicateTypeId {
        /// The contested type identifier.
        type_id: u16,
        /// Name of the schema already registered.
        existing: String,
        /// Name of the schema being registered.
        incoming: String,
    },

    /// A retired type identifier was reused.
    #[error("type identifier {type_id} is retired and may not be reused (schema {name})")]
    ReservedTypeId {
        /// The retired type identifier.
        type_id: u16,
        /// Name of the schema that attempted the registration.
        name: String,
    },

    /// A schema declared the same field tag twice.
    #[error("schema {name} declares field tag {tag} more than once")]
    DuplicateFieldTag {
        /// Name of the invalid schema.
        name: String,
        /// The repeated tag.
        tag: u16,
    },

    /// A schema default does not match its declared field kind.
    #[error("schema {name} field tag {tag}: default kind does not match declared kind")]
    DefaultKindMismatch {
        /// Name of the invalid schema.
        name: String,
        /// The offending tag.
        tag: u16,
    },
}
