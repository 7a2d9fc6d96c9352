//! Error types for model access, relation assignment and document codecs.
//!
//! Every failure is a local validation failure reported to the caller as soon
//! as it is detected. Nothing in this crate retries.
//!
//! | Error | Raised by | Fatal |
//! |-------|-----------|-------|
//! | UnknownAttribute | strict attribute reads | only in strict mode |
//! | UndeclaredRelation | relation get/set | yes |
//! | TypeMismatch | relation set | yes |
//! | MalformedDocument | XML parsing | yes |
//! | IndexOutOfBounds | collection reads | yes |
//! | Cast | attribute reads | yes |

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::cast::Cast;

/// The error type for every fallible operation in this crate.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A strict read asked for an attribute the schema does not know and the
    /// document does not contain.
    #[error("unknown attribute '{attribute}' on {model}")]
    UnknownAttribute { model: String, attribute: String },

    /// The relation is declared neither as has-one nor as has-many.
    #[error("relation '{relation}' is not declared on {model}")]
    UndeclaredRelation { model: String, relation: String },

    /// A relation was assigned a value of an incompatible shape.
    #[error("type mismatch for relation '{relation}': expected {expected}, found {found}")]
    TypeMismatch {
        relation: String,
        expected: String,
        found: String,
    },

    /// The text handed to the XML parser is not a well-formed document.
    #[error("malformed document at byte {position}: {message}")]
    MalformedDocument { position: u64, message: String },

    /// Positional read past the end of a collection.
    #[error("index {index} out of bounds for collection of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A raw value could not be converted by the declared cast.
    #[error("cannot cast attribute '{attribute}' value '{value}' as {cast}")]
    Cast {
        attribute: String,
        cast: Cast,
        value: String,
    },

    /// Writing a node back to text failed.
    #[error("failed to render document: {0}")]
    Render(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
