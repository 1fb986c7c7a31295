use thiserror::Error;

use crate::schema::SchemaKind;

/// Result type for schema resolution and plan compilation.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors produced while resolving schemas or compiling decode plans.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Writer and reader disagree in shape where no reconciliation exists.
    #[error("writer schema is {writer} but reader schema is {reader}")]
    SchemaMismatch {
        writer: SchemaKind,
        reader: SchemaKind,
    },

    /// Reader schema expects a field the destination type cannot store.
    #[error("type {type_name} does not have field `{field}` required for decoding schema {schema}")]
    MissingDestinationField {
        field: String,
        schema: String,
        type_name: &'static str,
    },

    /// Recursive reference whose target schema was already dropped.
    #[error("recursive reference to `{name}` outlived its target schema")]
    DanglingReference { name: String },
}
