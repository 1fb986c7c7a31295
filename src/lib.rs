//!
//! Schema resolution and per-type decode plans for Avro-style binary records.
//!
//! A writer schema describes how data was encoded, a reader schema describes
//! the shape the caller wants back. [`prepare_resolving`] turns such a pair
//! into an immutable resolved graph, [`prepare`] does the same when both
//! schemas are one and the same.
//!
//! Resolved records hand out [`DecodePlan`]s for concrete destination types.
//! A plan lists every writer field in wire order, together with the index of
//! the destination field that receives it, or nothing when the value is read
//! only to keep the cursor aligned. Plans are compiled once per destination
//! type and cached on the resolved record.
//!
//! Schema evolution is limited to adding and removing fields of the
//! outermost record. Nested positions always resolve against themselves.
//!
#![forbid(unsafe_code)]

#[cfg(all(test, feature = "derive"))]
extern crate self as avro_prepare;

mod cache;
mod decode;
mod encode;
mod error;
mod introspect;
mod plan;
mod resolve;
mod resolved;
mod schema;
mod value;
mod varint;

#[cfg(test)]
mod tests;

pub use self::{
    decode::{
        decode_value, specific_decoder, Cursor, DecodeError, DecodeFn, DEFAULT_MAX_DEPTH,
        MAX_ZERO_WIDTH_ITEMS,
    },
    encode::Encoder,
    error::{Error, Result},
    introspect::{
        decode_nested, field_index, record_from_value, Destination, FieldIndex, TypeShape,
    },
    plan::{DecodePlan, FieldStep},
    resolve::{prepare, prepare_resolving},
    resolved::ResolvedRecordSchema,
    schema::{
        ArraySchema, EnumSchema, FixedSchema, MapSchema, RecordSchema, RecursiveSchema, Schema,
        SchemaField, SchemaKind, SchemaRef, UnionSchema,
    },
    value::{FromValue, Value},
};

#[cfg(feature = "derive")]
pub use avro_prepare_proc::Destination;

// Exports for proc-macro.
#[doc(hidden)]
pub mod private {
    pub use core::{
        default::Default,
        primitive::{str, usize},
        result::Result,
    };
}
