use std::{fmt, sync::Arc};

use crate::{
    cache::PlanCache,
    decode::{Cursor, DecodeError},
    error::Result,
    introspect::{Destination, TypeShape},
    plan::DecodePlan,
    schema::{RecordSchema, SchemaField, SchemaRef},
};

/// Record prepared for decoding.
///
/// Holds the writer record with every field type resolved,
/// the reader schema it was reconciled with,
/// and the decode plans compiled so far.
///
/// Immutable apart from the plan cache, which only grows.
pub struct ResolvedRecordSchema {
    writer: RecordSchema,
    reader: SchemaRef,
    plans: PlanCache,
}

impl ResolvedRecordSchema {
    pub(crate) fn new(writer: RecordSchema, reader: SchemaRef) -> Self {
        ResolvedRecordSchema {
            writer,
            reader,
            plans: PlanCache::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.writer.name
    }

    /// Writer record with resolved field types.
    pub fn writer(&self) -> &RecordSchema {
        &self.writer
    }

    /// Writer fields in wire order.
    pub fn fields(&self) -> &[SchemaField] {
        &self.writer.fields
    }

    /// Reader schema this record was reconciled with.
    pub fn reader(&self) -> &SchemaRef {
        &self.reader
    }

    /// Returns decode plan for the destination type described by `shape`.
    ///
    /// The plan is compiled on first request and cached afterwards.
    /// Fails with [`Error::MissingDestinationField`] when the reader schema
    /// declares a writer field the destination type has no place for.
    /// Failures are not cached.
    ///
    /// [`Error::MissingDestinationField`]: crate::Error::MissingDestinationField
    pub fn plan(&self, shape: &TypeShape) -> Result<Arc<DecodePlan>> {
        self.plans
            .get_or_compile(shape.id(), || DecodePlan::compile(self, shape))
    }

    /// Returns decode plan for `T`.
    #[inline]
    pub fn plan_for<T>(&self) -> Result<Arc<DecodePlan>>
    where
        T: Destination,
    {
        self.plan(&TypeShape::of::<T>())
    }

    /// Decodes one record from the cursor into existing value.
    ///
    /// Every writer field is consumed, fields the destination does not store
    /// are decoded and dropped.
    pub fn decode_into<T>(&self, cursor: &mut Cursor<'_>, target: &mut T) -> Result<(), DecodeError>
    where
        T: Destination,
    {
        let plan = self.plan_for::<T>()?;
        cursor.nested(|cursor| plan.execute(cursor, target))
    }

    /// Decodes one record from the cursor into default-constructed value.
    pub fn decode<T>(&self, cursor: &mut Cursor<'_>) -> Result<T, DecodeError>
    where
        T: Destination + Default,
    {
        let mut target = T::default();
        self.decode_into(cursor, &mut target)?;
        Ok(target)
    }
}

impl fmt::Debug for ResolvedRecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedRecordSchema")
            .field("name", &self.writer.name)
            .field("fields", &self.writer.fields)
            .field("reader", &self.reader.name())
            .finish_non_exhaustive()
    }
}
