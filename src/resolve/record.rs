use crate::{
    error::{Error, Result},
    resolved::ResolvedRecordSchema,
    schema::{RecordSchema, Schema, SchemaField, SchemaKind, SchemaRef},
};

use super::PrepareJob;

impl PrepareJob {
    /// Reconciles writer record with reader record.
    ///
    /// Output fields are the writer's, in writer order, each resolved
    /// against itself. Fields known only to the reader are not added
    /// and no field set differences are reported here.
    pub(super) fn prepare_record(
        &mut self,
        node: &SchemaRef,
        writer: &RecordSchema,
        reader: &SchemaRef,
    ) -> Result<SchemaRef> {
        if reader.as_record().is_none() {
            return Err(Error::SchemaMismatch {
                writer: SchemaKind::Record,
                reader: reader.kind(),
            });
        }

        self.build_cyclic(node, |job| {
            let fields = job.reconcile_fields(writer)?;
            Ok(Schema::Resolved(ResolvedRecordSchema::new(
                writer.with_fields(fields),
                reader.clone(),
            )))
        })
    }

    fn reconcile_fields(&mut self, writer: &RecordSchema) -> Result<Vec<SchemaField>> {
        writer
            .fields
            .iter()
            .map(|field| {
                Ok(SchemaField {
                    name: field.name.clone(),
                    doc: field.doc.clone(),
                    default: field.default.clone(),
                    ty: self.prepare(&field.ty, &field.ty)?,
                })
            })
            .collect()
    }
}
