use std::fmt;

use hashbrown::HashSet;

use crate::{
    decode::{specific_decoder, Cursor, DecodeError, DecodeFn},
    error::{Error, Result},
    introspect::{field_index, Destination, TypeShape},
    resolved::ResolvedRecordSchema,
    schema::{Schema, SchemaRef},
    value::Value,
};

/// Decoding step for one writer field.
pub struct FieldStep {
    schema: SchemaRef,
    name: String,
    target: Option<usize>,
    decode: DecodeFn,
}

impl FieldStep {
    /// Resolved schema of the field.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the destination field receiving the value.
    /// `None` when the value is read only to be discarded.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Reads the field value from the cursor.
    #[inline(always)]
    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
        (self.decode)(&self.schema, cursor)
    }
}

impl fmt::Debug for FieldStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldStep")
            .field("name", &self.name)
            .field("kind", &self.schema.kind())
            .field("target", &self.target)
            .finish()
    }
}

/// Ordered field steps that decode a record into one destination type.
///
/// Steps follow writer field order and cover every writer field.
#[derive(Debug)]
pub struct DecodePlan {
    steps: Vec<FieldStep>,
}

impl DecodePlan {
    pub fn steps(&self) -> &[FieldStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn compile(record: &ResolvedRecordSchema, shape: &TypeShape) -> Result<Self> {
        let index = field_index(shape);

        let reader_fields: HashSet<&str, ahash::RandomState> = record
            .reader()
            .as_record()
            .map(|reader| reader.fields.iter().map(|field| field.name.as_str()).collect())
            .unwrap_or_default();

        let steps = record
            .fields()
            .iter()
            .map(|field| {
                let target = index.get(&field.name);
                if target.is_none() && reader_fields.contains(field.name.as_str()) {
                    return Err(Error::MissingDestinationField {
                        field: field.name.clone(),
                        schema: record.name().to_owned(),
                        type_name: shape.name(),
                    });
                }

                Ok(FieldStep {
                    schema: field.ty.clone(),
                    name: field.name.clone(),
                    target,
                    decode: specific_decoder(&field.ty),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            record = record.name(),
            destination = shape.name(),
            steps = steps.len(),
            discarded = steps.iter().filter(|step| step.target.is_none()).count(),
            "compiled decode plan"
        );

        Ok(DecodePlan { steps })
    }

    /// Runs the plan against the cursor, storing values into `target`.
    pub fn execute<T>(&self, cursor: &mut Cursor<'_>, target: &mut T) -> Result<(), DecodeError>
    where
        T: Destination,
    {
        for step in &self.steps {
            match step.target {
                Some(index) => target.decode_field(index, step, cursor)?,
                None => {
                    step.decode(cursor)?;
                }
            }
        }
        Ok(())
    }

    /// Checks that both plans decode the same way.
    pub fn same_steps(&self, other: &DecodePlan) -> bool {
        self.steps.len() == other.steps.len()
            && self.steps.iter().zip(&other.steps).all(|(a, b)| {
                a.name == b.name && a.target == b.target && Schema::ptr_eq(&a.schema, &b.schema)
            })
    }
}
