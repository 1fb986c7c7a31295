use core::any::{type_name, TypeId};
use std::sync::Arc;

use hashbrown::{hash_map::Entry, HashMap};
use parking_lot::RwLock;

use crate::{
    cache::TypeIdHasherBuilder,
    decode::{decode_value, read_branch, Cursor, DecodeError},
    plan::FieldStep,
    schema::Schema,
    value::Value,
};

/// Type that decoded records can be stored into.
///
/// Fields are addressed by position in [`Destination::FIELDS`].
///
/// Users may `derive(Destination)` for structs with named fields
/// when `derive` feature is enabled.
pub trait Destination: 'static {
    /// Names of the fields that can receive values.
    const FIELDS: &'static [&'static str];

    /// Stores value into the field at `index`.
    fn set_field(&mut self, index: usize, value: Value) -> Result<(), DecodeError>;

    /// Decodes the field at `index` straight from the cursor.
    ///
    /// The default goes through [`Value`] and [`Destination::set_field`].
    /// Derived impls read every field with [`FromValue::read`],
    /// so nested destinations are decoded with their own plans.
    ///
    /// [`FromValue::read`]: crate::FromValue::read
    fn decode_field(
        &mut self,
        index: usize,
        step: &FieldStep,
        cursor: &mut Cursor<'_>,
    ) -> Result<(), DecodeError> {
        let value = step.decode(cursor)?;
        self.set_field(index, value)
    }
}

/// Decodes a destination that sits inside another value.
///
/// Resolved records decode with their cached plan for `T`.
/// Recursive edges and union branches are followed.
/// Anything else is decoded into [`Value`] and converted with
/// [`record_from_value`].
pub fn decode_nested<T>(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<T, DecodeError>
where
    T: Destination + Default,
{
    match schema {
        Schema::Resolved(record) => record.decode(cursor),
        Schema::Recursive(recursive) => decode_nested(&*recursive.actual()?, cursor),
        Schema::Union(union) => cursor.nested(|cursor| {
            let (_, branch) = read_branch(union, cursor)?;
            decode_nested(branch, cursor)
        }),
        _ => record_from_value(decode_value(schema, cursor)?),
    }
}

/// Fills a default `T` from a record value, matching fields by name.
///
/// Record fields `T` has no place for are ignored.
pub fn record_from_value<T>(value: Value) -> Result<T, DecodeError>
where
    T: Destination + Default,
{
    match value {
        Value::Record(fields) => {
            let index = field_index(&TypeShape::of::<T>());
            let mut target = T::default();
            for (name, value) in fields {
                if let Some(idx) = index.get(&name) {
                    target.set_field(idx, value)?;
                }
            }
            Ok(target)
        }
        Value::Union(_, value) => record_from_value(*value),
        other => Err(DecodeError::UnexpectedValue {
            expected: "record",
            found: other.kind_name(),
        }),
    }
}

/// Descriptor of a destination type.
#[derive(Clone, Copy, Debug)]
pub struct TypeShape {
    id: TypeId,
    name: &'static str,
    fields: &'static [&'static str],
}

impl TypeShape {
    /// Returns descriptor of `T`.
    #[inline(always)]
    pub fn of<T>() -> Self
    where
        T: Destination,
    {
        TypeShape {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            fields: T::FIELDS,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.fields
    }
}

/// Field name to field index lookup for one destination type.
#[derive(Debug)]
pub struct FieldIndex {
    names: HashMap<&'static str, usize, ahash::RandomState>,
}

impl FieldIndex {
    fn new(fields: &'static [&'static str]) -> Self {
        let mut names = HashMap::with_capacity_and_hasher(fields.len(), Default::default());
        for (index, &name) in fields.iter().enumerate() {
            // First declaration wins.
            names.entry(name).or_insert(index);
        }
        FieldIndex { names }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Returns field lookup of the destination type.
///
/// Built on first request for a type and shared afterwards.
pub fn field_index(shape: &TypeShape) -> Arc<FieldIndex> {
    let cache = FIELD_INDEXES.read();
    if let Some(index) = cache.get(&shape.id) {
        return index.clone();
    }

    drop(cache);
    new_field_index(shape)
}

#[cold]
fn new_field_index(shape: &TypeShape) -> Arc<FieldIndex> {
    let index = Arc::new(FieldIndex::new(shape.fields));

    let mut cache = FIELD_INDEXES.write();
    match cache.entry(shape.id) {
        Entry::Occupied(entry) => entry.get().clone(),
        Entry::Vacant(entry) => entry.insert(index).clone(),
    }
}

type FieldIndexes = HashMap<TypeId, Arc<FieldIndex>, TypeIdHasherBuilder>;

static FIELD_INDEXES: RwLock<FieldIndexes> =
    parking_lot::const_rwlock(HashMap::with_hasher(TypeIdHasherBuilder));
