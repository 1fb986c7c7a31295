use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Weak},
};

use crate::{
    error::{Error, Result},
    resolved::ResolvedRecordSchema,
    value::Value,
};

/// Shared handle to a schema node.
///
/// Nodes are compared by identity of the allocation, not by structure.
pub type SchemaRef = Arc<Schema>;

/// Tag of a schema node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Fixed,
    Enum,
    Record,
    Array,
    Map,
    Union,
    Recursive,
}

impl SchemaKind {
    /// Lowercase name of the kind as used by schema definitions.
    pub const fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Fixed => "fixed",
            SchemaKind::Enum => "enum",
            SchemaKind::Record => "record",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Union => "union",
            SchemaKind::Recursive => "recursive",
        }
    }
}

impl fmt::Display for SchemaKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema node.
///
/// Input graphs are built from every variant except `Resolved`,
/// which only appears in the output of resolution and stands for a record.
#[derive(Debug)]
pub enum Schema {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Fixed(FixedSchema),
    Enum(EnumSchema),
    Record(RecordSchema),
    Array(ArraySchema),
    Map(MapSchema),
    Union(UnionSchema),
    Recursive(RecursiveSchema),
    Resolved(ResolvedRecordSchema),
}

impl Schema {
    /// Returns the kind of this node.
    /// Resolved records report [`SchemaKind::Record`].
    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Null => SchemaKind::Null,
            Schema::Boolean => SchemaKind::Boolean,
            Schema::Int => SchemaKind::Int,
            Schema::Long => SchemaKind::Long,
            Schema::Float => SchemaKind::Float,
            Schema::Double => SchemaKind::Double,
            Schema::Bytes => SchemaKind::Bytes,
            Schema::String => SchemaKind::String,
            Schema::Fixed(_) => SchemaKind::Fixed,
            Schema::Enum(_) => SchemaKind::Enum,
            Schema::Record(_) | Schema::Resolved(_) => SchemaKind::Record,
            Schema::Array(_) => SchemaKind::Array,
            Schema::Map(_) => SchemaKind::Map,
            Schema::Union(_) => SchemaKind::Union,
            Schema::Recursive(_) => SchemaKind::Recursive,
        }
    }

    /// Returns name of a named schema.
    pub fn name(&self) -> Option<&str> {
        match self {
            Schema::Fixed(fixed) => Some(&fixed.name),
            Schema::Enum(enumeration) => Some(&enumeration.name),
            Schema::Record(record) => Some(&record.name),
            Schema::Resolved(resolved) => Some(resolved.name()),
            Schema::Recursive(recursive) => Some(recursive.name()),
            _ => None,
        }
    }

    /// Returns record definition of this node.
    ///
    /// Resolved records yield their writer record,
    /// so they can be used wherever a record is expected.
    pub fn as_record(&self) -> Option<&RecordSchema> {
        match self {
            Schema::Record(record) => Some(record),
            Schema::Resolved(resolved) => Some(resolved.writer()),
            _ => None,
        }
    }

    /// Returns resolved record if this node is one.
    pub fn as_resolved(&self) -> Option<&ResolvedRecordSchema> {
        match self {
            Schema::Resolved(resolved) => Some(resolved),
            _ => None,
        }
    }

    /// Checks that both handles point to the same node.
    #[inline(always)]
    pub fn ptr_eq(a: &SchemaRef, b: &SchemaRef) -> bool {
        Arc::ptr_eq(a, b)
    }

    pub fn null() -> SchemaRef {
        Arc::new(Schema::Null)
    }

    pub fn boolean() -> SchemaRef {
        Arc::new(Schema::Boolean)
    }

    pub fn int() -> SchemaRef {
        Arc::new(Schema::Int)
    }

    pub fn long() -> SchemaRef {
        Arc::new(Schema::Long)
    }

    pub fn float() -> SchemaRef {
        Arc::new(Schema::Float)
    }

    pub fn double() -> SchemaRef {
        Arc::new(Schema::Double)
    }

    pub fn bytes() -> SchemaRef {
        Arc::new(Schema::Bytes)
    }

    pub fn string() -> SchemaRef {
        Arc::new(Schema::String)
    }

    pub fn fixed(name: impl Into<String>, size: usize) -> SchemaRef {
        Arc::new(Schema::Fixed(FixedSchema {
            name: name.into(),
            size,
        }))
    }

    pub fn enumeration<I, S>(name: impl Into<String>, symbols: I) -> SchemaRef
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Schema::Enum(EnumSchema {
            name: name.into(),
            symbols: symbols.into_iter().map(Into::into).collect(),
        }))
    }

    pub fn array(items: SchemaRef) -> SchemaRef {
        Arc::new(Schema::Array(ArraySchema {
            properties: BTreeMap::new(),
            items,
        }))
    }

    pub fn map(values: SchemaRef) -> SchemaRef {
        Arc::new(Schema::Map(MapSchema {
            properties: BTreeMap::new(),
            values,
        }))
    }

    pub fn union(types: impl IntoIterator<Item = SchemaRef>) -> SchemaRef {
        Arc::new(Schema::Union(UnionSchema {
            types: types.into_iter().collect(),
        }))
    }

    /// Creates a reference to a schema that is still under construction.
    ///
    /// Use inside [`Arc::new_cyclic`] to express self-referential types.
    pub fn recursive(name: impl Into<String>, actual: &Weak<Schema>) -> SchemaRef {
        Arc::new(Schema::Recursive(RecursiveSchema::new(name, actual.clone())))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} {}", self.kind(), name),
            None => fmt::Display::fmt(&self.kind(), f),
        }
    }
}

/// Record definition.
///
/// Field order is the wire order.
#[derive(Clone, Debug)]
pub struct RecordSchema {
    pub name: String,
    pub doc: Option<String>,
    pub fields: Vec<SchemaField>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        RecordSchema {
            name: name.into(),
            doc: None,
            fields: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Appends a field without default value.
    pub fn field(mut self, name: impl Into<String>, ty: SchemaRef) -> Self {
        self.fields.push(SchemaField::new(name, ty));
        self
    }

    /// Appends a field with default value.
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        ty: SchemaRef,
        default: Value,
    ) -> Self {
        let mut field = SchemaField::new(name, ty);
        field.default = Some(default);
        self.fields.push(field);
        self
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn into_schema(self) -> SchemaRef {
        Arc::new(Schema::Record(self))
    }

    /// Copy of name and doc with different fields.
    pub(crate) fn with_fields(&self, fields: Vec<SchemaField>) -> Self {
        RecordSchema {
            name: self.name.clone(),
            doc: self.doc.clone(),
            fields,
        }
    }
}

/// Field of a record.
#[derive(Clone, Debug)]
pub struct SchemaField {
    pub name: String,
    pub doc: Option<String>,

    /// Declared default. Carried through resolution, never injected.
    pub default: Option<Value>,
    pub ty: SchemaRef,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, ty: SchemaRef) -> Self {
        SchemaField {
            name: name.into(),
            doc: None,
            default: None,
            ty,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FixedSchema {
    pub name: String,
    pub size: usize,
}

#[derive(Clone, Debug)]
pub struct EnumSchema {
    pub name: String,
    pub symbols: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ArraySchema {
    pub properties: BTreeMap<String, String>,
    pub items: SchemaRef,
}

#[derive(Clone, Debug)]
pub struct MapSchema {
    pub properties: BTreeMap<String, String>,
    pub values: SchemaRef,
}

/// Alternatives of a union.
/// Position of an alternative is its tag on the wire.
#[derive(Clone, Debug)]
pub struct UnionSchema {
    pub types: Vec<SchemaRef>,
}

/// Placeholder for a schema that refers to itself.
///
/// The reference is weak, so cyclic graphs never keep themselves alive.
#[derive(Clone)]
pub struct RecursiveSchema {
    name: String,
    actual: Weak<Schema>,
}

impl RecursiveSchema {
    pub fn new(name: impl Into<String>, actual: Weak<Schema>) -> Self {
        RecursiveSchema {
            name: name.into(),
            actual,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema this node stands for.
    pub fn actual(&self) -> Result<SchemaRef> {
        match self.actual.upgrade() {
            Some(actual) => Ok(actual),
            None => Err(Error::DanglingReference {
                name: self.name.clone(),
            }),
        }
    }

    /// Checks that this node refers to `schema`.
    pub fn points_to(&self, schema: &SchemaRef) -> bool {
        core::ptr::eq(self.actual.as_ptr(), Arc::as_ptr(schema))
    }

    /// Address of the target, valid even while the target is being built.
    #[inline(always)]
    pub(crate) fn target(&self) -> *const Schema {
        self.actual.as_ptr()
    }
}

impl fmt::Debug for RecursiveSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecursiveSchema").field(&self.name).finish()
    }
}
