/// Declares a destination struct with hand-written `Destination`
/// and `FromValue` impls.
macro_rules! destination {
    ($name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        #[derive(Debug, Default, PartialEq)]
        pub(crate) struct $name {
            $(pub $field: $ty,)*
        }

        impl crate::Destination for $name {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field),)*];

            fn set_field(
                &mut self,
                index: usize,
                value: crate::Value,
            ) -> Result<(), crate::DecodeError> {
                let mut idx = 0usize;
                $(
                    if index == idx {
                        self.$field = <$ty as crate::FromValue>::from_value(value)?;
                        return Ok(());
                    }
                    idx += 1;
                )*
                let _ = idx;
                Err(crate::DecodeError::FieldIndex(index))
            }

            fn decode_field(
                &mut self,
                index: usize,
                step: &crate::FieldStep,
                cursor: &mut crate::Cursor<'_>,
            ) -> Result<(), crate::DecodeError> {
                let mut idx = 0usize;
                $(
                    if index == idx {
                        self.$field = <$ty as crate::FromValue>::read(step.schema(), cursor)?;
                        return Ok(());
                    }
                    idx += 1;
                )*
                let _ = idx;
                Err(crate::DecodeError::FieldIndex(index))
            }
        }

        impl crate::FromValue for $name {
            fn from_value(value: crate::Value) -> Result<Self, crate::DecodeError> {
                crate::record_from_value(value)
            }

            fn read(
                schema: &crate::Schema,
                cursor: &mut crate::Cursor<'_>,
            ) -> Result<Self, crate::DecodeError> {
                crate::decode_nested(schema, cursor)
            }
        }
    };
}

mod resolve;

use std::{collections::BTreeMap, sync::Arc};

use crate::{ArraySchema, RecordSchema, Schema, SchemaRef};

destination!(A { a: i64 });
destination!(Ac { a: i64, c: i64 });
destination!(Acz { a: i64, c: i64, z: String });

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Record with `long` fields of the given names.
fn long_record(name: &str, fields: &[&str]) -> SchemaRef {
    fields
        .iter()
        .fold(RecordSchema::new(name), |record, field| {
            record.field(*field, Schema::long())
        })
        .into_schema()
}

/// `Node { value: long, next: [null, Node] }`
fn linked_list() -> SchemaRef {
    Arc::new_cyclic(|this| {
        Schema::Record(
            RecordSchema::new("Node")
                .field("value", Schema::long())
                .field("next", Schema::union([Schema::null(), Schema::recursive("Node", this)])),
        )
    })
}

/// `Tree { label: string, children: array<Tree> }`
fn tree() -> SchemaRef {
    Arc::new_cyclic(|this| {
        Schema::Record(
            RecordSchema::new("Tree")
                .field("label", Schema::string())
                .field("children", Schema::array(Schema::recursive("Tree", this))),
        )
    })
}

/// `Lists = array<[null, Lists]>`
fn nested_lists() -> SchemaRef {
    Arc::new_cyclic(|this| {
        Schema::Array(ArraySchema {
            properties: BTreeMap::new(),
            items: Schema::union([Schema::null(), Schema::recursive("Lists", this)]),
        })
    })
}

/// Renders the shape of a schema graph, stopping at recursive edges.
fn describe(schema: &Schema) -> String {
    match schema {
        Schema::Record(_) | Schema::Resolved(_) => {
            let record = schema.as_record().unwrap();
            let fields = record
                .fields
                .iter()
                .map(|field| format!("{}:{}", field.name, describe(&field.ty)))
                .collect::<Vec<_>>();
            format!("{}{{{}}}", record.name, fields.join(","))
        }
        Schema::Union(union) => {
            let types = union.types.iter().map(|ty| describe(ty)).collect::<Vec<_>>();
            format!("[{}]", types.join("|"))
        }
        Schema::Array(array) => format!("array<{}>", describe(&array.items)),
        Schema::Map(map) => format!("map<{}>", describe(&map.values)),
        Schema::Recursive(recursive) => format!("@{}", recursive.name()),
        other => other.to_string(),
    }
}
