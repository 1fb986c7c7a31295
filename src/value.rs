use std::collections::HashMap;

use crate::{
    decode::{decode_value, min_encoded_len, read_branch, Cursor, DecodeError},
    schema::Schema,
};

/// Decoded datum.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Fixed(Vec<u8>),

    /// Symbol index and symbol.
    Enum(u32, String),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),

    /// Branch index and the value of that branch.
    Union(u32, Box<Value>),

    /// Fields in writer order.
    Record(Vec<(String, Value)>),
}

impl Value {
    /// Short name of the value kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Fixed(_) => "fixed",
            Value::Enum(..) => "enum",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Union(..) => "union",
            Value::Record(_) => "record",
        }
    }

    /// Looks up a field of a record value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

/// Conversion from decoded value into a destination field type.
///
/// Union values convert through their active branch.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, DecodeError>;

    /// Reads value of the schema from the cursor.
    ///
    /// Goes through [`Value`] unless overridden.
    /// Containers read their items with `read` of the item type,
    /// so nested destinations are decoded with their own plans.
    #[inline]
    fn read(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Self::from_value(decode_value(schema, cursor)?)
    }
}

#[cold]
#[inline(never)]
fn unexpected<T>(expected: &'static str, found: &Value) -> Result<T, DecodeError> {
    Err(DecodeError::UnexpectedValue {
        expected,
        found: found.kind_name(),
    })
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl FromValue for $ty {
                #[inline]
                fn from_value(value: Value) -> Result<Self, DecodeError> {
                    match value {
                        Value::$variant(value) => Ok(value),
                        Value::Union(_, value) => Self::from_value(*value),
                        other => unexpected(stringify!($ty), &other),
                    }
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Boolean,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
}

impl FromValue for Value {
    #[inline(always)]
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(()),
            Value::Union(_, value) => Self::from_value(*value),
            other => unexpected("()", &other),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Bytes(bytes) | Value::Fixed(bytes) => Ok(bytes),
            Value::Union(_, value) => Self::from_value(*value),
            other => unexpected("Vec<u8>", &other),
        }
    }
}

impl<T> FromValue for Vec<T>
where
    T: FromValue,
{
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            Value::Union(_, value) => Self::from_value(*value),
            other => unexpected("Vec", &other),
        }
    }

    fn read(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let Schema::Array(array) = schema else {
            return Self::from_value(decode_value(schema, cursor)?);
        };

        let mut items = Vec::new();
        cursor.read_blocks(min_encoded_len(&array.items), |cursor| {
            items.push(T::read(&array.items, cursor)?);
            Ok(())
        })?;
        Ok(items)
    }
}

impl<T> FromValue for HashMap<String, T>
where
    T: FromValue,
{
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| Ok((key, T::from_value(value)?)))
                .collect(),
            Value::Union(_, value) => Self::from_value(*value),
            other => unexpected("HashMap", &other),
        }
    }

    fn read(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let Schema::Map(map) = schema else {
            return Self::from_value(decode_value(schema, cursor)?);
        };

        let mut entries = HashMap::new();
        let width = min_encoded_len(&map.values).saturating_add(1);
        cursor.read_blocks(width, |cursor| {
            let key = cursor.read_string()?.to_owned();
            entries.insert(key, T::read(&map.values, cursor)?);
            Ok(())
        })?;
        Ok(entries)
    }
}

/// `null` and unions whose active branch is `null` become `None`.
impl<T> FromValue for Option<T>
where
    T: FromValue,
{
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(None),
            Value::Union(_, value) if *value == Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }

    fn read(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        match schema {
            Schema::Null => Ok(None),
            Schema::Union(union) => cursor.nested(|cursor| {
                let (_, branch) = read_branch(union, cursor)?;
                match **branch {
                    Schema::Null => Ok(None),
                    _ => T::read(branch, cursor).map(Some),
                }
            }),
            _ => T::read(schema, cursor).map(Some),
        }
    }
}

/// Index of an enum symbol.
impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Enum(index, _) => Ok(index),
            Value::Union(_, value) => Self::from_value(*value),
            other => unexpected("u32", &other),
        }
    }
}
