use std::collections::HashMap;

use thiserror::Error;

use crate::{
    error::Error,
    schema::{Schema, SchemaKind, SchemaRef, UnionSchema},
    value::Value,
    varint::{self, VarInt},
};

/// Errors that may occur while decoding values.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The input is smaller than required to decode value.
    #[error("input ended before the value was complete")]
    OutOfBounds,

    /// Integer does not fit the type it is decoded into.
    #[error("integer does not fit the target type")]
    IntegerOverflow,

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBoolean(u8),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("negative length {0}")]
    NegativeLength(i64),

    #[error("union branch {index} is out of range for {count} alternatives")]
    UnionIndex { index: i64, count: usize },

    #[error("enum symbol {index} is out of range for {count} symbols")]
    EnumIndex { index: i32, count: usize },

    /// Destination field cannot hold decoded value.
    #[error("cannot store {found} value into {expected}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },

    /// Destination type has no field with this index.
    #[error("destination field index {0} is out of range")]
    FieldIndex(usize),

    /// Block claims more items than the remaining input can hold.
    #[error("block of {count} items does not fit into {remaining} remaining bytes")]
    BlockLength { count: usize, remaining: usize },

    /// Array or map of zero-width items exceeds the item limit.
    #[error("more than {limit} zero-width items")]
    TooManyItems { limit: usize },

    /// Values are nested deeper than the cursor allows.
    #[error("nesting depth limit {0} exceeded")]
    DepthLimit(usize),

    #[error(transparent)]
    Schema(#[from] Error),
}

#[cold]
#[inline(never)]
fn out_of_bounds<T>() -> Result<T, DecodeError> {
    Err(DecodeError::OutOfBounds)
}

/// Nesting depth allowed by [`Cursor::new`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Upper bound on items of one array or map whose items occupy no bytes.
pub const MAX_ZERO_WIDTH_ITEMS: usize = 1 << 16;

/// Read position over encoded bytes.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    input: &'a [u8],
    position: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Cursor<'a> {
    #[inline(always)]
    pub fn new(input: &'a [u8]) -> Self {
        Cursor::with_max_depth(input, DEFAULT_MAX_DEPTH)
    }

    /// Creates cursor that allows at most `max_depth` nested
    /// records, unions, arrays and maps.
    #[inline(always)]
    pub fn with_max_depth(input: &'a [u8], max_depth: usize) -> Self {
        Cursor {
            input,
            position: 0,
            depth: 0,
            max_depth,
        }
    }

    /// Number of bytes consumed so far.
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes not consumed yet.
    #[inline(always)]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.position..]
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.position == self.input.len()
    }

    /// Consumes next `len` bytes.
    #[inline]
    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if remaining.len() < len {
            return out_of_bounds();
        }
        self.position += len;
        Ok(&remaining[..len])
    }

    #[inline]
    fn read_varint<T>(&mut self) -> Result<T, DecodeError>
    where
        T: VarInt,
    {
        let (value, len) = varint::decode(self.remaining())?;
        self.position += len;
        Ok(value)
    }

    #[inline]
    pub fn read_int(&mut self) -> Result<i32, DecodeError> {
        self.read_varint()
    }

    #[inline]
    pub fn read_long(&mut self) -> Result<i64, DecodeError> {
        self.read_varint()
    }

    pub fn read_boolean(&mut self) -> Result<bool, DecodeError> {
        match self.read_exact(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(DecodeError::InvalidBoolean(byte)),
        }
    }

    pub fn read_float(&mut self) -> Result<f32, DecodeError> {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(self.read_exact(4)?);
        Ok(f32::from_le_bytes(bytes))
    }

    pub fn read_double(&mut self) -> Result<f64, DecodeError> {
        let mut bytes = [0; 8];
        bytes.copy_from_slice(self.read_exact(8)?);
        Ok(f64::from_le_bytes(bytes))
    }

    /// Reads a length or count prefix.
    pub fn read_len(&mut self) -> Result<usize, DecodeError> {
        let len = self.read_long()?;
        if len < 0 {
            return Err(DecodeError::NegativeLength(len));
        }
        usize::try_from(len).map_err(|_| DecodeError::IntegerOverflow)
    }

    /// Reads length-prefixed bytes.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_len()?;
        self.read_exact(len)
    }

    /// Reads length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<&'a str, DecodeError> {
        let bytes = self.read_bytes()?;
        core::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
    }

    #[inline]
    pub fn read_fixed(&mut self, size: usize) -> Result<&'a [u8], DecodeError> {
        self.read_exact(size)
    }

    /// Runs `f` one nesting level deeper.
    ///
    /// Fails with [`DecodeError::DepthLimit`] instead of descending
    /// past the limit the cursor was created with.
    pub fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        if self.depth >= self.max_depth {
            return Err(DecodeError::DepthLimit(self.max_depth));
        }

        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Calls `item` for every item of an array or map, block by block.
    ///
    /// `width` is the least number of bytes one item occupies.
    /// Block counts that cannot fit into the remaining input are rejected
    /// before any item is decoded. Zero-width items are capped
    /// at [`MAX_ZERO_WIDTH_ITEMS`].
    pub fn read_blocks(
        &mut self,
        width: usize,
        mut item: impl FnMut(&mut Self) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        self.nested(|cursor| {
            let mut total = 0usize;
            loop {
                let count = cursor.read_block_len()?;
                if count == 0 {
                    return Ok(());
                }

                if width == 0 {
                    total = total.saturating_add(count);
                    if total > MAX_ZERO_WIDTH_ITEMS {
                        return Err(DecodeError::TooManyItems {
                            limit: MAX_ZERO_WIDTH_ITEMS,
                        });
                    }
                } else {
                    let remaining = cursor.remaining().len();
                    if count > remaining / width {
                        return Err(DecodeError::BlockLength { count, remaining });
                    }
                }

                for _ in 0..count {
                    item(cursor)?;
                }
            }
        })
    }

    /// Reads the item count of the next block of an array or a map.
    ///
    /// Negative count is followed by the block size in bytes,
    /// which is not needed when items are decoded one by one.
    fn read_block_len(&mut self) -> Result<usize, DecodeError> {
        let count = self.read_long()?;
        if count >= 0 {
            return usize::try_from(count).map_err(|_| DecodeError::IntegerOverflow);
        }
        self.read_len()?;
        let count = count.checked_neg().ok_or(DecodeError::IntegerOverflow)?;
        usize::try_from(count).map_err(|_| DecodeError::IntegerOverflow)
    }
}

/// Function decoding one value of the given schema.
pub type DecodeFn = for<'a, 'b> fn(&'a Schema, &mut Cursor<'b>) -> Result<Value, DecodeError>;

/// Selects decode function for the schema node.
pub fn specific_decoder(schema: &Schema) -> DecodeFn {
    match schema.kind() {
        SchemaKind::Null => decode_null,
        SchemaKind::Boolean => decode_boolean,
        SchemaKind::Int => decode_int,
        SchemaKind::Long => decode_long,
        SchemaKind::Float => decode_float,
        SchemaKind::Double => decode_double,
        SchemaKind::Bytes => decode_bytes,
        SchemaKind::String => decode_string,
        SchemaKind::Fixed => decode_fixed,
        SchemaKind::Enum => decode_enum,
        SchemaKind::Record => decode_record,
        SchemaKind::Array => decode_array,
        SchemaKind::Map => decode_map,
        SchemaKind::Union => decode_union,
        SchemaKind::Recursive => decode_recursive,
    }
}

/// Decodes one value of the schema.
#[inline]
pub fn decode_value(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    specific_decoder(schema)(schema, cursor)
}

#[cold]
#[inline(never)]
fn wrong_kind(expected: SchemaKind, schema: &Schema) -> DecodeError {
    DecodeError::Schema(Error::SchemaMismatch {
        writer: schema.kind(),
        reader: expected,
    })
}

fn decode_null(_: &Schema, _: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    Ok(Value::Null)
}

fn decode_boolean(_: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    cursor.read_boolean().map(Value::Boolean)
}

fn decode_int(_: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    cursor.read_int().map(Value::Int)
}

fn decode_long(_: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    cursor.read_long().map(Value::Long)
}

fn decode_float(_: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    cursor.read_float().map(Value::Float)
}

fn decode_double(_: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    cursor.read_double().map(Value::Double)
}

fn decode_bytes(_: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    cursor.read_bytes().map(|bytes| Value::Bytes(bytes.to_vec()))
}

fn decode_string(_: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    cursor.read_string().map(|s| Value::String(s.to_owned()))
}

fn decode_fixed(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    match schema {
        Schema::Fixed(fixed) => cursor
            .read_fixed(fixed.size)
            .map(|bytes| Value::Fixed(bytes.to_vec())),
        _ => Err(wrong_kind(SchemaKind::Fixed, schema)),
    }
}

fn decode_enum(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    let Schema::Enum(enumeration) = schema else {
        return Err(wrong_kind(SchemaKind::Enum, schema));
    };

    let index = cursor.read_int()?;
    let symbol = usize::try_from(index)
        .ok()
        .and_then(|idx| enumeration.symbols.get(idx));

    match symbol {
        Some(symbol) => Ok(Value::Enum(index as u32, symbol.clone())),
        None => Err(DecodeError::EnumIndex {
            index,
            count: enumeration.symbols.len(),
        }),
    }
}

/// Decodes every writer field in order.
fn decode_record(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    let Some(record) = schema.as_record() else {
        return Err(wrong_kind(SchemaKind::Record, schema));
    };

    let fields = cursor.nested(|cursor| {
        record
            .fields
            .iter()
            .map(|field| Ok((field.name.clone(), decode_value(&field.ty, cursor)?)))
            .collect::<Result<Vec<_>, DecodeError>>()
    })?;

    Ok(Value::Record(fields))
}

fn decode_array(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    let Schema::Array(array) = schema else {
        return Err(wrong_kind(SchemaKind::Array, schema));
    };

    let decode = specific_decoder(&array.items);
    let mut items = Vec::new();

    cursor.read_blocks(min_encoded_len(&array.items), |cursor| {
        items.push(decode(&array.items, cursor)?);
        Ok(())
    })?;

    Ok(Value::Array(items))
}

fn decode_map(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    let Schema::Map(map) = schema else {
        return Err(wrong_kind(SchemaKind::Map, schema));
    };

    let decode = specific_decoder(&map.values);
    let mut entries = HashMap::new();

    // Every key occupies at least its length byte.
    let width = min_encoded_len(&map.values).saturating_add(1);
    cursor.read_blocks(width, |cursor| {
        let key = cursor.read_string()?.to_owned();
        let value = decode(&map.values, cursor)?;
        entries.insert(key, value);
        Ok(())
    })?;

    Ok(Value::Map(entries))
}

fn decode_union(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    let Schema::Union(union) = schema else {
        return Err(wrong_kind(SchemaKind::Union, schema));
    };

    cursor.nested(|cursor| {
        let (index, branch) = read_branch(union, cursor)?;
        let value = decode_value(branch, cursor)?;
        Ok(Value::Union(index, Box::new(value)))
    })
}

/// Reads index of the active union branch and returns the branch.
pub(crate) fn read_branch<'s>(
    union: &'s UnionSchema,
    cursor: &mut Cursor<'_>,
) -> Result<(u32, &'s SchemaRef), DecodeError> {
    let index = cursor.read_long()?;
    let branch = usize::try_from(index)
        .ok()
        .and_then(|idx| union.types.get(idx));

    match branch {
        Some(branch) => Ok((index as u32, branch)),
        None => Err(DecodeError::UnionIndex {
            index,
            count: union.types.len(),
        }),
    }
}

/// Least number of bytes a value of the schema occupies.
///
/// Recursive edges count as zero.
pub(crate) fn min_encoded_len(schema: &Schema) -> usize {
    match schema {
        Schema::Null | Schema::Recursive(_) => 0,
        Schema::Float => 4,
        Schema::Double => 8,
        Schema::Fixed(fixed) => fixed.size,
        Schema::Record(_) | Schema::Resolved(_) => schema
            .as_record()
            .map(|record| {
                record
                    .fields
                    .iter()
                    .fold(0usize, |len, field| len.saturating_add(min_encoded_len(&field.ty)))
            })
            .unwrap_or(0),
        _ => 1,
    }
}

fn decode_recursive(schema: &Schema, cursor: &mut Cursor<'_>) -> Result<Value, DecodeError> {
    let Schema::Recursive(recursive) = schema else {
        return Err(wrong_kind(SchemaKind::Recursive, schema));
    };

    let actual = recursive.actual()?;
    decode_value(&actual, cursor)
}
