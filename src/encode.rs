use crate::varint;

/// Growing buffer of encoded primitives.
///
/// Mirrors the readers of [`Cursor`].
/// Writing whole records is up to the caller, field by field in schema order.
///
/// [`Cursor`]: crate::Cursor
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    #[inline(always)]
    pub fn new() -> Self {
        Encoder { buf: Vec::new() }
    }

    #[inline(always)]
    pub fn with_capacity(capacity: usize) -> Self {
        Encoder {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline(always)]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Null occupies no bytes.
    #[inline(always)]
    pub fn write_null(&mut self) -> &mut Self {
        self
    }

    pub fn write_boolean(&mut self, value: bool) -> &mut Self {
        self.buf.push(u8::from(value));
        self
    }

    pub fn write_int(&mut self, value: i32) -> &mut Self {
        varint::encode(value, &mut self.buf);
        self
    }

    pub fn write_long(&mut self, value: i64) -> &mut Self {
        varint::encode(value, &mut self.buf);
        self
    }

    pub fn write_float(&mut self, value: f32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_double(&mut self, value: f64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> &mut Self {
        self.write_len(value.len());
        self.buf.extend_from_slice(value);
        self
    }

    pub fn write_string(&mut self, value: &str) -> &mut Self {
        self.write_bytes(value.as_bytes())
    }

    pub fn write_fixed(&mut self, value: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(value);
        self
    }

    /// Writes index of the active union branch.
    pub fn write_union_index(&mut self, index: u32) -> &mut Self {
        self.write_long(i64::from(index))
    }

    /// Starts a block of `count` array items or map entries.
    /// Items follow, the sequence ends with [`Encoder::write_end`].
    pub fn write_block(&mut self, count: usize) -> &mut Self {
        self.write_len(count)
    }

    /// Terminates array or map.
    pub fn write_end(&mut self) -> &mut Self {
        self.write_long(0)
    }

    fn write_len(&mut self, len: usize) -> &mut Self {
        // Lengths beyond `i64::MAX` cannot exist in memory.
        self.write_long(len as i64)
    }
}
