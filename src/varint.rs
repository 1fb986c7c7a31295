//! Zig-zag variable-length integers.
//!
//! Signed value is first mapped to unsigned so that small magnitudes
//! of either sign become small numbers: `0, -1, 1, -2, 2` map to `0, 1, 2, 3, 4`.
//! Then it is written as little-endian groups of 7 bits,
//! bit 8 of each byte signals that another byte follows.

use crate::decode::DecodeError;

/// Longest encoding of a 64 bit value.
pub(crate) const MAX_LEN: usize = 10;

pub(crate) trait VarInt: Copy {
    fn zigzag(self) -> u64;

    /// Returns `None` if value does not fit `Self`.
    fn unzigzag(raw: u64) -> Option<Self>;
}

macro_rules! impl_varint {
    ($($a:ident)*) => {
        $(
            impl VarInt for $a {
                #[inline(always)]
                fn zigzag(self) -> u64 {
                    let value = i64::from(self);
                    ((value << 1) ^ (value >> 63)) as u64
                }

                #[inline(always)]
                fn unzigzag(raw: u64) -> Option<Self> {
                    let value = ((raw >> 1) as i64) ^ -((raw & 1) as i64);
                    $a::try_from(value).ok()
                }
            }
        )*
    };
}

impl_varint!(i32 i64);

#[inline]
pub(crate) fn encode<T>(value: T, output: &mut Vec<u8>)
where
    T: VarInt,
{
    let mut raw = value.zigzag();
    loop {
        let byte = (raw & 0x7F) as u8;
        raw >>= 7;
        if raw == 0 {
            output.push(byte);
            return;
        }
        output.push(byte | 0x80);
    }
}

/// Decodes value from the start of `input`.
/// Returns the value and number of bytes it occupied.
#[inline]
pub(crate) fn decode<T>(input: &[u8]) -> Result<(T, usize), DecodeError>
where
    T: VarInt,
{
    let mut raw = 0u64;

    for (idx, &byte) in input.iter().take(MAX_LEN).enumerate() {
        let shift = idx * 7;
        if shift == 63 && byte & 0x7E != 0 {
            return Err(DecodeError::IntegerOverflow);
        }

        raw |= u64::from(byte & 0x7F) << shift;

        if byte & 0x80 == 0 {
            return match T::unzigzag(raw) {
                Some(value) => Ok((value, idx + 1)),
                None => Err(DecodeError::IntegerOverflow),
            };
        }
    }

    if input.len() >= MAX_LEN {
        Err(DecodeError::IntegerOverflow)
    } else {
        Err(DecodeError::OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};
    use crate::decode::DecodeError;

    fn encoded(value: i64) -> Vec<u8> {
        let mut output = Vec::new();
        encode(value, &mut output);
        output
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encoded(0), [0x00]);
        assert_eq!(encoded(-1), [0x01]);
        assert_eq!(encoded(1), [0x02]);
        assert_eq!(encoded(-64), [0x7F]);
        assert_eq!(encoded(64), [0x80, 0x01]);
        assert_eq!(encoded(i64::MIN).len(), 10);
    }

    #[test]
    fn test_extremes() {
        for value in [i64::MIN, i64::MAX, i32::MIN as i64, i32::MAX as i64] {
            let bytes = encoded(value);
            assert_eq!(decode::<i64>(&bytes), Ok((value, bytes.len())));
        }
    }

    #[test]
    fn test_int_overflow() {
        let bytes = encoded(i64::from(i32::MAX) + 1);
        assert_eq!(decode::<i32>(&bytes), Err(DecodeError::IntegerOverflow));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(decode::<i64>(&[0x80]), Err(DecodeError::OutOfBounds));
        assert_eq!(decode::<i64>(&[]), Err(DecodeError::OutOfBounds));
    }

    #[test]
    fn test_too_long() {
        let bytes = [0xFF; 11];
        assert_eq!(decode::<i64>(&bytes), Err(DecodeError::IntegerOverflow));
    }
}
