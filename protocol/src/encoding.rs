//! # Canonical Binary Encoding
//!
//! The consensus wire format. Every byte produced here is hashed, signed or
//! relayed, so the rules are fixed and small:
//!
//! ```text
//! u8             1 byte
//! u64            8 bytes, little-endian
//! [u8; N]        N raw bytes, no prefix
//! sequence<T>    u64 element count, then each element
//! byte blob      u64 byte count, then the bytes
//! ```
//!
//! No padding, no field tags, no optional fields. Structs encode their
//! fields in declaration order. serde is deliberately not involved: its
//! data model leaves too much to the format crate, and two implementations
//! that disagree on one byte here fork the chain.
//!
//! Decoding is strict. Truncated input, a length prefix larger than the
//! remaining buffer, an unknown discriminant, or trailing bytes after a
//! complete value are all errors.

use thiserror::Error;

/// Errors produced while decoding canonical binary data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The input ended before the value was complete.
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A length prefix claims more data than the input holds.
    #[error("length prefix {declared} exceeds the {remaining} remaining bytes")]
    LengthOverflow { declared: u64, remaining: usize },

    /// A complete value was decoded but input remains.
    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    /// A type byte that names no known variant.
    #[error("unknown {what} discriminant: {value}")]
    UnknownDiscriminant { what: &'static str, value: u8 },

    /// A structurally valid encoding that carries an invalid value.
    #[error("invalid value: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Types with a canonical binary encoding.
pub trait Encode {
    /// Appends the canonical encoding of `self` to `enc`.
    fn encode_to(&self, enc: &mut Encoder);
}

/// Types that can be decoded from their canonical binary encoding.
pub trait Decode: Sized {
    /// Reads one value from `dec`, advancing it past the consumed bytes.
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError>;
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Append-only buffer for canonical encodings.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes bytes verbatim. Only for fixed-size fields.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a u64 length prefix followed by the bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_u64(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Encodes a value and returns `self` for chaining.
    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode_to(self);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Cursor over a canonical encoding.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads exactly `n` raw bytes.
    pub fn read_raw(&mut self, n: usize) -> Result<&'a [u8], EncodingError> {
        if n > self.remaining() {
            return Err(EncodingError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], EncodingError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_raw(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, EncodingError> {
        Ok(self.read_raw(1)?[0])
    }

    pub fn read_u64(&mut self) -> Result<u64, EncodingError> {
        Ok(u64::from_le_bytes(self.read_array::<8>()?))
    }

    /// Reads a u64 length prefix that must not exceed the remaining input.
    ///
    /// Every element of every sequence occupies at least one byte, so this
    /// bound also caps allocations for sequences of arbitrary element type.
    pub fn read_len(&mut self) -> Result<usize, EncodingError> {
        let declared = self.read_u64()?;
        if declared > self.remaining() as u64 {
            return Err(EncodingError::LengthOverflow {
                declared,
                remaining: self.remaining(),
            });
        }
        Ok(declared as usize)
    }

    /// Reads a length-prefixed byte blob.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], EncodingError> {
        let len = self.read_len()?;
        self.read_raw(len)
    }

    pub fn read<T: Decode>(&mut self) -> Result<T, EncodingError> {
        T::decode_from(self)
    }

    /// Fails if any input remains.
    pub fn finish(self) -> Result<(), EncodingError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(EncodingError::TrailingBytes(n)),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience
// ---------------------------------------------------------------------------

/// Encodes a single value into a fresh buffer.
pub fn encode_to_vec<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut enc = Encoder::new();
    value.encode_to(&mut enc);
    enc.finish()
}

/// Decodes exactly one value, rejecting trailing bytes.
pub fn decode_exact<T: Decode>(bytes: &[u8]) -> Result<T, EncodingError> {
    let mut dec = Decoder::new(bytes);
    let value = T::decode_from(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

// ---------------------------------------------------------------------------
// Primitive impls
// ---------------------------------------------------------------------------

impl Encode for u8 {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_u8(*self);
    }
}

impl Decode for u8 {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        dec.read_u8()
    }
}

impl Encode for u64 {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_u64(*self);
    }
}

impl Decode for u64 {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        dec.read_u64()
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_raw(self);
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        dec.read_array::<N>()
    }
}

impl<T: Encode> Encode for [T] {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_u64(self.len() as u64);
        for item in self {
            item.encode_to(enc);
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode_to(&self, enc: &mut Encoder) {
        self.as_slice().encode_to(enc);
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        let len = dec.read_len()?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(T::decode_from(dec)?);
        }
        Ok(out)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_to(&self, enc: &mut Encoder) {
        (**self).encode_to(enc);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let bytes = encode_to_vec(&0x0102_0304_0506_0708u64);
        assert_eq!(bytes, vec![8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn fixed_arrays_have_no_prefix() {
        assert_eq!(encode_to_vec(&[9u8; 4]), vec![9, 9, 9, 9]);
    }

    #[test]
    fn byte_vectors_are_length_prefixed() {
        let bytes = encode_to_vec(&vec![0xAAu8, 0xBB]);
        assert_eq!(bytes, vec![2, 0, 0, 0, 0, 0, 0, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn empty_sequence_is_just_a_zero_count() {
        let empty: Vec<u64> = Vec::new();
        assert_eq!(encode_to_vec(&empty), vec![0u8; 8]);
    }

    #[test]
    fn nested_sequences_decode() {
        let value: Vec<Vec<u64>> = vec![vec![1, 2], vec![], vec![3]];
        let bytes = encode_to_vec(&value);
        assert_eq!(decode_exact::<Vec<Vec<u64>>>(&bytes).unwrap(), value);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = encode_to_vec(&42u64);
        match decode_exact::<u64>(&bytes[..5]) {
            Err(EncodingError::UnexpectedEof { needed: 8, remaining: 5 }) => {}
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut bytes = encode_to_vec(&u64::MAX);
        bytes.push(1);
        match decode_exact::<Vec<u8>>(&bytes) {
            Err(EncodingError::LengthOverflow { declared, remaining: 1 }) => {
                assert_eq!(declared, u64::MAX);
            }
            other => panic!("expected LengthOverflow, got {:?}", other),
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode_to_vec(&7u64);
        bytes.push(0);
        assert_eq!(
            decode_exact::<u64>(&bytes),
            Err(EncodingError::TrailingBytes(1))
        );
    }

    #[test]
    fn chained_writes_concatenate() {
        let mut enc = Encoder::new();
        enc.write(&1u8).write(&[2u8, 3]).write(&vec![4u8]);
        assert_eq!(enc.finish(), vec![1, 2, 3, 1, 0, 0, 0, 0, 0, 0, 0, 4]);
    }
}
