//! Utility types for binary serialization.
//!
//! Provides the Bitcoin compact-size varint codec, fixed-width integer
//! codecs, and the consuming `Buffer` and appending `Writer` used by every
//! binary reader and writer in the workspace.

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// Varint
// ---------------------------------------------------------------------------

/// Marker byte introducing a 2-byte little-endian varint body.
pub const VARINT_MARKER_U16: u8 = 0xfd;
/// Marker byte introducing a 4-byte little-endian varint body.
pub const VARINT_MARKER_U32: u8 = 0xfe;
/// Marker byte introducing an 8-byte little-endian varint body.
pub const VARINT_MARKER_U64: u8 = 0xff;

/// Return the encoded length of `value` as a varint: 1, 3, 5, or 9 bytes.
pub fn varint_len(value: u64) -> usize {
    if value < VARINT_MARKER_U16 as u64 {
        1
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Encode `value` as a Bitcoin compact-size varint.
///
/// Values below 253 take a single byte; larger values are written as a
/// marker byte (253, 254, 255) followed by a 2, 4, or 8 byte
/// little-endian integer.
///
/// # Arguments
/// * `value` - The integer to encode.
///
/// # Returns
/// A `Vec<u8>` of 1, 3, 5, or 9 bytes.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(varint_len(value));
    match varint_len(value) {
        1 => out.push(value as u8),
        3 => {
            out.push(VARINT_MARKER_U16);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        5 => {
            out.push(VARINT_MARKER_U32);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(VARINT_MARKER_U64);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out
}

/// Decode a varint from the front of `data`.
///
/// # Returns
/// The decoded value and the number of bytes consumed, or
/// `InsufficientData` when the marker announces more bytes than remain.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), PrimitivesError> {
    let mut buffer = Buffer::new(data);
    let value = buffer.read_varint()?;
    Ok((value, data.len() - buffer.remaining()))
}

// ---------------------------------------------------------------------------
// Fixed-width integers
// ---------------------------------------------------------------------------

/// Encode an unsigned integer into exactly `length` bytes.
///
/// # Arguments
/// * `value` - The integer to encode.
/// * `length` - Output width in bytes (at most 8).
/// * `big_endian` - Byte order of the output.
///
/// # Returns
/// The zero-padded encoding, or `IntOverflow` if `value` needs more than
/// `length` bytes.
pub fn encode_int(value: u64, length: usize, big_endian: bool) -> Result<Vec<u8>, PrimitivesError> {
    if length > 8 {
        return Err(PrimitivesError::IntTooLarge(length));
    }
    if length < 8 && value >> (length * 8) != 0 {
        return Err(PrimitivesError::IntOverflow { value, length });
    }
    let mut out = value.to_le_bytes()[..length].to_vec();
    if big_endian {
        out.reverse();
    }
    Ok(out)
}

/// Decode an unsigned integer of up to 8 bytes.
///
/// An empty slice decodes to zero.
pub fn decode_int(bytes: &[u8], big_endian: bool) -> Result<u64, PrimitivesError> {
    if bytes.len() > 8 {
        return Err(PrimitivesError::IntTooLarge(bytes.len()));
    }
    let mut le = [0u8; 8];
    if big_endian {
        for (dst, src) in le.iter_mut().zip(bytes.iter().rev()) {
            *dst = *src;
        }
    } else {
        le[..bytes.len()].copy_from_slice(bytes);
    }
    Ok(u64::from_le_bytes(le))
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// A consuming cursor over a byte slice.
///
/// Every read removes bytes from the front; a read of more bytes than
/// remain fails with `InsufficientData` and leaves the cursor untouched.
#[derive(Debug, Clone)]
pub struct Buffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Buffer<'a> {
    /// Create a new buffer over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Buffer { data, pos: 0 }
    }

    /// Remove and return the next `n` bytes.
    ///
    /// # Arguments
    /// * `n` - Number of bytes to read.
    ///
    /// # Returns
    /// A byte slice of length `n`, or `InsufficientData` with the remaining
    /// and requested counts.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(PrimitivesError::InsufficientData {
                remaining,
                requested: n,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a fixed-size array.
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian u16.
    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64.
    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a compact-size varint.
    ///
    /// # Returns
    /// The decoded value, or `InsufficientData` if the body is truncated.
    /// A truncated body also gives back the marker byte.
    pub fn read_varint(&mut self) -> Result<u64, PrimitivesError> {
        let start = self.pos;
        let value = match self.read_u8()? {
            VARINT_MARKER_U16 => self.read_u16_le().map(u64::from),
            VARINT_MARKER_U32 => self.read_u32_le().map(u64::from),
            VARINT_MARKER_U64 => self.read_u64_le(),
            b => Ok(b as u64),
        };
        if value.is_err() {
            self.pos = start;
        }
        value
    }

    /// Return the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Check whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// An appending writer for Bitcoin wire formats.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create a new empty writer.
    pub fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    /// Create a new writer with a pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Writer {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Append a little-endian u32.
    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u64.
    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a compact-size varint.
    pub fn write_varint(&mut self, value: u64) {
        self.buf.extend_from_slice(&encode_varint(value));
    }

    /// Append `bytes` prefixed with their varint length.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    /// Consume the writer and return the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Return the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
