//! Sequential little-endian reader and writer.
//!
//! Fixed-width integers are written little-endian. Strings and byte blocks
//! carry a `u32` length prefix. Objects are encoded with bincode's standard
//! configuration and written as a length-prefixed byte block, so a reader can
//! always step over an object it does not understand.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tessera_common::utils::{Error, Result};

/// Appends typed values to a growable buffer.
#[derive(Debug, Default, Clone)]
pub struct SerializationWriter {
    buf: Vec<u8>,
}

impl SerializationWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with preallocated space.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Writes a signed 32-bit integer.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an unsigned 32-bit integer.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an unsigned 64-bit integer.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a collection length as a signed 32-bit count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if `len` does not fit in an `i32`.
    pub fn write_count(&mut self, len: usize) -> Result<()> {
        let count = i32::try_from(len)
            .map_err(|_| Error::Serialization(format!("count {len} exceeds i32 range")))?;
        self.write_i32(count);
        Ok(())
    }

    /// Writes a length-prefixed byte block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the block is longer than `u32::MAX`.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| Error::Serialization(format!("block of {} bytes too large", bytes.len())))?;
        self.write_u32(len);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes a length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the string is longer than `u32::MAX`.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Writes any serde value as a bincode-encoded block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding fails.
    pub fn write_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let encoded = bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(|e| Error::Serialization(format!("object encode failed: {e}")))?;
        self.write_bytes(&encoded)
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer and returns its buffer.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads typed values back from a byte slice, front to back.
#[derive(Debug, Clone)]
pub struct SerializationReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SerializationReader<'a> {
    /// Starts reading at the beginning of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.data.len());
        let Some(end) = end else {
            return Err(Error::Serialization(format!(
                "unexpected end of input: needed {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        };
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a signed 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] on truncated input.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    /// Reads an unsigned 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] on truncated input.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Reads an unsigned 64-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] on truncated input.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Reads a count written by [`SerializationWriter::write_count`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] on truncated input or a negative count.
    pub fn read_count(&mut self) -> Result<usize> {
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| Error::Serialization(format!("negative count {count}")))
    }

    /// Reads a length-prefixed byte block without copying.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] on truncated input.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] on truncated input or invalid UTF-8.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Serialization(format!("invalid UTF-8 string: {e}")))
    }

    /// Reads a value written by [`SerializationWriter::write_object`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] on truncated input or a decode failure.
    pub fn read_object<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.read_bytes()?;
        let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| Error::Serialization(format!("object decode failed: {e}")))?;
        Ok(value)
    }

    /// Current offset into the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` once all input has been consumed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}
