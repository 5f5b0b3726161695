//! Byte-level reader and writer for the broadcast format
//!
//! The account family serializes big-endian with u8-length-prefixed strings;
//! the UTXO family uses the legacy little-endian layout with Bitcoin-style
//! varints. Both directions live here so encode and decode cannot drift.

use thiserror::Error;

/// Errors raised while decoding wire bytes
#[derive(Error, Debug)]
pub enum WireError {
    #[error("Unexpected end of transaction bytes")]
    UnexpectedEof,
    #[error("Invalid wire data: {0}")]
    Invalid(String),
}

/// Append-only byte writer
///
/// All writes are infallible: length invariants (strings <= 255 bytes,
/// counts <= 255) are enforced by the builders before encoding starts.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_u32_be(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u64_be(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u64_le(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u128_be(&mut self, value: u128) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bitcoin-style variable-length integer
    pub fn put_var_int(&mut self, value: u64) {
        match value {
            0..=0xfc => self.put_u8(value as u8),
            0xfd..=0xffff => {
                self.put_u8(0xfd);
                self.buf.extend_from_slice(&(value as u16).to_le_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.put_u8(0xfe);
                self.put_u32_le(value as u32);
            }
            _ => {
                self.put_u8(0xff);
                self.put_u64_le(value);
            }
        }
    }

    /// u8-length-prefixed UTF-8 string (account family)
    pub fn put_short_string(&mut self, value: &str) {
        debug_assert!(value.len() <= u8::MAX as usize);
        self.put_u8(value.len() as u8);
        self.put_bytes(value.as_bytes());
    }

    /// u8-length-prefixed byte push (scriptSig elements)
    pub fn put_push(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= u8::MAX as usize);
        self.put_u8(bytes.len() as u8);
        self.put_bytes(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor-based byte reader, the inverse of [`Writer`]
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < count {
            return Err(WireError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32_be(&mut self) -> Result<u32, WireError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().map_err(|_| WireError::UnexpectedEof)?))
    }

    pub fn read_u64_be(&mut self) -> Result<u64, WireError> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().map_err(|_| WireError::UnexpectedEof)?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, WireError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().map_err(|_| WireError::UnexpectedEof)?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, WireError> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().map_err(|_| WireError::UnexpectedEof)?))
    }

    pub fn read_u128_be(&mut self) -> Result<u128, WireError> {
        let bytes = self.read_bytes(16)?;
        Ok(u128::from_be_bytes(bytes.try_into().map_err(|_| WireError::UnexpectedEof)?))
    }

    pub fn read_var_int(&mut self) -> Result<u64, WireError> {
        match self.read_u8()? {
            0xfd => {
                let bytes = self.read_bytes(2)?;
                Ok(u16::from_le_bytes(bytes.try_into().map_err(|_| WireError::UnexpectedEof)?) as u64)
            }
            0xfe => Ok(self.read_u32_le()? as u64),
            0xff => self.read_u64_le(),
            small => Ok(small as u64),
        }
    }

    pub fn read_short_string(&mut self) -> Result<String, WireError> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| WireError::Invalid("non-UTF-8 string".to_string()))
    }

    pub fn read_push(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.read_u8()? as usize;
        self.read_bytes(len)
    }

    /// Fail unless every byte has been consumed
    pub fn expect_end(&self) -> Result<(), WireError> {
        if self.remaining() != 0 {
            return Err(WireError::Invalid(format!(
                "{} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }
}
