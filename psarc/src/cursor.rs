//! Big-endian primitive reader, including the 24-bit and 40-bit widths
//! PSArc uses in its tables.

use crate::error::{Error, Result};
use std::io::{self, Read};

/// Zero-extends 3 big-endian bytes into a u32
#[inline]
pub fn u24_from_be(bytes: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

/// Zero-extends 5 big-endian bytes into a u64
#[inline]
pub fn u40_from_be(bytes: [u8; 5]) -> u64 {
    u64::from_be_bytes([0, 0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]])
}

/// Low 3 bytes of `value`, big-endian
#[inline]
pub fn u24_to_be(value: u32) -> [u8; 3] {
    let b = value.to_be_bytes();
    [b[1], b[2], b[3]]
}

/// Low 5 bytes of `value`, big-endian
#[inline]
pub fn u40_to_be(value: u64) -> [u8; 5] {
    let b = value.to_be_bytes();
    [b[3], b[4], b[5], b[6], b[7]]
}

/// Sequential big-endian reader over any byte stream.
///
/// Tracks the absolute offset so short reads can report where the archive
/// ended. Only the bytes asked for are pulled from the inner reader.
pub struct BeCursor<R> {
    inner: R,
    position: u64,
}

impl<R: Read> BeCursor<R> {
    /// Wraps a reader already positioned at `position`
    pub fn new(inner: R, position: u64) -> Self {
        Self { inner, position }
    }

    /// Absolute offset of the next byte
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fills `buf` completely or fails with `Truncated`
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(Error::Truncated {
                offset: self.position,
                needed: buf.len(),
            }),
            Err(err) => Err(Error::Io(err)),
        }
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        self.read_array().map(u24_from_be)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    pub fn read_u40(&mut self) -> Result<u64> {
        self.read_array().map(u40_from_be)
    }
}
