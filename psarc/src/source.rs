//! Byte sources that support positioned reads.
//!
//! Every open entry handle reads through `ReadAt`, so handles sharing one
//! source never move each other's cursor.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// A byte source that can be read at any offset through a shared reference
pub trait ReadAt: Send + Sync {
    /// Reads up to `buf.len()` bytes starting at `offset`
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Fills `buf` completely from `offset`
    fn read_exact_at(&self, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.read_at(offset, buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "failed to fill whole buffer",
                    ));
                }
                Ok(n) => {
                    offset += n as u64;
                    buf = &mut buf[n..];
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
impl ReadAt for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }
}

#[cfg(windows)]
impl ReadAt for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

impl ReadAt for Vec<u8> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.as_slice().read_at(offset, buf)
    }
}

impl ReadAt for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.len());
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

/// Adapts a plain `Read + Seek` stream by serializing seek-then-read
pub struct LockedSource<R> {
    inner: Mutex<R>,
}

impl<R: Read + Seek + Send> LockedSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }
}

impl<R: Read + Seek + Send> ReadAt for LockedSource<R> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        inner.seek(SeekFrom::Start(offset))?;
        inner.read(buf)
    }
}

/// Sequential `Read` view of a `ReadAt` source starting at an offset
pub struct SourceReader<'a, S: ?Sized> {
    source: &'a S,
    offset: u64,
}

impl<'a, S: ReadAt + ?Sized> SourceReader<'a, S> {
    pub fn new(source: &'a S, offset: u64) -> Self {
        Self { source, offset }
    }
}

impl<S: ReadAt + ?Sized> Read for SourceReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.source.read_at(self.offset, buf)?;
        self.offset += n as u64;
        Ok(n)
    }
}
