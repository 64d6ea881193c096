//! Instruction byte sources.

use thiserror::Error;

/// Failure to read instruction bytes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot access {len} bytes of memory at 0x{addr:x}")]
pub struct MemoryError {
    pub addr: u64,
    pub len: usize,
}

/// Readable instruction memory: a live target, a file image, or a buffer.
pub trait InsnSource {
    /// Fill `buf` with the bytes at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError`] if any byte of the range is unreadable.
    fn read(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemoryError>;
}

impl<T: InsnSource + ?Sized> InsnSource for &T {
    fn read(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemoryError> {
        (**self).read(addr, buf)
    }
}

/// In-memory code image mapped at `base`.
#[derive(Clone, Copy, Debug)]
pub struct ImageSource<'a> {
    base: u64,
    bytes: &'a [u8],
}

impl<'a> ImageSource<'a> {
    #[must_use]
    pub const fn new(base: u64, bytes: &'a [u8]) -> Self {
        Self { base, bytes }
    }

    /// First address past the image.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.base.saturating_add(self.bytes.len() as u64)
    }
}

impl InsnSource for ImageSource<'_> {
    fn read(&self, addr: u64, buf: &mut [u8]) -> Result<(), MemoryError> {
        let err = MemoryError {
            addr,
            len: buf.len(),
        };
        let start = addr
            .checked_sub(self.base)
            .and_then(|off| usize::try_from(off).ok())
            .ok_or(err)?;
        let bytes = start
            .checked_add(buf.len())
            .and_then(|end| self.bytes.get(start..end))
            .ok_or(err)?;
        buf.copy_from_slice(bytes);
        Ok(())
    }
}
