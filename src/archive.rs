//! Growable output buffer used to build packets, and its read-side cursor.

use crate::types::SIZE_WORD;
use serde::{de::DeserializeOwned, Serialize};
use std::io;

/// A growable byte buffer with a write cursor.
///
/// The populated prefix is `raw()`; `capacity()` never shrinks while the
/// archive is alive, including across [`Archive::reset`].
#[derive(Debug, Default)]
pub struct Archive {
    buf: Vec<u8>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Reserve `n` zero-filled bytes without writing a value into them.
    /// Returns the offset at which the gap starts.
    pub fn advance(&mut self, n: usize) -> usize {
        let at = self.buf.len();
        self.buf.resize(at + n, 0);
        at
    }

    /// Append the bincode form of `value`.
    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> bincode::Result<()> {
        bincode::serialize_into(&mut self.buf, value)
    }

    /// Append raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_size_word(&mut self, word: u64) {
        self.write_bytes(&word.to_le_bytes());
    }

    /// Overwrite a previously written or reserved size word in place.
    ///
    /// Panics if `at` does not lie inside the populated prefix.
    pub fn patch_size_word(&mut self, at: usize, word: u64) {
        self.buf[at..at + SIZE_WORD].copy_from_slice(&word.to_le_bytes());
    }

    /// Rewind to offset 0, keeping the allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn raw(&self) -> &[u8] {
        &self.buf
    }

    pub fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    pub fn length(&self) -> usize {
        self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Copy the populated prefix into an exactly sized, independently owned block.
    pub fn to_transmit_buffer(&self) -> Box<[u8]> {
        Box::from(self.raw())
    }

    pub(crate) fn into_transmit_buffer(self) -> Box<[u8]> {
        self.buf.into_boxed_slice()
    }
}

impl io::Write for Archive {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.write_bytes(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read cursor over a received packet. Never reads past the end of the slice it wraps.
#[derive(Debug, Clone)]
pub struct ArchiveReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ArchiveReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.offset..]
    }

    /// Take the next `n` bytes, or `None` if fewer remain.
    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(n)?;
        let bytes = self.buf.get(self.offset..end)?;
        self.offset = end;
        Some(bytes)
    }

    pub fn read_size_word(&mut self) -> Option<u64> {
        let bytes = self.read_bytes(SIZE_WORD)?;
        let mut word = [0u8; SIZE_WORD];
        word.copy_from_slice(bytes);
        Some(u64::from_le_bytes(word))
    }

    /// Decode a bincode value from the cursor and advance past it.
    pub fn read<T: DeserializeOwned>(&mut self) -> bincode::Result<T> {
        let mut rest = self.remaining();
        let before = rest.len();
        let value = bincode::deserialize_from(&mut rest)?;
        self.offset += before - rest.len();
        Ok(value)
    }
}
