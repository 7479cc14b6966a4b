//! A bounds-checked cursor over a MOD file's bytes.
//!
//! ProTracker MOD files are big-endian throughout (16-bit word counts in
//! sample headers). This replaces raw pointer arithmetic with a cursor
//! that reports [`ModuleError::FormatCorrupt`] on a short read rather than
//! reading past the end of the buffer.

use crate::error::ModuleError;

pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ModuleError> {
        let end = self.offset.checked_add(count).unwrap_or(usize::MAX);
        if end > self.data.len() {
            return Err(ModuleError::FormatCorrupt {
                expected: end,
                actual: self.data.len(),
            });
        }

        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Read a fixed-width NUL-padded string, trimming at the first NUL.
    pub fn read_fixed_str(&mut self, length: usize) -> Result<String, ModuleError> {
        let bytes = self.read_bytes(length)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    pub fn read_u8(&mut self) -> Result<u8, ModuleError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, ModuleError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }
}
