#![doc = r#"
A positional reader over a byte slice.

All decode paths go through [`Reader`] so that every failure carries the
buffer position it occurred at.
"#]

mod error;
pub use error::*;

use crate::error::ParseError;

/// Reads bytes out of a borrowed buffer, tracking the current position.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over a byte slice.
    pub const fn from_byte_slice(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Returns the current position in the buffer.
    pub const fn buffer_position(&self) -> usize {
        self.position
    }

    /// Returns the number of unread bytes.
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// True if every byte has been consumed.
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> ReadResult<u8> {
        let Some(byte) = self.bytes.get(self.position) else {
            return Err(ReaderError::truncated(self.position));
        };
        self.position += 1;
        Ok(*byte)
    }

    /// Look at the next byte without consuming it.
    pub fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    /// Look at the next `n` bytes without consuming them.
    pub fn peek_slice(&self, n: usize) -> Option<&'a [u8]> {
        self.bytes.get(self.position..self.position + n)
    }

    /// Read exactly `n` bytes.
    pub fn read_exact(&mut self, n: usize) -> ReadResult<&'a [u8]> {
        let Some(slice) = self.bytes.get(self.position..self.position + n) else {
            return Err(ReaderError::truncated(self.position));
        };
        self.position += n;
        Ok(slice)
    }

    /// Read a fixed-size array.
    pub fn read_exact_size<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let slice = self.read_exact(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> ReadResult<()> {
        if self.remaining() < n {
            return Err(ReaderError::truncated(self.position));
        }
        self.position += n;
        Ok(())
    }

    pub(crate) fn parse_err(&self, error: impl Into<ParseError>) -> ReaderError {
        ReaderError::parse_error(self.position, error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_track_positions() {
        let mut reader = Reader::from_byte_slice(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(reader.read_byte().unwrap(), 0xAA);
        assert_eq!(reader.buffer_position(), 1);
        assert_eq!(reader.read_exact(2).unwrap(), &[0xBB, 0xCC]);
        assert!(reader.is_empty());
    }

    #[test]
    fn truncated_read_reports_position() {
        let mut reader = Reader::from_byte_slice(&[0x01]);
        reader.read_byte().unwrap();
        let err = reader.read_byte().unwrap_err();
        assert!(err.is_truncated());
        assert_eq!(err.position(), 1);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut reader = Reader::from_byte_slice(&[0x90, 0x3C]);
        assert_eq!(reader.peek_byte(), Some(0x90));
        assert_eq!(reader.read_byte().unwrap(), 0x90);
    }
}
