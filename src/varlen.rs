#![doc = r#"
The MIDI variable-length quantity.

Delta-times and some length fields are stored as a base-128 integer: seven
value bits per byte, most significant byte first, with the high bit of each
byte marking "more bytes follow". The encoding is one to four bytes, so the
largest representable value is 28 bits.

# Example
```rust
use midilib::prelude::*;

let quantity = VariableLengthQuantity::new(480).unwrap();
assert_eq!(quantity.bytes(), &[0x83, 0x60]);
assert_eq!(quantity.byte_count(), 2);
```
"#]

use crate::{
    error::VarLenError,
    reader::{ReadResult, Reader},
};

/// A non-negative integer together with its one-to-four-byte MIDI encoding.
///
/// Values built through [`new`](Self::new) or [`set_value`](Self::set_value)
/// always carry the canonical (minimal) encoding; a value parsed from bytes
/// keeps the encoding exactly as it appeared so that re-encoding a decoded
/// track reproduces its input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableLengthQuantity {
    value: u32,
    bytes: [u8; 4],
    len: u8,
}

impl VariableLengthQuantity {
    /// The largest encodable value (28 bits).
    pub const MAX: u32 = 0x0FFF_FFFF;

    /// Create a quantity from a value.
    ///
    /// Fails with [`VarLenError::ValueOutOfRange`] above [`Self::MAX`].
    pub fn new(value: u32) -> Result<Self, VarLenError> {
        let mut quantity = Self {
            value: 0,
            bytes: [0; 4],
            len: 1,
        };
        quantity.set_value(value)?;
        Ok(quantity)
    }

    /// Replace the value, rebuilding the canonical encoding.
    pub fn set_value(&mut self, value: u32) -> Result<(), VarLenError> {
        if value > Self::MAX {
            return Err(VarLenError::ValueOutOfRange(u64::from(value)));
        }
        self.value = value;
        self.rebuild();
        Ok(())
    }

    /// Returns the value.
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Returns the number of bytes in the encoding.
    pub const fn byte_count(&self) -> usize {
        self.len as usize
    }

    /// Returns the encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Read a quantity off the front of `reader`.
    ///
    /// Stops at the first byte whose high bit is clear. Fails with a
    /// truncated-input error if the buffer ends first, or with
    /// [`VarLenError::MissingTerminator`] if four continuation bytes appear
    /// without a terminator.
    pub fn parse(reader: &mut Reader<'_>) -> ReadResult<Self> {
        let mut value = 0u32;
        let mut bytes = [0u8; 4];
        let mut len = 0usize;
        loop {
            let byte = reader.read_byte()?;
            bytes[len] = byte;
            len += 1;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                break;
            }
            if len == 4 {
                return Err(reader.parse_err(VarLenError::MissingTerminator));
            }
        }
        Ok(Self {
            value,
            bytes,
            len: len as u8,
        })
    }

    fn rebuild(&mut self) {
        self.bytes = [0; 4];
        let mut groups = [0u8; 4];
        let mut remaining = self.value;
        let mut count = 0;
        loop {
            groups[count] = (remaining & 0x7F) as u8;
            remaining >>= 7;
            count += 1;
            if remaining == 0 {
                break;
            }
        }
        self.len = count as u8;
        for i in 0..count {
            let mut byte = groups[count - 1 - i];
            if i != count - 1 {
                byte |= 0x80;
            }
            self.bytes[i] = byte;
        }
    }
}

impl Default for VariableLengthQuantity {
    /// A zero quantity, encoded as a single zero byte.
    fn default() -> Self {
        Self {
            value: 0,
            bytes: [0; 4],
            len: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parsed(bytes: &[u8]) -> VariableLengthQuantity {
        let mut reader = Reader::from_byte_slice(bytes);
        VariableLengthQuantity::parse(&mut reader).unwrap()
    }

    #[test]
    fn zero_is_a_single_zero_byte() {
        let q = VariableLengthQuantity::new(0).unwrap();
        assert_eq!(q.bytes(), &[0x00]);
        assert_eq!(VariableLengthQuantity::default(), q);
    }

    #[test]
    fn boundary_encodings() {
        assert_eq!(VariableLengthQuantity::new(127).unwrap().bytes(), &[0x7F]);
        assert_eq!(
            VariableLengthQuantity::new(128).unwrap().bytes(),
            &[0x81, 0x00]
        );
        assert_eq!(
            VariableLengthQuantity::new(VariableLengthQuantity::MAX)
                .unwrap()
                .bytes(),
            &[0xFF, 0xFF, 0xFF, 0x7F]
        );
    }

    #[test]
    fn rejects_values_over_28_bits() {
        let err = VariableLengthQuantity::new(VariableLengthQuantity::MAX + 1).unwrap_err();
        assert_eq!(
            err,
            VarLenError::ValueOutOfRange(u64::from(VariableLengthQuantity::MAX) + 1)
        );
    }

    #[test]
    fn round_trips_through_bytes() {
        for value in [0u32, 1, 127, 128, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000] {
            let encoded = VariableLengthQuantity::new(value).unwrap();
            assert_eq!(parsed(encoded.bytes()).value(), value);
        }
    }

    #[test]
    fn shrinking_value_clears_stale_bytes() {
        let mut q = VariableLengthQuantity::new(0x0FFF_FFFF).unwrap();
        q.set_value(5).unwrap();
        assert_eq!(q, VariableLengthQuantity::new(5).unwrap());
    }

    #[test]
    fn parse_keeps_the_encoding_as_read() {
        // non-canonical zero: a continuation byte followed by 0
        let q = parsed(&[0x80, 0x00]);
        assert_eq!(q.value(), 0);
        assert_eq!(q.bytes(), &[0x80, 0x00]);
    }

    #[test]
    fn truncated_input_fails() {
        let mut reader = Reader::from_byte_slice(&[0x81]);
        let err = VariableLengthQuantity::parse(&mut reader).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn four_continuation_bytes_fail() {
        let mut reader = Reader::from_byte_slice(&[0x81, 0x82, 0x83, 0x84, 0x05]);
        let err = VariableLengthQuantity::parse(&mut reader).unwrap_err();
        assert!(!err.is_truncated());
    }
}
