use crate::{
    error::VarLenError,
    reader::{ReadResult, Reader},
    varlen::VariableLengthQuantity,
};
use std::io::{self, Write};

/// A system-exclusive event: status byte `0xF0` or `0xF7`, a variable-length
/// payload length, then the raw payload.
///
/// The payload is vendor-defined and round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SysExEvent {
    status: u8,
    length: VariableLengthQuantity,
    data: Vec<u8>,
}

impl SysExEvent {
    /// Create a sysex event. `status` is masked to `0xF0` or `0xF7`.
    pub fn new(status: u8, data: Vec<u8>) -> Result<Self, VarLenError> {
        let length = VariableLengthQuantity::new(data.len() as u32)?;
        Ok(Self {
            status: if status == 0xF7 { 0xF7 } else { 0xF0 },
            length,
            data,
        })
    }

    /// Returns the status byte (`0xF0` or `0xF7`).
    pub const fn status(&self) -> u8 {
        self.status
    }

    /// Returns the raw payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encoded size including the status byte, excluding the delta-time.
    pub fn event_size(&self) -> usize {
        1 + self.length.byte_count() + self.data.len()
    }

    pub(crate) fn parse(status: u8, reader: &mut Reader<'_>) -> ReadResult<Self> {
        let length = VariableLengthQuantity::parse(reader)?;
        let data = reader.read_exact(length.value() as usize)?;
        Ok(Self {
            status,
            length,
            data: data.to_vec(),
        })
    }

    pub(crate) fn write_payload<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(self.length.bytes())?;
        sink.write_all(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_and_rewrite() {
        let mut reader = Reader::from_byte_slice(&[0x03, 0x43, 0x12, 0x00]);
        let event = SysExEvent::parse(0xF0, &mut reader).unwrap();
        assert_eq!(event.data(), &[0x43, 0x12, 0x00]);
        assert_eq!(event.event_size(), 5);

        let mut bytes = Vec::new();
        event.write_payload(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0x03, 0x43, 0x12, 0x00]);
    }

    #[test]
    fn truncated_payload_fails() {
        let mut reader = Reader::from_byte_slice(&[0x05, 0x43]);
        let err = SysExEvent::parse(0xF0, &mut reader).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn status_is_normalized() {
        assert_eq!(SysExEvent::new(0xF7, vec![]).unwrap().status(), 0xF7);
        assert_eq!(SysExEvent::new(0x12, vec![]).unwrap().status(), 0xF0);
    }
}
