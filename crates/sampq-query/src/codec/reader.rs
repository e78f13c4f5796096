//! Bounds-checked reader over an untrusted datagram

use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::WINDOWS_1251;
use sampq_core::{Error, Result};
use std::io::Cursor;

/// Sequential little-endian reader that reports truncation as
/// `Error::Malformed` instead of panicking
pub(crate) struct PacketReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> PacketReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// Bytes left to read
    pub(crate) fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len();
        let pos = usize::try_from(self.cursor.position()).unwrap_or(len);
        len.saturating_sub(pos)
    }

    pub(crate) fn u8(&mut self, field: &str) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| truncated(field))
    }

    pub(crate) fn bool(&mut self, field: &str) -> Result<bool> {
        Ok(self.u8(field)? != 0)
    }

    pub(crate) fn u16(&mut self, field: &str) -> Result<u16> {
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| truncated(field))
    }

    pub(crate) fn i32(&mut self, field: &str) -> Result<i32> {
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| truncated(field))
    }

    /// Entry count prefix; negative counts are rejected
    pub(crate) fn count(&mut self, field: &str) -> Result<usize> {
        let count = self
            .cursor
            .read_i16::<LittleEndian>()
            .map_err(|_| truncated(field))?;
        usize::try_from(count)
            .map_err(|_| Error::malformed(format!("negative {field} count: {count}")))
    }

    /// Take exactly `len` bytes
    pub(crate) fn bytes(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::malformed(format!(
                "{field} declares {len} bytes but only {} remain",
                self.remaining()
            )));
        }
        let bytes: &'a [u8] = *self.cursor.get_ref();
        let start = bytes.len() - self.remaining();
        self.cursor.set_position((start + len) as u64);
        Ok(&bytes[start..start + len])
    }

    /// String with a one-byte length prefix
    pub(crate) fn string_u8(&mut self, field: &str) -> Result<String> {
        let len = usize::from(self.u8(field)?);
        self.bytes(len, field).map(decode_text)
    }

    /// String with a signed four-byte length prefix
    pub(crate) fn string_i32(&mut self, field: &str) -> Result<String> {
        let len = self.i32(field)?;
        let len = usize::try_from(len)
            .map_err(|_| Error::malformed(format!("negative {field} length: {len}")))?;
        self.bytes(len, field).map(decode_text)
    }
}

fn truncated(field: &str) -> Error {
    Error::malformed(format!("truncated {field}"))
}

/// Decode server text (Windows-1251)
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    WINDOWS_1251
        .decode_without_bom_handling(bytes)
        .0
        .into_owned()
}

/// Encode text as Windows-1251, replacing unmappable characters
pub(crate) fn encode_text(text: &str) -> Vec<u8> {
    WINDOWS_1251.encode(text).0.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let mut reader = PacketReader::new(&[0x01, 0x34, 0x12, 0xff, 0xff, 0xff, 0xff]);
        assert!(reader.bool("flag").unwrap());
        assert_eq!(reader.u16("players").unwrap(), 0x1234);
        assert_eq!(reader.i32("score").unwrap(), -1);
        assert_eq!(reader.remaining(), 0);
        assert!(reader.u8("extra").unwrap_err().is_malformed());
    }

    #[test]
    fn test_length_exceeding_remaining_is_malformed() {
        let mut reader = PacketReader::new(&[10, b'a', b'b']);
        let err = reader.string_u8("name").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_negative_lengths_are_malformed() {
        let neg_len = (-5i32).to_le_bytes();
        let mut reader = PacketReader::new(&neg_len);
        assert!(reader.string_i32("hostname").unwrap_err().is_malformed());

        let neg_count = (-1i16).to_le_bytes();
        let mut reader = PacketReader::new(&neg_count);
        assert!(reader.count("players").unwrap_err().is_malformed());
    }

    #[test]
    fn test_cp1251_text() {
        // "Привет" in Windows-1251
        let bytes = [0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
        assert_eq!(decode_text(&bytes), "Привет");
        assert_eq!(encode_text("Привет"), bytes);
    }
}
