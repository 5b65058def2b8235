//! The Minecraft `VarInt` encoding, as used by the Server List Ping framing.
//!
//! The type is specified [in wiki.vg](https://wiki.vg/Protocol#VarInt_and_VarLong).

use crate::errors::SlpProtocolError;
use bytes::BufMut;

pub(crate) const SEGMENT_BITS: u8 = 0x7f; // 0111 1111
pub(crate) const CONTINUE_BIT: u8 = 0x80; // 1000 0000

/// At most five bytes are needed for 32 bits.
pub(crate) const MAX_LEN: usize = 5;

/// Append `value` to `buf` as a `VarInt`.
pub(crate) fn put_varint(buf: &mut impl BufMut, value: i32) {
    let mut value = value as u32;

    loop {
        let segment = (value & SEGMENT_BITS as u32) as u8;
        value >>= 7;

        if value == 0 {
            buf.put_u8(segment);
            return;
        }

        buf.put_u8(segment | CONTINUE_BIT);
    }
}

/// Number of bytes `value` takes once encoded.
pub(crate) fn varint_len(value: i32) -> usize {
    let mut value = value as u32;
    let mut len = 1;

    while value >= CONTINUE_BIT as u32 {
        value >>= 7;
        len += 1;
    }

    len
}

/// Incremental decoder, fed one byte at a time as bytes arrive on a socket.
#[derive(Debug, Default)]
pub(crate) struct VarIntDecoder {
    value: i32,
    position: usize,
}

impl VarIntDecoder {
    /// Feed the next byte. Returns the value once the last byte was seen.
    pub(crate) fn push(&mut self, byte: u8) -> Result<Option<i32>, SlpProtocolError> {
        if self.position >= MAX_LEN {
            return Err(SlpProtocolError::InvalidVarInt);
        }

        self.value |= ((byte & SEGMENT_BITS) as i32) << (7 * self.position);
        self.position += 1;

        if byte & CONTINUE_BIT == 0 {
            Ok(Some(self.value))
        } else if self.position == MAX_LEN {
            Err(SlpProtocolError::InvalidVarInt)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{put_varint, varint_len, VarIntDecoder};
    use crate::errors::SlpProtocolError;
    use bytes::BytesMut;

    const CASES: [(i32, &[u8]); 9] = [
        (0, b"\x00"),
        (1, b"\x01"),
        (127, b"\x7f"),
        (128, b"\x80\x01"),
        (255, b"\xff\x01"),
        (25565, b"\xdd\xc7\x01"),
        (i32::MAX, b"\xff\xff\xff\xff\x07"),
        (-1, b"\xff\xff\xff\xff\x0f"),
        (i32::MIN, b"\x80\x80\x80\x80\x08"),
    ];

    #[test]
    fn test_encode() {
        for (value, expected) in CASES {
            let mut buf = BytesMut::new();
            put_varint(&mut buf, value);
            assert_eq!(&buf[..], expected, "{value}");
            assert_eq!(varint_len(value), expected.len(), "{value}");
        }
    }

    #[test]
    fn test_decode() {
        for (expected, bytes) in CASES {
            let mut decoder = VarIntDecoder::default();
            let mut decoded = None;

            for &byte in bytes {
                assert!(decoded.is_none(), "decoded before the last byte");
                decoded = decoder.push(byte).unwrap();
            }

            assert_eq!(decoded, Some(expected));
        }
    }

    #[test]
    fn test_decode_too_long() {
        let mut decoder = VarIntDecoder::default();
        for _ in 0..4 {
            assert!(matches!(decoder.push(0xff), Ok(None)));
        }
        assert!(matches!(
            decoder.push(0xff),
            Err(SlpProtocolError::InvalidVarInt)
        ));
    }
}
