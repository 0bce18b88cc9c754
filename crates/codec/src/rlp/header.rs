use super::{length_of_length, EMPTY_LIST_CODE, EMPTY_STRING_CODE};
use crate::{scalar, Cursor, Error, Result, RlpError, RlpErrorKind};
use bytes::BufMut;

/// The header of an RLP item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    /// True if list, false otherwise.
    pub list: bool,
    /// Length of the payload in bytes.
    pub payload_length: usize,
}

impl Header {
    /// Decodes an RLP header at the cursor position.
    ///
    /// A single byte below `0x80` is its own payload: the cursor is left on it and
    /// the header reports a one-byte string. Otherwise the cursor is advanced past
    /// the header. The payload is checked to be within the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is too short or the header is not canonical.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let start = cursor.position();
        let payload_length;
        let mut list = false;
        match cursor.peek_u8()? {
            0..=0x7F => payload_length = 1,

            b @ EMPTY_STRING_CODE..=0xB7 => {
                cursor.read_u8()?;
                payload_length = (b - EMPTY_STRING_CODE) as usize;
                if payload_length == 1 && cursor.peek_u8()? < EMPTY_STRING_CODE {
                    return Err(rlp_error(RlpErrorKind::NonCanonicalSingleByte, start));
                }
            }

            b @ (0xB8..=0xBF | 0xF8..=0xFF) => {
                cursor.read_u8()?;

                list = b >= 0xF8; // second range
                let code = if list { 0xF7 } else { 0xB7 };
                let len_of_len = (b - code) as usize;

                let len = cursor.read_be_u64(len_of_len)?;
                if scalar::be_bytes_trimmed(len).len() != len_of_len {
                    return Err(rlp_error(RlpErrorKind::LeadingZero, start));
                }
                payload_length = usize::try_from(len)
                    .map_err(|_| rlp_error(RlpErrorKind::Overflow, start))?;
                if payload_length < 56 {
                    return Err(rlp_error(RlpErrorKind::NonCanonicalSize, start));
                }
            }

            b @ EMPTY_LIST_CODE..=0xF7 => {
                cursor.read_u8()?;
                list = true;
                payload_length = (b - EMPTY_LIST_CODE) as usize;
            }
        }

        let end = cursor
            .position()
            .checked_add(payload_length)
            .ok_or_else(|| rlp_error(RlpErrorKind::Overflow, start))?;
        if end > cursor.len() {
            return Err(Error::PositionOutOfBounds { position: end, length: cursor.len() });
        }

        Ok(Self { list, payload_length })
    }

    /// Encodes the header into the `out` buffer.
    #[inline]
    pub fn encode(&self, out: &mut dyn BufMut) {
        if self.payload_length < 56 {
            let code = if self.list { EMPTY_LIST_CODE } else { EMPTY_STRING_CODE };
            out.put_u8(code + self.payload_length as u8);
        } else {
            let len_be = scalar::be_bytes_trimmed(self.payload_length as u64);
            let code = if self.list { 0xF7 } else { 0xB7 };
            out.put_u8(code + len_be.len() as u8);
            out.put_slice(&len_be);
        }
    }

    /// Returns the length of the encoded header.
    #[inline]
    pub const fn length(&self) -> usize {
        length_of_length(self.payload_length)
    }

    /// Returns the total length of the encoded header and payload.
    #[inline]
    pub const fn length_with_payload(&self) -> usize {
        self.length() + self.payload_length
    }
}

#[inline]
pub(crate) fn rlp_error(kind: RlpErrorKind, bytepos: usize) -> Error {
    RlpError::new(kind, bytepos).into()
}
