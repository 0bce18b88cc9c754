//! Recursive Length Prefix encoding.
//!
//! An [`Item`] is either a byte string or a list of items. Encoding is total;
//! decoding rejects every non-canonical form.

mod decode;
pub use decode::{decode, decode_first, Decoder, DEFAULT_MAX_DEPTH};

mod encode;
pub use encode::{encode, encode_list, length_of_length, list_length, Encodable};

mod header;
pub use header::Header;

use crate::{scalar, Result, RlpErrorKind};
use alloc::{string::String, vec::Vec};
use bytes::Bytes;

/// RLP prefix byte for 0-length string.
pub const EMPTY_STRING_CODE: u8 = 0x80;

/// RLP prefix byte for a 0-length array.
pub const EMPTY_LIST_CODE: u8 = 0xC0;

/// A decoded RLP value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    /// A byte string.
    Bytes(Bytes),
    /// A list of items.
    List(Vec<Item>),
}

impl Item {
    /// Returns `true` if this is a list.
    #[inline]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the byte string, if this is one.
    #[inline]
    pub const fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::List(_) => None,
        }
    }

    /// Returns the list elements, if this is a list.
    #[inline]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            Self::Bytes(_) => None,
        }
    }

    /// Interprets a byte string as a canonical unsigned integer.
    ///
    /// The empty string is zero; a leading zero byte is rejected. Returns `None` for
    /// lists.
    pub fn to_u64(&self) -> Option<Result<u64>> {
        let bytes = self.as_bytes()?;
        Some(match bytes.first() {
            None => Ok(0),
            Some(0) => Err(header::rlp_error(RlpErrorKind::LeadingZero, 0)),
            Some(_) if bytes.len() > 8 => Err(header::rlp_error(RlpErrorKind::Overflow, 0)),
            Some(_) => scalar::decode_be_u64(bytes),
        })
    }
}

impl From<Bytes> for Item {
    #[inline]
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Item {
    #[inline]
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<&str> for Item {
    #[inline]
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl From<Vec<Item>> for Item {
    #[inline]
    fn from(items: Vec<Item>) -> Self {
        Self::List(items)
    }
}

/// Encodes a value and renders it as a hex string.
#[inline]
pub fn to_hex<T: Encodable>(value: T) -> String {
    scalar::to_hex(encode(value))
}

/// Decodes exactly one item from a hex string.
pub fn from_hex(value: &str) -> Result<Item> {
    decode(&scalar::from_hex(value)?)
}
