use super::{header::rlp_error, Header, Item};
use crate::{Cursor, Error, Result, RlpErrorKind};
use alloc::vec::Vec;
use bytes::Bytes;

/// Default maximum list nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// RLP decoder configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoder {
    max_depth: usize,
}

impl Default for Decoder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Creates a decoder with the default nesting limit.
    #[inline]
    pub const fn new() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }

    /// Sets the maximum list nesting depth. A top-level list has depth 1.
    #[inline]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Decodes exactly one item spanning the whole input.
    ///
    /// The empty input decodes to the empty byte string.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoding is invalid or if data remains after the item.
    pub fn decode(&self, bytes: &[u8]) -> Result<Item> {
        let (item, consumed) = self.decode_first(bytes)?;
        if consumed < bytes.len() {
            let remaining = bytes.len() - consumed;
            debug!(target: "evm_codec::rlp", remaining, "trailing bytes after RLP item");
            return Err(rlp_error(RlpErrorKind::TrailingBytes { remaining }, consumed));
        }
        Ok(item)
    }

    /// Decodes the first item of the input, returning it with the number of bytes
    /// it occupied.
    pub fn decode_first(&self, bytes: &[u8]) -> Result<(Item, usize)> {
        if bytes.is_empty() {
            return Ok((Item::Bytes(Bytes::new()), 0));
        }
        // Nothing is read twice, so re-read tracking is not needed.
        let mut cursor = Cursor::with_recursive_read_limit(bytes, usize::MAX);
        let item = self.decode_item(&mut cursor)?;
        Ok((item, cursor.position()))
    }

    /// Decodes one item at the cursor position, advancing past it.
    pub fn decode_item(&self, cursor: &mut Cursor<'_>) -> Result<Item> {
        self.read_item(cursor, 0)
    }

    fn read_item(&self, cursor: &mut Cursor<'_>, depth: usize) -> Result<Item> {
        let start = cursor.position();
        let header = Header::decode(cursor)?;
        if !header.list {
            let payload = cursor.read_bytes(header.payload_length)?;
            return Ok(Item::Bytes(Bytes::copy_from_slice(payload)));
        }

        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(Error::RecursionLimitExceeded { depth, limit: self.max_depth });
        }

        let payload_start = cursor.position();
        let end = payload_start + header.payload_length;
        let mut items = Vec::new();
        while cursor.position() < end {
            items.push(self.read_item(cursor, depth)?);
        }
        if cursor.position() != end {
            return Err(rlp_error(
                RlpErrorKind::ListLengthMismatch {
                    expected: header.payload_length,
                    got: cursor.position() - payload_start,
                },
                start,
            ));
        }
        Ok(Item::List(items))
    }
}

/// Decodes exactly one item spanning the whole input, with the default limits.
#[inline]
pub fn decode(bytes: &[u8]) -> Result<Item> {
    Decoder::new().decode(bytes)
}

/// Decodes the first item of the input, with the default limits.
#[inline]
pub fn decode_first(bytes: &[u8]) -> Result<(Item, usize)> {
    Decoder::new().decode_first(bytes)
}
