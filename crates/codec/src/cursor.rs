use crate::{scalar, Error, Result};
use alloc::collections::BTreeMap;

/// Default number of re-reads of already visited positions a [`Cursor`] allows.
pub const DEFAULT_RECURSIVE_READ_LIMIT: usize = 8192;

/// Read position over a byte slice, owned by a single decode call.
///
/// Reads past the end are errors, never truncation. Every read records its start
/// position; reading a position a second time counts towards the recursive read
/// limit, which bounds the work done on inputs whose offsets point back into
/// themselves.
#[derive(Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
    read_counts: BTreeMap<usize, usize>,
    recursive_read_count: usize,
    recursive_read_limit: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at position 0 with the default recursive read limit.
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_recursive_read_limit(bytes, DEFAULT_RECURSIVE_READ_LIMIT)
    }

    /// Creates a cursor with a custom recursive read limit. `usize::MAX` disables
    /// read tracking altogether.
    #[inline]
    pub fn with_recursive_read_limit(bytes: &'a [u8], recursive_read_limit: usize) -> Self {
        Self {
            bytes,
            position: 0,
            read_counts: BTreeMap::new(),
            recursive_read_count: 0,
            recursive_read_limit,
        }
    }

    /// The underlying bytes.
    #[inline]
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Current position.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Length of the underlying bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the underlying bytes are empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes left after the current position.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Moves to `position`, returning the previous one. The end of the input is a
    /// valid position.
    pub fn set_position(&mut self, position: usize) -> Result<usize> {
        self.assert_position(position)?;
        Ok(core::mem::replace(&mut self.position, position))
    }

    /// Returns the next byte without advancing.
    #[inline]
    pub fn peek_u8(&self) -> Result<u8> {
        self.bytes.get(self.position).copied().ok_or(Error::PositionOutOfBounds {
            position: self.position,
            length: self.bytes.len(),
        })
    }

    /// Reads one byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Reads `len` bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.read_padded(len, len)
    }

    /// Reads `len` bytes and then advances by `size` bytes in total, skipping the
    /// padding that follows the value.
    pub fn read_padded(&mut self, len: usize, size: usize) -> Result<&'a [u8]> {
        self.touch()?;
        let start = self.position;
        let end = start.checked_add(len.max(size)).unwrap_or(usize::MAX);
        self.assert_position(end)?;
        self.position = start + size;
        Ok(&self.bytes[start..start + len])
    }

    /// Reads `len <= 8` bytes as a big-endian integer.
    pub fn read_be_u64(&mut self, len: usize) -> Result<u64> {
        let bytes = self.read_bytes(len)?;
        scalar::decode_be_u64(bytes)
    }

    /// Reads a 32-byte word.
    #[inline]
    pub fn read_word(&mut self) -> Result<&'a [u8]> {
        self.read_bytes(32)
    }

    /// Reads a 32-byte word holding an offset or a length.
    pub fn read_word_usize(&mut self) -> Result<usize> {
        let at = self.position;
        let word = self.read_word()?;
        let (high, low) = word.split_at(24);
        if high.iter().any(|&b| b != 0) {
            return Err(Error::InvalidOffset { at });
        }
        let value = scalar::decode_be_u64(low)?;
        usize::try_from(value).map_err(|_| Error::InvalidOffset { at })
    }

    #[inline]
    fn assert_position(&self, position: usize) -> Result<()> {
        if position > self.bytes.len() {
            return Err(Error::PositionOutOfBounds { position, length: self.bytes.len() });
        }
        Ok(())
    }

    fn touch(&mut self) -> Result<()> {
        if self.recursive_read_limit == usize::MAX {
            return Ok(());
        }
        if self.recursive_read_count >= self.recursive_read_limit {
            return Err(Error::RecursiveReadLimitExceeded {
                count: self.recursive_read_count + 1,
                limit: self.recursive_read_limit,
            });
        }
        let count = self.read_counts.entry(self.position).or_insert(0);
        if *count > 0 {
            self.recursive_read_count += 1;
        }
        *count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_bounds() {
        let data = [1, 2, 3, 4, 5];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 1);
        assert_eq!(cursor.read_bytes(2).unwrap(), [2, 3]);
        assert_eq!(cursor.remaining(), 2);
        assert_eq!(
            cursor.read_bytes(3),
            Err(Error::PositionOutOfBounds { position: 6, length: 5 })
        );
        // failed reads do not move the cursor
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.set_position(5).unwrap(), 3);
        assert!(cursor.peek_u8().is_err());
        assert!(cursor.set_position(6).is_err());
    }

    #[test]
    fn padded_reads() {
        let data = [0xaa, 0xbb, 0, 0, 0xcc];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_padded(2, 4).unwrap(), [0xaa, 0xbb]);
        assert_eq!(cursor.read_u8().unwrap(), 0xcc);
    }

    #[test]
    fn big_endian_reads() {
        let data = [0x04, 0x00, 0x01];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_be_u64(2).unwrap(), 0x400);
        assert_eq!(cursor.read_be_u64(0).unwrap(), 0);
        assert_eq!(
            cursor.read_be_u64(2),
            Err(Error::PositionOutOfBounds { position: 4, length: 3 })
        );
        assert_eq!(cursor.read_be_u64(1).unwrap(), 1);
    }

    #[test]
    fn offset_words() {
        let mut data = [0u8; 64];
        data[31] = 0x40;
        data[32] = 1;
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_word_usize().unwrap(), 0x40);
        assert_eq!(cursor.read_word_usize(), Err(Error::InvalidOffset { at: 32 }));
    }

    #[test]
    fn recursive_read_limit() {
        let data = [0u8; 4];
        let mut cursor = Cursor::with_recursive_read_limit(&data, 2);
        for _ in 0..3 {
            cursor.set_position(0).unwrap();
            cursor.read_u8().unwrap();
        }
        cursor.set_position(0).unwrap();
        assert_eq!(
            cursor.read_u8(),
            Err(Error::RecursiveReadLimitExceeded { count: 3, limit: 2 })
        );

        let mut cursor = Cursor::with_recursive_read_limit(&data, usize::MAX);
        for _ in 0..100 {
            cursor.set_position(0).unwrap();
            cursor.read_u8().unwrap();
        }
    }
}
