//! Conversions between byte sequences and scalar values.
//!
//! Everything here is a pure function over its inputs. Integers are
//! big-endian, two's complement when signed; padding is explicit and
//! controlled by the caller.

use crate::{Error, Result, SlicePosition};
use alloc::{string::String, vec::Vec};
use arrayvec::ArrayVec;
use num_bigint::{BigInt, Sign};
use num_traits::{One, Zero};

/// Width and signedness of an integer encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntegerOptions {
    /// Width in bytes. `None` selects the minimal width.
    pub size: Option<usize>,
    /// Two's complement encoding.
    pub signed: bool,
}

impl IntegerOptions {
    /// Minimal-width unsigned encoding.
    #[inline]
    pub const fn new() -> Self {
        Self { size: None, signed: false }
    }

    /// Sets the width in bytes.
    #[inline]
    pub const fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the signedness.
    #[inline]
    pub const fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }
}

/// Returns the inclusive `(min, max)` range of an integer `size` bytes wide.
///
/// # Errors
///
/// Returns [`Error::SizeOverflow`] if the width in bits does not fit a `usize`.
pub fn integer_bounds(size: usize, signed: bool) -> Result<(BigInt, BigInt)> {
    let bits = size
        .checked_mul(8)
        .ok_or(Error::SizeOverflow { given_size: size, max_size: usize::MAX / 8 })?;
    if bits == 0 {
        return Ok((BigInt::zero(), BigInt::zero()));
    }
    Ok(if signed {
        let half = BigInt::one() << (bits - 1);
        (-half.clone(), half - BigInt::one())
    } else {
        (BigInt::zero(), (BigInt::one() << bits) - BigInt::one())
    })
}

/// Checks that `value` fits in an integer `size` bytes wide.
///
/// # Errors
///
/// Returns [`Error::IntegerOutOfRange`] with the violated bounds, or
/// [`Error::SizeOverflow`] for a width that cannot be represented.
pub fn check_integer(value: &BigInt, size: usize, signed: bool) -> Result<()> {
    let (min, max) = integer_bounds(size, signed)?;
    if *value < min || *value > max {
        return Err(Error::IntegerOutOfRange {
            value: value.clone(),
            min,
            max: Some(max),
            signed,
            size: Some(size),
        });
    }
    Ok(())
}

/// Encodes an integer as big-endian bytes.
///
/// With a `size` the output is exactly that many bytes and the value must lie in
/// [`integer_bounds`]. Without one the minimal form is returned: the magnitude for
/// unsigned values, the shortest two's complement form for signed values. Zero
/// encodes to a single zero byte.
///
/// # Errors
///
/// Returns [`Error::IntegerOutOfRange`] if the value does not fit, or if it is
/// negative and `signed` is not set.
pub fn encode_integer(value: &BigInt, options: IntegerOptions) -> Result<Vec<u8>> {
    let IntegerOptions { size, signed } = options;
    let negative = value.sign() == Sign::Minus;

    let Some(size) = size else {
        if negative && !signed {
            return Err(Error::IntegerOutOfRange {
                value: value.clone(),
                min: BigInt::zero(),
                max: None,
                signed,
                size: None,
            });
        }
        return Ok(if signed { value.to_signed_bytes_be() } else { value.to_bytes_be().1 });
    };

    check_integer(value, size, signed)?;

    let magnitude = if value.is_zero() {
        Vec::new()
    } else if negative {
        ((BigInt::one() << (size * 8)) + value).to_bytes_be().1
    } else {
        value.to_bytes_be().1
    };
    pad_left(&magnitude, size)
}

/// Decodes big-endian bytes into an integer.
///
/// # Errors
///
/// Returns [`Error::SizeOverflow`] if `size` is set and the input is longer.
pub fn decode_integer(bytes: &[u8], options: IntegerOptions) -> Result<BigInt> {
    if let Some(size) = options.size {
        assert_size(bytes, size)?;
    }
    Ok(if options.signed {
        BigInt::from_signed_bytes_be(bytes)
    } else {
        BigInt::from_bytes_be(Sign::Plus, bytes)
    })
}

/// Encodes a boolean as a `0`/`1` byte, left-padded to `size`.
pub fn encode_bool(value: bool, size: Option<usize>) -> Result<Vec<u8>> {
    let bytes = [value as u8];
    match size {
        Some(size) => {
            assert_size(&bytes, size)?;
            pad_left(&bytes, size)
        }
        None => Ok(bytes.to_vec()),
    }
}

/// Decodes a boolean. With a `size`, leading zero padding is stripped first.
pub fn decode_bool(bytes: &[u8], size: Option<usize>) -> Result<bool> {
    let bytes = match size {
        Some(size) => {
            assert_size(bytes, size)?;
            trim_left(bytes)
        }
        None => bytes,
    };
    match bytes {
        [] | [0] => Ok(false),
        [1] => Ok(true),
        _ => Err(Error::InvalidBytesBoolean(bytes.to_vec())),
    }
}

/// Encodes a string as UTF-8, right-padded to `size`.
pub fn encode_string(value: &str, size: Option<usize>) -> Result<Vec<u8>> {
    let bytes = value.as_bytes();
    match size {
        Some(size) => {
            assert_size(bytes, size)?;
            pad_right(bytes, size)
        }
        None => Ok(bytes.to_vec()),
    }
}

/// Decodes UTF-8 bytes. With a `size`, trailing zero padding is stripped first.
pub fn decode_string(bytes: &[u8], size: Option<usize>) -> Result<String> {
    let bytes = match size {
        Some(size) => {
            assert_size(bytes, size)?;
            trim_right(bytes)
        }
        None => bytes,
    };
    core::str::from_utf8(bytes)
        .map(Into::into)
        .map_err(|e| Error::InvalidUtf8 { valid_up_to: e.valid_up_to() })
}

/// Prepends zero bytes until the length equals `size`.
///
/// # Errors
///
/// Returns [`Error::SizeExceedsPaddingSize`] if the input is already longer.
pub fn pad_left(bytes: &[u8], size: usize) -> Result<Vec<u8>> {
    check_padding(bytes, size)?;
    let mut out = vec![0u8; size - bytes.len()];
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Appends zero bytes until the length equals `size`.
///
/// # Errors
///
/// Returns [`Error::SizeExceedsPaddingSize`] if the input is already longer.
pub fn pad_right(bytes: &[u8], size: usize) -> Result<Vec<u8>> {
    check_padding(bytes, size)?;
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(bytes);
    out.resize(size, 0);
    Ok(out)
}

#[inline]
fn check_padding(bytes: &[u8], size: usize) -> Result<()> {
    if bytes.len() > size {
        return Err(Error::SizeExceedsPaddingSize { size: bytes.len(), target_size: size });
    }
    Ok(())
}

/// Removes every leading zero byte.
#[inline]
pub fn trim_left(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Removes every trailing zero byte.
#[inline]
pub fn trim_right(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Fails with [`Error::SizeOverflow`] if `bytes` is longer than `size`.
#[inline]
pub fn assert_size(bytes: &[u8], size: usize) -> Result<()> {
    if bytes.len() > size {
        return Err(Error::SizeOverflow { given_size: bytes.len(), max_size: size });
    }
    Ok(())
}

/// Bounds-checked sub-slice.
///
/// A non-strict slice clamps `end` to the input length. A strict slice also fails
/// unless exactly `end - start` bytes were returned, which catches truncated input.
pub fn slice(bytes: &[u8], start: usize, end: Option<usize>, strict: bool) -> Result<&[u8]> {
    let size = bytes.len();
    if start > 0 && start >= size {
        return Err(Error::SliceOffsetOutOfBounds {
            offset: start,
            position: SlicePosition::Start,
            size,
        });
    }
    let end_offset = end.unwrap_or(size);
    if end_offset < start {
        return Err(Error::SliceOffsetOutOfBounds {
            offset: end_offset,
            position: SlicePosition::End,
            size,
        });
    }
    let value = &bytes[start..end_offset.min(size)];
    if strict && end.is_some() && value.len() != end_offset - start {
        return Err(Error::SliceOffsetOutOfBounds {
            offset: end_offset,
            position: SlicePosition::End,
            size,
        });
    }
    Ok(value)
}

/// Renders bytes as a `0x`-prefixed lowercase hex string.
#[inline]
pub fn to_hex<T: AsRef<[u8]>>(bytes: T) -> String {
    hex::encode_prefixed(bytes)
}

/// Parses a `0x`-prefixed hex string with an even number of digits.
pub fn from_hex(value: &str) -> Result<Vec<u8>> {
    let digits = value.strip_prefix("0x").ok_or(Error::MissingHexPrefix)?;
    if digits.len() % 2 != 0 {
        return Err(Error::InvalidHexLength { length: digits.len() });
    }
    // checked up front so a second `0x` marker is reported, not skipped
    if let Some((index, c)) = digits.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(Error::InvalidHexCharacter { c, index: index + 2 });
    }
    hex::decode(digits).map_err(|_| Error::InvalidHexLength { length: digits.len() })
}

/// Checks whether `value` is a hex string.
///
/// Non-strict only checks the `0x` marker; strict also requires an even number of
/// valid hex digits.
pub fn is_hex(value: &str, strict: bool) -> bool {
    match value.strip_prefix("0x") {
        Some(digits) if strict => {
            digits.len() % 2 == 0 && digits.bytes().all(|b| b.is_ascii_hexdigit())
        }
        Some(_) => true,
        None => false,
    }
}

/// Concatenates byte sequences.
#[inline]
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// Minimal big-endian bytes of `value`; empty for zero.
#[inline]
pub fn be_bytes_trimmed(value: u64) -> ArrayVec<u8, 8> {
    let be = value.to_be_bytes();
    be[(value.leading_zeros() / 8) as usize..].iter().copied().collect()
}

/// Reads up to eight big-endian bytes as a `u64`.
#[inline]
pub fn decode_be_u64(bytes: &[u8]) -> Result<u64> {
    assert_size(bytes, 8)?;
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn int(value: i64) -> BigInt {
        BigInt::from(value)
    }

    #[test]
    fn integer_range() {
        let opts = IntegerOptions::new().size(32);
        let max = (BigInt::one() << 256) - BigInt::one();
        assert_eq!(encode_integer(&max, opts).unwrap(), [0xff; 32]);

        let over = BigInt::one() << 256;
        assert!(matches!(
            encode_integer(&over, opts),
            Err(Error::IntegerOutOfRange { size: Some(32), signed: false, .. })
        ));

        let opts = IntegerOptions::new().size(1).signed(true);
        assert_eq!(encode_integer(&int(127), opts).unwrap(), [0x7f]);
        assert_eq!(encode_integer(&int(-128), opts).unwrap(), [0x80]);
        assert!(encode_integer(&int(128), opts).is_err());
        assert!(encode_integer(&int(-129), opts).is_err());

        let huge = usize::MAX / 4;
        assert_eq!(
            encode_integer(&int(1), IntegerOptions::new().size(huge)),
            Err(Error::SizeOverflow { given_size: huge, max_size: usize::MAX / 8 })
        );
        assert_eq!(integer_bounds(2, true), Ok((int(-32768), int(32767))));
    }

    #[test]
    fn integer_minimal() {
        assert_eq!(encode_integer(&int(0), IntegerOptions::new()).unwrap(), [0]);
        assert_eq!(encode_integer(&int(420), IntegerOptions::new()).unwrap(), hex!("01a4"));
        assert_eq!(
            encode_integer(&int(-1), IntegerOptions::new().signed(true)).unwrap(),
            [0xff]
        );
        assert!(matches!(
            encode_integer(&int(-1), IntegerOptions::new()),
            Err(Error::IntegerOutOfRange { max: None, .. })
        ));
    }

    #[test]
    fn integer_sign_extension() {
        let opts = IntegerOptions::new().size(4).signed(true);
        assert_eq!(encode_integer(&int(-2), opts).unwrap(), hex!("fffffffe"));
        assert_eq!(decode_integer(&hex!("fffffffe"), opts).unwrap(), int(-2));
        // top bit clear means positive even when signed
        assert_eq!(decode_integer(&hex!("7fffffff"), opts).unwrap(), int(i32::MAX as i64));
        assert_eq!(
            decode_integer(&hex!("fffffffe"), IntegerOptions::new().size(4)).unwrap(),
            int(0xfffffffe)
        );
        assert_eq!(
            decode_integer(&hex!("0102"), IntegerOptions::new().size(1)),
            Err(Error::SizeOverflow { given_size: 2, max_size: 1 })
        );
    }

    #[test]
    fn booleans() {
        assert_eq!(encode_bool(true, None).unwrap(), [1]);
        assert_eq!(encode_bool(true, Some(32)).unwrap()[31], 1);
        assert!(decode_bool(&encode_bool(true, Some(32)).unwrap(), Some(32)).unwrap());
        assert!(!decode_bool(&[0; 32], Some(32)).unwrap());
        assert_eq!(decode_bool(&[2], None), Err(Error::InvalidBytesBoolean(vec![2])));
        assert_eq!(decode_bool(&[0, 1], None), Err(Error::InvalidBytesBoolean(vec![0, 1])));
    }

    #[test]
    fn strings() {
        let padded = encode_string("hi", Some(4)).unwrap();
        assert_eq!(padded, b"hi\0\0");
        assert_eq!(decode_string(&padded, Some(4)).unwrap(), "hi");
        assert_eq!(decode_string(&[0xff], None), Err(Error::InvalidUtf8 { valid_up_to: 0 }));
    }

    #[test]
    fn padding() {
        assert_eq!(pad_left(&[1, 2], 4).unwrap(), [0, 0, 1, 2]);
        assert_eq!(pad_right(&[1, 2], 4).unwrap(), [1, 2, 0, 0]);
        assert_eq!(pad_left(&[], 0).unwrap(), Vec::<u8>::new());
        assert_eq!(
            pad_left(&[1, 2, 3], 2),
            Err(Error::SizeExceedsPaddingSize { size: 3, target_size: 2 })
        );
        let once = pad_left(&[7], 32).unwrap();
        assert_eq!(pad_left(&once, 32).unwrap(), once);
    }

    #[test]
    fn trimming() {
        assert_eq!(trim_left(&[0, 0, 1, 0]), [1, 0]);
        assert_eq!(trim_right(&[0, 1, 0, 0]), [0, 1]);
        assert!(trim_left(&[0, 0]).is_empty());
        assert!(trim_right(&[]).is_empty());
    }

    #[test]
    fn slicing() {
        let bytes = [1, 2, 3, 4];
        assert_eq!(slice(&bytes, 1, Some(3), true).unwrap(), [2, 3]);
        assert_eq!(slice(&bytes, 2, Some(10), false).unwrap(), [3, 4]);
        assert_eq!(slice(&bytes, 0, None, true).unwrap(), bytes);
        assert_eq!(
            slice(&bytes, 4, None, false),
            Err(Error::SliceOffsetOutOfBounds {
                offset: 4,
                position: SlicePosition::Start,
                size: 4
            })
        );
        assert_eq!(
            slice(&bytes, 2, Some(10), true),
            Err(Error::SliceOffsetOutOfBounds { offset: 10, position: SlicePosition::End, size: 4 })
        );
    }

    #[test]
    fn hex_strings() {
        assert_eq!(to_hex([0u8; 0]), "0x");
        assert_eq!(to_hex([0xde, 0xad]), "0xdead");
        assert_eq!(from_hex("0xDEad").unwrap(), [0xde, 0xad]);
        assert!(from_hex("0x").unwrap().is_empty());
        assert_eq!(from_hex("dead"), Err(Error::MissingHexPrefix));
        assert_eq!(from_hex("0xabc"), Err(Error::InvalidHexLength { length: 3 }));
        assert_eq!(from_hex("0xzz"), Err(Error::InvalidHexCharacter { c: 'z', index: 2 }));
        assert_eq!(from_hex("0x0x12"), Err(Error::InvalidHexCharacter { c: 'x', index: 3 }));
        assert!(is_hex("0xabc", false));
        assert!(!is_hex("0xabc", true));
        assert!(is_hex("0xabcd", true));
        assert!(!is_hex("abcd", false));

        assert_eq!(concat(&[&[0xde][..], &[], &[0xad, 0xbe]]), [0xde, 0xad, 0xbe]);
        assert!(concat(&[]).is_empty());
    }

    #[test]
    fn be_bytes() {
        assert_eq!(&be_bytes_trimmed(0)[..], &[] as &[u8]);
        assert_eq!(&be_bytes_trimmed(0x0400)[..], &[4, 0]);
        assert_eq!(&be_bytes_trimmed(u64::MAX)[..], &[0xff; 8]);
        assert_eq!(decode_be_u64(&[4, 0]).unwrap(), 0x400);
        assert!(decode_be_u64(&[1; 9]).is_err());
    }
}
