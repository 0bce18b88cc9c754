use alloc::{string::String, vec::Vec};
use core::fmt;
use num_bigint::BigInt;

/// Codec result type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Which end of a slice was out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlicePosition {
    /// The start offset.
    Start,
    /// The end offset.
    End,
}

impl fmt::Display for SlicePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "starting",
            Self::End => "ending",
        })
    }
}

/// Why an address failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressReason {
    /// Not `0x` followed by 40 hexadecimal characters.
    InvalidInput,
    /// Mixed-case address that does not match its checksum.
    InvalidChecksum,
}

impl fmt::Display for AddressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidInput => "not a 20 byte (40 hexadecimal character) value",
            Self::InvalidChecksum => "does not match its checksum counterpart",
        })
    }
}

/// RLP decoding error with byte position context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RlpError {
    /// The byte position in the input where the error occurred.
    pub bytepos: usize,
    /// The kind of error.
    pub kind: RlpErrorKind,
}

impl RlpError {
    /// Creates a new error with the given kind and byte position.
    #[inline]
    pub const fn new(kind: RlpErrorKind, bytepos: usize) -> Self {
        Self { bytepos, kind }
    }
}

impl fmt::Display for RlpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.kind, self.bytepos)
    }
}

/// Malformed RLP encodings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RlpErrorKind {
    /// Declared length does not fit in a `usize`.
    Overflow,
    /// Length of a long-form item starts with a zero byte.
    LeadingZero,
    /// Single byte below `0x80` wrapped in a string header.
    NonCanonicalSingleByte,
    /// Long-form header used for a payload shorter than 56 bytes.
    NonCanonicalSize,
    /// A list child crossed the list's declared payload boundary.
    ListLengthMismatch {
        /// Declared payload length.
        expected: usize,
        /// Bytes consumed by the children.
        got: usize,
    },
    /// Input left over after the top-level item.
    TrailingBytes {
        /// Number of unconsumed bytes.
        remaining: usize,
    },
}

impl fmt::Display for RlpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => f.write_str("overflow"),
            Self::LeadingZero => f.write_str("leading zero"),
            Self::NonCanonicalSingleByte => f.write_str("non-canonical single byte"),
            Self::NonCanonicalSize => f.write_str("non-canonical size"),
            Self::ListLengthMismatch { expected, got } => {
                write!(f, "list payload length mismatch (got {got}, expected {expected})")
            }
            Self::TrailingBytes { remaining } => write!(f, "{remaining} trailing bytes"),
        }
    }
}

/// Codec error.
///
/// Every variant carries the inputs that caused it, so callers can branch on the kind
/// rather than on the message text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    // scalar
    /// Integer does not fit in the requested width.
    IntegerOutOfRange {
        /// The offending value.
        value: BigInt,
        /// Smallest allowed value.
        min: BigInt,
        /// Largest allowed value, `None` when unbounded.
        max: Option<BigInt>,
        /// Whether the encoding is signed.
        signed: bool,
        /// Requested width in bytes, `None` when minimal.
        size: Option<usize>,
    },
    /// Input is longer than the padding target.
    SizeExceedsPaddingSize {
        /// Input size in bytes.
        size: usize,
        /// Padding target in bytes.
        target_size: usize,
    },
    /// Input is longer than the allowed size.
    SizeOverflow {
        /// Input size in bytes.
        given_size: usize,
        /// Maximum size in bytes.
        max_size: usize,
    },
    /// Slice offset out of bounds.
    SliceOffsetOutOfBounds {
        /// The offending offset.
        offset: usize,
        /// Which end of the slice.
        position: SlicePosition,
        /// Size of the sliced value.
        size: usize,
    },
    /// Bytes do not hold a boolean.
    InvalidBytesBoolean(Vec<u8>),
    /// Bytes are not valid UTF-8.
    InvalidUtf8 {
        /// Index of the first invalid byte.
        valid_up_to: usize,
    },
    /// Hex string lacks the `0x` marker.
    MissingHexPrefix,
    /// Hex string has an odd number of digits.
    InvalidHexLength {
        /// Digit count, excluding the marker.
        length: usize,
    },
    /// Hex string contains a non-hex character.
    InvalidHexCharacter {
        /// The character.
        c: char,
        /// Its index in the full string.
        index: usize,
    },

    // cursor
    /// Read or seek past the end of the input.
    PositionOutOfBounds {
        /// The offending position.
        position: usize,
        /// Input length.
        length: usize,
    },
    /// Too many reads of already-visited positions.
    RecursiveReadLimitExceeded {
        /// Re-reads so far.
        count: usize,
        /// Configured limit.
        limit: usize,
    },
    /// Nesting deeper than the configured limit.
    RecursionLimitExceeded {
        /// Depth reached.
        depth: usize,
        /// Configured limit.
        limit: usize,
    },
    /// A 32-byte offset or length word does not fit in a `usize`.
    InvalidOffset {
        /// Position of the word.
        at: usize,
    },

    // rlp
    /// Malformed RLP.
    Rlp(RlpError),

    // address
    /// Invalid address.
    InvalidAddress {
        /// The address text.
        address: String,
        /// What is wrong with it.
        reason: AddressReason,
    },

    // abi
    /// Parameter and value counts differ.
    LengthMismatch {
        /// Number of parameters.
        expected: usize,
        /// Number of values.
        given: usize,
    },
    /// Fixed-size array given the wrong number of elements.
    ArrayLengthMismatch {
        /// The array type.
        ty: String,
        /// Declared length.
        expected: usize,
        /// Given length.
        given: usize,
    },
    /// Byte array size differs from its declared size.
    BytesSizeMismatch {
        /// Declared size.
        expected: usize,
        /// Actual size.
        given: usize,
    },
    /// Value for an array type is not an array.
    InvalidArray {
        /// The array type.
        ty: String,
    },
    /// Unrecognized type string.
    InvalidType(String),
    /// Value does not match its parameter type.
    TypeMismatch {
        /// The parameter type.
        expected: String,
        /// The value kind.
        given: &'static str,
    },
    /// Decoding empty data with a non-empty parameter list.
    ZeroData,
    /// Non-empty data shorter than one 32-byte word.
    DataSizeTooSmall {
        /// Data size in bytes.
        size: usize,
        /// The parameter list, formatted.
        params: String,
    },

    // typed data
    /// Primary type is not part of the type table.
    InvalidPrimaryType {
        /// The primary type.
        primary_type: String,
        /// Type names that are present.
        types: Vec<String>,
    },
    /// Explicit `EIP712Domain` schema names a field the domain does not carry.
    InvalidDomain {
        /// The field.
        field: String,
    },
    /// Struct name collides with a primitive type name.
    InvalidStructType {
        /// The struct name.
        ty: String,
    },
    /// Struct data lacks a declared field.
    MissingField {
        /// The struct type.
        ty: String,
        /// The field name.
        field: String,
    },
    /// Integer field value does not fit its declared type.
    FieldOutOfRange {
        /// The field name.
        field: String,
        /// The declared type.
        ty: String,
        /// The offending value.
        value: BigInt,
    },
}

impl From<RlpError> for Error {
    #[inline]
    fn from(err: RlpError) -> Self {
        Self::Rlp(err)
    }
}

#[cfg(all(feature = "core-error", not(feature = "std")))]
impl core::error::Error for Error {}
#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(all(feature = "core-error", not(feature = "std")))]
impl core::error::Error for RlpError {}
#[cfg(feature = "std")]
impl std::error::Error for RlpError {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntegerOutOfRange { value, min, max, signed, size } => {
                let sign = if *signed { "signed" } else { "unsigned" };
                match (max, size) {
                    (Some(max), Some(size)) => write!(
                        f,
                        "number `{value}` is not in safe {}-bit {sign} integer range (`{min}` to `{max}`)",
                        size * 8
                    ),
                    (Some(max), None) => {
                        write!(f, "number `{value}` is not in {sign} range (`{min}` to `{max}`)")
                    }
                    (None, _) => write!(f, "number `{value}` is below the {sign} minimum `{min}`"),
                }
            }
            Self::SizeExceedsPaddingSize { size, target_size } => {
                write!(f, "size ({size}) exceeds padding size ({target_size})")
            }
            Self::SizeOverflow { given_size, max_size } => {
                write!(f, "size cannot exceed {max_size} bytes, given size: {given_size} bytes")
            }
            Self::SliceOffsetOutOfBounds { offset, position, size } => {
                write!(f, "slice {position} at offset {offset} is out-of-bounds (size: {size})")
            }
            Self::InvalidBytesBoolean(bytes) => {
                write!(f, "bytes value {} is not a valid boolean", hex::encode_prefixed(bytes))
            }
            Self::InvalidUtf8 { valid_up_to } => {
                write!(f, "invalid utf-8 sequence after byte {valid_up_to}")
            }
            Self::MissingHexPrefix => f.write_str("hex string must start with `0x`"),
            Self::InvalidHexLength { length } => {
                write!(f, "hex string has an odd number of digits ({length})")
            }
            Self::InvalidHexCharacter { c, index } => {
                write!(f, "invalid hex character {c:?} at index {index}")
            }
            Self::PositionOutOfBounds { position, length } => {
                write!(f, "position {position} is out of bounds (length: {length})")
            }
            Self::RecursiveReadLimitExceeded { count, limit } => {
                write!(f, "recursive read limit of {limit} exceeded (count: {count})")
            }
            Self::RecursionLimitExceeded { depth, limit } => {
                write!(f, "nesting depth {depth} exceeds the limit of {limit}")
            }
            Self::InvalidOffset { at } => {
                write!(f, "word at position {at} is too large for an offset or length")
            }
            Self::Rlp(err) => write!(f, "invalid RLP: {err}"),
            Self::InvalidAddress { address, reason } => {
                write!(f, "address {address:?} is invalid: {reason}")
            }
            Self::LengthMismatch { expected, given } => write!(
                f,
                "ABI encoding parameters/values length mismatch: expected {expected} values, given {given}"
            ),
            Self::ArrayLengthMismatch { ty, expected, given } => write!(
                f,
                "array length mismatch for type `{ty}`: expected {expected}, given {given}"
            ),
            Self::BytesSizeMismatch { expected, given } => {
                write!(f, "expected bytes{expected}, got bytes{given}")
            }
            Self::InvalidArray { ty } => write!(f, "value for `{ty}` is not a valid array"),
            Self::InvalidType(ty) => write!(f, "type `{ty}` is not a valid ABI type"),
            Self::TypeMismatch { expected, given } => {
                write!(f, "cannot encode {given} value as `{expected}`")
            }
            Self::ZeroData => f.write_str("cannot decode zero data (\"0x\") with ABI parameters"),
            Self::DataSizeTooSmall { size, params } => write!(
                f,
                "data size of {size} bytes is too small for given parameters ({params})"
            ),
            Self::InvalidPrimaryType { primary_type, types } => write!(
                f,
                "invalid primary type `{primary_type}`, must be one of {types:?}"
            ),
            Self::InvalidDomain { field } => {
                write!(f, "invalid domain: `EIP712Domain` declares `{field}` but the domain has no such value")
            }
            Self::InvalidStructType { ty } => {
                write!(f, "struct type `{ty}` is invalid, it must not be a Solidity type")
            }
            Self::MissingField { ty, field } => write!(f, "`{ty}` value is missing field `{field}`"),
            Self::FieldOutOfRange { field, ty, value } => {
                write!(f, "value `{value}` of field `{field}` does not fit `{ty}`")
            }
        }
    }
}
