use alloc::{collections::BTreeMap, string::String, vec::Vec};
use bytes::Bytes;
use num_bigint::BigInt;

/// A value of some ABI type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Integer of any width, signed or unsigned.
    Int(BigInt),
    /// Hex address text.
    Address(String),
    /// Fixed or dynamic byte array.
    Bytes(Bytes),
    /// UTF-8 string.
    String(String),
    /// Elements of a fixed or dynamic array.
    Array(Vec<Value>),
    /// Positional tuple components.
    Tuple(Vec<Value>),
    /// Name-keyed tuple components.
    Struct(BTreeMap<String, Value>),
}

impl Value {
    /// A short name of the variant, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Address(_) => "address",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
            Self::Struct(_) => "struct",
        }
    }

    /// Returns the boolean, if this is one.
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is one.
    #[inline]
    pub const fn as_int(&self) -> Option<&BigInt> {
        match self {
            Self::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the address text, if this is an address.
    #[inline]
    pub fn as_address(&self) -> Option<&str> {
        match self {
            Self::Address(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the bytes, if this is a byte array.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements of an array or the components of a positional tuple.
    #[inline]
    pub fn as_slice(&self) -> Option<&[Self]> {
        match self {
            Self::Array(values) | Self::Tuple(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the fields of a struct.
    #[inline]
    pub const fn as_struct(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<BigInt> for Value {
    #[inline]
    fn from(value: BigInt) -> Self {
        Self::Int(value)
    }
}

macro_rules! int_from_impl {
    ($($t:ty),+ $(,)?) => {$(
        impl From<$t> for Value {
            #[inline]
            fn from(value: $t) -> Self {
                Self::Int(BigInt::from(value))
            }
        }
    )+};
}

int_from_impl!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<Bytes> for Value {
    #[inline]
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    #[inline]
    fn from(value: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value))
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    #[inline]
    fn from(value: [u8; N]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(&value))
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(values: Vec<Value>) -> Self {
        Self::Array(values)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    #[inline]
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self::Struct(fields)
    }
}
