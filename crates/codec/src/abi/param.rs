use crate::{Error, Result};
use alloc::{
    boxed::Box,
    string::{String, ToString},
    vec::Vec,
};
use core::{fmt, str::FromStr};

/// Maximum nesting of tuples and arrays in a type string.
pub const MAX_TYPE_DEPTH: usize = 1024;

/// An ABI type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Unsigned integer of the given bit width.
    Uint(usize),
    /// Signed integer of the given bit width.
    Int(usize),
    /// 20-byte address.
    Address,
    /// Boolean.
    Bool,
    /// Fixed-size byte array of 1 to 32 bytes.
    FixedBytes(usize),
    /// Dynamic byte array.
    Bytes,
    /// UTF-8 string.
    String,
    /// Dynamic-length array.
    Array(Box<ParamType>),
    /// Fixed-length array.
    FixedArray(Box<ParamType>, usize),
    /// Tuple of components.
    Tuple(Vec<Param>),
}

/// A named or unnamed parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    /// The parameter name, if any.
    pub name: Option<String>,
    /// The parameter type.
    pub ty: ParamType,
}

impl ParamType {
    /// Parses a type string such as `uint256`, `(address,bytes)[]` or
    /// `tuple(uint256 a, bool b)[2]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidType`] for unknown or malformed types and
    /// [`Error::RecursionLimitExceeded`] for types nested deeper than
    /// [`MAX_TYPE_DEPTH`].
    #[inline]
    pub fn parse(s: &str) -> Result<Self> {
        check_nesting(s)?;
        parse_type(s.trim(), 0)
    }

    /// Returns whether values of this type are encoded out of line.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::String | Self::Bytes | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
            Self::Tuple(params) => params.iter().any(|p| p.ty.is_dynamic()),
            _ => false,
        }
    }

    /// Returns the array element type, if this is an array.
    #[inline]
    pub fn array_element(&self) -> Option<&Self> {
        match self {
            Self::Array(inner) | Self::FixedArray(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// Returns the tuple components, if this is a tuple.
    #[inline]
    pub fn tuple_components(&self) -> Option<&[Param]> {
        match self {
            Self::Tuple(params) => Some(params),
            _ => None,
        }
    }
}

impl FromStr for ParamType {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::FixedBytes(size) => write!(f, "bytes{size}"),
            Self::Bytes => f.write_str("bytes"),
            Self::String => f.write_str("string"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
            Self::Tuple(params) => {
                f.write_str("(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", param.ty)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Param {
    /// Creates an unnamed parameter.
    #[inline]
    pub const fn new(ty: ParamType) -> Self {
        Self { name: None, ty }
    }

    /// Creates a named parameter.
    #[inline]
    pub fn named(name: impl Into<String>, ty: ParamType) -> Self {
        Self { name: Some(name.into()), ty }
    }

    /// Parses a parameter such as `uint256 amount` or `(bool, string) memory data`.
    ///
    /// A data location keyword (`memory`, `calldata`, `storage`) or `indexed` may
    /// precede the name.
    #[inline]
    pub fn parse(s: &str) -> Result<Self> {
        check_nesting(s)?;
        parse_param(s.trim(), 0)
    }

    /// The canonical type string, without the name.
    #[inline]
    pub fn signature(&self) -> String {
        self.ty.to_string()
    }
}

impl FromStr for Param {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {name}", self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// Parses a comma separated parameter list, e.g. `address to, uint256 amount`.
pub fn parse_params(s: &str) -> Result<Vec<Param>> {
    check_nesting(s)?;
    parse_list(s, 0)
}

/// Formats a parameter list the way [`parse_params`] reads it.
pub fn format_params(params: &[Param]) -> String {
    let mut out = String::new();
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&param.to_string());
    }
    out
}

/// Parses a function signature such as `transfer(address to, uint256 amount)` into
/// its name and parameters.
pub fn parse_signature(s: &str) -> Result<(String, Vec<Param>)> {
    check_nesting(s)?;
    let s = s.trim();
    let invalid = || Error::InvalidType(s.into());
    let open = s.find('(').ok_or_else(invalid)?;
    let name = s[..open].trim();
    if !is_identifier(name) || !s.ends_with(')') {
        return Err(invalid());
    }
    let inner = &s[open + 1..s.len() - 1];
    if matching_paren(&s[open..]) != Some(s.len() - open - 1) {
        return Err(invalid());
    }
    Ok((name.into(), parse_list(inner, 0)?))
}

/// Renders the canonical signature `name(type1,type2)`.
pub fn canonical_signature(name: &str, params: &[Param]) -> String {
    let mut out = String::from(name);
    out.push('(');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&param.signature());
    }
    out.push(')');
    out
}

fn parse_list(s: &str, depth: usize) -> Result<Vec<Param>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(s, b',')?.into_iter().map(|part| parse_param(part.trim(), depth)).collect()
}

fn parse_param(s: &str, depth: usize) -> Result<Param> {
    let invalid = || Error::InvalidType(s.into());
    let split = split_top_level(s, b' ')?;
    let mut words = split.into_iter().map(str::trim).filter(|w| !w.is_empty());
    let ty = parse_type(words.next().ok_or_else(invalid)?, depth)?;

    let rest: Vec<&str> = words.collect();
    let name = match rest.as_slice() {
        [] => None,
        [modifiers @ .., name] => {
            if !modifiers.iter().all(|m| is_modifier(m)) {
                return Err(invalid());
            }
            if is_modifier(name) {
                None
            } else if is_identifier(name) {
                Some((*name).into())
            } else {
                return Err(invalid());
            }
        }
    };
    Ok(Param { name, ty })
}

fn parse_type(s: &str, depth: usize) -> Result<ParamType> {
    if depth > MAX_TYPE_DEPTH {
        return Err(Error::RecursionLimitExceeded { depth, limit: MAX_TYPE_DEPTH });
    }
    let invalid = || Error::InvalidType(s.into());

    // split the stem from the array suffixes
    let stem = s.strip_prefix("tuple").filter(|rest| rest.starts_with('(')).unwrap_or(s);
    let (mut ty, mut suffixes) = if stem.starts_with('(') {
        let close = matching_paren(stem).ok_or_else(invalid)?;
        let params = parse_list(&stem[1..close], depth + 1)?;
        // zero-sized types have no ABI encoding
        if params.is_empty() {
            return Err(invalid());
        }
        (ParamType::Tuple(params), &stem[close + 1..])
    } else {
        let end = s.find('[').unwrap_or(s.len());
        (parse_root(&s[..end]).ok_or_else(invalid)?, &s[end..])
    };

    let mut wraps = 0;
    while !suffixes.is_empty() {
        let rest = suffixes.strip_prefix('[').ok_or_else(invalid)?;
        let close = rest.find(']').ok_or_else(invalid)?;
        let size = &rest[..close];
        ty = if size.is_empty() {
            ParamType::Array(Box::new(ty))
        } else {
            let len = size.parse().map_err(|_| invalid())?;
            if len == 0 {
                return Err(invalid());
            }
            ParamType::FixedArray(Box::new(ty), len)
        };
        suffixes = &rest[close + 1..];
        wraps += 1;
        if depth + wraps > MAX_TYPE_DEPTH {
            return Err(Error::RecursionLimitExceeded {
                depth: depth + wraps,
                limit: MAX_TYPE_DEPTH,
            });
        }
    }
    Ok(ty)
}

fn parse_root(name: &str) -> Option<ParamType> {
    match name {
        "address" => Some(ParamType::Address),
        "bool" => Some(ParamType::Bool),
        "string" => Some(ParamType::String),
        "bytes" => Some(ParamType::Bytes),
        "uint" => Some(ParamType::Uint(256)),
        "int" => Some(ParamType::Int(256)),
        name => {
            if let Some(size) = name.strip_prefix("bytes") {
                let size = parse_digits(size)?;
                return (size != 0 && size <= 32).then_some(ParamType::FixedBytes(size));
            }

            let (s, is_uint) =
                if let Some(s) = name.strip_prefix('u') { (s, true) } else { (name, false) };
            let bits = parse_digits(s.strip_prefix("int")?)?;
            if bits == 0 || bits > 256 || bits % 8 != 0 {
                return None;
            }
            Some(if is_uint { ParamType::Uint(bits) } else { ParamType::Int(bits) })
        }
    }
}

/// Parses a decimal without sign or leading zeros.
fn parse_digits(s: &str) -> Option<usize> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Rejects tuple nesting beyond [`MAX_TYPE_DEPTH`] before any recursion happens.
fn check_nesting(s: &str) -> Result<()> {
    let mut depth = 0usize;
    for b in s.bytes() {
        match b {
            b'(' => {
                depth += 1;
                if depth > MAX_TYPE_DEPTH {
                    return Err(Error::RecursionLimitExceeded { depth, limit: MAX_TYPE_DEPTH });
                }
            }
            b')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Index of the parenthesis closing the one that opens `s`.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits `s` on `sep` outside of parentheses.
fn split_top_level(s: &str, sep: u8) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1).ok_or_else(|| Error::InvalidType(s.into()))?
            }
            b if b == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::InvalidType(s.into()));
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn is_modifier(word: &str) -> bool {
    matches!(word, "memory" | "calldata" | "storage" | "indexed")
}

fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b'$')
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
}
