use super::{encode::field_key, format_params, Param, ParamType, Value};
use crate::{
    address::{self, ChecksumCache, NoCache},
    cursor::DEFAULT_RECURSIVE_READ_LIMIT,
    scalar::{self, IntegerOptions},
    Cursor, Error, Result,
};
use alloc::{collections::BTreeMap, string::ToString, vec::Vec};
use bytes::Bytes;

/// How a decoded parameter list is returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shape {
    /// Positional, as [`Value::Tuple`].
    #[default]
    Array,
    /// Keyed by parameter name, or by position for unnamed parameters, as
    /// [`Value::Struct`].
    Object,
}

/// ABI decoding options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Shape of the result.
    pub shape: Shape,
    /// Return addresses in checksummed form instead of lowercase.
    pub checksum_address: bool,
    /// Number of re-reads of already visited positions before decoding fails.
    pub recursive_read_limit: usize,
}

impl Default for DecodeOptions {
    #[inline]
    fn default() -> Self {
        Self {
            shape: Shape::Array,
            checksum_address: false,
            recursive_read_limit: DEFAULT_RECURSIVE_READ_LIMIT,
        }
    }
}

/// ABI decoder configuration.
#[derive(Clone, Debug, Default)]
pub struct AbiDecoder<C = NoCache> {
    options: DecodeOptions,
    cache: C,
}

impl AbiDecoder {
    /// Creates a decoder with the default options and no cache.
    #[inline]
    pub fn new() -> Self {
        Self::with_options(DecodeOptions::default())
    }

    /// Creates a decoder with the given options and no cache.
    #[inline]
    pub const fn with_options(options: DecodeOptions) -> Self {
        Self { options, cache: NoCache }
    }
}

impl<C: ChecksumCache> AbiDecoder<C> {
    /// Replaces the checksum cache.
    #[inline]
    pub fn with_cache<D: ChecksumCache>(self, cache: D) -> AbiDecoder<D> {
        AbiDecoder { options: self.options, cache }
    }

    /// Sets the result shape.
    #[inline]
    pub fn shape(mut self, shape: Shape) -> Self {
        self.options.shape = shape;
        self
    }

    /// Returns addresses checksummed.
    #[inline]
    pub fn checksum_address(mut self, checksum_address: bool) -> Self {
        self.options.checksum_address = checksum_address;
        self
    }

    /// Sets the recursive read limit.
    #[inline]
    pub fn recursive_read_limit(mut self, limit: usize) -> Self {
        self.options.recursive_read_limit = limit;
        self
    }

    /// Returns the options.
    #[inline]
    pub const fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Returns the checksum cache.
    #[inline]
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Decodes `data` against `params`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroData`] for empty data with a non-empty parameter list,
    /// [`Error::DataSizeTooSmall`] for data shorter than one word, and cursor or
    /// scalar errors for malformed data.
    pub fn decode(&mut self, params: &[Param], data: &[u8]) -> Result<Value> {
        if data.is_empty() && !params.is_empty() {
            debug!(target: "evm_codec::abi", params = params.len(), "decoding empty data");
            return Err(Error::ZeroData);
        }
        if !data.is_empty() && data.len() < 32 {
            debug!(target: "evm_codec::abi", size = data.len(), "data shorter than one word");
            return Err(Error::DataSizeTooSmall { size: data.len(), params: format_params(params) });
        }

        let mut cursor = Cursor::with_recursive_read_limit(data, self.options.recursive_read_limit);
        let mut consumed = 0;
        let mut values = Vec::with_capacity(params.len());
        for (index, param) in params.iter().enumerate() {
            cursor.set_position(consumed)?;
            let (value, size) = self.decode_value(&mut cursor, &param.ty, 0)?;
            consumed += size;
            trace!(target: "evm_codec::abi", index, ty = %param.ty, consumed, "decoded parameter");
            values.push(value);
        }

        Ok(match self.options.shape {
            Shape::Array => Value::Tuple(values),
            Shape::Object => Value::Struct(
                params.iter().enumerate().map(|(i, p)| field_key(p, i)).zip(values).collect(),
            ),
        })
    }

    /// Decodes one value at the cursor, returning it with the number of head bytes
    /// it occupies. Offsets are relative to `static_position`.
    fn decode_value(
        &mut self,
        cursor: &mut Cursor<'_>,
        ty: &ParamType,
        static_position: usize,
    ) -> Result<(Value, usize)> {
        match ty {
            ParamType::Address => {
                let word = cursor.read_word()?;
                let lower = hex::encode_prefixed(&word[12..]);
                let address = if self.options.checksum_address {
                    address::checksum(&lower, &mut self.cache)?
                } else {
                    lower
                };
                Ok((Value::Address(address), 32))
            }
            ParamType::Bool => {
                let value = scalar::decode_bool(cursor.read_word()?, Some(32))?;
                Ok((Value::Bool(value), 32))
            }
            ParamType::Uint(_) | ParamType::Int(_) => {
                let signed = matches!(ty, ParamType::Int(_));
                let options = IntegerOptions::new().size(32).signed(signed);
                Ok((Value::Int(scalar::decode_integer(cursor.read_word()?, options)?), 32))
            }
            ParamType::FixedBytes(size) => {
                if cursor.remaining() < *size {
                    return Err(Error::BytesSizeMismatch {
                        expected: *size,
                        given: cursor.remaining(),
                    });
                }
                let bytes = cursor.read_padded(*size, 32)?;
                Ok((Value::Bytes(Bytes::copy_from_slice(bytes)), 32))
            }
            ParamType::Bytes | ParamType::String => {
                let slot = cursor.position();
                let start = follow_offset(cursor, static_position)?;
                cursor.set_position(start)?;
                let len = cursor.read_word_usize()?;
                let data = cursor.read_bytes(len)?;
                cursor.set_position(slot + 32)?;

                let value = if matches!(ty, ParamType::String) {
                    Value::String(scalar::decode_string(data, None)?)
                } else {
                    Value::Bytes(Bytes::copy_from_slice(data))
                };
                Ok((value, 32))
            }

            ParamType::Array(inner) => {
                let slot = cursor.position();
                let start = follow_offset(cursor, static_position)?;
                cursor.set_position(start)?;
                let len = cursor.read_word_usize()?;
                // element counts are bounded by the input size
                if len > cursor.len() {
                    return Err(Error::InvalidOffset { at: start });
                }

                let data_start = start + 32;
                let dynamic = inner.is_dynamic();
                let mut consumed = 0;
                let mut values = Vec::with_capacity(len);
                for i in 0..len {
                    cursor.set_position(data_start + if dynamic { i * 32 } else { consumed })?;
                    let (value, size) = self.decode_value(cursor, inner, data_start)?;
                    consumed += size;
                    values.push(value);
                }
                cursor.set_position(slot + 32)?;
                Ok((Value::Array(values), 32))
            }
            ParamType::FixedArray(inner, len) if inner.is_dynamic() => {
                let slot = cursor.position();
                let start = follow_offset(cursor, static_position)?;
                let mut values = Vec::new();
                for i in 0..*len {
                    cursor.set_position(start.saturating_add(i.saturating_mul(32)))?;
                    values.push(self.decode_value(cursor, inner, start)?.0);
                }
                cursor.set_position(slot + 32)?;
                Ok((Value::Array(values), 32))
            }
            ParamType::FixedArray(inner, len) => {
                let mut consumed = 0;
                let mut values = Vec::new();
                for _ in 0..*len {
                    let (value, size) =
                        self.decode_value(cursor, inner, static_position + consumed)?;
                    // elements that read nothing would repeat without bound
                    if size == 0 {
                        return Err(Error::InvalidType(ty.to_string()));
                    }
                    consumed += size;
                    values.push(value);
                }
                Ok((Value::Array(values), consumed))
            }

            ParamType::Tuple(params) if ty.is_dynamic() => {
                let slot = cursor.position();
                let start = follow_offset(cursor, static_position)?;
                let mut consumed = 0;
                let mut values = Vec::with_capacity(params.len());
                for param in params {
                    cursor.set_position(start + consumed)?;
                    let (value, size) = self.decode_value(cursor, &param.ty, start)?;
                    consumed += size;
                    values.push(value);
                }
                cursor.set_position(slot + 32)?;
                Ok((tuple_value(params, values), 32))
            }
            ParamType::Tuple(params) => {
                let mut consumed = 0;
                let mut values = Vec::with_capacity(params.len());
                for param in params {
                    let (value, size) = self.decode_value(cursor, &param.ty, static_position)?;
                    consumed += size;
                    values.push(value);
                }
                Ok((tuple_value(params, values), consumed))
            }
        }
    }
}

/// Decodes `data` against `params` with the given options and no checksum cache.
#[inline]
pub fn decode(params: &[Param], data: &[u8], options: DecodeOptions) -> Result<Value> {
    AbiDecoder::with_options(options).decode(params, data)
}

/// Reads an offset word and resolves it against `static_position`.
fn follow_offset(cursor: &mut Cursor<'_>, static_position: usize) -> Result<usize> {
    let at = cursor.position();
    let offset = cursor.read_word_usize()?;
    static_position.checked_add(offset).ok_or(Error::InvalidOffset { at })
}

/// Tuples whose components are all named decode to [`Value::Struct`].
fn tuple_value(params: &[Param], values: Vec<Value>) -> Value {
    if params.is_empty() || params.iter().any(|p| p.name.is_none()) {
        return Value::Tuple(values);
    }
    let mut fields = BTreeMap::new();
    for (param, value) in params.iter().zip(values) {
        fields.insert(field_key(param, 0), value);
    }
    Value::Struct(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{encode, parse_params};
    use alloc::string::String;
    use hex_literal::hex;
    use num_bigint::BigInt;

    fn decode_str(params: &str, data: &[u8]) -> Result<Value> {
        decode(&parse_params(params)?, data, DecodeOptions::default())
    }

    fn word(n: u8) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[31] = n;
        w
    }

    #[test]
    fn static_values() {
        let data = hex!(
            "00000000000000000000000000000000000000000000000000000000000001a4"
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
        assert_eq!(
            decode_str("uint256, bool", &data),
            Ok(Value::Tuple(vec![420u64.into(), true.into()]))
        );
        assert_eq!(
            decode_str("int256", &[0xffu8; 32]),
            Ok(Value::Tuple(vec![(-1i8).into()]))
        );
        assert_eq!(
            decode_str("uint8[2]", &[word(7), word(9)].concat()),
            Ok(Value::Tuple(vec![Value::Array(vec![7u8.into(), 9u8.into()])]))
        );
    }

    #[test]
    fn empty_data() {
        assert_eq!(decode_str("", &[]), Ok(Value::Tuple(vec![])));
        assert_eq!(decode_str("uint256", &[]), Err(Error::ZeroData));
        assert_eq!(
            decode_str("uint256 a, bool", &[0u8; 4]),
            Err(Error::DataSizeTooSmall { size: 4, params: "uint256 a, bool".into() })
        );
    }

    #[test]
    fn round_trips() {
        let params = parse_params(
            "uint256, uint32[], bytes10, bytes, string[2], (int8 x, (bool,string)[] ys) t",
        )
        .unwrap();
        let mut t = BTreeMap::new();
        t.insert(String::from("x"), Value::from(-3i8));
        t.insert(
            String::from("ys"),
            Value::Array(vec![
                Value::Tuple(vec![true.into(), "first".into()]),
                Value::Tuple(vec![false.into(), "".into()]),
            ]),
        );
        let values = vec![
            0x123u64.into(),
            Value::Array(vec![0x456u64.into(), 0x789u64.into()]),
            Value::from(*b"1234567890"),
            Value::from(&b"Hello, world!"[..]),
            Value::Array(vec!["a".into(), "a somewhat longer string spanning two words".into()]),
            Value::Struct(t),
        ];
        let encoded = encode(&params, &values).unwrap();
        assert_eq!(decode(&params, &encoded, DecodeOptions::default()), Ok(Value::Tuple(values)));
    }

    #[test]
    fn object_shape() {
        let params = parse_params("address owner, uint8").unwrap();
        let data = [
            hex!("000000000000000000000000fb6916095ca1df60bb79ce92ce3ea74c37c5d359"),
            word(5),
        ]
        .concat();

        let mut decoder = AbiDecoder::new().shape(Shape::Object).checksum_address(true);
        let decoded = decoder.decode(&params, &data).unwrap();
        let fields = decoded.as_struct().unwrap();
        assert_eq!(
            fields["owner"],
            Value::Address("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".into())
        );
        assert_eq!(fields["1"], Value::Int(BigInt::from(5)));

        let decoded = decode(&params, &data, DecodeOptions::default()).unwrap();
        assert_eq!(
            decoded.as_slice().unwrap()[0],
            Value::Address("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359".into())
        );
    }

    #[test]
    fn fixed_bytes_size() {
        assert_eq!(
            decode_str("uint256, bytes8", &word(1)),
            Err(Error::BytesSizeMismatch { expected: 8, given: 0 })
        );
    }

    #[test]
    fn malformed_data() {
        assert_eq!(decode_str("bool", &word(2)), Err(Error::InvalidBytesBoolean(vec![2])));
        // offset past the end of the data
        assert_eq!(
            decode_str("bytes", &word(0x40)),
            Err(Error::PositionOutOfBounds { position: 0x40, length: 32 })
        );
        // offset word wider than a usize
        assert_eq!(decode_str("string", &[0xffu8; 32]), Err(Error::InvalidOffset { at: 0 }));
        // array length larger than the data
        assert_eq!(
            decode_str("uint256[]", &[word(0x20), word(0xff)].concat()),
            Err(Error::InvalidOffset { at: 0x20 })
        );
        let mut tail = [0u8; 32];
        tail[0] = 0xff;
        assert_eq!(
            decode_str("string", &[word(0x20), word(1), tail].concat()),
            Err(Error::InvalidUtf8 { valid_up_to: 0 })
        );
    }

    #[test]
    fn zero_sized_elements() {
        let empty = ParamType::Tuple(vec![]);
        let params = [Param::new(ParamType::FixedArray(Box::new(empty.clone()), 10_000_000))];
        assert_eq!(
            decode(&params, &word(0), DecodeOptions::default()),
            Err(Error::InvalidType("()[10000000]".into()))
        );

        let nested = ParamType::FixedArray(Box::new(ParamType::FixedArray(Box::new(empty), 0)), 3);
        assert_eq!(
            decode(&[Param::new(nested)], &word(0), DecodeOptions::default()),
            Err(Error::InvalidType("()[0][3]".into()))
        );
        assert_eq!(
            decode_str("()[10000000]", &word(0)),
            Err(Error::InvalidType("()[10000000]".into()))
        );
    }

    #[test]
    fn recursive_reads() {
        // three strings sharing one tail
        let data = [word(0x20), word(3), word(0x60), word(0x60), word(0x60), word(1), word(0)]
            .concat();
        let all = decode_str("string[]", &data).unwrap();
        assert_eq!(
            all,
            Value::Tuple(vec![Value::Array(vec!["\0".into(), "\0".into(), "\0".into()])])
        );

        let params = parse_params("string[]").unwrap();
        let options = DecodeOptions { recursive_read_limit: 2, ..Default::default() };
        assert!(matches!(
            decode(&params, &data, options),
            Err(Error::RecursiveReadLimitExceeded { limit: 2, .. })
        ));
    }
}
