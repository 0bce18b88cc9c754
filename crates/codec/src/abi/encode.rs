use super::{usize_word, Param, ParamType, Value};
use crate::{
    address::{self, ChecksumCache, NoCache},
    scalar::{self, IntegerOptions},
    Error, Result,
};
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use num_bigint::BigInt;

/// ABI encoder configuration.
///
/// Carries the address checksum policy and the cache used to compute checksums.
#[derive(Clone, Debug, Default)]
pub struct AbiEncoder<C = NoCache> {
    checksum_address: bool,
    cache: C,
}

impl AbiEncoder {
    /// Creates an encoder that accepts addresses of any case, without a cache.
    #[inline]
    pub const fn new() -> Self {
        Self { checksum_address: false, cache: NoCache }
    }
}

impl<C: ChecksumCache> AbiEncoder<C> {
    /// Replaces the checksum cache.
    #[inline]
    pub fn with_cache<D: ChecksumCache>(self, cache: D) -> AbiEncoder<D> {
        AbiEncoder { checksum_address: self.checksum_address, cache }
    }

    /// Requires mixed-case addresses to carry a valid checksum.
    #[inline]
    pub fn checksum_address(mut self, checksum_address: bool) -> Self {
        self.checksum_address = checksum_address;
        self
    }

    /// Returns the checksum cache.
    #[inline]
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Encodes `values` against `params` in the standard head/tail layout.
    ///
    /// # Errors
    ///
    /// Fails if the counts differ or any value does not fit its type.
    pub fn encode(&mut self, params: &[Param], values: &[Value]) -> Result<Vec<u8>> {
        if params.len() != values.len() {
            return Err(Error::LengthMismatch { expected: params.len(), given: values.len() });
        }
        let prepared = params
            .iter()
            .zip(values)
            .map(|(param, value)| self.prepare(&param.ty, value))
            .collect::<Result<Vec<_>>>()?;
        Ok(assemble(prepared))
    }

    fn prepare(&mut self, ty: &ParamType, value: &Value) -> Result<Prepared> {
        let data = match (ty, value) {
            (ParamType::Address, Value::Address(address)) => {
                address::assert(address, self.checksum_address, &mut self.cache)?;
                scalar::pad_left(&address::to_bytes(address)?, 32)?
            }
            (ParamType::Bool, Value::Bool(b)) => scalar::encode_bool(*b, Some(32))?,
            (ParamType::Uint(bits), Value::Int(int)) => encode_int(int, *bits, false)?,
            (ParamType::Int(bits), Value::Int(int)) => encode_int(int, *bits, true)?,
            (ParamType::FixedBytes(size), Value::Bytes(bytes)) => {
                check_fixed_bytes(bytes, *size)?;
                scalar::pad_right(bytes, 32)?
            }
            (ParamType::Bytes, Value::Bytes(bytes)) => length_prefixed(bytes),
            (ParamType::String, Value::String(s)) => length_prefixed(s.as_bytes()),

            (ParamType::Array(inner), value) => {
                let values = array_values(ty, value)?;
                let prepared = self.prepare_all(inner, values)?;
                let mut data = usize_word(values.len()).to_vec();
                data.extend(assemble(prepared));
                data
            }
            (ParamType::FixedArray(inner, len), value) => {
                let values = array_values(ty, value)?;
                if values.len() != *len {
                    return Err(Error::ArrayLengthMismatch {
                        ty: ty.to_string(),
                        expected: *len,
                        given: values.len(),
                    });
                }
                assemble(self.prepare_all(inner, values)?)
            }
            (ParamType::Tuple(params), Value::Tuple(values)) => {
                if params.len() != values.len() {
                    return Err(Error::LengthMismatch {
                        expected: params.len(),
                        given: values.len(),
                    });
                }
                let prepared = params
                    .iter()
                    .zip(values)
                    .map(|(param, value)| self.prepare(&param.ty, value))
                    .collect::<Result<Vec<_>>>()?;
                assemble(prepared)
            }
            (ParamType::Tuple(params), Value::Struct(fields)) => {
                let mut prepared = Vec::with_capacity(params.len());
                for (i, param) in params.iter().enumerate() {
                    let key = field_key(param, i);
                    let value = fields.get(&key).ok_or_else(|| Error::MissingField {
                        ty: ty.to_string(),
                        field: key.clone(),
                    })?;
                    prepared.push(self.prepare(&param.ty, value)?);
                }
                assemble(prepared)
            }

            (ty, value) => {
                return Err(Error::TypeMismatch { expected: ty.to_string(), given: value.kind() })
            }
        };
        Ok(Prepared { dynamic: ty.is_dynamic(), data })
    }

    fn prepare_all(&mut self, ty: &ParamType, values: &[Value]) -> Result<Vec<Prepared>> {
        values.iter().map(|value| self.prepare(ty, value)).collect()
    }
}

/// Encodes `values` against `params` with the default [`AbiEncoder`].
///
/// An empty parameter list encodes to the empty byte sequence.
#[inline]
pub fn encode(params: &[Param], values: &[Value]) -> Result<Vec<u8>> {
    AbiEncoder::new().encode(params, values)
}

/// An encoded value and whether it goes in the tail.
struct Prepared {
    dynamic: bool,
    data: Vec<u8>,
}

/// Lays out a sequence: static values inline, dynamic values behind offsets
/// relative to the start of the sequence.
fn assemble(items: Vec<Prepared>) -> Vec<u8> {
    let static_size: usize =
        items.iter().map(|item| if item.dynamic { 32 } else { item.data.len() }).sum();

    let mut head = Vec::with_capacity(static_size);
    let mut tail = Vec::new();
    for item in items {
        if item.dynamic {
            head.extend_from_slice(&usize_word(static_size + tail.len()));
            tail.extend(item.data);
        } else {
            head.extend(item.data);
        }
    }
    head.extend(tail);
    head
}

fn length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let padded_len = bytes.len().div_ceil(32) * 32;
    let mut data = Vec::with_capacity(32 + padded_len);
    data.extend_from_slice(&usize_word(bytes.len()));
    data.extend_from_slice(bytes);
    data.resize(32 + padded_len, 0);
    data
}

pub(super) fn encode_int(int: &BigInt, bits: usize, signed: bool) -> Result<Vec<u8>> {
    scalar::check_integer(int, bits / 8, signed)?;
    scalar::encode_integer(int, IntegerOptions::new().size(32).signed(signed))
}

pub(super) fn check_fixed_bytes(bytes: &[u8], size: usize) -> Result<()> {
    if bytes.len() != size {
        return Err(Error::BytesSizeMismatch { expected: size, given: bytes.len() });
    }
    Ok(())
}

pub(super) fn array_values<'a>(ty: &ParamType, value: &'a Value) -> Result<&'a [Value]> {
    match value {
        Value::Array(values) => Ok(values),
        _ => Err(Error::InvalidArray { ty: ty.to_string() }),
    }
}

/// The key of a tuple component in a name-keyed value.
pub(super) fn field_key(param: &Param, index: usize) -> String {
    match &param.name {
        Some(name) => name.clone(),
        None => index.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{abi::parse_params, address::LruCache, AddressReason};
    use alloc::collections::BTreeMap;
    use hex_literal::hex;

    fn encode_str(params: &str, values: &[Value]) -> Result<Vec<u8>> {
        encode(&parse_params(params)?, values)
    }

    #[test]
    fn static_values() {
        assert_eq!(
            encode_str("uint256, bool", &[420u64.into(), true.into()]).unwrap(),
            hex!(
                "00000000000000000000000000000000000000000000000000000000000001a4"
                "0000000000000000000000000000000000000000000000000000000000000001"
            )
        );
        assert_eq!(
            encode_str("int8", &[(-1i8).into()]).unwrap(),
            hex!("ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff")
        );
        assert_eq!(
            encode_str("bytes3", &[Value::from(*b"abc")]).unwrap(),
            hex!("6162630000000000000000000000000000000000000000000000000000000000")
        );
        assert_eq!(
            encode_str(
                "address",
                &[Value::Address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into())]
            )
            .unwrap(),
            hex!("0000000000000000000000005aaeb6053f3e94c9b9a09f33669435e7ef1beaed")
        );
        assert!(encode(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn dynamic_values() {
        // f(uint256,uint32[],bytes10,bytes) from the Solidity ABI documentation
        let encoded = encode_str(
            "uint256, uint32[], bytes10, bytes",
            &[
                0x123u64.into(),
                Value::Array(vec![0x456u64.into(), 0x789u64.into()]),
                Value::from(*b"1234567890"),
                Value::from(&b"Hello, world!"[..]),
            ],
        )
        .unwrap();
        assert_eq!(
            encoded,
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000123"
                "0000000000000000000000000000000000000000000000000000000000000080"
                "3132333435363738393000000000000000000000000000000000000000000000"
                "00000000000000000000000000000000000000000000000000000000000000e0"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000456"
                "0000000000000000000000000000000000000000000000000000000000000789"
                "000000000000000000000000000000000000000000000000000000000000000d"
                "48656c6c6f2c20776f726c642100000000000000000000000000000000000000"
            )
        );
    }

    #[test]
    fn nested_dynamic_arrays() {
        // g(uint256[][],string[]) from the Solidity ABI documentation
        let encoded = encode_str(
            "uint256[][], string[]",
            &[
                Value::Array(vec![
                    Value::Array(vec![1u8.into(), 2u8.into()]),
                    Value::Array(vec![3u8.into()]),
                ]),
                Value::Array(vec!["one".into(), "two".into(), "three".into()]),
            ],
        )
        .unwrap();
        assert_eq!(
            encoded,
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000040"
                "0000000000000000000000000000000000000000000000000000000000000140"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000040"
                "00000000000000000000000000000000000000000000000000000000000000a0"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "0000000000000000000000000000000000000000000000000000000000000003"
                "0000000000000000000000000000000000000000000000000000000000000003"
                "0000000000000000000000000000000000000000000000000000000000000060"
                "00000000000000000000000000000000000000000000000000000000000000a0"
                "00000000000000000000000000000000000000000000000000000000000000e0"
                "0000000000000000000000000000000000000000000000000000000000000003"
                "6f6e650000000000000000000000000000000000000000000000000000000000"
                "0000000000000000000000000000000000000000000000000000000000000003"
                "74776f0000000000000000000000000000000000000000000000000000000000"
                "0000000000000000000000000000000000000000000000000000000000000005"
                "7468726565000000000000000000000000000000000000000000000000000000"
            )
        );
    }

    #[test]
    fn tuples() {
        let params = parse_params("(uint8 a, string b) t").unwrap();
        let positional = Value::Tuple(vec![1u8.into(), "x".into()]);
        let mut fields = BTreeMap::new();
        fields.insert("a".into(), Value::from(1u8));
        fields.insert("b".into(), Value::from("x"));
        let keyed = Value::Struct(fields.clone());

        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000000000000000000000000000000000000000000040"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "7800000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(encode(&params, &[positional]).unwrap(), expected);
        assert_eq!(encode(&params, &[keyed]).unwrap(), expected);

        fields.remove("b");
        assert_eq!(
            encode(&params, &[Value::Struct(fields)]),
            Err(Error::MissingField { ty: "(uint8,string)".into(), field: "b".into() })
        );
        assert_eq!(
            encode(&params, &[Value::Tuple(vec![1u8.into()])]),
            Err(Error::LengthMismatch { expected: 2, given: 1 })
        );

        // static tuples are inline
        assert_eq!(
            encode_str("(uint8,bool)", &[Value::Tuple(vec![2u8.into(), false.into()])]).unwrap(),
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000000"
            )
        );
    }

    #[test]
    fn mismatches() {
        assert_eq!(
            encode_str("uint256, bool", &[1u8.into()]),
            Err(Error::LengthMismatch { expected: 2, given: 1 })
        );
        assert_eq!(
            encode_str("bool", &[1u8.into()]),
            Err(Error::TypeMismatch { expected: "bool".into(), given: "integer" })
        );
        assert_eq!(
            encode_str("uint8[]", &[1u8.into()]),
            Err(Error::InvalidArray { ty: "uint8[]".into() })
        );
        assert_eq!(
            encode_str("uint8[2]", &[Value::Array(vec![1u8.into()])]),
            Err(Error::ArrayLengthMismatch { ty: "uint8[2]".into(), expected: 2, given: 1 })
        );
        assert_eq!(
            encode_str("bytes8", &[Value::from([0u8; 4])]),
            Err(Error::BytesSizeMismatch { expected: 8, given: 4 })
        );
        assert!(matches!(
            encode_str("uint8", &[256u16.into()]),
            Err(Error::IntegerOutOfRange { size: Some(1), signed: false, .. })
        ));
        assert!(matches!(
            encode_str("int8", &[(-129i16).into()]),
            Err(Error::IntegerOutOfRange { size: Some(1), signed: true, .. })
        ));
    }

    #[test]
    fn integer_boundary() {
        let max: BigInt = (BigInt::from(1u8) << 256) - 1u8;
        assert_eq!(encode_str("uint256", &[max.clone().into()]).unwrap(), [0xffu8; 32]);
        assert!(matches!(
            encode_str("uint256", &[BigInt::from(max + 1u8).into()]),
            Err(Error::IntegerOutOfRange { .. })
        ));
    }

    #[test]
    fn address_checksums() {
        let params = parse_params("address").unwrap();
        let bad = Value::Address("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into());
        let lower = Value::Address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".into());

        assert!(encode(&params, &[bad.clone()]).is_ok());

        let mut encoder = AbiEncoder::new().with_cache(LruCache::new()).checksum_address(true);
        assert!(encoder.encode(&params, &[lower]).is_ok());
        assert!(matches!(
            encoder.encode(&params, &[bad]),
            Err(Error::InvalidAddress { reason: AddressReason::InvalidChecksum, .. })
        ));
        assert_eq!(encoder.cache().len(), 1);
        assert!(matches!(
            encode(&params, &[Value::Address("0x1234".into())]),
            Err(Error::InvalidAddress { reason: AddressReason::InvalidInput, .. })
        ));
    }
}
