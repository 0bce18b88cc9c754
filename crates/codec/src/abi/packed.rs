//! Non-standard packed encoding.
//!
//! Values are concatenated without offsets or length words. At the top level each
//! value takes its natural width; inside arrays every element is padded to 32
//! bytes. Tuples have no packed form.

use super::{
    encode::{array_values, check_fixed_bytes},
    ParamType, Value,
};
use crate::{
    address::{self, NoCache},
    scalar::{self, IntegerOptions},
    Error, Result,
};
use alloc::{string::ToString, vec::Vec};

/// Packs `values` against `types`.
///
/// # Errors
///
/// Fails on count or type mismatches, on out of range integers, and on tuple types.
pub fn encode_packed(types: &[ParamType], values: &[Value]) -> Result<Vec<u8>> {
    if types.len() != values.len() {
        return Err(Error::LengthMismatch { expected: types.len(), given: values.len() });
    }
    let mut out = Vec::new();
    for (ty, value) in types.iter().zip(values) {
        encode_value(ty, value, false, &mut out)?;
    }
    Ok(out)
}

fn encode_value(ty: &ParamType, value: &Value, in_array: bool, out: &mut Vec<u8>) -> Result<()> {
    match (ty, value) {
        (ParamType::Address, Value::Address(a)) => {
            address::assert(a, true, NoCache)?;
            let bytes = address::to_bytes(a)?;
            if in_array {
                out.extend(scalar::pad_left(&bytes, 32)?);
            } else {
                out.extend_from_slice(&bytes);
            }
        }
        (ParamType::Bool, Value::Bool(b)) => {
            out.extend(scalar::encode_bool(*b, Some(if in_array { 32 } else { 1 }))?);
        }
        (ParamType::Uint(bits), Value::Int(int)) | (ParamType::Int(bits), Value::Int(int)) => {
            let signed = matches!(ty, ParamType::Int(_));
            scalar::check_integer(int, bits / 8, signed)?;
            let size = if in_array { 32 } else { bits / 8 };
            let options = IntegerOptions::new().size(size).signed(signed);
            out.extend(scalar::encode_integer(int, options)?);
        }
        (ParamType::FixedBytes(size), Value::Bytes(bytes)) => {
            check_fixed_bytes(bytes, *size)?;
            if in_array {
                out.extend(scalar::pad_right(bytes, 32)?);
            } else {
                out.extend_from_slice(bytes);
            }
        }
        (ParamType::Bytes, Value::Bytes(bytes)) => out.extend_from_slice(bytes),
        (ParamType::String, Value::String(s)) => out.extend_from_slice(s.as_bytes()),
        (ParamType::Array(inner), value) => {
            for value in array_values(ty, value)? {
                encode_value(inner, value, true, out)?;
            }
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
            for value in values {
                encode_value(inner, value, true, out)?;
            }
        }
        (ParamType::Tuple(_), _) => return Err(Error::InvalidType(ty.to_string())),
        (ty, value) => {
            return Err(Error::TypeMismatch { expected: ty.to_string(), given: value.kind() })
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AddressReason;
    use hex_literal::hex;

    fn types(s: &[&str]) -> Vec<ParamType> {
        s.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn natural_widths() {
        let packed = encode_packed(
            &types(&["int16", "bytes1", "uint16", "string"]),
            &[(-1i8).into(), Value::from([0x42u8]), 3u8.into(), "Hello, world!".into()],
        )
        .unwrap();
        assert_eq!(packed, hex!("ffff42000348656c6c6f2c20776f726c6421"));

        let packed = encode_packed(
            &types(&["address", "bool", "bytes"]),
            &[
                Value::Address("0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC".into()),
                true.into(),
                Value::from(&b"\x01\x02"[..]),
            ],
        )
        .unwrap();
        assert_eq!(packed, hex!("cccccccccccccccccccccccccccccccccccccccc010102"));
    }

    #[test]
    fn array_elements_are_padded() {
        let packed = encode_packed(
            &types(&["uint8[]", "bool[2]"]),
            &[
                Value::Array(vec![1u8.into(), 2u8.into()]),
                Value::Array(vec![true.into(), false.into()]),
            ],
        )
        .unwrap();
        assert_eq!(
            packed,
            hex!(
                "0000000000000000000000000000000000000000000000000000000000000001"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "0000000000000000000000000000000000000000000000000000000000000000"
            )
        );

        let packed =
            encode_packed(&types(&["bytes2[]"]), &[Value::Array(vec![Value::from(*b"ab")])])
                .unwrap();
        assert_eq!(
            packed,
            hex!("6162000000000000000000000000000000000000000000000000000000000000")
        );
    }

    #[test]
    fn packed_errors() {
        assert_eq!(
            encode_packed(&types(&["(uint8)"]), &[Value::Tuple(vec![1u8.into()])]),
            Err(Error::InvalidType("(uint8)".into()))
        );
        assert_eq!(
            encode_packed(&types(&["bytes4"]), &[Value::from([0u8; 2])]),
            Err(Error::BytesSizeMismatch { expected: 4, given: 2 })
        );
        assert_eq!(
            encode_packed(&types(&["uint8[2]"]), &[Value::Array(vec![])]),
            Err(Error::ArrayLengthMismatch { ty: "uint8[2]".into(), expected: 2, given: 0 })
        );
        assert_eq!(
            encode_packed(&types(&["uint8[]"]), &[true.into()]),
            Err(Error::InvalidArray { ty: "uint8[]".into() })
        );
        assert!(matches!(
            encode_packed(&types(&["uint8"]), &[300u16.into()]),
            Err(Error::IntegerOutOfRange { .. })
        ));
        assert_eq!(
            encode_packed(&types(&["bool"]), &[]),
            Err(Error::LengthMismatch { expected: 1, given: 0 })
        );
        assert!(encode_packed(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn address_checksums() {
        let wrong = "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert_eq!(
            encode_packed(&types(&["address"]), &[Value::Address(wrong.into())]),
            Err(Error::InvalidAddress {
                address: wrong.into(),
                reason: AddressReason::InvalidChecksum
            })
        );
        let lower = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
        assert_eq!(
            encode_packed(&types(&["address"]), &[Value::Address(lower.into())]),
            Ok(hex!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").to_vec())
        );
    }
}
