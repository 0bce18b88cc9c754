//! Contract ABI parameter encoding.
//!
//! Parameter types are parsed once into [`ParamType`] and values are described by
//! [`Value`]. [`encode`] and [`decode`] use the standard head/tail layout with
//! 32-byte slots; [`encode_packed`] concatenates values without offsets.

mod decode;
pub use decode::{decode, AbiDecoder, DecodeOptions, Shape};

mod encode;
pub use encode::{encode, AbiEncoder};

mod packed;
pub use packed::encode_packed;

mod param;
pub use param::{
    canonical_signature, format_params, parse_params, parse_signature, Param, ParamType,
    MAX_TYPE_DEPTH,
};

mod value;
pub use value::Value;

use crate::{keccak, Result};
use alloc::vec::Vec;

/// Returns the 4-byte selector of a function signature.
///
/// The signature may carry parameter names and data locations; the selector is
/// computed over its canonical form.
///
/// # Examples
///
/// ```
/// use evm_codec::abi::selector;
///
/// assert_eq!(selector("transfer(address to, uint256 amount)").unwrap(), [0xa9, 0x05, 0x9c, 0xbb]);
/// ```
pub fn selector(signature: &str) -> Result<[u8; 4]> {
    let (name, params) = parse_signature(signature)?;
    Ok(keccak::selector(&canonical_signature(&name, &params)))
}

/// Encodes a function call: the selector of `signature` followed by the encoded
/// arguments.
pub fn encode_function_data(signature: &str, values: &[Value]) -> Result<Vec<u8>> {
    let (name, params) = parse_signature(signature)?;
    let mut out = keccak::selector(&canonical_signature(&name, &params)).to_vec();
    out.extend(encode(&params, values)?);
    Ok(out)
}

/// A 32-byte big-endian word holding `value`.
pub(crate) fn usize_word(value: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}
