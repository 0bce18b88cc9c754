//! Typed structured data hashing.
//!
//! A [`TypedData`] value is hashed as
//! `keccak256(0x19 ‖ 0x01 ‖ domain separator ‖ hash_struct(message))`, where every
//! struct is encoded as its type hash followed by one 32-byte word per field.
//!
//! ```
//! use evm_codec::typed_data::{encode_type, TypedField, Types};
//!
//! let mut types = Types::new();
//! types.insert(
//!     "Person".into(),
//!     vec![TypedField::new("name", "string"), TypedField::new("wallet", "address")],
//! );
//! types.insert(
//!     "Mail".into(),
//!     vec![
//!         TypedField::new("from", "Person"),
//!         TypedField::new("to", "Person"),
//!         TypedField::new("contents", "string"),
//!     ],
//! );
//! assert_eq!(
//!     encode_type("Mail", &types).unwrap(),
//!     "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
//! );
//! ```

use crate::{
    abi::{AbiEncoder, Param, ParamType, Value},
    address::{self, NoCache},
    keccak::keccak256,
    scalar, Error, Result,
};
use alloc::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    string::{String, ToString},
    vec::Vec,
};
use core::slice;
use num_bigint::BigInt;

/// Name of the domain struct type.
pub const DOMAIN_TYPE: &str = "EIP712Domain";

/// Struct definitions, keyed by struct name.
pub type Types = BTreeMap<String, Vec<TypedField>>;

/// A field of a struct definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypedField {
    /// Field name.
    pub name: String,
    /// Declared type text, such as `uint256`, `Person` or `Person[]`.
    pub ty: String,
}

impl TypedField {
    /// Creates a field.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { name: name.into(), ty: ty.into() }
    }
}

/// The signing domain. Absent fields are left out of the domain type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Domain {
    /// Name of the signing application.
    pub name: Option<String>,
    /// Version of the signing application.
    pub version: Option<String>,
    /// Chain id.
    pub chain_id: Option<BigInt>,
    /// Address of the verifying contract.
    pub verifying_contract: Option<String>,
    /// Disambiguating salt.
    pub salt: Option<[u8; 32]>,
}

impl Domain {
    /// The present fields, keyed by their domain type field names.
    pub fn to_values(&self) -> BTreeMap<String, Value> {
        let mut values = BTreeMap::new();
        if let Some(name) = &self.name {
            values.insert("name".into(), Value::String(name.clone()));
        }
        if let Some(version) = &self.version {
            values.insert("version".into(), Value::String(version.clone()));
        }
        if let Some(chain_id) = &self.chain_id {
            values.insert("chainId".into(), Value::Int(chain_id.clone()));
        }
        if let Some(contract) = &self.verifying_contract {
            values.insert("verifyingContract".into(), Value::Address(contract.clone()));
        }
        if let Some(salt) = self.salt {
            values.insert("salt".into(), Value::from(salt));
        }
        values
    }
}

/// A complete typed data payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypedData {
    /// Struct definitions. May declare `EIP712Domain` explicitly.
    pub types: Types,
    /// The struct type of `message`.
    pub primary_type: String,
    /// The signing domain.
    pub domain: Domain,
    /// The message, keyed by field name.
    pub message: BTreeMap<String, Value>,
}

/// Returns the domain type fields for the fields `domain` carries, in canonical order.
pub fn extract_domain_types(domain: &Domain) -> Vec<TypedField> {
    let mut fields = Vec::new();
    if domain.name.is_some() {
        fields.push(TypedField::new("name", "string"));
    }
    if domain.version.is_some() {
        fields.push(TypedField::new("version", "string"));
    }
    if domain.chain_id.is_some() {
        fields.push(TypedField::new("chainId", "uint256"));
    }
    if domain.verifying_contract.is_some() {
        fields.push(TypedField::new("verifyingContract", "address"));
    }
    if domain.salt.is_some() {
        fields.push(TypedField::new("salt", "bytes32"));
    }
    fields
}

/// Collects `primary_type` and every struct it references, directly or through
/// other structs. Array suffixes are ignored and unknown names are skipped.
pub fn find_type_dependencies(primary_type: &str, types: &Types) -> BTreeSet<String> {
    fn visit(ty: &str, types: &Types, found: &mut BTreeSet<String>) {
        let base = base_type(ty);
        if found.contains(base) {
            return;
        }
        let Some(fields) = types.get(base) else { return };
        found.insert(base.to_string());
        for field in fields {
            visit(&field.ty, types, found);
        }
    }

    let mut found = BTreeSet::new();
    visit(primary_type, types, &mut found);
    found
}

/// Renders the type string of `primary_type`: the primary struct first, then its
/// dependencies sorted by name.
pub fn encode_type(primary_type: &str, types: &Types) -> Result<String> {
    let mut dependencies = find_type_dependencies(primary_type, types);
    if !dependencies.remove(primary_type) {
        return Err(invalid_primary_type(primary_type, types));
    }

    let mut out = String::new();
    for name in core::iter::once(primary_type).chain(dependencies.iter().map(String::as_str)) {
        let fields = types.get(name).ok_or_else(|| invalid_primary_type(name, types))?;
        out.push_str(name);
        out.push('(');
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&field.ty);
            out.push(' ');
            out.push_str(&field.name);
        }
        out.push(')');
    }
    Ok(out)
}

/// Keccak-256 of [`encode_type`].
pub fn hash_type(primary_type: &str, types: &Types) -> Result<[u8; 32]> {
    encode_type(primary_type, types).map(keccak256)
}

/// Encodes a struct as its type hash followed by one word per field.
pub fn encode_data(
    primary_type: &str,
    data: &BTreeMap<String, Value>,
    types: &Types,
) -> Result<Vec<u8>> {
    let fields = types.get(primary_type).ok_or_else(|| invalid_primary_type(primary_type, types))?;
    let mut out = Vec::with_capacity(32 * (fields.len() + 1));
    out.extend_from_slice(&hash_type(primary_type, types)?);
    for field in fields {
        let value = data.get(&field.name).ok_or_else(|| Error::MissingField {
            ty: primary_type.into(),
            field: field.name.clone(),
        })?;
        out.extend(encode_field(&field.ty, value, types)?);
    }
    Ok(out)
}

/// Keccak-256 of [`encode_data`].
pub fn hash_struct(
    primary_type: &str,
    data: &BTreeMap<String, Value>,
    types: &Types,
) -> Result<[u8; 32]> {
    encode_data(primary_type, data, types).map(keccak256)
}

/// Encodes one field value as it appears in [`encode_data`].
///
/// Structs become their struct hash; `string` and `bytes` become the hash of their
/// contents; arrays become the hash of their concatenated element encodings. Other
/// types take their ABI word.
pub fn encode_field(ty: &str, value: &Value, types: &Types) -> Result<Vec<u8>> {
    if types.contains_key(ty) {
        let Value::Struct(data) = value else {
            return Err(Error::TypeMismatch { expected: ty.into(), given: value.kind() });
        };
        return Ok(hash_struct(ty, data, types)?.to_vec());
    }

    if let Some((element, len)) = split_array(ty)? {
        let Value::Array(values) = value else {
            return Err(Error::InvalidArray { ty: ty.into() });
        };
        check_array_len(ty, len, values.len())?;
        let mut encoded = Vec::with_capacity(32 * values.len());
        for value in values {
            encoded.extend(encode_field(element, value, types)?);
        }
        return Ok(keccak256(encoded).to_vec());
    }

    match (ty, value) {
        ("bytes", Value::Bytes(bytes)) => Ok(keccak256(bytes).to_vec()),
        ("string", Value::String(s)) => Ok(keccak256(s).to_vec()),
        _ => {
            let param = Param::new(parse_primitive(ty)?);
            AbiEncoder::new().encode(slice::from_ref(&param), slice::from_ref(value))
        }
    }
}

/// The domain separator: the struct hash of the domain under `types`.
///
/// The `EIP712Domain` definition in `types` is used when present; otherwise it is
/// derived from the fields the domain carries.
pub fn hash_domain(domain: &Domain, types: &Types) -> Result<[u8; 32]> {
    let types = with_domain_type(domain, types);
    hash_struct(DOMAIN_TYPE, &domain.to_values(), &types)
}

/// The domain separator under the derived domain type.
pub fn domain_separator(domain: &Domain) -> Result<[u8; 32]> {
    let mut types = Types::new();
    types.insert(DOMAIN_TYPE.into(), extract_domain_types(domain));
    hash_struct(DOMAIN_TYPE, &domain.to_values(), &types)
}

/// Checks the domain and message against their types.
///
/// # Errors
///
/// Fails on the first out of range integer, invalid address, wrongly sized
/// `bytesN` value, struct named like a primitive type, missing field, or unknown
/// primary type.
pub fn assert(typed_data: &TypedData) -> Result<()> {
    let TypedData { types, primary_type, domain, message } = typed_data;
    let types = with_domain_type(domain, types);

    let domain_values = domain.to_values();
    for field in types.get(DOMAIN_TYPE).map(Vec::as_slice).unwrap_or_default() {
        let value = domain_values
            .get(&field.name)
            .ok_or_else(|| Error::InvalidDomain { field: field.name.clone() })?;
        validate_field(&field.name, &field.ty, value, &types)?;
    }

    if primary_type != DOMAIN_TYPE {
        let fields =
            types.get(primary_type).ok_or_else(|| invalid_primary_type(primary_type, &types))?;
        validate_struct(primary_type, fields, message, &types)?;
    }
    Ok(())
}

/// Returns whether [`assert`] would succeed.
#[inline]
pub fn validate(typed_data: &TypedData) -> bool {
    assert(typed_data).is_ok()
}

/// Encodes the payload to sign: `0x19 ‖ 0x01 ‖ domain separator ‖ message hash`.
///
/// The message hash is left out when the primary type is `EIP712Domain`.
pub fn encode(typed_data: &TypedData) -> Result<Vec<u8>> {
    assert(typed_data)?;
    let TypedData { types, primary_type, domain, message } = typed_data;

    let prefix: &[u8] = &[0x19, 0x01];
    let domain = hash_domain(domain, types)?;
    if primary_type == DOMAIN_TYPE {
        return Ok(scalar::concat(&[prefix, &domain]));
    }
    let message = hash_struct(primary_type, message, types)?;
    Ok(scalar::concat(&[prefix, &domain, &message]))
}

/// Keccak-256 of [`encode`], the hash that gets signed.
pub fn sign_payload(typed_data: &TypedData) -> Result<[u8; 32]> {
    encode(typed_data).map(keccak256)
}

fn validate_struct(
    ty: &str,
    fields: &[TypedField],
    data: &BTreeMap<String, Value>,
    types: &Types,
) -> Result<()> {
    for field in fields {
        let value = data
            .get(&field.name)
            .ok_or_else(|| Error::MissingField { ty: ty.into(), field: field.name.clone() })?;
        validate_field(&field.name, &field.ty, value, types)?;
    }
    Ok(())
}

fn validate_field(name: &str, ty: &str, value: &Value, types: &Types) -> Result<()> {
    if let Some(fields) = types.get(ty) {
        validate_reference(ty)?;
        return match value {
            Value::Struct(data) => validate_struct(ty, fields, data, types),
            _ => Err(Error::TypeMismatch { expected: ty.into(), given: value.kind() }),
        };
    }

    if let Some((element, _)) = split_array(ty)? {
        if let Value::Array(values) = value {
            for value in values {
                validate_field(name, element, value, types)?;
            }
        }
        return Ok(());
    }

    match (ParamType::parse(ty), value) {
        (Ok(ParamType::Uint(bits)), Value::Int(int)) => {
            check_field_integer(name, ty, int, bits, false)
        }
        (Ok(ParamType::Int(bits)), Value::Int(int)) => {
            check_field_integer(name, ty, int, bits, true)
        }
        (Ok(ParamType::Address), Value::Address(a)) => address::assert(a, true, NoCache),
        (Ok(ParamType::FixedBytes(size)), Value::Bytes(bytes)) if bytes.len() != size => {
            Err(Error::BytesSizeMismatch { expected: size, given: bytes.len() })
        }
        _ => Ok(()),
    }
}

fn check_field_integer(
    name: &str,
    ty: &str,
    int: &BigInt,
    bits: usize,
    signed: bool,
) -> Result<()> {
    scalar::check_integer(int, bits / 8, signed).map_err(|_| Error::FieldOutOfRange {
        field: name.into(),
        ty: ty.into(),
        value: int.clone(),
    })
}

/// Struct names may not shadow primitive types.
fn validate_reference(ty: &str) -> Result<()> {
    if matches!(ty, "address" | "bool" | "string")
        || ["bytes", "uint", "int"].iter().any(|prefix| ty.starts_with(prefix))
    {
        return Err(Error::InvalidStructType { ty: ty.into() });
    }
    Ok(())
}

/// Adds the derived domain type unless `types` declares one.
fn with_domain_type<'a>(domain: &Domain, types: &'a Types) -> Cow<'a, Types> {
    if types.contains_key(DOMAIN_TYPE) {
        return Cow::Borrowed(types);
    }
    let mut types = types.clone();
    types.insert(DOMAIN_TYPE.into(), extract_domain_types(domain));
    Cow::Owned(types)
}

/// Splits `T[]` or `T[N]` at its last suffix.
fn split_array(ty: &str) -> Result<Option<(&str, Option<usize>)>> {
    if !ty.ends_with(']') {
        return Ok(None);
    }
    let open = ty.rfind('[').ok_or_else(|| Error::InvalidType(ty.into()))?;
    let size = &ty[open + 1..ty.len() - 1];
    let len = if size.is_empty() {
        None
    } else {
        Some(size.parse().map_err(|_| Error::InvalidType(ty.into()))?)
    };
    Ok(Some((&ty[..open], len)))
}

fn check_array_len(ty: &str, expected: Option<usize>, given: usize) -> Result<()> {
    match expected {
        Some(expected) if expected != given => {
            Err(Error::ArrayLengthMismatch { ty: ty.into(), expected, given })
        }
        _ => Ok(()),
    }
}

/// Field types that are not structs or arrays must be static primitives.
fn parse_primitive(ty: &str) -> Result<ParamType> {
    match ParamType::parse(ty)? {
        ParamType::Tuple(_) => Err(Error::InvalidType(ty.into())),
        parsed => Ok(parsed),
    }
}

/// The leading identifier of a type, without array suffixes.
fn base_type(ty: &str) -> &str {
    let end = ty.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(ty.len());
    &ty[..end]
}

fn invalid_primary_type(primary_type: &str, types: &Types) -> Error {
    Error::InvalidPrimaryType {
        primary_type: primary_type.into(),
        types: types.keys().cloned().collect(),
    }
}
