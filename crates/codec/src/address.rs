//! Address text validation and mixed-case checksums.
//!
//! An address is `0x` followed by 40 hex digits. The checksummed form uppercases
//! every letter whose nibble in the hash of the lowercase digits is `>= 8`.

use crate::{keccak::keccak256, AddressReason, Error, Result};
use alloc::{collections::BTreeMap, string::String};

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Memoizes checksum computations.
///
/// The cache is an explicit value handed to the functions that may consult it. A
/// cache only ever stores `checksum(address)` for `address`, so hits and misses
/// produce identical results.
pub trait ChecksumCache {
    /// Returns the cached checksummed form of a lowercase address.
    fn get(&mut self, address: &str) -> Option<String>;

    /// Stores the checksummed form of a lowercase address.
    fn insert(&mut self, address: String, checksummed: String);
}

impl<C: ChecksumCache + ?Sized> ChecksumCache for &mut C {
    #[inline]
    fn get(&mut self, address: &str) -> Option<String> {
        (**self).get(address)
    }

    #[inline]
    fn insert(&mut self, address: String, checksummed: String) {
        (**self).insert(address, checksummed)
    }
}

/// A cache that stores nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoCache;

impl ChecksumCache for NoCache {
    #[inline]
    fn get(&mut self, _address: &str) -> Option<String> {
        None
    }

    #[inline]
    fn insert(&mut self, _address: String, _checksummed: String) {}
}

/// Bounded least-recently-used checksum cache.
#[derive(Clone, Debug)]
pub struct LruCache {
    entries: BTreeMap<String, CachedChecksum>,
    capacity: usize,
    lru_counter: u64,
}

#[derive(Clone, Debug)]
struct CachedChecksum {
    checksummed: String,
    accessed: u64,
}

impl Default for LruCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LruCache {
    /// Default number of entries.
    pub const DEFAULT_CAPACITY: usize = 8192;

    /// Creates an empty cache with the default capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty cache holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: BTreeMap::new(), capacity, lru_counter: 0 }
    }

    /// Maximum number of entries.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `address` is cached, without touching its recency.
    #[inline]
    pub fn contains(&self, address: &str) -> bool {
        self.entries.contains_key(address)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru_counter = 0;
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.accessed)
            .map(|(address, _)| address.clone());
        if let Some(address) = oldest {
            trace!(target: "evm_codec::address", %address, "evicting cached checksum");
            self.entries.remove(&address);
        }
    }
}

impl ChecksumCache for LruCache {
    fn get(&mut self, address: &str) -> Option<String> {
        let entry = self.entries.get_mut(address)?;
        self.lru_counter += 1;
        entry.accessed = self.lru_counter;
        Some(entry.checksummed.clone())
    }

    fn insert(&mut self, address: String, checksummed: String) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(&address) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.lru_counter += 1;
        self.entries.insert(address, CachedChecksum { checksummed, accessed: self.lru_counter });
    }
}

/// Checks that `address` is well formed.
///
/// With `strict`, a mixed-case address must also match its checksum. All-lowercase
/// addresses always pass.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] with the failing [`AddressReason`].
pub fn assert<C: ChecksumCache>(address: &str, strict: bool, cache: C) -> Result<()> {
    if !is_well_formed(address) {
        return Err(invalid(address, AddressReason::InvalidInput));
    }
    if strict && !address.bytes().any(|b| b.is_ascii_uppercase()) {
        return Ok(());
    }
    if strict && checksum(address, cache)? != address {
        return Err(invalid(address, AddressReason::InvalidChecksum));
    }
    Ok(())
}

/// Returns whether [`assert`] would succeed.
#[inline]
pub fn validate(address: &str, strict: bool) -> bool {
    assert(address, strict, NoCache).is_ok()
}

/// Returns the checksummed form of a well-formed address, of any case.
pub fn checksum<C: ChecksumCache>(address: &str, mut cache: C) -> Result<String> {
    if !is_well_formed(address) {
        return Err(invalid(address, AddressReason::InvalidInput));
    }
    let lower = address.to_ascii_lowercase();
    if let Some(hit) = cache.get(&lower) {
        trace!(target: "evm_codec::address", address = %lower, "checksum cache hit");
        return Ok(hit);
    }

    let digits = &lower[2..];
    let hash = keccak256(digits.as_bytes());
    let mut out = String::with_capacity(2 + ADDRESS_LENGTH * 2);
    out.push_str("0x");
    for (i, c) in digits.chars().enumerate() {
        let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        out.push(if nibble >= 8 { c.to_ascii_uppercase() } else { c });
    }

    trace!(target: "evm_codec::address", address = %lower, "checksum cache miss");
    cache.insert(lower, out.clone());
    Ok(out)
}

/// Case-insensitive address comparison.
///
/// # Errors
///
/// Fails if either address is malformed.
pub fn is_equal(a: &str, b: &str) -> Result<bool> {
    assert(a, false, NoCache)?;
    assert(b, false, NoCache)?;
    Ok(a.eq_ignore_ascii_case(b))
}

/// Parses a well-formed address into its 20 bytes. Case is not checked.
pub fn to_bytes(address: &str) -> Result<[u8; ADDRESS_LENGTH]> {
    if !is_well_formed(address) {
        return Err(invalid(address, AddressReason::InvalidInput));
    }
    let mut out = [0u8; ADDRESS_LENGTH];
    hex::decode_to_slice(&address[2..], &mut out)
        .map_err(|_| invalid(address, AddressReason::InvalidInput))?;
    Ok(out)
}

/// Renders 20 bytes as a lowercase address.
#[inline]
pub fn from_bytes(bytes: &[u8; ADDRESS_LENGTH]) -> String {
    hex::encode_prefixed(bytes)
}

fn is_well_formed(address: &str) -> bool {
    address.len() == 2 + ADDRESS_LENGTH * 2
        && address.starts_with("0x")
        && address.bytes().skip(2).all(|b| b.is_ascii_hexdigit())
}

#[inline]
fn invalid(address: &str, reason: AddressReason) -> Error {
    Error::InvalidAddress { address: address.into(), reason }
}
