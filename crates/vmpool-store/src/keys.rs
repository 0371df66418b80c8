//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions to encode and decode keys for the primary
//! records and their indexes. Index keys are designed to support efficient
//! prefix scans.

use vmpool_core::TokenId;

/// Encode a pool key (the canonical pool name).
#[must_use]
pub fn pool_key(name: &str) -> Vec<u8> {
    name.as_bytes().to_vec()
}

/// Encode a declaration-order key.
///
/// Big-endian so that lexicographic iteration matches numeric order.
#[must_use]
pub fn position_key(position: u32) -> Vec<u8> {
    position.to_be_bytes().to_vec()
}

/// Encode an alias key.
#[must_use]
pub fn alias_key(alias: &str) -> Vec<u8> {
    alias.as_bytes().to_vec()
}

/// Encode a token key.
#[must_use]
pub fn token_key(token_id: &TokenId) -> Vec<u8> {
    token_id.as_bytes().to_vec()
}

/// Encode a VM key (the hostname).
#[must_use]
pub fn vm_key(hostname: &str) -> Vec<u8> {
    hostname.as_bytes().to_vec()
}

/// Encode a token prefix for scanning all VMs by token: `len || token_id`.
///
/// The length prefix keeps one token id from matching as a prefix of another.
#[must_use]
pub fn token_prefix(token_id: &TokenId) -> Vec<u8> {
    let id = token_id.as_bytes();
    let len = u32::try_from(id.len()).unwrap_or(u32::MAX);
    let mut key = Vec::with_capacity(4 + id.len());
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(id);
    key
}

/// Encode a token-VM index key: `len || token_id || hostname`.
#[must_use]
pub fn token_vm_key(token_id: &TokenId, hostname: &str) -> Vec<u8> {
    let mut key = token_prefix(token_id);
    key.extend_from_slice(hostname.as_bytes());
    key
}

/// Extract the hostname from a token-VM key, given the prefix it was scanned with.
#[must_use]
pub fn extract_hostname_from_token_vm_key(key: &[u8], prefix: &[u8]) -> Option<String> {
    key.strip_prefix(prefix)
        .and_then(|rest| std::str::from_utf8(rest).ok())
        .map(str::to_string)
}
