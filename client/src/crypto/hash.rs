//! # Hashing Utilities
//!
//! The ledger uses exactly two hash functions, and they are not
//! interchangeable:
//!
//! - **SHA-256** is the ledger's signing hash. The canonical encoding of a
//!   transaction is hashed once with SHA-256 and that 32-byte digest is what
//!   the ECDSA key actually signs. See [`domain_hash`].
//!
//! - **Keccak-256** is the address hash. An account address is the rightmost
//!   20 bytes of `Keccak-256(public_key)`, the same derivation Ethereum uses.
//!   See [`address_from_public_key`].
//!
//! Note that Keccak-256 is *not* NIST SHA3-256 (different padding). Mixing
//! them up produces addresses that look fine and belong to nobody.

use sha2::{Digest, Sha256};
use tiny_keccak::{Hasher, Keccak};

use crate::config::{ADDRESS_LENGTH, HASH_OUTPUT_LENGTH};
use crate::transaction::types::Address;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use hubline_client::crypto::hash::sha256;
///
/// let hash = sha256(b"relay chain");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// Compute the Keccak-256 hash of the input data.
pub fn keccak256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut keccak = Keccak::v256();
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    keccak.update(data);
    keccak.finalize(&mut output);
    output
}

/// The ledger's designated signing hash, applied to a canonical encoding.
///
/// This is the value handed to the ECDSA signer. It is deliberately a
/// separate step from the transaction identifier, which is the canonical
/// encoding itself (un-hashed). Keep the two apart: the identifier travels
/// on the wire, the digest only ever exists inside `sign`/`verify`.
pub fn domain_hash(encoding: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    sha256(encoding)
}

/// Derive a 20-byte account address from a SEC1 public key.
///
/// Accepts either the 65-byte uncompressed form (`0x04 || X || Y`) or the
/// bare 64-byte `X || Y`. The `0x04` prefix is stripped before hashing so
/// both inputs map to the same address.
pub fn address_from_public_key(public_key: &[u8]) -> Address {
    let body = match public_key {
        [0x04, rest @ ..] if rest.len() == 64 => rest,
        other => other,
    };
    let hash = keccak256(body);
    let mut out = [0u8; ADDRESS_LENGTH];
    out.copy_from_slice(&hash[HASH_OUTPUT_LENGTH - ADDRESS_LENGTH..]);
    Address::new(out)
}
