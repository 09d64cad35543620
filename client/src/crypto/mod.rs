//! # Cryptographic Primitives
//!
//! Hashing, keys and signatures for the transaction pipeline. Everything
//! here is a thin, typed wrapper over the RustCrypto implementations:
//!
//! - **secp256k1 / P-256 ECDSA** (`k256`, `p256`) for signatures.
//! - **SHA-256** (`sha2`) as the signing hash.
//! - **Keccak-256** (`tiny-keccak`) for address derivation.
//!
//! No home-grown crypto. If a function here looks like it could be faster,
//! it can probably also be made wrong.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{address_from_public_key, domain_hash, keccak256, sha256};
pub use keys::{Curve, KeyError, PublicKey, SigningIdentity};
pub use signatures::{sign_digest, verify_signature, CurveSignature, SignatureError};
