//! # Key Management
//!
//! ECDSA signing identities for the two curves the ledger accepts:
//!
//! - **S256** (secp256k1): the default. Signatures carry a recovery id, so a
//!   verifier can derive the signer's public key from the signature alone.
//! - **P256** (NIST P-256): for callers whose keys live in hardware or
//!   platforms that only speak NIST curves. Signatures carry the full public
//!   key instead of a recovery id.
//!
//! Both map to the same address scheme: the last 20 bytes of Keccak-256 over
//! the uncompressed public point.
//!
//! ## Security considerations
//!
//! - Fresh keys come from the OS RNG (`OsRng`).
//! - [`SigningIdentity`] does not implement `Serialize`, and its `Debug`
//!   output shows only the curve and address. Exporting a secret is an
//!   explicit call to [`SigningIdentity::secret_bytes`].
//! - Key bytes are never logged.

use std::fmt;

use k256::ecdsa::{SigningKey as S256SigningKey, VerifyingKey as S256VerifyingKey};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SECRET_KEY_LENGTH;
use crate::crypto::hash::address_from_public_key;
use crate::transaction::types::Address;

/// Errors that can occur during key operations.
///
/// Deliberately vague about *why* a key was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid curve point")]
    InvalidPublicKey,
}

/// Supported signature curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    /// secp256k1.
    S256,
    /// NIST P-256 (secp256r1).
    P256,
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::S256 => write!(f, "secp256k1"),
            Curve::P256 => write!(f, "P-256"),
        }
    }
}

// ---------------------------------------------------------------------------
// SigningIdentity
// ---------------------------------------------------------------------------

/// A private key able to sign transactions, tagged with its curve.
///
/// Cheap to clone. Pass it by reference to the functions that sign; nothing
/// in the pipeline keeps one around except the client's session slot.
///
/// # Examples
///
/// ```
/// use hubline_client::crypto::keys::{Curve, SigningIdentity};
///
/// let identity = SigningIdentity::generate(Curve::S256);
/// let restored = SigningIdentity::from_bytes(Curve::S256, &identity.secret_bytes()).unwrap();
/// assert_eq!(identity.address(), restored.address());
/// ```
#[derive(Clone)]
pub enum SigningIdentity {
    S256(S256SigningKey),
    P256(P256SigningKey),
}

impl SigningIdentity {
    /// Generate a fresh key on `curve` using the OS cryptographic RNG.
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::S256 => SigningIdentity::S256(S256SigningKey::random(&mut OsRng)),
            Curve::P256 => SigningIdentity::P256(P256SigningKey::random(&mut OsRng)),
        }
    }

    /// Restore an identity from its 32-byte secret scalar.
    pub fn from_bytes(curve: Curve, bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        match curve {
            Curve::S256 => S256SigningKey::from_slice(bytes)
                .map(SigningIdentity::S256)
                .map_err(|_| KeyError::InvalidSecretKey),
            Curve::P256 => P256SigningKey::from_slice(bytes)
                .map(SigningIdentity::P256)
                .map_err(|_| KeyError::InvalidSecretKey),
        }
    }

    /// Restore an identity from a hex-encoded secret (`0x` optional).
    pub fn from_hex(curve: Curve, secret: &str) -> Result<Self, KeyError> {
        let trimmed = secret.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(curve, &bytes)
    }

    pub fn curve(&self) -> Curve {
        match self {
            SigningIdentity::S256(_) => Curve::S256,
            SigningIdentity::P256(_) => Curve::P256,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            SigningIdentity::S256(key) => PublicKey::S256(*key.verifying_key()),
            SigningIdentity::P256(key) => PublicKey::P256(*key.verifying_key()),
        }
    }

    /// The account address this identity signs for.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Export the raw 32-byte secret scalar. Handle with care.
    pub fn secret_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        let mut out = [0u8; SECRET_KEY_LENGTH];
        match self {
            SigningIdentity::S256(key) => out.copy_from_slice(&key.to_bytes()),
            SigningIdentity::P256(key) => out.copy_from_slice(&key.to_bytes()),
        }
        out
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("curve", &self.curve())
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// The public half of a [`SigningIdentity`], safe to share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKey {
    S256(S256VerifyingKey),
    P256(P256VerifyingKey),
}

impl PublicKey {
    /// Parse a SEC1-encoded point (compressed or uncompressed).
    pub fn from_sec1_bytes(curve: Curve, bytes: &[u8]) -> Result<Self, KeyError> {
        match curve {
            Curve::S256 => S256VerifyingKey::from_sec1_bytes(bytes)
                .map(PublicKey::S256)
                .map_err(|_| KeyError::InvalidPublicKey),
            Curve::P256 => P256VerifyingKey::from_sec1_bytes(bytes)
                .map(PublicKey::P256)
                .map_err(|_| KeyError::InvalidPublicKey),
        }
    }

    pub fn curve(&self) -> Curve {
        match self {
            PublicKey::S256(_) => Curve::S256,
            PublicKey::P256(_) => Curve::P256,
        }
    }

    /// Uncompressed SEC1 encoding, `0x04 || X || Y` (65 bytes).
    pub fn to_uncompressed(&self) -> Vec<u8> {
        match self {
            PublicKey::S256(key) => key.to_encoded_point(false).as_bytes().to_vec(),
            PublicKey::P256(key) => key.to_encoded_point(false).as_bytes().to_vec(),
        }
    }

    pub fn address(&self) -> Address {
        address_from_public_key(&self.to_uncompressed())
    }
}
