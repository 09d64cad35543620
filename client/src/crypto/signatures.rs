//! # Digital Signatures
//!
//! ECDSA signing over 32-byte digests and the two wire formats the ledger
//! accepts:
//!
//! ```text
//! S256:  0x03 || r[32] || s[32] || v[1]        66 bytes, v ∈ {0, 1}
//! P256:  r[32] || s[32] || pubkey[65]           129 bytes, pubkey = 0x04 || X || Y
//! ```
//!
//! The digest is always treated as a prehash: it goes into ECDSA as-is,
//! without being hashed a second time. Nonces are derived per RFC 6979, so
//! signing the same digest with the same key always yields the same bytes.
//!
//! Some signers emit the Ethereum-style recovery id 27/28. The ledger wants
//! 0/1, and [`CurveSignature::decode`] normalizes either form.

use k256::ecdsa::{
    RecoveryId, Signature as S256Signature, VerifyingKey as S256VerifyingKey,
};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::Signature as P256Signature;
use thiserror::Error;

use super::keys::{Curve, PublicKey, SigningIdentity};
use crate::config::{
    CURVE_TAG_S256, P256_PUBLIC_KEY_LENGTH, P256_SIGNATURE_LENGTH, S256_SIGNATURE_LENGTH,
};

/// Errors during signature operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("malformed signature: {reason}")]
    Malformed { reason: String },

    #[error("signature is for {signature} but the key is {key}")]
    CurveMismatch { signature: Curve, key: Curve },

    #[error("signing failed")]
    SigningFailed,
}

fn malformed(reason: impl Into<String>) -> SignatureError {
    SignatureError::Malformed {
        reason: reason.into(),
    }
}

/// A decoded signature in either wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurveSignature {
    S256 {
        r: [u8; 32],
        s: [u8; 32],
        /// Always 0 or 1.
        recovery_id: u8,
    },
    P256 {
        r: [u8; 32],
        s: [u8; 32],
        /// Signer's key, SEC1 uncompressed.
        public_key: Vec<u8>,
    },
}

impl CurveSignature {
    pub fn curve(&self) -> Curve {
        match self {
            CurveSignature::S256 { .. } => Curve::S256,
            CurveSignature::P256 { .. } => Curve::P256,
        }
    }

    /// Wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            CurveSignature::S256 { r, s, recovery_id } => {
                let mut out = Vec::with_capacity(S256_SIGNATURE_LENGTH);
                out.push(CURVE_TAG_S256);
                out.extend_from_slice(r);
                out.extend_from_slice(s);
                out.push(*recovery_id);
                out
            }
            CurveSignature::P256 { r, s, public_key } => {
                let mut out = Vec::with_capacity(P256_SIGNATURE_LENGTH);
                out.extend_from_slice(r);
                out.extend_from_slice(s);
                out.extend_from_slice(public_key);
                out
            }
        }
    }

    /// Parse wire bytes. The format is recognized by length and, for S256,
    /// the leading curve tag.
    pub fn decode(bytes: &[u8]) -> Result<Self, SignatureError> {
        match bytes.len() {
            S256_SIGNATURE_LENGTH => {
                if bytes[0] != CURVE_TAG_S256 {
                    return Err(malformed(format!("unknown curve tag {}", bytes[0])));
                }
                let recovery_id = match bytes[65] {
                    v @ (0 | 1) => v,
                    v @ (27 | 28) => v - 27,
                    v => return Err(malformed(format!("invalid recovery id {v}"))),
                };
                Ok(CurveSignature::S256 {
                    r: split_scalar(&bytes[1..33]),
                    s: split_scalar(&bytes[33..65]),
                    recovery_id,
                })
            }
            P256_SIGNATURE_LENGTH => {
                let public_key = bytes[64..].to_vec();
                if public_key[0] != 0x04 {
                    return Err(malformed("embedded public key is not uncompressed SEC1"));
                }
                Ok(CurveSignature::P256 {
                    r: split_scalar(&bytes[..32]),
                    s: split_scalar(&bytes[32..64]),
                    public_key,
                })
            }
            n => Err(malformed(format!(
                "expected {S256_SIGNATURE_LENGTH} or {P256_SIGNATURE_LENGTH} bytes, got {n}"
            ))),
        }
    }

    /// The signer's public key, without needing it from elsewhere.
    ///
    /// S256 recovers the key from `(digest, r, s, v)`. P256 parses the key
    /// the signature carries; it is only trustworthy after
    /// [`verify_digest`] succeeds against it.
    pub fn recover_public_key(&self, digest: &[u8]) -> Result<PublicKey, SignatureError> {
        match self {
            CurveSignature::S256 { r, s, recovery_id } => {
                let sig = s256_signature(r, s)?;
                let recid = RecoveryId::from_byte(*recovery_id)
                    .ok_or_else(|| malformed("invalid recovery id"))?;
                S256VerifyingKey::recover_from_prehash(digest, &sig, recid)
                    .map(PublicKey::S256)
                    .map_err(|_| SignatureError::VerificationFailed)
            }
            CurveSignature::P256 { public_key, .. } => {
                PublicKey::from_sec1_bytes(Curve::P256, public_key)
                    .map_err(|_| malformed("embedded public key is not a P-256 point"))
            }
        }
    }
}

fn split_scalar(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}

fn concat_rs(r: &[u8; 32], s: &[u8; 32]) -> [u8; 64] {
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(r);
    rs[32..].copy_from_slice(s);
    rs
}

fn s256_signature(r: &[u8; 32], s: &[u8; 32]) -> Result<S256Signature, SignatureError> {
    S256Signature::from_slice(&concat_rs(r, s)).map_err(|_| malformed("r or s out of range"))
}

fn p256_signature(r: &[u8; 32], s: &[u8; 32]) -> Result<P256Signature, SignatureError> {
    P256Signature::from_slice(&concat_rs(r, s)).map_err(|_| malformed("r or s out of range"))
}

/// Sign a 32-byte digest with whichever curve `identity` uses.
pub fn sign_digest(
    identity: &SigningIdentity,
    digest: &[u8],
) -> Result<CurveSignature, SignatureError> {
    match identity {
        SigningIdentity::S256(key) => {
            let (sig, recid) = key
                .sign_prehash_recoverable(digest)
                .map_err(|_| SignatureError::SigningFailed)?;
            let rs = sig.to_bytes();
            Ok(CurveSignature::S256 {
                r: split_scalar(&rs[..32]),
                s: split_scalar(&rs[32..]),
                recovery_id: recid.to_byte(),
            })
        }
        SigningIdentity::P256(key) => {
            let sig: P256Signature = key
                .sign_prehash(digest)
                .map_err(|_| SignatureError::SigningFailed)?;
            let rs = sig.to_bytes();
            let public_key = identity.public_key().to_uncompressed();
            debug_assert_eq!(public_key.len(), P256_PUBLIC_KEY_LENGTH);
            Ok(CurveSignature::P256 {
                r: split_scalar(&rs[..32]),
                s: split_scalar(&rs[32..]),
                public_key,
            })
        }
    }
}

/// Verify a decoded signature over `digest` against `public_key`.
///
/// For P256 the key embedded in the signature must also be `public_key`;
/// a valid signature by somebody else is still a failure.
pub fn verify_digest(
    public_key: &PublicKey,
    digest: &[u8],
    signature: &CurveSignature,
) -> Result<(), SignatureError> {
    match (signature, public_key) {
        (CurveSignature::S256 { r, s, .. }, PublicKey::S256(key)) => {
            let sig = s256_signature(r, s)?;
            key.verify_prehash(digest, &sig)
                .map_err(|_| SignatureError::VerificationFailed)
        }
        (
            CurveSignature::P256 {
                r,
                s,
                public_key: embedded,
            },
            PublicKey::P256(key),
        ) => {
            if embedded.as_slice() != public_key.to_uncompressed().as_slice() {
                return Err(SignatureError::VerificationFailed);
            }
            let sig = p256_signature(r, s)?;
            key.verify_prehash(digest, &sig)
                .map_err(|_| SignatureError::VerificationFailed)
        }
        (sig, key) => Err(SignatureError::CurveMismatch {
            signature: sig.curve(),
            key: key.curve(),
        }),
    }
}

/// Decode wire bytes and verify them over `digest`.
///
/// # Example
///
/// ```
/// use hubline_client::crypto::hash::domain_hash;
/// use hubline_client::crypto::keys::{Curve, SigningIdentity};
/// use hubline_client::crypto::signatures::{sign_digest, verify_signature};
///
/// let identity = SigningIdentity::generate(Curve::S256);
/// let digest = domain_hash(b"canonical bytes");
/// let wire = sign_digest(&identity, &digest).unwrap().encode();
///
/// assert!(verify_signature(&wire, &digest, &identity.public_key()).is_ok());
/// ```
pub fn verify_signature(
    signature: &[u8],
    digest: &[u8],
    public_key: &PublicKey,
) -> Result<(), SignatureError> {
    let decoded = CurveSignature::decode(signature)?;
    verify_digest(public_key, digest, &decoded)
}
