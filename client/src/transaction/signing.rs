//! Transaction signing and verification.
//!
//! Signing is a separate step from building because the nonce may not be
//! known at construction time and the nonce is part of the signed bytes.
//! The signed data is the SHA-256 digest of [`canonicalize`]'s output; the
//! un-hashed encoding itself becomes the transaction identifier.

use tracing::debug;

use super::canonical::canonicalize;
use super::types::{SignedTransaction, TransactionId, UnsignedTransaction};
use crate::crypto::hash::domain_hash;
use crate::crypto::keys::{PublicKey, SigningIdentity};
use crate::crypto::signatures::{sign_digest, verify_signature};
use crate::error::ClientError;

/// Signs a nonce-bearing transaction.
///
/// The signing procedure:
/// 1. `encoding = canonicalize(tx)`. Fails with `MalformedTransaction` if
///    the sender or recipient is missing.
/// 2. `digest = SHA-256(encoding)`.
/// 3. ECDSA over `digest` with the identity's curve, encoded in that curve's
///    wire format.
/// 4. The identifier is `encoding`, verbatim.
///
/// The caller is responsible for `tx.from` matching the identity's address;
/// the ledger rejects a mismatch.
///
/// # Example
///
/// ```
/// use hubline_client::crypto::keys::{Curve, SigningIdentity};
/// use hubline_client::transaction::{canonicalize, sign_transaction, TransactionBuilder};
/// use hubline_client::transaction::types::Address;
///
/// let identity = SigningIdentity::generate(Curve::S256);
/// let tx = TransactionBuilder::new()
///     .from(identity.address())
///     .to(Address::new([2; 20]))
///     .payload(b"hi".to_vec())
///     .nonce(1)
///     .build();
///
/// let signed = sign_transaction(&tx, &identity).unwrap();
/// assert_eq!(signed.id().as_bytes(), canonicalize(&tx).unwrap().as_slice());
/// assert!(signed.verify(&identity.public_key()).is_ok());
/// ```
pub fn sign_transaction(
    tx: &UnsignedTransaction,
    identity: &SigningIdentity,
) -> Result<SignedTransaction, ClientError> {
    let encoding = canonicalize(tx)?;
    let digest = domain_hash(&encoding);
    let signature = sign_digest(identity, &digest)?.encode();

    // canonicalize() already proved both are present.
    let (from, to) = match (tx.from, tx.to) {
        (Some(from), Some(to)) => (from, to),
        _ => return Err(ClientError::malformed("missing sender or recipient")),
    };

    debug!(
        curve = %identity.curve(),
        from = %from,
        nonce = tx.nonce,
        encoding_len = encoding.len(),
        "signed transaction"
    );

    Ok(SignedTransaction {
        from,
        to,
        timestamp: tx.timestamp,
        payload: tx.payload.clone(),
        nonce: tx.nonce,
        amount: tx.amount,
        typ: tx.typ,
        packet: tx.packet.clone(),
        id: TransactionId::from_bytes(encoding),
        signature,
    })
}

/// Checks that `tx`'s identifier matches its fields and that its signature
/// was made by `public_key` over them.
pub fn verify_transaction(
    tx: &SignedTransaction,
    public_key: &PublicKey,
) -> Result<(), ClientError> {
    let encoding = canonicalize(&tx.to_unsigned())?;
    if encoding.as_slice() != tx.id().as_bytes() {
        return Err(ClientError::malformed(
            "identifier does not match transaction fields",
        ));
    }
    verify_signature(tx.signature(), &domain_hash(&encoding), public_key)?;
    Ok(())
}

impl SignedTransaction {
    /// See [`verify_transaction`].
    pub fn verify(&self, public_key: &PublicKey) -> Result<(), ClientError> {
        verify_transaction(self, public_key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
