//! Transaction construction via the builder pattern, and preparation of a
//! built transaction for submission.
//!
//! [`TransactionBuilder`] assembles an [`UnsignedTransaction`]. It does not
//! sign, and it does not pick a nonce; [`prepare_transaction`] does both,
//! after checking that everything the ledger needs is present.

use chrono::Utc;
use tracing::debug;

use super::nonce::resolve_nonce;
use super::signing::sign_transaction;
use super::types::{Address, InterchainPacket, SignedTransaction, TransactOpts, UnsignedTransaction};
use crate::crypto::keys::SigningIdentity;
use crate::error::ClientError;
use crate::network::rpc::RpcError;

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`UnsignedTransaction`]s.
///
/// # Usage
///
/// ```
/// use hubline_client::transaction::TransactionBuilder;
/// use hubline_client::transaction::types::Address;
///
/// let tx = TransactionBuilder::new()
///     .from(Address::new([1; 20]))
///     .to(Address::new([2; 20]))
///     .payload(b"invoke".to_vec())
///     .build();
///
/// assert_eq!(tx.nonce, 0);
/// assert!(tx.timestamp > 0);
/// ```
///
/// `timestamp` defaults to the current UTC time in nanoseconds, taken at
/// `build()`. `nonce`, `amount` and `typ` default to 0.
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    from: Option<Address>,
    to: Option<Address>,
    timestamp: Option<i64>,
    payload: Vec<u8>,
    nonce: u64,
    amount: u64,
    typ: u32,
    packet: Option<InterchainPacket>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender. May instead come from [`TransactOpts::from`].
    pub fn from(mut self, address: Address) -> Self {
        self.from = Some(address);
        self
    }

    pub fn to(mut self, address: Address) -> Self {
        self.to = Some(address);
        self
    }

    /// Sets the timestamp explicitly (nanoseconds since the Unix epoch).
    pub fn timestamp(mut self, nanos: i64) -> Self {
        self.timestamp = Some(nanos);
        self
    }

    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.payload = data;
        self
    }

    /// Sets the nonce. Usually left alone and assigned by
    /// [`prepare_transaction`].
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Ledger-defined transaction type tag.
    pub fn typ(mut self, typ: u32) -> Self {
        self.typ = typ;
        self
    }

    /// Attaches a cross-chain packet reference.
    pub fn packet(mut self, packet: InterchainPacket) -> Self {
        self.packet = Some(packet);
        self
    }

    pub fn build(self) -> UnsignedTransaction {
        let timestamp = self.timestamp.unwrap_or_else(now_nanos);
        UnsignedTransaction {
            from: self.from,
            to: self.to,
            timestamp,
            payload: self.payload,
            nonce: self.nonce,
            amount: self.amount,
            typ: self.typ,
            packet: self.packet,
        }
    }
}

fn now_nanos() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_millis().saturating_mul(1_000_000))
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

/// Turns a built transaction into a signed, nonce-bearing one.
///
/// Checks run in this order and stop at the first failure:
///
/// 1. `identity` is present, else `MissingIdentity`;
/// 2. sender is `opts.from`, falling back to `tx.from`, else
///    `MalformedTransaction`;
/// 3. recipient is present, else `MalformedTransaction`;
/// 4. nonce via [`resolve_nonce`] (`NonceConflict`, or the query's error);
/// 5. [`sign_transaction`].
///
/// `query` only runs once steps 1 to 3 have passed and no explicit nonce was
/// given.
pub fn prepare_transaction<Q>(
    mut tx: UnsignedTransaction,
    opts: &TransactOpts,
    identity: Option<&SigningIdentity>,
    query: Q,
) -> Result<SignedTransaction, ClientError>
where
    Q: FnOnce(&Address) -> Result<u64, RpcError>,
{
    let identity = identity.ok_or(ClientError::MissingIdentity)?;
    let sender = opts
        .from
        .or(tx.from)
        .ok_or_else(|| ClientError::malformed("no sender: set TransactOpts::from or tx.from"))?;
    if tx.to.is_none() {
        return Err(ClientError::malformed("no recipient"));
    }

    let nonce = resolve_nonce(opts, &sender, query)?;
    tx.from = Some(sender);
    tx.nonce = nonce;

    debug!(from = %sender, nonce, payload_len = tx.payload.len(), "prepared transaction");
    sign_transaction(&tx, identity)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
