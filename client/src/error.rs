//! # Client Errors
//!
//! One error type for the whole pipeline. Each failure keeps its own
//! variant all the way up to the caller: a nonce conflict is never reported
//! as an RPC failure, and an RPC failure is never flattened into a string.
//!
//! [`ClientError::class`] groups the variants the way a caller usually
//! reacts to them:
//!
//! | Class         | Meaning                                         | Retry? |
//! |---------------|-------------------------------------------------|--------|
//! | `Validation`  | Rejected locally, nothing was sent              | no     |
//! | `Transient`   | Ledger not ready yet (unreachable, not final)   | yes    |
//! | `Remote`      | Ledger answered with a protocol/state error     | no     |
//! | `Application` | Ledger executed the call and it failed          | no     |
//! | `Decode`      | Ledger answered with bytes we cannot parse      | no     |

use thiserror::Error;

use crate::crypto::keys::KeyError;
use crate::crypto::signatures::SignatureError;
use crate::network::rpc::RpcError;
use crate::transaction::types::TransactionId;

/// Coarse grouping of [`ClientError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Validation,
    Transient,
    Remote,
    Application,
    Decode,
}

/// Errors surfaced by the transaction pipeline and the client facade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// An operation needed a signing identity and none was provided.
    #[error("no signing identity available")]
    MissingIdentity,

    /// Sender or recipient missing, empty method name, and similar.
    #[error("malformed transaction: {reason}")]
    MalformedTransaction { reason: String },

    /// Both a normal and a packet nonce were supplied.
    #[error("conflicting nonces: normal nonce {normal} and packet nonce {packet} both set")]
    NonceConflict { normal: u64, packet: u64 },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// A remote call failed. Carries the ledger's error unchanged.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    /// The receipt never became available within the retry budget.
    #[error(
        "receipt for {} still pending after {attempts} attempts (last error: {last})",
        .tx_id.fingerprint()
    )]
    ReceiptPending {
        tx_id: TransactionId,
        attempts: u32,
        last: RpcError,
    },

    /// The caller's deadline would pass before the next attempt could start.
    #[error(
        "deadline exceeded waiting for receipt of {} after {attempts} attempts",
        .tx_id.fingerprint()
    )]
    DeadlineExceeded {
        tx_id: TransactionId,
        attempts: u32,
        last: Option<RpcError>,
    },

    /// Contract deployment executed but the ledger reported failure.
    #[error("contract deployment failed: {reason}")]
    ContractDeploy { reason: String },

    /// Bytes returned by the ledger (receipt data, stream records) did not
    /// parse.
    #[error("decode error: {reason}")]
    Decode { reason: String },
}

impl ClientError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        ClientError::MalformedTransaction {
            reason: reason.into(),
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        ClientError::Decode {
            reason: reason.into(),
        }
    }

    /// Which [`ErrorClass`] this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            ClientError::MissingIdentity
            | ClientError::MalformedTransaction { .. }
            | ClientError::NonceConflict { .. }
            | ClientError::InvalidConfig { .. }
            | ClientError::Key(_)
            | ClientError::Signature(_) => ErrorClass::Validation,
            ClientError::Rpc(e) if e.is_transient() => ErrorClass::Transient,
            ClientError::Rpc(_) => ErrorClass::Remote,
            ClientError::ReceiptPending { .. } | ClientError::DeadlineExceeded { .. } => {
                ErrorClass::Transient
            }
            ClientError::ContractDeploy { .. } => ErrorClass::Application,
            ClientError::Decode { .. } => ErrorClass::Decode,
        }
    }

    /// Whether trying the same operation again later can succeed.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}
