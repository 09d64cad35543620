//! # Ledger RPC Boundary
//!
//! The remote ledger is reached through generated RPC stubs that live
//! outside this crate. [`LedgerRpc`] is the narrow slice of that surface
//! the pipeline actually calls, and [`RpcError`] is the error every call
//! reports.
//!
//! Implementations own connection handling, TLS and per-call deadlines
//! (see [`crate::config::ClientConfig::rpc_timeout`]). They must be usable
//! from several threads at once.
//!
//! ## Method Index
//!
//! | Method               | Description                                   |
//! |----------------------|-----------------------------------------------|
//! | `send_transaction`   | Submit a signed transaction, echo its id      |
//! | `send_view`          | Execute read-only, return the receipt         |
//! | `get_receipt`        | Receipt for a submitted transaction           |
//! | `get_pending_nonce`  | Next nonce the ledger expects from an account |
//! | `get_transaction`    | Look up a transaction and its block position  |
//! | `get_multi_signs`    | Collect validator signatures over some content|
//! | `get_block`          | One block, by height or by hash               |
//! | `get_blocks`         | A contiguous range of blocks by height        |
//! | `get_chain_meta`     | Current height and head block hash            |
//! | `get_chain_status`   | Whether the ledger reports itself healthy     |
//! | `get_network_meta`   | Peer/network description, opaque bytes        |
//! | `get_validators`     | Validator set description, opaque bytes       |
//! | `get_account_balance`| Spendable balance of an account               |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::subscription::Block;
use crate::transaction::types::{
    Address, Receipt, SignedTransaction, TransactionId, TransactionRecord,
};

// ---------------------------------------------------------------------------
// Status Codes
// ---------------------------------------------------------------------------

/// gRPC-style status codes. The numeric values match the gRPC ones so a
/// transport can map them without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcCode {
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    FailedPrecondition = 9,
    Internal = 13,
    Unavailable = 14,
}

impl RpcCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a raw status number. Anything this client does not distinguish
    /// becomes `Unknown`.
    pub fn from_i32(code: i32) -> Self {
        match code {
            3 => RpcCode::InvalidArgument,
            4 => RpcCode::DeadlineExceeded,
            5 => RpcCode::NotFound,
            6 => RpcCode::AlreadyExists,
            9 => RpcCode::FailedPrecondition,
            13 => RpcCode::Internal,
            14 => RpcCode::Unavailable,
            _ => RpcCode::Unknown,
        }
    }

    /// Unavailable and DeadlineExceeded mean "try again later": the node is
    /// unreachable or has not finalized the data yet. Everything else is a
    /// real answer from the ledger.
    pub fn is_transient(self) -> bool {
        matches!(self, RpcCode::Unavailable | RpcCode::DeadlineExceeded)
    }
}

impl fmt::Display for RpcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RpcCode::Unknown => "UNKNOWN",
            RpcCode::InvalidArgument => "INVALID_ARGUMENT",
            RpcCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            RpcCode::NotFound => "NOT_FOUND",
            RpcCode::AlreadyExists => "ALREADY_EXISTS",
            RpcCode::FailedPrecondition => "FAILED_PRECONDITION",
            RpcCode::Internal => "INTERNAL",
            RpcCode::Unavailable => "UNAVAILABLE",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// Error reported by a remote call.
///
/// Kept as data: the pipeline passes it through untouched so the caller sees
/// exactly what the ledger said.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct RpcError {
    /// Status code.
    pub code: RpcCode,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Node unreachable, or the requested data is not available yet.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(RpcCode::Unavailable, msg)
    }

    /// The call ran past its deadline.
    pub fn deadline_exceeded(msg: impl Into<String>) -> Self {
        Self::new(RpcCode::DeadlineExceeded, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(RpcCode::NotFound, msg)
    }

    /// The ledger rejected the request (bad signature, bad nonce, ...).
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(RpcCode::InvalidArgument, msg)
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::new(RpcCode::FailedPrecondition, msg)
    }

    /// Duplicate submission.
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::new(RpcCode::AlreadyExists, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(RpcCode::Internal, msg)
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::new(RpcCode::Unknown, msg)
    }

    /// Attaches structured detail from the server.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

// ---------------------------------------------------------------------------
// Chain Queries
// ---------------------------------------------------------------------------

/// How [`LedgerRpc::get_block`] selects a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockQuery {
    Height(u64),
    /// `0x`-prefixed block hash.
    Hash(String),
}

impl fmt::Display for BlockQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockQuery::Height(height) => write!(f, "height {height}"),
            BlockQuery::Hash(hash) => write!(f, "hash {hash}"),
        }
    }
}

/// Head of the chain as the node currently sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMeta {
    pub height: u64,
    pub block_hash: String,
    #[serde(default)]
    pub interchain_tx_count: u64,
}

/// Health the ledger reports for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    Normal,
    Abnormal,
}

// ---------------------------------------------------------------------------
// Remote Surface
// ---------------------------------------------------------------------------

/// Which kind of content validators are asked to co-sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MultiSignKind {
    AssetExchange,
    Ibtp,
    BlockHeader,
    Burn,
}

/// The remote calls the pipeline depends on.
///
/// Every method is a single blocking round trip. Retrying is the caller's
/// business (see [`crate::network::receipt::ReceiptPoller`]), never the
/// implementation's.
pub trait LedgerRpc: Send + Sync {
    /// Submit a signed transaction. Returns the identifier the ledger
    /// assigned, which equals the transaction's canonical encoding.
    fn send_transaction(&self, tx: &SignedTransaction) -> Result<TransactionId, RpcError>;

    /// Execute a signed transaction without committing it.
    fn send_view(&self, tx: &SignedTransaction) -> Result<Receipt, RpcError>;

    /// Fetch the receipt for a submitted transaction. Returns a transient
    /// error while the transaction is not final yet.
    fn get_receipt(&self, tx_id: &TransactionId) -> Result<Receipt, RpcError>;

    /// Next nonce the ledger will accept from `account`.
    fn get_pending_nonce(&self, account: &Address) -> Result<u64, RpcError>;

    fn get_transaction(&self, tx_id: &TransactionId) -> Result<TransactionRecord, RpcError>;

    /// Validator address → signature over `content`.
    fn get_multi_signs(
        &self,
        kind: MultiSignKind,
        content: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, RpcError>;

    fn get_block(&self, query: &BlockQuery) -> Result<Block, RpcError>;

    /// Blocks `offset..offset + length` by height. Heights the ledger does
    /// not have yet are left out.
    fn get_blocks(&self, offset: u64, length: u64) -> Result<Vec<Block>, RpcError>;

    fn get_chain_meta(&self) -> Result<ChainMeta, RpcError>;

    fn get_chain_status(&self) -> Result<ChainStatus, RpcError>;

    /// Network description as the node encodes it. Not interpreted here.
    fn get_network_meta(&self) -> Result<Vec<u8>, RpcError>;

    /// Validator set as the node encodes it. Not interpreted here.
    fn get_validators(&self) -> Result<Vec<u8>, RpcError>;

    fn get_account_balance(&self, account: &Address) -> Result<u64, RpcError>;
}

impl<T: LedgerRpc + ?Sized> LedgerRpc for std::sync::Arc<T> {
    fn send_transaction(&self, tx: &SignedTransaction) -> Result<TransactionId, RpcError> {
        (**self).send_transaction(tx)
    }

    fn send_view(&self, tx: &SignedTransaction) -> Result<Receipt, RpcError> {
        (**self).send_view(tx)
    }

    fn get_receipt(&self, tx_id: &TransactionId) -> Result<Receipt, RpcError> {
        (**self).get_receipt(tx_id)
    }

    fn get_pending_nonce(&self, account: &Address) -> Result<u64, RpcError> {
        (**self).get_pending_nonce(account)
    }

    fn get_transaction(&self, tx_id: &TransactionId) -> Result<TransactionRecord, RpcError> {
        (**self).get_transaction(tx_id)
    }

    fn get_multi_signs(
        &self,
        kind: MultiSignKind,
        content: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, RpcError> {
        (**self).get_multi_signs(kind, content)
    }

    fn get_block(&self, query: &BlockQuery) -> Result<Block, RpcError> {
        (**self).get_block(query)
    }

    fn get_blocks(&self, offset: u64, length: u64) -> Result<Vec<Block>, RpcError> {
        (**self).get_blocks(offset, length)
    }

    fn get_chain_meta(&self) -> Result<ChainMeta, RpcError> {
        (**self).get_chain_meta()
    }

    fn get_chain_status(&self) -> Result<ChainStatus, RpcError> {
        (**self).get_chain_status()
    }

    fn get_network_meta(&self) -> Result<Vec<u8>, RpcError> {
        (**self).get_network_meta()
    }

    fn get_validators(&self) -> Result<Vec<u8>, RpcError> {
        (**self).get_validators()
    }

    fn get_account_balance(&self, account: &Address) -> Result<u64, RpcError> {
        (**self).get_account_balance(account)
    }
}
