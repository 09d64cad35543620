//! # Subscription Records
//!
//! The ledger pushes blocks, headers, events and cross-chain batches over a
//! streaming subscription. How that stream is opened is the transport's
//! job. What arrives on it is a [`SubscriptionRecord`]: a kind tag and a
//! JSON body. This module turns those into typed [`StreamItem`]s.
//!
//! Parsing holds no state, so records from any number of streams can be
//! parsed concurrently.

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::transaction::types::{ContractEvent, Receipt, SignedTransaction};

/// What a subscription delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionKind {
    Block,
    BlockHeader,
    Event,
    InterchainTx,
    Audit,
}

impl SubscriptionKind {
    /// Topic name the ledger uses for this kind.
    pub fn topic(self) -> &'static str {
        match self {
            SubscriptionKind::Block => "BLOCK",
            SubscriptionKind::BlockHeader => "BLOCK_HEADER",
            SubscriptionKind::Event => "EVENT",
            SubscriptionKind::InterchainTx => "INTERCHAIN_TX_WRAPPER",
            SubscriptionKind::Audit => "AUDIT_NODE",
        }
    }
}

/// One message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub kind: SubscriptionKind,
    /// JSON-encoded body.
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub parent_hash: String,
    pub state_root: String,
    pub tx_root: String,
    pub receipt_root: String,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub hash: String,
    #[serde(default)]
    pub transactions: Vec<SignedTransaction>,
}

/// Cross-chain transactions included at one height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchainTxBatch {
    pub height: u64,
    #[serde(default)]
    pub transactions: Vec<SignedTransaction>,
}

/// A transaction and its receipt, as seen by an audit node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub block_height: u64,
    pub tx: SignedTransaction,
    pub receipt: Receipt,
}

/// A parsed subscription message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Block(Block),
    BlockHeader(BlockHeader),
    Events(Vec<ContractEvent>),
    InterchainTx(InterchainTxBatch),
    Audit(AuditRecord),
}

impl StreamItem {
    pub fn kind(&self) -> SubscriptionKind {
        match self {
            StreamItem::Block(_) => SubscriptionKind::Block,
            StreamItem::BlockHeader(_) => SubscriptionKind::BlockHeader,
            StreamItem::Events(_) => SubscriptionKind::Event,
            StreamItem::InterchainTx(_) => SubscriptionKind::InterchainTx,
            StreamItem::Audit(_) => SubscriptionKind::Audit,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(record: &SubscriptionRecord) -> Result<T, ClientError> {
    serde_json::from_slice(&record.data).map_err(|e| {
        ClientError::decode(format!("{} record: {e}", record.kind.topic()))
    })
}

/// Decode one record according to its kind.
pub fn parse_record(record: &SubscriptionRecord) -> Result<StreamItem, ClientError> {
    let item = match record.kind {
        SubscriptionKind::Block => StreamItem::Block(decode(record)?),
        SubscriptionKind::BlockHeader => StreamItem::BlockHeader(decode(record)?),
        SubscriptionKind::Event => StreamItem::Events(decode(record)?),
        SubscriptionKind::InterchainTx => StreamItem::InterchainTx(decode(record)?),
        SubscriptionKind::Audit => StreamItem::Audit(decode(record)?),
    };
    Ok(item)
}

/// Map a delivered stream of records to parsed items. A bad record yields an
/// `Err` item; the stream keeps going.
pub fn parse_stream<S>(records: S) -> impl Stream<Item = Result<StreamItem, ClientError>>
where
    S: Stream<Item = SubscriptionRecord>,
{
    records.map(|record| parse_record(&record))
}
