//! Core type definitions for ledger transactions.
//!
//! Everything a transaction is made of, from the 20-byte [`Address`] to the
//! [`Receipt`] the ledger hands back once the transaction is final.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::ADDRESS_LENGTH;
use crate::crypto::hash::domain_hash;
use crate::error::ClientError;

/// Strips an optional `0x`/`0X` prefix.
fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or contract address.
///
/// Text form is `0x` followed by 40 lowercase hex characters. Parsing is
/// lenient about the prefix and letter case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Contract deployments are sent here.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Builds an address from exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ClientError> {
        let array: [u8; ADDRESS_LENGTH] = bytes.try_into().map_err(|_| {
            ClientError::malformed(format!(
                "address must be {ADDRESS_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s.trim()))
            .map_err(|e| ClientError::malformed(format!("invalid address {s:?}: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TransactionId
// ---------------------------------------------------------------------------

/// Identifier of a transaction: its canonical encoding, un-hashed.
///
/// Two identifiers are equal exactly when the encodings are byte-equal.
/// Displayed and serialized as `0x`-prefixed hex of the whole encoding,
/// which grows with the payload. Logs and error messages use
/// [`TransactionId::fingerprint`] instead.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(Vec<u8>);

impl TransactionId {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, ClientError> {
        hex::decode(strip_hex_prefix(s.trim()))
            .map(Self)
            .map_err(|e| ClientError::decode(format!("invalid transaction id: {e}")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Short, fixed-size form of this id.
    pub fn fingerprint(&self) -> IdFingerprint {
        let digest = domain_hash(&self.0);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        IdFingerprint {
            encoding_len: self.0.len(),
            digest_prefix: prefix,
        }
    }
}

/// Encoding length plus the first 8 bytes of the encoding's SHA-256,
/// displayed as `tx[74]:1a2b3c4d5e6f7081`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdFingerprint {
    pub encoding_len: usize,
    pub digest_prefix: [u8; 8],
}

impl fmt::Display for IdFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx[{}]:{}",
            self.encoding_len,
            hex::encode(self.digest_prefix)
        )
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.fingerprint())
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// InterchainPacket
// ---------------------------------------------------------------------------

/// What a cross-chain packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    Interchain,
    Receipt,
    Rollback,
    /// Any kind this client has no name for, kept as its raw tag.
    Other(u8),
}

impl PacketKind {
    /// Wire tag used in the canonical encoding.
    pub fn tag(self) -> u8 {
        match self {
            PacketKind::Interchain => 0,
            PacketKind::Receipt => 1,
            PacketKind::Rollback => 2,
            PacketKind::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0 => PacketKind::Interchain,
            1 => PacketKind::Receipt,
            2 => PacketKind::Rollback,
            other => PacketKind::Other(other),
        }
    }
}

/// Reference to a cross-chain packet carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchainPacket {
    /// Source chain identifier.
    pub from: String,
    /// Destination chain identifier.
    pub to: String,
    /// Per source/destination pair sequence number.
    pub index: u64,
    pub kind: PacketKind,
    pub payload: Vec<u8>,
}

// ---------------------------------------------------------------------------
// UnsignedTransaction
// ---------------------------------------------------------------------------

/// A transaction that has not been signed yet.
///
/// `from` and `to` are optional here because the sender may come from
/// [`TransactOpts::from`] at preparation time. Both must be present before
/// the transaction can be canonicalized. A `nonce` of 0 means "not assigned".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub from: Option<Address>,
    pub to: Option<Address>,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
    pub payload: Vec<u8>,
    pub nonce: u64,
    pub amount: u64,
    pub typ: u32,
    pub packet: Option<InterchainPacket>,
}

// ---------------------------------------------------------------------------
// SignedTransaction
// ---------------------------------------------------------------------------

/// A signed, nonce-bearing transaction ready for submission.
///
/// Values from [`crate::transaction::signing::sign_transaction`] carry an
/// identifier and signature that match the fields. Values deserialized from
/// elsewhere (subscription records, stored JSON) carry whatever the source
/// sent: check them with [`SignedTransaction::verify`] before trusting the
/// sender. The fields are read-only from outside the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub(crate) from: Address,
    pub(crate) to: Address,
    pub(crate) timestamp: i64,
    pub(crate) payload: Vec<u8>,
    pub(crate) nonce: u64,
    pub(crate) amount: u64,
    pub(crate) typ: u32,
    pub(crate) packet: Option<InterchainPacket>,
    pub(crate) id: TransactionId,
    #[serde(with = "hex_bytes")]
    pub(crate) signature: Vec<u8>,
}

impl SignedTransaction {
    pub fn from(&self) -> &Address {
        &self.from
    }

    pub fn to(&self) -> &Address {
        &self.to
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn typ(&self) -> u32 {
        self.typ
    }

    pub fn packet(&self) -> Option<&InterchainPacket> {
        self.packet.as_ref()
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Wire-format signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The signed fields as an unsigned transaction, for re-canonicalizing.
    pub fn to_unsigned(&self) -> UnsignedTransaction {
        UnsignedTransaction {
            from: Some(self.from),
            to: Some(self.to),
            timestamp: self.timestamp,
            payload: self.payload.clone(),
            nonce: self.nonce,
            amount: self.amount,
            typ: self.typ,
            packet: self.packet.clone(),
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TransactOpts
// ---------------------------------------------------------------------------

/// Per-call options for preparing a transaction.
///
/// A nonce that is `None` or `Some(0)` counts as unset. Setting both nonces
/// is a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactOpts {
    pub normal_nonce: Option<u64>,
    pub packet_nonce: Option<u64>,
    /// Overrides the transaction's own sender.
    pub from: Option<Address>,
}

impl TransactOpts {
    pub fn with_normal_nonce(mut self, nonce: u64) -> Self {
        self.normal_nonce = Some(nonce);
        self
    }

    pub fn with_packet_nonce(mut self, nonce: u64) -> Self {
        self.packet_nonce = Some(nonce);
        self
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// Execution outcome recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    Failed { reason: String },
}

/// Block a transaction was included in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInclusion {
    pub height: u64,
    /// Hex-encoded block hash.
    pub hash: String,
}

/// Event emitted by a contract during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub event_type: String,
    pub data: Vec<u8>,
}

/// The ledger's record of an executed transaction.
///
/// A `Failed` status is still a receipt: the transaction was final, it just
/// didn't do what was asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_id: TransactionId,
    pub status: ReceiptStatus,
    /// Return data. For deployments this is the new contract's address.
    #[serde(default)]
    pub ret: Vec<u8>,
    #[serde(default)]
    pub block: Option<BlockInclusion>,
    #[serde(default)]
    pub events: Vec<ContractEvent>,
}

impl Receipt {
    pub fn success(tx_id: TransactionId, ret: Vec<u8>) -> Self {
        Self {
            tx_id,
            status: ReceiptStatus::Success,
            ret,
            block: None,
            events: Vec::new(),
        }
    }

    pub fn failed(tx_id: TransactionId, reason: impl Into<String>) -> Self {
        Self {
            tx_id,
            status: ReceiptStatus::Failed {
                reason: reason.into(),
            },
            ret: Vec::new(),
            block: None,
            events: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            ReceiptStatus::Failed { reason } => Some(reason),
            ReceiptStatus::Success => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionRecord
// ---------------------------------------------------------------------------

/// Where a transaction sits in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMeta {
    pub block_height: u64,
    pub block_hash: String,
    /// Position within the block.
    pub index: u64,
}

/// A transaction looked up by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub tx: SignedTransaction,
    pub meta: TransactionMeta,
}
