//! # Network Layer
//!
//! Everything that talks to the ledger, or describes what it says back.
//!
//! - [`rpc`] — the remote call boundary ([`LedgerRpc`]), its error type and
//!   the chain query shapes.
//! - [`receipt`] — one-shot submission and the bounded receipt retry loop.
//! - [`subscription`] — typed parsing of pushed subscription records.
//!
//! The transport itself (channels, TLS, generated stubs) lives outside this
//! crate and plugs in by implementing [`LedgerRpc`].

pub mod receipt;
pub mod rpc;
pub mod subscription;

pub use receipt::{submit, Clock, ReceiptPoller, RetryPolicy, SystemClock};
pub use rpc::{BlockQuery, ChainMeta, ChainStatus, LedgerRpc, MultiSignKind, RpcCode, RpcError};
pub use subscription::{
    parse_record, parse_stream, Block, BlockHeader, StreamItem, SubscriptionKind,
    SubscriptionRecord,
};
