//! # Transaction Module
//!
//! Construction, nonce assignment, canonical encoding and signing of ledger
//! transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs      — Address, TransactionId, unsigned/signed transactions, receipts
//! builder.rs    — Fluent TransactionBuilder and prepare_transaction
//! nonce.rs      — Normal / packet / queried nonce selection
//! canonical.rs  — The one byte encoding used for both id and signature
//! signing.rs    — ECDSA signing and verification of transactions
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build** — [`TransactionBuilder`] assembles an [`UnsignedTransaction`].
//! 2. **Prepare** — [`prepare_transaction`] validates sender/recipient,
//!    resolves the nonce and calls [`sign_transaction`].
//! 3. **Submit** — [`crate::network::receipt::submit`] hands the signed
//!    transaction to the ledger.
//! 4. **Receipt** — [`crate::network::receipt::ReceiptPoller`] waits for the
//!    ledger to finalize it.
//!
//! ## Design Decisions
//!
//! - The identifier is the canonical encoding itself, not a hash of it. The
//!   signature is over SHA-256 of the same bytes.
//! - The encoding is versioned by its first byte. There is exactly one
//!   version today.
//! - All amounts are `u64`. No floating point anywhere near value transfer.

pub mod builder;
pub mod canonical;
pub mod nonce;
pub mod signing;
pub mod types;

pub use builder::{prepare_transaction, TransactionBuilder};
pub use canonical::canonicalize;
pub use nonce::resolve_nonce;
pub use signing::{sign_transaction, verify_transaction};
pub use types::{
    Address, InterchainPacket, PacketKind, Receipt, ReceiptStatus, SignedTransaction,
    TransactOpts, TransactionId, TransactionRecord, UnsignedTransaction,
};
