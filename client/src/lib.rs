// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Hubline Client
//!
//! Client-side transaction pipeline for a relay-chain ledger: build a
//! transaction, give it a nonce, encode it canonically, sign it, submit it,
//! and wait for the ledger to confirm it.
//!
//! Confirmation is eventually consistent. The ledger answers "not yet" for
//! a while after a transaction is accepted, and the client has to keep
//! asking without asking forever. Most of the care in this crate goes into
//! getting three things exactly right: the bytes that get signed, the nonce
//! that gets used, and how long to wait.
//!
//! ## Architecture
//!
//! - **transaction** — Builder, nonce selection, canonical encoding, signing.
//! - **crypto** — SHA-256 / Keccak-256, secp256k1 and P-256 identities,
//!   signature wire formats.
//! - **network** — The [`network::rpc::LedgerRpc`] boundary, submission and
//!   receipt polling, subscription record parsing.
//! - **contract** — Typed contract arguments and invoke/deploy payloads.
//! - **client** — [`client::LedgerClient`], the facade over all of the above.
//! - **config** — Wire constants and [`config::ClientConfig`].
//! - **logging** — `tracing` subscriber bootstrap.
//! - **error** — [`error::ClientError`] and its retry classification.
//!
//! ## Design Philosophy
//!
//! 1. One canonical encoding, used for both the identifier and the signature.
//! 2. No shared mutable signing state: identities are passed explicitly.
//! 3. Invalid input is a typed error, never a panic.
//! 4. Every retry loop is bounded and can be driven by a test clock.

pub mod client;
pub mod config;
pub mod contract;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod network;
pub mod transaction;

pub use client::LedgerClient;
pub use error::{ClientError, ErrorClass};
