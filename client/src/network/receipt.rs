//! # Submission & Receipt Polling
//!
//! Submitting is one remote call, never retried: a transaction that reached
//! the ledger once must not be sent again behind the caller's back.
//!
//! Fetching the receipt is different. The ledger confirms asynchronously,
//! so right after submission the receipt simply isn't there yet and the
//! node answers with a transient error. [`ReceiptPoller`] retries those in a
//! bounded loop:
//!
//! ```text
//! attempt 1 ──transient──▶ sleep(delay) ──▶ attempt 2 ── … ──▶ attempt N
//!     │                                         │                   │
//!     └── Ok(receipt) / non-transient ──────────┴──── returned ─────┘
//!                                                     ReceiptPending
//! ```
//!
//! A receipt with a failed status is still a receipt and ends the loop.
//! Time is read through a [`Clock`] so tests can run the loop without
//! actually sleeping.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::rpc::{LedgerRpc, RpcError};
use crate::config::{serde_millis, RECEIPT_MAX_ATTEMPTS, RECEIPT_RETRY_DELAY};
use crate::error::ClientError;
use crate::transaction::types::{Receipt, SignedTransaction, TransactionId};

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How many times to ask for a receipt, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total calls, including the first.
    pub max_attempts: u32,
    /// Fixed pause between consecutive calls.
    #[serde(rename = "delay_ms", with = "serde_millis")]
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RECEIPT_MAX_ATTEMPTS,
            delay: RECEIPT_RETRY_DELAY,
        }
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of time for the polling loop.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock: `Instant::now` and a blocking `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

type TransientPredicate = dyn Fn(&RpcError) -> bool + Send + Sync;

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Submit a signed transaction. Exactly one remote call; failures come back
/// as [`ClientError::Rpc`] unchanged.
pub fn submit<R: LedgerRpc + ?Sized>(
    rpc: &R,
    tx: &SignedTransaction,
) -> Result<TransactionId, ClientError> {
    let tx_id = rpc.send_transaction(tx)?;
    if tx_id != *tx.id() {
        warn!(
            local = %tx.id().fingerprint(),
            remote = %tx_id.fingerprint(),
            "ledger returned a different transaction id"
        );
    }
    info!(
        tx_id = %tx_id.fingerprint(),
        from = %tx.from(),
        nonce = tx.nonce(),
        "transaction submitted"
    );
    Ok(tx_id)
}

// ---------------------------------------------------------------------------
// ReceiptPoller
// ---------------------------------------------------------------------------

/// Bounded receipt retry loop.
///
/// Cheap to clone; clones share the clock and predicate.
#[derive(Clone)]
pub struct ReceiptPoller {
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    is_transient: Arc<TransientPredicate>,
}

impl Default for ReceiptPoller {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl fmt::Debug for ReceiptPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiptPoller")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ReceiptPoller {
    /// Poller on the system clock that retries [`RpcError::is_transient`]
    /// errors.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            clock: Arc::new(SystemClock),
            is_transient: Arc::new(RpcError::is_transient),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the rule deciding which errors are worth another attempt.
    pub fn with_transient_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RpcError) -> bool + Send + Sync + 'static,
    {
        self.is_transient = Arc::new(predicate);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Current time on this poller's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Fetch the receipt for `tx_id`, retrying transient errors.
    ///
    /// - `Ok(receipt)` on the first call that returns one, whatever its
    ///   status.
    /// - `Rpc` as soon as a call fails with a non-transient error.
    /// - `ReceiptPending` once `max_attempts` calls have all been transient.
    /// - `DeadlineExceeded` if the next attempt would start after
    ///   `deadline`, or if `deadline` has already passed before the first.
    ///
    /// Sleeps exactly `delay` between calls and never before the first.
    pub fn await_receipt<R: LedgerRpc + ?Sized>(
        &self,
        rpc: &R,
        tx_id: &TransactionId,
        deadline: Option<Instant>,
    ) -> Result<Receipt, ClientError> {
        if let Some(deadline) = deadline {
            if self.clock.now() >= deadline {
                return Err(ClientError::DeadlineExceeded {
                    tx_id: tx_id.clone(),
                    attempts: 0,
                    last: None,
                });
            }
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let err = match rpc.get_receipt(tx_id) {
                Ok(receipt) => {
                    info!(
                        tx_id = %tx_id.fingerprint(),
                        attempts,
                        success = receipt.is_success(),
                        "receipt received"
                    );
                    return Ok(receipt);
                }
                Err(err) => err,
            };

            if !(self.is_transient)(&err) {
                return Err(ClientError::Rpc(err));
            }

            if attempts >= max_attempts {
                warn!(
                    tx_id = %tx_id.fingerprint(),
                    attempts,
                    error = %err,
                    "receipt still pending, giving up"
                );
                return Err(ClientError::ReceiptPending {
                    tx_id: tx_id.clone(),
                    attempts,
                    last: err,
                });
            }

            if let Some(deadline) = deadline {
                let resume = self.clock.now().checked_add(self.policy.delay);
                if resume.map_or(true, |resume| resume > deadline) {
                    warn!(tx_id = %tx_id.fingerprint(), attempts, "receipt deadline reached");
                    return Err(ClientError::DeadlineExceeded {
                        tx_id: tx_id.clone(),
                        attempts,
                        last: Some(err),
                    });
                }
            }

            warn!(
                tx_id = %tx_id.fingerprint(),
                attempt = attempts,
                max_attempts,
                error = %err,
                "receipt not available yet, retrying"
            );
            self.clock.sleep(self.policy.delay);
        }
    }

    /// Submit once, then wait for the receipt.
    pub fn submit_and_await<R: LedgerRpc + ?Sized>(
        &self,
        rpc: &R,
        tx: &SignedTransaction,
        deadline: Option<Instant>,
    ) -> Result<Receipt, ClientError> {
        let tx_id = submit(rpc, tx)?;
        self.await_receipt(rpc, &tx_id, deadline)
    }
}
