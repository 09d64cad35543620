//! Nonce selection for outgoing transactions.
//!
//! A transaction carries exactly one nonce. It comes from the caller (a
//! normal nonce for ordinary transactions, a packet nonce for cross-chain
//! ones) or, when the caller gave none, from the ledger's view of the
//! sender's pending nonce.

use tracing::debug;

use super::types::{Address, TransactOpts};
use crate::error::ClientError;
use crate::network::rpc::RpcError;

fn explicit(nonce: Option<u64>) -> Option<u64> {
    nonce.filter(|n| *n != 0)
}

/// Pick the nonce for a transaction sent from `account`.
///
/// | normal | packet | result                         |
/// |--------|--------|--------------------------------|
/// | set    | set    | `NonceConflict`, no query made |
/// | unset  | unset  | `query(account)`               |
/// | unset  | set    | packet                         |
/// | set    | unset  | normal                         |
///
/// A query failure comes back as [`ClientError::Rpc`] with the ledger's
/// error unchanged.
pub fn resolve_nonce<Q>(
    opts: &TransactOpts,
    account: &Address,
    query: Q,
) -> Result<u64, ClientError>
where
    Q: FnOnce(&Address) -> Result<u64, RpcError>,
{
    match (explicit(opts.normal_nonce), explicit(opts.packet_nonce)) {
        (Some(normal), Some(packet)) => Err(ClientError::NonceConflict { normal, packet }),
        (None, None) => {
            let nonce = query(account)?;
            debug!(account = %account, nonce, "pending nonce from ledger");
            Ok(nonce)
        }
        (None, Some(packet)) => Ok(packet),
        (Some(normal), None) => Ok(normal),
    }
}
