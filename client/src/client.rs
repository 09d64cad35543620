//! # Ledger Client
//!
//! [`LedgerClient`] ties the pipeline together behind one handle: it holds
//! a transport, a validated [`ClientConfig`], a receipt poller, and an
//! optional session identity used to sign.
//!
//! Every operation reads the session identity exactly once, at the start.
//! Swapping or clearing it while an operation runs does not affect that
//! operation.
//!
//! ```no_run
//! # use hubline_client::client::LedgerClient;
//! # use hubline_client::config::ClientConfig;
//! # use hubline_client::crypto::keys::{Curve, SigningIdentity};
//! # use hubline_client::network::rpc::LedgerRpc;
//! # use hubline_client::transaction::types::Address;
//! # fn demo(transport: impl LedgerRpc) -> Result<(), hubline_client::error::ClientError> {
//! let client = LedgerClient::new(transport, ClientConfig::default())?;
//! client.set_identity(SigningIdentity::generate(Curve::S256));
//!
//! let receipt = client.transfer(Address::new([2; 20]), 100)?;
//! assert!(receipt.is_success());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::contract::{Arg, InvokePayload, TransactionData, VmType};
use crate::crypto::keys::SigningIdentity;
use crate::error::ClientError;
use crate::network::receipt::{self, ReceiptPoller};
use crate::network::rpc::{BlockQuery, ChainMeta, ChainStatus, LedgerRpc, MultiSignKind};
use crate::network::subscription::Block;
use crate::transaction::builder::{prepare_transaction, TransactionBuilder};
use crate::transaction::types::{
    Address, Receipt, SignedTransaction, TransactOpts, TransactionId, TransactionRecord,
    UnsignedTransaction,
};

/// Client for one ledger node.
pub struct LedgerClient<R: LedgerRpc> {
    rpc: R,
    config: ClientConfig,
    poller: ReceiptPoller,
    identity: RwLock<Option<SigningIdentity>>,
}

impl<R: LedgerRpc> LedgerClient<R> {
    /// Creates a client. Fails with `InvalidConfig` if `config` does not
    /// pass [`ClientConfig::check`].
    pub fn new(rpc: R, config: ClientConfig) -> Result<Self, ClientError> {
        config.check()?;
        let poller = ReceiptPoller::new(config.receipt_retry);
        debug!(endpoint = %config.endpoint(), "ledger client created");
        Ok(Self {
            rpc,
            config,
            poller,
            identity: RwLock::new(None),
        })
    }

    /// Replaces the receipt poller, e.g. to inject a clock.
    pub fn with_poller(mut self, poller: ReceiptPoller) -> Self {
        self.poller = poller;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    // -----------------------------------------------------------------------
    // Session identity
    // -----------------------------------------------------------------------

    pub fn set_identity(&self, identity: SigningIdentity) {
        info!(address = %identity.address(), curve = %identity.curve(), "session identity set");
        *self.identity.write() = Some(identity);
    }

    pub fn clear_identity(&self) {
        *self.identity.write() = None;
    }

    /// Snapshot of the session identity.
    pub fn identity(&self) -> Result<SigningIdentity, ClientError> {
        self.identity
            .read()
            .clone()
            .ok_or(ClientError::MissingIdentity)
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Validate, assign a nonce and sign with the session identity.
    pub fn prepare(
        &self,
        tx: UnsignedTransaction,
        opts: &TransactOpts,
    ) -> Result<SignedTransaction, ClientError> {
        let identity = self.identity.read().clone();
        self.prepare_with(tx, opts, identity.as_ref())
    }

    fn prepare_with(
        &self,
        tx: UnsignedTransaction,
        opts: &TransactOpts,
        identity: Option<&SigningIdentity>,
    ) -> Result<SignedTransaction, ClientError> {
        prepare_transaction(tx, opts, identity, |account| {
            self.rpc.get_pending_nonce(account)
        })
    }

    /// Submit an already signed transaction. Never retried.
    pub fn submit(&self, tx: &SignedTransaction) -> Result<TransactionId, ClientError> {
        receipt::submit(&self.rpc, tx)
    }

    /// Prepare and submit.
    pub fn send_transaction(
        &self,
        tx: UnsignedTransaction,
        opts: &TransactOpts,
    ) -> Result<TransactionId, ClientError> {
        let signed = self.prepare(tx, opts)?;
        self.submit(&signed)
    }

    /// Poll for a receipt. Bounded by the retry policy and, when set,
    /// `receipt_timeout` from now.
    pub fn get_receipt(&self, tx_id: &TransactionId) -> Result<Receipt, ClientError> {
        self.poller.await_receipt(&self.rpc, tx_id, self.deadline())
    }

    /// Prepare, submit once, and wait for the receipt.
    pub fn send_transaction_with_receipt(
        &self,
        tx: UnsignedTransaction,
        opts: &TransactOpts,
    ) -> Result<Receipt, ClientError> {
        let tx_id = self.send_transaction(tx, opts)?;
        self.get_receipt(&tx_id)
    }

    /// Sign and execute without committing. No retry.
    pub fn send_view(&self, tx: UnsignedTransaction) -> Result<Receipt, ClientError> {
        let signed = self.prepare(tx, &TransactOpts::default())?;
        Ok(self.rpc.send_view(&signed)?)
    }

    pub fn get_transaction(&self, tx_id: &TransactionId) -> Result<TransactionRecord, ClientError> {
        Ok(self.rpc.get_transaction(tx_id)?)
    }

    /// Next nonce the ledger expects from `account`.
    pub fn pending_nonce(&self, account: &Address) -> Result<u64, ClientError> {
        Ok(self.rpc.get_pending_nonce(account)?)
    }

    /// Validator address → signature over `content`, as the ledger returns
    /// it. No aggregation or checking happens here.
    pub fn get_multi_signs(
        &self,
        kind: MultiSignKind,
        content: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, ClientError> {
        Ok(self.rpc.get_multi_signs(kind, content)?)
    }

    // -----------------------------------------------------------------------
    // Chain queries
    // -----------------------------------------------------------------------
    //
    // Single calls, no identity needed. Ledger errors come back as
    // `ClientError::Rpc` unchanged.

    pub fn get_block(&self, query: &BlockQuery) -> Result<Block, ClientError> {
        Ok(self.rpc.get_block(query)?)
    }

    /// Blocks `offset..offset + length` by height.
    pub fn get_blocks(&self, offset: u64, length: u64) -> Result<Vec<Block>, ClientError> {
        Ok(self.rpc.get_blocks(offset, length)?)
    }

    pub fn get_chain_meta(&self) -> Result<ChainMeta, ClientError> {
        Ok(self.rpc.get_chain_meta()?)
    }

    pub fn get_chain_status(&self) -> Result<ChainStatus, ClientError> {
        Ok(self.rpc.get_chain_status()?)
    }

    pub fn get_network_meta(&self) -> Result<Vec<u8>, ClientError> {
        Ok(self.rpc.get_network_meta()?)
    }

    pub fn get_validators(&self) -> Result<Vec<u8>, ClientError> {
        Ok(self.rpc.get_validators()?)
    }

    pub fn get_account_balance(&self, account: &Address) -> Result<u64, ClientError> {
        Ok(self.rpc.get_account_balance(account)?)
    }

    // -----------------------------------------------------------------------
    // Contracts
    // -----------------------------------------------------------------------

    /// Send `data` to `to` from the session identity and wait for the
    /// receipt.
    fn execute(&self, to: Address, data: &TransactionData) -> Result<Receipt, ClientError> {
        let identity = self.identity()?;
        let tx = TransactionBuilder::new()
            .from(identity.address())
            .to(to)
            .amount(data.amount)
            .payload(data.encode()?)
            .build();
        let signed = self.prepare_with(tx, &TransactOpts::default(), Some(&identity))?;
        self.poller.submit_and_await(&self.rpc, &signed, self.deadline())
    }

    /// `None` when no timeout is set, or when it lies beyond what `Instant`
    /// can represent.
    fn deadline(&self) -> Option<Instant> {
        self.config
            .receipt_timeout
            .and_then(|timeout| self.poller.now().checked_add(timeout))
    }

    /// Call `method` on `contract` and wait for the receipt. A receipt with
    /// a failed status is returned as-is.
    pub fn invoke_contract(
        &self,
        vm_type: VmType,
        contract: &Address,
        method: &str,
        args: Vec<Arg>,
    ) -> Result<Receipt, ClientError> {
        if method.is_empty() {
            return Err(ClientError::malformed("contract method must not be empty"));
        }
        let data = TransactionData::invoke(vm_type, &InvokePayload::new(method, args))?;
        debug!(contract = %contract, method, vm = ?vm_type, "invoking contract");
        self.execute(*contract, &data)
    }

    pub fn invoke_bvm_contract(
        &self,
        contract: &Address,
        method: &str,
        args: Vec<Arg>,
    ) -> Result<Receipt, ClientError> {
        self.invoke_contract(VmType::Bvm, contract, method, args)
    }

    pub fn invoke_xvm_contract(
        &self,
        contract: &Address,
        method: &str,
        args: Vec<Arg>,
    ) -> Result<Receipt, ClientError> {
        self.invoke_contract(VmType::Xvm, contract, method, args)
    }

    /// Deploy an XVM module and return the new contract's address.
    pub fn deploy_contract(&self, code: Vec<u8>) -> Result<Address, ClientError> {
        if code.is_empty() {
            return Err(ClientError::malformed("contract code must not be empty"));
        }
        let receipt = self.execute(Address::ZERO, &TransactionData::deploy(code))?;
        if let Some(reason) = receipt.failure_reason() {
            return Err(ClientError::ContractDeploy {
                reason: reason.to_string(),
            });
        }
        let address = Address::from_slice(&receipt.ret).map_err(|_| {
            ClientError::decode(format!(
                "deploy receipt returned {} bytes, expected an address",
                receipt.ret.len()
            ))
        })?;
        info!(contract = %address, "contract deployed");
        Ok(address)
    }

    /// Transfer `amount` to `to` and wait for the receipt.
    pub fn transfer(&self, to: Address, amount: u64) -> Result<Receipt, ClientError> {
        self.execute(to, &TransactionData::transfer(amount))
    }
}
