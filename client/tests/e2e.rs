//! End-to-end integration tests for the client pipeline.
//!
//! These tests run the full path from identity creation through receipt
//! retrieval against an in-memory stub ledger. The stub checks what a real
//! ledger checks on submission: the identifier matches the canonical
//! encoding, the signature verifies, the signer owns the sender address, and
//! the nonce is the one it expects. Receipts only become available after a
//! few polls, like a ledger that has not finalized the block yet.
//!
//! Each test builds its own ledger. No shared state, no real sleeping.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use hubline_client::client::LedgerClient;
use hubline_client::config::ClientConfig;
use hubline_client::contract::{system, Arg, TransactionData};
use hubline_client::crypto::hash::domain_hash;
use hubline_client::crypto::keys::{Curve, SigningIdentity};
use hubline_client::crypto::signatures::{verify_digest, CurveSignature};
use hubline_client::error::ClientError;
use hubline_client::network::receipt::{submit, Clock, ReceiptPoller, RetryPolicy};
use hubline_client::network::rpc::{
    BlockQuery, ChainMeta, ChainStatus, LedgerRpc, MultiSignKind, RpcCode, RpcError,
};
use hubline_client::network::subscription::{Block, BlockHeader};
use hubline_client::transaction::canonical::canonicalize;
use hubline_client::transaction::types::{
    Address, BlockInclusion, Receipt, SignedTransaction, TransactOpts, TransactionId,
    TransactionMeta, TransactionRecord,
};
use hubline_client::transaction::{sign_transaction, TransactionBuilder};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Clock that advances instantly when slept on.
struct InstantClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl InstantClock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        })
    }
}

impl Clock for InstantClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }

    fn sleep(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }
}

struct Stored {
    tx: SignedTransaction,
    polls_left: u32,
    height: u64,
}

/// In-memory ledger that validates submissions the way a node would.
struct StubLedger {
    /// How many receipt polls answer "unavailable" before the receipt shows.
    finality_polls: u32,
    txs: Mutex<HashMap<TransactionId, Stored>>,
    nonces: Mutex<HashMap<Address, u64>>,
    height: Mutex<u64>,
}

impl StubLedger {
    fn new(finality_polls: u32) -> Self {
        Self {
            finality_polls,
            txs: Mutex::new(HashMap::new()),
            nonces: Mutex::new(HashMap::new()),
            height: Mutex::new(0),
        }
    }

    fn next_nonce(&self, account: &Address) -> u64 {
        self.nonces.lock().get(account).copied().unwrap_or(0) + 1
    }

    fn check(&self, tx: &SignedTransaction) -> Result<(), RpcError> {
        let encoding = canonicalize(&tx.to_unsigned())
            .map_err(|e| RpcError::invalid_argument(e.to_string()))?;
        if encoding.as_slice() != tx.id().as_bytes() {
            return Err(RpcError::invalid_argument("id mismatch"));
        }
        let digest = domain_hash(&encoding);
        let signature = CurveSignature::decode(tx.signature())
            .map_err(|e| RpcError::invalid_argument(e.to_string()))?;
        let signer = signature
            .recover_public_key(&digest)
            .map_err(|e| RpcError::invalid_argument(e.to_string()))?;
        verify_digest(&signer, &digest, &signature)
            .map_err(|_| RpcError::invalid_argument("bad signature"))?;
        if signer.address() != *tx.from() {
            return Err(RpcError::invalid_argument("signer does not own sender"));
        }
        let expected = self.next_nonce(tx.from());
        if tx.nonce() != expected {
            return Err(RpcError::invalid_argument(format!(
                "nonce {} != expected {expected}",
                tx.nonce()
            )));
        }
        Ok(())
    }

    /// One block per accepted transaction, at the height it was given.
    fn block_at(&self, height: u64) -> Option<Block> {
        let txs = self.txs.lock();
        let stored = txs.values().find(|stored| stored.height == height)?;
        Some(Block {
            header: BlockHeader {
                number: height,
                parent_hash: block_hash(height.saturating_sub(1)),
                state_root: block_hash(0),
                tx_root: block_hash(0),
                receipt_root: block_hash(0),
                timestamp: stored.tx.timestamp(),
            },
            hash: block_hash(height),
            transactions: vec![stored.tx.clone()],
        })
    }
}

fn block_hash(height: u64) -> String {
    format!("0x{height:064x}")
}

/// Every account starts with this much and balances move with `amount`.
const GENESIS_BALANCE: u64 = 1_000;

impl LedgerRpc for StubLedger {
    fn send_transaction(&self, tx: &SignedTransaction) -> Result<TransactionId, RpcError> {
        self.check(tx)?;
        let mut txs = self.txs.lock();
        if txs.contains_key(tx.id()) {
            return Err(RpcError::already_exists("duplicate transaction"));
        }
        self.nonces.lock().insert(*tx.from(), tx.nonce());
        let height = {
            let mut h = self.height.lock();
            *h += 1;
            *h
        };
        txs.insert(
            tx.id().clone(),
            Stored {
                tx: tx.clone(),
                polls_left: self.finality_polls,
                height,
            },
        );
        Ok(tx.id().clone())
    }

    fn send_view(&self, tx: &SignedTransaction) -> Result<Receipt, RpcError> {
        self.check(tx)?;
        Ok(Receipt::success(tx.id().clone(), b"view".to_vec()))
    }

    fn get_receipt(&self, tx_id: &TransactionId) -> Result<Receipt, RpcError> {
        let mut txs = self.txs.lock();
        let stored = txs
            .get_mut(tx_id)
            .ok_or_else(|| RpcError::not_found("unknown transaction"))?;
        if stored.polls_left > 0 {
            stored.polls_left -= 1;
            return Err(RpcError::unavailable("not finalized"));
        }

        let mut receipt = Receipt::success(tx_id.clone(), Vec::new());
        if stored.tx.to().is_zero() {
            // Deployment: return a fresh contract address.
            receipt.ret = vec![0xC0; 20];
        }
        receipt.block = Some(BlockInclusion {
            height: stored.height,
            hash: block_hash(stored.height),
        });
        Ok(receipt)
    }

    fn get_pending_nonce(&self, account: &Address) -> Result<u64, RpcError> {
        Ok(self.next_nonce(account))
    }

    fn get_transaction(&self, tx_id: &TransactionId) -> Result<TransactionRecord, RpcError> {
        let txs = self.txs.lock();
        let stored = txs
            .get(tx_id)
            .ok_or_else(|| RpcError::not_found("unknown transaction"))?;
        Ok(TransactionRecord {
            tx: stored.tx.clone(),
            meta: TransactionMeta {
                block_height: stored.height,
                block_hash: block_hash(stored.height),
                index: 0,
            },
        })
    }

    fn get_multi_signs(
        &self,
        _kind: MultiSignKind,
        content: &str,
    ) -> Result<BTreeMap<String, Vec<u8>>, RpcError> {
        Ok(BTreeMap::from([("node1".to_string(), domain_hash(content.as_bytes()).to_vec())]))
    }

    fn get_block(&self, query: &BlockQuery) -> Result<Block, RpcError> {
        let height = match query {
            BlockQuery::Height(height) => *height,
            BlockQuery::Hash(hash) => {
                let digits = hash
                    .strip_prefix("0x")
                    .ok_or_else(|| RpcError::invalid_argument("hash needs a 0x prefix"))?;
                u64::from_str_radix(digits, 16)
                    .map_err(|_| RpcError::invalid_argument("not a block hash"))?
            }
        };
        self.block_at(height)
            .ok_or_else(|| RpcError::not_found(format!("no block at {query}")))
    }

    fn get_blocks(&self, offset: u64, length: u64) -> Result<Vec<Block>, RpcError> {
        Ok((offset..offset.saturating_add(length))
            .filter_map(|height| self.block_at(height))
            .collect())
    }

    fn get_chain_meta(&self) -> Result<ChainMeta, RpcError> {
        let height = *self.height.lock();
        Ok(ChainMeta {
            height,
            block_hash: block_hash(height),
            interchain_tx_count: 0,
        })
    }

    fn get_chain_status(&self) -> Result<ChainStatus, RpcError> {
        Ok(ChainStatus::Normal)
    }

    fn get_network_meta(&self) -> Result<Vec<u8>, RpcError> {
        Ok(br#"{"n":1,"nodes":["node1"]}"#.to_vec())
    }

    fn get_validators(&self) -> Result<Vec<u8>, RpcError> {
        Err(RpcError::failed_precondition("validator set not exposed"))
    }

    fn get_account_balance(&self, account: &Address) -> Result<u64, RpcError> {
        let txs = self.txs.lock();
        let received: u64 = txs
            .values()
            .filter(|stored| stored.tx.to() == account)
            .map(|stored| stored.tx.amount())
            .sum();
        let sent: u64 = txs
            .values()
            .filter(|stored| stored.tx.from() == account)
            .map(|stored| stored.tx.amount())
            .sum();
        Ok((GENESIS_BALANCE + received).saturating_sub(sent))
    }
}

fn client(ledger: Arc<StubLedger>, identity: SigningIdentity) -> LedgerClient<Arc<StubLedger>> {
    let poller = ReceiptPoller::new(RetryPolicy::default()).with_clock(InstantClock::new());
    let client = LedgerClient::new(ledger, ClientConfig::default())
        .unwrap()
        .with_poller(poller);
    client.set_identity(identity);
    client
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn s256_transaction_id_is_canonical_encoding_with_nonce() {
    let ledger = Arc::new(StubLedger::new(0));
    let identity = SigningIdentity::generate(Curve::S256);
    let address = identity.address();

    let tx = TransactionBuilder::new()
        .from(address)
        .to(Address::new([0xBB; 20]))
        .payload(b"hello ledger".to_vec())
        .timestamp(1_700_000_000_000_000_000)
        .build();

    let client = client(ledger.clone(), identity);
    let id = client
        .send_transaction(tx.clone(), &TransactOpts::default())
        .unwrap();

    let mut with_nonce = tx;
    with_nonce.nonce = 1;
    assert_eq!(id.as_bytes(), canonicalize(&with_nonce).unwrap().as_slice());

    let record = client.get_transaction(&id).unwrap();
    assert_eq!(*record.tx.from(), address);
    assert_eq!(record.tx.nonce(), 1);
}

#[test]
fn both_curves_pass_ledger_validation() {
    for curve in [Curve::S256, Curve::P256] {
        let ledger = Arc::new(StubLedger::new(2));
        let identity = SigningIdentity::generate(curve);
        let sender = identity.address();
        let client = client(ledger, identity);

        let tx = TransactionBuilder::new()
            .from(sender)
            .to(Address::new([3; 20]))
            .build();
        let receipt = client
            .send_transaction_with_receipt(tx, &TransactOpts::default())
            .unwrap();
        assert!(receipt.is_success(), "{curve} receipt");
        assert_eq!(receipt.block.unwrap().height, 1);
    }
}

#[test]
fn nonces_advance_across_transactions() {
    let ledger = Arc::new(StubLedger::new(1));
    let identity = SigningIdentity::generate(Curve::S256);
    let client = client(ledger.clone(), identity);

    for expected in 1..=3u64 {
        client.transfer(Address::new([9; 20]), 10).unwrap();
        assert_eq!(
            client.pending_nonce(&client.identity().unwrap().address()).unwrap(),
            expected + 1
        );
    }
}

#[test]
fn explicit_wrong_nonce_is_rejected_remotely() {
    let ledger = Arc::new(StubLedger::new(0));
    let identity = SigningIdentity::generate(Curve::S256);
    let sender = identity.address();
    let client = client(ledger, identity);

    let tx = TransactionBuilder::new()
        .from(sender)
        .to(Address::new([1; 20]))
        .build();
    let err = client
        .send_transaction(tx, &TransactOpts::default().with_normal_nonce(5))
        .unwrap_err();
    assert!(matches!(err, ClientError::Rpc(ref e) if !e.is_transient()));
}

#[test]
fn wrong_sender_is_rejected_remotely() {
    // Signing for an address the identity does not own.
    let ledger = Arc::new(StubLedger::new(0));
    let client = client(ledger, SigningIdentity::generate(Curve::S256));
    let tx = TransactionBuilder::new()
        .from(Address::new([0xAA; 20]))
        .to(Address::new([1; 20]))
        .build();
    assert!(client.send_transaction(tx, &TransactOpts::default()).is_err());
}

#[test]
fn slow_finality_exhausts_retry_budget() {
    let ledger = Arc::new(StubLedger::new(10));
    let identity = SigningIdentity::generate(Curve::P256);
    let client = client(ledger, identity);

    let err = client.transfer(Address::new([2; 20]), 1).unwrap_err();
    match &err {
        ClientError::ReceiptPending { attempts, .. } => assert_eq!(*attempts, 5),
        other => panic!("expected ReceiptPending, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[test]
fn duplicate_submission_is_not_retried() {
    let ledger = Arc::new(StubLedger::new(0));
    let identity = SigningIdentity::generate(Curve::S256);
    let tx = TransactionBuilder::new()
        .from(identity.address())
        .to(Address::new([4; 20]))
        .nonce(1)
        .build();
    let signed = sign_transaction(&tx, &identity).unwrap();

    submit(ledger.as_ref(), &signed).unwrap();
    let err = submit(ledger.as_ref(), &signed).unwrap_err();
    assert!(matches!(err, ClientError::Rpc(ref e) if e.code == RpcCode::AlreadyExists));
}

#[test]
fn deploy_then_invoke() {
    let ledger = Arc::new(StubLedger::new(1));
    let client = client(ledger.clone(), SigningIdentity::generate(Curve::S256));

    let contract = client.deploy_contract(b"\0asm\x01\0\0\0".to_vec()).unwrap();
    assert_eq!(contract, Address::new([0xC0; 20]));

    let receipt = client
        .invoke_xvm_contract(&contract, "increment", vec![Arg::u64(1)])
        .unwrap();
    assert!(receipt.is_success());

    let receipt = client
        .invoke_bvm_contract(&system::STORE, "Set", vec![Arg::string("k"), Arg::string("v")])
        .unwrap();
    let record = client.get_transaction(&receipt.tx_id).unwrap();
    let data = TransactionData::decode(record.tx.payload()).unwrap();
    assert_eq!(data.invoke_payload().unwrap().method, "Set");
}

#[test]
fn view_and_multisign_round_trip() {
    let ledger = Arc::new(StubLedger::new(0));
    let identity = SigningIdentity::generate(Curve::S256);
    let sender = identity.address();
    let client = client(ledger, identity);

    let view = client
        .send_view(
            TransactionBuilder::new()
                .from(sender)
                .to(system::GOVERNANCE)
                .build(),
        )
        .unwrap();
    assert_eq!(view.ret, b"view");

    let sigs = client.get_multi_signs(MultiSignKind::BlockHeader, "7").unwrap();
    assert_eq!(sigs.len(), 1);
}

#[test]
fn concurrent_clients_share_one_ledger() {
    let ledger = Arc::new(StubLedger::new(1));
    std::thread::scope(|scope| {
        for curve in [Curve::S256, Curve::P256, Curve::S256, Curve::P256] {
            let ledger = ledger.clone();
            scope.spawn(move || {
                let client = client(ledger, SigningIdentity::generate(curve));
                for _ in 0..3 {
                    assert!(client.transfer(Address::new([5; 20]), 1).unwrap().is_success());
                }
            });
        }
    });
    assert_eq!(ledger.txs.lock().len(), 12);
}

#[test]
fn chain_queries_follow_committed_transactions() {
    let ledger = Arc::new(StubLedger::new(0));
    let identity = SigningIdentity::generate(Curve::P256);
    let sender = identity.address();
    let recipient = Address::new([0x77; 20]);
    let client = client(ledger, identity);

    assert_eq!(client.get_chain_meta().unwrap().height, 0);
    assert_eq!(client.get_account_balance(&sender).unwrap(), GENESIS_BALANCE);

    client.transfer(recipient, 300).unwrap();
    client.transfer(recipient, 200).unwrap();

    let meta = client.get_chain_meta().unwrap();
    assert_eq!(meta.height, 2);
    assert_eq!(meta.block_hash, block_hash(2));
    assert_eq!(client.get_chain_status().unwrap(), ChainStatus::Normal);

    let by_height = client.get_block(&BlockQuery::Height(2)).unwrap();
    let by_hash = client.get_block(&BlockQuery::Hash(meta.block_hash)).unwrap();
    assert_eq!(by_height, by_hash);
    assert_eq!(by_height.header.parent_hash, block_hash(1));
    assert_eq!(*by_height.transactions[0].from(), sender);

    let blocks = client.get_blocks(1, 10).unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].transactions[0].amount(), 300);

    assert_eq!(client.get_account_balance(&sender).unwrap(), GENESIS_BALANCE - 500);
    assert_eq!(client.get_account_balance(&recipient).unwrap(), GENESIS_BALANCE + 500);
    assert!(client.get_network_meta().unwrap().starts_with(b"{"));
}

#[test]
fn chain_query_errors_reach_the_caller_unchanged() {
    let ledger = Arc::new(StubLedger::new(0));
    let client = client(ledger, SigningIdentity::generate(Curve::S256));

    assert_eq!(
        client.get_block(&BlockQuery::Height(99)).unwrap_err(),
        ClientError::Rpc(RpcError::not_found("no block at height 99"))
    );
    let err = client.get_validators().unwrap_err();
    assert!(matches!(
        err,
        ClientError::Rpc(RpcError {
            code: RpcCode::FailedPrecondition,
            ..
        })
    ));
    assert!(!err.is_retryable());
}
