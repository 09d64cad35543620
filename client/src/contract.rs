//! # Contract Payloads
//!
//! Helpers for building the `payload` of contract transactions. A contract
//! call is a [`TransactionData`] envelope (which VM, what kind of call)
//! wrapping an [`InvokePayload`] (method name and typed [`Arg`]s).
//!
//! Both are bincode-encoded. The canonicalizer never looks inside a payload,
//! so this encoding is a contract between the caller and the ledger VM only.
//!
//! ```
//! use hubline_client::contract::{Arg, InvokePayload, TransactionData, VmType};
//!
//! let call = InvokePayload::new("transfer", vec![Arg::string("alice"), Arg::u64(100)]);
//! let data = TransactionData::invoke(VmType::Bvm, &call).unwrap();
//! let decoded = TransactionData::decode(&data.encode().unwrap()).unwrap();
//! assert_eq!(decoded.invoke_payload().unwrap(), call);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Type tag of a contract argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgKind {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    String,
    Bytes,
    Bool,
}

/// A typed contract argument.
///
/// Numbers and booleans travel as their text form (`"42"`, `"1.5"`,
/// `"true"`); the VM parses them back according to `kind`. Strings are
/// UTF-8 and bytes are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub kind: ArgKind,
    #[serde(default)]
    pub is_array: bool,
    pub value: Vec<u8>,
}

impl Arg {
    fn text(kind: ArgKind, value: String) -> Self {
        Self {
            kind,
            is_array: false,
            value: value.into_bytes(),
        }
    }

    pub fn i32(value: i32) -> Self {
        Self::text(ArgKind::I32, value.to_string())
    }

    pub fn i64(value: i64) -> Self {
        Self::text(ArgKind::I64, value.to_string())
    }

    pub fn u32(value: u32) -> Self {
        Self::text(ArgKind::U32, value.to_string())
    }

    pub fn u64(value: u64) -> Self {
        Self::text(ArgKind::U64, value.to_string())
    }

    /// Always has a fractional part (`1.0`, not `1`).
    pub fn f32(value: f32) -> Self {
        Self::text(ArgKind::F32, format!("{value:?}"))
    }

    /// Always has a fractional part (`1.0`, not `1`).
    pub fn f64(value: f64) -> Self {
        Self::text(ArgKind::F64, format!("{value:?}"))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::text(ArgKind::String, value.into())
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: ArgKind::Bytes,
            is_array: false,
            value: value.into(),
        }
    }

    pub fn bool(value: bool) -> Self {
        Self::text(ArgKind::Bool, value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Method call on a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokePayload {
    pub method: String,
    pub args: Vec<Arg>,
}

impl InvokePayload {
    pub fn new(method: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ClientError> {
        bincode::serialize(self).map_err(|e| ClientError::malformed(format!("invoke payload: {e}")))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ClientError> {
        bincode::deserialize(bytes).map_err(|e| ClientError::decode(format!("invoke payload: {e}")))
    }
}

/// Virtual machine that executes a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VmType {
    /// Built-in contracts compiled into the ledger.
    Bvm,
    /// WebAssembly contracts deployed by users.
    Xvm,
}

/// What a transaction's data asks the ledger to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    /// Plain value transfer.
    Normal,
    Invoke,
    Update,
    Freeze,
    Unfreeze,
}

/// Envelope placed in a transaction's payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    pub kind: DataKind,
    pub vm_type: VmType,
    pub amount: u64,
    /// Encoded [`InvokePayload`] for calls, raw module bytes for
    /// deployments, empty for transfers.
    pub payload: Vec<u8>,
}

impl TransactionData {
    /// Call `payload` on a contract running in `vm_type`.
    pub fn invoke(vm_type: VmType, payload: &InvokePayload) -> Result<Self, ClientError> {
        Ok(Self {
            kind: DataKind::Invoke,
            vm_type,
            amount: 0,
            payload: payload.encode()?,
        })
    }

    /// Deploy an XVM module.
    pub fn deploy(code: Vec<u8>) -> Self {
        Self {
            kind: DataKind::Invoke,
            vm_type: VmType::Xvm,
            amount: 0,
            payload: code,
        }
    }

    pub fn transfer(amount: u64) -> Self {
        Self {
            kind: DataKind::Normal,
            vm_type: VmType::Bvm,
            amount,
            payload: Vec::new(),
        }
    }

    /// The wrapped call, for `Invoke` data built by [`TransactionData::invoke`].
    pub fn invoke_payload(&self) -> Result<InvokePayload, ClientError> {
        InvokePayload::decode(&self.payload)
    }

    pub fn encode(&self) -> Result<Vec<u8>, ClientError> {
        bincode::serialize(self)
            .map_err(|e| ClientError::malformed(format!("transaction data: {e}")))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ClientError> {
        bincode::deserialize(bytes)
            .map_err(|e| ClientError::decode(format!("transaction data: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Built-in contracts
// ---------------------------------------------------------------------------

/// Addresses of the ledger's built-in (BVM) contracts.
pub mod system {
    use crate::transaction::types::Address;

    const fn builtin(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::new(bytes)
    }

    /// Cross-chain packet handling.
    pub const INTERCHAIN: Address = builtin(0x0a);
    /// Key/value store.
    pub const STORE: Address = builtin(0x0b);
    /// Validation rule registry.
    pub const RULE_MANAGER: Address = builtin(0x0c);
    pub const ROLE: Address = builtin(0x0d);
    /// Appchain registration.
    pub const APPCHAIN_MANAGER: Address = builtin(0x0e);
    pub const TRANSACTION_MANAGER: Address = builtin(0x0f);
    pub const ASSET_EXCHANGE: Address = builtin(0x10);
    pub const GOVERNANCE: Address = builtin(0x12);
}
