//! # Client Configuration & Constants
//!
//! Every magic number the client relies on lives here, next to the
//! [`ClientConfig`] a caller hands to [`crate::client::LedgerClient`].
//!
//! The wire constants (curve tag, signature lengths, canonical format
//! version) are shared with the ledger. Changing any of them produces
//! transactions the ledger will reject, so they are not configurable.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::logging::LogFormat;
use crate::network::receipt::RetryPolicy;

// ---------------------------------------------------------------------------
// Wire Constants
// ---------------------------------------------------------------------------

/// Account addresses are 20 bytes: the tail of a Keccak-256 digest.
pub const ADDRESS_LENGTH: usize = 20;

/// Both SHA-256 and Keccak-256 produce 32-byte digests.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Secret scalar length for both supported curves.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Leading byte of every curve-S256 (secp256k1) signature on the wire.
pub const CURVE_TAG_S256: u8 = 3;

/// `tag || r || s || recovery_id`.
pub const S256_SIGNATURE_LENGTH: usize = 1 + 32 + 32 + 1;

/// SEC1 uncompressed public key: `0x04 || X || Y`.
pub const P256_PUBLIC_KEY_LENGTH: usize = 65;

/// `r || s || public_key`.
pub const P256_SIGNATURE_LENGTH: usize = 32 + 32 + P256_PUBLIC_KEY_LENGTH;

/// Version byte at the head of every canonical transaction encoding.
pub const CANONICAL_FORMAT_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default ledger node host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default ledger node gRPC port.
pub const DEFAULT_PORT: u16 = 60011;

/// Per-call deadline a transport should apply to each remote call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(20);

/// Receipt polling attempts before giving up. A block usually lands well
/// within this budget; if it doesn't, the caller gets a "still pending"
/// error rather than a hang.
pub const RECEIPT_MAX_ATTEMPTS: u32 = 5;

/// Fixed delay between receipt polling attempts.
pub const RECEIPT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Upper bounds accepted by [`ClientConfig::check`]. Anything longer is
/// a unit mistake, and far enough out it no longer fits an `Instant`.
pub const MAX_RPC_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const MAX_RECEIPT_RETRY_DELAY: Duration = Duration::from_secs(60);
pub const MAX_RECEIPT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "hubline_client=info";

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Logging section of [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Settings for a [`crate::client::LedgerClient`] and the transport behind it.
///
/// Durations are (de)serialized as integer milliseconds so config files stay
/// readable:
///
/// ```json
/// {
///   "host": "10.0.0.7",
///   "port": 60011,
///   "rpc_timeout_ms": 20000,
///   "receipt_retry": { "max_attempts": 5, "delay_ms": 500 },
///   "receipt_timeout_ms": 10000,
///   "logging": { "level": "hubline_client=debug", "format": "json" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Ledger node host name or IP.
    pub host: String,
    /// Ledger node port.
    pub port: u16,
    /// Per-call deadline for transports. Distinct from `receipt_timeout`,
    /// which bounds the whole polling loop.
    #[serde(rename = "rpc_timeout_ms", with = "serde_millis")]
    pub rpc_timeout: Duration,
    /// Receipt polling policy.
    pub receipt_retry: RetryPolicy,
    /// Overall ceiling for one receipt wait. `None` means the retry budget
    /// alone bounds the wait.
    #[serde(rename = "receipt_timeout_ms", with = "serde_millis_opt")]
    pub receipt_timeout: Option<Duration>,
    /// Logging bootstrap settings.
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            receipt_retry: RetryPolicy::default(),
            receipt_timeout: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ClientError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ClientError::InvalidConfig {
            reason: format!("failed to parse config: {e}"),
        })?;
        config.check()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ClientError::InvalidConfig {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_json_str(&raw)
    }

    /// Validates the configuration.
    pub fn check(&self) -> Result<(), ClientError> {
        if self.host.trim().is_empty() {
            return Err(ClientError::InvalidConfig {
                reason: "host is empty".to_string(),
            });
        }
        if self.port == 0 {
            return Err(ClientError::InvalidConfig {
                reason: "port must be non-zero".to_string(),
            });
        }
        if self.rpc_timeout.is_zero() {
            return Err(ClientError::InvalidConfig {
                reason: "rpc timeout must be non-zero".to_string(),
            });
        }
        if self.rpc_timeout > MAX_RPC_TIMEOUT {
            return Err(ClientError::InvalidConfig {
                reason: format!("rpc timeout exceeds {MAX_RPC_TIMEOUT:?}"),
            });
        }
        if self.receipt_retry.max_attempts == 0 {
            return Err(ClientError::InvalidConfig {
                reason: "receipt retry needs at least one attempt".to_string(),
            });
        }
        if self.receipt_retry.delay > MAX_RECEIPT_RETRY_DELAY {
            return Err(ClientError::InvalidConfig {
                reason: format!("receipt retry delay exceeds {MAX_RECEIPT_RETRY_DELAY:?}"),
            });
        }
        if matches!(self.receipt_timeout, Some(t) if t > MAX_RECEIPT_TIMEOUT) {
            return Err(ClientError::InvalidConfig {
                reason: format!("receipt timeout exceeds {MAX_RECEIPT_TIMEOUT:?}"),
            });
        }
        Ok(())
    }

    /// `host:port`, the address a transport dials.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// `Duration` as integer milliseconds.
pub(crate) mod serde_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// `Option<Duration>` as optional integer milliseconds.
pub(crate) mod serde_millis_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
