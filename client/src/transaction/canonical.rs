//! Canonical byte encoding of an unsigned transaction.
//!
//! The ledger recomputes these exact bytes to check a signature and to name
//! the transaction, so the layout is fixed and versioned:
//!
//! ```text
//! u8        format version (0x01)
//! [20]      from
//! [20]      to
//! i64 LE    timestamp
//! u32 LE    payload length, payload
//! u64 LE    nonce
//! u64 LE    amount
//! u32 LE    typ
//! u8        packet flag (0 = absent, 1 = present)
//!   u32 LE  packet.from length, packet.from (UTF-8)
//!   u32 LE  packet.to length, packet.to (UTF-8)
//!   u64 LE  packet.index
//!   u8      packet.kind
//!   u32 LE  packet.payload length, packet.payload
//! ```
//!
//! Identifier and signature are never part of it. The nonce is, so a
//! transaction must be canonicalized after its nonce is assigned.

use crate::config::{ADDRESS_LENGTH, CANONICAL_FORMAT_VERSION};
use crate::error::ClientError;

use super::types::UnsignedTransaction;

/// Fixed-size part of the encoding, everything but the variable-length
/// fields.
const FIXED_LEN: usize = 1 + 2 * ADDRESS_LENGTH + 8 + 4 + 8 + 8 + 4 + 1;

/// Appends `bytes` with a u32 little-endian length prefix.
fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8], field: &str) -> Result<(), ClientError> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| ClientError::malformed(format!("{field} exceeds {} bytes", u32::MAX)))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Encode `tx` in canonical form.
///
/// Pure and deterministic. Fails only when the sender or recipient is
/// missing (or a variable-length field does not fit its length prefix).
pub fn canonicalize(tx: &UnsignedTransaction) -> Result<Vec<u8>, ClientError> {
    let from = tx
        .from
        .ok_or_else(|| ClientError::malformed("missing sender"))?;
    let to = tx
        .to
        .ok_or_else(|| ClientError::malformed("missing recipient"))?;

    let mut buf = Vec::with_capacity(FIXED_LEN + tx.payload.len());
    buf.push(CANONICAL_FORMAT_VERSION);
    buf.extend_from_slice(from.as_bytes());
    buf.extend_from_slice(to.as_bytes());
    buf.extend_from_slice(&tx.timestamp.to_le_bytes());
    put_bytes(&mut buf, &tx.payload, "payload")?;
    buf.extend_from_slice(&tx.nonce.to_le_bytes());
    buf.extend_from_slice(&tx.amount.to_le_bytes());
    buf.extend_from_slice(&tx.typ.to_le_bytes());

    match &tx.packet {
        None => buf.push(0),
        Some(packet) => {
            buf.push(1);
            put_bytes(&mut buf, packet.from.as_bytes(), "packet source")?;
            put_bytes(&mut buf, packet.to.as_bytes(), "packet destination")?;
            buf.extend_from_slice(&packet.index.to_le_bytes());
            buf.push(packet.kind.tag());
            put_bytes(&mut buf, &packet.payload, "packet payload")?;
        }
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::types::{Address, InterchainPacket, PacketKind};

    fn base() -> UnsignedTransaction {
        UnsignedTransaction {
            from: Some(Address::new([1; 20])),
            to: Some(Address::new([2; 20])),
            timestamp: 1_700_000_000_000_000_000,
            payload: b"hello".to_vec(),
            nonce: 5,
            amount: 0,
            typ: 0,
            packet: None,
        }
    }

    fn packet() -> InterchainPacket {
        InterchainPacket {
            from: "appchain-a".into(),
            to: "appchain-b".into(),
            index: 1,
            kind: PacketKind::Interchain,
            payload: vec![9, 9],
        }
    }

    #[test]
    fn layout_of_minimal_transaction() {
        let tx = UnsignedTransaction {
            payload: Vec::new(),
            ..base()
        };
        let bytes = canonicalize(&tx).unwrap();
        assert_eq!(bytes.len(), FIXED_LEN);
        assert_eq!(bytes[0], CANONICAL_FORMAT_VERSION);
        assert_eq!(&bytes[1..21], &[1; 20]);
        assert_eq!(&bytes[21..41], &[2; 20]);
        assert_eq!(
            &bytes[41..49],
            &1_700_000_000_000_000_000i64.to_le_bytes()
        );
        assert_eq!(&bytes[49..53], &0u32.to_le_bytes());
        assert_eq!(&bytes[53..61], &5u64.to_le_bytes());
        assert_eq!(*bytes.last().unwrap(), 0);
    }

    #[test]
    fn identical_inputs_give_identical_bytes() {
        let a = base();
        let b = UnsignedTransaction {
            payload: "hello".as_bytes().to_vec(),
            ..base()
        };
        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn every_field_changes_the_encoding() {
        let reference = canonicalize(&base()).unwrap();
        let variants = [
            UnsignedTransaction {
                from: Some(Address::new([3; 20])),
                ..base()
            },
            UnsignedTransaction {
                to: Some(Address::new([3; 20])),
                ..base()
            },
            UnsignedTransaction {
                timestamp: 1,
                ..base()
            },
            UnsignedTransaction {
                payload: b"hellp".to_vec(),
                ..base()
            },
            UnsignedTransaction {
                nonce: 6,
                ..base()
            },
            UnsignedTransaction {
                amount: 1,
                ..base()
            },
            UnsignedTransaction { typ: 1, ..base() },
        ];
        for variant in variants {
            assert_ne!(canonicalize(&variant).unwrap(), reference, "{variant:?}");
        }
    }

    #[test]
    fn packet_presence_changes_the_encoding() {
        let without = canonicalize(&base()).unwrap();
        let with = canonicalize(&UnsignedTransaction {
            packet: Some(packet()),
            ..base()
        })
        .unwrap();
        assert_ne!(with, without);
        assert_eq!(with[without.len() - 1], 1);
    }

    #[test]
    fn packet_fields_change_the_encoding() {
        let reference = canonicalize(&UnsignedTransaction {
            packet: Some(packet()),
            ..base()
        })
        .unwrap();
        let rollback = canonicalize(&UnsignedTransaction {
            packet: Some(InterchainPacket {
                kind: PacketKind::Rollback,
                ..packet()
            }),
            ..base()
        })
        .unwrap();
        let next = canonicalize(&UnsignedTransaction {
            packet: Some(InterchainPacket {
                index: 2,
                ..packet()
            }),
            ..base()
        })
        .unwrap();
        assert_ne!(reference, rollback);
        assert_ne!(reference, next);
    }

    #[test]
    fn length_prefix_prevents_field_bleed() {
        // Moving a byte from the source chain id to the destination must not
        // produce the same bytes.
        let a = InterchainPacket {
            from: "ab".into(),
            to: "c".into(),
            ..packet()
        };
        let b = InterchainPacket {
            from: "a".into(),
            to: "bc".into(),
            ..packet()
        };
        let enc = |p| {
            canonicalize(&UnsignedTransaction {
                packet: Some(p),
                ..base()
            })
            .unwrap()
        };
        assert_ne!(enc(a), enc(b));
    }

    #[test]
    fn missing_sender_or_recipient_is_malformed() {
        let no_from = UnsignedTransaction {
            from: None,
            ..base()
        };
        let no_to = UnsignedTransaction { to: None, ..base() };
        assert!(matches!(
            canonicalize(&no_from),
            Err(ClientError::MalformedTransaction { .. })
        ));
        assert!(matches!(
            canonicalize(&no_to),
            Err(ClientError::MalformedTransaction { .. })
        ));
    }
}
