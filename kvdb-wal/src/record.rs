//! WAL record types and on-disk record framing.
//!
//! Each record has the following on-disk layout, mirroring the header shape used
//! elsewhere in this codebase's WAL but replacing the state-machine-specific entry
//! payload with the flat `(op, args)` pairs this database's command set needs:
//!
//! ```text
//! +----------+----------+----------+----------+----------+----------+
//! | magic    | op       | flags    | reserved | length   | crc32c   |
//! | 4 bytes  | 1 byte   | 1 byte   | 2 bytes  | 4 bytes  | 4 bytes  |
//! +----------+----------+----------+----------+----------+----------+
//! | seq_id               | payload (JSON-encoded args)               |
//! | 8 bytes              | length bytes                              |
//! +----------------------+-------------------------------------------+
//! ```
//!
//! `session_id` is not carried in the header: it is constant for every record a
//! single writer produces and is folded in by the reader from the segment's
//! filename (see `segment::parse_segment_filename`).

use crate::error::WalError;
use crate::RECORD_HEADER_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Magic bytes identifying a record header: "WLOG".
pub const WAL_MAGIC: [u8; 4] = *b"WLOG";

/// Maximum encoded payload size for a single record (16 MiB).
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

/// A command identifier, stable across the wire and the WAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandId {
    Get = 1,
    Set = 2,
    Del = 3,
}

impl CommandId {
    pub fn arity(self) -> usize {
        match self {
            CommandId::Get | CommandId::Del => 1,
            CommandId::Set => 2,
        }
    }

    pub fn is_write(self) -> bool {
        matches!(self, CommandId::Set | CommandId::Del)
    }
}

impl TryFrom<u8> for CommandId {
    type Error = WalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CommandId::Get),
            2 => Ok(CommandId::Set),
            3 => Ok(CommandId::Del),
            _ => Err(WalError::InvalidHeader {
                offset: 0,
                reason: format!("unknown command id: {value}"),
            }),
        }
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandId::Get => write!(f, "GET"),
            CommandId::Set => write!(f, "SET"),
            CommandId::Del => write!(f, "DEL"),
        }
    }
}

/// Log Sequence Number: `(session_id, seq_id)`, lexicographically ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lsn {
    pub session_id: u64,
    pub seq_id: u64,
}

impl Lsn {
    pub fn new(session_id: u64, seq_id: u64) -> Self {
        Self { session_id, seq_id }
    }
}

impl Ord for Lsn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.session_id
            .cmp(&other.session_id)
            .then(self.seq_id.cmp(&other.seq_id))
    }
}

impl PartialOrd for Lsn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An immutable, durable log record: an LSN-stamped command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub lsn: Lsn,
    pub op: CommandId,
    pub args: Vec<String>,
}

impl LogRecord {
    pub fn new(lsn: Lsn, op: CommandId, args: Vec<String>) -> Self {
        Self { lsn, op, args }
    }

    /// Encodes this record as a length-delimited, CRC-checked frame.
    pub fn encode(&self) -> Result<BytesMut, WalError> {
        let payload = serde_json::to_vec(&self.args)?;
        if payload.len() > MAX_RECORD_SIZE {
            return Err(WalError::RecordTooLarge {
                size: payload.len(),
                max: MAX_RECORD_SIZE,
            });
        }
        let crc = crc32c::crc32c(&payload);

        let mut buf = BytesMut::with_capacity(RECORD_HEADER_SIZE + payload.len());
        buf.put_slice(&WAL_MAGIC);
        buf.put_u8(self.op as u8);
        buf.put_u8(0); // flags, unused
        buf.put_u16(0); // reserved
        buf.put_u32(payload.len() as u32);
        buf.put_u32(crc);
        buf.put_u64(self.lsn.seq_id);
        buf.put_slice(&payload);
        Ok(buf)
    }

    /// Decodes one record from the front of `buf`, advancing past it on success.
    /// Returns `Ok(None)` when `buf` does not yet hold a complete frame (driven
    /// purely by remaining byte count, never a stored frame count) or when the
    /// header region is all zeroes (end-of-segment padding).
    pub fn decode(buf: &mut BytesMut, session_id: u64, offset: u64) -> Result<Option<Self>, WalError> {
        if buf.len() < RECORD_HEADER_SIZE {
            return Ok(None);
        }

        let magic: [u8; 4] = buf[0..4].try_into().unwrap();
        if magic != WAL_MAGIC {
            if magic == [0, 0, 0, 0] {
                return Ok(None);
            }
            return Err(WalError::InvalidHeader {
                offset,
                reason: format!("invalid magic: {magic:?}"),
            });
        }

        let op = CommandId::try_from(buf[4])?;
        let payload_len = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
        let crc_expected = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);
        let seq_id = u64::from_be_bytes([
            buf[16], buf[17], buf[18], buf[19], buf[20], buf[21], buf[22], buf[23],
        ]);

        if payload_len > MAX_RECORD_SIZE {
            return Err(WalError::RecordTooLarge {
                size: payload_len,
                max: MAX_RECORD_SIZE,
            });
        }

        let total_len = RECORD_HEADER_SIZE + payload_len;
        if buf.len() < total_len {
            return Ok(None);
        }

        buf.advance(RECORD_HEADER_SIZE);
        let payload: Bytes = buf.split_to(payload_len).freeze();

        let crc_actual = crc32c::crc32c(&payload);
        if crc_actual != crc_expected {
            return Err(WalError::CorruptedRecord {
                offset,
                expected: crc_expected,
                actual: crc_actual,
            });
        }

        let args: Vec<String> = serde_json::from_slice(&payload).map_err(|e| WalError::InvalidHeader {
            offset,
            reason: format!("bad payload: {e}"),
        })?;

        Ok(Some(LogRecord::new(Lsn::new(session_id, seq_id), op, args)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrip() {
        let record = LogRecord::new(
            Lsn::new(100, 7),
            CommandId::Set,
            vec!["k".into(), "v".into()],
        );
        let mut encoded = record.encode().unwrap();
        let decoded = LogRecord::decode(&mut encoded, 100, 0).unwrap().unwrap();
        assert_eq!(decoded, record);
        assert!(encoded.is_empty());
    }

    #[test]
    fn corrupted_payload_detected() {
        let record = LogRecord::new(Lsn::new(1, 1), CommandId::Del, vec!["k".into()]);
        let mut encoded = record.encode().unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        let result = LogRecord::decode(&mut encoded, 1, 0);
        assert!(matches!(result, Err(WalError::CorruptedRecord { .. })));
    }

    #[test]
    fn incomplete_header_is_none() {
        let mut buf = BytesMut::from(&b"WLOG"[..]);
        assert!(LogRecord::decode(&mut buf, 1, 0).unwrap().is_none());
    }

    #[test]
    fn eof_padding_is_none() {
        let mut buf = BytesMut::from(&[0u8; RECORD_HEADER_SIZE][..]);
        assert!(LogRecord::decode(&mut buf, 1, 0).unwrap().is_none());
    }

    #[test]
    fn invalid_magic_errors() {
        let mut buf = BytesMut::from(
            &b"BADX\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00"
                [..],
        );
        assert!(matches!(
            LogRecord::decode(&mut buf, 1, 0),
            Err(WalError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn lsn_orders_by_session_then_seq() {
        let a = Lsn::new(1, 100);
        let b = Lsn::new(2, 1);
        let c = Lsn::new(1, 50);
        assert!(a < b);
        assert!(c < a);
    }

    #[test]
    fn multiple_frames_decode_in_sequence() {
        let r1 = LogRecord::new(Lsn::new(5, 1), CommandId::Set, vec!["a".into(), "1".into()]);
        let r2 = LogRecord::new(Lsn::new(5, 2), CommandId::Del, vec!["a".into()]);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&r1.encode().unwrap());
        buf.extend_from_slice(&r2.encode().unwrap());

        let d1 = LogRecord::decode(&mut buf, 5, 0).unwrap().unwrap();
        let d2 = LogRecord::decode(&mut buf, 5, 0).unwrap().unwrap();
        assert_eq!(d1, r1);
        assert_eq!(d2, r2);
        assert!(buf.is_empty());
    }
}
