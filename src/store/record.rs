//! Log record format
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE) total length, including this field and the checksum
//! +------------------+
//! | Kind             | (u8: 1 = put, 2 = delete)
//! +------------------+
//! | Sequence         | (u64 LE) insertion sequence of the affected record
//! +------------------+
//! | Key              | (length-prefixed UTF-8 record id)
//! +------------------+
//! | Body             | (length-prefixed JSON StudentRecord, empty for delete)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Read};

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{StoreError, StoreResult};
use crate::model::StudentRecord;

/// len + kind + seq + key len + body len + checksum
pub const MIN_RECORD_SIZE: usize = 4 + 1 + 8 + 4 + 4 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Put = 1,
    Delete = 2,
}

impl LogKind {
    fn from_byte(b: u8) -> io::Result<Self> {
        match b {
            1 => Ok(LogKind::Put),
            2 => Ok(LogKind::Delete),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown record kind: {}", other),
            )),
        }
    }
}

/// One entry of the append-only student log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub kind: LogKind,
    pub seq: u64,
    pub key: String,
    pub body: Vec<u8>,
}

impl LogRecord {
    /// Full-document write of a live record
    pub fn put(seq: u64, record: &StudentRecord) -> StoreResult<Self> {
        let body = serde_json::to_vec(record).map_err(|e| {
            StoreError::Unavailable(format!("failed to encode record {}: {}", record.id, e))
        })?;
        Ok(Self {
            kind: LogKind::Put,
            seq,
            key: record.id.clone(),
            body,
        })
    }

    /// Removal of a record
    pub fn delete(seq: u64, id: &str) -> Self {
        Self {
            kind: LogKind::Delete,
            seq,
            key: id.to_string(),
            body: Vec::new(),
        }
    }

    /// Decode the JSON body of a put record
    pub fn decode(&self) -> Result<StudentRecord, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 8 + 8 + self.key.len() + self.body.len());

        buf.push(self.kind as u8);
        buf.extend_from_slice(&self.seq.to_le_bytes());

        buf.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.key.as_bytes());

        buf.extend_from_slice(&(self.body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.body);

        buf
    }

    /// Serialize the complete record: length, body, checksum.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);

        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        if !verify_checksum(&data[..checksum_offset], stored_checksum) {
            let computed_checksum = compute_checksum(&data[..checksum_offset]);
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        let mut kind_buf = [0u8; 1];
        cursor.read_exact(&mut kind_buf)?;
        let kind = LogKind::from_byte(kind_buf[0])?;

        let mut seq_buf = [0u8; 8];
        cursor.read_exact(&mut seq_buf)?;
        let seq = u64::from_le_bytes(seq_buf);

        let key = String::from_utf8(read_bytes(&mut cursor)?).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e))
        })?;
        let body = read_bytes(&mut cursor)?;

        Ok((
            Self {
                kind,
                seq,
                key,
                body,
            },
            record_length,
        ))
    }
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
