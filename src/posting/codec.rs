//! Binary layout of stored posting lists and the key space they live in.
//!
//! A posting list is encoded as `[count u32][posting...]`, each posting
//! as `[tag u8][ts u64][payload]` with little-endian integers. Torn or
//! unknown bytes decode to [`PlexusError::Corruption`]; frame checksums
//! are the backing store's concern.

use crate::error::{PlexusError, Result};
use crate::model::{Posting, PostingValue, Uid, Value};

const TAG_EDGE: u8 = 0x01;
const TAG_BOOL: u8 = 0x02;
const TAG_INT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STRING: u8 = 0x05;

/// Key-space tag for posting-list records.
const KEY_POSTING: u8 = 0x01;
/// Key-space tag for xid-to-uid mappings.
const KEY_XID: u8 = 0x02;
/// Key-space tag for index metadata.
const KEY_META: u8 = 0x00;

/// Storage key of the posting list for `(uid, attr)`.
///
/// The uid is big-endian so that all attributes of one entity are
/// adjacent under a `scan_prefix` of the uid.
pub fn posting_key(uid: Uid, attr: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8 + attr.len());
    key.push(KEY_POSTING);
    key.extend_from_slice(&uid.to_be_bytes());
    key.extend_from_slice(attr.as_bytes());
    key
}

/// Storage key of the uid assigned to an external identifier.
pub fn xid_key(xid: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + xid.len());
    key.push(KEY_XID);
    key.extend_from_slice(xid.as_bytes());
    key
}

/// Storage key holding the uid allocator state.
pub fn next_uid_key() -> Vec<u8> {
    let mut key = vec![KEY_META];
    key.extend_from_slice(b"next_uid");
    key
}

/// Storage key holding the logical clock state.
pub fn next_ts_key() -> Vec<u8> {
    let mut key = vec![KEY_META];
    key.extend_from_slice(b"next_ts");
    key
}

pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

pub fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| PlexusError::Corruption("u64 record has wrong length".into()))?;
    Ok(u64::from_le_bytes(raw))
}

pub fn encode_postings(postings: &[Posting]) -> Result<Vec<u8>> {
    let count = u32::try_from(postings.len())
        .map_err(|_| PlexusError::InvalidArgument("posting list length exceeds u32".into()))?;

    let mut buf = Vec::with_capacity(4 + postings.len() * 16);
    buf.extend_from_slice(&count.to_le_bytes());
    for posting in postings {
        match &posting.value {
            PostingValue::Edge(target) => {
                buf.push(TAG_EDGE);
                buf.extend_from_slice(&posting.ts.to_le_bytes());
                buf.extend_from_slice(&target.to_le_bytes());
            }
            PostingValue::Scalar(Value::Bool(b)) => {
                buf.push(TAG_BOOL);
                buf.extend_from_slice(&posting.ts.to_le_bytes());
                buf.push(u8::from(*b));
            }
            PostingValue::Scalar(Value::Int(i)) => {
                buf.push(TAG_INT);
                buf.extend_from_slice(&posting.ts.to_le_bytes());
                buf.extend_from_slice(&i.to_le_bytes());
            }
            PostingValue::Scalar(Value::Float(f)) => {
                buf.push(TAG_FLOAT);
                buf.extend_from_slice(&posting.ts.to_le_bytes());
                buf.extend_from_slice(&f.to_bits().to_le_bytes());
            }
            PostingValue::Scalar(Value::String(s)) => {
                let len = u32::try_from(s.len()).map_err(|_| {
                    PlexusError::InvalidArgument("string posting exceeds u32 length".into())
                })?;
                buf.push(TAG_STRING);
                buf.extend_from_slice(&posting.ts.to_le_bytes());
                buf.extend_from_slice(&len.to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }
    Ok(buf)
}

pub fn decode_postings(bytes: &[u8]) -> Result<Vec<Posting>> {
    let mut cursor = Cursor::new(bytes);
    let count = cursor.read_u32()? as usize;
    let mut postings = Vec::with_capacity(count.min(1024));

    for _ in 0..count {
        let tag = cursor.read_u8()?;
        let ts = cursor.read_u64()?;
        let value = match tag {
            TAG_EDGE => PostingValue::Edge(cursor.read_u64()?),
            TAG_BOOL => PostingValue::Scalar(Value::Bool(match cursor.read_u8()? {
                0 => false,
                1 => true,
                other => {
                    return Err(PlexusError::Corruption(format!(
                        "invalid bool posting byte: 0x{other:02X}"
                    )))
                }
            })),
            TAG_INT => PostingValue::Scalar(Value::Int(cursor.read_u64()? as i64)),
            TAG_FLOAT => PostingValue::Scalar(Value::Float(f64::from_bits(cursor.read_u64()?))),
            TAG_STRING => {
                let len = cursor.read_u32()? as usize;
                let raw = cursor.read_bytes(len)?;
                let s = std::str::from_utf8(raw).map_err(|_| {
                    PlexusError::Corruption("string posting is not valid UTF-8".into())
                })?;
                PostingValue::Scalar(Value::String(s.to_owned()))
            }
            other => {
                return Err(PlexusError::Corruption(format!(
                    "unknown posting tag: 0x{other:02X}"
                )))
            }
        };
        postings.push(Posting { value, ts });
    }

    if !cursor.is_exhausted() {
        return Err(PlexusError::Corruption(
            "trailing bytes after posting list".into(),
        ));
    }
    Ok(postings)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| PlexusError::Corruption("posting list truncated".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let raw = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let raw = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
        ]))
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
