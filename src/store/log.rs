use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::{PlexusError, Result};
use crate::store::KvStore;

const FRAME_HEADER_SIZE: usize = 12;
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Append-only single-file key-value store.
///
/// Every `put` appends one crc32-framed record; the latest record for a
/// key wins. Opening replays the whole file to rebuild the in-memory
/// index, so reads never touch the file afterwards. There is no
/// compaction; this store exists to make the append-only contract of the
/// posting index concrete, not to be a storage engine.
#[derive(Debug)]
pub struct LogStore {
    map: DashMap<Vec<u8>, Vec<u8>>,
    writer: Mutex<File>,
}

impl LogStore {
    /// Opens or creates the log at `path`, replaying existing records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path.as_ref())?;

        let map = DashMap::new();
        replay(&mut file, &map)?;

        Ok(Self {
            map,
            writer: Mutex::new(file),
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn replay(file: &mut File, map: &DashMap<Vec<u8>, Vec<u8>>) -> Result<()> {
    let mut reader = BufReader::new(file);
    let mut header = [0u8; FRAME_HEADER_SIZE];

    loop {
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let expected_crc = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let key_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        let val_len = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;
        if key_len + val_len > MAX_FRAME_SIZE {
            return Err(PlexusError::Corruption(format!(
                "log frame of {} bytes exceeds maximum {MAX_FRAME_SIZE}",
                key_len + val_len
            )));
        }

        let mut payload = vec![0u8; key_len + val_len];
        reader
            .read_exact(&mut payload)
            .map_err(|_| PlexusError::Corruption("log frame truncated".into()))?;

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&header[4..12]);
        hasher.update(&payload);
        if hasher.finalize() != expected_crc {
            return Err(PlexusError::Corruption(
                "log frame checksum mismatch".into(),
            ));
        }

        let value = payload.split_off(key_len);
        map.insert(payload, value);
    }
}

fn encode_frame(key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
    if key.len() + value.len() > MAX_FRAME_SIZE {
        return Err(PlexusError::InvalidArgument(format!(
            "record exceeds maximum frame size of {MAX_FRAME_SIZE} bytes"
        )));
    }

    let key_len = (key.len() as u32).to_le_bytes();
    let val_len = (value.len() as u32).to_le_bytes();

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&key_len);
    hasher.update(&val_len);
    hasher.update(key);
    hasher.update(value);
    let crc = hasher.finalize();

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + key.len() + value.len());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&key_len);
    frame.extend_from_slice(&val_len);
    frame.extend_from_slice(key);
    frame.extend_from_slice(value);
    Ok(frame)
}

impl KvStore for LogStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let frame = encode_frame(key, value)?;
        {
            let mut writer = self.writer.lock();
            writer.write_all(&frame)?;
        }
        self.map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = self
            .map
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(pairs)
    }
}
