//! Append-only durable log plus ack-pointer file, per §6: "the outbound
//! buffer is stored as an append-only log keyed by `monotonic_seq`, plus a
//! small pointer file for the highest acked seq and `bd_seq`... MUST
//! survive crash-consistently (fsync on ack-pointer updates)."

use std::path::{Path, PathBuf};

use oee_domain::OutboundEnvelope;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::{self, File, OpenOptions},
    io::{AsyncReadExt, AsyncWriteExt},
};

use crate::error::BufferError;

const LOG_FILE_NAME: &str = "envelopes.log";
const POINTER_FILE_NAME: &str = "ack_pointer.json";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct AckPointer {
    highest_acked_seq: Option<u64>,
    bd_seq: u64,
    next_monotonic_seq: u64,
}

/// The crash-consistent, on-disk half of the store-and-forward buffer.
///
/// Every envelope is appended to `envelopes.log` as one JSON record per
/// line before it is handed to the in-memory [`crate::Buffer`] queue. The
/// ack pointer (`highest_acked_seq`, `bd_seq`, `next_monotonic_seq`) is
/// rewritten and `fsync`ed on every acknowledged publish, per §6.
pub struct DurableLog {
    dir: PathBuf,
    log_file: File,
    pointer: AckPointer,
}

impl DurableLog {
    /// Opens (or creates) the durable log under `dir`, restoring the ack
    /// pointer from its last fsync'd value.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, BufferError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await.map_err(|source| BufferError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let pointer_path = dir.join(POINTER_FILE_NAME);
        let pointer = match fs::read(&pointer_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => AckPointer::default(),
            Err(source) => {
                return Err(BufferError::Io {
                    path: pointer_path.display().to_string(),
                    source,
                })
            }
        };

        let log_path = dir.join(LOG_FILE_NAME);
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .await
            .map_err(|source| BufferError::Io {
                path: log_path.display().to_string(),
                source,
            })?;

        Ok(Self { dir, log_file, pointer })
    }

    /// The next unused `monotonic_seq`, persisted across restarts and
    /// never reused (§3).
    pub fn next_monotonic_seq(&mut self) -> u64 {
        let seq = self.pointer.next_monotonic_seq;
        self.pointer.next_monotonic_seq += 1;
        seq
    }

    /// Appends an envelope record to the log.
    pub async fn append(&mut self, envelope: &OutboundEnvelope) -> Result<(), BufferError> {
        let mut line = serde_json::to_vec(envelope)?;
        line.push(b'\n');
        self.log_file.write_all(&line).await.map_err(|source| BufferError::Io {
            path: self.dir.join(LOG_FILE_NAME).display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Replays every envelope currently on disk, in enqueue order, for
    /// restart recovery.
    pub async fn replay(&self) -> Result<Vec<OutboundEnvelope>, BufferError> {
        let log_path = self.dir.join(LOG_FILE_NAME);
        let mut contents = String::new();
        let mut file = File::open(&log_path).await.map_err(|source| BufferError::Io {
            path: log_path.display().to_string(),
            source,
        })?;
        file.read_to_string(&mut contents).await.map_err(|source| BufferError::Io {
            path: log_path.display().to_string(),
            source,
        })?;
        let mut envelopes = Vec::new();
        for line in contents.lines() {
            if line.is_empty() {
                continue;
            }
            envelopes.push(serde_json::from_str(line)?);
        }
        Ok(envelopes)
    }

    /// Records that `seq` (and everything before it) has been acknowledged
    /// by the broker, and fsyncs the pointer file — the crash-consistency
    /// boundary called out in §6.
    pub async fn advance_ack(&mut self, seq: u64) -> Result<(), BufferError> {
        if seq > self.pointer.highest_acked_seq.unwrap_or(0) || self.pointer.highest_acked_seq.is_none() {
            self.pointer.highest_acked_seq = Some(seq);
        }
        self.fsync_pointer().await
    }

    /// Records the `bd_seq` paired with the most recent NBIRTH, persisted
    /// alongside the ack pointer.
    pub async fn record_bd_seq(&mut self, bd_seq: u64) -> Result<(), BufferError> {
        self.pointer.bd_seq = bd_seq;
        self.fsync_pointer().await
    }

    /// The highest acknowledged `monotonic_seq` as of the last fsync, or
    /// `None` if nothing has been acknowledged yet.
    pub fn highest_acked_seq(&self) -> Option<u64> {
        self.pointer.highest_acked_seq
    }

    /// The `bd_seq` persisted alongside the ack pointer.
    pub fn bd_seq(&self) -> u64 {
        self.pointer.bd_seq
    }

    async fn fsync_pointer(&mut self) -> Result<(), BufferError> {
        let pointer_path = self.dir.join(POINTER_FILE_NAME);
        let tmp_path = self.dir.join(format!("{POINTER_FILE_NAME}.tmp"));
        let bytes = serde_json::to_vec(&self.pointer)?;
        let mut tmp = File::create(&tmp_path).await.map_err(|source| BufferError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        tmp.write_all(&bytes).await.map_err(|source| BufferError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        tmp.sync_all().await.map_err(|source| BufferError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        fs::rename(&tmp_path, &pointer_path).await.map_err(|source| BufferError::Io {
            path: pointer_path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_log_starts_monotonic_seq_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = DurableLog::open(dir.path()).await.unwrap();
        assert_eq!(log.next_monotonic_seq(), 0);
        assert_eq!(log.next_monotonic_seq(), 1);
    }

    #[tokio::test]
    async fn ack_pointer_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut log = DurableLog::open(dir.path()).await.unwrap();
            let _ = log.next_monotonic_seq();
            log.advance_ack(5).await.unwrap();
            log.record_bd_seq(3).await.unwrap();
        }
        let reopened = DurableLog::open(dir.path()).await.unwrap();
        assert_eq!(reopened.highest_acked_seq(), Some(5));
        assert_eq!(reopened.bd_seq(), 3);
    }

    #[tokio::test]
    async fn replay_returns_envelopes_in_enqueue_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = DurableLog::open(dir.path()).await.unwrap();
        for i in 0..3u64 {
            let envelope = OutboundEnvelope::new(i, "oee/rollup", vec![i as u8], 0);
            log.append(&envelope).await.unwrap();
        }
        let replayed = log.replay().await.unwrap();
        let seqs: Vec<u64> = replayed.iter().map(|e| e.monotonic_seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }
}
