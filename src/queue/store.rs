//! The directory-backed payload queue.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::durable::{fsync_dir, write_atomically};
use super::name::{
    claimed_file_name, is_claimed_name, is_payload_name, is_temp_name, payload_file_name,
    temp_file_name,
};

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// IO error on the queue directory itself.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The queue path exists but is not a directory.
    #[error("queue path is not a directory: {}", .0.display())]
    InvalidDirectory(PathBuf),
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// A FIFO of opaque string payloads, one file per payload.
///
/// Any number of handles, in this process or others, may share a directory.
/// There are no locks: producers publish with an atomic rename and
/// consumers claim with one, so a payload is handed to at most one
/// [`dequeue_all`](Self::dequeue_all) caller.
#[derive(Debug, Clone)]
pub struct PersistentQueue {
    directory: PathBuf,
}

impl PersistentQueue {
    /// Opens the queue at `directory`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or the path is a file.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        if !directory.is_dir() {
            return Err(QueueError::InvalidDirectory(directory));
        }
        Ok(PersistentQueue { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Durably appends a payload.
    ///
    /// The payload is visible to consumers only once it is fully on disk.
    pub fn enqueue(&self, payload: &str) -> Result<PathBuf> {
        let path = write_atomically(
            &self.directory,
            &temp_file_name(),
            &payload_file_name(),
            payload.as_bytes(),
        )?;
        debug!(path = %path.display(), bytes = payload.len(), "payload enqueued");
        Ok(path)
    }

    /// Removes and returns every payload currently queued, oldest first.
    ///
    /// Runs in three phases:
    /// 1. Claim: rename each visible file to a hidden `.claimed-*` name. A
    ///    file that vanished was claimed by a concurrent caller.
    /// 2. Read every claimed file.
    /// 3. Delete the claimed files that were read.
    ///
    /// A payload is deleted only after its content is in memory. Claimed
    /// files that could not be read stay on disk for
    /// [`recover_orphaned_claims`](Self::recover_orphaned_claims).
    ///
    /// # Errors
    ///
    /// Fails only if the directory cannot be listed; per-file problems are
    /// logged and skipped.
    pub fn dequeue_all(&self) -> Result<Vec<String>> {
        let pending = self.list(is_payload_name)?;

        let mut claimed = Vec::with_capacity(pending.len());
        for path in pending {
            let claim_path = self.directory.join(claimed_file_name());
            match fs::rename(&path, &claim_path) {
                Ok(()) => claimed.push(claim_path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "payload already claimed by another consumer");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to claim queued payload, skipping");
                }
            }
        }

        let mut payloads = Vec::with_capacity(claimed.len());
        let mut consumed = Vec::with_capacity(claimed.len());
        for path in claimed {
            match fs::read_to_string(&path) {
                Ok(payload) => {
                    payloads.push(payload);
                    consumed.push(path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(path = %path.display(), "claimed payload vanished before it was read");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read claimed payload, leaving it on disk");
                }
            }
        }

        for path in &consumed {
            if let Err(e) = fs::remove_file(path)
                && e.kind() != io::ErrorKind::NotFound
            {
                warn!(path = %path.display(), error = %e, "failed to delete consumed payload");
            }
        }
        if !consumed.is_empty() {
            self.sync_directory();
        }

        debug!(count = payloads.len(), "dequeued payloads");
        Ok(payloads)
    }

    /// Returns every queued payload, oldest first, without removing any.
    pub fn peek(&self) -> Result<Vec<String>> {
        let mut payloads = Vec::new();
        for path in self.list(is_payload_name)? {
            match fs::read_to_string(&path) {
                Ok(payload) => payloads.push(payload),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read queued payload, skipping");
                }
            }
        }
        Ok(payloads)
    }

    /// Number of queued payloads. Claimed files are not counted.
    pub fn count(&self) -> Result<usize> {
        Ok(self.list(is_payload_name)?.len())
    }

    /// Deletes every queued payload and returns how many were removed.
    ///
    /// Files already claimed by a consumer are left alone.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.list(is_payload_name)? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to delete queued payload");
                }
            }
        }
        if removed > 0 {
            self.sync_directory();
        }
        info!(removed, "queue cleared");
        Ok(removed)
    }

    /// Returns claimed files left by a crashed consumer to the queue, and
    /// deletes temp files left by a producer that crashed mid-write.
    ///
    /// Each orphan gets a fresh payload name, so it is retried after the
    /// payloads already waiting. Temp files never became payloads and are
    /// not counted.
    ///
    /// **Critical**: call this only at startup, before any producer or
    /// consumer in any process sharing the directory runs. A live
    /// consumer's claimed files are indistinguishable from orphans, and
    /// recovering them would hand the same payload out twice. Likewise a
    /// live producer's temp file would be deleted under it.
    pub fn recover_orphaned_claims(&self) -> Result<usize> {
        let mut recovered = 0;
        for path in self.list(is_claimed_name)? {
            let target = self.directory.join(payload_file_name());
            match fs::rename(&path, &target) {
                Ok(()) => recovered += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to recover claimed payload");
                }
            }
        }

        let mut swept = 0;
        for path in self.list(is_temp_name)? {
            match fs::remove_file(&path) {
                Ok(()) => swept += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to delete abandoned temp file");
                }
            }
        }

        if recovered + swept > 0 {
            fsync_dir(&self.directory)?;
        }
        if recovered > 0 {
            info!(recovered, "recovered payloads claimed by an earlier run");
        }
        if swept > 0 {
            info!(swept, "deleted temp files abandoned by an earlier run");
        }
        Ok(recovered)
    }

    /// Lists regular files whose names satisfy `keep`, sorted by name.
    fn list(&self, keep: fn(&str) -> bool) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "failed to read queue directory entry, skipping");
                    continue;
                }
            };
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if keep(&name) && entry.file_type().is_ok_and(|t| t.is_file()) {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn sync_directory(&self) {
        if let Err(e) = fsync_dir(&self.directory) {
            warn!(dir = %self.directory.display(), error = %e, "failed to sync queue directory");
        }
    }
}
