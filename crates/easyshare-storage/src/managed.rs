// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Managed strategy — insert into the shared Downloads media index.
//
// Sequence for one save:
//
//   insert_pending ──► open_sink ──► copy ──► (sink dropped) ──► publish
//         │                │           │
//         └────────────────┴───────────┴──► remove  (any failure)
//
// An entry only becomes visible to other apps once `publish` clears its
// pending flag, and a failed save deletes the entry instead of leaving it
// pending.

use std::io::{Read, Write};

use easyshare_core::error::{EasyshareError, Result};
use easyshare_core::types::StoredFile;
use tracing::{debug, info, instrument, warn};

use crate::backend::StorageBackend;
use crate::copy::copy_stream;

/// The platform's catalogue of shared downloads.
///
/// Mirrors the subset of `ContentResolver` + `MediaStore.Downloads` that a
/// save needs.
pub trait MediaIndex: Send {
    /// Handle to one inserted row.
    type Entry;

    /// Register a new row with the pending flag set.
    fn insert_pending(&self, display_name: &str, mime_type: &str) -> Result<Self::Entry>;

    /// Open a writable sink for the row's content. `len` is the number of
    /// bytes about to be written. `Ok(None)` means the platform handed back
    /// no stream.
    fn open_sink<'a>(&'a self, entry: &Self::Entry, len: u64) -> Result<Option<Box<dyn Write + 'a>>>;

    /// Clear the pending flag so other apps can see the row.
    fn publish(&self, entry: &Self::Entry) -> Result<()>;

    /// Delete the row.
    fn remove(&self, entry: &Self::Entry) -> Result<()>;

    /// Opaque location string reported to the caller.
    fn location(&self, entry: &Self::Entry) -> String;
}

/// Storage backend that writes through a [`MediaIndex`].
pub struct ManagedIndexBackend<I> {
    index: I,
    mime_type: String,
    buffer_size: usize,
}

impl<I: MediaIndex> ManagedIndexBackend<I> {
    pub fn new(index: I, mime_type: impl Into<String>, buffer_size: usize) -> Self {
        Self {
            index,
            mime_type: mime_type.into(),
            buffer_size,
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Everything after the row exists. Any error here means the caller
    /// must remove the row.
    fn fill_and_publish(
        &self,
        entry: &I::Entry,
        source: &mut dyn Read,
        len: u64,
    ) -> Result<StoredFile> {
        let stats = {
            let mut sink = self.index.open_sink(entry, len)?.ok_or_else(|| {
                EasyshareError::SaveFailed("media index returned no output stream".into())
            })?;
            copy_stream(source, &mut sink, self.buffer_size)
                .map_err(|e| EasyshareError::SaveFailed(e.to_string()))?
        };

        if stats.bytes != len {
            return Err(EasyshareError::SaveFailed(format!(
                "source changed during copy: expected {len} bytes, copied {}",
                stats.bytes
            )));
        }

        self.index.publish(entry)?;

        Ok(StoredFile {
            location_id: self.index.location(entry),
            bytes_copied: stats.bytes,
            sha256: stats.sha256,
        })
    }
}

impl<I: MediaIndex> StorageBackend for ManagedIndexBackend<I> {
    fn name(&self) -> &'static str {
        "managed-index"
    }

    #[instrument(skip_all, fields(display_name = display_name, len = len))]
    fn store(&self, source: &mut dyn Read, len: u64, display_name: &str) -> Result<StoredFile> {
        let entry = self
            .index
            .insert_pending(display_name, &self.mime_type)
            .map_err(|e| EasyshareError::SaveFailed(format!("media index insert failed: {e}")))?;
        debug!(location = %self.index.location(&entry), "pending entry registered");

        match self.fill_and_publish(&entry, source, len) {
            Ok(stored) => {
                info!(location = %stored.location_id, bytes = stored.bytes_copied, "saved to Downloads index");
                Ok(stored)
            }
            Err(e) => {
                if let Err(cleanup) = self.index.remove(&entry) {
                    warn!(
                        location = %self.index.location(&entry),
                        error = %cleanup,
                        "could not remove failed entry"
                    );
                }
                Err(match e {
                    EasyshareError::SaveFailed(_) => e,
                    other => EasyshareError::SaveFailed(other.to_string()),
                })
            }
        }
    }
}
