// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Legacy strategy — copy straight into the public Downloads directory.
//
// Used on platforms without a managed Downloads index. The copy goes to an
// anonymous temporary file in the same directory and is renamed into place,
// so a failed copy never leaves a truncated file under the visible name.
// The temporary name has a fixed length, so any name the directory accepts
// can be saved.

use std::fs;
use std::io::Read;
use std::path::{self, PathBuf};

use easyshare_core::error::{EasyshareError, Result};
use easyshare_core::types::StoredFile;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::backend::StorageBackend;
use crate::copy::copy_stream;

/// Writes files directly under a public Downloads directory.
pub struct DirectFilesystemBackend {
    downloads_dir: PathBuf,
    buffer_size: usize,
}

impl DirectFilesystemBackend {
    pub fn new(downloads_dir: impl Into<PathBuf>, buffer_size: usize) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
            buffer_size,
        }
    }
}

impl StorageBackend for DirectFilesystemBackend {
    fn name(&self) -> &'static str {
        "direct-filesystem"
    }

    #[instrument(skip_all, fields(display_name = display_name, len = len))]
    fn store(&self, source: &mut dyn Read, len: u64, display_name: &str) -> Result<StoredFile> {
        fs::create_dir_all(&self.downloads_dir).map_err(|e| {
            EasyshareError::SaveFailed(format!(
                "cannot create {}: {e}",
                self.downloads_dir.display()
            ))
        })?;

        let destination = self.downloads_dir.join(display_name);

        // The temporary file is removed when `staging` drops on any early return.
        let stats = NamedTempFile::new_in(&self.downloads_dir)
            .and_then(|mut staging| {
                let stats = copy_stream(source, staging.as_file_mut(), self.buffer_size)?;
                staging.as_file().sync_all()?;
                staging.persist(&destination).map_err(|e| e.error)?;
                Ok(stats)
            })
            .map_err(|e| EasyshareError::SaveFailed(e.to_string()))?;

        if stats.bytes != len {
            debug!(expected = len, copied = stats.bytes, "source changed size during copy");
        }

        let absolute = path::absolute(&destination).map_err(|e| {
            EasyshareError::SaveFailed(format!("cannot resolve {}: {e}", destination.display()))
        })?;
        info!(path = %absolute.display(), bytes = stats.bytes, "saved to public Downloads directory");

        Ok(StoredFile {
            location_id: absolute.to_string_lossy().into_owned(),
            bytes_copied: stats.bytes,
            sha256: stats.sha256,
        })
    }
}
