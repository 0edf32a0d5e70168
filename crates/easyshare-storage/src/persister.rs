// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DownloadPersister — validates a request, opens the source and hands the
// copy to whichever backend the platform supports.

use std::fs::File;
use std::io::BufReader;

use easyshare_core::error::{EasyshareError, Result};
use easyshare_core::types::{PersistReceipt, PersistRequest};
use tracing::{debug, instrument, warn};

use crate::backend::StorageBackend;

/// Copies files into shared Downloads storage through one fixed backend.
///
/// Stateless between calls: the only thing held is the backend chosen at
/// construction.
pub struct DownloadPersister {
    backend: Box<dyn StorageBackend>,
}

impl DownloadPersister {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Copy `request.source_path` into Downloads as `request.display_name`.
    ///
    /// Errors:
    /// - `InvalidArgument` for an empty or path-like display name,
    /// - `NotFound` if the source is missing (nothing is written),
    /// - `SaveFailed` for everything that goes wrong after that.
    #[instrument(skip_all, fields(source = %request.source_path.display(), display_name = %request.display_name))]
    pub fn persist(&self, request: &PersistRequest) -> Result<PersistReceipt> {
        request.validate()?;

        let metadata = match std::fs::metadata(&request.source_path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(EasyshareError::NotFound(request.source_path.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EasyshareError::NotFound(request.source_path.clone()));
            }
            Err(e) => return Err(EasyshareError::SaveFailed(e.to_string())),
        };

        let file = File::open(&request.source_path)
            .map_err(|e| EasyshareError::SaveFailed(format!("cannot open source: {e}")))?;
        let mut reader = BufReader::new(file);
        debug!(len = metadata.len(), backend = self.backend.name(), "source opened");

        let stored = self
            .backend
            .store(&mut reader, metadata.len(), &request.display_name)
            .map_err(|e| match e {
                EasyshareError::SaveFailed(_) => e,
                other => EasyshareError::SaveFailed(other.to_string()),
            })
            .inspect_err(|e| warn!(error = %e, "save to Downloads failed"))?;

        Ok(PersistReceipt::from_stored(stored, self.backend.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct::DirectFilesystemBackend;
    use crate::managed::ManagedIndexBackend;
    use crate::sqlite_index::SqliteMediaIndex;
    use std::fs;
    use std::path::Path;

    fn source_file(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn direct_round_trip_is_byte_exact() {
        let src_dir = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(20_000).collect();
        let src = source_file(src_dir.path(), "cache-123.tmp", &data);

        let persister =
            DownloadPersister::new(Box::new(DirectFilesystemBackend::new(downloads.path(), 8192)));
        let receipt = persister.persist(&PersistRequest::new(&src, "x.bin")).unwrap();

        assert_eq!(fs::read(downloads.path().join("x.bin")).unwrap(), data);
        assert_eq!(receipt.bytes_copied, 20_000);
        assert_eq!(receipt.backend, "direct-filesystem");
        // Source untouched.
        assert_eq!(fs::read(&src).unwrap(), data);
    }

    #[test]
    fn missing_source_writes_nothing() {
        let downloads = tempfile::tempdir().unwrap();
        let persister =
            DownloadPersister::new(Box::new(DirectFilesystemBackend::new(downloads.path(), 8192)));

        let err = persister
            .persist(&PersistRequest::new("/definitely/not/here.bin", "x.bin"))
            .unwrap_err();

        assert!(matches!(err, EasyshareError::NotFound(_)));
        assert_eq!(fs::read_dir(downloads.path()).unwrap().count(), 0);
    }

    #[test]
    fn directory_source_is_not_found() {
        let src_dir = tempfile::tempdir().unwrap();
        let index = SqliteMediaIndex::open_in_memory().unwrap();
        let persister = DownloadPersister::new(Box::new(ManagedIndexBackend::new(
            index,
            "application/octet-stream",
            8192,
        )));

        let err = persister
            .persist(&PersistRequest::new(src_dir.path(), "x.bin"))
            .unwrap_err();
        assert!(matches!(err, EasyshareError::NotFound(_)));
    }

    #[test]
    fn missing_source_touches_no_index_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("downloads.db");
        let persister = DownloadPersister::new(Box::new(ManagedIndexBackend::new(
            SqliteMediaIndex::open(&db).unwrap(),
            "application/octet-stream",
            8192,
        )));

        let err = persister
            .persist(&PersistRequest::new("/no/such/file", "x.bin"))
            .unwrap_err();

        assert!(matches!(err, EasyshareError::NotFound(_)));
        assert_eq!(SqliteMediaIndex::open(&db).unwrap().count().unwrap(), 0);
    }

    #[test]
    fn invalid_name_is_rejected_before_io() {
        let downloads = tempfile::tempdir().unwrap();
        let persister =
            DownloadPersister::new(Box::new(DirectFilesystemBackend::new(downloads.path(), 8192)));

        let err = persister
            .persist(&PersistRequest::new("/no/such/file", "../x.bin"))
            .unwrap_err();
        assert!(matches!(err, EasyshareError::InvalidArgument(_)));
    }

    #[test]
    fn repeated_saves_keep_latest_bytes() {
        let src_dir = tempfile::tempdir().unwrap();
        let downloads = tempfile::tempdir().unwrap();
        let persister =
            DownloadPersister::new(Box::new(DirectFilesystemBackend::new(downloads.path(), 8192)));

        for content in [&b"version one"[..], &b"v2"[..], &b"the third and final version"[..]] {
            let src = source_file(src_dir.path(), "src.bin", content);
            persister.persist(&PersistRequest::new(&src, "x.bin")).unwrap();
        }

        assert_eq!(
            fs::read(downloads.path().join("x.bin")).unwrap(),
            b"the third and final version"
        );
    }

    #[test]
    fn managed_receipt_carries_digest() {
        let src_dir = tempfile::tempdir().unwrap();
        let src = source_file(src_dir.path(), "a.txt", b"abc");
        let persister = DownloadPersister::new(Box::new(ManagedIndexBackend::new(
            SqliteMediaIndex::open_in_memory().unwrap(),
            "application/octet-stream",
            8192,
        )));

        let receipt = persister.persist(&PersistRequest::new(&src, "a.txt")).unwrap();
        assert_eq!(receipt.backend, "managed-index");
        assert_eq!(
            receipt.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
