// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the EasyShare downloads bridge.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EasyshareError, Result};

/// First Android API level (10, "Q") with `MediaStore.Downloads`.
pub const ANDROID_Q: i32 = 29;

/// Content type recorded for every file written to the Downloads index.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A request to copy one file into the shared Downloads area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistRequest {
    /// File to copy. Never modified.
    pub source_path: PathBuf,
    /// Visible name of the copy.
    pub display_name: String,
}

impl PersistRequest {
    pub fn new(source_path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            display_name: display_name.into(),
        }
    }

    /// Check the display name is a usable bare file name.
    ///
    /// The name is joined onto the Downloads directory on legacy platforms,
    /// so anything that could escape it is refused.
    pub fn validate(&self) -> Result<()> {
        let name = self.display_name.as_str();
        if name.trim().is_empty() {
            return Err(EasyshareError::InvalidArgument(
                "display name must not be empty".into(),
            ));
        }
        if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
            return Err(EasyshareError::InvalidArgument(format!(
                "display name must be a plain file name, got {name:?}"
            )));
        }
        Ok(())
    }
}

/// What a storage backend produced for one successful copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Opaque location: a `content://` URI or an absolute path.
    pub location_id: String,
    pub bytes_copied: u64,
    /// Lowercase hex SHA-256 of the bytes written.
    pub sha256: String,
}

/// Successful outcome of a persist call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistReceipt {
    pub location_id: String,
    pub bytes_copied: u64,
    pub sha256: String,
    /// Name of the backend that wrote the file (e.g. "managed-index").
    pub backend: String,
    pub saved_at: DateTime<Utc>,
}

impl PersistReceipt {
    pub fn from_stored(stored: StoredFile, backend: &str) -> Self {
        Self {
            location_id: stored.location_id,
            bytes_copied: stored.bytes_copied,
            sha256: stored.sha256,
            backend: backend.to_string(),
            saved_at: Utc::now(),
        }
    }
}

/// Which persistence strategy the host platform supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageCapability {
    /// Insert into the shared Downloads media index.
    ManagedIndex,
    /// Write straight into the public Downloads directory.
    DirectFilesystem,
}

impl StorageCapability {
    /// Resolve the capability from a platform SDK level.
    pub fn for_sdk(sdk_int: i32, managed_index_min_sdk: i32) -> Self {
        if sdk_int >= managed_index_min_sdk {
            Self::ManagedIndex
        } else {
            Self::DirectFilesystem
        }
    }
}

impl std::fmt::Display for StorageCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManagedIndex => write!(f, "managed-index"),
            Self::DirectFilesystem => write!(f, "direct-filesystem"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_threshold_is_inclusive() {
        assert_eq!(
            StorageCapability::for_sdk(28, ANDROID_Q),
            StorageCapability::DirectFilesystem
        );
        assert_eq!(
            StorageCapability::for_sdk(29, ANDROID_Q),
            StorageCapability::ManagedIndex
        );
        assert_eq!(
            StorageCapability::for_sdk(34, ANDROID_Q),
            StorageCapability::ManagedIndex
        );
    }

    #[test]
    fn plain_names_validate() {
        for name in ["x.bin", "report 2026.pdf", ".hidden", "a..b"] {
            assert!(
                PersistRequest::new("/src", name).validate().is_ok(),
                "{name} should be accepted"
            );
        }
    }

    #[test]
    fn unusable_names_are_rejected() {
        for name in ["", "   ", ".", "..", "../escape", "dir/file", "a\\b"] {
            let err = PersistRequest::new("/src", name).validate().unwrap_err();
            assert!(
                matches!(err, EasyshareError::InvalidArgument(_)),
                "{name:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn receipt_keeps_stored_fields() {
        let stored = StoredFile {
            location_id: "content://media/external/downloads/7".into(),
            bytes_copied: 12,
            sha256: "ab".into(),
        };
        let receipt = PersistReceipt::from_stored(stored, "managed-index");
        assert_eq!(receipt.location_id, "content://media/external/downloads/7");
        assert_eq!(receipt.bytes_copied, 12);
        assert_eq!(receipt.backend, "managed-index");
    }
}
