// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic storage capability.
//
// The persister never branches on platform versions itself; it is handed one
// backend at construction and forwards every copy to it.

use std::io::Read;

use easyshare_core::error::Result;
use easyshare_core::types::StoredFile;

/// A place in shared storage that files can be copied into.
pub trait StorageBackend: Send {
    /// Short name used in logs and receipts (e.g. "direct-filesystem").
    fn name(&self) -> &'static str;

    /// Copy all of `source` (`len` bytes) into shared storage as
    /// `display_name`, returning where it ended up.
    ///
    /// On error the backend must leave nothing half-visible behind: no
    /// staging files, no pending index rows.
    fn store(&self, source: &mut dyn Read, len: u64, display_name: &str) -> Result<StoredFile>;
}
